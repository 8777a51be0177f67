//! Player physics constants, AABB helpers, and the per-axis collision solver.

use crate::block::{cell, BlockPos};
use crate::math::Vec3;
use crate::store::WorldStore;

/// Player hitbox height. The player position is the top of the box (eyes).
pub const PLAYER_HEIGHT: f32 = 1.7;

/// Half the player's horizontal extent.
pub const PLAYER_RADIUS: f32 = 0.25;

/// Downward acceleration (blocks/s²).
pub const GRAVITY: f32 = 9.8;

/// Upward velocity applied by a jump (blocks/s).
pub const JUMP_VELOCITY: f32 = 8.0;

/// Horizontal walking speed (blocks/s).
pub const WALK_SPEED: f32 = 6.0;

/// Below this eye height the player is returned to spawn.
pub const VOID_Y: f32 = -50.0;

/// Longest step the integrator accepts (seconds).
pub const MAX_STEP_SECONDS: f32 = 0.05;

/// Distance below the feet sampled by the ground probe.
pub const GROUND_PROBE: f32 = 0.01;

/// Gap left between a landed player's feet and the block top. Closed-interval
/// overlap tests would otherwise treat the floor as a wall.
pub const CONTACT_SKIN: f32 = 0.001;

/// Half extent of a block's unit cube.
const BLOCK_HALF: f32 = 0.5;

/// Axis-aligned bounding box for a player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerAabb {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl PlayerAabb {
    /// Build the AABB from an eye position (position.y is the box top).
    pub fn from_eye_position(pos: Vec3) -> Self {
        Self {
            min_x: pos.x - PLAYER_RADIUS,
            max_x: pos.x + PLAYER_RADIUS,
            min_y: pos.y - PLAYER_HEIGHT,
            max_y: pos.y,
            min_z: pos.z - PLAYER_RADIUS,
            max_z: pos.z + PLAYER_RADIUS,
        }
    }

    /// Every block coordinate whose unit cube could overlap this box.
    ///
    /// Block `c` spans `[c-0.5, c+0.5]`, so on each axis the range is
    /// `cell(min)..=cell(max)` in block-centred cells, with the touching
    /// neighbour included when a face lands exactly on a cell boundary.
    pub fn candidate_blocks(&self) -> impl Iterator<Item = BlockPos> {
        let bx_min = (self.min_x - BLOCK_HALF).ceil() as i32;
        let bx_max = (self.max_x + BLOCK_HALF).floor() as i32;
        let by_min = (self.min_y - BLOCK_HALF).ceil() as i32;
        let by_max = (self.max_y + BLOCK_HALF).floor() as i32;
        let bz_min = (self.min_z - BLOCK_HALF).ceil() as i32;
        let bz_max = (self.max_z + BLOCK_HALF).floor() as i32;

        (bx_min..=bx_max).flat_map(move |bx| {
            (by_min..=by_max)
                .flat_map(move |by| (bz_min..=bz_max).map(move |bz| BlockPos::new(bx, by, bz)))
        })
    }

    /// Closed-interval overlap with the unit cube of block `pos`. Touching
    /// faces count as intersecting.
    pub fn intersects_block(&self, pos: BlockPos) -> bool {
        let (cx, cy, cz) = (pos.x as f32, pos.y as f32, pos.z as f32);
        self.min_x <= cx + BLOCK_HALF
            && self.max_x >= cx - BLOCK_HALF
            && self.min_y <= cy + BLOCK_HALF
            && self.max_y >= cy - BLOCK_HALF
            && self.min_z <= cz + BLOCK_HALF
            && self.max_z >= cz - BLOCK_HALF
    }
}

/// Which surfaces the player touched during one resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Contacts {
    pub ground: bool,
    pub ceiling: bool,
    pub wall_x: bool,
    pub wall_z: bool,
}

/// Outcome of resolving one displacement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub position: Vec3,
    pub vertical_velocity: f32,
    pub contacts: Contacts,
}

/// Resolves player movement against the blocks of a [`WorldStore`].
///
/// Only reads the store.
#[derive(Clone, Copy)]
pub struct CollisionSolver<'a> {
    blocks: &'a WorldStore,
}

impl<'a> CollisionSolver<'a> {
    pub fn new(blocks: &'a WorldStore) -> Self {
        Self { blocks }
    }

    /// Whether the player box at `position` overlaps any block.
    pub fn intersects(&self, position: Vec3) -> bool {
        let aabb = PlayerAabb::from_eye_position(position);
        aabb.candidate_blocks()
            .any(|pos| aabb.intersects_block(pos) && self.blocks.contains(pos))
    }

    /// Solid blocks overlapping the player box at `position`.
    pub fn overlapping(&self, position: Vec3) -> Vec<BlockPos> {
        let aabb = PlayerAabb::from_eye_position(position);
        aabb.candidate_blocks()
            .filter(|&pos| aabb.intersects_block(pos) && self.blocks.contains(pos))
            .collect()
    }

    /// Like [`CollisionSolver::intersects`], ignoring the blocks in `embedded`.
    fn blocked(&self, position: Vec3, embedded: &[BlockPos]) -> bool {
        let aabb = PlayerAabb::from_eye_position(position);
        aabb.candidate_blocks().any(|pos| {
            aabb.intersects_block(pos) && self.blocks.contains(pos) && !embedded.contains(&pos)
        })
    }

    /// Top face of the highest overlapping block, outside `embedded`, whose
    /// top is not above `feet_limit`.
    fn landing_surface(&self, position: Vec3, feet_limit: f32, embedded: &[BlockPos]) -> Option<f32> {
        let aabb = PlayerAabb::from_eye_position(position);
        aabb.candidate_blocks()
            .filter(|&pos| {
                aabb.intersects_block(pos) && self.blocks.contains(pos) && !embedded.contains(&pos)
            })
            .map(|pos| pos.y as f32 + BLOCK_HALF)
            .filter(|&top| top <= feet_limit)
            .reduce(f32::max)
    }

    /// Advance `position` by `displacement`, one axis at a time: X, then Z
    /// from the post-X position, then Y.
    ///
    /// A blocked horizontal axis simply drops that component. A blocked
    /// downward move lands the player on the obstruction; a blocked upward
    /// (or zero) move is a ceiling strike. Either vertical block zeroes
    /// `vertical_velocity`.
    ///
    /// Blocks already overlapping the box at `position` do not obstruct, so
    /// a player left inside geometry can move out of it.
    pub fn resolve(&self, position: Vec3, displacement: Vec3, vertical_velocity: f32) -> Resolution {
        let embedded = self.overlapping(position);
        let mut pos = position;
        let mut vy = vertical_velocity;
        let mut contacts = Contacts::default();

        if displacement.x != 0.0 {
            let candidate = Vec3::new(pos.x + displacement.x, pos.y, pos.z);
            if self.blocked(candidate, &embedded) {
                contacts.wall_x = true;
            } else {
                pos = candidate;
            }
        }

        if displacement.z != 0.0 {
            let candidate = Vec3::new(pos.x, pos.y, pos.z + displacement.z);
            if self.blocked(candidate, &embedded) {
                contacts.wall_z = true;
            } else {
                pos = candidate;
            }
        }

        let candidate = Vec3::new(pos.x, pos.y + displacement.y, pos.z);
        if !self.blocked(candidate, &embedded) {
            pos = candidate;
        } else if vy < 0.0 {
            vy = 0.0;
            contacts.ground = true;
            let feet = pos.y - PLAYER_HEIGHT;
            if let Some(top) = self.landing_surface(candidate, feet + CONTACT_SKIN, &embedded) {
                pos.y = top + PLAYER_HEIGHT + CONTACT_SKIN;
            }
        } else {
            vy = 0.0;
            contacts.ceiling = true;
        }

        Resolution {
            position: pos,
            vertical_velocity: vy,
            contacts,
        }
    }

    /// Whether a block sits directly under the feet at `position`.
    ///
    /// Samples the single cell `GROUND_PROBE` below the feet at the rounded
    /// horizontal position.
    pub fn is_on_ground(&self, position: Vec3) -> bool {
        self.ground_surface(position).is_some()
    }

    /// Top face of the block found by the ground probe, if any.
    pub fn ground_surface(&self, position: Vec3) -> Option<f32> {
        let feet = position.y - PLAYER_HEIGHT;
        let below = BlockPos::new(
            cell(position.x),
            cell(feet - GROUND_PROBE),
            cell(position.z),
        );
        self.blocks
            .contains(below)
            .then(|| below.y as f32 + BLOCK_HALF)
    }
}
