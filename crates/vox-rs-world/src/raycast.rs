//! Block picking along a view ray.
//!
//! Walks the grid cell by cell (Amanatides & Woo traversal) so the first
//! solid block and the face the ray entered through are exact.

use crate::block::{BlockPos, BlockType};
use crate::math::Vec3;
use crate::store::WorldStore;

/// Face of a block, named by its outward normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockFace {
    Right,  // +X
    Left,   // -X
    Top,    // +Y
    Bottom, // -Y
    Front,  // +Z
    Back,   // -Z
}

impl BlockFace {
    pub fn offset(&self) -> (i32, i32, i32) {
        match self {
            BlockFace::Right => (1, 0, 0),
            BlockFace::Left => (-1, 0, 0),
            BlockFace::Top => (0, 1, 0),
            BlockFace::Bottom => (0, -1, 0),
            BlockFace::Front => (0, 0, 1),
            BlockFace::Back => (0, 0, -1),
        }
    }

    /// Face crossed when stepping into a cell along `axis` in direction `step`.
    fn entered(axis: usize, step: i32) -> Self {
        match (axis, step > 0) {
            (0, true) => BlockFace::Left,
            (0, false) => BlockFace::Right,
            (1, true) => BlockFace::Bottom,
            (1, false) => BlockFace::Top,
            (_, true) => BlockFace::Back,
            (_, false) => BlockFace::Front,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub block: BlockPos,
    pub face: BlockFace,
    pub distance: f32,
    pub block_type: BlockType,
}

impl RayHit {
    /// Empty cell against the hit face, where a new block would go.
    pub fn placement(&self) -> BlockPos {
        let (dx, dy, dz) = self.face.offset();
        self.block.offset(dx, dy, dz)
    }
}

/// First block hit by the ray within `max_distance`. The cell containing
/// `origin` is not tested. A non-finite or negative `max_distance` hits
/// nothing.
pub fn raycast(
    blocks: &WorldStore,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
) -> Option<RayHit> {
    if !(max_distance.is_finite() && max_distance >= 0.0) {
        return None;
    }
    let dir = direction.normalize_or_zero();
    if dir == Vec3::ZERO || !origin.is_finite() {
        return None;
    }

    // Shift so block cells become [c, c+1).
    let o = [origin.x + 0.5, origin.y + 0.5, origin.z + 0.5];
    let d = [dir.x, dir.y, dir.z];
    let mut cell = [o[0].floor() as i32, o[1].floor() as i32, o[2].floor() as i32];

    let mut step = [0i32; 3];
    let mut t_max = [f32::INFINITY; 3];
    let mut t_delta = [f32::INFINITY; 3];
    for axis in 0..3 {
        if d[axis] > 0.0 {
            step[axis] = 1;
            t_max[axis] = (cell[axis] as f32 + 1.0 - o[axis]) / d[axis];
            t_delta[axis] = 1.0 / d[axis];
        } else if d[axis] < 0.0 {
            step[axis] = -1;
            t_max[axis] = (o[axis] - cell[axis] as f32) / -d[axis];
            t_delta[axis] = -1.0 / d[axis];
        }
    }

    loop {
        let axis = if t_max[0] <= t_max[1] && t_max[0] <= t_max[2] {
            0
        } else if t_max[1] <= t_max[2] {
            1
        } else {
            2
        };
        let distance = t_max[axis];
        if distance > max_distance {
            return None;
        }
        cell[axis] += step[axis];
        t_max[axis] += t_delta[axis];

        let pos = BlockPos::new(cell[0], cell[1], cell[2]);
        if let Some(block_type) = blocks.get(pos) {
            return Some(RayHit {
                block: pos,
                face: BlockFace::entered(axis, step[axis]),
                distance,
                block_type,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(blocks: &[(i32, i32, i32)]) -> WorldStore {
        let mut store = WorldStore::new();
        for &(x, y, z) in blocks {
            store.set(BlockPos::new(x, y, z), BlockType::Dirt);
        }
        store
    }

    #[test]
    fn hits_block_straight_ahead() {
        let store = store_with(&[(0, 0, -3)]);
        let hit = raycast(&store, Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 10.0).unwrap();
        assert_eq!(hit.block, BlockPos::new(0, 0, -3));
        assert_eq!(hit.face, BlockFace::Front);
        assert!((hit.distance - 2.5).abs() < 1e-5);
        assert_eq!(hit.placement(), BlockPos::new(0, 0, -2));
        assert_eq!(hit.block_type, BlockType::Dirt);
    }

    #[test]
    fn looking_down_hits_top_face() {
        let store = store_with(&[(2, 0, 1)]);
        let hit = raycast(
            &store,
            Vec3::new(2.1, 2.2, 0.9),
            Vec3::new(0.0, -1.0, 0.0),
            5.0,
        )
        .unwrap();
        assert_eq!(hit.block, BlockPos::new(2, 0, 1));
        assert_eq!(hit.face, BlockFace::Top);
        assert_eq!(hit.placement(), BlockPos::new(2, 1, 1));
    }

    #[test]
    fn misses_beyond_range() {
        let store = store_with(&[(0, 0, -8)]);
        assert!(raycast(&store, Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 5.0).is_none());
    }

    #[test]
    fn diagonal_finds_first_block() {
        let store = store_with(&[(3, 0, 3), (1, 0, 1)]);
        let hit = raycast(&store, Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0), 10.0).unwrap();
        assert_eq!(hit.block, BlockPos::new(1, 0, 1));
    }

    #[test]
    fn unbounded_or_nan_reach_is_none() {
        let store = store_with(&[(0, 0, -3)]);
        let ahead = Vec3::new(0.0, 0.0, -1.0);
        assert!(raycast(&store, Vec3::ZERO, ahead, f32::INFINITY).is_none());
        assert!(raycast(&store, Vec3::ZERO, ahead, f32::NAN).is_none());
        assert!(raycast(&store, Vec3::ZERO, ahead, -1.0).is_none());
        assert!(raycast(&WorldStore::new(), Vec3::ZERO, ahead, f32::INFINITY).is_none());
    }

    #[test]
    fn zero_direction_is_none() {
        let store = store_with(&[(0, 0, 0)]);
        assert!(raycast(&store, Vec3::ZERO, Vec3::ZERO, 10.0).is_none());
    }

    #[test]
    fn negative_x_enters_right_face() {
        let store = store_with(&[(-2, 0, 0)]);
        let hit = raycast(&store, Vec3::ZERO, Vec3::new(-1.0, 0.0, 0.0), 10.0).unwrap();
        assert_eq!(hit.face, BlockFace::Right);
        assert_eq!(hit.placement(), BlockPos::new(-1, 0, 0));
    }
}
