//! The sandbox world: block store, the single player, and the step clock.

use tracing::{debug, info};

use crate::block::{BlockPos, BlockType};
use crate::clock::{StepClock, Timestep};
use crate::error::{EditError, SnapshotError};
use crate::math::Vec3;
use crate::physics::{PlayerAabb, CONTACT_SKIN, PLAYER_HEIGHT};
use crate::player::{MovementIntent, PlayerController, PlayerSettings, PlayerState};
use crate::raycast::{raycast, RayHit};
use crate::snapshot::{self, ImportReport};
use crate::store::WorldStore;
use crate::terrain::{TerrainGenerator, TerrainParams};

/// Owns everything the simulation mutates. The host holds one of these and
/// drives it once per frame.
pub struct World {
    store: WorldStore,
    player: PlayerController,
    clock: StepClock,
    facing: Vec3,
    /// Jump requested but not yet seen by a simulation step.
    jump_pending: bool,
}

impl World {
    /// Empty world with the player at its configured spawn.
    pub fn new(settings: PlayerSettings, timestep: Timestep) -> Self {
        Self {
            store: WorldStore::new(),
            player: PlayerController::new(settings),
            clock: StepClock::new(timestep),
            facing: MovementIntent::default().facing,
            jump_pending: false,
        }
    }

    /// Generate terrain and drop the player in above the spawn column.
    pub fn generate(params: &TerrainParams, settings: PlayerSettings, timestep: Timestep) -> Self {
        let mut world = Self::new(settings, timestep);
        world.regenerate(params);
        world
    }

    /// Load a world from snapshot JSON.
    pub fn from_snapshot(
        input: &str,
        settings: PlayerSettings,
        timestep: Timestep,
    ) -> Result<Self, SnapshotError> {
        let mut world = Self::new(settings, timestep);
        world.import_snapshot(input)?;
        Ok(world)
    }

    pub fn store(&self) -> &WorldStore {
        &self.store
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn state(&self) -> PlayerState {
        self.player.state()
    }

    /// Direction used by [`World::pick`], taken from the last intent.
    pub fn facing(&self) -> Vec3 {
        self.facing
    }

    pub fn set_facing(&mut self, facing: Vec3) {
        self.facing = facing;
    }

    /// Run the simulation for one host frame.
    ///
    /// The frame is split into steps by the clock. A jump request is offered
    /// to the first step that runs, which may be in a later frame when this
    /// one is shorter than a fixed step.
    pub fn advance(&mut self, intent: &MovementIntent, frame_dt: f32) -> PlayerState {
        self.facing = intent.facing;
        self.jump_pending |= intent.jump;
        let mut step_intent = *intent;
        for dt in self.clock.advance(frame_dt) {
            step_intent.jump = self.jump_pending;
            self.player.tick(&self.store, &step_intent, dt);
            self.jump_pending = false;
        }
        self.player.state()
    }

    /// Single step of exactly `dt`, bypassing the clock.
    pub fn tick(&mut self, intent: &MovementIntent, dt: f32) -> PlayerState {
        self.facing = intent.facing;
        self.player.tick(&self.store, intent, dt)
    }

    pub fn place_block(&mut self, pos: BlockPos, block_type: BlockType) -> Result<(), EditError> {
        if pos.pack().is_none() {
            return Err(EditError::OutOfRange(pos));
        }
        if self.store.contains(pos) {
            return Err(EditError::Occupied(pos));
        }
        if PlayerAabb::from_eye_position(self.player.position()).intersects_block(pos) {
            return Err(EditError::ObstructedByPlayer(pos));
        }
        self.store.set(pos, block_type);
        debug!("Placed {block_type} at {pos}");
        Ok(())
    }

    pub fn break_block(&mut self, pos: BlockPos) -> Result<BlockType, EditError> {
        let removed = self.store.take(pos).ok_or(EditError::Missing(pos))?;
        debug!("Broke {removed} at {pos}");
        Ok(removed)
    }

    /// Block under the crosshair, looking from the player's eye.
    pub fn pick(&self, max_distance: f32) -> Option<RayHit> {
        raycast(&self.store, self.player.position(), self.facing, max_distance)
    }

    pub fn export_snapshot(&self) -> Result<String, SnapshotError> {
        snapshot::encode(&self.store.export_snapshot())
    }

    /// Replace every block with the snapshot's contents. On error the
    /// current blocks are left as they were.
    pub fn import_snapshot(&mut self, input: &str) -> Result<ImportReport, SnapshotError> {
        let decoded = snapshot::decode(input)?;
        let mut report = decoded.report;
        let inserted = self.store.import_snapshot(decoded.records);
        report.skipped += report.accepted.saturating_sub(inserted);
        report.accepted = inserted;
        info!(
            "Loaded snapshot v{}: {} blocks ({} skipped, {} defaulted)",
            decoded.version, report.accepted, report.skipped, report.defaulted
        );
        self.resolve_spawn();
        self.player.respawn();
        Ok(report)
    }

    /// Throw away every block and generate fresh terrain.
    pub fn regenerate(&mut self, params: &TerrainParams) -> usize {
        self.store.clear();
        let placed = TerrainGenerator::from_params(params).populate(&mut self.store, params);
        info!(
            "Generated world: {placed} blocks, {}x{} max height {}",
            params.width, params.depth, params.max_height
        );
        self.resolve_spawn();
        self.player.respawn();
        placed
    }

    /// Raise the spawn point clear of the column beneath it. Returns the
    /// spawn in effect afterwards.
    pub fn resolve_spawn(&mut self) -> Vec3 {
        let mut spawn = self.player.spawn();
        let column = BlockPos::containing(spawn);
        if let Some(top) = self.store.column_top(column.x, column.z) {
            let clear = top as f32 + 0.5 + PLAYER_HEIGHT + CONTACT_SKIN;
            if spawn.y < clear {
                debug!("Raising spawn from y={:.2} to y={clear:.2}", spawn.y);
                spawn.y = clear;
                self.player.set_spawn(spawn);
            }
        }
        spawn
    }

    pub fn respawn(&mut self) {
        self.player.respawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{CollisionSolver, GRAVITY, JUMP_VELOCITY};
    use crate::raycast::BlockFace;

    fn small_params() -> TerrainParams {
        TerrainParams {
            width: 12,
            depth: 12,
            max_height: 4,
            seed: 3,
            ..TerrainParams::default()
        }
    }

    fn landed(mut world: World) -> World {
        let idle = MovementIntent::default();
        for _ in 0..600 {
            if world.advance(&idle, 1.0 / 60.0).grounded {
                return world;
            }
        }
        panic!("never landed at {}", world.state().position);
    }

    fn flat_world(timestep: Timestep) -> World {
        let mut world = World::new(
            PlayerSettings {
                spawn: Vec3::new(0.0, 3.0, 0.0),
                ..PlayerSettings::default()
            },
            timestep,
        );
        let records = (-3..=3)
            .flat_map(|x| (-3..=3).map(move |z| (x, z)))
            .map(|(x, z)| crate::BlockRecord::new(BlockPos::new(x, 0, z), BlockType::Grass));
        world.store.extend(records);
        landed(world)
    }

    #[test]
    fn generated_world_lands_player_on_terrain() {
        let world = landed(World::generate(
            &small_params(),
            PlayerSettings::default(),
            Timestep::Variable,
        ));
        let top = world.store().column_top(0, 0).unwrap();
        let feet = world.state().position.y - PLAYER_HEIGHT;
        assert!((feet - (top as f32 + 0.5)).abs() < 0.01);
    }

    #[test]
    fn spawn_raised_above_tall_column() {
        let mut world = World::new(
            PlayerSettings {
                spawn: Vec3::new(0.0, 1.0, 0.0),
                ..PlayerSettings::default()
            },
            Timestep::Variable,
        );
        for y in 0..5 {
            world.store.set(BlockPos::new(0, y, 0), BlockType::Stone);
        }
        let spawn = world.resolve_spawn();
        assert!(spawn.y - PLAYER_HEIGHT >= 4.5);
        assert!(!CollisionSolver::new(world.store()).intersects(spawn));
    }

    #[test]
    fn place_and_break() {
        let mut world = flat_world(Timestep::Variable);
        let pos = BlockPos::new(2, 1, 2);
        world.place_block(pos, BlockType::Wood).unwrap();
        assert_eq!(world.store().get(pos), Some(BlockType::Wood));
        assert_eq!(
            world.place_block(pos, BlockType::Stone),
            Err(EditError::Occupied(pos))
        );
        assert_eq!(world.break_block(pos), Ok(BlockType::Wood));
        assert_eq!(world.break_block(pos), Err(EditError::Missing(pos)));
    }

    #[test]
    fn cannot_place_inside_player() {
        let mut world = flat_world(Timestep::Variable);
        let pos = BlockPos::new(0, 1, 0);
        assert_eq!(
            world.place_block(pos, BlockType::Stone),
            Err(EditError::ObstructedByPlayer(pos))
        );
        assert!(!world.store().contains(pos));
    }

    #[test]
    fn cannot_place_out_of_range() {
        let mut world = World::new(PlayerSettings::default(), Timestep::Variable);
        let pos = BlockPos::new(i32::MAX, 0, 0);
        assert_eq!(
            world.place_block(pos, BlockType::Stone),
            Err(EditError::OutOfRange(pos))
        );
    }

    #[test]
    fn pick_looks_down_at_floor() {
        let mut world = flat_world(Timestep::Variable);
        world.set_facing(MovementIntent::look_direction(0.0, -std::f32::consts::FRAC_PI_2));
        let hit = world.pick(5.0).unwrap();
        assert_eq!(hit.block, BlockPos::new(0, 0, 0));
        assert_eq!(hit.face, BlockFace::Top);
    }

    #[test]
    fn pick_misses_open_sky() {
        let mut world = flat_world(Timestep::Variable);
        world.set_facing(Vec3::UP);
        assert!(world.pick(5.0).is_none());
    }

    #[test]
    fn pick_with_unbounded_reach_returns_none() {
        let mut world = World::new(PlayerSettings::default(), Timestep::Variable);
        world.set_facing(Vec3::new(1.0, 0.2, 0.3));
        assert!(world.pick(f32::INFINITY).is_none());
        assert!(world.pick(f32::NAN).is_none());
    }

    #[test]
    fn snapshot_round_trip() {
        let world = World::generate(&small_params(), PlayerSettings::default(), Timestep::Variable);
        let json = world.export_snapshot().unwrap();
        let restored =
            World::from_snapshot(&json, PlayerSettings::default(), Timestep::Variable).unwrap();
        assert_eq!(
            restored.store().export_snapshot(),
            world.store().export_snapshot()
        );
    }

    #[test]
    fn failed_import_keeps_blocks() {
        let mut world = flat_world(Timestep::Variable);
        let before = world.store().len();
        assert!(world.import_snapshot("{ not json").is_err());
        assert!(world.import_snapshot(r#"{"version": 99, "blocks": []}"#).is_err());
        assert_eq!(world.store().len(), before);
    }

    #[test]
    fn import_counts_duplicates_as_skipped() {
        let mut world = World::new(PlayerSettings::default(), Timestep::Variable);
        let report = world
            .import_snapshot(
                r#"[{"x":0,"y":0,"z":0,"type":"stone"},{"x":0,"y":0,"z":0,"type":"wood"}]"#,
            )
            .unwrap();
        assert_eq!(report.accepted, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(world.store().get(BlockPos::new(0, 0, 0)), Some(BlockType::Stone));
    }

    #[test]
    fn jump_survives_frame_shorter_than_step() {
        let mut world = flat_world(Timestep::Fixed { step: 0.02 });
        let jump = MovementIntent {
            jump: true,
            ..MovementIntent::default()
        };
        world.advance(&jump, 0.005);
        let state = world.advance(&MovementIntent::default(), 0.03);
        assert!(!state.grounded);
        assert!(state.velocity.y > 0.0, "vy {}", state.velocity.y);
        assert!(!world.jump_pending);
    }

    #[test]
    fn regenerate_clears_stale_position() {
        let mut world = World::generate(&small_params(), PlayerSettings::default(), Timestep::Variable);
        // Park the player where terrain will be.
        world.player.teleport(Vec3::new(0.0, 1.0, 0.0));
        world.regenerate(&small_params());
        let pos = world.state().position;
        assert!(!CollisionSolver::new(world.store()).intersects(pos));
        assert_eq!(pos, world.player().spawn());
    }

    #[test]
    fn fixed_step_applies_jump_once() {
        let mut world = flat_world(Timestep::Fixed { step: 0.01 });
        let jump = MovementIntent {
            jump: true,
            ..MovementIntent::default()
        };
        let state = world.advance(&jump, 0.05);
        assert!(!state.grounded);
        // Four or five 10 ms steps depending on float rounding; one impulse.
        let low = JUMP_VELOCITY - GRAVITY * 0.05 - 1e-3;
        let high = JUMP_VELOCITY - GRAVITY * 0.04 + 1e-3;
        assert!(
            (low..=high).contains(&state.velocity.y),
            "vy {}",
            state.velocity.y
        );
    }
}
