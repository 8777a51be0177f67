//! Voxel world model: blocks, storage, terrain generation, and player physics.

pub mod block;
pub mod clock;
pub mod error;
pub mod math;
pub mod noise;
pub mod physics;
pub mod player;
pub mod raycast;
pub mod snapshot;
pub mod store;
pub mod terrain;
pub mod world;

pub use block::{BlockPos, BlockRecord, BlockType};
pub use error::{EditError, SnapshotError};
pub use math::Vec3;
pub use player::{MovementIntent, PlayerController, PlayerSettings, PlayerState};
pub use store::WorldStore;
pub use terrain::{TerrainGenerator, TerrainParams};
pub use world::World;
