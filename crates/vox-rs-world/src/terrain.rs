//! Height-field terrain generator.
//!
//! Each grid column gets a noise-driven height; the column is filled with
//! dirt and capped with a single grass block. The grid is centred on the
//! world origin.

use tracing::debug;

use crate::block::{BlockPos, BlockRecord, BlockType};
use crate::noise::PerlinNoise;
use crate::store::WorldStore;

/// Horizontal scale applied to grid coordinates before sampling noise.
const NOISE_SCALE: f64 = 10.0;

/// Terrain dimensions and noise shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainParams {
    pub width: u32,
    pub depth: u32,
    pub max_height: u32,
    pub seed: i64,
    pub octaves: u32,
    pub persistence: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            width: 40,
            depth: 40,
            max_height: 6,
            seed: 0,
            octaves: 3,
            persistence: 0.5,
        }
    }
}

/// Produces block placements from a noise field.
#[derive(Clone)]
pub struct TerrainGenerator {
    noise: PerlinNoise,
    octaves: u32,
    persistence: f64,
}

impl Default for TerrainGenerator {
    fn default() -> Self {
        let params = TerrainParams::default();
        Self::new(params.octaves, params.persistence)
    }
}

impl TerrainGenerator {
    /// Generator over the fixed reference permutation.
    pub fn new(octaves: u32, persistence: f64) -> Self {
        Self::with_noise(PerlinNoise::classic(), octaves, persistence)
    }

    pub fn with_noise(noise: PerlinNoise, octaves: u32, persistence: f64) -> Self {
        Self {
            noise,
            octaves,
            persistence,
        }
    }

    pub fn from_params(params: &TerrainParams) -> Self {
        Self::new(params.octaves, params.persistence)
    }

    /// Column height at grid cell `(i, k)`: at least 1, at most `max_height`.
    pub fn column_height(&self, i: i64, k: i64, max_height: u32, seed: i64) -> u32 {
        let max_height = max_height.max(1);
        let nx = i.wrapping_add(seed) as f64 / NOISE_SCALE;
        let nz = k.wrapping_add(seed) as f64 / NOISE_SCALE;
        let n = self
            .noise
            .fractal_2d(nx, nz, self.octaves, self.persistence);
        let normalized = ((n + 1.0) / 2.0).clamp(0.0, 1.0);
        let h = (normalized * f64::from(max_height - 1)).floor() as u32 + 1;
        h.clamp(1, max_height)
    }

    /// Every block of a `width × depth` terrain, column by column
    /// (`i` outer, `k` inner, `y` ascending).
    pub fn generate(&self, width: u32, depth: u32, max_height: u32, seed: i64) -> Vec<BlockRecord> {
        let half_w = (width / 2) as i32;
        let half_d = (depth / 2) as i32;
        let mut out = Vec::new();

        for i in 0..width {
            for k in 0..depth {
                let h = self.column_height(i64::from(i), i64::from(k), max_height, seed);
                let x = i as i32 - half_w;
                let z = k as i32 - half_d;
                for y in 0..h {
                    let block_type = if y == h - 1 {
                        BlockType::Grass
                    } else {
                        BlockType::Dirt
                    };
                    out.push(BlockRecord::new(BlockPos::new(x, y as i32, z), block_type));
                }
            }
        }

        out
    }

    /// Generate `params` into `store`. Returns how many blocks were placed.
    pub fn populate(&self, store: &mut WorldStore, params: &TerrainParams) -> usize {
        let records = self.generate(params.width, params.depth, params.max_height, params.seed);
        let total = records.len();
        let mut placed = 0;
        for record in records {
            if store.set(record.pos(), record.block_type) {
                placed += 1;
            }
        }
        debug!(
            "Generated {}x{} terrain (seed {}): {placed}/{total} blocks placed",
            params.width, params.depth, params.seed
        );
        placed
    }

    /// Surface height (number of blocks) of the column at world `(x, z)`,
    /// or `None` outside the generated area.
    pub fn surface_height(&self, params: &TerrainParams, x: i32, z: i32) -> Option<u32> {
        let i = i64::from(x) + i64::from(params.width / 2);
        let k = i64::from(z) + i64::from(params.depth / 2);
        if i < 0 || k < 0 || i >= i64::from(params.width) || k >= i64::from(params.depth) {
            return None;
        }
        Some(self.column_height(i, k, params.max_height, params.seed))
    }
}
