//! Perlin noise used for height-field generation.
//!
//! Provides 2D gradient noise over a 512-entry permutation table and a
//! fractal (multi-octave) wrapper. Everything here is pure: the same inputs
//! always produce the same output.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Gradient directions (12 cube-edge vectors). 2D noise uses the x/y plane.
const GRAD3: [[f64; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

/// Ken Perlin's reference permutation.
#[rustfmt::skip]
const CLASSIC_PERMUTATION: [u8; 256] = [
    151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225,
    140, 36, 103, 30, 69, 142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148,
    247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219, 203, 117, 35, 11, 32,
    57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68, 175,
    74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111, 229, 122,
    60, 211, 133, 230, 220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54,
    65, 25, 63, 161, 1, 216, 80, 73, 209, 76, 132, 187, 208, 89, 18, 169,
    200, 196, 135, 130, 116, 188, 159, 86, 164, 100, 109, 198, 173, 186, 3, 64,
    52, 217, 226, 250, 124, 123, 5, 202, 38, 147, 118, 126, 255, 82, 85, 212,
    207, 206, 59, 227, 47, 16, 58, 17, 182, 189, 28, 42, 223, 183, 170, 213,
    119, 248, 152, 2, 44, 154, 163, 70, 221, 153, 101, 155, 167, 43, 172, 9,
    129, 22, 39, 253, 19, 98, 108, 110, 79, 113, 224, 232, 178, 185, 112, 104,
    218, 246, 97, 228, 251, 34, 242, 193, 238, 210, 144, 12, 191, 179, 162, 241,
    81, 51, 145, 235, 249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157,
    184, 84, 204, 176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93,
    222, 114, 67, 29, 24, 72, 243, 141, 128, 195, 78, 66, 215, 61, 156, 180,
];

/// Improved Perlin fade function: 6t^5 - 15t^4 + 10t^3.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Linear interpolation.
#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

/// Perlin noise generator over a doubled permutation table.
#[derive(Clone)]
pub struct PerlinNoise {
    perm: [u8; 512],
}

impl Default for PerlinNoise {
    fn default() -> Self {
        Self::classic()
    }
}

impl PerlinNoise {
    /// Generator over the fixed reference permutation.
    pub fn classic() -> Self {
        Self::from_table(&CLASSIC_PERMUTATION)
    }

    /// Generator over a permutation shuffled from `seed`.
    pub fn new(seed: u64) -> Self {
        let mut table: Vec<u8> = (0..=255).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        table.shuffle(&mut rng);

        let mut perm = [0u8; 256];
        perm.copy_from_slice(&table);
        Self::from_table(&perm)
    }

    fn from_table(table: &[u8; 256]) -> Self {
        let mut perm = [0u8; 512];
        perm[..256].copy_from_slice(table);
        perm[256..].copy_from_slice(table);
        Self { perm }
    }

    /// Gradient index for a lattice corner.
    #[inline]
    fn hash(&self, x: i64, y: i64) -> usize {
        let x = (x & 255) as usize;
        let y = (y & 255) as usize;
        self.perm[self.perm[x] as usize + y] as usize % 12
    }

    /// 2D noise at `(x, y)`, in `[-1, 1]`.
    pub fn noise_2d(&self, x: f64, y: f64) -> f64 {
        let x0 = x.floor();
        let y0 = y.floor();
        let xi = x0 as i64;
        let yi = y0 as i64;

        // Local coordinates within the cell [0, 1)
        let xf = x - x0;
        let yf = y - y0;

        let u = fade(xf);
        let v = fade(yf);

        let g00 = self.hash(xi, yi);
        // Only the low 8 bits reach the table, so wrapping is exact.
        let g10 = self.hash(xi.wrapping_add(1), yi);
        let g01 = self.hash(xi, yi.wrapping_add(1));
        let g11 = self.hash(xi.wrapping_add(1), yi.wrapping_add(1));

        let d00 = dot2(g00, xf, yf);
        let d10 = dot2(g10, xf - 1.0, yf);
        let d01 = dot2(g01, xf, yf - 1.0);
        let d11 = dot2(g11, xf - 1.0, yf - 1.0);

        let x1 = lerp(u, d00, d10);
        let x2 = lerp(u, d01, d11);
        lerp(v, x1, x2).clamp(-1.0, 1.0)
    }

    /// Sum of `octaves` layers at doubling frequency, each layer's amplitude
    /// scaled by `persistence`, normalised by the amplitude sum.
    ///
    /// Returns 0 when `octaves` is 0.
    pub fn fractal_2d(&self, x: f64, y: f64, octaves: u32, persistence: f64) -> f64 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves {
            value += self.noise_2d(x * frequency, y * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= 2.0;
        }

        if max_amplitude <= 0.0 {
            return 0.0;
        }
        (value / max_amplitude).clamp(-1.0, 1.0)
    }
}

/// Dot product of a gradient vector with a 2D distance vector.
#[inline]
fn dot2(grad_idx: usize, x: f64, y: f64) -> f64 {
    let g = &GRAD3[grad_idx];
    g[0] * x + g[1] * y
}
