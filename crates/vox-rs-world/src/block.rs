//! Block types, integer block coordinates, and snapshot records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// Material tag of a block. Blocks carry no other metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Grass,
    Dirt,
    Stone,
    Wood,
}

impl BlockType {
    pub const ALL: [BlockType; 4] = [
        BlockType::Grass,
        BlockType::Dirt,
        BlockType::Stone,
        BlockType::Wood,
    ];

    /// Type used when a stored tag is not recognised.
    pub const FALLBACK: BlockType = BlockType::Grass;

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Grass => "grass",
            BlockType::Dirt => "dirt",
            BlockType::Stone => "stone",
            BlockType::Wood => "wood",
        }
    }

    /// Parse a tag, falling back to [`BlockType::FALLBACK`] for anything unknown.
    pub fn from_tag_lossy(tag: &str) -> (BlockType, bool) {
        match tag.parse() {
            Ok(ty) => (ty, false),
            Err(()) => (Self::FALLBACK, true),
        }
    }
}

impl FromStr for BlockType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grass" => Ok(BlockType::Grass),
            "dirt" => Ok(BlockType::Dirt),
            "stone" => Ok(BlockType::Stone),
            "wood" => Ok(BlockType::Wood),
            _ => Err(()),
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bits used per axis when packing a [`BlockPos`] into a `u64` key.
const AXIS_BITS: u32 = 21;
const AXIS_MASK: u64 = (1 << AXIS_BITS) - 1;

/// Smallest coordinate representable in a packed key.
pub const MIN_COORD: i32 = -(1 << (AXIS_BITS - 1));
/// Largest coordinate representable in a packed key.
pub const MAX_COORD: i32 = (1 << (AXIS_BITS - 1)) - 1;

/// Integer block coordinate. Block `(x, y, z)` occupies the unit cube
/// `[x-0.5, x+0.5] × [y-0.5, y+0.5] × [z-0.5, z+0.5]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Block whose cube contains the world-space point.
    pub fn containing(point: Vec3) -> Self {
        Self::new(cell(point.x), cell(point.y), cell(point.z))
    }

    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub fn center(&self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }

    /// Pack into a single hash key, or `None` when any axis is outside
    /// `[MIN_COORD, MAX_COORD]`.
    pub fn pack(&self) -> Option<u64> {
        let in_range = |v: i32| (MIN_COORD..=MAX_COORD).contains(&v);
        if !(in_range(self.x) && in_range(self.y) && in_range(self.z)) {
            return None;
        }
        let x = self.x as u64 & AXIS_MASK;
        let y = self.y as u64 & AXIS_MASK;
        let z = self.z as u64 & AXIS_MASK;
        Some((x << (2 * AXIS_BITS)) | (y << AXIS_BITS) | z)
    }

    /// Inverse of [`BlockPos::pack`].
    pub fn unpack(key: u64) -> Self {
        Self::new(
            sign_extend((key >> (2 * AXIS_BITS)) & AXIS_MASK),
            sign_extend((key >> AXIS_BITS) & AXIS_MASK),
            sign_extend(key & AXIS_MASK),
        )
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

impl From<(i32, i32, i32)> for BlockPos {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

/// Integer cell containing a world coordinate on one axis.
///
/// Cells are centred on integers, so this is rounding with ties going up.
#[inline]
pub fn cell(v: f32) -> i32 {
    (v + 0.5).floor() as i32
}

fn sign_extend(raw: u64) -> i32 {
    let shift = 64 - AXIS_BITS;
    (((raw << shift) as i64) >> shift) as i32
}

/// One persisted block: `{x, y, z, type}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockRecord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    #[serde(rename = "type")]
    pub block_type: BlockType,
}

impl BlockRecord {
    pub fn new(pos: BlockPos, block_type: BlockType) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            z: pos.z,
            block_type,
        }
    }

    pub fn pos(&self) -> BlockPos {
        BlockPos::new(self.x, self.y, self.z)
    }
}
