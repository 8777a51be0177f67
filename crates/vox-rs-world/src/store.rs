//! Sparse block store: the single source of truth for block occupancy.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::debug;

use crate::block::{cell, BlockPos, BlockRecord, BlockType};

/// Map from packed block coordinate to block type. A coordinate without an
/// entry is air.
#[derive(Debug, Default, Clone)]
pub struct WorldStore {
    blocks: HashMap<u64, BlockType>,
}

impl WorldStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            blocks: HashMap::with_capacity(capacity),
        }
    }

    pub fn get(&self, pos: BlockPos) -> Option<BlockType> {
        let key = pos.pack()?;
        self.blocks.get(&key).copied()
    }

    /// Insert a block if the coordinate is empty.
    ///
    /// Returns `false` without touching the store when the coordinate is
    /// already occupied or cannot be addressed.
    pub fn set(&mut self, pos: BlockPos, block_type: BlockType) -> bool {
        let Some(key) = pos.pack() else {
            return false;
        };
        match self.blocks.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(block_type);
                true
            }
        }
    }

    /// Remove the block at `pos`. Returns `true` if one was there.
    pub fn remove(&mut self, pos: BlockPos) -> bool {
        self.take(pos).is_some()
    }

    /// Remove and return the block at `pos`.
    pub fn take(&mut self, pos: BlockPos) -> Option<BlockType> {
        let key = pos.pack()?;
        self.blocks.remove(&key)
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        pos.pack().is_some_and(|key| self.blocks.contains_key(&key))
    }

    /// Whether a block occupies the cell at the rounded world coordinate.
    pub fn is_solid(&self, x: f32, y: f32, z: f32) -> bool {
        self.contains(BlockPos::new(cell(x), cell(y), cell(z)))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// Iterate all blocks in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (BlockPos, BlockType)> + '_ {
        self.blocks
            .iter()
            .map(|(&key, &ty)| (BlockPos::unpack(key), ty))
    }

    /// Y of the highest block in the `(x, z)` column, if any. Scans every
    /// stored block, so O(n) in the store size.
    pub fn column_top(&self, x: i32, z: i32) -> Option<i32> {
        self.iter()
            .filter(|(pos, _)| pos.x == x && pos.z == z)
            .map(|(pos, _)| pos.y)
            .max()
    }

    /// Every block as a record, sorted by `(x, y, z)`.
    pub fn export_snapshot(&self) -> Vec<BlockRecord> {
        let mut records: Vec<BlockRecord> = self
            .iter()
            .map(|(pos, ty)| BlockRecord::new(pos, ty))
            .collect();
        records.sort_unstable_by_key(|r| (r.x, r.y, r.z));
        records
    }

    /// Replace the whole store with `records`.
    ///
    /// Duplicate coordinates keep the first record. Returns how many blocks
    /// were inserted.
    pub fn import_snapshot<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = BlockRecord>,
    {
        self.clear();
        let mut inserted = 0;
        let mut rejected = 0;
        for record in records {
            if self.set(record.pos(), record.block_type) {
                inserted += 1;
            } else {
                rejected += 1;
            }
        }
        if rejected > 0 {
            debug!("Snapshot import rejected {rejected} duplicate or unaddressable records");
        }
        inserted
    }
}

impl Extend<BlockRecord> for WorldStore {
    fn extend<T: IntoIterator<Item = BlockRecord>>(&mut self, iter: T) {
        for record in iter {
            self.set(record.pos(), record.block_type);
        }
    }
}
