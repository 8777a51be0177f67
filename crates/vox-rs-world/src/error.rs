//! World-level error types.

use thiserror::Error;

use crate::block::BlockPos;

/// Why a block edit was refused. None of these are fatal; callers treat
/// them as "nothing happened".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("block already present at {0}")]
    Occupied(BlockPos),

    #[error("no block at {0}")]
    Missing(BlockPos),

    #[error("block at {0} would overlap the player")]
    ObstructedByPlayer(BlockPos),

    #[error("position {0} is outside the addressable world")]
    OutOfRange(BlockPos),
}

/// Snapshot decode/encode failures. Individual bad records never produce
/// one of these; they are skipped and counted instead.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported snapshot version: {0}")]
    UnsupportedVersion(u64),

    #[error("invalid snapshot layout: {0}")]
    InvalidLayout(String),
}
