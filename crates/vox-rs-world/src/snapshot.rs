//! JSON snapshot codec for persisting a [`WorldStore`](crate::WorldStore).
//!
//! Current layout:
//!
//! ```json
//! { "version": 1, "blocks": [ { "x": 0, "y": 0, "z": 0, "type": "grass" } ] }
//! ```
//!
//! A bare array of block records (the older, unversioned layout) is read as
//! version 0. Decoding is lenient per record: a record with a bad coordinate
//! is skipped and a record with an unknown type tag becomes grass. Only a
//! document that is not JSON at all, or whose top level has the wrong shape,
//! fails as a whole.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::block::{BlockRecord, BlockType};
use crate::error::SnapshotError;

/// Version written by [`encode`].
pub const SNAPSHOT_VERSION: u64 = 1;

#[derive(Serialize)]
struct SnapshotFile<'a> {
    version: u64,
    blocks: &'a [BlockRecord],
}

/// Per-record outcome counts from a decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Records decoded (including defaulted ones).
    pub accepted: usize,
    /// Records dropped because of a missing or non-integer coordinate.
    pub skipped: usize,
    /// Records whose type tag was unknown and fell back to grass.
    pub defaulted: usize,
}

/// Result of decoding a snapshot document.
#[derive(Debug, Clone, Default)]
pub struct DecodedSnapshot {
    pub version: u64,
    pub records: Vec<BlockRecord>,
    pub report: ImportReport,
}

/// Serialize records to the current versioned layout.
pub fn encode(records: &[BlockRecord]) -> Result<String, SnapshotError> {
    let file = SnapshotFile {
        version: SNAPSHOT_VERSION,
        blocks: records,
    };
    Ok(serde_json::to_string(&file)?)
}

/// Parse a snapshot document, skipping malformed records.
pub fn decode(input: &str) -> Result<DecodedSnapshot, SnapshotError> {
    let root: Value = serde_json::from_str(input)?;

    let (version, entries) = match root {
        Value::Array(entries) => (0, entries),
        Value::Object(mut map) => {
            let version = match map.get("version") {
                None => 0,
                Some(v) => v.as_u64().ok_or_else(|| {
                    SnapshotError::InvalidLayout("version must be a non-negative integer".into())
                })?,
            };
            if version > SNAPSHOT_VERSION {
                return Err(SnapshotError::UnsupportedVersion(version));
            }
            match map.remove("blocks") {
                Some(Value::Array(entries)) => (version, entries),
                Some(_) => {
                    return Err(SnapshotError::InvalidLayout(
                        "\"blocks\" must be an array".into(),
                    ))
                }
                None => {
                    return Err(SnapshotError::InvalidLayout(
                        "missing \"blocks\" array".into(),
                    ))
                }
            }
        }
        _ => {
            return Err(SnapshotError::InvalidLayout(
                "expected an array or an object".into(),
            ))
        }
    };

    let mut decoded = DecodedSnapshot {
        version,
        records: Vec::with_capacity(entries.len()),
        report: ImportReport::default(),
    };

    for (index, entry) in entries.iter().enumerate() {
        match decode_record(entry) {
            Some((record, defaulted)) => {
                if defaulted {
                    decoded.report.defaulted += 1;
                }
                decoded.report.accepted += 1;
                decoded.records.push(record);
            }
            None => {
                warn!("Skipping malformed snapshot record #{index}: {entry}");
                decoded.report.skipped += 1;
            }
        }
    }

    if decoded.report.defaulted > 0 {
        warn!(
            "{} snapshot records had unknown block types, loaded as {}",
            decoded.report.defaulted,
            BlockType::FALLBACK
        );
    }

    Ok(decoded)
}

/// Decode one record. Returns the record and whether its type was defaulted.
fn decode_record(entry: &Value) -> Option<(BlockRecord, bool)> {
    let obj = entry.as_object()?;
    let x = integer_coord(obj.get("x")?)?;
    let y = integer_coord(obj.get("y")?)?;
    let z = integer_coord(obj.get("z")?)?;

    let (block_type, defaulted) = match obj.get("type").and_then(Value::as_str) {
        Some(tag) => BlockType::from_tag_lossy(tag),
        None => (BlockType::FALLBACK, true),
    };

    Some((
        BlockRecord {
            x,
            y,
            z,
            block_type,
        },
        defaulted,
    ))
}

/// Accept JSON integers and integral floats (`3.0`) that fit in `i32`.
fn integer_coord(value: &Value) -> Option<i32> {
    if let Some(i) = value.as_i64() {
        return i32::try_from(i).ok();
    }
    let f = value.as_f64()?;
    if f.fract() != 0.0 || f < i32::MIN as f64 || f > i32::MAX as f64 {
        return None;
    }
    Some(f as i32)
}
