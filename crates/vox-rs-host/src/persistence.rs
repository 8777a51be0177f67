//! World snapshot file persistence.

use std::path::Path;

use tracing::warn;
use vox_rs_world::clock::Timestep;
use vox_rs_world::{PlayerSettings, World};

/// Load a saved world. Returns `None` when the file is missing or cannot be
/// decoded; the caller then generates fresh terrain. An unreadable save is
/// moved to `<name>.json.corrupt` so later saves and their backup rotation
/// cannot overwrite it.
pub fn load_world(path: &Path, settings: PlayerSettings, timestep: Timestep) -> Option<World> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Failed to read world save {}: {e}", path.display());
            set_aside(path);
            return None;
        }
    };
    match World::from_snapshot(&contents, settings, timestep) {
        Ok(world) => Some(world),
        Err(e) => {
            warn!("Failed to parse world save {}: {e}", path.display());
            set_aside(path);
            None
        }
    }
}

fn set_aside(path: &Path) {
    let target = path.with_extension("json.corrupt");
    match std::fs::rename(path, &target) {
        Ok(()) => warn!("Moved unreadable save to {}", target.display()),
        Err(e) => warn!("Could not move unreadable save {}: {e}", path.display()),
    }
}

/// Write the world's blocks to `path`, keeping the previous file as
/// `<name>.json_old`.
pub fn save_world(world: &World, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let json = world.export_snapshot()?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Backup old file
    if path.exists() {
        let backup = path.with_extension("json_old");
        std::fs::copy(path, backup).ok();
    }

    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use vox_rs_world::{BlockPos, BlockType, TerrainParams};

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vox_rs_persist_{}", rand::random::<u64>()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn small_world() -> World {
        let params = TerrainParams {
            width: 6,
            depth: 6,
            max_height: 3,
            ..TerrainParams::default()
        };
        World::generate(&params, PlayerSettings::default(), Timestep::Variable)
    }

    #[test]
    fn world_roundtrip() {
        let dir = temp_dir();
        let path = dir.join("world.json");

        let mut world = small_world();
        world
            .place_block(BlockPos::new(0, 5, 4), BlockType::Wood)
            .unwrap();
        save_world(&world, &path).unwrap();

        let loaded = load_world(&path, PlayerSettings::default(), Timestep::Variable).unwrap();
        assert_eq!(loaded.store().len(), world.store().len());
        assert_eq!(
            loaded.store().get(BlockPos::new(0, 5, 4)),
            Some(BlockType::Wood)
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn backup_created() {
        let dir = temp_dir();
        let path = dir.join("world.json");

        let world = small_world();
        save_world(&world, &path).unwrap();
        // Save again, should create world.json_old
        save_world(&world, &path).unwrap();

        assert!(dir.join("world.json_old").exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn creates_parent_directories() {
        let dir = temp_dir();
        let path = dir.join("saves").join("nested").join("world.json");

        save_world(&small_world(), &path).unwrap();
        assert!(path.exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_returns_none() {
        let dir = temp_dir();
        let path = dir.join("nothing.json");
        assert!(load_world(&path, PlayerSettings::default(), Timestep::Variable).is_none());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn corrupt_file_returns_none() {
        let dir = temp_dir();
        let path = dir.join("world.json");
        std::fs::write(&path, "{\"version\": 1, \"blocks\": 5}").unwrap();
        assert!(load_world(&path, PlayerSettings::default(), Timestep::Variable).is_none());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn corrupt_file_survives_later_saves() {
        let dir = temp_dir();
        let path = dir.join("world.json");
        let original = "{\"version\": 1, \"blocks\": [";
        std::fs::write(&path, original).unwrap();

        assert!(load_world(&path, PlayerSettings::default(), Timestep::Variable).is_none());
        assert!(!path.exists());
        let kept = dir.join("world.json.corrupt");
        assert_eq!(std::fs::read_to_string(&kept).unwrap(), original);

        // Two saves rotate world.json_old; the bad file stays put.
        let world = small_world();
        save_world(&world, &path).unwrap();
        save_world(&world, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&kept).unwrap(), original);
        assert!(load_world(&path, PlayerSettings::default(), Timestep::Variable).is_some());

        std::fs::remove_dir_all(&dir).ok();
    }
}
