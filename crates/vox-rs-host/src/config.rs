use serde::Deserialize;
use std::path::Path;

use vox_rs_world::clock::Timestep;
use vox_rs_world::{PlayerSettings, TerrainParams, Vec3};

#[derive(Debug, Deserialize)]
pub struct SandboxConfig {
    pub world: WorldSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub player: PlayerSection,
    #[serde(default)]
    pub simulation: SimulationSection,
}

#[derive(Debug, Deserialize)]
pub struct WorldSection {
    #[serde(default = "default_extent")]
    pub width: u32,
    #[serde(default = "default_extent")]
    pub depth: u32,
    #[serde(default = "default_max_height")]
    pub max_height: u32,
    pub seed: i64,
    #[serde(default = "default_octaves")]
    pub octaves: u32,
    #[serde(default = "default_persistence")]
    pub persistence: f64,
    /// Snapshot file loaded at startup and written on save.
    #[serde(default = "default_save_path")]
    pub save_path: String,
    /// Auto-save interval in seconds. 0 = disabled.
    #[serde(default)]
    pub auto_save_interval: u64,
}

fn default_extent() -> u32 {
    40
}

fn default_max_height() -> u32 {
    6
}

fn default_octaves() -> u32 {
    3
}

fn default_persistence() -> f64 {
    0.5
}

fn default_save_path() -> String {
    "world.json".into()
}

#[derive(Debug, Deserialize)]
pub struct PlayerSection {
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_jump_velocity")]
    pub jump_velocity: f32,
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    #[serde(default = "default_spawn")]
    pub spawn: [f32; 3],
}

fn default_speed() -> f32 {
    6.0
}

fn default_jump_velocity() -> f32 {
    8.0
}

fn default_gravity() -> f32 {
    9.8
}

fn default_spawn() -> [f32; 3] {
    [0.0, 10.0, 0.0]
}

impl Default for PlayerSection {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            jump_velocity: default_jump_velocity(),
            gravity: default_gravity(),
            spawn: default_spawn(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SimulationSection {
    /// Host frame rate driving `World::advance`.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    /// Fixed step in seconds. Absent = one variable step per frame.
    #[serde(default)]
    pub fixed_step: Option<f32>,
    /// Maximum block picking distance.
    #[serde(default = "default_reach")]
    pub reach: f32,
}

fn default_frame_rate() -> u32 {
    60
}

fn default_reach() -> f32 {
    6.0
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            fixed_step: None,
            reach: default_reach(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    pub level: String,
}

impl SandboxConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn terrain_params(&self) -> TerrainParams {
        TerrainParams {
            width: self.world.width,
            depth: self.world.depth,
            max_height: self.world.max_height,
            seed: self.world.seed,
            octaves: self.world.octaves,
            persistence: self.world.persistence,
        }
    }

    pub fn player_settings(&self) -> PlayerSettings {
        let [x, y, z] = self.player.spawn;
        PlayerSettings {
            speed: self.player.speed,
            jump_velocity: self.player.jump_velocity,
            gravity: self.player.gravity,
            spawn: Vec3::new(x, y, z),
        }
    }

    /// Picking distance; a non-finite or negative `reach` uses the default.
    pub fn reach(&self) -> f32 {
        let reach = self.simulation.reach;
        if reach.is_finite() && reach >= 0.0 {
            reach
        } else {
            default_reach()
        }
    }

    pub fn timestep(&self) -> Timestep {
        match self.simulation.fixed_step {
            Some(step) => Timestep::Fixed { step },
            None => Timestep::Variable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config() {
        let toml_str = r#"
            [world]
            seed = 12345

            [logging]
            level = "debug"
        "#;
        let config: SandboxConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.world.seed, 12345);
        assert_eq!(config.world.width, 40);
        assert_eq!(config.world.depth, 40);
        assert_eq!(config.world.max_height, 6);
        assert_eq!(config.world.octaves, 3);
        assert_eq!(config.world.save_path, "world.json");
        assert_eq!(config.world.auto_save_interval, 0); // default
        assert_eq!(config.logging.level, "debug");
        // player section defaults when absent
        assert_eq!(config.player.speed, 6.0);
        assert_eq!(config.player.spawn, [0.0, 10.0, 0.0]);
        // simulation section defaults when absent
        assert_eq!(config.simulation.frame_rate, 60);
        assert_eq!(config.timestep(), Timestep::Variable);
        assert_eq!(config.player_settings(), PlayerSettings::default());
        assert_eq!(config.terrain_params().seed, 12345);
    }

    #[test]
    fn parse_config_with_fixed_step() {
        let toml_str = r#"
            [world]
            width = 16
            depth = 8
            seed = -7
            save_path = "saves/test.json"

            [player]
            speed = 4.5
            spawn = [1.0, 20.0, -3.0]

            [simulation]
            frame_rate = 30
            fixed_step = 0.01

            [logging]
            level = "info"
        "#;
        let config: SandboxConfig = toml::from_str(toml_str).unwrap();
        let params = config.terrain_params();
        assert_eq!((params.width, params.depth, params.seed), (16, 8, -7));
        assert_eq!(config.world.save_path, "saves/test.json");
        let settings = config.player_settings();
        assert_eq!(settings.speed, 4.5);
        assert_eq!(settings.spawn, Vec3::new(1.0, 20.0, -3.0));
        assert_eq!(config.timestep(), Timestep::Fixed { step: 0.01 });
        assert_eq!(config.simulation.frame_rate, 30);
    }

    #[test]
    fn unbounded_reach_falls_back_to_default() {
        let toml_str = r#"
            [simulation]
            reach = inf

            [logging]
            level = "info"
        "#;
        let config: SandboxConfig = toml::from_str(toml_str).unwrap();
        assert!(config.simulation.reach.is_infinite());
        assert_eq!(config.reach(), 6.0);

        let toml_str = r#"
            [simulation]
            reach = 4.5

            [logging]
            level = "info"
        "#;
        let config: SandboxConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.reach(), 4.5);
    }

    #[test]
    fn missing_logging_section_is_an_error() {
        let toml_str = r#"
            [world]
            seed = 1
        "#;
        assert!(toml::from_str::<SandboxConfig>(toml_str).is_err());
    }
}
