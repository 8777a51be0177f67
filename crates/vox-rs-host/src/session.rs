//! Console-driven play session: held keys, camera angles and the world.

use std::path::PathBuf;

use tracing::{info, warn};
use vox_rs_world::{BlockType, MovementIntent, PlayerState, TerrainParams, World};

use crate::console::{self, Command, MoveKey, HELP};
use crate::persistence;

/// Result of running one console command.
pub struct Reply {
    pub success: bool,
    pub messages: Vec<String>,
    /// If true, the host should save and exit.
    pub should_stop: bool,
}

impl Reply {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            messages: vec![message.into()],
            should_stop: false,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            messages: vec![message.into()],
            should_stop: false,
        }
    }
}

pub struct Session {
    world: World,
    params: TerrainParams,
    save_path: PathBuf,
    reach: f32,
    /// Seconds left on each held key, indexed by [`key_slot`].
    held: [f32; 4],
    jump_queued: bool,
    yaw: f32,
    pitch: f32,
}

fn key_slot(key: MoveKey) -> usize {
    match key {
        MoveKey::Forward => 0,
        MoveKey::Back => 1,
        MoveKey::Left => 2,
        MoveKey::Right => 3,
    }
}

impl Session {
    pub fn new(world: World, params: TerrainParams, save_path: PathBuf, reach: f32) -> Self {
        let mut session = Self {
            world,
            params,
            save_path,
            reach,
            held: [0.0; 4],
            jump_queued: false,
            yaw: 0.0,
            pitch: 0.0,
        };
        session.sync_facing();
        session
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    fn sync_facing(&mut self) {
        self.world
            .set_facing(MovementIntent::look_direction(self.yaw, self.pitch));
    }

    fn intent(&self) -> MovementIntent {
        MovementIntent {
            forward: self.held[0] > 0.0,
            back: self.held[1] > 0.0,
            left: self.held[2] > 0.0,
            right: self.held[3] > 0.0,
            jump: self.jump_queued,
            facing: MovementIntent::look_direction(self.yaw, self.pitch),
        }
    }

    /// Advance one host frame of `dt` seconds.
    pub fn frame(&mut self, dt: f32) -> PlayerState {
        let intent = self.intent();
        self.jump_queued = false;
        let state = self.world.advance(&intent, dt);
        for remaining in &mut self.held {
            *remaining = (*remaining - dt).max(0.0);
        }
        state
    }

    pub fn handle_line(&mut self, line: &str) -> Reply {
        match console::parse(line) {
            Ok(cmd) => self.execute(cmd),
            Err(msg) => Reply::err(msg),
        }
    }

    pub fn execute(&mut self, cmd: Command) -> Reply {
        match cmd {
            Command::Move(key, seconds) => {
                self.held[key_slot(key)] = seconds;
                Reply::ok(format!("Holding {key:?} for {seconds:.2}s"))
            }
            Command::Stop => {
                self.held = [0.0; 4];
                Reply::ok("Stopped")
            }
            Command::Jump => {
                self.jump_queued = true;
                Reply::ok("Jump")
            }
            Command::Yaw(deg) => {
                self.yaw = deg.to_radians();
                self.sync_facing();
                Reply::ok(format!("Facing yaw {deg:.1}°"))
            }
            Command::Look(yaw, pitch) => {
                let pitch = pitch.clamp(-89.0, 89.0);
                self.yaw = yaw.to_radians();
                self.pitch = pitch.to_radians();
                self.sync_facing();
                Reply::ok(format!("Looking yaw {yaw:.1}°, pitch {pitch:.1}°"))
            }
            Command::Place(pos, block_type) => match self.world.place_block(pos, block_type) {
                Ok(()) => Reply::ok(format!("Placed {block_type} at {pos}")),
                Err(e) => Reply::err(e.to_string()),
            },
            Command::Break(pos) => match self.world.break_block(pos) {
                Ok(removed) => Reply::ok(format!("Broke {removed} at {pos}")),
                Err(e) => Reply::err(e.to_string()),
            },
            Command::Use => match self.world.pick(self.reach) {
                Some(hit) => {
                    let pos = hit.placement();
                    match self.world.place_block(pos, BlockType::Stone) {
                        Ok(()) => Reply::ok(format!("Placed stone at {pos}")),
                        Err(e) => Reply::err(e.to_string()),
                    }
                }
                None => Reply::err("No block in reach"),
            },
            Command::Dig => match self.world.pick(self.reach) {
                Some(hit) => match self.world.break_block(hit.block) {
                    Ok(removed) => Reply::ok(format!("Broke {removed} at {}", hit.block)),
                    Err(e) => Reply::err(e.to_string()),
                },
                None => Reply::err("No block in reach"),
            },
            Command::Pick => match self.world.pick(self.reach) {
                Some(hit) => Reply::ok(format!(
                    "{} at {} ({:?} face, {:.2} away)",
                    hit.block_type, hit.block, hit.face, hit.distance
                )),
                None => Reply::ok("Nothing in reach"),
            },
            Command::Pos => {
                let state = self.world.state();
                Reply::ok(format!(
                    "Position {} velocity {} {}",
                    state.position,
                    state.velocity,
                    if state.grounded { "grounded" } else { "airborne" }
                ))
            }
            Command::Save => {
                if self.save() {
                    Reply::ok(format!("Saved to {}", self.save_path.display()))
                } else {
                    Reply::err("Save failed, see log")
                }
            }
            Command::Regen => {
                let placed = self.world.regenerate(&self.params);
                Reply::ok(format!("Generated {placed} blocks"))
            }
            Command::Help => {
                let mut lines = vec!["Available commands:".to_string()];
                lines.extend(HELP.iter().map(|(usage, desc)| format!("  {usage} - {desc}")));
                Reply {
                    success: true,
                    messages: lines,
                    should_stop: false,
                }
            }
            Command::Quit => Reply {
                success: true,
                messages: vec!["Exiting...".to_string()],
                should_stop: true,
            },
        }
    }

    /// Write the world to the save path. Failures are logged, not fatal.
    pub fn save(&self) -> bool {
        match persistence::save_world(&self.world, &self.save_path) {
            Ok(()) => {
                info!(
                    "Saved {} blocks to {}",
                    self.world.store().len(),
                    self.save_path.display()
                );
                true
            }
            Err(e) => {
                warn!("Failed to save world to {}: {e}", self.save_path.display());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vox_rs_world::clock::Timestep;
    use vox_rs_world::{BlockPos, PlayerSettings};

    const DT: f32 = 1.0 / 60.0;

    fn params() -> TerrainParams {
        TerrainParams {
            width: 10,
            depth: 10,
            max_height: 1,
            ..TerrainParams::default()
        }
    }

    fn session() -> Session {
        let world = World::generate(&params(), PlayerSettings::default(), Timestep::Variable);
        let save_path =
            std::env::temp_dir().join(format!("vox_rs_session_{}.json", rand::random::<u64>()));
        let mut session = Session::new(world, params(), save_path, 6.0);
        for _ in 0..600 {
            if session.frame(DT).grounded {
                return session;
            }
        }
        panic!("player never landed");
    }

    #[test]
    fn held_key_moves_then_expires() {
        let mut s = session();
        let start = s.world().state().position;
        assert!(s.handle_line("forward 0.5").success);
        for _ in 0..60 {
            s.frame(DT);
        }
        let end = s.world().state().position;
        // Yaw 0 faces -Z; about 0.5s at 6 blocks/s.
        assert!(end.z < start.z - 2.5 && end.z > start.z - 3.5, "z {}", end.z);
        let after = s.frame(DT).position;
        assert_eq!(after.z, end.z);
    }

    #[test]
    fn stop_releases_keys() {
        let mut s = session();
        s.handle_line("right 10");
        s.frame(DT);
        s.handle_line("stop");
        let x = s.frame(DT).position.x;
        assert_eq!(s.frame(DT).position.x, x);
    }

    #[test]
    fn jump_is_consumed_once() {
        let mut s = session();
        assert!(s.handle_line("jump").success);
        let state = s.frame(DT);
        assert!(!state.grounded);
        assert!(state.velocity.y > 0.0);
        assert!(!s.jump_queued);
    }

    #[test]
    fn use_and_dig_target_looked_at_block() {
        let mut s = session();
        assert!(s.handle_line("look 0 -90").success);
        let picked = s.world().pick(6.0).unwrap().block;
        assert_eq!(picked.y, 0);

        // Placing on the top face would land inside the player.
        let reply = s.handle_line("use");
        assert!(!reply.success);

        let reply = s.handle_line("dig");
        assert!(reply.success, "{:?}", reply.messages);
        assert!(!s.world().store().contains(picked));
    }

    #[test]
    fn place_and_break_by_coordinates() {
        let mut s = session();
        assert!(s.handle_line("place 3 1 3 wood").success);
        assert_eq!(
            s.world().store().get(BlockPos::new(3, 1, 3)),
            Some(BlockType::Wood)
        );
        assert!(!s.handle_line("place 3 1 3").success);
        assert!(s.handle_line("break 3 1 3").success);
        assert!(!s.handle_line("break 3 1 3").success);
    }

    #[test]
    fn save_writes_snapshot() {
        let s = session();
        assert!(s.save());
        let contents = std::fs::read_to_string(&s.save_path).unwrap();
        assert!(contents.starts_with("{\"version\":1"));
        std::fs::remove_file(&s.save_path).ok();
    }

    #[test]
    fn quit_requests_stop() {
        let mut s = session();
        let reply = s.handle_line("quit");
        assert!(reply.should_stop);
        assert!(!s.handle_line("fly").success);
    }
}
