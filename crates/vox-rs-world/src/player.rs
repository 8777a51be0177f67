//! Player controller: owns position/velocity, integrates gravity and jumps,
//! and moves the player through the [`CollisionSolver`].

use tracing::debug;

use crate::math::Vec3;
use crate::physics::{
    CollisionSolver, CONTACT_SKIN, GRAVITY, JUMP_VELOCITY, MAX_STEP_SECONDS, PLAYER_HEIGHT,
    VOID_Y, WALK_SPEED,
};
use crate::store::WorldStore;

/// Facing used when the supplied look direction has no horizontal part.
const DEFAULT_FACING: Vec3 = Vec3::new(0.0, 0.0, -1.0);

/// Tunable movement parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSettings {
    pub speed: f32,
    pub jump_velocity: f32,
    pub gravity: f32,
    pub spawn: Vec3,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            speed: WALK_SPEED,
            jump_velocity: JUMP_VELOCITY,
            gravity: GRAVITY,
            spawn: Vec3::new(0.0, 10.0, 0.0),
        }
    }
}

/// Per-tick input from the host's input/camera layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementIntent {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    /// World-space look direction. Only its yaw affects movement.
    pub facing: Vec3,
}

impl Default for MovementIntent {
    fn default() -> Self {
        Self {
            forward: false,
            back: false,
            left: false,
            right: false,
            jump: false,
            facing: DEFAULT_FACING,
        }
    }
}

impl MovementIntent {
    /// Look direction for a camera yaw/pitch in radians. Yaw 0 faces -Z,
    /// positive yaw turns towards -X.
    pub fn look_direction(yaw: f32, pitch: f32) -> Vec3 {
        Vec3::new(
            -yaw.sin() * pitch.cos(),
            pitch.sin(),
            -yaw.cos() * pitch.cos(),
        )
    }

    pub fn facing_yaw(yaw: f32) -> Self {
        Self {
            facing: Self::look_direction(yaw, 0.0),
            ..Self::default()
        }
    }

    pub fn is_idle(&self) -> bool {
        !(self.forward || self.back || self.left || self.right || self.jump)
    }

    /// Horizontal displacement for `dt` seconds at `speed`: normalised
    /// direction rotated into the yaw-only forward/right basis.
    pub fn displacement(&self, speed: f32, dt: f32) -> Vec3 {
        let mut dir = Vec3::ZERO;
        if self.forward {
            dir.z -= 1.0;
        }
        if self.back {
            dir.z += 1.0;
        }
        if self.left {
            dir.x -= 1.0;
        }
        if self.right {
            dir.x += 1.0;
        }
        let dir = dir.normalize_or_zero();
        if dir == Vec3::ZERO {
            return Vec3::ZERO;
        }

        let mut forward = self.facing.horizontal().normalize_or_zero();
        if forward == Vec3::ZERO {
            forward = DEFAULT_FACING;
        }
        let right = forward.cross(&Vec3::UP).normalize_or_zero();

        forward * (-dir.z * speed * dt) + right * (dir.x * speed * dt)
    }
}

/// Snapshot of the player handed to the renderer after each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub grounded: bool,
}

/// Vertical movement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Airborne,
    Grounded,
}

/// Sole writer of the player's position and velocity.
#[derive(Debug, Clone)]
pub struct PlayerController {
    settings: PlayerSettings,
    position: Vec3,
    velocity: Vec3,
    motion: Motion,
}

impl PlayerController {
    /// New controller standing at the configured spawn, airborne.
    pub fn new(settings: PlayerSettings) -> Self {
        Self {
            position: settings.spawn,
            settings,
            velocity: Vec3::ZERO,
            motion: Motion::Airborne,
        }
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }

    pub fn can_jump(&self) -> bool {
        self.motion == Motion::Grounded
    }

    pub fn spawn(&self) -> Vec3 {
        self.settings.spawn
    }

    pub fn set_spawn(&mut self, spawn: Vec3) {
        self.settings.spawn = spawn;
    }

    pub fn state(&self) -> PlayerState {
        PlayerState {
            position: self.position,
            velocity: self.velocity,
            grounded: self.motion == Motion::Grounded,
        }
    }

    /// Move to `position` with zero velocity, airborne.
    pub fn teleport(&mut self, position: Vec3) {
        self.position = position;
        self.velocity = Vec3::ZERO;
        self.motion = Motion::Airborne;
    }

    pub fn respawn(&mut self) {
        self.teleport(self.settings.spawn);
    }

    /// Advance the player by one simulation step.
    ///
    /// `dt` is clamped to `[0, MAX_STEP_SECONDS]`.
    pub fn tick(&mut self, blocks: &WorldStore, intent: &MovementIntent, dt: f32) -> PlayerState {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, MAX_STEP_SECONDS)
        } else {
            0.0
        };
        let solver = CollisionSolver::new(blocks);

        let ground = solver.ground_surface(self.position);
        let mut grounded = ground.is_some();
        // A box resting on a block edge can be Grounded with nothing in the
        // probe cell; jumping follows the motion state too.
        if intent.jump && (grounded || self.motion == Motion::Grounded) {
            self.velocity.y += self.settings.jump_velocity;
            grounded = false;
        }

        // Settle onto the probed block so a grounded player never hovers
        // inside the probe distance.
        if let Some(top) = ground.filter(|_| grounded) {
            let rest = top + PLAYER_HEIGHT + CONTACT_SKIN;
            if self.position.y > rest {
                self.position.y = rest;
            }
        }

        self.velocity.y -= self.settings.gravity * dt;
        if grounded && self.velocity.y < 0.0 {
            self.velocity.y = 0.0;
        }

        let mut displacement = intent.displacement(self.settings.speed, dt);
        displacement.y = self.velocity.y * dt;

        let res = solver.resolve(self.position, displacement, self.velocity.y);
        self.position = res.position;
        self.velocity.y = res.vertical_velocity;

        self.motion = if res.contacts.ground {
            Motion::Grounded
        } else if res.contacts.ceiling || !grounded {
            Motion::Airborne
        } else {
            Motion::Grounded
        };

        if self.position.y < VOID_Y {
            debug!(
                "Player fell into the void at {}, respawning at {}",
                self.position, self.settings.spawn
            );
            self.respawn();
        }

        self.state()
    }
}
