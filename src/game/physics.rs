//! Platformer physics and collision checks

use super::level::{Level, Rect};

/// Downward acceleration applied every tick
pub const GRAVITY: f32 = 0.5;
/// Horizontal speed for left/right input
pub const RUN_SPEED: f32 = 5.0;
/// Vertical velocity applied on jump (negative is up)
pub const JUMP_VELOCITY: f32 = -10.0;

/// Collision box width. Narrower than the 40px sprite the client draws.
pub const BODY_WIDTH: f32 = 20.0;
/// Collision box height
pub const BODY_HEIGHT: f32 = 40.0;
/// Depth of the band below a platform's top edge that counts as landing on it
pub const LANDING_BAND: f32 = 10.0;

/// Where a hazard sends a player back to
pub const RESPAWN_X: f32 = 50.0;
pub const RESPAWN_Y: f32 = 400.0;

/// Kinematic state of one player
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Body {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub jumping: bool,
}

impl Body {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    /// Place the body at rest at the given point
    pub fn reset_to(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
        self.vx = 0.0;
        self.vy = 0.0;
    }

    fn overlaps_horizontally(&self, rect: &Rect) -> bool {
        self.x + BODY_WIDTH > rect.x && self.x < rect.right()
    }

    fn overlaps(&self, rect: &Rect) -> bool {
        self.overlaps_horizontally(rect) && self.y + BODY_HEIGHT > rect.y && self.y < rect.bottom()
    }

    fn feet_in_landing_band(&self, platform: &Rect) -> bool {
        let feet = self.y + BODY_HEIGHT;
        self.overlaps_horizontally(platform) && feet > platform.y && feet < platform.y + LANDING_BAND
    }
}

/// What happened to a body during one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepResult {
    pub landed: bool,
    pub hit_hazard: bool,
    pub reached_finish: bool,
}

/// Physics system for advancing bodies through the level
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Advance a body by one tick: integrate, land on platforms, apply hazards, test finish
    pub fn step(body: &mut Body, level: &Level) -> StepResult {
        let mut result = StepResult::default();

        body.vy += GRAVITY;
        body.x += body.vx;
        body.y += body.vy;

        // Checked in level order against the already-snapped position; the last match wins
        for platform in &level.platforms {
            if body.feet_in_landing_band(platform) {
                body.y = platform.y - BODY_HEIGHT;
                body.vy = 0.0;
                body.jumping = false;
                result.landed = true;
            }
        }

        if level.hazards.iter().any(|hazard| body.overlaps(hazard)) {
            body.reset_to(RESPAWN_X, RESPAWN_Y);
            result.hit_hazard = true;
        }

        result.reached_finish = body.overlaps_horizontally(&level.finish_line);
        result
    }
}
