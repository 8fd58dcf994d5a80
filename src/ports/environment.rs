//! Environment port - what the agent needs from the physics world

use crate::agent::BallSnapshot;

/// The flipper motors. [`crate::agent::Action::run`] dispatches into this.
pub trait FlipperControl {
    /// Enable or disable the left flipper motor.
    fn set_left_flipper(&mut self, enabled: bool);

    /// Enable or disable the right flipper motor.
    fn set_right_flipper(&mut self, enabled: bool);
}

/// What happened during one physics step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    /// Rewards of the collisions that fired, in order
    pub rewards: Vec<f64>,
    /// Whether the ball touched the game-over region
    pub game_over: bool,
}

/// A simulated (or physical) pinball machine.
///
/// The driver loop calls [`Environment::step`], reads the snapshot, lets the
/// agent decide, and repeats. The environment owns respawning the ball; the
/// agent never does.
pub trait Environment: FlipperControl {
    /// Advance the world by `dt` seconds.
    fn step(&mut self, dt: f64) -> StepOutcome;

    /// Current ball kinematics and flipper state.
    fn snapshot(&self) -> BallSnapshot;

    /// Put the ball back at its launch position.
    fn respawn_ball(&mut self);

    /// Whether the ball is inside the region where flipper decisions matter.
    ///
    /// # Default Implementation
    ///
    /// Returns `true`, disabling the stuck-ball guard.
    fn in_capture_frame(&self) -> bool {
        true
    }
}
