//! A small 2D pinball table for training without an external physics engine.
//!
//! Coordinates follow the usual screen convention: origin in the top left
//! corner, y growing downwards, gravity pulling towards +y. The mechanics are
//! deliberately simple (point-vs-segment and circle collisions with
//! restitution, kinematic flippers driven by a motor flag) and make no claim
//! to rigid-body accuracy.

pub mod table;

pub use table::{Bumper, BumperKind, Flipper, PinballTable, TableLayout};

/// Field width in world units.
pub const FIELD_WIDTH: f64 = 0.5;
/// Field height in world units.
pub const FIELD_HEIGHT: f64 = 1.0;
/// Height of the game-over strip at the bottom of the field.
pub const GAME_OVER_HEIGHT: f64 = 0.01;
/// Downward acceleration.
pub const GRAVITY: f64 = 5.0;

pub const BALL_RADIUS: f64 = 0.025;
pub const BALL_RESTITUTION: f64 = 0.9;

pub const FLIPPER_LENGTH: f64 = 0.075;
pub const FLIPPER_RESTITUTION: f64 = 0.3;
/// Angular speed of a flipper motor, rad/s.
pub const FLIPPER_MOTOR_SPEED: f64 = 1.5 * std::f64::consts::PI;

/// Upper edge of the region where flipper decisions matter.
pub const CAPTURE_FRAME_TOP: f64 = 0.6 * FIELD_HEIGHT;
/// Physics substeps per call to `step`.
pub const SUBSTEPS: u32 = 8;
/// Ball speed ceiling; keeps the integration stable after violent contacts.
pub const MAX_BALL_SPEED: f64 = 8.0;
