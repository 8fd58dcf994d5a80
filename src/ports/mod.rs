//! Ports (trait boundaries) for external dependencies.
//!
//! The agent core only talks to the outside world through these traits:
//! the physics world behind [`Environment`] / [`FlipperControl`], the
//! persistence layer behind [`PolicyRepository`], and telemetry sinks behind
//! [`Observer`].

pub mod environment;
pub mod observer;
pub mod repository;

pub use environment::{Environment, FlipperControl, StepOutcome};
pub use observer::{Observer, TickEvent};
pub use repository::PolicyRepository;
