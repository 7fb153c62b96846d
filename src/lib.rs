//! Record, replay and visualize single-hand landmark sequences.
//!
//! Landmark detection happens elsewhere; this crate takes the per-frame
//! points a tracker produces, draws them, records them to JSON files and plays
//! them back through a [`session::SessionController`] that never lets
//! recording and replay overlap.

pub mod actuator;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod recording;
pub mod session;
pub mod types;

pub use error::{Result, SessionError};
pub use session::{SessionController, SessionMode};
pub use types::{LandmarkFrame, LandmarkPoint, Recording};
