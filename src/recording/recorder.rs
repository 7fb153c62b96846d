use std::time::Instant;

use crate::{
    error::{Result, SessionError},
    session::SessionMode,
    types::{LandmarkFrame, Recording},
};

pub const DEFAULT_FPS: f64 = 30.0;

/// How the frame rate stored with a take is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum FpsPolicy {
    /// Retained frames divided by the seconds between start and stop.
    #[default]
    Measured,
    Fixed(f64),
}

impl FpsPolicy {
    fn resolve(&self, retained: usize, elapsed_secs: f64) -> f64 {
        let fps = match *self {
            FpsPolicy::Fixed(fps) => fps,
            FpsPolicy::Measured => retained as f64 / elapsed_secs,
        };
        if fps.is_finite() && fps > 0.0 {
            fps
        } else {
            log::debug!("fps estimate {fps} unusable, falling back to {DEFAULT_FPS}");
            DEFAULT_FPS
        }
    }
}

#[derive(Debug)]
struct Take {
    action_name: String,
    started_at: Instant,
    frames: Vec<LandmarkFrame>,
}

#[derive(Debug, Default)]
pub struct Recorder {
    policy: FpsPolicy,
    take: Option<Take>,
}

impl Recorder {
    pub fn new(policy: FpsPolicy) -> Self {
        Self { policy, take: None }
    }

    pub fn is_active(&self) -> bool {
        self.take.is_some()
    }

    pub fn action_name(&self) -> Option<&str> {
        self.take.as_ref().map(|t| t.action_name.as_str())
    }

    pub fn retained_frames(&self) -> usize {
        self.take.as_ref().map_or(0, |t| t.frames.len())
    }

    pub fn start(&mut self, action_name: &str, now: Instant) -> Result<()> {
        if self.is_active() {
            return Err(SessionError::ModeConflict {
                active: SessionMode::Recording,
                requested: "start recording",
            });
        }
        let action_name = validate_action_name(action_name)?;
        log::info!("recording '{action_name}'");
        self.take = Some(Take {
            action_name,
            started_at: now,
            frames: Vec::new(),
        });
        Ok(())
    }

    /// Buffers `frame` if a take is running and a hand was seen.
    pub fn append(&mut self, frame: &LandmarkFrame) -> bool {
        match self.take.as_mut() {
            Some(take) if !frame.is_empty() => {
                take.frames.push(frame.clone());
                true
            }
            _ => false,
        }
    }

    /// Ends the take. Returns `None` when there is nothing worth saving.
    pub fn stop(&mut self, now: Instant) -> Result<Option<Recording>> {
        let Some(take) = self.take.take() else {
            return Ok(None);
        };
        if take.frames.is_empty() {
            log::info!("no hand frames captured for '{}', nothing to save", take.action_name);
            return Ok(None);
        }

        let elapsed = now.saturating_duration_since(take.started_at).as_secs_f64();
        let fps = self.policy.resolve(take.frames.len(), elapsed);
        log::info!(
            "captured {} frames for '{}' at {fps:.2} fps",
            take.frames.len(),
            take.action_name
        );
        Recording::new(take.action_name, fps, take.frames).map(Some)
    }
}

/// Trims the name and rejects anything that cannot be part of a file name.
pub fn validate_action_name(action_name: &str) -> Result<String> {
    let trimmed = action_name.trim();
    if trimmed.is_empty() {
        return Err(SessionError::Validation("action name is empty".to_string()));
    }
    if trimmed.contains(['/', '\\']) || trimmed == "." || trimmed == ".." {
        return Err(SessionError::Validation(format!(
            "action name '{trimmed}' cannot be used as a file name"
        )));
    }
    Ok(trimmed.to_string())
}
