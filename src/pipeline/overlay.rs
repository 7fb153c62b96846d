use std::{
    thread,
    time::{Duration, Instant},
};

use image::RgbaImage;

use super::{skeleton, sphere::InteractiveSphere};
use crate::types::LandmarkFrame;

/// Per-tick picture: the hand skeleton with the optional sphere on top.
#[derive(Clone, Debug)]
pub struct Overlay {
    width: u32,
    height: u32,
    sphere: Option<InteractiveSphere>,
}

impl Overlay {
    pub fn new(width: u32, height: u32, sphere: Option<InteractiveSphere>) -> Self {
        Self {
            width,
            height,
            sphere,
        }
    }

    /// Moves the sphere for this frame and draws everything.
    pub fn compose(&mut self, frame: &LandmarkFrame) -> RgbaImage {
        let mut canvas = skeleton::render(frame.points(), self.width, self.height);
        if let Some(sphere) = self.sphere.as_mut() {
            if sphere.update(frame, self.width, self.height) {
                log::debug!("sphere grabbed at {:?}", sphere.position());
            }
            sphere.draw(&mut canvas);
        }
        canvas
    }
}

/// Spaces ticks `1000/fps` ms apart. The first tick is immediate.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    next_tick: Option<Instant>,
}

impl Pacer {
    pub fn from_fps(fps: f64) -> Self {
        let interval = if fps.is_finite() && fps > 0.0 {
            Duration::from_millis((1_000.0 / fps) as u64)
        } else {
            Duration::ZERO
        };
        Self {
            interval,
            next_tick: None,
        }
    }

    pub fn unpaced() -> Self {
        Self {
            interval: Duration::ZERO,
            next_tick: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn wait(&mut self) {
        let now = Instant::now();
        if let Some(deadline) = self.next_tick {
            if deadline > now {
                thread::sleep(deadline - now);
            }
        }
        // Anchor on the later of the deadline and now so a stall does not
        // cause a burst of catch-up ticks.
        let anchor = self.next_tick.map_or(now, |deadline| deadline.max(now));
        self.next_tick = Some(anchor + self.interval);
    }
}
