use std::path::PathBuf;

use crate::recording::{DEFAULT_RECORDINGS_DIR, FpsPolicy};

pub const RECORDINGS_DIR_ENV: &str = "HAND_MOTION_RECORDINGS_DIR";
pub const CANVAS_ENV: &str = "HAND_MOTION_CANVAS";
pub const FPS_ENV: &str = "HAND_MOTION_FPS";

const DEFAULT_CANVAS: (u32, u32) = (640, 480);

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub recordings_dir: PathBuf,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub fps_policy: FpsPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recordings_dir: PathBuf::from(DEFAULT_RECORDINGS_DIR),
            canvas_width: DEFAULT_CANVAS.0,
            canvas_height: DEFAULT_CANVAS.1,
            fps_policy: FpsPolicy::Measured,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from `lookup`; unusable values are logged and
    /// replaced by defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(RECORDINGS_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            config.recordings_dir = PathBuf::from(dir);
        }

        if let Some(raw) = lookup(CANVAS_ENV) {
            match parse_canvas(&raw) {
                Some((w, h)) => {
                    config.canvas_width = w;
                    config.canvas_height = h;
                }
                None => log::warn!("ignoring {CANVAS_ENV}={raw:?}, expected WIDTHxHEIGHT"),
            }
        }

        if let Some(raw) = lookup(FPS_ENV) {
            match raw.trim().parse::<f64>() {
                Ok(fps) if fps.is_finite() && fps > 0.0 => {
                    config.fps_policy = FpsPolicy::Fixed(fps);
                }
                _ => log::warn!("ignoring {FPS_ENV}={raw:?}, expected a positive number"),
            }
        }

        config
    }
}

pub fn parse_canvas(raw: &str) -> Option<(u32, u32)> {
    let (w, h) = raw.trim().split_once(['x', 'X'])?;
    let w: u32 = w.trim().parse().ok()?;
    let h: u32 = h.trim().parse().ok()?;
    (w > 0 && h > 0).then_some((w, h))
}
