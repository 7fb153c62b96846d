//! One-way text link to a microcontroller. Each hand frame becomes a line
//! of `px,py,z` triples separated by `;`. Nothing is acknowledged, and a
//! failed write only costs that frame.

use std::{
    fmt::Write as _,
    fs::OpenOptions,
    io::{self, Write},
    path::Path,
    time::{Duration, Instant},
};

use crate::types::LandmarkFrame;

pub const DEFAULT_SEND_INTERVAL: Duration = Duration::from_millis(50);

pub fn encode_frame(frame: &LandmarkFrame, width: u32, height: u32) -> String {
    let mut line = String::with_capacity(frame.len() * 16);
    for (i, point) in frame.points().iter().enumerate() {
        if i > 0 {
            line.push(';');
        }
        let (px, py) = point.to_pixel(width, height);
        let _ = write!(line, "{px},{py},{:.4}", point.z);
    }
    line
}

pub struct ActuatorLink<W> {
    writer: W,
    width: u32,
    height: u32,
    min_interval: Duration,
    last_sent: Option<Instant>,
    sent: u64,
    failed: u64,
}

impl ActuatorLink<std::fs::File> {
    /// Opens a device node (or plain file) for writing.
    pub fn open(path: &Path, width: u32, height: u32) -> io::Result<Self> {
        let file = OpenOptions::new().append(true).create(true).open(path)?;
        log::info!("streaming landmarks to {}", path.display());
        Ok(Self::new(file, width, height))
    }
}

impl<W: Write> ActuatorLink<W> {
    pub fn new(writer: W, width: u32, height: u32) -> Self {
        Self {
            writer,
            width,
            height,
            min_interval: DEFAULT_SEND_INTERVAL,
            last_sent: None,
            sent: 0,
            failed: 0,
        }
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }

    /// Sends `frame` unless it is empty or the link was used too recently.
    /// Returns whether a line went out.
    pub fn send(&mut self, frame: &LandmarkFrame, now: Instant) -> bool {
        if frame.is_empty() {
            return false;
        }
        if let Some(last) = self.last_sent {
            if now.saturating_duration_since(last) < self.min_interval {
                return false;
            }
        }

        let mut line = encode_frame(frame, self.width, self.height);
        line.push('\n');
        self.last_sent = Some(now);
        match self
            .writer
            .write_all(line.as_bytes())
            .and_then(|()| self.writer.flush())
        {
            Ok(()) => {
                self.sent += 1;
                true
            }
            Err(err) => {
                self.failed += 1;
                log::warn!("actuator write failed: {err}");
                false
            }
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
