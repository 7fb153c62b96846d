use super::store::parse_recording;
use crate::{
    error::Result,
    pipeline::FrameSource,
    types::{LandmarkFrame, Recording},
};

#[derive(Clone, Debug, PartialEq)]
pub enum Advance {
    Frame(LandmarkFrame),
    EndOfSequence,
}

/// Cursor over a loaded recording. Pacing is up to whoever calls
/// [`Player::advance`]; pausing is simply not calling it.
#[derive(Debug)]
pub struct Player {
    recording: Recording,
    cursor: usize,
}

impl Player {
    pub fn new(recording: Recording) -> Self {
        log::debug!(
            "loaded '{}' ({} frames at {:.2} fps)",
            recording.action_name(),
            recording.frame_count(),
            recording.fps()
        );
        Self {
            recording,
            cursor: 0,
        }
    }

    /// Parses a recording document and positions the cursor on its first
    /// frame.
    pub fn load(contents: &[u8]) -> Result<Self> {
        parse_recording(contents).map(Self::new)
    }

    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.recording.frame_count()
    }

    pub fn advance(&mut self) -> Advance {
        match self.recording.frames().get(self.cursor) {
            Some(frame) => {
                self.cursor += 1;
                Advance::Frame(frame.clone())
            }
            None => Advance::EndOfSequence,
        }
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Gives back the recording, dropping the cursor.
    pub fn stop(self) -> Recording {
        self.recording
    }
}

impl FrameSource for Player {
    fn next_frame(&mut self) -> Option<LandmarkFrame> {
        match self.advance() {
            Advance::Frame(frame) => Some(frame),
            Advance::EndOfSequence => None,
        }
    }
}
