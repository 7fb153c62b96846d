use std::time::Instant;

use crate::{
    error::{Result, SessionError},
    pipeline::FrameSource,
    recording::{Advance, FpsPolicy, Player, Recorder, RecordingStorage},
    types::{LandmarkFrame, Recording},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Idle,
    Recording,
    Replaying,
}

/// Owns the recorder and player and keeps them from running at the same
/// time. One per application, driven by a single loop.
pub struct SessionController<S> {
    storage: S,
    recorder: Recorder,
    player: Option<Player>,
    // A finished take whose save failed; kept until saved or discarded.
    pending: Option<Recording>,
}

impl<S: RecordingStorage> SessionController<S> {
    pub fn new(storage: S, fps_policy: FpsPolicy) -> Self {
        Self {
            storage,
            recorder: Recorder::new(fps_policy),
            player: None,
            pending: None,
        }
    }

    pub fn mode(&self) -> SessionMode {
        if self.recorder.is_active() {
            SessionMode::Recording
        } else if self.player.is_some() {
            SessionMode::Replaying
        } else {
            SessionMode::Idle
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn replay_cursor(&self) -> Option<usize> {
        self.player.as_ref().map(Player::cursor)
    }

    pub fn loaded_recording(&self) -> Option<&Recording> {
        self.player.as_ref().map(Player::recording)
    }

    pub fn pending_recording(&self) -> Option<&Recording> {
        self.pending.as_ref()
    }

    fn ensure_idle(&self, requested: &'static str) -> Result<()> {
        match self.mode() {
            SessionMode::Idle => Ok(()),
            active => Err(SessionError::ModeConflict { active, requested }),
        }
    }

    pub fn begin_recording(&mut self, action_name: &str, now: Instant) -> Result<()> {
        self.ensure_idle("start recording")?;
        if let Some(pending) = &self.pending {
            return Err(SessionError::UnsavedRecording(
                pending.action_name().to_string(),
            ));
        }
        self.recorder.start(action_name, now)
    }

    /// Feeds a live frame to the recorder. Returns whether it was kept.
    pub fn push_live_frame(&mut self, frame: &LandmarkFrame) -> bool {
        self.recorder.append(frame)
    }

    /// Stops recording and saves the take. `Ok(None)` means there was
    /// nothing to save (or nothing was recording). If the save fails the
    /// take stays pending for [`Self::retry_save`].
    pub fn end_recording(&mut self, now: Instant) -> Result<Option<String>> {
        if !self.recorder.is_active() {
            return Ok(None);
        }
        let Some(recording) = self.recorder.stop(now)? else {
            return Ok(None);
        };
        self.pending = Some(recording);
        self.retry_save()
    }

    pub fn retry_save(&mut self) -> Result<Option<String>> {
        let Some(recording) = self.pending.as_ref() else {
            return Ok(None);
        };
        match self.storage.save(recording) {
            Ok(id) => {
                self.pending = None;
                Ok(Some(id))
            }
            Err(err) => {
                log::error!(
                    "failed to save '{}' ({} frames kept for retry): {err}",
                    recording.action_name(),
                    recording.frame_count()
                );
                Err(err)
            }
        }
    }

    pub fn discard_pending(&mut self) -> Option<Recording> {
        let dropped = self.pending.take();
        if let Some(rec) = &dropped {
            log::warn!("discarding unsaved recording '{}'", rec.action_name());
        }
        dropped
    }

    pub fn begin_replay(&mut self, recording: Recording) -> Result<()> {
        self.ensure_idle("start replay")?;
        log::info!(
            "replaying '{}' at {:.2} fps",
            recording.action_name(),
            recording.fps()
        );
        self.player = Some(Player::new(recording));
        Ok(())
    }

    /// Loads a stored recording and starts replaying it. Nothing changes if
    /// the load fails.
    pub fn load_replay(&mut self, id: &str) -> Result<()> {
        self.ensure_idle("start replay")?;
        let recording = self.storage.load(id)?;
        self.begin_replay(recording)
    }

    /// Next replay frame. Reaching the end drops back to idle; asking again
    /// from idle keeps answering `EndOfSequence`.
    pub fn advance(&mut self) -> Result<Advance> {
        if self.recorder.is_active() {
            return Err(SessionError::ModeConflict {
                active: SessionMode::Recording,
                requested: "advance replay",
            });
        }
        let Some(player) = self.player.as_mut() else {
            return Ok(Advance::EndOfSequence);
        };
        let step = player.advance();
        if step == Advance::EndOfSequence {
            log::info!("replay of '{}' finished", player.recording().action_name());
            self.player = None;
        }
        Ok(step)
    }

    /// Abandons the replay, if any.
    pub fn stop_replay(&mut self) -> bool {
        match self.player.take() {
            Some(player) => {
                log::info!(
                    "replay of '{}' stopped at frame {}",
                    player.recording().action_name(),
                    player.cursor()
                );
                true
            }
            None => false,
        }
    }
}

/// Replay frames pulled through the controller so mode changes stay in one
/// place.
pub struct ReplayFeed<'a, S> {
    controller: &'a mut SessionController<S>,
}

impl<'a, S: RecordingStorage> ReplayFeed<'a, S> {
    pub fn new(controller: &'a mut SessionController<S>) -> Self {
        Self { controller }
    }
}

impl<S: RecordingStorage> FrameSource for ReplayFeed<'_, S> {
    fn next_frame(&mut self) -> Option<LandmarkFrame> {
        match self.controller.advance() {
            Ok(Advance::Frame(frame)) => Some(frame),
            Ok(Advance::EndOfSequence) => None,
            Err(err) => {
                log::warn!("replay interrupted: {err}");
                None
            }
        }
    }
}

/// Live frames that also land in the controller's recorder.
pub struct RecordingFeed<'a, S, F> {
    controller: &'a mut SessionController<S>,
    live: F,
}

impl<'a, S: RecordingStorage, F: FrameSource> RecordingFeed<'a, S, F> {
    pub fn new(controller: &'a mut SessionController<S>, live: F) -> Self {
        Self { controller, live }
    }
}

impl<S: RecordingStorage, F: FrameSource> FrameSource for RecordingFeed<'_, S, F> {
    fn next_frame(&mut self) -> Option<LandmarkFrame> {
        let frame = self.live.next_frame()?;
        self.controller.push_live_frame(&frame);
        Some(frame)
    }
}
