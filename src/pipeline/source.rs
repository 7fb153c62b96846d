use std::{
    io::BufRead,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::{
    error::{Result, SessionError},
    types::LandmarkFrame,
};

// A few frames of slack so a slow consumer does not stall the reader.
const TRACKER_QUEUE_DEPTH: usize = 8;

/// Anything that yields hand frames until it runs out.
pub trait FrameSource {
    /// The next frame (possibly empty), or `None` at end of stream.
    fn next_frame(&mut self) -> Option<LandmarkFrame>;
}

/// Frames pushed by an external tracker.
pub struct LiveSource {
    frame_rx: Receiver<LandmarkFrame>,
}

impl LiveSource {
    pub fn new(frame_rx: Receiver<LandmarkFrame>) -> Self {
        Self { frame_rx }
    }
}

impl FrameSource for LiveSource {
    fn next_frame(&mut self) -> Option<LandmarkFrame> {
        self.frame_rx.recv().ok()
    }
}

/// Background reader feeding a [`LiveSource`].
#[derive(Debug)]
pub struct TrackerStream {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl TrackerStream {
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.join_if_finished();
    }

    // The reader may be parked in a blocking read, so only reap it once done.
    fn join_if_finished(&mut self) {
        if self.handle.as_ref().is_some_and(|h| h.is_finished()) {
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for TrackerStream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.join_if_finished();
    }
}

/// Starts a thread that parses one JSON frame per line from `reader`.
/// `[]` is a frame with no hand. Bad lines are logged and skipped.
pub fn start_tracker_stream<R>(reader: R) -> (TrackerStream, LiveSource)
where
    R: BufRead + Send + 'static,
{
    let (frame_tx, frame_rx) = bounded(TRACKER_QUEUE_DEPTH);
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::spawn(move || read_frames(reader, frame_tx, &stop_flag));

    (
        TrackerStream {
            stop,
            handle: Some(handle),
        },
        LiveSource::new(frame_rx),
    )
}

fn read_frames<R: BufRead>(reader: R, frame_tx: Sender<LandmarkFrame>, stop: &AtomicBool) {
    for (line_no, line) in reader.lines().enumerate() {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                log::warn!("tracker read failed: {err:?}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let frame = match parse_frame(&line) {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("skipping tracker line {}: {err}", line_no + 1);
                continue;
            }
        };
        if frame_tx.send(frame).is_err() {
            break;
        }
    }
    log::debug!("tracker stream finished");
}

/// One tracker line: a JSON array of 0 or 21 landmarks.
fn parse_frame(line: &str) -> Result<LandmarkFrame> {
    serde_json::from_str(line).map_err(|err| SessionError::Format(err.to_string()))
}
