pub mod player;
pub mod recorder;
pub mod store;

pub use player::{Advance, Player};
pub use recorder::{DEFAULT_FPS, FpsPolicy, Recorder, validate_action_name};
pub use store::{
    DEFAULT_RECORDINGS_DIR, RecordingEntry, RecordingStorage, RecordingStore, parse_recording,
};
