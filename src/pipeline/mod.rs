pub mod export;
pub mod overlay;
pub mod skeleton;
pub mod source;
pub mod sphere;

// Re-exports for convenience
pub use export::export_frames;
pub use overlay::{Overlay, Pacer};
pub use skeleton::{draw_hand, render};
pub use source::{FrameSource, LiveSource, TrackerStream, start_tracker_stream};
pub use sphere::InteractiveSphere;
