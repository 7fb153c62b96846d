use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

pub const NUM_LANDMARKS: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_FINGER_TIP: usize = 8;
pub const MIDDLE_FINGER_TIP: usize = 12;
pub const RING_FINGER_TIP: usize = 16;
pub const PINKY_TIP: usize = 20;

/// Fingertips other than the thumb.
pub const FINGERTIPS: [usize; 4] = [
    INDEX_FINGER_TIP,
    MIDDLE_FINGER_TIP,
    RING_FINGER_TIP,
    PINKY_TIP,
];
pub const PALM_RING: [usize; 6] = [0, 1, 5, 9, 13, 17];

/// One tracked joint. `x` and `y` are fractions of the image size, `z` is
/// camera-relative depth where smaller means closer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub visibility: f64,
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            visibility: 1.0,
        }
    }

    /// Pixel position on a `width` x `height` canvas, truncated toward zero.
    /// Points far off the canvas are pulled in to within one canvas of it.
    pub fn to_pixel(&self, width: u32, height: u32) -> (i32, i32) {
        (scale_to_pixel(self.x, width), scale_to_pixel(self.y, height))
    }

    fn check(&self) -> std::result::Result<(), String> {
        let Self { x, y, z, visibility } = *self;
        if !(x.is_finite() && y.is_finite() && z.is_finite() && visibility.is_finite()) {
            return Err(format!("landmark has a non-finite component: {self:?}"));
        }
        let in_reach = |v: f64| (-COORD_SLACK..=1.0 + COORD_SLACK).contains(&v);
        if !(in_reach(x) && in_reach(y)) {
            return Err(format!("landmark ({x}, {y}) is far outside the image"));
        }
        Ok(())
    }
}

/// How far beyond the unit square `x` and `y` may stray. Trackers report
/// slightly-off-frame joints; anything further is corrupt.
pub const COORD_SLACK: f64 = 1.0;

fn scale_to_pixel(fraction: f64, extent: u32) -> i32 {
    let extent = extent as f64;
    (fraction * extent).clamp(-extent, 2.0 * extent) as i32
}

/// Landmarks for a single hand: either empty (nothing detected) or exactly
/// [`NUM_LANDMARKS`] points.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LandmarkPoint>", into = "Vec<LandmarkPoint>")]
pub struct LandmarkFrame {
    points: Vec<LandmarkPoint>,
}

impl LandmarkFrame {
    pub fn new(points: Vec<LandmarkPoint>) -> Result<Self> {
        if !points.is_empty() && points.len() != NUM_LANDMARKS {
            return Err(SessionError::Validation(format!(
                "hand frame must have 0 or {NUM_LANDMARKS} landmarks, got {}",
                points.len()
            )));
        }
        for (idx, point) in points.iter().enumerate() {
            point
                .check()
                .map_err(|msg| SessionError::Validation(format!("point {idx}: {msg}")))?;
        }
        Ok(Self { points })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn get(&self, index: usize) -> Option<&LandmarkPoint> {
        self.points.get(index)
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.points
    }
}

impl TryFrom<Vec<LandmarkPoint>> for LandmarkFrame {
    type Error = SessionError;

    fn try_from(points: Vec<LandmarkPoint>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<LandmarkFrame> for Vec<LandmarkPoint> {
    fn from(frame: LandmarkFrame) -> Self {
        frame.points
    }
}

/// A finished take. The on-disk shape is
/// `{actionName, fps, frameCount, frames}`; every constructor checks that
/// shape's invariants, so a `Recording` in hand is always replayable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RecordingFile")]
pub struct Recording {
    action_name: String,
    fps: f64,
    frame_count: usize,
    frames: Vec<LandmarkFrame>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordingFile {
    action_name: String,
    fps: f64,
    frame_count: usize,
    frames: Vec<LandmarkFrame>,
}

impl TryFrom<RecordingFile> for Recording {
    type Error = SessionError;

    fn try_from(file: RecordingFile) -> Result<Self> {
        if file.frame_count != file.frames.len() {
            return Err(SessionError::Format(format!(
                "frameCount is {} but {} frames are present",
                file.frame_count,
                file.frames.len()
            )));
        }
        check_recording(&file.action_name, file.fps, &file.frames).map_err(SessionError::Format)?;
        Ok(Self {
            action_name: file.action_name,
            fps: file.fps,
            frame_count: file.frame_count,
            frames: file.frames,
        })
    }
}

fn check_recording(
    action_name: &str,
    fps: f64,
    frames: &[LandmarkFrame],
) -> std::result::Result<(), String> {
    if action_name.trim().is_empty() {
        return Err("actionName is empty".to_string());
    }
    if !fps.is_finite() || fps <= 0.0 {
        return Err(format!("fps must be positive, got {fps}"));
    }
    if frames.is_empty() {
        return Err("recording has no frames".to_string());
    }
    Ok(())
}

impl Recording {
    pub fn new(
        action_name: impl Into<String>,
        fps: f64,
        frames: Vec<LandmarkFrame>,
    ) -> Result<Self> {
        let action_name = action_name.into();
        check_recording(&action_name, fps, &frames).map_err(SessionError::Validation)?;
        Ok(Self {
            action_name,
            fps,
            frame_count: frames.len(),
            frames,
        })
    }

    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn frames(&self) -> &[LandmarkFrame] {
        &self.frames
    }
}

#[cfg(test)]
pub(crate) fn test_hand(x: f64, y: f64, z: f64) -> LandmarkFrame {
    let points = (0..NUM_LANDMARKS)
        .map(|_| LandmarkPoint::new(x, y, z))
        .collect();
    LandmarkFrame { points }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rejects_partial_hand() {
        let points = vec![LandmarkPoint::new(0.1, 0.1, 0.0); 5];
        assert!(matches!(
            LandmarkFrame::new(points),
            Err(SessionError::Validation(_))
        ));
        assert!(LandmarkFrame::new(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn frame_rejects_corrupt_coordinates() {
        let mut points = vec![LandmarkPoint::new(0.5, 0.5, 0.0); NUM_LANDMARKS];
        points[3].x = -1e12;
        assert!(matches!(
            LandmarkFrame::new(points.clone()),
            Err(SessionError::Validation(_))
        ));

        points[3].x = f64::NAN;
        assert!(LandmarkFrame::new(points.clone()).is_err());

        points[3].x = 0.5;
        points[3].visibility = f64::INFINITY;
        assert!(LandmarkFrame::new(points.clone()).is_err());

        // Just off the edge is still a hand.
        points[3].visibility = 1.0;
        points[3].x = -0.2;
        points[3].y = 1.3;
        assert!(LandmarkFrame::new(points).is_ok());
    }

    #[test]
    fn to_pixel_pulls_far_points_toward_canvas() {
        assert_eq!(LandmarkPoint::new(0.5, 0.25, 0.0).to_pixel(64, 48), (32, 12));
        assert_eq!(LandmarkPoint::new(-1e12, 1e12, 0.0).to_pixel(64, 48), (-64, 96));
        assert_eq!(LandmarkPoint::new(f64::NAN, 0.0, 0.0).to_pixel(64, 48), (0, 0));
    }

    #[test]
    fn recording_serializes_with_camel_case_fields() {
        let rec = Recording::new("wave", 30.0, vec![test_hand(0.1, 0.2, -0.05)]).unwrap();
        let value = serde_json::to_value(&rec).unwrap();

        assert_eq!(value["actionName"], "wave");
        assert_eq!(value["fps"], 30.0);
        assert_eq!(value["frameCount"], 1);
        let first = &value["frames"][0][0];
        assert_eq!(first["x"], 0.1);
        assert_eq!(first["visibility"], 1.0);
    }

    #[test]
    fn recording_rejects_count_mismatch() {
        let rec = Recording::new("wave", 30.0, vec![test_hand(0.1, 0.2, 0.0)]).unwrap();
        let mut value = serde_json::to_value(&rec).unwrap();
        value["frameCount"] = 4.into();

        let err = serde_json::from_value::<Recording>(value).unwrap_err();
        assert!(err.to_string().contains("frameCount"));
    }

    #[test]
    fn recording_rejects_missing_fps_and_empty_frames() {
        let missing = serde_json::json!({
            "actionName": "wave",
            "frameCount": 0,
            "frames": []
        });
        assert!(serde_json::from_value::<Recording>(missing).is_err());

        let empty = serde_json::json!({
            "actionName": "wave",
            "fps": 30.0,
            "frameCount": 0,
            "frames": []
        });
        assert!(serde_json::from_value::<Recording>(empty).is_err());
    }

    #[test]
    fn new_recording_requires_positive_fps() {
        assert!(matches!(
            Recording::new("wave", 0.0, vec![test_hand(0.1, 0.1, 0.0)]),
            Err(SessionError::Validation(_))
        ));
    }
}
