use std::{
    fs,
    time::{Duration, Instant},
};

use chrono::NaiveDate;
use hand_motion_recorder::{
    LandmarkFrame, LandmarkPoint, Recording, SessionController, SessionError, SessionMode,
    recording::{Advance, FpsPolicy, RecordingStorage, RecordingStore},
    types::NUM_LANDMARKS,
};
use tempfile::TempDir;

fn hand(x: f64, y: f64, z: f64) -> LandmarkFrame {
    LandmarkFrame::new(vec![LandmarkPoint::new(x, y, z); NUM_LANDMARKS]).unwrap()
}

fn wave_frames() -> Vec<LandmarkFrame> {
    vec![
        hand(0.1, 0.1, 0.0),
        hand(0.1, 0.1, 0.0),
        hand(0.1, 0.1, 0.0),
    ]
}

#[test]
fn wave_is_saved_and_replayed_in_order() {
    let tmp_dir = TempDir::new().expect("Could not create temp directory");
    let store = RecordingStore::new(tmp_dir.path().join("recs"));
    let mut session = SessionController::new(store, FpsPolicy::Fixed(30.0));
    let t0 = Instant::now();

    session.begin_recording("wave", t0).unwrap();
    session.push_live_frame(&LandmarkFrame::empty());
    for frame in wave_frames() {
        session.push_live_frame(&frame);
    }
    let id = session
        .end_recording(t0 + Duration::from_millis(100))
        .unwrap()
        .expect("three frames should be saved");

    assert!(id.starts_with("wave_") && id.ends_with(".json"));
    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(tmp_dir.path().join("recs").join(&id)).unwrap())
            .unwrap();
    assert_eq!(raw["actionName"], "wave");
    assert_eq!(raw["fps"], 30.0);
    assert_eq!(raw["frameCount"], 3);
    assert_eq!(raw["frames"].as_array().map(Vec::len), Some(3));

    session.load_replay(&id).unwrap();
    for expected in wave_frames() {
        assert_eq!(session.advance().unwrap(), Advance::Frame(expected));
    }
    assert_eq!(session.advance().unwrap(), Advance::EndOfSequence);
    assert_eq!(session.mode(), SessionMode::Idle);
}

#[test]
fn round_trip_keeps_exact_coordinates() {
    let tmp_dir = TempDir::new().unwrap();
    let store = RecordingStore::new(tmp_dir.path());
    let frames: Vec<LandmarkFrame> = (0..7)
        .map(|i| {
            let f = i as f64;
            hand(0.1 + f / 3.0 * 0.1, 0.9 - f * 0.0731, -0.033333 * f)
        })
        .collect();
    let rec = Recording::new("pinch", 29.97, frames.clone()).unwrap();

    let id = store.save(&rec).unwrap();
    let loaded = store.load(&id).unwrap();

    assert_eq!(loaded.frame_count(), 7);
    assert_eq!(loaded.frames(), frames.as_slice());
    assert_eq!(loaded, rec);
}

#[test]
fn same_second_saves_get_distinct_names() {
    let tmp_dir = TempDir::new().unwrap();
    let store = RecordingStore::new(tmp_dir.path());
    let rec = Recording::new("wave", 30.0, wave_frames()).unwrap();
    let at = NaiveDate::from_ymd_opt(2024, 5, 17)
        .unwrap()
        .and_hms_opt(9, 30, 5)
        .unwrap();

    let first = store.save_at(&rec, at).unwrap();
    let second = store.save_at(&rec, at).unwrap();

    assert_eq!(first, "wave_20240517_093005.json");
    assert_eq!(second, "wave_20240517_093005_2.json");
    let leftovers: Vec<_> = fs::read_dir(tmp_dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn list_skips_other_files_and_delete_removes() {
    let tmp_dir = TempDir::new().unwrap();
    let store = RecordingStore::new(tmp_dir.path());
    assert!(RecordingStore::new(tmp_dir.path().join("missing")).list().unwrap().is_empty());

    let rec = Recording::new("wave", 30.0, wave_frames()).unwrap();
    let id = store.save(&rec).unwrap();
    fs::write(tmp_dir.path().join("notes.txt"), "hello").unwrap();

    let listed: Vec<String> = store.list().unwrap().into_iter().map(|e| e.id).collect();
    assert_eq!(listed, vec![id.clone()]);

    store.delete(&id).unwrap();
    assert!(store.list().unwrap().is_empty());
    assert!(matches!(store.delete(&id), Err(SessionError::Io { .. })));
}

#[test]
fn malformed_file_fails_to_load_and_session_stays_idle() {
    let tmp_dir = TempDir::new().unwrap();
    fs::write(
        tmp_dir.path().join("broken.json"),
        r#"{"actionName":"wave","fps":30,"frameCount":0,"frames":[]}"#,
    )
    .unwrap();
    let store = RecordingStore::new(tmp_dir.path());
    let mut session = SessionController::new(store, FpsPolicy::Measured);

    assert!(matches!(
        session.load_replay("broken.json"),
        Err(SessionError::Format(_))
    ));
    assert!(matches!(
        session.load_replay("absent.json"),
        Err(SessionError::Io { .. })
    ));
    assert_eq!(session.mode(), SessionMode::Idle);
}

#[test]
fn stopping_without_frames_writes_nothing() {
    let tmp_dir = TempDir::new().unwrap();
    let store = RecordingStore::new(tmp_dir.path());
    let mut session = SessionController::new(store, FpsPolicy::Measured);
    let t0 = Instant::now();

    session.begin_recording("idle", t0).unwrap();
    session.push_live_frame(&LandmarkFrame::empty());
    assert_eq!(session.end_recording(t0 + Duration::from_secs(1)).unwrap(), None);
    assert_eq!(fs::read_dir(tmp_dir.path()).unwrap().count(), 0);
}
