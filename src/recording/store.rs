use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    process,
    sync::atomic::{AtomicU64, Ordering},
    time::SystemTime,
};

use chrono::{Local, NaiveDateTime};

use crate::{
    error::{Result, SessionError},
    types::Recording,
};

pub const DEFAULT_RECORDINGS_DIR: &str = "hand_recordings";
const RECORDING_EXTENSION: &str = "json";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Where finished takes go and where replays come from. Ids are opaque to
/// callers.
pub trait RecordingStorage {
    fn save(&self, recording: &Recording) -> Result<String>;
    fn load(&self, id: &str) -> Result<Recording>;
}

#[derive(Clone, Debug)]
pub struct RecordingEntry {
    pub id: String,
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Recordings kept as `{action}_{YYYYMMDD_HHMMSS}.json` files in one
/// directory.
#[derive(Clone, Debug)]
pub struct RecordingStore {
    dir: PathBuf,
}

impl RecordingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &str) -> Result<PathBuf> {
        let name = Path::new(id);
        if name.file_name().is_none() || name.components().count() != 1 {
            return Err(SessionError::Validation(format!(
                "'{id}' is not a recording file name"
            )));
        }
        Ok(self.dir.join(name))
    }

    /// Saves under a name derived from `timestamp`, adding `_2`, `_3`, ...
    /// when an earlier save already took that name.
    pub fn save_at(&self, recording: &Recording, timestamp: NaiveDateTime) -> Result<String> {
        fs::create_dir_all(&self.dir).map_err(|err| SessionError::io(&self.dir, err))?;

        let stem = format!(
            "{}_{}",
            recording.action_name(),
            timestamp.format(TIMESTAMP_FORMAT)
        );
        let tmp_path = self.dir.join(format!(
            ".{stem}.{}.{}.tmp",
            process::id(),
            TMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(err) = write_recording(&tmp_path, recording) {
            let _ = fs::remove_file(&tmp_path);
            return Err(SessionError::io(&tmp_path, err));
        }
        let linked = self.link_unused_name(&stem, &tmp_path);
        let _ = fs::remove_file(&tmp_path);
        let (id, dest) = linked?;

        log::info!("saved recording {}", dest.display());
        Ok(id)
    }

    // Linking fails instead of replacing when the name is taken, so two
    // writers can never end up sharing one file.
    fn link_unused_name(&self, stem: &str, tmp_path: &Path) -> Result<(String, PathBuf)> {
        let mut suffix = 1;
        loop {
            let id = if suffix == 1 {
                format!("{stem}.{RECORDING_EXTENSION}")
            } else {
                format!("{stem}_{suffix}.{RECORDING_EXTENSION}")
            };
            let dest = self.dir.join(&id);
            match fs::hard_link(tmp_path, &dest) {
                Ok(()) => return Ok((id, dest)),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => suffix += 1,
                Err(err) => return Err(SessionError::io(&dest, err)),
            }
        }
    }

    pub fn load_path(&self, path: &Path) -> Result<Recording> {
        let contents = fs::read(path).map_err(|err| SessionError::io(path, err))?;
        parse_recording(&contents).map_err(|err| match err {
            SessionError::Format(msg) => SessionError::Format(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Saved recordings, most recently modified first. A missing directory
    /// means there are none yet.
    pub fn list(&self) -> Result<Vec<RecordingEntry>> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(SessionError::io(&self.dir, err)),
        };

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|err| SessionError::io(&self.dir, err))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORDING_EXTENSION) {
                continue;
            }
            let metadata = entry
                .metadata()
                .map_err(|err| SessionError::io(&path, err))?;
            if !metadata.is_file() {
                continue;
            }
            entries.push(RecordingEntry {
                id: entry.file_name().to_string_lossy().into_owned(),
                path,
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }
        entries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.id.cmp(&a.id)));
        Ok(entries)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let path = self.path_for(id)?;
        fs::remove_file(&path).map_err(|err| SessionError::io(&path, err))?;
        log::info!("deleted recording {}", path.display());
        Ok(())
    }
}

impl RecordingStorage for RecordingStore {
    fn save(&self, recording: &Recording) -> Result<String> {
        self.save_at(recording, Local::now().naive_local())
    }

    fn load(&self, id: &str) -> Result<Recording> {
        let path = self.path_for(id)?;
        self.load_path(&path)
    }
}

fn write_recording(path: &Path, recording: &Recording) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, recording)?;
    writer.flush()?;
    let file = writer.into_inner().map_err(|err| err.into_error())?;
    file.sync_all()
}

/// Parses and validates one recording document.
pub fn parse_recording(contents: &[u8]) -> Result<Recording> {
    serde_json::from_slice(contents).map_err(|err| SessionError::Format(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_hand;

    #[test]
    fn read_rejects_empty_frame_list() {
        let doc = br#"{"actionName":"wave","fps":30,"frameCount":0,"frames":[]}"#;
        assert!(matches!(
            parse_recording(doc),
            Err(SessionError::Format(_))
        ));
    }

    #[test]
    fn read_rejects_missing_action_name() {
        let frame = serde_json::to_string(&test_hand(0.1, 0.1, 0.0)).unwrap();
        let doc = format!(r#"{{"fps":30,"frameCount":1,"frames":[{frame}]}}"#);
        let err = parse_recording(doc.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("actionName"));
    }

    #[test]
    fn read_rejects_partial_hand() {
        let doc = br#"{"actionName":"wave","fps":30,"frameCount":1,
            "frames":[[{"x":0.1,"y":0.1,"z":0.0,"visibility":1.0}]]}"#;
        assert!(matches!(
            parse_recording(doc),
            Err(SessionError::Format(_))
        ));
    }

    #[test]
    fn read_rejects_coordinates_far_off_canvas() {
        let mut value = serde_json::to_value(
            Recording::new("wave", 30.0, vec![test_hand(0.5, 0.5, 0.0)]).unwrap(),
        )
        .unwrap();
        value["frames"][0][0]["x"] = (-1e12_f64).into();
        value["frames"][0][1]["x"] = 1e12_f64.into();
        let doc = serde_json::to_vec(&value).unwrap();

        assert!(matches!(
            parse_recording(&doc),
            Err(SessionError::Format(_))
        ));
    }

    #[test]
    fn save_never_replaces_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordingStore::new(dir.path());
        let at = chrono::NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(9, 30, 5)
            .unwrap();
        let taken = dir.path().join("wave_20240517_093005.json");
        fs::write(&taken, "written elsewhere").unwrap();

        let rec = Recording::new("wave", 30.0, vec![test_hand(0.1, 0.1, 0.0)]).unwrap();
        let id = store.save_at(&rec, at).unwrap();

        assert_eq!(id, "wave_20240517_093005_2.json");
        assert_eq!(fs::read_to_string(&taken).unwrap(), "written elsewhere");
        assert_eq!(store.load(&id).unwrap(), rec);
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn path_for_rejects_nested_ids() {
        let store = RecordingStore::new("recs");
        assert!(store.path_for("wave_20240101_000000.json").is_ok());
        assert!(store.path_for("../wave.json").is_err());
        assert!(store.path_for("a/b.json").is_err());
    }
}
