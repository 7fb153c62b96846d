use std::{fs, path::Path};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use super::skeleton;
use crate::{
    error::{Result, SessionError},
    types::Recording,
};

pub fn frame_file_name(index: usize) -> String {
    format!("frame_{index:05}.png")
}

/// Renders every frame of `recording` to `dir` as numbered PNGs. Frames are
/// independent, so they are drawn in parallel.
pub fn export_frames(
    recording: &Recording,
    dir: &Path,
    width: u32,
    height: u32,
) -> Result<usize> {
    fs::create_dir_all(dir).map_err(|err| SessionError::io(dir, err))?;

    let progress = create_progress_bar(recording.frame_count() as u64);
    recording
        .frames()
        .par_iter()
        .enumerate()
        .try_for_each(|(index, frame)| {
            let path = dir.join(frame_file_name(index));
            skeleton::render(frame.points(), width, height)
                .save(&path)
                .map_err(|source| SessionError::Encode { path, source })?;
            progress.inc(1);
            Ok::<_, SessionError>(())
        })?;
    progress.finish_with_message("export done");

    log::info!(
        "exported {} frames of '{}' to {}",
        recording.frame_count(),
        recording.action_name(),
        dir.display()
    );
    Ok(recording.frame_count())
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} frames",
    ) {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}
