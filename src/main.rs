use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use hand_motion_recorder::{
    LandmarkFrame, SessionController,
    actuator::ActuatorLink,
    config::AppConfig,
    pipeline::{
        FrameSource, InteractiveSphere, Overlay, Pacer, export::frame_file_name, export_frames,
        start_tracker_stream,
    },
    recording::{FpsPolicy, RecordingStorage, RecordingStore},
    session::{RecordingFeed, ReplayFeed},
};

#[derive(Parser)]
#[command(name = "hand-motion")]
#[command(about = "Record and replay hand landmark sequences", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding recordings
    #[arg(long, global = true)]
    recordings_dir: Option<PathBuf>,

    /// Canvas width in pixels
    #[arg(long, global = true)]
    width: Option<u32>,

    /// Canvas height in pixels
    #[arg(long, global = true)]
    height: Option<u32>,

    /// Store this frame rate instead of measuring it
    #[arg(long, global = true)]
    fps: Option<f64>,
}

#[derive(Subcommand)]
enum Command {
    /// List saved recordings, newest first
    List,

    /// Record tracker frames from stdin (one JSON array per line) until EOF
    Record {
        action: String,

        /// Also stream frames to this serial device or file
        #[arg(long)]
        serial: Option<PathBuf>,

        /// Let the index fingertip grab a sphere while recording
        #[arg(long)]
        sphere: bool,
    },

    /// Replay a recording at its stored frame rate
    Play {
        /// Recording id in the recordings directory, or a path to one
        recording: String,

        /// Write each replayed frame as a PNG into this directory
        #[arg(long)]
        export: Option<PathBuf>,

        /// Stream frames to this serial device or file
        #[arg(long)]
        serial: Option<PathBuf>,

        /// Show the grab sphere on the index fingertip
        #[arg(long)]
        sphere: bool,

        /// Replay as fast as possible
        #[arg(long)]
        no_pacing: bool,
    },

    /// Render every frame of a recording to PNGs
    Export { recording: String, dir: PathBuf },

    /// Delete a recording
    Delete { recording: String },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = apply_overrides(AppConfig::from_env(), &cli)?;
    let store = RecordingStore::new(config.recordings_dir.clone());

    match cli.command {
        Command::List => list(&store),
        Command::Record {
            action,
            serial,
            sphere,
        } => record(
            &config,
            store,
            &action,
            serial.as_deref(),
            sphere.then(InteractiveSphere::default),
        ),
        Command::Play {
            recording,
            export,
            serial,
            sphere,
            no_pacing,
        } => play(
            &config,
            store,
            &recording,
            PlayOptions {
                export: export.as_deref(),
                serial: serial.as_deref(),
                sphere,
                paced: !no_pacing,
            },
        ),
        Command::Export { recording, dir } => {
            let rec = load_recording(&store, &recording)?;
            let written = export_frames(&rec, &dir, config.canvas_width, config.canvas_height)
                .with_context(|| format!("failed to export {recording}"))?;
            println!("wrote {written} frames to {}", dir.display());
            Ok(())
        }
        Command::Delete { recording } => {
            store
                .delete(&recording)
                .with_context(|| format!("failed to delete {recording}"))?;
            println!("deleted {recording}");
            Ok(())
        }
    }
}

fn apply_overrides(mut config: AppConfig, cli: &Cli) -> Result<AppConfig> {
    if let Some(dir) = &cli.recordings_dir {
        config.recordings_dir = dir.clone();
    }
    if let Some(width) = cli.width.filter(|w| *w > 0) {
        config.canvas_width = width;
    }
    if let Some(height) = cli.height.filter(|h| *h > 0) {
        config.canvas_height = height;
    }
    if let Some(fps) = cli.fps {
        if !(fps.is_finite() && fps > 0.0) {
            anyhow::bail!("--fps must be a positive number, got {fps}");
        }
        config.fps_policy = FpsPolicy::Fixed(fps);
    }
    Ok(config)
}

fn list(store: &RecordingStore) -> Result<()> {
    let entries = store
        .list()
        .with_context(|| format!("failed to list {}", store.dir().display()))?;
    if entries.is_empty() {
        println!("no recordings in {}", store.dir().display());
        return Ok(());
    }
    for entry in entries {
        let modified: DateTime<Local> = entry.modified.into();
        println!("{}  {}", modified.format("%Y-%m-%d %H:%M:%S"), entry.id);
    }
    Ok(())
}

fn record(
    config: &AppConfig,
    store: RecordingStore,
    action: &str,
    serial: Option<&Path>,
    mut sphere: Option<InteractiveSphere>,
) -> Result<()> {
    let mut controller = SessionController::new(store, config.fps_policy);
    let mut link = open_link(serial, config)?;

    controller
        .begin_recording(action, Instant::now())
        .context("failed to start recording")?;
    log::info!("reading tracker frames from stdin; close the stream to stop");

    let (stream, live) = start_tracker_stream(io::BufReader::new(io::stdin()));
    let mut feed = RecordingFeed::new(&mut controller, live);
    let mut grabbed = false;
    let ticks = drive(&mut feed, &mut Pacer::unpaced(), |index, frame| {
        if let Some(link) = link.as_mut() {
            link.send(frame, Instant::now());
        }
        if let Some(sphere) = sphere.as_mut() {
            let touching = sphere.update(frame, config.canvas_width, config.canvas_height);
            if touching != grabbed {
                let (x, y) = sphere.position();
                let what = if touching { "grabbed" } else { "released" };
                log::info!("frame {}: sphere {what} at ({x:.3}, {y:.3})", index + 1);
                grabbed = touching;
            }
        }
        Ok(())
    })?;
    stream.stop();

    let retained = controller.recorder().retained_frames();
    log::info!("stream ended after {ticks} frames, {retained} with a hand");
    match controller.end_recording(Instant::now()) {
        Ok(Some(id)) => println!("saved {}", controller.storage().dir().join(id).display()),
        Ok(None) => println!("no hand frames captured, nothing saved"),
        Err(err) => {
            // One retry before giving up on the take.
            log::warn!("save failed ({err}), retrying once");
            let id = controller
                .retry_save()
                .context("failed to save recording")?
                .context("recording vanished before retry")?;
            println!("saved {}", controller.storage().dir().join(id).display());
        }
    }
    Ok(())
}

struct PlayOptions<'a> {
    export: Option<&'a Path>,
    serial: Option<&'a Path>,
    sphere: bool,
    paced: bool,
}

fn play(
    config: &AppConfig,
    store: RecordingStore,
    target: &str,
    opts: PlayOptions<'_>,
) -> Result<()> {
    let mut controller = SessionController::new(store, config.fps_policy);
    let path = Path::new(target);
    if path.is_file() {
        let rec = controller
            .storage()
            .load_path(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        controller.begin_replay(rec)?;
    } else {
        controller
            .load_replay(target)
            .with_context(|| format!("failed to load {target}"))?;
    }

    let fps = controller.loaded_recording().map_or(0.0, |rec| rec.fps());
    let mut pacer = if opts.paced {
        Pacer::from_fps(fps)
    } else {
        Pacer::unpaced()
    };
    if let Some(dir) = opts.export {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let mut link = open_link(opts.serial, config)?;
    let mut overlay = Overlay::new(
        config.canvas_width,
        config.canvas_height,
        opts.sphere.then(InteractiveSphere::default),
    );

    let mut feed = ReplayFeed::new(&mut controller);
    let result = drive(&mut feed, &mut pacer, |index, frame| {
        log::debug!("replay frame {}", index + 1);
        if let Some(link) = link.as_mut() {
            link.send(frame, Instant::now());
        }
        if let Some(dir) = opts.export {
            let path = dir.join(frame_file_name(index));
            overlay
                .compose(frame)
                .save(&path)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        Ok(())
    });
    controller.stop_replay();

    let frames = result?;
    println!("replayed {frames} frames");
    Ok(())
}

fn open_link(serial: Option<&Path>, config: &AppConfig) -> Result<Option<ActuatorLink<File>>> {
    serial
        .map(|path| {
            ActuatorLink::open(path, config.canvas_width, config.canvas_height)
                .with_context(|| format!("failed to open {}", path.display()))
        })
        .transpose()
}

fn load_recording(
    store: &RecordingStore,
    target: &str,
) -> Result<hand_motion_recorder::Recording> {
    let path = Path::new(target);
    let loaded = if path.is_file() {
        store.load_path(path)
    } else {
        store.load(target)
    };
    loaded.with_context(|| format!("failed to load {target}"))
}

/// The external tick loop: one frame per tick until the source ends.
fn drive<F, H>(source: &mut F, pacer: &mut Pacer, mut on_frame: H) -> Result<usize>
where
    F: FrameSource,
    H: FnMut(usize, &LandmarkFrame) -> Result<()>,
{
    let mut ticks = 0;
    loop {
        pacer.wait();
        let Some(frame) = source.next_frame() else {
            break;
        };
        on_frame(ticks, &frame)?;
        ticks += 1;
    }
    Ok(ticks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accepts_sphere_and_serial() {
        let cli = Cli::try_parse_from([
            "hand-motion",
            "record",
            "wave",
            "--sphere",
            "--serial",
            "/dev/ttyACM0",
        ])
        .unwrap();
        match cli.command {
            Command::Record {
                action,
                serial,
                sphere,
            } => {
                assert_eq!(action, "wave");
                assert_eq!(serial.as_deref(), Some(Path::new("/dev/ttyACM0")));
                assert!(sphere);
            }
            _ => panic!("expected record"),
        }
    }

    #[test]
    fn global_flags_override_config() {
        let cli = Cli::try_parse_from(["hand-motion", "list", "--width", "320", "--fps", "24"])
            .unwrap();
        let config = apply_overrides(AppConfig::default(), &cli).unwrap();
        assert_eq!(config.canvas_width, 320);
        assert_eq!(config.canvas_height, 480);
        assert_eq!(config.fps_policy, FpsPolicy::Fixed(24.0));

        let bad = Cli::try_parse_from(["hand-motion", "list", "--fps", "0"]).unwrap();
        assert!(apply_overrides(AppConfig::default(), &bad).is_err());
    }
}
