//! mark_zones - draw restricted zones for a video from the terminal
//!
//! Reads one command per line on stdin:
//!
//! - `x y` adds a vertex to the current zone
//! - empty line (or `enter`) closes the current zone
//! - `c` clears the current zone
//! - `n` moves to the next frame, `b` to the previous one
//! - `s` saves and exits, `q` exits without saving

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::{BufRead, IsTerminal};
use std::path::{Path, PathBuf};

use zone_sentry::ingest::is_stub_path;
use zone_sentry::{
    CaptureCommand, FileConfig, FileSource, Frame, ZoneCapture, ZoneRegistry, DEFAULT_ZONES_PATH,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the video used as drawing reference (`stub://name` allowed).
    video: String,
    /// Zone file to extend and write.
    #[arg(default_value = DEFAULT_ZONES_PATH)]
    zones: PathBuf,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

/// Reference frames for the session. Decoders only move forward, so going
/// back reopens the video and skips ahead.
struct FrameCursor {
    config: FileConfig,
    source: FileSource,
    current: Frame,
}

impl FrameCursor {
    fn open(config: FileConfig) -> Result<Self> {
        let mut source = FileSource::new(config.clone())?;
        source.connect()?;
        let current = source
            .next_frame()?
            .ok_or_else(|| anyhow!("video '{}' has no frames", config.path))?;
        Ok(Self {
            config,
            source,
            current,
        })
    }

    fn index(&self) -> u64 {
        self.current.index
    }

    /// Returns false at end of video.
    fn next(&mut self) -> Result<bool> {
        match self.source.next_frame()? {
            Some(frame) => {
                self.current = frame;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Returns false on the first frame.
    fn prev(&mut self) -> Result<bool> {
        let Some(target) = self.current.index.checked_sub(1) else {
            return Ok(false);
        };
        let mut reopened = Self::open(self.config.clone())?;
        while reopened.index() < target {
            if !reopened.next()? {
                return Err(anyhow!("video ended before frame {}", target));
            }
        }
        *self = reopened;
        Ok(true)
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.current.width && (y as u32) < self.current.height
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let is_tty = std::io::stderr().is_terminal();
    let stdout_is_tty = std::io::stdout().is_terminal();
    let ui = ui::Ui::from_args(Some(&args.ui), is_tty, !stdout_is_tty);

    if !is_stub_path(&args.video) && !Path::new(&args.video).exists() {
        return Err(anyhow!("video file '{}' not found", args.video));
    }

    let mut cursor = {
        let _stage = ui.stage("Open video");
        FrameCursor::open(FileConfig {
            path: args.video.clone(),
            ..FileConfig::default()
        })?
    };
    let registry = {
        let _stage = ui.stage("Load zones");
        ZoneRegistry::load(&args.zones)
    };
    let mut capture = ZoneCapture::new(registry);

    eprintln!("commands: 'x y' add point | enter finish zone | c clear | n/b next/prev frame | s save | q quit");
    print_status(&cursor, &capture);

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let command = match line.parse::<CaptureCommand>() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };
        match command {
            CaptureCommand::Point(point) => {
                if !cursor.in_bounds(point.x, point.y) {
                    log::warn!(
                        "point ({}, {}) is outside the {}x{} frame",
                        point.x,
                        point.y,
                        cursor.current.width,
                        cursor.current.height
                    );
                }
                capture.push_point(point);
            }
            CaptureCommand::Finish => match capture.finish_zone() {
                Ok(id) => eprintln!("zone {} created", id),
                Err(e) => eprintln!("{}", e),
            },
            CaptureCommand::Clear => capture.clear_current(),
            CaptureCommand::NextFrame => {
                if let Some(id) = capture.commit_pending() {
                    eprintln!("zone {} created", id);
                }
                if !cursor.next()? {
                    eprintln!("end of video");
                }
            }
            CaptureCommand::PrevFrame => {
                if !cursor.prev()? {
                    eprintln!("already at the first frame");
                }
            }
            CaptureCommand::Save => {
                if let Some(id) = capture.commit_pending() {
                    eprintln!("zone {} created", id);
                }
                let registry = capture.into_registry();
                if !registry.save(&args.zones) {
                    return Err(anyhow!(
                        "failed to save zones to {}",
                        args.zones.display()
                    ));
                }
                println!("{} zone(s) saved to {}", registry.len(), args.zones.display());
                return Ok(());
            }
            CaptureCommand::Quit => {
                eprintln!("quit without saving");
                return Ok(());
            }
        }
        print_status(&cursor, &capture);
    }

    log::info!("input closed, exiting without saving");
    Ok(())
}

fn print_status(cursor: &FrameCursor, capture: &ZoneCapture) {
    eprintln!(
        "Frame: {} | Current zone: {} | Points: {}",
        cursor.index(),
        capture.current_zone_id(),
        capture.current_points().len()
    );
}
