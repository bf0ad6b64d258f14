use anyhow::{anyhow, Result};
use std::str::FromStr;

use crate::geometry::{Point, MIN_POLYGON_POINTS};

use super::ZoneRegistry;

/// State of an interactive zone marking session.
///
/// Points are accumulated for the zone being drawn and committed to the
/// registry once the polygon is closed. Unlike [`ZoneRegistry::add`], the
/// capture session refuses to commit a polygon with fewer than three points.
#[derive(Debug)]
pub struct ZoneCapture {
    registry: ZoneRegistry,
    current_points: Vec<Point>,
    current_zone_id: u32,
}

impl ZoneCapture {
    /// Start a session on top of an existing registry.
    pub fn new(registry: ZoneRegistry) -> Self {
        let current_zone_id = registry.next_id();
        Self {
            registry,
            current_points: Vec::new(),
            current_zone_id,
        }
    }

    pub fn push_point<P: Into<Point>>(&mut self, point: P) {
        self.current_points.push(point.into());
    }

    /// Drop the points of the zone being drawn.
    pub fn clear_current(&mut self) {
        self.current_points.clear();
    }

    /// Close the current polygon and append it to the registry.
    ///
    /// Fails without touching state when fewer than three points were placed.
    pub fn finish_zone(&mut self) -> Result<u32> {
        if self.current_points.len() < MIN_POLYGON_POINTS {
            return Err(anyhow!(
                "need at least {} points to create a zone (have {})",
                MIN_POLYGON_POINTS,
                self.current_points.len()
            ));
        }
        let points = std::mem::take(&mut self.current_points);
        let id = self.registry.add(points, Some(self.current_zone_id));
        self.current_zone_id = self.current_zone_id.saturating_add(1);
        Ok(id)
    }

    /// Commit the current polygon if it is closable; otherwise keep it pending.
    pub fn commit_pending(&mut self) -> Option<u32> {
        if self.current_points.len() >= MIN_POLYGON_POINTS {
            self.finish_zone().ok()
        } else {
            None
        }
    }

    pub fn current_points(&self) -> &[Point] {
        &self.current_points
    }

    pub fn current_zone_id(&self) -> u32 {
        self.current_zone_id
    }

    pub fn registry(&self) -> &ZoneRegistry {
        &self.registry
    }

    pub fn into_registry(self) -> ZoneRegistry {
        self.registry
    }
}

/// One instruction of a line-oriented marking session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureCommand {
    /// `x y` or `x,y`: add a vertex to the current zone.
    Point(Point),
    /// Empty line or `enter`: close the current zone.
    Finish,
    /// `c`: clear the current zone.
    Clear,
    /// `n` or `space`: advance one frame (closes the current zone if possible).
    NextFrame,
    /// `b`: go back one frame.
    PrevFrame,
    /// `s`: close the current zone if possible, save and exit.
    Save,
    /// `q` or `esc`: exit without saving.
    Quit,
}

impl FromStr for CaptureCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        match line.to_ascii_lowercase().as_str() {
            "" | "enter" => return Ok(CaptureCommand::Finish),
            "c" => return Ok(CaptureCommand::Clear),
            "n" | "space" => return Ok(CaptureCommand::NextFrame),
            "b" => return Ok(CaptureCommand::PrevFrame),
            "s" => return Ok(CaptureCommand::Save),
            "q" | "esc" => return Ok(CaptureCommand::Quit),
            _ => {}
        }

        let mut parts = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty());
        let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(anyhow!("unrecognized command '{}'", line));
        };
        let x: f64 = x
            .parse()
            .map_err(|_| anyhow!("invalid x coordinate '{}'", x))?;
        let y: f64 = y
            .parse()
            .map_err(|_| anyhow!("invalid y coordinate '{}'", y))?;
        Ok(CaptureCommand::Point(Point::from((x, y))))
    }
}
