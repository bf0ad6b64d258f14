//! Restricted zone registry.
//!
//! Zones are operator-drawn polygons persisted as JSON:
//!
//! ```json
//! { "zones": [ { "id": 1, "points": [[10, 10], [200, 10], [200, 150]] } ] }
//! ```
//!
//! Loading never fails. A missing, unreadable or malformed file yields an empty
//! registry (no restricted areas), and [`ZoneRegistry::load_with_status`]
//! reports which of those happened.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::geometry::{Point, MIN_POLYGON_POINTS};

mod capture;

pub use capture::{CaptureCommand, ZoneCapture};

/// Default zone file used by both binaries.
pub const DEFAULT_ZONES_PATH: &str = "restricted_zones.json";

/// A restricted polygonal region. Vertex order defines the polygon; the last
/// vertex implicitly connects back to the first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: u32,
    pub points: Vec<Point>,
}

impl Zone {
    /// True when the zone has enough vertices to enclose an area.
    pub fn is_evaluable(&self) -> bool {
        self.points.len() >= MIN_POLYGON_POINTS
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ZoneFile {
    #[serde(default)]
    zones: Vec<Zone>,
}

/// Outcome of reading a zone file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    /// File parsed; `zones` entries were read (possibly zero).
    Loaded { zones: usize },
    /// No file at the path.
    Missing,
    /// The file exists but could not be read.
    Unreadable(String),
    /// The file was read but is not a valid zone document.
    Malformed(String),
}

impl LoadStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadStatus::Loaded { .. })
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStatus::Loaded { zones } => write!(f, "loaded {} zone(s)", zones),
            LoadStatus::Missing => write!(f, "zone file not found"),
            LoadStatus::Unreadable(reason) => write!(f, "zone file unreadable: {}", reason),
            LoadStatus::Malformed(reason) => write!(f, "zone file malformed: {}", reason),
        }
    }
}

/// Ordered, in-memory collection of zones.
///
/// Insertion order is preserved and ids are stored exactly as supplied;
/// callers are responsible for keeping them unique.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ZoneRegistry {
    zones: Vec<Zone>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load zones from `path`, degrading to an empty registry on any failure.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        Self::load_with_status(path).0
    }

    /// Load zones from `path` and report why the result looks the way it does.
    pub fn load_with_status<P: AsRef<Path>>(path: P) -> (Self, LoadStatus) {
        let path = path.as_ref();
        let status;
        let registry = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<ZoneFile>(&raw) {
                Ok(file) => {
                    status = LoadStatus::Loaded {
                        zones: file.zones.len(),
                    };
                    Self { zones: file.zones }
                }
                Err(e) => {
                    status = LoadStatus::Malformed(e.to_string());
                    Self::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                status = LoadStatus::Missing;
                Self::new()
            }
            Err(e) => {
                status = LoadStatus::Unreadable(e.to_string());
                Self::new()
            }
        };

        match &status {
            LoadStatus::Loaded { zones } => {
                log::info!("zones: {} loaded from {}", zones, path.display());
                let open = registry.zones.iter().filter(|z| !z.is_evaluable()).count();
                if open > 0 {
                    log::warn!(
                        "zones: {} zone(s) in {} have fewer than {} points and will be ignored",
                        open,
                        path.display(),
                        MIN_POLYGON_POINTS
                    );
                }
            }
            LoadStatus::Missing => {
                log::info!("zones: {} not found, starting empty", path.display());
            }
            other => {
                log::warn!("zones: {} ({}), starting empty", other, path.display());
            }
        }

        (registry, status)
    }

    /// Append a zone. Without an explicit id the zone gets `len() + 1`.
    ///
    /// Coordinates are truncated to integers. The point count is not checked
    /// here; open polygons are stored but never evaluated.
    pub fn add<I, P>(&mut self, points: I, id: Option<u32>) -> u32
    where
        I: IntoIterator<Item = P>,
        P: Into<Point>,
    {
        let id = id.unwrap_or_else(|| self.next_id());
        self.zones.push(Zone {
            id,
            points: points.into_iter().map(Into::into).collect(),
        });
        id
    }

    /// Id the next implicitly numbered zone would receive.
    pub fn next_id(&self) -> u32 {
        u32::try_from(self.zones.len())
            .unwrap_or(u32::MAX)
            .saturating_add(1)
    }

    /// Write all zones to `path`. Failures are logged and reported as `false`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> bool {
        let path = path.as_ref();
        match self.save_checked(path) {
            Ok(()) => {
                log::info!("zones: {} saved to {}", self.zones.len(), path.display());
                true
            }
            Err(e) => {
                log::warn!("zones: save failed: {:#}", e);
                false
            }
        }
    }

    /// Write all zones to `path`, returning the underlying error on failure.
    pub fn save_checked<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = ZoneFile {
            zones: self.zones.clone(),
        };
        let json = serde_json::to_string_pretty(&file).context("serialize zones")?;
        std::fs::write(path, json)
            .with_context(|| format!("writing zones to {}", path.display()))?;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.zones.clear();
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// First zone with the given id.
    pub fn get(&self, id: u32) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.id == id)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Number of zones that take part in containment tests.
    pub fn evaluable_len(&self) -> usize {
        self.zones.iter().filter(|zone| zone.is_evaluable()).count()
    }
}
