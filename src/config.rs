//! Fleet configuration: airplane descriptors, the file loader, and the
//! simulated-time knobs.
//!
//! The loader accepts one airplane per line:
//!
//! ```text
//! Plane-3, Large, Normal, 4
//! ```
//!
//! Malformed lines are logged and skipped; a single bad line never fails the
//! whole load.

use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read fleet configuration file: {0}")]
    Io(#[from] std::io::Error),
}

/// Airplane size class. The class decides which runways match and how long
/// the landing maneuver holds the runway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirplaneSize {
    /// Lands only on the long runway.
    Large,
    /// Prefers the short runway, falls back to the long one.
    Regular,
}

impl AirplaneSize {
    /// Simulated landing duration, in fleet-file seconds.
    pub fn landing_secs(self) -> u64 {
        match self {
            AirplaneSize::Large => 7,
            AirplaneSize::Regular => 5,
        }
    }
}

/// Urgency of a landing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Emergency,
    Normal,
}

/// Immutable description of one configured airplane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirplaneDescriptor {
    /// Unique airplane name, the registry key.
    pub name: String,
    pub size: AirplaneSize,
    pub urgency: Urgency,
    /// Simulated seconds between simulation start and the first landing
    /// request.
    pub arrival_offset_secs: u64,
}

fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?P<name>[^,\s]+)\s*,\s*(?P<size>Regular|Large)\s*,\s*(?P<urgency>Normal|Emergency)\s*,\s*(?P<seconds>\d+)",
        )
        .expect("fleet line pattern is valid")
    })
}

/// Loads all well-formed airplane descriptors from the file at `path`.
pub fn load_fleet(path: &Path) -> std::result::Result<Vec<AirplaneDescriptor>, ConfigError> {
    let contents = fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(parse_line)
        .collect())
}

fn parse_line(line: &str) -> Option<AirplaneDescriptor> {
    let Some(captures) = line_pattern().captures(line) else {
        tracing::warn!(line, "skipping corrupted line in fleet configuration");
        return None;
    };
    Some(AirplaneDescriptor {
        name: captures["name"].to_string(),
        size: if &captures["size"] == "Large" {
            AirplaneSize::Large
        } else {
            AirplaneSize::Regular
        },
        urgency: if &captures["urgency"] == "Emergency" {
            Urgency::Emergency
        } else {
            Urgency::Normal
        },
        // The pattern only matches digits, so this parse cannot fail.
        arrival_offset_secs: captures["seconds"].parse().unwrap_or(0),
    })
}

/// Simulated-time configuration.
///
/// All delays in the simulation are multiples of `second`. Shrinking it (and
/// the controller idle interval) speeds a run up without changing any
/// ordering or atomicity guarantee, which is what the test suite does.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    /// Real duration of one simulated second.
    pub second: Duration,
    /// How long an idle controller waits for mail before re-checking its
    /// proposals unconditionally.
    pub idle_poll: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            second: Duration::from_secs(1),
            idle_poll: Duration::from_millis(200),
        }
    }
}

impl Timing {
    /// Delay before an airplane issues its first landing request.
    pub fn arrival_delay(&self, descriptor: &AirplaneDescriptor) -> Duration {
        self.second.saturating_mul(descriptor.arrival_offset_secs as u32)
    }

    /// How long a landing airplane holds its runway.
    pub fn landing_duration(&self, size: AirplaneSize) -> Duration {
        self.second.saturating_mul(size.landing_secs() as u32)
    }
}
