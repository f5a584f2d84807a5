//! Host configuration from defaults, positional arguments and environment.

use dsviz_engine::{RandomArray, StepDurations, StructureKind};

use crate::error::{Error, Result};
use crate::playback::PlaybackSpeed;

pub const PORT_ENV: &str = "DSVIZ_PORT";
pub const SPEED_ENV: &str = "DSVIZ_SPEED";

#[derive(Debug, Clone, PartialEq)]
pub struct VisConfig {
    pub port: u16,
    /// Structure a fresh session starts on
    pub structure: StructureKind,
    pub speed: PlaybackSpeed,
    pub durations: StepDurations,
    pub random: RandomArray,
}

impl Default for VisConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            structure: StructureKind::Stack,
            speed: PlaybackSpeed::Normal,
            durations: StepDurations::default(),
            random: RandomArray::default(),
        }
    }
}

impl VisConfig {
    /// Read `[structure] [port]` from the process arguments and the
    /// `DSVIZ_*` variables from the environment.
    pub fn from_env() -> Result<Self> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    /// Positional arguments win over the environment for the port.
    pub fn from_sources<F>(args: &[String], env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = env(PORT_ENV) {
            config.port = parse_port(&port)?;
        }
        if let Some(speed) = env(SPEED_ENV) {
            config.speed = parse_speed(&speed)?;
        }
        if let Some(structure) = args.first() {
            config.structure = structure.parse()?;
        }
        if let Some(port) = args.get(1) {
            config.port = parse_port(port)?;
        }

        Ok(config)
    }
}

fn parse_port(raw: &str) -> Result<u16> {
    raw.trim().parse().map_err(|_| Error::Config {
        key: "port",
        value: raw.to_owned(),
    })
}

fn parse_speed(raw: &str) -> Result<PlaybackSpeed> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(PlaybackSpeed::from_multiplier)
        .ok_or_else(|| Error::Config {
            key: "speed",
            value: raw.to_owned(),
        })
}
