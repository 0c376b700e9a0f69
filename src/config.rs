//! Host configuration.
//!
//! Loaded from an optional JSON file; any field left out takes its default.
//! Command-line flags are applied on top by the binary.

use crate::clock::Pacer;
use crate::cpu::{Cpu, Quirks};
use serde::{Serialize, Deserialize};
use std::path::Path;
use thiserror::Error;

/// Conventional instruction rate for COSMAC VIP-era programs.
pub const DEFAULT_CPU_HZ: u32 = 700;

/// Timer decrement rate.
pub const DEFAULT_TIMER_HZ: u32 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Instructions per second.
    pub cpu_hz: u32,
    /// Timer ticks per second.
    pub timer_hz: u32,
    /// Seed for `CXNN`; entropy when absent.
    pub seed: Option<u64>,
    /// Instruction compatibility switches.
    pub quirks: Quirks,
    /// Step limit for headless runs.
    pub max_cycles: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cpu_hz: DEFAULT_CPU_HZ,
            timer_hz: DEFAULT_TIMER_HZ,
            seed: None,
            quirks: Quirks::default(),
            max_cycles: 10_000,
        }
    }
}

impl Config {
    /// Read a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cpu_hz == 0 {
            return Err(ConfigError::Invalid("cpu_hz must be positive".into()));
        }
        if self.timer_hz == 0 {
            return Err(ConfigError::Invalid("timer_hz must be positive".into()));
        }
        Ok(())
    }

    /// A powered-on machine with this config's seed and quirks.
    pub fn build_cpu(&self) -> Cpu {
        let cpu = match self.seed {
            Some(seed) => Cpu::with_seed(seed),
            None => Cpu::new(),
        };
        cpu.with_quirks(self.quirks)
    }

    /// A pacer running at this config's rates.
    pub fn pacer(&self) -> Pacer {
        Pacer::new(self.cpu_hz, self.timer_hz)
    }

    /// Steps to run between timer ticks when there is no wall clock.
    pub fn steps_per_tick(&self) -> u64 {
        (self.cpu_hz / self.timer_hz.max(1)).max(1) as u64
    }
}

/// Errors that can occur while loading a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::ShiftSource;

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_json(
            r#"{ "cpu_hz": 1000, "seed": 42, "quirks": { "shift_source": "vx" } }"#,
        )
        .unwrap();

        assert_eq!(config.cpu_hz, 1000);
        assert_eq!(config.timer_hz, DEFAULT_TIMER_HZ);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.quirks.shift_source, ShiftSource::Vx);
    }

    #[test]
    fn test_rejects_zero_rate() {
        assert!(matches!(
            Config::from_json(r#"{ "timer_hz": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(
            Config::from_json("{ cpu_hz: }"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_steps_per_tick() {
        let config = Config { cpu_hz: 700, ..Config::default() };
        assert_eq!(config.steps_per_tick(), 11);
    }

    #[test]
    fn test_build_cpu_applies_quirks() {
        let config = Config { seed: Some(1), quirks: Quirks::modern(), ..Config::default() };
        let cpu = config.build_cpu();
        assert_eq!(cpu.quirks, Quirks::modern());
        assert_eq!(cpu.regs.pc, 0x200);
    }
}
