// config.rs - Engine settings, with environment overrides

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{LifeError, Result};
use crate::topology::Topology;

pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(35);
pub const DEFAULT_RANDOM_DENSITY: f64 = 0.25;
pub const DEFAULT_FIELD_WIDTH: usize = 130;
pub const DEFAULT_FIELD_HEIGHT: usize = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct LifeConfig {
    /// Pause between generations while running.
    pub step_delay: Duration,
    /// Chance that a cell comes up alive on randomize.
    pub random_density: f64,
    pub field_width: usize,
    pub field_height: usize,
    pub topology: Topology,
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            step_delay: DEFAULT_STEP_DELAY,
            random_density: DEFAULT_RANDOM_DENSITY,
            field_width: DEFAULT_FIELD_WIDTH,
            field_height: DEFAULT_FIELD_HEIGHT,
            topology: Topology::default(),
        }
    }
}

impl LifeConfig {
    /// Defaults overridden by `CONWAY_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let step_delay = env_parse::<u64>("CONWAY_STEP_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.step_delay);

        let random_density = match env_parse::<f64>("CONWAY_RANDOM_DENSITY")? {
            Some(p) if !(0.0..=1.0).contains(&p) => {
                return Err(LifeError::Config {
                    key: "CONWAY_RANDOM_DENSITY",
                    value: p.to_string(),
                });
            }
            Some(p) => p,
            None => defaults.random_density,
        };

        Ok(Self {
            step_delay,
            random_density,
            field_width: env_parse("CONWAY_FIELD_WIDTH")?.unwrap_or(defaults.field_width),
            field_height: env_parse("CONWAY_FIELD_HEIGHT")?.unwrap_or(defaults.field_height),
            topology: env_parse("CONWAY_TOPOLOGY")?.unwrap_or(defaults.topology),
        })
    }
}

/// Unset or blank variables yield `None`; anything unparsable is an error.
pub fn env_parse<T: FromStr>(key: &'static str) -> Result<Option<T>> {
    let Ok(value) = env::var(key) else {
        return Ok(None);
    };
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| LifeError::Config { key, value: value.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_desktop_app() {
        let config = LifeConfig::default();
        assert_eq!(config.step_delay, Duration::from_millis(35));
        assert_eq!(config.random_density, 0.25);
        assert_eq!((config.field_width, config.field_height), (130, 60));
        assert_eq!(config.topology, Topology::Wrapping);
    }

    // Env vars are process-wide, so each test uses its own key.
    #[test]
    fn env_parse_reads_and_rejects() {
        unsafe {
            env::set_var("CONWAY_TEST_PARSE_OK", " 42 ");
            env::set_var("CONWAY_TEST_PARSE_BAD", "forty-two");
            env::set_var("CONWAY_TEST_PARSE_BLANK", "  ");
        }
        assert_eq!(env_parse::<u64>("CONWAY_TEST_PARSE_OK").unwrap(), Some(42));
        assert_eq!(env_parse::<u64>("CONWAY_TEST_PARSE_BLANK").unwrap(), None);
        assert_eq!(env_parse::<u64>("CONWAY_TEST_PARSE_MISSING").unwrap(), None);
        assert!(matches!(
            env_parse::<u64>("CONWAY_TEST_PARSE_BAD"),
            Err(LifeError::Config { key: "CONWAY_TEST_PARSE_BAD", .. })
        ));
    }

    #[test]
    fn env_parse_topology() {
        unsafe { env::set_var("CONWAY_TEST_TOPOLOGY", "bound") };
        assert_eq!(env_parse::<Topology>("CONWAY_TEST_TOPOLOGY").unwrap(), Some(Topology::Bounded));
    }

    // The only test that sets a real CONWAY_* key read by from_env.
    #[test]
    fn density_outside_unit_range_is_rejected() {
        unsafe { env::set_var("CONWAY_RANDOM_DENSITY", "1.5") };
        let result = LifeConfig::from_env();
        unsafe { env::remove_var("CONWAY_RANDOM_DENSITY") };

        match result {
            Err(LifeError::Config { key, value }) => {
                assert_eq!(key, "CONWAY_RANDOM_DENSITY");
                assert_eq!(value, "1.5");
            }
            other => panic!("expected a config error, got {other:?}"),
        }
    }
}
