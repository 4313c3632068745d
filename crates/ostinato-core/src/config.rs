use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::constants::{
    CONFIG_FILE, CONFIG_FILE_STEM, DEFAULT_MAX_PRIMING_STEPS, DEFAULT_MAX_UNPRODUCTIVE_YEARS,
    ENV_PREFIX,
};
use crate::error::{CoreError, CoreResult};

/// Safety ceilings applied by recurrence iterators.
///
/// Both ceilings end iteration silently: an iterator that trips one simply
/// reports no further instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Limits {
    /// Consecutive candidate years without an emitted instance before the
    /// year generator short-circuits.
    pub max_unproductive_years: u32,
    /// Generator steps allowed while priming an iterator.
    pub max_priming_steps: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_unproductive_years: DEFAULT_MAX_UNPRODUCTIVE_YEARS,
            max_priming_steps: DEFAULT_MAX_PRIMING_STEPS,
        }
    }
}

impl Limits {
    /// ## Summary
    /// Loads limits from defaults, an optional `ostinato.toml` and
    /// `OSTINATO_*` environment variables. Environment variables take
    /// precedence over file values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration, deserializing it or
    /// validating the result fails.
    pub fn load() -> Result<Self> {
        let limits = Config::builder()
            .set_default(
                "max_unproductive_years",
                i64::from(DEFAULT_MAX_UNPRODUCTIVE_YEARS),
            )?
            .set_default("max_priming_steps", i64::from(DEFAULT_MAX_PRIMING_STEPS))?
            .add_source(config::File::with_name(CONFIG_FILE_STEM).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Limits>()?;

        limits.validate()?;
        tracing::debug!(
            file = CONFIG_FILE,
            max_unproductive_years = limits.max_unproductive_years,
            max_priming_steps = limits.max_priming_steps,
            "Loaded recurrence limits"
        );
        Ok(limits)
    }

    /// ## Summary
    /// Checks that both ceilings allow at least one step.
    ///
    /// ## Errors
    /// Returns `CoreError::InvalidConfiguration` if either ceiling is zero.
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_unproductive_years == 0 {
            return Err(CoreError::InvalidConfiguration(
                "max_unproductive_years must be at least 1".to_string(),
            ));
        }
        if self.max_priming_steps == 0 {
            return Err(CoreError::InvalidConfiguration(
                "max_priming_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// ## Summary
/// Loads limits after reading a `.env` file, if one exists.
///
/// ## Errors
/// Returns an error if loading or validating the configuration fails.
pub fn load_limits() -> Result<Limits> {
    dotenvy::dotenv().ok();

    Limits::load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_match_constants() {
        let limits = Limits::default();
        assert_eq!(limits.max_unproductive_years, 100);
        assert_eq!(limits.max_priming_steps, 1000);
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn zero_ceiling_is_rejected() {
        let limits = Limits {
            max_unproductive_years: 0,
            ..Limits::default()
        };
        assert!(matches!(
            limits.validate(),
            Err(CoreError::InvalidConfiguration(_))
        ));

        let limits = Limits {
            max_priming_steps: 0,
            ..Limits::default()
        };
        assert!(limits.validate().is_err());
    }

    #[test_log::test]
    fn load_without_sources_uses_defaults() {
        tracing::debug!("Loading limits with no file or environment overrides");

        let limits = Limits::load().expect("defaults should load");
        assert_eq!(limits, Limits::default());
    }
}
