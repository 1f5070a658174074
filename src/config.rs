use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Epidemic model parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Number of agents.
    pub population: usize,
    /// Distance (in pixels) within which an infected agent can infect another.
    pub infection_radius: u32,
    /// Number of days an agent stays infected.
    pub recovery_time: u32,
    /// Maximum displacement (in pixels) per axis and day.
    pub movement_radius: u32,
    /// Probability of infection per contact.
    pub infection_probability: f64,
}

/// Initial condition parameters.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct InitConfig {
    /// Seed of the random number generator (taken from the OS if absent).
    pub seed: Option<u64>,
}

/// Parameters of the numerical solution of the SIR equations.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Euler step size (in days).
    pub time_step: f64,
    /// Maximum number of Euler steps.
    pub max_steps: usize,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            time_step: 0.5,
            max_steps: 1_000_000,
        }
    }
}

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    #[serde(default)]
    pub init: InitConfig,
    #[serde(default)]
    pub prediction: PredictionConfig,
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a [`Config`] from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let model = &self.model;
        check_num(model.population, 1..).context("invalid population")?;
        check_num(model.infection_radius, 0..).context("invalid infection radius")?;
        check_num(model.recovery_time, 1..).context("invalid recovery time")?;
        check_num(model.movement_radius, 0..100).context("invalid movement radius")?;
        check_num(model.infection_probability, 0.0..=1.0)
            .context("invalid infection probability")?;

        let prediction = &self.prediction;
        if !(prediction.time_step > 0.0 && prediction.time_step <= 10.0) {
            bail!(
                "invalid time step: number must be in the range (0.0, 10.0], but is {:?}",
                prediction.time_step
            );
        }
        check_num(prediction.max_steps, 1..=100_000_000).context("invalid maximum steps")?;

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}
