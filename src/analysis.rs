use crate::config::{Config, ModelConfig};
use crate::engine::Outcome;
use crate::model::{ARENA_SIZE, Counts};
use crate::predict::{Curve, EpidemicModel};
use crate::sort::{arg_max, merge_sort};
use crate::stats::TimeSeries;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

/// Rates of the SIR equations derived from the simulation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rates {
    /// Approximate number of encounters per agent and day.
    pub contact_rate: f64,
    /// Effective transmission rate.
    pub beta: f64,
    /// Recovery rate.
    pub gamma: f64,
}

impl Rates {
    pub fn new(model: &ModelConfig) -> Self {
        let density = model.population as f64 / (ARENA_SIZE * ARENA_SIZE);
        let contact_rate =
            density * (model.movement_radius as f64 / 2.0) * model.infection_radius as f64;
        Self {
            contact_rate,
            beta: contact_rate * model.infection_probability,
            gamma: 1.0 / model.recovery_time as f64,
        }
    }
}

/// Largest number of infected and the time at which it is first reached.
///
/// Whole people and days for the simulation, reals for the prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak<T> {
    pub infected: T,
    pub day: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ObservedReport {
    pub days_elapsed: usize,
    pub final_counts: Counts,
    pub peak: Peak<usize>,
    pub time_series: TimeSeries,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictedReport {
    /// Peak rounded up to whole people and days.
    pub peak: Peak<f64>,
    pub curve: Curve,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Report {
    pub parameters: ModelConfig,
    pub rates: Rates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed: Option<ObservedReport>,
    pub predicted: PredictedReport,
}

/// Compares simulation outcomes with the SIR equations.
pub struct Analyzer {
    cfg: Config,
    rates: Rates,
}

impl Analyzer {
    pub fn new(cfg: Config) -> Self {
        let rates = Rates::new(&cfg.model);
        log::info!("{rates:#?}");
        Self { cfg, rates }
    }

    /// Solve the SIR equations seeded with a single infected individual.
    pub fn predict(&self) -> Result<PredictedReport> {
        let prediction = &self.cfg.prediction;
        let curve = EpidemicModel::new(self.cfg.model.population, self.rates.beta, self.rates.gamma)
            .solve_euler(0.0, prediction.time_step, prediction.max_steps)
            .context("failed to solve SIR equations")?;
        ensure!(!curve.is_empty(), "predicted curve is empty");
        log::info!("solved SIR equations in {} steps", curve.len());

        let peak = find_peak(&curve.infected, &curve.time).context("failed to find peak")?;
        let peak = Peak {
            infected: peak.infected.ceil(),
            day: peak.day.ceil(),
        };
        log::info!("predicted peak of {} infected on day {}", peak.infected, peak.day);

        Ok(PredictedReport { peak, curve })
    }

    /// Build the full report of a finished simulation.
    pub fn analyze(&self, outcome: Outcome) -> Result<Report> {
        let series = &outcome.time_series;
        ensure!(!series.is_empty(), "time series is empty");
        log::info!("analyzing {} recorded days", series.len());

        let peak = find_peak(&series.infected, &series.day).context("failed to find peak")?;
        log::info!("observed peak of {} infected on day {}", peak.infected, peak.day);

        let observed = ObservedReport {
            days_elapsed: outcome.days_elapsed,
            final_counts: outcome.final_counts,
            peak,
            time_series: outcome.time_series,
        };

        Ok(Report {
            observed: Some(observed),
            ..self.report_prediction()?
        })
    }

    /// Build a report holding only the prediction.
    pub fn report_prediction(&self) -> Result<Report> {
        Ok(Report {
            parameters: self.cfg.model.clone(),
            rates: self.rates,
            observed: None,
            predicted: self.predict()?,
        })
    }
}

/// Peak of `infected` sampled at `time`.
///
/// The value is the last element of the sorted samples and the time that
/// of its first occurrence.
pub fn find_peak<T: PartialOrd + Copy>(infected: &[T], time: &[T]) -> Option<Peak<T>> {
    let infected_max = *merge_sort(infected).last()?;
    let i_peak = arg_max(infected)?;
    Some(Peak {
        infected: infected_max,
        day: *time.get(i_peak)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InitConfig, PredictionConfig};
    use assert_approx_eq::assert_approx_eq;

    fn config() -> Config {
        Config {
            model: ModelConfig {
                population: 100,
                infection_radius: 20,
                recovery_time: 4,
                movement_radius: 10,
                infection_probability: 0.5,
            },
            init: InitConfig::default(),
            prediction: PredictionConfig::default(),
        }
    }

    #[test]
    fn rates_from_parameters() {
        let rates = Rates::new(&config().model);
        let contact_rate = 100.0 / 490_000.0 * 5.0 * 20.0;
        assert_approx_eq!(rates.contact_rate, contact_rate, 1e-15);
        assert_approx_eq!(rates.beta, contact_rate * 0.5, 1e-15);
        assert_eq!(rates.gamma, 0.25);
    }

    #[test]
    fn static_agents_have_no_contacts() {
        let mut cfg = config();
        cfg.model.movement_radius = 0;
        let rates = Rates::new(&cfg.model);
        assert_eq!(rates.contact_rate, 0.0);
        assert_eq!(rates.beta, 0.0);
    }

    #[test]
    fn find_peak_takes_first_maximum() {
        let peak = find_peak(&[1.0, 4.0, 2.0, 4.0], &[0.0, 1.0, 2.0, 3.0]).unwrap();
        assert_eq!(
            peak,
            Peak {
                infected: 4.0,
                day: 1.0
            }
        );
        assert_eq!(find_peak::<f64>(&[], &[]), None);

        let peak = find_peak(&[1_usize, 9, 9, 3], &[0, 1, 2, 3]).unwrap();
        assert_eq!(peak, Peak { infected: 9, day: 1 });
    }

    #[test]
    fn analyze_reports_observed_and_predicted_peaks() {
        let mut time_series = TimeSeries::new();
        let mut counts = Counts::new(100);
        for (day, infected) in [1, 3, 7, 7, 2].into_iter().enumerate() {
            counts.infected = infected;
            counts.susceptible = 100 - infected;
            time_series.push(day, &counts);
        }
        let outcome = Outcome {
            time_series,
            final_counts: Counts {
                susceptible: 90,
                infected: 0,
                recovered: 10,
            },
            days_elapsed: 5,
        };

        let report = Analyzer::new(config()).analyze(outcome).unwrap();
        let observed = report.observed.unwrap();
        assert_eq!(
            observed.peak,
            Peak {
                infected: 7,
                day: 2
            }
        );
        assert_eq!(observed.days_elapsed, 5);

        let predicted = report.predicted;
        assert!(!predicted.curve.is_empty());
        assert_eq!(predicted.peak.infected, predicted.peak.infected.ceil());
        assert_eq!(predicted.peak.day, predicted.peak.day.ceil());
        let max = merge_sort(&predicted.curve.infected).last().copied().unwrap();
        assert_eq!(predicted.peak.infected, max.ceil());
    }

    #[test]
    fn predicts_with_radius_beyond_arena() {
        let mut cfg = config();
        cfg.model.infection_radius = 2000;
        let analyzer = Analyzer::new(cfg);
        let report = analyzer.report_prediction().unwrap();
        assert_approx_eq!(report.rates.contact_rate, 100.0 / 490_000.0 * 5.0 * 2000.0, 1e-12);
        assert!(report.predicted.peak.infected > 1.0);
    }

    #[test]
    fn prediction_report_has_no_observations() {
        let report = Analyzer::new(config()).report_prediction().unwrap();
        assert!(report.observed.is_none());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("observed").is_none());
        assert_eq!(json["parameters"]["population"], 100);
    }
}
