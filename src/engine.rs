use crate::config::Config;
use crate::model::{ARENA_SIZE, Agent, Counts};
use crate::stats::TimeSeries;
use anyhow::{Context, Result, bail};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::Uniform;
use serde::{Deserialize, Serialize};

/// Result of a finished simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    /// Counts recorded at the start of every simulated day.
    pub time_series: TimeSeries,
    /// Counts after the last simulated day.
    pub final_counts: Counts,
    /// Number of simulated days.
    pub days_elapsed: usize,
}

/// Simulation engine.
///
/// Holds the configuration, the agents, the population counts and the
/// random number generator, and advances the population day by day.
pub struct Engine {
    cfg: Config,
    agt_vec: Vec<Agent>,
    counts: Counts,
    day: usize,
    time_series: TimeSeries,
    rng: ChaCha12Rng,
}

impl Engine {
    /// Create a new `Engine` with the given configuration and a random initial state.
    ///
    /// The generator is seeded from the configuration if a seed is given,
    /// and from the operating system otherwise.
    pub fn generate_initial_condition(cfg: Config) -> Result<Self> {
        let rng = match cfg.init.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng()?,
        };
        Self::with_rng(cfg, rng)
    }

    /// Create a new `Engine` drawing its initial state from `rng`.
    ///
    /// Agents are scattered uniformly over the arena and the first one
    /// is infected.
    pub fn with_rng(cfg: Config, mut rng: ChaCha12Rng) -> Result<Self> {
        let population = cfg.model.population;

        let pos_dist = Uniform::new_inclusive(0, ARENA_SIZE as u32)?;
        let mut agt_vec = Vec::with_capacity(population);
        for _ in 0..population {
            let x = pos_dist.sample(&mut rng) as f64;
            let y = pos_dist.sample(&mut rng) as f64;
            agt_vec.push(Agent::new(x, y, cfg.model.infection_probability));
        }

        let mut counts = Counts::new(population);
        agt_vec
            .first_mut()
            .context("population is empty")?
            .infect(&mut counts)
            .context("failed to infect first agent")?;

        Ok(Self {
            cfg,
            agt_vec,
            counts,
            day: 0,
            time_series: TimeSeries::new(),
            rng,
        })
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agt_vec
    }

    pub fn counts(&self) -> &Counts {
        &self.counts
    }

    pub fn day(&self) -> usize {
        self.day
    }

    /// Whether nobody is infected anymore.
    pub fn is_over(&self) -> bool {
        let counts = self.counts();
        counts.susceptible + counts.recovered == self.cfg.model.population
    }

    /// Run the simulation until the outbreak ends.
    pub fn perform_simulation(mut self) -> Result<Outcome> {
        log::info!(
            "starting simulation with {} agents",
            self.agents().len()
        );

        loop {
            self.perform_day()
                .with_context(|| format!("failed to perform day {}", self.day() + 1))?;
            log::debug!("day {:04}: {:?}", self.day(), self.counts());

            if self.is_over() {
                break;
            }
        }

        log::info!(
            "outbreak ended after {} days: {:?}",
            self.day(),
            self.counts()
        );

        Ok(Outcome {
            time_series: self.time_series,
            final_counts: self.counts,
            days_elapsed: self.day,
        })
    }

    /// Record the current counts and advance every agent by one day.
    pub fn perform_day(&mut self) -> Result<()> {
        self.time_series.push(self.day, &self.counts);
        self.day += 1;

        let model = &self.cfg.model;
        for i_agt in 0..self.agt_vec.len() {
            let agt = &mut self.agt_vec[i_agt];
            agt.walk(model.movement_radius, &mut self.rng);
            agt.tick();

            // Every agent is a potential source, the agent itself included.
            for i_src in 0..self.agt_vec.len() {
                let src = self.agt_vec[i_src];
                self.agt_vec[i_agt]
                    .check_status(
                        &src,
                        model.infection_radius,
                        model.recovery_time,
                        &mut self.counts,
                        &mut self.rng,
                    )
                    .with_context(|| format!("failed to check status of agent {i_agt}"))?;
            }
        }

        let total = self.counts().total();
        if total != model.population {
            bail!(
                "counts sum to {total}, but population is {}",
                model.population
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InitConfig, ModelConfig, PredictionConfig};
    use crate::model::Health;
    use crate::sort::arg_max;

    fn config(population: usize, movement_radius: u32, infection_probability: f64) -> Config {
        Config {
            model: ModelConfig {
                population,
                infection_radius: 1000,
                recovery_time: 5,
                movement_radius,
                infection_probability,
            },
            init: InitConfig { seed: Some(42) },
            prediction: PredictionConfig::default(),
        }
    }

    #[test]
    fn initial_condition_has_one_infected() {
        let engine = Engine::generate_initial_condition(config(20, 10, 0.5)).unwrap();
        assert_eq!(engine.agents().len(), 20);
        assert_eq!(engine.agents()[0].health(), Health::Infected);
        assert!(engine.agents()[1..]
            .iter()
            .all(|agt| agt.health() == Health::Susceptible));
        assert!(engine.agents().iter().all(|agt| {
            let (x, y) = agt.position();
            (0.0..=ARENA_SIZE).contains(&x) && (0.0..=ARENA_SIZE).contains(&y)
        }));
        assert_eq!(
            *engine.counts(),
            Counts {
                susceptible: 19,
                infected: 1,
                recovered: 0
            }
        );
        assert!(!engine.is_over());
    }

    #[test]
    fn counts_always_sum_to_population() {
        let mut cfg = config(60, 20, 0.3);
        cfg.model.infection_radius = 40;
        for seed in 0..5 {
            cfg.init.seed = Some(seed);
            let outcome = Engine::generate_initial_condition(cfg.clone())
                .unwrap()
                .perform_simulation()
                .unwrap();
            assert!(outcome.time_series.counts().all(|c| c.total() == 60));
            assert_eq!(outcome.final_counts.infected, 0);
            assert_eq!(outcome.final_counts.total(), 60);
            assert_eq!(outcome.time_series.len(), outcome.days_elapsed);
        }
    }

    #[test]
    fn certain_transmission_saturates_static_population() {
        let outcome = Engine::generate_initial_condition(config(100, 0, 1.0))
            .unwrap()
            .perform_simulation()
            .unwrap();

        assert_eq!(
            outcome.final_counts,
            Counts {
                susceptible: 0,
                infected: 0,
                recovered: 100
            }
        );
        // Everybody is infected on day 1; the first agent recovers on day 5
        // and the rest on day 6.
        assert_eq!(outcome.days_elapsed, 6);
        assert_eq!(outcome.time_series.infected, vec![1, 100, 100, 100, 100, 99]);

        let i_peak = arg_max(&outcome.time_series.infected).unwrap();
        assert_eq!(outcome.time_series.day[i_peak], 1);
    }

    #[test]
    fn zero_probability_only_seed_recovers() {
        let outcome = Engine::generate_initial_condition(config(30, 15, 0.0))
            .unwrap()
            .perform_simulation()
            .unwrap();
        assert_eq!(
            outcome.final_counts,
            Counts {
                susceptible: 29,
                infected: 0,
                recovered: 1
            }
        );
        assert_eq!(outcome.days_elapsed, 5);
    }

    #[test]
    fn single_agent_recovers_alone() {
        let outcome = Engine::generate_initial_condition(config(1, 50, 1.0))
            .unwrap()
            .perform_simulation()
            .unwrap();
        assert_eq!(outcome.final_counts.recovered, 1);
        assert_eq!(outcome.days_elapsed, 5);
        assert_eq!(outcome.time_series.day, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn same_seed_same_outcome() {
        let mut cfg = config(40, 30, 0.4);
        cfg.model.infection_radius = 60;
        let a = Engine::generate_initial_condition(cfg.clone())
            .unwrap()
            .perform_simulation()
            .unwrap();
        let b = Engine::generate_initial_condition(cfg)
            .unwrap()
            .perform_simulation()
            .unwrap();
        assert_eq!(a.time_series, b.time_series);
        assert_eq!(a.final_counts, b.final_counts);
    }

    #[test]
    fn perform_day_rejects_inconsistent_counts() {
        let mut engine = Engine::generate_initial_condition(config(10, 5, 0.0)).unwrap();
        engine.counts.susceptible += 1;
        let err = engine.perform_day().unwrap_err();
        assert_eq!(err.to_string(), "counts sum to 11, but population is 10");
    }

    #[test]
    fn perform_day_records_before_moving() {
        let mut engine = Engine::generate_initial_condition(config(10, 5, 1.0)).unwrap();
        engine.perform_day().unwrap();
        assert_eq!(engine.day(), 1);
        assert_eq!(engine.time_series.day, vec![0]);
        assert_eq!(engine.time_series.infected, vec![1]);
        assert_eq!(engine.counts().infected, 10);
    }
}
