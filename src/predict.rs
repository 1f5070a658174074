//! Numerical solution of the SIR equations.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Sampled solution of the SIR equations, one entry per Euler step.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub time: Vec<f64>,
    pub susceptible: Vec<f64>,
    pub infected: Vec<f64>,
    pub recovered: Vec<f64>,
}

impl Curve {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Continuous SIR model
///
/// dS/dt = -β S I / N, dI/dt = β S I / N - γ I, dR/dt = γ I
#[derive(Debug, Clone)]
pub struct EpidemicModel {
    population: f64,
    susceptible: f64,
    infected: f64,
    recovered: f64,
    beta: f64,
    gamma: f64,
}

impl EpidemicModel {
    /// Create a model with a single infected individual.
    pub fn new(population: usize, beta: f64, gamma: f64) -> Self {
        let population = population as f64;
        Self {
            population,
            susceptible: population - 1.0,
            infected: 1.0,
            recovered: 0.0,
            beta,
            gamma,
        }
    }

    /// Integrate with the Euler method starting at time `t`.
    ///
    /// The infected update uses the already updated susceptible value, and
    /// the recovered update the already updated infected value. Stops at the
    /// first step where the infected value is decreasing and below 1% of the
    /// population. "Decreasing" compares each sample with the one before it,
    /// so the first sample has nothing to compare with and can never stop the
    /// loop, while the second one already can.
    ///
    /// # Errors
    /// Returns an error if the stop condition is not met within `max_steps`.
    pub fn solve_euler(mut self, mut t: f64, time_step: f64, max_steps: usize) -> Result<Curve> {
        let mut curve = Curve::default();
        let threshold = self.population / 100.0;

        for _ in 0..max_steps {
            self.susceptible +=
                time_step * (-self.beta * self.susceptible * self.infected / self.population);
            self.infected += time_step
                * (self.beta * self.susceptible * self.infected / self.population
                    - self.gamma * self.infected);
            self.recovered += time_step * (self.gamma * self.infected);
            t += time_step;

            let prev_infected = curve.infected.last().copied();
            curve.time.push(t);
            curve.susceptible.push(self.susceptible);
            curve.infected.push(self.infected);
            curve.recovered.push(self.recovered);

            if prev_infected.is_some_and(|prev| self.infected < prev) && self.infected < threshold {
                return Ok(curve);
            }
        }

        bail!("infected count did not fall below {threshold} within {max_steps} steps");
    }
}
