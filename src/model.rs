//! Simulation data types.

use anyhow::{Result, bail};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Side length of the square arena (in pixels).
pub const ARENA_SIZE: f64 = 700.0;

/// Distance from the arena edges that agents are kept away from.
pub const ARENA_MARGIN: f64 = 10.0;

const MIN_POS: f64 = ARENA_MARGIN;
const MAX_POS: f64 = ARENA_SIZE - ARENA_MARGIN;

/// Health state of an agent.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Health {
    Susceptible,
    Infected,
    Recovered,
}

/// Number of agents in each health state.
///
/// Only modified through [`Agent::infect`] and [`Agent::recover`], so the sum
/// of the three counts stays equal to the population size.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct Counts {
    pub susceptible: usize,
    pub infected: usize,
    pub recovered: usize,
}

impl Counts {
    /// Counts of a fully susceptible population.
    pub fn new(population: usize) -> Self {
        Self {
            susceptible: population,
            infected: 0,
            recovered: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.susceptible + self.infected + self.recovered
    }
}

/// Agent of the simulation.
///
/// Each agent has a position in the arena, a health state and
/// the number of days it has been infected for.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Agent {
    x: f64,
    y: f64,
    health: Health,
    days_infected: u32,
    infection_probability: f64,
}

impl Agent {
    /// Create a new susceptible agent at the given position.
    pub fn new(x: f64, y: f64, infection_probability: f64) -> Self {
        Self {
            x,
            y,
            health: Health::Susceptible,
            days_infected: 0,
            infection_probability,
        }
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn health(&self) -> Health {
        self.health
    }

    pub fn days_infected(&self) -> u32 {
        self.days_infected
    }

    /// Euclidean distance to another agent.
    pub fn distance(&self, other: &Agent) -> f64 {
        let (x, y) = other.position();
        (self.x - x).hypot(self.y - y)
    }

    /// Move the agent by a random offset of at most `max_step` on each axis.
    ///
    /// Offsets that would leave the arena interior are redrawn pointing
    /// back toward it, so agents starting inside `[10, 690]` stay there.
    pub fn walk<R: Rng + ?Sized>(&mut self, max_step: u32, rng: &mut R) {
        let max_step = max_step as i64;
        let x_move = rng.random_range(-max_step..=max_step);
        let y_move = rng.random_range(-max_step..=max_step);
        self.x = reflect_step(self.x, x_move, max_step, rng);
        self.y = reflect_step(self.y, y_move, max_step, rng);
    }

    /// Turn a susceptible agent into an infected one.
    ///
    /// # Errors
    /// Returns an error if the agent is not susceptible.
    pub fn infect(&mut self, counts: &mut Counts) -> Result<()> {
        if self.health != Health::Susceptible {
            bail!("cannot infect an agent that is {:?}", self.health);
        }
        self.health = Health::Infected;
        counts.susceptible -= 1;
        counts.infected += 1;
        Ok(())
    }

    /// Turn an infected agent into a recovered one.
    ///
    /// # Errors
    /// Returns an error if the agent is not infected.
    pub fn recover(&mut self, counts: &mut Counts) -> Result<()> {
        if self.health != Health::Infected {
            bail!("cannot recover an agent that is {:?}", self.health);
        }
        self.health = Health::Recovered;
        self.days_infected = 0;
        counts.infected -= 1;
        counts.recovered += 1;
        Ok(())
    }

    /// Advance the infection clock by one day.
    pub fn tick(&mut self) {
        if self.health == Health::Infected {
            self.days_infected += 1;
        }
    }

    /// Check for recovery, or for infection by `other`.
    ///
    /// Always consumes exactly one random draw, taken before any check.
    pub fn check_status<R: Rng + ?Sized>(
        &mut self,
        other: &Agent,
        infection_radius: u32,
        recovery_time: u32,
        counts: &mut Counts,
        rng: &mut R,
    ) -> Result<()> {
        let draw = rng.random_range(0..100_u32);

        if self.days_infected() == recovery_time {
            return self.recover(counts);
        }
        if self.health() != Health::Susceptible {
            return Ok(());
        }
        if self.distance(other) <= infection_radius as f64
            && other.health() == Health::Infected
            && (draw as f64) < self.infection_probability * 100.0
        {
            self.infect(counts)?;
        }
        Ok(())
    }
}

fn reflect_step<R: Rng + ?Sized>(pos: f64, step: i64, max_step: i64, rng: &mut R) -> f64 {
    let new_pos = pos + step as f64;
    let step = if new_pos < MIN_POS {
        rng.random_range(0..=max_step)
    } else if new_pos > MAX_POS {
        rng.random_range(-max_step..=0)
    } else {
        step
    };
    pos + step as f64
}
