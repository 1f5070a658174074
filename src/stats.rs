use crate::model::Counts;
use serde::{Deserialize, Serialize};

/// Daily record of the population counts.
///
/// The four sequences always have the same length and are only appended to.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub day: Vec<usize>,
    pub susceptible: Vec<usize>,
    pub infected: Vec<usize>,
    pub recovered: Vec<usize>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, day: usize, counts: &Counts) {
        self.day.push(day);
        self.susceptible.push(counts.susceptible);
        self.infected.push(counts.infected);
        self.recovered.push(counts.recovered);
    }

    pub fn len(&self) -> usize {
        self.day.len()
    }

    pub fn is_empty(&self) -> bool {
        self.day.is_empty()
    }
}

#[cfg(test)]
impl TimeSeries {
    /// Iterate over the recorded counts.
    pub fn counts(&self) -> impl Iterator<Item = Counts> + '_ {
        (0..self.len()).map(|i| Counts {
            susceptible: self.susceptible[i],
            infected: self.infected[i],
            recovered: self.recovered[i],
        })
    }
}
