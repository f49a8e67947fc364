// Imports
use rand_distr::{Distribution, Normal};

use crate::data::{Float, ScoreMap};

/// Normally distributed population of scores
#[derive(Debug, Clone)]
pub struct Population {
    pub size: usize,
    pub distr: Normal<Float>,
}

/// Generates synthetic score maps made of one or more populations, residues are numbered from 1 in generation order
#[derive(Debug, Clone, Default)]
pub struct Generator {
    pub populations: Vec<Population>,
}

impl Generator {
    pub fn with_population(
        mut self,
        size: usize,
        mean: Float,
        std_dev: Float,
    ) -> Result<Self, rand_distr::NormalError> {
        self.populations.push(Population { size, distr: Normal::new(mean, std_dev)? });
        Ok(self)
    }

    pub fn generate(
        &self,
        rng: &mut impl rand::Rng,
    ) -> ScoreMap {
        self.populations
            .iter()
            .flat_map(|population| {
                (0..population.size).map(|_| population.distr.sample(&mut *rng)).collect::<Vec<Float>>()
            })
            .enumerate()
            .map(|(idx, score)| ((idx + 1).to_string(), score))
            .collect()
    }
}
