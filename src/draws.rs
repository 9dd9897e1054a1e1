#[cfg(test)]
use std::collections::VecDeque;

use rand::Rng;
use rand_chacha::ChaCha20Rng;

/// Source of uniform draws in [0, 1). Every diagnostic decision consumes
/// exactly one draw, so the call order fixes the outcome of a seeded run.
pub trait UniformDraw {
    fn uniform(&mut self) -> f64;
}

impl UniformDraw for ChaCha20Rng {
    fn uniform(&mut self) -> f64 {
        self.random::<f64>()
    }
}

impl<D: UniformDraw + ?Sized> UniformDraw for &mut D {
    fn uniform(&mut self) -> f64 {
        (**self).uniform()
    }
}

/// A fixed sequence of draws, for pinning individual test decisions.
/// Panics when asked for more draws than were scripted.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct ScriptedDraws {
    values: VecDeque<f64>,
    consumed: usize,
}

#[cfg(test)]
impl ScriptedDraws {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        ScriptedDraws { values: values.into_iter().collect(), consumed: 0 }
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
impl UniformDraw for ScriptedDraws {
    fn uniform(&mut self) -> f64 {
        let value = self
            .values
            .pop_front()
            .unwrap_or_else(|| panic!("scripted draws exhausted after {} draws", self.consumed));
        self.consumed += 1;
        value
    }
}
