use ndarray::ArrayD;
use rand::Rng;
use rv::dist::Bernoulli;
use rv::traits::Rv;

use super::{ComponentDistribution, DType};
use crate::params::{check_values, gather};
use crate::{ComponentParams, DistConfig, FamilyError};

const FAMILY: &str = "Bernoulli";

/// A batch of Bernoulli distributions over {0, 1} parameterized by `probs`,
/// the probability of a 1.
#[derive(Clone, Debug, PartialEq)]
pub struct BernoulliEnsemble {
    probs: ArrayD<f64>,
    batch_shape: Vec<usize>,
}

/// `Some(true)` for 1, `Some(false)` for 0, `None` for anything else
fn as_outcome(x: f64) -> Option<bool> {
    if x == 1.0 {
        Some(true)
    } else if x == 0.0 {
        Some(false)
    } else {
        None
    }
}

impl BernoulliEnsemble {
    pub const PARAMS: [&'static str; 1] = ["probs"];

    pub fn new(
        params: &ComponentParams,
        config: &DistConfig,
    ) -> Result<Self, FamilyError> {
        let (batch_shape, [probs]) =
            gather(FAMILY, params, Self::PARAMS, config)?;

        check_values(FAMILY, "probs", &probs, config, |p| {
            (0.0..=1.0).contains(&p)
        })?;

        Ok(BernoulliEnsemble { probs, batch_shape })
    }

    pub fn probs(&self) -> &ArrayD<f64> {
        &self.probs
    }

    fn element(&self, ix: &[usize]) -> Bernoulli {
        Bernoulli::new_unchecked(self.probs[ix])
    }
}

impl ComponentDistribution for BernoulliEnsemble {
    fn family_name(&self) -> &'static str {
        FAMILY
    }

    fn batch_shape(&self) -> &[usize] {
        &self.batch_shape
    }

    fn event_shape(&self) -> &[usize] {
        &[]
    }

    fn dtype(&self) -> DType {
        DType::Binary
    }

    fn ln_f_event(&self, ix: &[usize], event: &[f64]) -> f64 {
        match as_outcome(event[0]) {
            Some(x) => self.element(ix).ln_f(&x),
            None => f64::NEG_INFINITY,
        }
    }

    // The base measure is 1, so the kernel is the full log mass
    fn conjugate_ln_f_event(&self, ix: &[usize], event: &[f64]) -> Option<f64> {
        Some(self.ln_f_event(ix, event))
    }

    fn supports_conjugate(&self) -> bool {
        true
    }

    fn draw_event(&self, ix: &[usize], rng: &mut impl Rng) -> Vec<f64> {
        let x: bool = self.element(ix).draw(rng);
        vec![if x { 1.0 } else { 0.0 }]
    }

    fn mean(&self) -> Option<ArrayD<f64>> {
        Some(self.probs.clone())
    }

    fn variance(&self) -> Option<ArrayD<f64>> {
        Some(self.probs.mapv(|p| p * (1.0 - p)))
    }
}
