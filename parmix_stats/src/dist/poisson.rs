use ndarray::ArrayD;
use rand::Rng;
use rv::dist::Poisson;
use rv::traits::Rv;

use super::{ComponentDistribution, DType};
use crate::params::{check_values, gather};
use crate::{ComponentParams, DistConfig, FamilyError};

const FAMILY: &str = "Poisson";

/// A batch of Poisson distributions parameterized by `rate`
#[derive(Clone, Debug, PartialEq)]
pub struct PoissonEnsemble {
    rate: ArrayD<f64>,
    batch_shape: Vec<usize>,
}

fn as_count(x: f64) -> Option<u32> {
    if x >= 0.0 && x.fract() == 0.0 && x <= f64::from(u32::MAX) {
        Some(x as u32)
    } else {
        None
    }
}

impl PoissonEnsemble {
    pub const PARAMS: [&'static str; 1] = ["rate"];

    pub fn new(
        params: &ComponentParams,
        config: &DistConfig,
    ) -> Result<Self, FamilyError> {
        let (batch_shape, [rate]) =
            gather(FAMILY, params, Self::PARAMS, config)?;

        check_values(FAMILY, "rate", &rate, config, |r| {
            r.is_finite() && r > 0.0
        })?;

        Ok(PoissonEnsemble { rate, batch_shape })
    }

    pub fn rate(&self) -> &ArrayD<f64> {
        &self.rate
    }

    fn element(&self, ix: &[usize]) -> Poisson {
        Poisson::new_unchecked(self.rate[ix])
    }
}

impl ComponentDistribution for PoissonEnsemble {
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
        DType::Count
    }

    fn ln_f_event(&self, ix: &[usize], event: &[f64]) -> f64 {
        match as_count(event[0]) {
            Some(x) => self.element(ix).ln_f(&x),
            None => f64::NEG_INFINITY,
        }
    }

    // Drops the -ln(x!) base measure
    fn conjugate_ln_f_event(&self, ix: &[usize], event: &[f64]) -> Option<f64> {
        let rate = self.rate[ix];
        let kernel = match as_count(event[0]) {
            Some(x) => f64::from(x).mul_add(rate.ln(), -rate),
            None => f64::NEG_INFINITY,
        };
        Some(kernel)
    }

    fn supports_conjugate(&self) -> bool {
        true
    }

    // rates outside the support are only caught when validating
    fn draw_event(&self, ix: &[usize], rng: &mut impl Rng) -> Vec<f64> {
        let rate = self.rate[ix];
        if !(rate.is_finite() && rate > 0.0) {
            return vec![f64::NAN];
        }
        let x: u32 = self.element(ix).draw(rng);
        vec![f64::from(x)]
    }

    fn mean(&self) -> Option<ArrayD<f64>> {
        Some(self.rate.clone())
    }

    fn variance(&self) -> Option<ArrayD<f64>> {
        Some(self.rate.clone())
    }
}
