use ndarray::ArrayD;
use rand::Rng;
use rv::dist::Cauchy;
use rv::traits::Rv;

use super::{valid_scale, ComponentDistribution, DType};
use crate::params::{check_values, gather};
use crate::{ComponentParams, DistConfig, FamilyError};

const FAMILY: &str = "Cauchy";

/// A batch of Cauchy distributions parameterized by `loc` and `scale`.
///
/// Cauchy has neither a mean nor a variance, and no conjugate prior.
#[derive(Clone, Debug, PartialEq)]
pub struct CauchyEnsemble {
    loc: ArrayD<f64>,
    scale: ArrayD<f64>,
    batch_shape: Vec<usize>,
}

impl CauchyEnsemble {
    pub const PARAMS: [&'static str; 2] = ["loc", "scale"];

    pub fn new(
        params: &ComponentParams,
        config: &DistConfig,
    ) -> Result<Self, FamilyError> {
        let (batch_shape, [loc, scale]) =
            gather(FAMILY, params, Self::PARAMS, config)?;

        check_values(FAMILY, "loc", &loc, config, f64::is_finite)?;
        check_values(FAMILY, "scale", &scale, config, valid_scale)?;

        Ok(CauchyEnsemble {
            loc,
            scale,
            batch_shape,
        })
    }

    fn element(&self, ix: &[usize]) -> Cauchy {
        Cauchy::new_unchecked(self.loc[ix], self.scale[ix])
    }
}

impl ComponentDistribution for CauchyEnsemble {
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
        DType::Real
    }

    fn ln_f_event(&self, ix: &[usize], event: &[f64]) -> f64 {
        self.element(ix).ln_f(&event[0])
    }

    fn draw_event(&self, ix: &[usize], rng: &mut impl Rng) -> Vec<f64> {
        if !valid_scale(self.scale[ix]) {
            return vec![f64::NAN];
        }
        let x: f64 = self.element(ix).draw(rng);
        vec![x]
    }

    fn mean(&self) -> Option<ArrayD<f64>> {
        None
    }

    fn variance(&self) -> Option<ArrayD<f64>> {
        None
    }
}
