use ndarray::ArrayD;
use rand::Rng;
use rv::dist::Gaussian;
use rv::traits::Rv;

use super::{valid_scale, ComponentDistribution, DType};
use crate::params::{check_values, gather};
use crate::{ComponentParams, DistConfig, FamilyError};

const FAMILY: &str = "Gaussian";

/// A batch of univariate Gaussians parameterized by `loc` and `scale`
#[derive(Clone, Debug, PartialEq)]
pub struct GaussianEnsemble {
    loc: ArrayD<f64>,
    scale: ArrayD<f64>,
    batch_shape: Vec<usize>,
}

impl GaussianEnsemble {
    pub const PARAMS: [&'static str; 2] = ["loc", "scale"];

    pub fn new(
        params: &ComponentParams,
        config: &DistConfig,
    ) -> Result<Self, FamilyError> {
        let (batch_shape, [loc, scale]) =
            gather(FAMILY, params, Self::PARAMS, config)?;

        check_values(FAMILY, "loc", &loc, config, f64::is_finite)?;
        check_values(FAMILY, "scale", &scale, config, valid_scale)?;

        Ok(GaussianEnsemble {
            loc,
            scale,
            batch_shape,
        })
    }

    pub fn loc(&self) -> &ArrayD<f64> {
        &self.loc
    }

    pub fn scale(&self) -> &ArrayD<f64> {
        &self.scale
    }

    fn element(&self, ix: &[usize]) -> Gaussian {
        Gaussian::new_unchecked(self.loc[ix], self.scale[ix])
    }
}

impl ComponentDistribution for GaussianEnsemble {
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

    fn conjugate_ln_f_event(&self, ix: &[usize], event: &[f64]) -> Option<f64> {
        let (mu, sigma) = (self.loc[ix], self.scale[ix]);
        let z = (event[0] - mu) / sigma;
        Some(-sigma.ln() - 0.5 * z * z)
    }

    fn supports_conjugate(&self) -> bool {
        true
    }

    fn draw_event(&self, ix: &[usize], rng: &mut impl Rng) -> Vec<f64> {
        if !valid_scale(self.scale[ix]) {
            return vec![f64::NAN];
        }
        let x: f64 = self.element(ix).draw(rng);
        vec![x]
    }

    fn mean(&self) -> Option<ArrayD<f64>> {
        Some(self.loc.clone())
    }

    fn variance(&self) -> Option<ArrayD<f64>> {
        Some(self.scale.mapv(|s| s * s))
    }
}
