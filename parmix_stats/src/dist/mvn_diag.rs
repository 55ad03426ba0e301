use ndarray::ArrayD;
use rand::Rng;
use rv::dist::Gaussian;
use rv::traits::Rv;

use super::{valid_scale, ComponentDistribution, DType};
use crate::params::{check_values, gather};
use crate::{ComponentParams, DistConfig, FamilyError};

const FAMILY: &str = "MvNormalDiag";

/// A batch of multivariate normals with diagonal covariance.
///
/// The last axis of `loc` and `scale_diag` is the event axis; every axis in
/// front of it is a batch axis.
#[derive(Clone, Debug, PartialEq)]
pub struct MvNormalDiagEnsemble {
    loc: ArrayD<f64>,
    scale_diag: ArrayD<f64>,
    batch_shape: Vec<usize>,
    event_shape: [usize; 1],
}

impl MvNormalDiagEnsemble {
    pub const PARAMS: [&'static str; 2] = ["loc", "scale_diag"];

    pub fn new(
        params: &ComponentParams,
        config: &DistConfig,
    ) -> Result<Self, FamilyError> {
        let (shape, [loc, scale_diag]) =
            gather(FAMILY, params, Self::PARAMS, config)?;

        let (event_dim, batch_shape) = match shape.split_last() {
            Some((&dim, batch)) => (dim, batch.to_vec()),
            None => {
                return Err(FamilyError::NoEventAxis {
                    family: FAMILY,
                    name: "loc".to_owned(),
                })
            }
        };

        if config.validate_args && batch_shape.is_empty() {
            return Err(FamilyError::NoComponentAxis {
                family: FAMILY,
                name: "loc".to_owned(),
            });
        }

        check_values(FAMILY, "loc", &loc, config, f64::is_finite)?;
        check_values(FAMILY, "scale_diag", &scale_diag, config, valid_scale)?;

        Ok(MvNormalDiagEnsemble {
            loc,
            scale_diag,
            batch_shape,
            event_shape: [event_dim],
        })
    }

    /// The univariate marginals of the batch element at `ix`
    fn marginals<'a>(
        &'a self,
        ix: &'a [usize],
    ) -> impl Iterator<Item = Gaussian> + 'a {
        (0..self.event_shape[0]).map(move |j| {
            let mut full = Vec::with_capacity(ix.len() + 1);
            full.extend_from_slice(ix);
            full.push(j);
            Gaussian::new_unchecked(
                self.loc[full.as_slice()],
                self.scale_diag[full.as_slice()],
            )
        })
    }
}

impl ComponentDistribution for MvNormalDiagEnsemble {
    fn family_name(&self) -> &'static str {
        FAMILY
    }

    fn batch_shape(&self) -> &[usize] {
        &self.batch_shape
    }

    fn event_shape(&self) -> &[usize] {
        &self.event_shape
    }

    fn dtype(&self) -> DType {
        DType::Real
    }

    fn ln_f_event(&self, ix: &[usize], event: &[f64]) -> f64 {
        self.marginals(ix)
            .zip(event.iter())
            .map(|(g, x)| g.ln_f(x))
            .sum()
    }

    fn conjugate_ln_f_event(&self, ix: &[usize], event: &[f64]) -> Option<f64> {
        let kernel = self
            .marginals(ix)
            .zip(event.iter())
            .map(|(g, &x)| {
                let z = (x - g.mu()) / g.sigma();
                -g.sigma().ln() - 0.5 * z * z
            })
            .sum();
        Some(kernel)
    }

    fn supports_conjugate(&self) -> bool {
        true
    }

    fn draw_event(&self, ix: &[usize], rng: &mut impl Rng) -> Vec<f64> {
        self.marginals(ix)
            .map(|g| {
                if valid_scale(g.sigma()) {
                    let x: f64 = g.draw(rng);
                    x
                } else {
                    f64::NAN
                }
            })
            .collect()
    }

    fn mean(&self) -> Option<ArrayD<f64>> {
        Some(self.loc.clone())
    }

    fn variance(&self) -> Option<ArrayD<f64>> {
        Some(self.scale_diag.mapv(|s| s * s))
    }
}
