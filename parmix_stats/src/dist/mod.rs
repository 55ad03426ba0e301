//! Component ensembles: one distribution object whose leading batch axis
//! indexes the mixture component.
mod bernoulli;
mod cauchy;
mod gaussian;
mod mvn_diag;
mod poisson;

pub use bernoulli::BernoulliEnsemble;
pub use cauchy::CauchyEnsemble;
pub use gaussian::GaussianEnsemble;
pub use mvn_diag::MvNormalDiagEnsemble;
pub use poisson::PoissonEnsemble;

use enum_dispatch::enum_dispatch;
use ndarray::{indices, ArrayD, Dimension, IxDyn};
use parmix_utils::{
    broadcast_index, broadcast_shapes, ravel_index, BroadcastError,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::DistError;

/// The kind of values a distribution produces
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    /// Real-valued
    Real,
    /// Non-negative integers
    Count,
    /// Zero or one
    Binary,
}

impl DType {
    pub fn is_continuous(self) -> bool {
        matches!(self, DType::Real)
    }
}

/// A batch of distributions from one family, evaluated together.
///
/// Implementors describe a single batch element through `ln_f_event`,
/// `draw_event`, and friends; the array-level operations are provided.
#[enum_dispatch(Component)]
pub trait ComponentDistribution {
    /// Name of the family, for diagnostics
    fn family_name(&self) -> &'static str;

    /// Shape of the batch. For a mixture ensemble the first axis indexes the
    /// component.
    fn batch_shape(&self) -> &[usize];

    /// Shape of a single draw
    fn event_shape(&self) -> &[usize];

    fn dtype(&self) -> DType;

    /// Log density of `event` under the batch element at `ix`
    fn ln_f_event(&self, ix: &[usize], event: &[f64]) -> f64;

    /// The parameter-dependent kernel of the log density of `event` under
    /// the batch element at `ix`. `None` if the family has no conjugate form.
    fn conjugate_ln_f_event(
        &self,
        _ix: &[usize],
        _event: &[f64],
    ) -> Option<f64> {
        None
    }

    fn supports_conjugate(&self) -> bool {
        false
    }

    /// Draw one event from the batch element at `ix`
    fn draw_event(&self, ix: &[usize], rng: &mut impl Rng) -> Vec<f64>;

    /// Mean with shape `batch_shape + event_shape`, if the family has one
    fn mean(&self) -> Option<ArrayD<f64>>;

    /// Variance with shape `batch_shape + event_shape`, if the family has one
    fn variance(&self) -> Option<ArrayD<f64>>;

    /// Log density of every event in `x`.
    ///
    /// `x` has shape `sample_shape + batch_shape' + event_shape` where
    /// `batch_shape'` broadcasts against the batch shape. The result has the
    /// broadcast shape of everything in front of the event axes.
    fn log_prob(&self, x: &ArrayD<f64>) -> Result<ArrayD<f64>, DistError> {
        evaluate(self.batch_shape(), self.event_shape(), x, |ix, event| {
            self.ln_f_event(ix, event)
        })
    }

    /// Like `log_prob` but with the conjugate kernel
    fn conjugate_log_prob(
        &self,
        x: &ArrayD<f64>,
    ) -> Result<ArrayD<f64>, DistError> {
        if !self.supports_conjugate() {
            return Err(DistError::ConjugateUnsupported {
                family: self.family_name(),
            });
        }
        evaluate(self.batch_shape(), self.event_shape(), x, |ix, event| {
            self.conjugate_ln_f_event(ix, event)
                .unwrap_or(f64::NEG_INFINITY)
        })
    }

    /// `n` independent draws of the whole batch, with shape
    /// `[n] + batch_shape + event_shape`
    fn sample(
        &self,
        n: usize,
        rng: &mut impl Rng,
    ) -> Result<ArrayD<f64>, DistError> {
        let batch_shape = self.batch_shape().to_vec();
        let mut shape = vec![n];
        shape.extend_from_slice(&batch_shape);
        shape.extend_from_slice(self.event_shape());

        let mut data: Vec<f64> = Vec::with_capacity(shape.iter().product());
        for _ in 0..n {
            for ix in indices(IxDyn(&batch_shape)) {
                data.extend(self.draw_event(ix.slice(), rng));
            }
        }

        ArrayD::from_shape_vec(IxDyn(&shape), data).map_err(DistError::from)
    }
}

/// Whether `scale` can parameterize a location-scale draw. Unvalidated
/// ensembles may hold any value, and those elements draw NaN.
#[inline]
pub(crate) fn valid_scale(scale: f64) -> bool {
    scale.is_finite() && scale > 0.0
}

/// Evaluate `f` on every event of `x` against the batch element it lines up
/// with.
pub(crate) fn evaluate<F>(
    batch_shape: &[usize],
    event_shape: &[usize],
    x: &ArrayD<f64>,
    f: F,
) -> Result<ArrayD<f64>, DistError>
where
    F: Fn(&[usize], &[f64]) -> f64,
{
    let event_rank = event_shape.len();
    let ndim = x.ndim();
    if ndim < event_rank || &x.shape()[ndim - event_rank..] != event_shape {
        return Err(DistError::EventShape {
            event_shape: event_shape.to_vec(),
            found: x.shape().to_vec(),
        });
    }

    let lead = &x.shape()[..ndim - event_rank];
    let out_shape = broadcast_shapes(lead, batch_shape).ok_or_else(|| {
        BroadcastError::Incompatible {
            lhs: lead.to_vec(),
            rhs: batch_shape.to_vec(),
        }
    })?;

    let event_size: usize = event_shape.iter().product();
    let data: Vec<f64> = x.iter().copied().collect();

    let out = ArrayD::from_shape_fn(IxDyn(&out_shape), |ix| {
        let ix = ix.slice();
        let start = ravel_index(&broadcast_index(ix, lead), lead) * event_size;
        let batch_ix = broadcast_index(ix, batch_shape);
        f(&batch_ix, &data[start..start + event_size])
    });
    Ok(out)
}

/// A component ensemble from one of the built-in families
#[enum_dispatch]
#[derive(Clone, Debug, PartialEq)]
pub enum Component {
    Gaussian(GaussianEnsemble),
    Bernoulli(BernoulliEnsemble),
    Poisson(PoissonEnsemble),
    Cauchy(CauchyEnsemble),
    MvNormalDiag(MvNormalDiagEnsemble),
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn evaluate_broadcasts_sample_axes_against_batch() {
        // batch of 3, scalar events, two samples with a unit batch axis
        let x = arr2(&[[1.0], [2.0]]).into_dyn();
        let out = evaluate(&[3], &[], &x, |ix, ev| ix[0] as f64 * 10.0 + ev[0])
            .unwrap();

        assert_eq!(out.shape(), &[2, 3]);
        assert_eq!(
            out,
            arr2(&[[1.0, 11.0, 21.0], [2.0, 12.0, 22.0]]).into_dyn()
        );
    }

    #[test]
    fn evaluate_passes_whole_events() {
        let x = arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn();
        let out = evaluate(&[2], &[2], &x, |_, ev| ev.iter().sum()).unwrap();
        assert_relative_eq!(out[[0]], 3.0);
        assert_relative_eq!(out[[1]], 7.0);
    }

    #[test]
    fn evaluate_rejects_wrong_event_shape() {
        let x = arr1(&[1.0, 2.0, 3.0]).into_dyn();
        let err = evaluate(&[], &[2], &x, |_, _| 0.0).unwrap_err();
        assert_eq!(
            err,
            DistError::EventShape {
                event_shape: vec![2],
                found: vec![3]
            }
        );
    }

    #[test]
    fn evaluate_rejects_non_broadcasting_batch() {
        let x = arr1(&[1.0, 2.0]).into_dyn();
        let err = evaluate(&[3], &[], &x, |_, _| 0.0).unwrap_err();
        assert!(matches!(err, DistError::Broadcast(_)));
    }

    #[test]
    fn dtype_continuity() {
        assert!(DType::Real.is_continuous());
        assert!(!DType::Count.is_continuous());
        assert!(!DType::Binary.is_continuous());
    }
}
