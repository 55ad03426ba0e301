//! Closed-form mixture moments through the law of total variance
use ndarray::ArrayD;
use parmix_stats::ComponentDistribution;
use parmix_utils::{pad_trailing, sum_axis, zip_with, BroadcastError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean, variance, and standard deviation of a mixture, each with shape
/// `batch_shape + event_shape`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    pub mean: ArrayD<f64>,
    pub variance: ArrayD<f64>,
    pub stddev: ArrayD<f64>,
}

/// Why a mixture has no moments
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MomentsUnavailable {
    #[error("the component family does not define a mean and variance")]
    FamilyUnsupported,
    /// Moments are only computed for weights of rank at most one
    #[error("mixing weights of rank {rank} carry batch axes")]
    BatchedWeights { rank: usize },
    #[error("component moments do not line up with the weights: {0}")]
    Incompatible(BroadcastError),
    #[error("moments are NaN and NaN statistics are not allowed")]
    NanStatistics,
}

/// The outcome of the moment computation done once at construction
#[derive(Clone, Debug, PartialEq)]
pub enum MomentCache {
    Computed(Moments),
    Unavailable(MomentsUnavailable),
}

impl MomentCache {
    /// Attempt the moments of a mixture of `components` with `weights`.
    ///
    /// Never fails; the reason moments cannot be had is stored instead.
    pub fn compute<D: ComponentDistribution>(
        weights: &ArrayD<f64>,
        components: &D,
        allow_nan_stats: bool,
    ) -> Self {
        match Self::try_compute(weights, components, allow_nan_stats) {
            Ok(moments) => MomentCache::Computed(moments),
            Err(reason) => MomentCache::Unavailable(reason),
        }
    }

    fn try_compute<D: ComponentDistribution>(
        weights: &ArrayD<f64>,
        components: &D,
        allow_nan_stats: bool,
    ) -> Result<Moments, MomentsUnavailable> {
        if weights.ndim() > 1 {
            return Err(MomentsUnavailable::BatchedWeights {
                rank: weights.ndim(),
            });
        }

        let (comp_means, comp_vars) =
            match (components.mean(), components.variance()) {
                (Some(mean), Some(var)) => (mean, var),
                _ => return Err(MomentsUnavailable::FamilyUnsupported),
            };

        let incompatible = MomentsUnavailable::Incompatible;

        // E[X^2 | Z] for each component
        let comp_mean_sq =
            zip_with(&comp_means, &comp_vars, |m, v| m.mul_add(m, v))
                .map_err(incompatible)?;

        let w = pad_trailing(weights.clone(), comp_means.ndim());

        let weighted_sum = |xs: &ArrayD<f64>| {
            zip_with(xs, &w, |x, w| x * w)
                .and_then(|prod| sum_axis(&prod, 0))
                .map_err(incompatible)
        };

        let mean = weighted_sum(&comp_means)?;
        let mean_sq = weighted_sum(&comp_mean_sq)?;
        let variance =
            zip_with(&mean_sq, &mean, |sq, m| m.mul_add(-m, sq))
                .map_err(incompatible)?;
        let stddev = variance.mapv(f64::sqrt);

        let has_nan = |xs: &ArrayD<f64>| xs.iter().any(|x| x.is_nan());
        if !allow_nan_stats
            && (has_nan(&mean) || has_nan(&variance) || has_nan(&stddev))
        {
            return Err(MomentsUnavailable::NanStatistics);
        }

        Ok(Moments {
            mean,
            variance,
            stddev,
        })
    }

    pub fn get(&self) -> Result<&Moments, MomentsUnavailable> {
        match self {
            MomentCache::Computed(moments) => Ok(moments),
            MomentCache::Unavailable(reason) => Err(reason.clone()),
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, MomentCache::Computed(_))
    }
}
