//! The categorical variable that picks which component generated a draw
use ndarray::{indices, ArrayD, Axis, Dimension, IxDyn};
use parmix_utils::{
    broadcast_index, broadcast_shapes, ravel_index, BroadcastError,
};
use rand::Rng;
use rv::misc::pflip;

use crate::{DistConfig, DistError, FamilyError};

/// A batch of categorical distributions over `n_cats` categories.
///
/// The last axis of the probabilities indexes the category; the axes in
/// front of it are the batch. Weights need not be normalized. Non-finite and
/// negative weights carry no mass.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoricalSelector {
    probs: ArrayD<f64>,
    batch_shape: Vec<usize>,
    n_cats: usize,
    /// Normalized weights of each batch element, in row-major batch order
    rows: Vec<Vec<f64>>,
    value: ArrayD<usize>,
}

impl CategoricalSelector {
    /// Build the selector and draw its realization, which has shape
    /// `config.sample_shape + batch_shape`.
    pub fn new<R: Rng>(
        probs: ArrayD<f64>,
        config: &DistConfig,
        rng: &mut R,
    ) -> Result<Self, FamilyError> {
        let mut cat = Self::unrealized(probs)?;
        cat.value = cat.draw(&config.sample_shape, rng);
        Ok(cat)
    }

    /// Build the selector with a fixed realization
    pub fn with_value(
        probs: ArrayD<f64>,
        value: ArrayD<usize>,
        config: &DistConfig,
    ) -> Result<Self, FamilyError> {
        let mut cat = Self::unrealized(probs)?;

        let mut expected = config.sample_shape.clone();
        expected.extend_from_slice(&cat.batch_shape);
        if value.shape() != expected.as_slice() {
            return Err(FamilyError::ValueShape {
                expected,
                found: value.shape().to_vec(),
            });
        }
        if let Some(&index) = value.iter().find(|&&k| k >= cat.n_cats) {
            return Err(FamilyError::ValueOutOfRange {
                index,
                n_cats: cat.n_cats,
            });
        }

        cat.value = value;
        Ok(cat)
    }

    fn unrealized(probs: ArrayD<f64>) -> Result<Self, FamilyError> {
        let (&n_cats, batch) = probs
            .shape()
            .split_last()
            .ok_or(FamilyError::NoCategoryAxis)?;
        let batch_shape = batch.to_vec();

        let last = Axis(probs.ndim() - 1);
        let rows = probs
            .lanes(last)
            .into_iter()
            .zip(indices(IxDyn(&batch_shape)))
            .map(|(lane, ix)| {
                let clean: Vec<f64> = lane
                    .iter()
                    .map(|&w| if w.is_finite() && w > 0.0 { w } else { 0.0 })
                    .collect();
                let total: f64 = clean.iter().sum();
                if total > 0.0 && total.is_finite() {
                    Ok(clean.iter().map(|w| w / total).collect())
                } else {
                    Err(FamilyError::InvalidWeights {
                        position: ix.slice().to_vec(),
                    })
                }
            })
            .collect::<Result<Vec<Vec<f64>>, _>>()?;

        Ok(CategoricalSelector {
            value: ArrayD::zeros(IxDyn(&batch_shape)),
            probs,
            batch_shape,
            n_cats,
            rows,
        })
    }

    /// The (unnormalized) weights the selector was built from
    pub fn probabilities(&self) -> &ArrayD<f64> {
        &self.probs
    }

    pub fn batch_shape(&self) -> &[usize] {
        &self.batch_shape
    }

    pub fn num_categories(&self) -> usize {
        self.n_cats
    }

    /// The realization drawn (or given) at construction
    pub fn value(&self) -> &ArrayD<usize> {
        &self.value
    }

    /// `n` independent draws of every batch element, with shape
    /// `[n] + batch_shape`
    pub fn sample<R: Rng>(&self, n: usize, rng: &mut R) -> ArrayD<usize> {
        self.draw(&[n], rng)
    }

    fn draw<R: Rng>(&self, lead: &[usize], rng: &mut R) -> ArrayD<usize> {
        let n: usize = lead.iter().product();
        let draws: Vec<Vec<usize>> = self
            .rows
            .iter()
            .map(|row| if n == 0 { Vec::new() } else { pflip(row, n, rng) })
            .collect();

        let lead_rank = lead.len();
        let mut shape = lead.to_vec();
        shape.extend_from_slice(&self.batch_shape);

        ArrayD::from_shape_fn(IxDyn(&shape), |ix| {
            let ix = ix.slice();
            let s = ravel_index(&ix[..lead_rank], lead);
            let b = ravel_index(&ix[lead_rank..], &self.batch_shape);
            draws[b][s]
        })
    }

    /// Log probability of each index in `value`.
    ///
    /// `value` broadcasts against the batch shape. Indices outside the
    /// categories have log probability `-inf`.
    pub fn log_prob(
        &self,
        value: &ArrayD<usize>,
    ) -> Result<ArrayD<f64>, DistError> {
        let out_shape = broadcast_shapes(value.shape(), &self.batch_shape)
            .ok_or_else(|| BroadcastError::Incompatible {
                lhs: value.shape().to_vec(),
                rhs: self.batch_shape.clone(),
            })?;

        Ok(ArrayD::from_shape_fn(IxDyn(&out_shape), |ix| {
            let ix = ix.slice();
            let k = value[broadcast_index(ix, value.shape()).as_slice()];
            let b = ravel_index(
                &broadcast_index(ix, &self.batch_shape),
                &self.batch_shape,
            );
            self.rows[b]
                .get(k)
                .map_or(f64::NEG_INFINITY, |&p| p.ln())
        }))
    }
}
