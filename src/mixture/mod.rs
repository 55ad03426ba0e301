//! The parameterized mixture: a categorical over components composed with a
//! batch of components from one family.
mod moments;
mod select;
pub mod shapes;

pub use moments::{MomentCache, Moments, MomentsUnavailable};
pub use select::select_component;

use log::debug;
use ndarray::{indices, ArrayD, Axis, Dimension, IxDyn};
use parmix_stats::{
    CategoricalSelector, Component, ComponentDistribution, ComponentParams,
    DType, DistError,
};
use parmix_utils::{
    broadcast_index, broadcast_shapes, expand_dims, logsumexp_axis, zip_with,
    BroadcastError,
};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use crate::{MixtureConfig, MixtureError, SampleStrategy};

/// Draws from a mixture along with the component each one came from
#[derive(Clone, Debug, PartialEq)]
pub struct MixtureDraw {
    /// Component indices with shape `[n] + cat.batch_shape`
    pub indices: ArrayD<usize>,
    /// Draws with shape `[n] + batch_shape + event_shape`
    pub values: ArrayD<f64>,
}

/// A mixture whose components share a family and differ in parameters.
///
/// Built with [`MixtureBuilder`](crate::MixtureBuilder). Construction draws a
/// realization of the categorical and of every component; `log_prob`
/// conditions on the realized categorical while `marginal_log_prob`
/// integrates it out.
#[derive(Clone, Debug)]
pub struct ParamMixture<D = Component> {
    pub(crate) config: MixtureConfig,
    pub(crate) component_params: ComponentParams,
    pub(crate) cat: CategoricalSelector,
    pub(crate) components: D,
    /// Realization with shape `sample_shape + [K] + batch + event`
    pub(crate) components_value: ArrayD<f64>,
    pub(crate) num_components: usize,
    pub(crate) batch_shape: Vec<usize>,
    pub(crate) moments: MomentCache,
}

impl<D: ComponentDistribution> ParamMixture<D> {
    pub fn cat(&self) -> &CategoricalSelector {
        &self.cat
    }

    pub fn components(&self) -> &D {
        &self.components
    }

    /// The realization of every component drawn at construction
    pub fn components_value(&self) -> &ArrayD<f64> {
        &self.components_value
    }

    pub fn num_components(&self) -> usize {
        self.num_components
    }

    /// The categorical batch shape broadcast against the component batch
    /// shape after its component axis, so it can be wider than
    /// `cat().batch_shape()`
    pub fn batch_shape(&self) -> &[usize] {
        &self.batch_shape
    }

    pub fn event_shape(&self) -> &[usize] {
        self.components.event_shape()
    }

    pub fn sample_shape(&self) -> &[usize] {
        &self.config.sample_shape
    }

    pub fn dtype(&self) -> DType {
        self.components.dtype()
    }

    pub fn is_continuous(&self) -> bool {
        self.dtype().is_continuous()
    }

    /// Draws pass through a discrete selection, so they are never
    /// reparameterized.
    pub fn is_reparameterized(&self) -> bool {
        false
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &MixtureConfig {
        &self.config
    }

    pub fn mixing_weights(&self) -> &ArrayD<f64> {
        self.cat.probabilities()
    }

    pub fn component_params(&self) -> &ComponentParams {
        &self.component_params
    }

    #[inline]
    fn batch_rank(&self) -> usize {
        self.batch_shape.len()
    }

    #[inline]
    fn batch_event_rank(&self) -> usize {
        self.batch_rank() + self.event_shape().len()
    }

    /// Log probability of `x` under every component, with shape
    /// `sample_shape + [K] + batch_shape`
    fn component_log_probs<F>(
        &self,
        x: &ArrayD<f64>,
        eval: F,
    ) -> Result<ArrayD<f64>, MixtureError>
    where
        F: Fn(&D, &ArrayD<f64>) -> Result<ArrayD<f64>, DistError>,
    {
        let r = self.batch_event_rank() as isize;
        let expanded = expand_dims(x.clone(), -(r + 1))?;
        eval(&self.components, &expanded).map_err(MixtureError::from)
    }

    /// Number of mixture batch axes the categorical does not carry
    #[inline]
    fn missing_cat_axes(&self) -> usize {
        self.batch_rank().saturating_sub(self.cat.batch_shape().len())
    }

    /// Insert unit axes in front of the categorical batch axes of `indices`
    /// so that it lines up with every mixture batch axis
    fn align_indices(&self, indices: &ArrayD<usize>) -> ArrayD<usize> {
        let at = indices.ndim() - self.cat.batch_shape().len();
        (0..self.missing_cat_axes())
            .fold(indices.clone(), |acc, _| acc.insert_axis(Axis(at)))
    }

    fn select_realized(
        &self,
        log_probs: &ArrayD<f64>,
    ) -> Result<ArrayD<f64>, MixtureError> {
        select_component(
            log_probs,
            &self.align_indices(self.cat.value()),
            self.num_components,
            self.batch_rank(),
            0,
        )
        .map_err(MixtureError::from)
    }

    /// Log probability of `x` given the realized categorical.
    ///
    /// `x` has shape `sample_shape + batch_shape + event_shape`; the result
    /// has shape `sample_shape + batch_shape`.
    pub fn log_prob(
        &self,
        x: &ArrayD<f64>,
    ) -> Result<ArrayD<f64>, MixtureError> {
        let log_probs =
            self.component_log_probs(x, |comps, x| comps.log_prob(x))?;
        self.select_realized(&log_probs)
    }

    /// Conditional log probability of `x` using the conjugate kernel of the
    /// component family.
    ///
    /// Fails with `DistError::ConjugateUnsupported` if the family has none.
    pub fn conjugate_log_prob_of(
        &self,
        x: &ArrayD<f64>,
    ) -> Result<ArrayD<f64>, MixtureError> {
        let log_probs = self
            .component_log_probs(x, |comps, x| comps.conjugate_log_prob(x))?;
        self.select_realized(&log_probs)
    }

    /// Conjugate log probability of the mixture's own realized value
    pub fn conjugate_log_prob(&self) -> Result<ArrayD<f64>, MixtureError> {
        let value = self.value()?;
        self.conjugate_log_prob_of(&value)
    }

    /// Log probability of `x` with the categorical summed out
    pub fn marginal_log_prob(
        &self,
        x: &ArrayD<f64>,
    ) -> Result<ArrayD<f64>, MixtureError> {
        let log_probs =
            self.component_log_probs(x, |comps, x| comps.log_prob(x))?;

        // move the component axis of the weights to the front, then give
        // the weights every batch axis of the components
        let probs = self.cat.probabilities();
        let p_ndims = probs.ndim();
        let perm: Vec<usize> = std::iter::once(p_ndims - 1)
            .chain(0..p_ndims - 1)
            .collect();
        let ln_weights = (0..self.missing_cat_axes()).fold(
            probs.view().permuted_axes(perm).mapv(f64::ln),
            |acc, _| acc.insert_axis(Axis(1)),
        );

        let joint = zip_with(&log_probs, &ln_weights, |lp, lw| lp + lw)?;
        let axis = joint.ndim() - 1 - self.batch_rank();
        logsumexp_axis(&joint, axis).map_err(MixtureError::from)
    }

    /// `n` fresh draws with shape `[n] + batch_shape + event_shape`
    pub fn sample<R: Rng>(
        &self,
        n: usize,
        rng: &mut R,
    ) -> Result<ArrayD<f64>, MixtureError> {
        self.draw(n, rng).map(|draw| draw.values)
    }

    /// `sample` with a fresh `Xoshiro256Plus` seeded with `seed`
    pub fn sample_seeded(
        &self,
        n: usize,
        seed: u64,
    ) -> Result<ArrayD<f64>, MixtureError> {
        let mut rng = Xoshiro256Plus::seed_from_u64(seed);
        self.sample(n, &mut rng)
    }

    /// `n` fresh draws along with the component indices that produced them
    pub fn draw<R: Rng>(
        &self,
        n: usize,
        rng: &mut R,
    ) -> Result<MixtureDraw, MixtureError> {
        debug!(
            "{}: drawing {} samples ({})",
            self.name(),
            n,
            self.config.sample_strategy
        );
        match self.config.sample_strategy {
            SampleStrategy::Dense => self.draw_dense(n, rng),
            SampleStrategy::Selected => self.draw_selected(n, rng),
        }
    }

    fn draw_dense<R: Rng>(
        &self,
        n: usize,
        rng: &mut R,
    ) -> Result<MixtureDraw, MixtureError> {
        let indices = self.cat.sample(n, rng);
        let comp_sample = self.components.sample(n, rng)?;
        let values = select_component(
            &comp_sample,
            &self.align_indices(&indices),
            self.num_components,
            self.batch_rank(),
            self.event_shape().len(),
        )?;
        Ok(MixtureDraw { indices, values })
    }

    fn draw_selected<R: Rng>(
        &self,
        n: usize,
        rng: &mut R,
    ) -> Result<MixtureDraw, MixtureError> {
        let cat_batch = self.cat.batch_shape();
        let comp_batch = self.components.batch_shape();

        let mut full_batch = vec![self.num_components];
        full_batch.extend_from_slice(&self.batch_shape);

        let covers = |outer: &[usize], inner: &[usize]| {
            broadcast_shapes(outer, inner).as_deref() == Some(outer)
        };
        if !covers(&full_batch, comp_batch) {
            return Err(BroadcastError::Incompatible {
                lhs: full_batch,
                rhs: comp_batch.to_vec(),
            }
            .into());
        }
        if !covers(&self.batch_shape, cat_batch) {
            return Err(BroadcastError::Incompatible {
                lhs: self.batch_shape.clone(),
                rhs: cat_batch.to_vec(),
            }
            .into());
        }

        let picks = self.cat.sample(n, rng);
        let shape =
            shapes::full_shape(&[n], &self.batch_shape, self.event_shape());

        let mut data: Vec<f64> = Vec::with_capacity(shape.iter().product());
        for s in 0..n {
            for ix in indices(IxDyn(&self.batch_shape)) {
                let ix = ix.slice();

                let mut cat_ix = vec![s];
                cat_ix.extend(broadcast_index(ix, cat_batch));
                let k = picks[cat_ix.as_slice()];

                let mut comp_ix = vec![k];
                comp_ix.extend_from_slice(ix);
                let comp_ix = broadcast_index(&comp_ix, comp_batch);

                data.extend(self.components.draw_event(&comp_ix, rng));
            }
        }

        let values = ArrayD::from_shape_vec(IxDyn(&shape), data)
            .map_err(DistError::from)?;
        Ok(MixtureDraw {
            indices: picks,
            values,
        })
    }

    /// The mixture's own realization, with shape
    /// `sample_shape + batch_shape + event_shape`
    pub fn value(&self) -> Result<ArrayD<f64>, MixtureError> {
        select_component(
            &self.components_value,
            &self.align_indices(self.cat.value()),
            self.num_components,
            self.batch_rank(),
            self.event_shape().len(),
        )
        .map_err(MixtureError::from)
    }

    /// The realization as a draw: like `value`, with a leading axis of
    /// length one when the sample shape is empty
    pub fn realized_sample(&self) -> Result<ArrayD<f64>, MixtureError> {
        let value = self.value()?;
        if self.config.sample_shape.is_empty() {
            Ok(value.insert_axis(Axis(0)))
        } else {
            Ok(value)
        }
    }

    pub fn moments(&self) -> Result<&Moments, MixtureError> {
        self.moments.get().map_err(MixtureError::from)
    }

    /// The outcome of the moment computation done at construction
    pub fn moments_state(&self) -> &MomentCache {
        &self.moments
    }

    pub fn mean(&self) -> Result<&ArrayD<f64>, MixtureError> {
        self.moments().map(|m| &m.mean)
    }

    pub fn variance(&self) -> Result<&ArrayD<f64>, MixtureError> {
        self.moments().map(|m| &m.variance)
    }

    pub fn stddev(&self) -> Result<&ArrayD<f64>, MixtureError> {
        self.moments().map(|m| &m.stddev)
    }
}
