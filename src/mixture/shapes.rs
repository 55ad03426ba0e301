//! Shape bookkeeping between the mixing weights and the component ensemble
use parmix_utils::{broadcast_shapes, is_compatible};

use crate::MixtureError;

/// The number of components, read off the last axis of the weights
pub fn num_components(weights_shape: &[usize]) -> Result<usize, MixtureError> {
    match weights_shape.last() {
        Some(&k) if k > 0 => Ok(k),
        _ => Err(MixtureError::UndeterminedComponentCount {
            shape: weights_shape.to_vec(),
        }),
    }
}

/// Check that weights of shape `weights` fit components whose batch shape is
/// `components`.
///
/// The last weight axis must match the leading component axis and the
/// remaining axes must have equal rank with every pair of dimensions equal or
/// one of them 1.
pub fn validate(
    weights: &[usize],
    components: &[usize],
) -> Result<(), MixtureError> {
    let mismatch = |reason: String| MixtureError::ShapeMismatch {
        weights: weights.to_vec(),
        components: components.to_vec(),
        reason,
    };

    let (k, weights_batch) = match weights.split_last() {
        Some((&k, batch)) => (k, batch),
        None => {
            return Err(MixtureError::UndeterminedComponentCount {
                shape: weights.to_vec(),
            })
        }
    };

    let (c0, components_batch) = components.split_first().ok_or_else(|| {
        mismatch(String::from("components have no component axis"))
    })?;

    if k != *c0 {
        return Err(mismatch(format!(
            "{k} mixing weights but {c0} components"
        )));
    }

    if !is_compatible(weights_batch, components_batch) {
        return Err(mismatch(format!(
            "weight batch shape {weights_batch:?} is not compatible with \
            component batch shape {components_batch:?}"
        )));
    }

    Ok(())
}

/// The batch shape of the mixture.
///
/// This is the categorical batch shape broadcast against the component batch
/// shape without its component axis. Shapes that do not broadcast, which can
/// only get here without validation, fall back to the categorical batch.
pub fn mixture_batch_shape(
    cat_batch: &[usize],
    components_batch: &[usize],
) -> Vec<usize> {
    components_batch
        .split_first()
        .and_then(|(_, rest)| broadcast_shapes(cat_batch, rest))
        .unwrap_or_else(|| cat_batch.to_vec())
}

/// `sample_shape + batch_shape + event_shape` as a single shape
pub fn full_shape(
    sample_shape: &[usize],
    batch_shape: &[usize],
    event_shape: &[usize],
) -> Vec<usize> {
    let mut shape = sample_shape.to_vec();
    shape.extend_from_slice(batch_shape);
    shape.extend_from_slice(event_shape);
    shape
}
