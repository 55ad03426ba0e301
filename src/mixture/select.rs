use ndarray::ArrayD;
use parmix_utils::{one_hot, pad_trailing, sum_axis, zip_with, BroadcastError};

/// Pick, at every position, the slice of `values` along the component axis
/// named by `indices`.
///
/// `values` has shape `lead + [depth] + batch + event` and `indices` has
/// shape `lead' + batch'`, where the primed shapes broadcast against the
/// unprimed ones. The component axis of `values` sits in front of the last
/// `batch_rank + event_rank` axes. The result drops that axis.
///
/// Unselected entries are skipped rather than multiplied by zero so that
/// infinite values in other components do not turn the result into NaN.
pub fn select_component(
    values: &ArrayD<f64>,
    indices: &ArrayD<usize>,
    depth: usize,
    batch_rank: usize,
    event_rank: usize,
) -> Result<ArrayD<f64>, BroadcastError> {
    if indices.ndim() < batch_rank {
        return Err(BroadcastError::AxisOutOfBounds {
            axis: -(batch_rank as isize),
            ndim: indices.ndim(),
        });
    }

    let mask = one_hot(indices, depth, indices.ndim() - batch_rank)?;
    let mask = pad_trailing(mask, indices.ndim() + 1 + event_rank);

    let picked =
        zip_with(values, &mask, |v, m| if m == 0.0 { 0.0 } else { v * m })?;

    let axis = picked.ndim() - 1 - batch_rank - event_rank;
    sum_axis(&picked, axis)
}
