//! Shape algebra and broadcasting helpers for dynamic-rank arrays
use ndarray::{ArrayD, Axis, Dimension, IxDyn, Zip};
use thiserror::Error;

use crate::logsumexp;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BroadcastError {
    /// The two shapes do not broadcast against each other
    #[error("shapes {lhs:?} and {rhs:?} cannot be broadcast together")]
    Incompatible { lhs: Vec<usize>, rhs: Vec<usize> },
    #[error("axis {axis} is out of bounds for an array of rank {ndim}")]
    AxisOutOfBounds { axis: isize, ndim: usize },
    #[error("index {index} is out of bounds for depth {depth}")]
    IndexOutOfBounds { index: usize, depth: usize },
}

/// The shape two arrays broadcast to, or `None` if they do not broadcast.
///
/// Shapes are aligned on their trailing axes. Paired dimensions must be equal
/// or one of them must be 1.
///
/// # Example
///
/// ```
/// # use parmix_utils::broadcast_shapes;
/// assert_eq!(broadcast_shapes(&[3, 1, 2], &[4, 1]), Some(vec![3, 4, 2]));
/// assert_eq!(broadcast_shapes(&[3], &[4]), None);
/// ```
pub fn broadcast_shapes(lhs: &[usize], rhs: &[usize]) -> Option<Vec<usize>> {
    let ndim = lhs.len().max(rhs.len());
    let mut shape = vec![0; ndim];
    for (i, dim) in shape.iter_mut().enumerate() {
        let a = dim_from_right(lhs, ndim - 1 - i);
        let b = dim_from_right(rhs, ndim - 1 - i);
        *dim = match (a, b) {
            (a, b) if a == b => a,
            (1, b) => b,
            (a, 1) => a,
            _ => return None,
        };
    }
    Some(shape)
}

#[inline]
fn dim_from_right(shape: &[usize], offset: usize) -> usize {
    if offset < shape.len() {
        shape[shape.len() - 1 - offset]
    } else {
        1
    }
}

/// Whether two shapes have the same rank and every pair of dimensions is
/// equal or contains a 1.
pub fn is_compatible(lhs: &[usize], rhs: &[usize]) -> bool {
    lhs.len() == rhs.len()
        && lhs.iter().zip(rhs.iter()).all(|(&a, &b)| a == b || a == 1 || b == 1)
}

/// Maps an index into a broadcast result back onto an operand of `shape`.
///
/// Leading axes the operand does not have are dropped and size-1 axes are
/// pinned to zero.
/// `ix` must have at least as many axes as `shape`.
pub fn broadcast_index(ix: &[usize], shape: &[usize]) -> Vec<usize> {
    let offset = ix.len() - shape.len();
    shape
        .iter()
        .zip(ix[offset..].iter())
        .map(|(&dim, &i)| if dim == 1 { 0 } else { i })
        .collect()
}

/// Row-major linear offset of `ix` in an array of `shape`
pub fn ravel_index(ix: &[usize], shape: &[usize]) -> usize {
    ix.iter()
        .zip(shape.iter())
        .fold(0, |acc, (&i, &dim)| acc * dim + i)
}

/// Resolve a possibly negative `axis` against an array of rank `ndim`.
///
/// Negative axes count from the end, so `-1` is the last axis.
pub fn normalize_axis(
    axis: isize,
    ndim: usize,
) -> Result<usize, BroadcastError> {
    let resolved = if axis < 0 { ndim as isize + axis } else { axis };
    if resolved < 0 || resolved as usize >= ndim {
        Err(BroadcastError::AxisOutOfBounds { axis, ndim })
    } else {
        Ok(resolved as usize)
    }
}

/// Insert a size-1 axis.
///
/// Negative positions are resolved against the rank of the output, so `-1`
/// appends a trailing axis and `-(k + 1)` puts the new axis directly in front
/// of the last `k` axes.
pub fn expand_dims<A>(
    arr: ArrayD<A>,
    axis: isize,
) -> Result<ArrayD<A>, BroadcastError> {
    let ix = normalize_axis(axis, arr.ndim() + 1)?;
    Ok(arr.insert_axis(Axis(ix)))
}

/// Append trailing size-1 axes until `arr` has rank `ndim`
pub fn pad_trailing<A>(mut arr: ArrayD<A>, ndim: usize) -> ArrayD<A> {
    while arr.ndim() < ndim {
        let last = arr.ndim();
        arr = arr.insert_axis(Axis(last));
    }
    arr
}

/// One-hot encode `indices` along a new axis of length `depth` at `axis`.
///
/// The output has the shape of `indices` with `depth` inserted at `axis`. It
/// is 1 where the position along `axis` equals the index and 0 elsewhere.
pub fn one_hot(
    indices: &ArrayD<usize>,
    depth: usize,
    axis: usize,
) -> Result<ArrayD<f64>, BroadcastError> {
    if axis > indices.ndim() {
        return Err(BroadcastError::AxisOutOfBounds {
            axis: axis as isize,
            ndim: indices.ndim() + 1,
        });
    }

    let mut shape = indices.shape().to_vec();
    shape.insert(axis, depth);

    let mut out = ArrayD::<f64>::zeros(IxDyn(&shape));
    for (ix, &index) in indices.indexed_iter() {
        if index >= depth {
            return Err(BroadcastError::IndexOutOfBounds { index, depth });
        }
        let mut dst = ix.slice().to_vec();
        dst.insert(axis, index);
        out[dst.as_slice()] = 1.0;
    }
    Ok(out)
}

/// Apply `f` elementwise over `lhs` and `rhs` broadcast against each other
pub fn zip_with<F>(
    lhs: &ArrayD<f64>,
    rhs: &ArrayD<f64>,
    f: F,
) -> Result<ArrayD<f64>, BroadcastError>
where
    F: Fn(f64, f64) -> f64,
{
    let incompatible = || BroadcastError::Incompatible {
        lhs: lhs.shape().to_vec(),
        rhs: rhs.shape().to_vec(),
    };
    let shape =
        broadcast_shapes(lhs.shape(), rhs.shape()).ok_or_else(incompatible)?;
    let lhs_b = lhs.broadcast(IxDyn(&shape)).ok_or_else(incompatible)?;
    let rhs_b = rhs.broadcast(IxDyn(&shape)).ok_or_else(incompatible)?;

    Ok(Zip::from(&lhs_b).and(&rhs_b).map_collect(|&a, &b| f(a, b)))
}

/// `log(sum(exp(arr)))` along `axis`, removing that axis
pub fn logsumexp_axis(
    arr: &ArrayD<f64>,
    axis: usize,
) -> Result<ArrayD<f64>, BroadcastError> {
    if axis >= arr.ndim() {
        return Err(BroadcastError::AxisOutOfBounds {
            axis: axis as isize,
            ndim: arr.ndim(),
        });
    }
    Ok(arr.map_axis(Axis(axis), |lane| logsumexp(&lane.to_vec())))
}

/// Sum along `axis`, removing that axis
pub fn sum_axis(
    arr: &ArrayD<f64>,
    axis: usize,
) -> Result<ArrayD<f64>, BroadcastError> {
    if axis >= arr.ndim() {
        return Err(BroadcastError::AxisOutOfBounds {
            axis: axis as isize,
            ndim: arr.ndim(),
        });
    }
    Ok(arr.sum_axis(Axis(axis)))
}
