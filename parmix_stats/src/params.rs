use indexmap::IndexMap;
use ndarray::{ArrayD, IxDyn};
use parmix_utils::broadcast_shapes;

use crate::FamilyError;

/// Per-component parameters, keyed by name.
///
/// The leading axis of every array indexes the component it parameterizes.
pub type ComponentParams = IndexMap<String, ArrayD<f64>>;

/// Settings shared by a mixture with the distributions it builds
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistConfig {
    /// Shape of the realization drawn when the distribution is built
    pub sample_shape: Vec<usize>,
    /// Check parameter values and names
    pub validate_args: bool,
    /// Report NaN statistics instead of refusing to compute them
    pub allow_nan_stats: bool,
}

/// Pull the parameters named by `names` out of `params` and broadcast them to
/// a common shape.
///
/// Returns the common shape and the broadcast arrays in the order of `names`.
/// Names `params` holds but `names` does not list are rejected only when
/// validating.
pub(crate) fn gather<const N: usize>(
    family: &'static str,
    params: &ComponentParams,
    names: [&str; N],
    config: &DistConfig,
) -> Result<(Vec<usize>, [ArrayD<f64>; N]), FamilyError> {
    if config.validate_args {
        if let Some(name) = params.keys().find(|k| !names.contains(&k.as_str()))
        {
            return Err(FamilyError::UnknownParameter {
                family,
                name: name.clone(),
            });
        }
    }

    let arrays = names
        .iter()
        .map(|&name| {
            let arr = params.get(name).ok_or_else(|| {
                FamilyError::MissingParameter {
                    family,
                    name: name.to_owned(),
                }
            })?;
            if config.validate_args && arr.ndim() == 0 {
                Err(FamilyError::NoComponentAxis {
                    family,
                    name: name.to_owned(),
                })
            } else {
                Ok(arr)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let shape_err = || FamilyError::ParameterShapes {
        family,
        shapes: names
            .iter()
            .zip(arrays.iter())
            .map(|(name, arr)| ((*name).to_owned(), arr.shape().to_vec()))
            .collect(),
    };

    let shape = arrays
        .iter()
        .try_fold(Vec::new(), |acc, arr| broadcast_shapes(&acc, arr.shape()))
        .ok_or_else(shape_err)?;

    let broadcast = arrays
        .iter()
        .map(|arr| {
            arr.broadcast(IxDyn(&shape))
                .map(|view| view.to_owned())
                .ok_or_else(shape_err)
        })
        .collect::<Result<Vec<_>, _>>()?
        .try_into()
        .map_err(|_| shape_err())?;

    Ok((shape, broadcast))
}

/// Check every entry of `arr` against `valid` when validating
pub(crate) fn check_values<F>(
    family: &'static str,
    name: &str,
    arr: &ArrayD<f64>,
    config: &DistConfig,
    valid: F,
) -> Result<(), FamilyError>
where
    F: Fn(f64) -> bool,
{
    if !config.validate_args {
        return Ok(());
    }
    match arr.iter().find(|&&x| !valid(x)) {
        Some(&value) => Err(FamilyError::InvalidParameter {
            family,
            name: name.to_owned(),
            value,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    fn validating() -> DistConfig {
        DistConfig {
            validate_args: true,
            ..Default::default()
        }
    }

    #[test]
    fn gather_broadcasts_to_common_shape() {
        let mut params = ComponentParams::new();
        params.insert("loc".into(), arr2(&[[0.0, 1.0], [2.0, 3.0]]).into_dyn());
        params.insert("scale".into(), arr2(&[[1.0], [2.0]]).into_dyn());

        let (shape, arrays) =
            gather("Gaussian", &params, ["loc", "scale"], &validating())
                .unwrap();

        assert_eq!(shape, vec![2, 2]);
        assert_eq!(arrays[1], arr2(&[[1.0, 1.0], [2.0, 2.0]]).into_dyn());
    }

    #[test]
    fn missing_parameter_is_always_an_error() {
        let mut params = ComponentParams::new();
        params.insert("loc".into(), arr1(&[0.0, 1.0]).into_dyn());

        let err = gather(
            "Gaussian",
            &params,
            ["loc", "scale"],
            &DistConfig::default(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            FamilyError::MissingParameter {
                family: "Gaussian",
                name: "scale".into()
            }
        );
    }

    #[test]
    fn unknown_parameter_only_rejected_when_validating() {
        let mut params = ComponentParams::new();
        params.insert("p".into(), arr1(&[0.2, 0.8]).into_dyn());
        params.insert("mu".into(), arr1(&[0.0, 1.0]).into_dyn());

        assert!(gather("Bernoulli", &params, ["p"], &DistConfig::default())
            .is_ok());
        assert_eq!(
            gather("Bernoulli", &params, ["p"], &validating()).unwrap_err(),
            FamilyError::UnknownParameter {
                family: "Bernoulli",
                name: "mu".into()
            }
        );
    }

    #[test]
    fn incompatible_parameter_shapes() {
        let mut params = ComponentParams::new();
        params.insert("loc".into(), arr1(&[0.0, 1.0, 2.0]).into_dyn());
        params.insert("scale".into(), arr1(&[1.0, 1.0]).into_dyn());

        let err = gather(
            "Gaussian",
            &params,
            ["loc", "scale"],
            &DistConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FamilyError::ParameterShapes { .. }));
    }

    #[test]
    fn check_values_skipped_without_validation() {
        let arr = arr1(&[1.0, -1.0]).into_dyn();
        let positive = |s: f64| s > 0.0;
        assert!(check_values(
            "Gaussian",
            "scale",
            &arr,
            &DistConfig::default(),
            positive
        )
        .is_ok());
        assert_eq!(
            check_values("Gaussian", "scale", &arr, &validating(), positive),
            Err(FamilyError::InvalidParameter {
                family: "Gaussian",
                name: "scale".into(),
                value: -1.0
            })
        );
    }
}
