use parmix_stats::{DistError, FamilyError};
use parmix_utils::BroadcastError;
use thiserror::Error;

use crate::mixture::MomentsUnavailable;

/// Errors from building or evaluating a `ParamMixture`
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MixtureError {
    /// A parameter the family does not recognize, or one with no component
    /// axis. Raised only when validating.
    #[error("invalid argument: {0}")]
    InvalidArgumentType(String),
    /// The mixing weights and component parameters disagree on shape
    #[error(
        "mixing weights of shape {weights:?} do not fit component batch \
        shape {components:?}: {reason}"
    )]
    ShapeMismatch {
        weights: Vec<usize>,
        components: Vec<usize>,
        reason: String,
    },
    /// The number of components cannot be read off the last axis of the
    /// mixing weights
    #[error(
        "cannot determine the number of components from weights of shape \
        {shape:?}"
    )]
    UndeterminedComponentCount { shape: Vec<usize> },
    #[error(transparent)]
    MomentsUnavailable(#[from] MomentsUnavailable),
    #[error("failed to build the mixture: {0}")]
    Family(FamilyError),
    #[error(transparent)]
    Dist(#[from] DistError),
    #[error(transparent)]
    Broadcast(#[from] BroadcastError),
}

impl From<FamilyError> for MixtureError {
    fn from(err: FamilyError) -> Self {
        match err {
            FamilyError::UnknownParameter { .. }
            | FamilyError::NoComponentAxis { .. } => {
                MixtureError::InvalidArgumentType(err.to_string())
            }
            err => MixtureError::Family(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_parameters_are_invalid_arguments() {
        let err = MixtureError::from(FamilyError::UnknownParameter {
            family: "Gaussian",
            name: "mu".into(),
        });
        assert_eq!(
            err,
            MixtureError::InvalidArgumentType(
                "Gaussian does not take a parameter named `mu`".into()
            )
        );

        let err = MixtureError::from(FamilyError::NoComponentAxis {
            family: "Poisson",
            name: "rate".into(),
        });
        assert!(matches!(err, MixtureError::InvalidArgumentType(_)));
    }

    #[test]
    fn other_family_errors_pass_through() {
        let inner = FamilyError::MissingParameter {
            family: "Gaussian",
            name: "scale".into(),
        };
        assert_eq!(
            MixtureError::from(inner.clone()),
            MixtureError::Family(inner)
        );
    }
}
