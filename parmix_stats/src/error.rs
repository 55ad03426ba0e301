use parmix_utils::BroadcastError;
use thiserror::Error;

/// Errors raised while building a component ensemble or categorical selector
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FamilyError {
    #[error("{family} requires the parameter `{name}`")]
    MissingParameter { family: &'static str, name: String },
    #[error("{family} does not take a parameter named `{name}`")]
    UnknownParameter { family: &'static str, name: String },
    /// The parameter is a scalar, so it cannot index components
    #[error("parameter `{name}` of {family} has no component axis")]
    NoComponentAxis { family: &'static str, name: String },
    #[error("parameter `{name}` of {family} has no event axis")]
    NoEventAxis { family: &'static str, name: String },
    #[error(
        "parameter shapes of {family} cannot be broadcast together: \
        {shapes:?}"
    )]
    ParameterShapes {
        family: &'static str,
        shapes: Vec<(String, Vec<usize>)>,
    },
    #[error("invalid value {value} for parameter `{name}` of {family}")]
    InvalidParameter {
        family: &'static str,
        name: String,
        value: f64,
    },
    #[error("probabilities must have a category axis")]
    NoCategoryAxis,
    /// Sampling requires some positive, finite weight in every batch slice
    #[error(
        "mixing weights at batch position {position:?} have no positive \
        finite mass"
    )]
    InvalidWeights { position: Vec<usize> },
    #[error("categorical value has shape {found:?} but expected {expected:?}")]
    ValueShape {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error(
        "categorical value {index} is out of range for {n_cats} categories"
    )]
    ValueOutOfRange { index: usize, n_cats: usize },
}

/// Errors raised while evaluating or sampling a component ensemble
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DistError {
    /// The family does not define a conjugate log probability
    #[error("{family} has no conjugate log probability")]
    ConjugateUnsupported { family: &'static str },
    #[error(
        "observation of shape {found:?} does not end in the event shape \
        {event_shape:?}"
    )]
    EventShape {
        event_shape: Vec<usize>,
        found: Vec<usize>,
    },
    #[error(transparent)]
    Broadcast(#[from] BroadcastError),
    #[error("failed to assemble samples: {0}")]
    Shape(#[from] ndarray::ShapeError),
}
