//! Common imports for building and using mixtures
pub use crate::{
    MixtureBuilder, MixtureConfig, MixtureDef, MixtureDraw, MixtureError,
    ParamMixture, SampleStrategy,
};
pub use parmix_stats::{
    CategoricalSelector, Component, ComponentDistribution, ComponentFactory,
    ComponentParams, Family,
};
