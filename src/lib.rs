#![warn(unused_extern_crates)]
#![warn(
    clippy::all,
    clippy::imprecise_flops,
    clippy::suboptimal_flops,
    clippy::unseparated_literal_suffix,
    clippy::unreadable_literal,
    clippy::option_option,
    clippy::implicit_clone
)]
//! Parameterized mixture distributions.
//!
//! A mixture is a categorical "which component" variable composed with a
//! batch of components from one family, each with its own parameters.
//!
//! # Example
//!
//! ```
//! use parmix::prelude::*;
//! use ndarray::arr1;
//!
//! let mut params = ComponentParams::new();
//! params.insert("loc".into(), arr1(&[-2.0, 2.0]).into_dyn());
//! params.insert("scale".into(), arr1(&[1.0, 0.5]).into_dyn());
//!
//! let mixture = MixtureBuilder::new(
//!     arr1(&[0.4, 0.6]).into_dyn(),
//!     params,
//!     Family::Gaussian,
//! )
//! .with_config(MixtureConfig::new().with_validate_args(true))
//! .with_seed(1337)
//! .build()
//! .unwrap();
//!
//! assert_eq!(mixture.num_components(), 2);
//! assert!(mixture.batch_shape().is_empty());
//!
//! let xs = mixture.sample_seeded(10, 1337).unwrap();
//! assert_eq!(xs.shape(), &[10]);
//!
//! let logp = mixture.marginal_log_prob(&xs).unwrap();
//! assert!(logp.iter().all(|lp| lp.is_finite()));
//! ```
mod builder;
mod config;
pub mod def;
mod error;
pub mod mixture;
pub mod prelude;

pub use builder::MixtureBuilder;
pub use config::{MixtureConfig, SampleStrategy, DEFAULT_NAME};
pub use def::{DefError, MixtureDef, NestedArray};
pub use error::MixtureError;
pub use mixture::{
    MomentCache, Moments, MomentsUnavailable, MixtureDraw, ParamMixture,
};

pub use parmix_stats as stats;
pub use parmix_utils as utils;
