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
//! Component families and the categorical selector used to build
//! parameterized mixtures.
pub mod categorical;
pub mod dist;
mod error;
mod family;
mod params;

pub use rv;

pub use categorical::CategoricalSelector;
pub use dist::{Component, ComponentDistribution, DType};
pub use error::{DistError, FamilyError};
pub use family::{ComponentFactory, Family, ParseFamilyError};
pub use params::{ComponentParams, DistConfig};
