use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dist::{
    BernoulliEnsemble, CauchyEnsemble, Component, ComponentDistribution,
    GaussianEnsemble, MvNormalDiagEnsemble, PoissonEnsemble,
};
use crate::{ComponentParams, DistConfig, FamilyError};

/// Builds a component ensemble from named per-component parameters
pub trait ComponentFactory {
    type Dist: ComponentDistribution;

    fn construct(
        &self,
        params: &ComponentParams,
        config: &DistConfig,
    ) -> Result<Self::Dist, FamilyError>;
}

/// The built-in component families
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Gaussian,
    Bernoulli,
    Poisson,
    Cauchy,
    MvNormalDiag,
}

impl Family {
    /// The parameter names the family expects
    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            Family::Gaussian => &GaussianEnsemble::PARAMS,
            Family::Bernoulli => &BernoulliEnsemble::PARAMS,
            Family::Poisson => &PoissonEnsemble::PARAMS,
            Family::Cauchy => &CauchyEnsemble::PARAMS,
            Family::MvNormalDiag => &MvNormalDiagEnsemble::PARAMS,
        }
    }
}

impl ComponentFactory for Family {
    type Dist = Component;

    fn construct(
        &self,
        params: &ComponentParams,
        config: &DistConfig,
    ) -> Result<Component, FamilyError> {
        match self {
            Family::Gaussian => {
                GaussianEnsemble::new(params, config).map(Component::from)
            }
            Family::Bernoulli => {
                BernoulliEnsemble::new(params, config).map(Component::from)
            }
            Family::Poisson => {
                PoissonEnsemble::new(params, config).map(Component::from)
            }
            Family::Cauchy => {
                CauchyEnsemble::new(params, config).map(Component::from)
            }
            Family::MvNormalDiag => {
                MvNormalDiagEnsemble::new(params, config).map(Component::from)
            }
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Family::Gaussian => "gaussian",
            Family::Bernoulli => "bernoulli",
            Family::Poisson => "poisson",
            Family::Cauchy => "cauchy",
            Family::MvNormalDiag => "mv_normal_diag",
        };
        write!(f, "{s}")
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown component family `{0}`")]
pub struct ParseFamilyError(pub String);

impl FromStr for Family {
    type Err = ParseFamilyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gaussian" | "normal" => Ok(Family::Gaussian),
            "bernoulli" => Ok(Family::Bernoulli),
            "poisson" => Ok(Family::Poisson),
            "cauchy" => Ok(Family::Cauchy),
            "mv_normal_diag" | "mvnormaldiag" => Ok(Family::MvNormalDiag),
            _ => Err(ParseFamilyError(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn parse_family_names() {
        assert_eq!("Gaussian".parse::<Family>(), Ok(Family::Gaussian));
        assert_eq!("normal".parse::<Family>(), Ok(Family::Gaussian));
        assert_eq!(
            "mv_normal_diag".parse::<Family>(),
            Ok(Family::MvNormalDiag)
        );
        assert!("dirichlet".parse::<Family>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for family in [
            Family::Gaussian,
            Family::Bernoulli,
            Family::Poisson,
            Family::Cauchy,
            Family::MvNormalDiag,
        ] {
            assert_eq!(family.to_string().parse::<Family>(), Ok(family));
        }
    }

    #[test]
    fn construct_dispatches_to_family() {
        let mut params = ComponentParams::new();
        params.insert("rate".into(), arr1(&[1.0, 4.0]).into_dyn());
        let component = Family::Poisson
            .construct(&params, &DistConfig::default())
            .unwrap();

        assert!(matches!(component, Component::Poisson(_)));
        assert_eq!(component.batch_shape(), &[2]);
        assert_eq!(component.family_name(), "Poisson");
    }

    #[test]
    fn construct_reports_missing_parameter() {
        let mut params = ComponentParams::new();
        params.insert("loc".into(), arr1(&[0.0]).into_dyn());
        let err = Family::Gaussian
            .construct(&params, &DistConfig::default())
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
    fn param_names() {
        assert_eq!(Family::Gaussian.param_names(), &["loc", "scale"]);
        assert_eq!(Family::Bernoulli.param_names(), &["probs"]);
    }
}
