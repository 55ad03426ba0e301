use log::{debug, info};
use ndarray::{ArrayD, IxDyn};
use parmix_stats::{
    CategoricalSelector, ComponentDistribution, ComponentFactory,
    ComponentParams, DistError,
};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

use crate::mixture::{shapes, MomentCache, ParamMixture};
use crate::{MixtureConfig, MixtureError};

/// Constructs `ParamMixture`s
#[derive(Clone, Debug)]
pub struct MixtureBuilder<F> {
    mixing_weights: ArrayD<f64>,
    component_params: ComponentParams,
    factory: F,
    config: MixtureConfig,
    cat_value: Option<ArrayD<usize>>,
    seed: Option<u64>,
}

impl<F: ComponentFactory> MixtureBuilder<F> {
    /// Create a builder for a mixture
    ///
    /// # Arguments
    /// - mixing_weights: weights of shape `batch_shape + [K]`
    /// - component_params: parameters whose leading axis indexes the
    ///   component
    /// - factory: builds the component ensemble from `component_params`
    pub fn new(
        mixing_weights: ArrayD<f64>,
        component_params: ComponentParams,
        factory: F,
    ) -> Self {
        MixtureBuilder {
            mixing_weights,
            component_params,
            factory,
            config: MixtureConfig::default(),
            cat_value: None,
            seed: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: MixtureConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a fixed categorical realization instead of drawing one.
    ///
    /// # Note:
    /// The shape of `value` is not checked until `build` is called. It must
    /// be `sample_shape + weights.shape[..-1]`.
    #[must_use]
    pub fn with_cat_value(mut self, value: ArrayD<usize>) -> Self {
        self.cat_value = Some(value);
        self
    }

    /// Set the RNG seed
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the RNG seed from another RNG
    #[must_use]
    pub fn seed_from_rng<R: rand::Rng>(mut self, rng: &mut R) -> Self {
        self.seed = Some(rng.next_u64());
        self
    }

    /// Build the mixture, drawing the realizations of the categorical and
    /// the components
    pub fn build(self) -> Result<ParamMixture<F::Dist>, MixtureError> {
        let mut rng = match self.seed {
            Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
            None => Xoshiro256Plus::from_entropy(),
        };

        let config = self.config;
        let dist_config = config.dist_config();

        let weights_shape = self.mixing_weights.shape().to_vec();
        let num_components = shapes::num_components(&weights_shape)?;

        let cat = match self.cat_value {
            Some(value) => CategoricalSelector::with_value(
                self.mixing_weights,
                value,
                &dist_config,
            )?,
            None => CategoricalSelector::new(
                self.mixing_weights,
                &dist_config,
                &mut rng,
            )?,
        };

        let components = self
            .factory
            .construct(&self.component_params, &dist_config)?;

        if config.validate_args {
            shapes::validate(&weights_shape, components.batch_shape())?;
        }

        let n_realized: usize = config.sample_shape.iter().product();
        let value_shape = shapes::full_shape(
            &config.sample_shape,
            components.batch_shape(),
            components.event_shape(),
        );
        let components_value = components
            .sample(n_realized, &mut rng)?
            .into_shape(IxDyn(&value_shape))
            .map_err(DistError::from)?;

        let batch_shape = shapes::mixture_batch_shape(
            cat.batch_shape(),
            components.batch_shape(),
        );

        let moments = MomentCache::compute(
            cat.probabilities(),
            &components,
            config.allow_nan_stats,
        );
        if let Err(reason) = moments.get() {
            debug!("{}: moments unavailable: {}", config.name, reason);
        }

        info!(
            "{}: {} {} components, batch shape {:?}, event shape {:?}",
            config.name,
            num_components,
            components.family_name(),
            batch_shape,
            components.event_shape()
        );

        Ok(ParamMixture {
            config,
            component_params: self.component_params,
            cat,
            components,
            components_value,
            num_components,
            batch_shape,
            moments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};
    use parmix_stats::{Family, FamilyError};

    fn gaussian_params(k: usize) -> ComponentParams {
        let mut params = ComponentParams::new();
        params.insert(
            "loc".into(),
            ArrayD::from_shape_fn(IxDyn(&[k]), |ix| ix[0] as f64),
        );
        params.insert("scale".into(), ArrayD::ones(IxDyn(&[k])));
        params
    }

    #[test]
    fn seeded_builds_are_reproducible() {
        let build = || {
            MixtureBuilder::new(
                arr1(&[0.3, 0.7]).into_dyn(),
                gaussian_params(2),
                Family::Gaussian,
            )
            .with_config(MixtureConfig::new().with_sample_shape(vec![4]))
            .with_seed(1337)
            .build()
            .unwrap()
        };
        let a = build();
        let b = build();
        assert_eq!(a.cat().value(), b.cat().value());
        assert_eq!(a.components_value(), b.components_value());
    }

    #[test]
    fn realizations_have_sample_shape_in_front() {
        let mixture = MixtureBuilder::new(
            arr2(&[[0.5, 0.5], [0.1, 0.9], [0.9, 0.1]]).into_dyn(),
            {
                let mut params = ComponentParams::new();
                params.insert("rate".into(), arr2(&[[1.0], [5.0]]).into_dyn());
                params
            },
            Family::Poisson,
        )
        .with_config(MixtureConfig::new().with_sample_shape(vec![2, 4]))
        .with_seed(7)
        .build()
        .unwrap();

        assert_eq!(mixture.cat().value().shape(), &[2, 4, 3]);
        assert_eq!(mixture.components_value().shape(), &[2, 4, 2, 1]);
        assert_eq!(mixture.batch_shape(), &[3]);
    }

    #[test]
    fn fixed_cat_value_is_used() {
        let mixture = MixtureBuilder::new(
            arr1(&[0.5, 0.5]).into_dyn(),
            gaussian_params(2),
            Family::Gaussian,
        )
        .with_config(MixtureConfig::new().with_sample_shape(vec![3]))
        .with_cat_value(arr1(&[1, 0, 1]).into_dyn())
        .with_seed(0)
        .build()
        .unwrap();
        assert_eq!(mixture.cat().value(), &arr1(&[1, 0, 1]).into_dyn());
    }

    #[test]
    fn fixed_cat_value_shape_is_checked() {
        let err = MixtureBuilder::new(
            arr1(&[0.5, 0.5]).into_dyn(),
            gaussian_params(2),
            Family::Gaussian,
        )
        .with_cat_value(arr1(&[1, 0, 1]).into_dyn())
        .build()
        .unwrap_err();
        assert_eq!(
            err,
            MixtureError::Family(FamilyError::ValueShape {
                expected: vec![],
                found: vec![3]
            })
        );
    }

    #[test]
    fn unknown_parameter_is_invalid_argument_when_validating() {
        let mut params = gaussian_params(2);
        params.insert("rate".into(), arr1(&[1.0, 1.0]).into_dyn());
        let builder = MixtureBuilder::new(
            arr1(&[0.5, 0.5]).into_dyn(),
            params,
            Family::Gaussian,
        )
        .with_seed(3);

        assert!(builder.clone().build().is_ok());
        let err = builder
            .with_config(MixtureConfig::new().with_validate_args(true))
            .build()
            .unwrap_err();
        assert!(matches!(err, MixtureError::InvalidArgumentType(_)));
    }

    #[test]
    fn scalar_weights_have_no_component_count() {
        let err = MixtureBuilder::new(
            ndarray::arr0(1.0).into_dyn(),
            gaussian_params(1),
            Family::Gaussian,
        )
        .build()
        .unwrap_err();
        assert_eq!(
            err,
            MixtureError::UndeterminedComponentCount { shape: vec![] }
        );
    }
}
