use log::{error, info};
use parmix::{MixtureDef, MixtureError, NestedArray, ParamMixture};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use serde::Serialize;
use serde_json::json;

use crate::opt;

fn load(path: &std::path::Path) -> Option<MixtureDef> {
    match MixtureDef::from_path(path) {
        Ok(def) => Some(def),
        Err(err) => {
            error!("Could not load {}: {err}", path.display());
            None
        }
    }
}

fn build(def: &MixtureDef) -> Option<ParamMixture> {
    match def.build() {
        Ok(mixture) => Some(mixture),
        Err(err) => {
            error!("Failed to build mixture: {err}");
            None
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string(value) {
        Ok(s) => {
            println!("{s}");
            0
        }
        Err(err) => {
            error!("Failed to write output: {err}");
            1
        }
    }
}

pub fn sample(cmd: opt::SampleArgs) -> i32 {
    let mut def = match load(&cmd.def) {
        Some(def) => def,
        None => return 1,
    };
    if let Some(strategy) = cmd.strategy {
        def.config.sample_strategy = strategy;
    }
    let mixture = match build(&def) {
        Some(mixture) => mixture,
        None => return 1,
    };

    let seed = cmd.seed.or(def.seed);
    info!("drawing {} samples with seed {:?}", cmd.n, seed);

    let mut rng = match seed {
        Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
        None => Xoshiro256Plus::from_entropy(),
    };

    match mixture.draw(cmd.n, &mut rng) {
        Ok(draw) if cmd.with_indices => {
            let indices = draw.indices.mapv(|k| k as f64);
            print_json(&json!({
                "values": NestedArray(draw.values),
                "indices": NestedArray(indices),
            }))
        }
        Ok(draw) => print_json(&NestedArray(draw.values)),
        Err(err) => {
            error!("Sampling failed: {err}");
            1
        }
    }
}

pub fn moments(cmd: opt::MomentsArgs) -> i32 {
    let mixture = match load(&cmd.def).as_ref().and_then(build) {
        Some(mixture) => mixture,
        None => return 1,
    };

    match mixture.moments() {
        Ok(moments) => print_json(&json!({
            "mean": NestedArray(moments.mean.clone()),
            "variance": NestedArray(moments.variance.clone()),
            "stddev": NestedArray(moments.stddev.clone()),
        })),
        Err(MixtureError::MomentsUnavailable(reason)) => {
            error!("Moments unavailable: {reason}");
            1
        }
        Err(err) => {
            error!("{err}");
            1
        }
    }
}

pub fn logp(cmd: opt::LogpArgs) -> i32 {
    let mixture = match load(&cmd.def).as_ref().and_then(build) {
        Some(mixture) => mixture,
        None => return 1,
    };

    let res = if cmd.conditional {
        mixture.log_prob(&cmd.x.0)
    } else {
        mixture.marginal_log_prob(&cmd.x.0)
    };

    match res {
        Ok(logp) => print_json(&NestedArray(logp)),
        Err(err) => {
            error!("Failed to evaluate log probability: {err}");
            1
        }
    }
}
