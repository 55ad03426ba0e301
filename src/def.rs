//! Mixtures described as data, loaded from YAML or JSON
use std::ffi::OsStr;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;
use ndarray::{ArrayD, ArrayViewD, IxDyn};
use parmix_stats::{ComponentParams, Family};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::{MixtureBuilder, MixtureConfig, MixtureError, ParamMixture};

/// An array written as nested lists, e.g. `[[0.5, 0.5], [0.1, 0.9]]`.
///
/// A bare number is a rank-0 array. `null` entries read as NaN.
#[derive(Clone, Debug, PartialEq)]
pub struct NestedArray(pub ArrayD<f64>);

impl NestedArray {
    pub fn into_inner(self) -> ArrayD<f64> {
        self.0
    }

    fn to_value(arr: ArrayViewD<f64>) -> Value {
        if arr.ndim() == 0 {
            arr.iter().next().map_or(Value::Null, |&x| Value::from(x))
        } else {
            Value::Array(arr.outer_iter().map(Self::to_value).collect())
        }
    }

    fn from_value(value: &Value) -> Result<ArrayD<f64>, String> {
        // the first element at every depth determines the shape
        let mut shape = Vec::new();
        let mut cursor = value;
        while let Value::Array(items) = cursor {
            shape.push(items.len());
            match items.first() {
                Some(first) => cursor = first,
                None => break,
            }
        }

        let mut data = Vec::with_capacity(shape.iter().product());
        flatten(value, &shape, &mut data)?;
        ArrayD::from_shape_vec(IxDyn(&shape), data).map_err(|e| e.to_string())
    }
}

fn flatten(
    value: &Value,
    shape: &[usize],
    data: &mut Vec<f64>,
) -> Result<(), String> {
    match (value, shape.split_first()) {
        (Value::Array(items), Some((&len, rest))) => {
            if items.len() != len {
                return Err(format!(
                    "ragged array: expected {len} items but found {}",
                    items.len()
                ));
            }
            items.iter().try_for_each(|item| flatten(item, rest, data))
        }
        (Value::Number(x), None) => {
            let x = x
                .as_f64()
                .ok_or_else(|| format!("{x} is not representable as f64"))?;
            data.push(x);
            Ok(())
        }
        (Value::Null, None) => {
            data.push(f64::NAN);
            Ok(())
        }
        (other, _) => Err(format!("unexpected array entry `{other}`")),
    }
}

impl Serialize for NestedArray {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        Self::to_value(self.0.view()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NestedArray {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .map(NestedArray)
            .map_err(serde::de::Error::custom)
    }
}

impl From<ArrayD<f64>> for NestedArray {
    fn from(arr: ArrayD<f64>) -> Self {
        NestedArray(arr)
    }
}

#[derive(Debug, Error)]
pub enum DefError {
    #[error("failed to read mixture definition: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid YAML mixture definition: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON mixture definition: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported definition file extension: {0:?}")]
    UnknownExtension(Option<String>),
}

/// A mixture as data.
///
/// # Example
///
/// ```
/// # use parmix::MixtureDef;
/// let def = MixtureDef::from_yaml_str(
///     "
/// weights: [0.3, 0.7]
/// family: gaussian
/// params:
///   loc: [-1.0, 1.0]
///   scale: [0.5, 0.5]
/// seed: 1337
/// ",
/// )
/// .unwrap();
///
/// let mixture = def.build().unwrap();
/// assert_eq!(mixture.num_components(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MixtureDef {
    pub weights: NestedArray,
    pub family: Family,
    pub params: IndexMap<String, NestedArray>,
    #[serde(default)]
    pub config: MixtureConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl MixtureDef {
    pub fn from_yaml_str(s: &str) -> Result<Self, DefError> {
        serde_yaml::from_str(s).map_err(DefError::from)
    }

    pub fn from_json_str(s: &str) -> Result<Self, DefError> {
        serde_json::from_str(s).map_err(DefError::from)
    }

    /// Read a definition from a `.yaml`, `.yml`, or `.json` file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DefError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_lowercase);

        let mut contents = String::new();
        match ext.as_deref() {
            Some("yaml" | "yml") => {
                File::open(path)?.read_to_string(&mut contents)?;
                Self::from_yaml_str(&contents)
            }
            Some("json") => {
                File::open(path)?.read_to_string(&mut contents)?;
                Self::from_json_str(&contents)
            }
            _ => Err(DefError::UnknownExtension(ext.clone())),
        }
    }

    pub fn component_params(&self) -> ComponentParams {
        self.params
            .iter()
            .map(|(name, arr)| (name.clone(), arr.0.clone()))
            .collect()
    }

    /// A builder configured by this definition
    pub fn builder(&self) -> MixtureBuilder<Family> {
        let builder = MixtureBuilder::new(
            self.weights.0.clone(),
            self.component_params(),
            self.family,
        )
        .with_config(self.config.clone());

        match self.seed {
            Some(seed) => builder.with_seed(seed),
            None => builder,
        }
    }

    pub fn build(&self) -> Result<ParamMixture, MixtureError> {
        self.builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn nested_array_from_json() {
        let arr: NestedArray =
            serde_json::from_str("[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]").unwrap();
        assert_eq!(
            arr.0,
            arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).into_dyn()
        );
    }

    #[test]
    fn nested_array_scalar_and_empty() {
        let arr: NestedArray = serde_json::from_str("2.5").unwrap();
        assert_eq!(arr.0.shape(), &[] as &[usize]);
        assert_eq!(arr.0.sum(), 2.5);

        let arr: NestedArray = serde_json::from_str("[]").unwrap();
        assert_eq!(arr.0.shape(), &[0]);
    }

    #[test]
    fn nested_array_rejects_ragged_lists() {
        let res: Result<NestedArray, _> =
            serde_json::from_str("[[1.0, 2.0], [3.0]]");
        assert!(res.is_err());

        let res: Result<NestedArray, _> = serde_json::from_str("[1.0, [2.0]]");
        assert!(res.is_err());
    }

    #[test]
    fn nested_array_writes_nested_lists() {
        let arr = NestedArray(arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn());
        assert_eq!(
            serde_json::to_string(&arr).unwrap(),
            "[[1.0,2.0],[3.0,4.0]]"
        );
    }

    #[test]
    fn nan_is_written_as_null_and_read_back() {
        let arr = NestedArray(arr1(&[f64::NAN, 1.0]).into_dyn());
        let s = serde_json::to_string(&arr).unwrap();
        assert_eq!(s, "[null,1.0]");
        let back: NestedArray = serde_json::from_str(&s).unwrap();
        assert!(back.0[[0]].is_nan());
    }

    #[test]
    fn definition_from_json() {
        let def = MixtureDef::from_json_str(
            r#"{
                "weights": [0.2, 0.8],
                "family": "poisson",
                "params": {"rate": [1.0, 10.0]},
                "config": {"validate_args": true}
            }"#,
        )
        .unwrap();

        assert_eq!(def.family, Family::Poisson);
        assert!(def.config.validate_args);
        assert_eq!(def.seed, None);

        let mixture = def.build().unwrap();
        assert_eq!(mixture.num_components(), 2);
        assert!(!mixture.is_continuous());
    }

    #[test]
    fn unknown_extension() {
        let err = MixtureDef::from_path("mixture.toml").unwrap_err();
        assert!(matches!(
            err,
            DefError::UnknownExtension(Some(ref ext)) if ext == "toml"
        ));
    }
}
