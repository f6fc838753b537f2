//! Contract interface descriptors and canonical type expansion
//!
//! An interface is the usual JSON ABI array. Only `function` and
//! `constructor` entries take part in decoding; events, errors, fallback and
//! receive entries are parsed and then ignored.

use serde::Deserialize;

use super::AbiError;

/// Kind tag of a descriptor (`"type"` in the JSON ABI)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorKind {
    /// Solidity omits `type` for functions in older ABI outputs
    #[default]
    Function,
    Constructor,
    #[serde(other)]
    Other,
}

/// A parameter declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Param {
    /// Parameter name (may be empty)
    #[serde(default)]
    pub name: String,
    /// Declared type, e.g. `uint256`, `tuple`, `tuple[]`
    #[serde(rename = "type")]
    pub ty: String,
    /// Component parameters for `tuple` types
    #[serde(default)]
    pub components: Vec<Param>,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            components: Vec::new(),
        }
    }

    pub fn tuple(name: impl Into<String>, ty: impl Into<String>, components: Vec<Param>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            components,
        }
    }

    /// Canonical type with every tuple expanded into `(a,b,...)` form.
    ///
    /// Array suffixes of a tuple type (`tuple[]`, `tuple[2][]`) are carried
    /// over verbatim after the expanded component list.
    pub fn canonical_type(&self) -> Result<String, AbiError> {
        let Some(suffix) = self.ty.strip_prefix("tuple") else {
            if !self.components.is_empty() {
                return Err(AbiError::InvalidDescriptor(format!(
                    "parameter `{}` of type `{}` has tuple components",
                    self.name, self.ty
                )));
            }
            return Ok(self.ty.clone());
        };

        if !is_array_suffix(suffix) {
            return Err(AbiError::InvalidDescriptor(format!(
                "parameter `{}` has malformed tuple type `{}`",
                self.name, self.ty
            )));
        }
        if self.components.is_empty() {
            return Err(AbiError::InvalidDescriptor(format!(
                "tuple parameter `{}` has no components",
                self.name
            )));
        }

        let inner = self
            .components
            .iter()
            .map(Param::canonical_type)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("({}){}", inner.join(","), suffix))
    }
}

/// A single interface entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Descriptor {
    #[serde(rename = "type", default)]
    pub kind: DescriptorKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<Param>,
}

impl Descriptor {
    pub fn function(name: impl Into<String>, inputs: Vec<Param>) -> Self {
        Self {
            kind: DescriptorKind::Function,
            name: Some(name.into()),
            inputs,
        }
    }

    pub fn constructor(inputs: Vec<Param>) -> Self {
        Self {
            kind: DescriptorKind::Constructor,
            name: None,
            inputs,
        }
    }
}

/// Ordered list of descriptors describing one contract
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ContractInterface {
    pub descriptors: Vec<Descriptor>,
}

impl ContractInterface {
    pub fn new(descriptors: Vec<Descriptor>) -> Self {
        Self { descriptors }
    }

    /// Parse a JSON ABI, either a bare array or an artifact with an `abi` field
    pub fn from_json(json: &str) -> Result<Self, AbiError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|err| AbiError::InvalidDescriptor(err.to_string()))?;

        let abi_value = match value {
            serde_json::Value::Object(mut artifact) => artifact
                .remove("abi")
                .ok_or_else(|| AbiError::InvalidDescriptor("artifact has no `abi` field".into()))?,
            other => other,
        };

        serde_json::from_value(abi_value).map_err(|err| AbiError::InvalidDescriptor(err.to_string()))
    }
}

/// `[]`, `[3]`, `[2][]`... or nothing
fn is_array_suffix(suffix: &str) -> bool {
    let mut rest = suffix;
    while !rest.is_empty() {
        let Some(inner) = rest.strip_prefix('[') else {
            return false;
        };
        let Some(close) = inner.find(']') else {
            return false;
        };
        if !inner[..close].chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        rest = &inner[close + 1..];
    }
    true
}
