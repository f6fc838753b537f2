//! Interface indexer - resolves descriptors into selector-addressed signatures

use alloy_dyn_abi::DynSolType;
use alloy_primitives::keccak256;
use tracing::warn;

use crate::domain::abi::{
    AbiError, ConstructorSignature, ContractInterface, DescriptorKind, FunctionSignature,
    InterfaceIndex, Param, ParamSpec,
};

/// Builds an [`InterfaceIndex`] from a contract interface
pub struct InterfaceIndexer;

impl InterfaceIndexer {
    /// Index every function by selector and pick up the constructor.
    ///
    /// Fails on the first malformed descriptor instead of skipping it.
    pub fn build(interface: &ContractInterface) -> Result<InterfaceIndex, AbiError> {
        let mut index = InterfaceIndex::new();

        for descriptor in &interface.descriptors {
            match descriptor.kind {
                DescriptorKind::Function => {
                    let name = descriptor
                        .name
                        .as_deref()
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .ok_or_else(|| {
                            AbiError::InvalidDescriptor("function descriptor without a name".into())
                        })?;

                    let inputs = Self::resolve_params(&descriptor.inputs)?;
                    let signature = Self::signature(name, &inputs);
                    let selector = Self::compute_selector(&signature);

                    let replaced = index.insert(FunctionSignature {
                        selector,
                        name: name.to_string(),
                        signature,
                        inputs,
                    });
                    if let Some(previous) = replaced {
                        warn!(
                            selector = %previous.selector_hex(),
                            replaced = %previous.signature,
                            "selector collision, keeping the later function"
                        );
                    }
                }
                DescriptorKind::Constructor => {
                    if index.constructor().is_some() {
                        return Err(AbiError::InvalidDescriptor(
                            "interface declares more than one constructor".into(),
                        ));
                    }
                    let inputs = Self::resolve_params(&descriptor.inputs)?;
                    index.set_constructor(ConstructorSignature { inputs });
                }
                DescriptorKind::Other => {}
            }
        }

        Ok(index)
    }

    /// Expand and parse parameter types in declaration order
    fn resolve_params(params: &[Param]) -> Result<Vec<ParamSpec>, AbiError> {
        params
            .iter()
            .map(|param| {
                let expanded = param.canonical_type()?;
                let ty = DynSolType::parse(&expanded).map_err(|err| {
                    AbiError::InvalidDescriptor(format!(
                        "parameter `{}` has unparseable type `{}`: {}",
                        param.name, expanded, err
                    ))
                })?;
                Ok(ParamSpec {
                    name: param.name.clone(),
                    kind: ty.sol_type_name().into_owned(),
                    ty,
                })
            })
            .collect()
    }

    /// `name(type,type,...)` over canonical types
    pub(crate) fn signature(name: &str, inputs: &[ParamSpec]) -> String {
        let types: Vec<&str> = inputs.iter().map(|p| p.kind.as_str()).collect();
        format!("{}({})", name, types.join(","))
    }

    /// Compute the 4-byte function selector from a signature
    pub fn compute_selector(signature: &str) -> [u8; 4] {
        let hash = keccak256(signature.as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }
}
