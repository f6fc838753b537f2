//! ABI domain models and contracts
//!
//! This module defines the interface description, the selector index and
//! the decoding contract, independent of the underlying implementation
//! (alloy-dyn-abi).

mod decoder;
mod error;
mod interface;
mod registry;

pub use decoder::{format_dyn_sol_value, AbiDecoder, DecodedArg, DecodedCall};
pub use error::AbiError;
pub use interface::{ContractInterface, Descriptor, DescriptorKind, Param};
pub use registry::{ConstructorSignature, FunctionSignature, InterfaceIndex, ParamSpec};
