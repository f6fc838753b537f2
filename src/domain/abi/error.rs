//! ABI decoding errors

use thiserror::Error;

/// Errors raised while indexing an interface or decoding calldata against it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    /// The first 4 bytes of the calldata match no function in the interface
    #[error("unknown function selector 0x{}", hex::encode(.0))]
    UnknownSelector([u8; 4]),

    /// The argument section does not match the parameter layout
    #[error("failed to decode arguments: {0}")]
    ArgumentDecode(String),

    /// Constructor decoding was requested but the interface has no constructor
    #[error("interface defines no constructor")]
    NoConstructor,

    /// The constructor heuristic cannot synthesize a placeholder for this type
    #[error("cannot detect constructor arguments: unsupported type `{0}`")]
    UnsupportedType(String),

    /// A descriptor is malformed (missing name, unparseable type, ...)
    #[error("invalid interface descriptor: {0}")]
    InvalidDescriptor(String),
}
