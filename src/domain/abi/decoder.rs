//! ABI decoder trait and types

use alloy_dyn_abi::DynSolValue;

use super::AbiError;

/// A decoded function argument
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedArg {
    /// Canonical Solidity type (e.g., "address", "uint256", "(uint256,address)")
    pub kind: String,
    /// Parameter name (or "arg{n}" if unnamed)
    pub name: String,
    /// Decoded value
    pub value: DynSolValue,
}

impl DecodedArg {
    /// Compact rendering of the value for log lines
    pub fn display_value(&self) -> String {
        format_dyn_sol_value(&self.value)
    }
}

/// Result of decoding a function or constructor call
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCall {
    /// Function name, or "constructor"
    pub name: String,
    /// Full canonical signature (e.g., "transfer(address,uint256)")
    pub signature: String,
    /// Decoded arguments in declaration order
    pub arguments: Vec<DecodedArg>,
}

impl DecodedCall {
    pub fn argument(&self, name: &str) -> Option<&DecodedArg> {
        self.arguments.iter().find(|arg| arg.name == name)
    }

    /// `name(arg=value, ...)` for diagnostics
    pub fn summary(&self) -> String {
        let args: Vec<String> = self
            .arguments
            .iter()
            .map(|arg| format!("{}={}", arg.name, arg.display_value()))
            .collect();
        format!("{}({})", self.name, args.join(", "))
    }
}

/// Trait for decoding calldata against one contract interface
///
/// This trait abstracts over the actual ABI decoding implementation,
/// allowing us to swap out alloy-dyn-abi for a different library if needed.
pub trait AbiDecoder: Send + Sync {
    /// Decode function calldata (including the 4-byte selector)
    ///
    /// # Returns
    /// * `Ok(DecodedCall)` - The decoded function call
    /// * `Err(AbiError::UnknownSelector)` - If no function matches the selector
    /// * `Err(AbiError::ArgumentDecode)` - If the arguments do not fit the layout
    fn decode_function(&self, calldata: &[u8]) -> Result<DecodedCall, AbiError>;

    /// Decode the constructor arguments of a deployment payload
    ///
    /// # Arguments
    /// * `calldata` - Creation bytecode followed by the encoded arguments
    /// * `bytecode` - The creation bytecode, when known. Without it the
    ///   argument section is detected heuristically.
    fn decode_constructor(
        &self,
        calldata: &[u8],
        bytecode: Option<&[u8]>,
    ) -> Result<DecodedCall, AbiError>;
}

/// Format a DynSolValue for display
pub fn format_dyn_sol_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => {
            let s = u.to_string();
            // For very large numbers, show hex instead
            if s.len() > 20 {
                format!("0x{:x}", u)
            } else {
                s
            }
        }
        DynSolValue::FixedBytes(word, size) => {
            let bytes = &word.as_slice()[..(*size).min(32)];
            format!("0x{}", hex::encode(bytes))
        }
        DynSolValue::Address(addr) => format!("{:?}", addr),
        DynSolValue::Function(func) => format!("0x{}", hex::encode(func.as_slice())),
        DynSolValue::Bytes(bytes) => {
            if bytes.len() <= 32 {
                format!("0x{}", hex::encode(bytes))
            } else {
                format!("0x{}… ({} bytes)", hex::encode(&bytes[..32]), bytes.len())
            }
        }
        DynSolValue::String(s) => {
            let chars = s.chars().count();
            if chars <= 64 {
                format!("\"{}\"", s)
            } else {
                let head: String = s.chars().take(64).collect();
                format!("\"{}…\" ({} chars)", head, chars)
            }
        }
        DynSolValue::Array(arr) | DynSolValue::FixedArray(arr) => {
            let max_items = 10;
            let items: Vec<String> = arr
                .iter()
                .take(max_items)
                .map(format_dyn_sol_value)
                .collect();
            if arr.len() > max_items {
                format!("[{}, …] ({} items)", items.join(", "), arr.len())
            } else {
                format!("[{}]", items.join(", "))
            }
        }
        DynSolValue::Tuple(fields) => {
            let items: Vec<String> = fields.iter().map(format_dyn_sol_value).collect();
            format!("({})", items.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};

    #[test]
    fn test_format_truncates_long_values() {
        let long = "a".repeat(100);
        let rendered = format_dyn_sol_value(&DynSolValue::String(long));
        assert!(rendered.ends_with("(100 chars)"));

        let items = (0..12u64)
            .map(|n| DynSolValue::Uint(U256::from(n), 256))
            .collect();
        let rendered = format_dyn_sol_value(&DynSolValue::Array(items));
        assert!(rendered.ends_with("(12 items)"));
    }

    #[test]
    fn test_summary_lists_arguments_in_order() {
        let call = DecodedCall {
            name: "mintNFT".into(),
            signature: "mintNFT(address,string)".into(),
            arguments: vec![
                DecodedArg {
                    kind: "address".into(),
                    name: "recipient".into(),
                    value: DynSolValue::Address(Address::ZERO),
                },
                DecodedArg {
                    kind: "string".into(),
                    name: "tokenURI".into(),
                    value: DynSolValue::String("ipfs://cid".into()),
                },
            ],
        };

        assert_eq!(
            call.summary(),
            "mintNFT(recipient=0x0000000000000000000000000000000000000000, tokenURI=\"ipfs://cid\")"
        );
        assert!(call.argument("tokenURI").is_some());
        assert!(call.argument("missing").is_none());
    }
}
