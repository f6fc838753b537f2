//! Interface index - function signatures by selector plus the constructor

use std::collections::HashMap;

use alloy_dyn_abi::DynSolType;

/// A resolved parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// Parameter name (may be empty)
    pub name: String,
    /// Canonical Solidity type (e.g., "address", "(uint256,address)[]")
    pub kind: String,
    /// Parsed type used for decoding
    pub ty: DynSolType,
}

/// A function signature with its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    /// 4-byte function selector
    pub selector: [u8; 4],
    /// Function name
    pub name: String,
    /// Full canonical signature (e.g., "transfer(address,uint256)")
    pub signature: String,
    /// Input parameters in declaration order
    pub inputs: Vec<ParamSpec>,
}

impl FunctionSignature {
    /// Get selector as hex string
    pub fn selector_hex(&self) -> String {
        format!("0x{}", hex::encode(self.selector))
    }
}

/// The constructor of an interface
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorSignature {
    pub inputs: Vec<ParamSpec>,
}

/// Functions of one contract interface indexed by selector
#[derive(Debug, Default, Clone)]
pub struct InterfaceIndex {
    functions: HashMap<[u8; 4], FunctionSignature>,
    constructor: Option<ConstructorSignature>,
}

impl InterfaceIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a function signature
    ///
    /// Note: a later function with the same selector replaces the earlier one
    pub fn insert(&mut self, function: FunctionSignature) -> Option<FunctionSignature> {
        self.functions.insert(function.selector, function)
    }

    pub fn set_constructor(&mut self, constructor: ConstructorSignature) {
        self.constructor = Some(constructor);
    }

    pub fn constructor(&self) -> Option<&ConstructorSignature> {
        self.constructor.as_ref()
    }

    /// Look up a function by selector
    pub fn lookup(&self, selector: [u8; 4]) -> Option<&FunctionSignature> {
        self.functions.get(&selector)
    }

    /// Get the number of indexed functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if the index has no functions
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
