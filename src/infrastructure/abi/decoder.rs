//! ABI decoder implementation using alloy-dyn-abi

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{Address, B256, I256, U256};

use crate::domain::abi::{
    AbiDecoder, AbiError, ContractInterface, DecodedArg, DecodedCall, InterfaceIndex, ParamSpec,
};
use crate::infrastructure::abi::InterfaceIndexer;

/// Decodes calldata against one contract interface
#[derive(Debug, Clone)]
pub struct InterfaceDecoder {
    index: InterfaceIndex,
}

impl InterfaceDecoder {
    /// Index the interface; malformed descriptors fail here
    pub fn new(interface: &ContractInterface) -> Result<Self, AbiError> {
        Ok(Self {
            index: InterfaceIndexer::build(interface)?,
        })
    }

    /// Get the underlying index
    pub fn index(&self) -> &InterfaceIndex {
        &self.index
    }
}

impl AbiDecoder for InterfaceDecoder {
    fn decode_function(&self, calldata: &[u8]) -> Result<DecodedCall, AbiError> {
        if calldata.len() < 4 {
            return Err(AbiError::ArgumentDecode(format!(
                "calldata too short ({} bytes, need at least 4 for selector)",
                calldata.len()
            )));
        }

        let (selector, args_data) = calldata.split_at(4);
        let selector: [u8; 4] = [selector[0], selector[1], selector[2], selector[3]];
        let function = self
            .index
            .lookup(selector)
            .ok_or(AbiError::UnknownSelector(selector))?;

        Ok(DecodedCall {
            name: function.name.clone(),
            signature: function.signature.clone(),
            arguments: decode_params(&function.inputs, args_data)?,
        })
    }

    fn decode_constructor(
        &self,
        calldata: &[u8],
        bytecode: Option<&[u8]>,
    ) -> Result<DecodedCall, AbiError> {
        let constructor = self.index.constructor().ok_or(AbiError::NoConstructor)?;

        let args_data = match bytecode {
            Some(code) => calldata.get(code.len()..).ok_or_else(|| {
                AbiError::ArgumentDecode(format!(
                    "calldata ({} bytes) is shorter than the bytecode ({} bytes)",
                    calldata.len(),
                    code.len()
                ))
            })?,
            None => detect_constructor_arguments(&constructor.inputs, calldata)?,
        };

        Ok(DecodedCall {
            name: "constructor".to_string(),
            signature: InterfaceIndexer::signature("constructor", &constructor.inputs),
            arguments: decode_params(&constructor.inputs, args_data)?,
        })
    }
}

/// Decode a head/tail encoded parameter list
fn decode_params(inputs: &[ParamSpec], args_data: &[u8]) -> Result<Vec<DecodedArg>, AbiError> {
    let decoded_values = if inputs.is_empty() {
        Vec::new()
    } else {
        let tuple_type = DynSolType::Tuple(inputs.iter().map(|p| p.ty.clone()).collect());
        let decoded = tuple_type
            .abi_decode_params(args_data)
            .map_err(|err| AbiError::ArgumentDecode(err.to_string()))?;
        check_sequence(inputs.iter().map(|p| &p.ty), args_data)?;

        match decoded {
            DynSolValue::Tuple(values) => values,
            other => vec![other],
        }
    };

    if decoded_values.len() != inputs.len() {
        return Err(AbiError::ArgumentDecode(format!(
            "decoded {} values for {} parameters",
            decoded_values.len(),
            inputs.len()
        )));
    }

    Ok(inputs
        .iter()
        .zip(decoded_values)
        .enumerate()
        .map(|(idx, (param, value))| {
            let name = if param.name.trim().is_empty() {
                format!("arg{}", idx)
            } else {
                param.name.clone()
            };

            DecodedArg {
                kind: param.kind.clone(),
                name,
                value,
            }
        })
        .collect())
}

/// Reject head words that are not the canonical encoding of their type.
///
/// The decoder masks out-of-range words (a `uint8` word of 256, a `bool` of
/// 2, an address with dirty high bytes), so the raw layout is walked again.
fn check_sequence<'t>(
    types: impl IntoIterator<Item = &'t DynSolType>,
    data: &[u8],
) -> Result<(), AbiError> {
    let mut head = 0;
    for ty in types {
        if ty.is_dynamic() {
            let offset = read_offset(data, head)?;
            let tail = data.get(offset..).ok_or_else(|| out_of_bounds(offset))?;
            check_dynamic(ty, tail)?;
            head += 32;
        } else {
            check_static(ty, data, head)?;
            head += 32 * head_words(ty);
        }
    }
    Ok(())
}

fn check_dynamic(ty: &DynSolType, data: &[u8]) -> Result<(), AbiError> {
    match ty {
        DynSolType::Array(inner) => {
            let len = read_offset(data, 0)?;
            check_sequence(std::iter::repeat(&**inner).take(len), &data[32..])
        }
        DynSolType::FixedArray(inner, len) => {
            check_sequence(std::iter::repeat(&**inner).take(*len), data)
        }
        DynSolType::Tuple(items) => check_sequence(items, data),
        _ => Ok(()),
    }
}

fn check_static(ty: &DynSolType, data: &[u8], at: usize) -> Result<(), AbiError> {
    let valid = match ty {
        DynSolType::FixedArray(inner, len) => {
            let stride = 32 * head_words(inner);
            return (0..*len).try_for_each(|i| check_static(inner, data, at + i * stride));
        }
        DynSolType::Tuple(items) => return check_sequence(items, data.get(at..).unwrap_or_default()),
        DynSolType::Bool => {
            let word = read_word(data, at)?;
            word[..31].iter().all(|b| *b == 0) && word[31] <= 1
        }
        DynSolType::Address => read_word(data, at)?[..12].iter().all(|b| *b == 0),
        DynSolType::Uint(bits) => {
            let pad = (256 - bits) / 8;
            read_word(data, at)?[..pad].iter().all(|b| *b == 0)
        }
        DynSolType::Int(bits) => {
            let word = read_word(data, at)?;
            let pad = (256 - bits) / 8;
            let fill = if word[pad] & 0x80 != 0 { 0xff } else { 0x00 };
            word[..pad].iter().all(|b| *b == fill)
        }
        DynSolType::FixedBytes(size) => read_word(data, at)?[*size..].iter().all(|b| *b == 0),
        _ => true,
    };

    if valid {
        Ok(())
    } else {
        Err(AbiError::ArgumentDecode(format!(
            "word at byte {at} is not a valid {}",
            ty.sol_type_name()
        )))
    }
}

/// Head size of a static type in words
fn head_words(ty: &DynSolType) -> usize {
    match ty {
        DynSolType::FixedArray(inner, len) => head_words(inner) * len,
        DynSolType::Tuple(items) => items.iter().map(head_words).sum(),
        _ => 1,
    }
}

fn read_word(data: &[u8], at: usize) -> Result<&[u8], AbiError> {
    data.get(at..at + 32).ok_or_else(|| out_of_bounds(at))
}

/// Offsets and lengths must fit a `usize`
fn read_offset(data: &[u8], at: usize) -> Result<usize, AbiError> {
    let word = read_word(data, at)?;
    if word[..24].iter().any(|b| *b != 0) {
        return Err(AbiError::ArgumentDecode(format!("offset at byte {at} out of range")));
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&word[24..]);
    usize::try_from(u64::from_be_bytes(low))
        .map_err(|_| AbiError::ArgumentDecode(format!("offset at byte {at} out of range")))
}

fn out_of_bounds(at: usize) -> AbiError {
    AbiError::ArgumentDecode(format!("calldata ends before byte {at}"))
}

/// Take the trailing argument section of a deployment payload.
///
/// Placeholder values are encoded to learn how many bytes the arguments
/// occupy. Dynamic values are assumed to fit one tail word, so only
/// strings/bytes up to 32 bytes are recovered exactly.
fn detect_constructor_arguments<'a>(
    inputs: &[ParamSpec],
    calldata: &'a [u8],
) -> Result<&'a [u8], AbiError> {
    let placeholders = inputs
        .iter()
        .map(|param| placeholder(&param.ty))
        .collect::<Result<Vec<_>, _>>()?;

    let expected_len = if placeholders.is_empty() {
        0
    } else {
        DynSolValue::Tuple(placeholders).abi_encode_params().len()
    };

    let start = calldata.len().checked_sub(expected_len).ok_or_else(|| {
        AbiError::ArgumentDecode(format!(
            "calldata ({} bytes) is shorter than the expected arguments ({} bytes)",
            calldata.len(),
            expected_len
        ))
    })?;
    Ok(&calldata[start..])
}

fn placeholder(ty: &DynSolType) -> Result<DynSolValue, AbiError> {
    let value = match ty {
        DynSolType::Bool => DynSolValue::Bool(false),
        DynSolType::Int(size) => DynSolValue::Int(I256::ZERO, *size),
        DynSolType::Uint(size) => DynSolValue::Uint(U256::ZERO, *size),
        DynSolType::Address => DynSolValue::Address(Address::ZERO),
        DynSolType::FixedBytes(size) => DynSolValue::FixedBytes(B256::ZERO, *size),
        DynSolType::String => DynSolValue::String("0".to_string()),
        DynSolType::Bytes => DynSolValue::Bytes(vec![0]),
        DynSolType::FixedArray(inner, len) => {
            let item = placeholder(inner)?;
            DynSolValue::FixedArray(vec![item; *len])
        }
        DynSolType::Tuple(items) => DynSolValue::Tuple(
            items
                .iter()
                .map(placeholder)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        other => return Err(AbiError::UnsupportedType(other.sol_type_name().into_owned())),
    };
    Ok(value)
}
