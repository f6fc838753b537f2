//! Transaction type and hex field parsing

use std::str::FromStr;

use alloy_primitives::{Address, Bytes, B256};
use serde_json::Value;

use crate::domain::abi::{AbiDecoder, AbiError, DecodedCall};
use crate::infrastructure::ethereum::RpcError;

/// A mined (or pending) transaction fetched by hash
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub hash: B256,
    /// `None` while the transaction is still pending
    pub block_hash: Option<B256>,
    pub block_number: Option<u64>,
    pub from: Address,
    /// `None` for contract creation
    pub to: Option<Address>,
    pub gas: u64,
    pub gas_price: Option<u128>,
    pub nonce: u64,
    pub raw_input: Bytes,
    /// Decoded input, set only by a successful decode
    input: Option<DecodedCall>,
}

impl Transaction {
    /// Parse an `eth_getTransactionByHash` result object
    pub fn from_json(json: &Value) -> Result<Self, RpcError> {
        Ok(Self {
            hash: parse_b256(required_str(json, "hash")?)?,
            block_hash: optional_str(json, "blockHash").map(parse_b256).transpose()?,
            block_number: optional_str(json, "blockNumber")
                .map(parse_hex_u64)
                .transpose()?,
            from: parse_address(required_str(json, "from")?)?,
            to: optional_str(json, "to").map(parse_address).transpose()?,
            gas: parse_hex_u64(required_str(json, "gas")?)?,
            gas_price: optional_str(json, "gasPrice")
                .map(parse_hex_u128)
                .transpose()?,
            nonce: parse_hex_u64(required_str(json, "nonce")?)?,
            raw_input: parse_bytes(required_str(json, "input")?)?,
            input: None,
        })
    }

    /// Decoded input, if a decode was attempted and succeeded
    pub fn input(&self) -> Option<&DecodedCall> {
        self.input.as_ref()
    }

    /// Decode `raw_input` with `decoder`.
    ///
    /// On failure the previously decoded input (if any) is left untouched.
    pub fn decode_input(&mut self, decoder: &dyn AbiDecoder) -> Result<&DecodedCall, AbiError> {
        let decoded = decoder.decode_function(&self.raw_input)?;
        Ok(self.input.insert(decoded))
    }
}

fn required_str<'a>(json: &'a Value, field: &str) -> Result<&'a str, RpcError> {
    json.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::Decode(format!("transaction field `{field}` missing")))
}

fn optional_str<'a>(json: &'a Value, field: &str) -> Option<&'a str> {
    json.get(field).and_then(Value::as_str)
}

fn strip_hex(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Parse hex string to u64
pub fn parse_hex_u64(s: &str) -> Result<u64, RpcError> {
    u64::from_str_radix(strip_hex(s), 16)
        .map_err(|err| RpcError::Decode(format!("invalid hex quantity `{s}`: {err}")))
}

/// Parse hex string to u128
pub fn parse_hex_u128(s: &str) -> Result<u128, RpcError> {
    u128::from_str_radix(strip_hex(s), 16)
        .map_err(|err| RpcError::Decode(format!("invalid hex quantity `{s}`: {err}")))
}

fn parse_b256(s: &str) -> Result<B256, RpcError> {
    B256::from_str(s).map_err(|err| RpcError::Decode(format!("invalid hash `{s}`: {err}")))
}

fn parse_address(s: &str) -> Result<Address, RpcError> {
    Address::from_str(s).map_err(|err| RpcError::Decode(format!("invalid address `{s}`: {err}")))
}

fn parse_bytes(s: &str) -> Result<Bytes, RpcError> {
    hex::decode(strip_hex(s))
        .map(Bytes::from)
        .map_err(|err| RpcError::Decode(format!("invalid input data: {err}")))
}
