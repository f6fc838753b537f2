//! Reconcile content records against their mint transactions

use std::str::FromStr;
use std::sync::Arc;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::Address;
use anyhow::Result;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::Task;
use crate::domain::abi::{AbiDecoder, AbiError, DecodedCall};
use crate::domain::records::{ContentFilter, ContentRecord};
use crate::infrastructure::ethereum::{EthClient, RpcError, Transport};
use crate::store::RecordStore;

/// Why a decoded transaction does not prove a record's mint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MintMismatch {
    #[error("called {found} instead of {expected}")]
    WrongFunction { expected: String, found: String },

    #[error("unexpected argument layout {0}")]
    UnexpectedArguments(String),

    #[error("recipient {found} is not the owner {expected}")]
    WrongRecipient { expected: Address, found: Address },

    #[error("metadata `{found}` does not match stored `{expected}`")]
    WrongMetadata { expected: String, found: String },

    #[error("record has no metadata reference")]
    MissingMetadata,

    #[error("owner address `{0}` is not a valid address")]
    InvalidOwner(String),
}

/// A verification attempt that left the record unchanged
#[derive(Debug, Error)]
pub enum Rejection {
    #[error("no transaction hash stored")]
    NoTransaction,

    #[error("transaction lookup failed: {0}")]
    Lookup(RpcError),

    #[error("input not decodable: {0}")]
    Decode(#[from] AbiError),

    #[error("{0}")]
    Mismatch(#[from] MintMismatch),
}

/// Result of verifying a single record
#[derive(Debug)]
pub enum Verdict {
    Confirmed,
    Rejected(Rejection),
}

/// Check that `call` mints `record`'s metadata to its owner.
///
/// The mint function takes the recipient first and the metadata reference
/// second.
pub fn check_mint(
    call: &DecodedCall,
    record: &ContentRecord,
    mint_function: &str,
) -> Result<(), MintMismatch> {
    if call.name != mint_function {
        return Err(MintMismatch::WrongFunction {
            expected: mint_function.to_string(),
            found: call.name.clone(),
        });
    }

    let (recipient, metadata) = match call.arguments.as_slice() {
        [recipient, metadata, ..] => (&recipient.value, &metadata.value),
        _ => return Err(MintMismatch::UnexpectedArguments(call.signature.clone())),
    };
    let (DynSolValue::Address(recipient), DynSolValue::String(metadata)) = (recipient, metadata)
    else {
        return Err(MintMismatch::UnexpectedArguments(call.signature.clone()));
    };

    let owner = Address::from_str(record.owner_address.trim())
        .map_err(|_| MintMismatch::InvalidOwner(record.owner_address.clone()))?;
    if *recipient != owner {
        return Err(MintMismatch::WrongRecipient {
            expected: owner,
            found: *recipient,
        });
    }

    let expected = record
        .metadata_ref
        .as_deref()
        .ok_or(MintMismatch::MissingMetadata)?;
    if metadata != expected {
        return Err(MintMismatch::WrongMetadata {
            expected: expected.to_string(),
            found: metadata.clone(),
        });
    }

    Ok(())
}

/// Confirms records whose transaction mints their metadata to their owner
pub struct VerifyContentTask<T> {
    records: Arc<dyn RecordStore<ContentRecord>>,
    client: Arc<EthClient<T>>,
    decoder: Arc<dyn AbiDecoder>,
    mint_function: String,
}

impl<T: Transport> VerifyContentTask<T> {
    pub fn new(
        records: Arc<dyn RecordStore<ContentRecord>>,
        client: Arc<EthClient<T>>,
        decoder: Arc<dyn AbiDecoder>,
        mint_function: impl Into<String>,
    ) -> Self {
        Self {
            records,
            client,
            decoder,
            mint_function: mint_function.into(),
        }
    }

    /// Verify one record, confirming it in place on success.
    ///
    /// Only failures reaching the node are returned as errors; everything
    /// else is a [`Verdict::Rejected`] and leaves the record as it was.
    pub async fn verify(&self, record: &mut ContentRecord) -> Result<Verdict, RpcError> {
        let Some(tx_hash) = record.tx_hash.clone() else {
            return Ok(Verdict::Rejected(Rejection::NoTransaction));
        };

        let mut tx = match self.client.get_transaction(&tx_hash, None).await {
            Ok(tx) => tx,
            Err(err) if err.is_transport() => return Err(err),
            Err(err) => return Ok(Verdict::Rejected(Rejection::Lookup(err))),
        };

        let call = match tx.decode_input(self.decoder.as_ref()) {
            Ok(call) => call,
            Err(err) => return Ok(Verdict::Rejected(err.into())),
        };
        debug!(record = record.id, call = %call.summary(), "decoded mint transaction");

        if let Err(mismatch) = check_mint(call, record, &self.mint_function) {
            return Ok(Verdict::Rejected(mismatch.into()));
        }

        record.confirm();
        Ok(Verdict::Confirmed)
    }
}

#[async_trait::async_trait]
impl<T: Transport> Task for VerifyContentTask<T> {
    fn name(&self) -> &'static str {
        "verify_content"
    }

    async fn run(&self) -> Result<()> {
        let pending = self
            .records
            .get_by_filter(&ContentFilter::AwaitingConfirmation)
            .await?;
        let total = pending.len();
        let mut confirmed = 0;

        for mut record in pending {
            match self.verify(&mut record).await? {
                Verdict::Confirmed => {
                    self.records.save(&record).await?;
                    confirmed += 1;
                    info!(
                        record = record.id,
                        tx_hash = record.tx_hash.as_deref().unwrap_or_default(),
                        "content confirmed"
                    );
                }
                Verdict::Rejected(reason) => {
                    warn!(
                        record = record.id,
                        tx_hash = record.tx_hash.as_deref().unwrap_or_default(),
                        "not confirmed: {reason}"
                    );
                }
            }
        }

        info!("confirmed {confirmed} of {total}");
        Ok(())
    }
}
