//! Local signer adapter.
//!
//! The domain crates never see key material. This module loads a key for the
//! CLI's `--sign` paths, signs digests the builders computed, and hands the
//! signature back for verification.
//!
//! Security notes:
//! - Key bytes are held in `Zeroizing` buffers until parsed into the signer.
//! - Keys are loaded once per invocation.
//! - Never log private key material.

use std::path::PathBuf;

use alloy::primitives::{Address, PrimitiveSignature, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer as AlloySigner;
use alloy::sol_types::Eip712Domain;
use settle_channel::{ChannelState, SignedChannelState};
use settle_order::{BuiltOrder, SignedOrder};
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{AppError, AppResult};

/// Environment variable read by `--sign`.
pub const SIGNING_KEY_ENV: &str = "SETTLE_SIGNING_KEY";

/// Where `--sign` reads the private key from.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Environment variable holding a hex key.
    EnvVar { var_name: String },
    /// File holding a hex key (recommend 0600 permissions).
    File { path: PathBuf },
}

impl Default for KeySource {
    fn default() -> Self {
        Self::EnvVar {
            var_name: SIGNING_KEY_ENV.to_string(),
        }
    }
}

/// Failures loading the local signing key.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Signing key variable {0} is not set")]
    EnvVarNotFound(String),

    #[error("Signing key is not hex: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("Signing key rejected: {0}")]
    InvalidKey(String),

    #[error("Signing key controls {actual}, but the maker is {expected}")]
    AddressMismatch { expected: Address, actual: Address },

    #[error("Failed to read key file: {0}")]
    Io(#[from] std::io::Error),
}

/// Holds one signing key.
pub struct KeyManager {
    signer: PrivateKeySigner,
}

impl KeyManager {
    /// Load a key and optionally check the address it controls.
    ///
    /// # Errors
    /// Returns `KeyError` if the variable or file is missing, the hex is
    /// malformed, the key is invalid, or the derived address differs from
    /// `expected_address`.
    pub fn load(source: &KeySource, expected_address: Option<Address>) -> Result<Self, KeyError> {
        let secret_bytes: Zeroizing<Vec<u8>> = match source {
            KeySource::EnvVar { var_name } => {
                let raw = Zeroizing::new(
                    std::env::var(var_name)
                        .map_err(|_| KeyError::EnvVarNotFound(var_name.clone()))?,
                );
                parse_hex_key(&raw)?
            }
            KeySource::File { path } => {
                let raw = Zeroizing::new(std::fs::read_to_string(path)?);
                parse_hex_key(&raw)?
            }
        };

        Self::from_bytes(&secret_bytes, expected_address)
    }

    /// Build from raw key bytes.
    pub fn from_bytes(secret_bytes: &[u8], expected_address: Option<Address>) -> Result<Self, KeyError> {
        let signer = PrivateKeySigner::from_slice(secret_bytes)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;

        if let Some(expected) = expected_address {
            if signer.address() != expected {
                return Err(KeyError::AddressMismatch {
                    expected,
                    actual: signer.address(),
                });
            }
        }

        debug!(address = %signer.address(), "Signing key loaded");
        Ok(Self { signer })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

/// Parse a hex key (supports `0x` prefix and surrounding whitespace).
fn parse_hex_key(hex_str: &str) -> Result<Zeroizing<Vec<u8>>, KeyError> {
    let trimmed = hex_str.trim().trim_start_matches("0x");
    Ok(Zeroizing::new(hex::decode(trimmed)?))
}

/// Signs order and channel digests with a local key.
pub struct LocalSigner {
    keys: KeyManager,
}

impl LocalSigner {
    pub fn new(keys: KeyManager) -> Self {
        Self { keys }
    }

    pub fn address(&self) -> Address {
        self.keys.address()
    }

    /// Sign a raw 32-byte digest.
    pub async fn sign_digest(&self, digest: &B256) -> AppResult<PrimitiveSignature> {
        self.keys
            .signer()
            .sign_hash(digest)
            .await
            .map_err(|e| AppError::Signing(e.to_string()))
    }

    /// Sign a built order and verify the result against its maker and body.
    pub async fn sign_order(
        &self,
        built: BuiltOrder,
        domain: &Eip712Domain,
    ) -> AppResult<SignedOrder> {
        let signature = self.sign_digest(&built.order_hash).await?;
        Ok(SignedOrder::new(built, &signature, domain)?)
    }

    /// Sign a channel state hash.
    pub async fn sign_channel_state(
        &self,
        state: &ChannelState,
        domain: &Eip712Domain,
    ) -> AppResult<PrimitiveSignature> {
        self.sign_digest(&state.state_hash(domain)).await
    }
}

/// Co-sign a channel state with both participants' local signers.
pub async fn co_sign_channel_state(
    state: ChannelState,
    domain: &Eip712Domain,
    signers: [&LocalSigner; 2],
) -> AppResult<SignedChannelState> {
    let first = signers[0].sign_channel_state(&state, domain).await?;
    let second = signers[1].sign_channel_state(&state, domain).await?;
    Ok(SignedChannelState::new(state, [first, second]))
}
