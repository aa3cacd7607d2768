use ethers::signers::coins_bip39::English;
use ethers::signers::{LocalWallet, MnemonicBuilder, Signer};
use ethers::types::Address;
use tracing::info;
use zeroize::Zeroize;

use crate::config::WalletConfig;
use crate::error::{Result, RouterError};

/// Wallet used to sign Hyperliquid actions
///
/// # Security
/// The secret is only held while the wallet is derived and is zeroized
/// right after.
#[derive(Clone)]
pub struct Wallet {
    inner: LocalWallet,
}

impl Wallet {
    /// Create a wallet from a private key hex string or a BIP-39 mnemonic.
    /// A secret containing whitespace is treated as a mnemonic.
    pub fn from_secret(secret: &str) -> Result<Self> {
        let secret = secret.trim();
        let wallet = if secret.split_whitespace().count() > 1 {
            MnemonicBuilder::<English>::default()
                .phrase(secret)
                .build()
                .map_err(|e| RouterError::Wallet(format!("Invalid mnemonic: {}", e)))?
        } else {
            let mut key_hex = secret.trim_start_matches("0x").to_string();
            let parsed = key_hex
                .parse::<LocalWallet>()
                .map_err(|e| RouterError::Wallet(format!("Invalid private key: {}", e)));
            key_hex.zeroize();
            parsed?
        };

        info!("Wallet initialized: {:?}", wallet.address());
        Ok(Self { inner: wallet })
    }

    /// Load the secret from the configured environment variable, falling back
    /// to the configured secret file.
    pub fn load(config: &WalletConfig) -> Result<Self> {
        let mut secret = match std::env::var(&config.secret_env) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => {
                let path = config.secret_file.as_deref().ok_or_else(|| {
                    RouterError::Wallet(format!(
                        "{} not set and no secret_file configured",
                        config.secret_env
                    ))
                })?;
                std::fs::read_to_string(path).map_err(|e| {
                    RouterError::Wallet(format!("Failed to read secret file {}: {}", path, e))
                })?
            }
        };

        let result = Self::from_secret(&secret);
        secret.zeroize();
        result
    }

    pub fn address(&self) -> Address {
        self.inner.address()
    }

    /// Underlying ethers wallet handed to the venue SDK
    pub fn inner(&self) -> &LocalWallet {
        &self.inner
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .finish()
    }
}
