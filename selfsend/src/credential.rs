// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::common::{Address, EthereumWallet};
use crate::error::{Error, Result};
use alloy::signers::local::coins_bip39::English;
use alloy::signers::local::{MnemonicBuilder, PrivateKeySigner};
use std::fmt;

const PRIVATE_KEY_HEX_LEN: usize = 64;

/// A signing key and the account it controls. The secret never leaves process memory and
/// is redacted from `Debug` output.
#[derive(Clone)]
pub struct Credential {
    signer: PrivateKeySigner,
}

impl Credential {
    /// Accepts 64 hex digits with an optional `0x` prefix.
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let trimmed = private_key.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if digits.len() != PRIVATE_KEY_HEX_LEN || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidCredential(format!(
                "expected {PRIVATE_KEY_HEX_LEN} hex characters, got {}",
                digits.len()
            )));
        }
        let signer = digits.parse::<PrivateKeySigner>().map_err(|err| {
            error!("Error parsing private key: {err}");
            Error::InvalidCredential(err.to_string())
        })?;
        Ok(Self { signer })
    }

    /// Derives `count` keys along `m/44'/60'/0'/0/{index}`.
    pub fn from_mnemonic(phrase: &str, count: u32) -> Result<Vec<Self>> {
        (0..count)
            .map(|index| {
                let signer = MnemonicBuilder::<English>::default()
                    .phrase(phrase.trim())
                    .index(index)
                    .and_then(|builder| builder.build())
                    .map_err(|err| {
                        Error::InvalidCredential(format!("mnemonic derivation failed: {err}"))
                    })?;
                Ok(Self { signer })
            })
            .collect()
    }

    pub fn account(&self) -> Address {
        self.signer.address()
    }

    /// Redacted account reference, safe to log.
    pub fn account_ref(&self) -> String {
        short_address(&self.account())
    }

    pub fn wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("account", &self.account())
            .finish_non_exhaustive()
    }
}

/// Parses one private key per line. Blank lines and lines starting with `#` are ignored,
/// as are commas so a comma separated list is accepted too.
pub fn parse_private_keys(text: &str) -> Result<Vec<Credential>> {
    text.lines()
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .filter(|entry| !entry.is_empty() && !entry.starts_with('#'))
        .enumerate()
        .map(|(index, entry)| {
            Credential::from_private_key(entry).map_err(|err| match err {
                Error::InvalidCredential(reason) => {
                    Error::InvalidCredential(format!("key #{}: {reason}", index + 1))
                }
                other => other,
            })
        })
        .collect()
}

/// `0x1234...abcd`
pub fn short_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
