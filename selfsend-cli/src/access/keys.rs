// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use color_eyre::eyre::{eyre, Context, Result};
use color_eyre::Section;
use selfsend::credential::parse_private_keys;
use selfsend::Credential;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::Path;

/// Comma or newline separated private keys.
pub const PRIVATE_KEYS_ENV: &str = "SELFSEND_PRIVATE_KEYS";

/// Loads the batch credentials from, in order of preference, a key file, a mnemonic or the
/// `SELFSEND_PRIVATE_KEYS` env var.
pub fn load_credentials(
    keys_file: Option<&Path>,
    mnemonic: Option<&str>,
    mnemonic_count: u32,
) -> Result<Vec<Credential>> {
    credentials_from_sources(
        keys_file,
        mnemonic,
        mnemonic_count,
        env::var(PRIVATE_KEYS_ENV).ok(),
    )
}

fn credentials_from_sources(
    keys_file: Option<&Path>,
    mnemonic: Option<&str>,
    mnemonic_count: u32,
    env_keys: Option<String>,
) -> Result<Vec<Credential>> {
    let credentials = if let Some(path) = keys_file {
        let text = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read keys file {path:?}"))?;
        parse_private_keys(&text)
            .wrap_err_with(|| format!("Invalid private key in {path:?}"))
            .with_suggestion(|| "put one hex encoded private key per line, lines starting with # are ignored")?
    } else if let Some(phrase) = mnemonic {
        if mnemonic_count == 0 {
            return Err(eyre!("Mnemonic account count must be at least 1"));
        }
        Credential::from_mnemonic(phrase, mnemonic_count)
            .wrap_err("Failed to derive accounts from mnemonic")
            .with_suggestion(|| "the mnemonic should be a BIP-39 English phrase of 12 or 24 words")?
    } else if let Some(keys) = env_keys {
        parse_private_keys(&keys)
            .wrap_err_with(|| format!("Invalid private key in {PRIVATE_KEYS_ENV}"))?
    } else {
        return Err(eyre!("No private keys supplied"))
            .with_suggestion(|| "pass --keys-file or --mnemonic")
            .with_suggestion(|| format!("or set the {PRIVATE_KEYS_ENV} env var"));
    };

    if credentials.is_empty() {
        return Err(eyre!("The supplied key source contains no private keys"));
    }

    let mut seen = HashSet::new();
    let before = credentials.len();
    let credentials: Vec<Credential> = credentials
        .into_iter()
        .filter(|credential| seen.insert(credential.account()))
        .collect();
    if credentials.len() < before {
        warn!(
            "Ignoring {} duplicate private keys",
            before - credentials.len()
        );
    }
    info!("Loaded {} accounts", credentials.len());
    Ok(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const KEY_0: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const KEY_1: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    #[test]
    fn keys_file_takes_precedence() -> eyre::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "# batch 1\n{KEY_0}\n{KEY_1}\n{KEY_0}")?;

        let credentials = credentials_from_sources(
            Some(file.path()),
            Some("test test test test test test test test test test test junk"),
            5,
            Some(KEY_0.to_string()),
        )
        .map_err(|err| eyre::eyre!("{err}"))?;
        // duplicate collapsed
        assert_eq!(credentials.len(), 2);
        Ok(())
    }

    #[test]
    fn mnemonic_then_env() {
        let from_mnemonic = credentials_from_sources(
            None,
            Some("test test test test test test test test test test test junk"),
            3,
            None,
        )
        .expect("derived");
        assert_eq!(from_mnemonic.len(), 3);

        let from_env =
            credentials_from_sources(None, None, 1, Some(format!("{KEY_0},{KEY_1}")))
                .expect("parsed");
        assert_eq!(from_env.len(), 2);
    }

    #[test]
    fn missing_or_empty_sources_fail() -> eyre::Result<()> {
        assert!(credentials_from_sources(None, None, 1, None).is_err());

        let file = tempfile::NamedTempFile::new()?;
        assert!(credentials_from_sources(Some(file.path()), None, 1, None).is_err());

        assert!(credentials_from_sources(None, Some("not a phrase"), 1, None).is_err());
        Ok(())
    }
}
