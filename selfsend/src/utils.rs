// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::common::{TxHash, U256};
use crate::error::{Error, Result};
use crate::{CustomNetwork, Network};
use alloy::primitives::utils::format_units as alloy_format_units;
use std::env;

/// Built-in network identifier, name or chain id.
pub const EVM_NETWORK: &str = "EVM_NETWORK";
/// Overrides the RPC endpoint, or defines a custom network together with [`CHAIN_ID`].
pub const RPC_URL: &str = "RPC_URL";
pub const CHAIN_ID: &str = "CHAIN_ID";

/// Get the `Network` from environment variables.
pub fn get_network_from_env() -> Result<Network> {
    network_from_vars(
        env::var(EVM_NETWORK).ok(),
        env::var(RPC_URL).ok(),
        env::var(CHAIN_ID).ok(),
    )
}

fn network_from_vars(
    evm_network: Option<String>,
    rpc_url: Option<String>,
    chain_id: Option<String>,
) -> Result<Network> {
    match (evm_network, rpc_url, chain_id) {
        (Some(identifier), rpc_url, _) => {
            let network = Network::from_identifier(&identifier)?;
            info!("Using {network} as {EVM_NETWORK} is set to {identifier:?}");
            match rpc_url {
                Some(rpc_url) => network.with_rpc_url(&rpc_url),
                None => Ok(network),
            }
        }
        (None, Some(rpc_url), Some(chain_id)) => {
            let chain_id = chain_id.trim().parse::<u64>().map_err(|err| {
                Error::InvalidConfiguration(format!("Invalid {CHAIN_ID} {chain_id:?}: {err}"))
            })?;
            info!("Using custom network from environment variables");
            Ok(Network::Custom(CustomNetwork::new(&rpc_url, chain_id)?))
        }
        _ => {
            error!("Failed to obtain network from environment");
            Err(Error::InvalidConfiguration(format!(
                "set {EVM_NETWORK}, or both {RPC_URL} and {CHAIN_ID}"
            )))
        }
    }
}

/// Base units rendered with `decimals` fractional digits, trailing zeros removed.
pub fn format_units(amount: U256, decimals: u8) -> String {
    match alloy_format_units(amount, decimals) {
        Ok(formatted) if formatted.contains('.') => formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string(),
        Ok(formatted) => formatted,
        Err(_) => amount.to_string(),
    }
}

/// `0x123456...abcdef`
pub fn short_tx_hash(tx_hash: &TxHash) -> String {
    let full = tx_hash.to_string();
    format!("{}...{}", &full[..8], &full[full.len() - 6..])
}
