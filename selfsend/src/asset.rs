// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::common::Address;
use crate::connector::ChainConnector;
use crate::error::{Error, Result};
use crate::Network;
use alloy::primitives::address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a batch moves. Fixed for the whole batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetDescriptor {
    Native {
        symbol: String,
        decimals: u8,
    },
    Token {
        contract_address: Address,
        symbol: String,
        decimals: u8,
    },
}

impl AssetDescriptor {
    pub fn symbol(&self) -> &str {
        match self {
            AssetDescriptor::Native { symbol, .. } | AssetDescriptor::Token { symbol, .. } => {
                symbol
            }
        }
    }

    pub fn decimals(&self) -> u8 {
        match self {
            AssetDescriptor::Native { decimals, .. } | AssetDescriptor::Token { decimals, .. } => {
                *decimals
            }
        }
    }

    pub fn contract_address(&self) -> Option<Address> {
        match self {
            AssetDescriptor::Native { .. } => None,
            AssetDescriptor::Token {
                contract_address, ..
            } => Some(*contract_address),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, AssetDescriptor::Native { .. })
    }
}

impl fmt::Display for AssetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetDescriptor::Native { symbol, .. } => write!(f, "{symbol} (native)"),
            AssetDescriptor::Token {
                contract_address,
                symbol,
                ..
            } => write!(f, "{symbol} ({contract_address})"),
        }
    }
}

/// A well known ERC-20 token on one of the built-in networks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenInfo {
    pub address: Address,
    pub symbol: &'static str,
    pub name: &'static str,
    pub decimals: u8,
}

impl TokenInfo {
    const fn new(address: Address, symbol: &'static str, name: &'static str, decimals: u8) -> Self {
        Self {
            address,
            symbol,
            name,
            decimals,
        }
    }

    pub fn descriptor(&self) -> AssetDescriptor {
        AssetDescriptor::Token {
            contract_address: self.address,
            symbol: self.symbol.to_string(),
            decimals: self.decimals,
        }
    }
}

const ETHEREUM_TOKENS: [TokenInfo; 3] = [
    TokenInfo::new(address!("dAC17F958D2ee523a2206206994597C13D831ec7"), "USDT", "Tether USD", 6),
    TokenInfo::new(address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), "USDC", "USD Coin", 6),
    TokenInfo::new(address!("6B175474E89094C44Da98b954EedeAC495271d0F"), "DAI", "Dai Stablecoin", 18),
];

const BSC_TOKENS: [TokenInfo; 3] = [
    TokenInfo::new(address!("55d398326f99059fF775485246999027B3197955"), "USDT", "Tether USD", 18),
    TokenInfo::new(address!("8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d"), "USDC", "USD Coin", 18),
    TokenInfo::new(address!("1AF3F329e8BE154074D8769D1FFa4eE058B1DBc3"), "DAI", "Dai Stablecoin", 18),
];

const POLYGON_TOKENS: [TokenInfo; 3] = [
    TokenInfo::new(address!("c2132D05D31c914a87C6611C10748AEb04B58e8F"), "USDT", "Tether USD", 6),
    TokenInfo::new(address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174"), "USDC", "USD Coin", 6),
    TokenInfo::new(address!("8f3Cf7ad23Cd3CaDbD9735AFf958023239c6A063"), "DAI", "Dai Stablecoin", 18),
];

const AVALANCHE_TOKENS: [TokenInfo; 3] = [
    TokenInfo::new(address!("9702230A8Ea53601f5cD2dc00fDBc13d4dF4A8c7"), "USDT", "Tether USD", 6),
    TokenInfo::new(address!("B97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E"), "USDC", "USD Coin", 6),
    TokenInfo::new(address!("d586E7F844cEa2F87f50152665BCbc2C279D8d70"), "DAI", "Dai Stablecoin", 18),
];

pub(crate) fn popular_tokens(network: &Network) -> &'static [TokenInfo] {
    match network {
        Network::Ethereum => &ETHEREUM_TOKENS,
        Network::Bsc => &BSC_TOKENS,
        Network::Polygon => &POLYGON_TOKENS,
        Network::Avalanche => &AVALANCHE_TOKENS,
        Network::SaharaTestnet | Network::Custom(_) => &[],
    }
}

/// How an operator names the asset to transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetSpec {
    Native,
    Symbol(String),
    Contract(Address),
}

impl FromStr for AssetSpec {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(Error::InvalidConfiguration(
                "Asset must not be empty".to_string(),
            ));
        }
        if value.eq_ignore_ascii_case("native") {
            return Ok(AssetSpec::Native);
        }
        if value.starts_with("0x") || value.starts_with("0X") {
            if !is_valid_token_address(value) {
                return Err(Error::InvalidConfiguration(format!(
                    "Invalid token contract address: {value}"
                )));
            }
            let address = Address::from_str(value).map_err(|err| {
                Error::InvalidConfiguration(format!("Invalid token contract address: {err}"))
            })?;
            return Ok(AssetSpec::Contract(address));
        }
        Ok(AssetSpec::Symbol(value.to_uppercase()))
    }
}

/// `0x` followed by exactly 40 hex digits.
pub fn is_valid_token_address(value: &str) -> bool {
    value.len() == 42
        && value[..2].eq_ignore_ascii_case("0x")
        && value[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Resolves the operator's asset choice against the catalog, asking the chain for the
/// symbol and decimals of contracts the catalog does not know.
pub async fn resolve_asset<C: ChainConnector + ?Sized>(
    network: &Network,
    spec: &AssetSpec,
    connector: &C,
) -> Result<AssetDescriptor> {
    match spec {
        AssetSpec::Native => Ok(network.native_asset()),
        AssetSpec::Symbol(symbol) => {
            if symbol.eq_ignore_ascii_case(network.native_symbol()) {
                return Ok(network.native_asset());
            }
            network
                .popular_tokens()
                .iter()
                .find(|token| token.symbol.eq_ignore_ascii_case(symbol))
                .map(TokenInfo::descriptor)
                .ok_or_else(|| {
                    Error::InvalidConfiguration(format!(
                        "Token {symbol} is not known on {}, pass its contract address instead",
                        network.name()
                    ))
                })
        }
        AssetSpec::Contract(address) => {
            if let Some(token) = network
                .popular_tokens()
                .iter()
                .find(|token| token.address == *address)
            {
                return Ok(token.descriptor());
            }
            let (symbol, decimals) = connector.token_metadata(*address).await.map_err(|err| {
                Error::InvalidConfiguration(format!(
                    "Could not read token metadata for {address}: {err}"
                ))
            })?;
            debug!("Resolved custom token {address} as {symbol} with {decimals} decimals");
            Ok(AssetDescriptor::Token {
                contract_address: *address,
                symbol,
                decimals,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::MockChainConnector;
    use crate::error::NetworkError;
    use assert_matches::assert_matches;

    #[test]
    fn asset_spec_parses_keywords_symbols_and_addresses() {
        assert_eq!("native".parse::<AssetSpec>().ok(), Some(AssetSpec::Native));
        assert_eq!(
            "usdt".parse::<AssetSpec>().ok(),
            Some(AssetSpec::Symbol("USDT".to_string()))
        );
        assert_eq!(
            "0xdAC17F958D2ee523a2206206994597C13D831ec7"
                .parse::<AssetSpec>()
                .ok(),
            Some(AssetSpec::Contract(address!(
                "dAC17F958D2ee523a2206206994597C13D831ec7"
            )))
        );
        assert_matches!(
            "0x1234".parse::<AssetSpec>(),
            Err(Error::InvalidConfiguration(_))
        );
    }

    #[test]
    fn token_address_validation_matches_forty_hex_digits() {
        assert!(is_valid_token_address(
            "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
        ));
        assert!(!is_valid_token_address(
            "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB4"
        ));
        assert!(!is_valid_token_address(
            "0xZ0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
        ));
    }

    #[tokio::test]
    async fn popular_symbol_resolves_without_network_calls() {
        let connector = MockChainConnector::new();
        let asset = resolve_asset(
            &Network::Polygon,
            &AssetSpec::Symbol("USDC".to_string()),
            &connector,
        )
        .await
        .expect("USDC is in the polygon catalog");

        assert_eq!(
            asset.contract_address(),
            Some(address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174"))
        );
        assert_eq!(asset.decimals(), 6);
    }

    #[tokio::test]
    async fn unknown_symbol_is_invalid_configuration() {
        let connector = MockChainConnector::new();
        let result = resolve_asset(
            &Network::SaharaTestnet,
            &AssetSpec::Symbol("USDT".to_string()),
            &connector,
        )
        .await;
        assert_matches!(result, Err(Error::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn custom_contract_metadata_comes_from_chain() {
        let token = address!("00000000000000000000000000000000000000aa");
        let mut connector = MockChainConnector::new();
        connector
            .expect_token_metadata()
            .times(1)
            .returning(|_| Ok(("TEST".to_string(), 9)));

        let asset = resolve_asset(&Network::Bsc, &AssetSpec::Contract(token), &connector)
            .await
            .expect("metadata available");
        assert_eq!(
            asset,
            AssetDescriptor::Token {
                contract_address: token,
                symbol: "TEST".to_string(),
                decimals: 9,
            }
        );
    }

    #[tokio::test]
    async fn unreadable_contract_is_invalid_configuration() {
        let mut connector = MockChainConnector::new();
        connector
            .expect_token_metadata()
            .returning(|_| Err(NetworkError::permanent("execution reverted")));

        let result = resolve_asset(
            &Network::Bsc,
            &AssetSpec::Contract(address!("00000000000000000000000000000000000000bb")),
            &connector,
        )
        .await;
        assert_matches!(result, Err(Error::InvalidConfiguration(_)));
    }

    #[test]
    fn native_asset_uses_network_symbol() {
        let asset = Network::Bsc.native_asset();
        assert!(asset.is_native());
        assert_eq!(asset.symbol(), "BNB");
        assert_eq!(asset.decimals(), 18);
    }
}
