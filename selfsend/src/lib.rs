// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

#[macro_use]
extern crate tracing;

use crate::asset::{AssetDescriptor, TokenInfo};
use crate::common::TxHash;
use alloy::transports::http::reqwest;
use std::fmt;
use std::sync::LazyLock;

pub mod amount;
pub mod asset;
pub mod cancellation;
pub mod common;
pub mod config;
pub mod connector;
pub mod contract;
pub mod credential;
pub mod error;
pub mod event;
pub mod fee;
pub mod outcome;
pub mod scheduler;
pub mod transaction;
pub mod utils;

pub use crate::cancellation::StopSignal;
pub use crate::config::{TimingConfig, TransferPlan};
pub use crate::connector::{ChainConnector, EvmConnector};
pub use crate::credential::Credential;
pub use crate::error::{Error, NetworkError, NetworkErrorKind, Result};
pub use crate::event::{EventSink, Severity, TransferEvent};
pub use crate::fee::FeeConfig;
pub use crate::outcome::{BatchRun, OutcomeStatus, TransferOutcome};
pub use crate::scheduler::{BatchHandle, Scheduler};

fn parse_static_url(url: &str) -> reqwest::Url {
    url.parse().expect("Invalid built-in RPC URL")
}

static SAHARA_TESTNET_RPC_URL: LazyLock<reqwest::Url> =
    LazyLock::new(|| parse_static_url("https://testnet.saharalabs.ai"));
static ETHEREUM_RPC_URL: LazyLock<reqwest::Url> =
    LazyLock::new(|| parse_static_url("https://ethereum.publicnode.com"));
static BSC_RPC_URL: LazyLock<reqwest::Url> =
    LazyLock::new(|| parse_static_url("https://bsc-dataseed.binance.org"));
static POLYGON_RPC_URL: LazyLock<reqwest::Url> =
    LazyLock::new(|| parse_static_url("https://polygon-rpc.com"));
static AVALANCHE_RPC_URL: LazyLock<reqwest::Url> =
    LazyLock::new(|| parse_static_url("https://api.avax.network/ext/bc/C/rpc"));

/// Native coins on every built-in network use 18 decimals.
const NATIVE_DECIMALS: u8 = 18;

#[derive(Clone, Debug, PartialEq)]
pub struct CustomNetwork {
    pub rpc_url_http: reqwest::Url,
    pub chain_id: u64,
    pub explorer_url: Option<String>,
    pub native_symbol: String,
    pub native_decimals: u8,
}

impl CustomNetwork {
    pub fn new(rpc_url: &str, chain_id: u64) -> Result<Self> {
        let rpc_url_http = reqwest::Url::parse(rpc_url).map_err(|err| {
            Error::InvalidConfiguration(format!("Invalid RPC URL {rpc_url:?}: {err}"))
        })?;
        Ok(Self {
            rpc_url_http,
            chain_id,
            explorer_url: None,
            native_symbol: "ETH".to_string(),
            native_decimals: NATIVE_DECIMALS,
        })
    }

    pub fn with_explorer_url(mut self, explorer_url: impl Into<String>) -> Self {
        self.explorer_url = Some(explorer_url.into());
        self
    }

    pub fn with_native_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.native_symbol = symbol.into();
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Network {
    SaharaTestnet,
    Ethereum,
    Bsc,
    Polygon,
    Avalanche,
    Custom(CustomNetwork),
}

impl Network {
    /// Every network known without further configuration.
    pub const BUILT_IN: [Network; 5] = [
        Network::SaharaTestnet,
        Network::Ethereum,
        Network::Bsc,
        Network::Polygon,
        Network::Avalanche,
    ];

    /// Resolves a built-in network by identifier, display name or chain id.
    pub fn from_identifier(value: &str) -> Result<Self> {
        let needle = value.trim().to_lowercase();
        Self::BUILT_IN
            .into_iter()
            .find(|network| {
                network.identifier() == needle
                    || network.name().to_lowercase() == needle
                    || network.chain_id().to_string() == needle
            })
            .ok_or_else(|| Error::InvalidConfiguration(format!("Unknown network: {value}")))
    }

    pub fn identifier(&self) -> &str {
        match self {
            Network::SaharaTestnet => "sahara-testnet",
            Network::Ethereum => "ethereum",
            Network::Bsc => "bsc",
            Network::Polygon => "polygon",
            Network::Avalanche => "avalanche",
            Network::Custom(_) => "custom",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Network::SaharaTestnet => "Sahara Testnet",
            Network::Ethereum => "Ethereum",
            Network::Bsc => "BSC",
            Network::Polygon => "Polygon",
            Network::Avalanche => "Avalanche",
            Network::Custom(_) => "Custom",
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Network::SaharaTestnet => 313313,
            Network::Ethereum => 1,
            Network::Bsc => 56,
            Network::Polygon => 137,
            Network::Avalanche => 43114,
            Network::Custom(custom) => custom.chain_id,
        }
    }

    pub fn rpc_url(&self) -> &reqwest::Url {
        match self {
            Network::SaharaTestnet => &SAHARA_TESTNET_RPC_URL,
            Network::Ethereum => &ETHEREUM_RPC_URL,
            Network::Bsc => &BSC_RPC_URL,
            Network::Polygon => &POLYGON_RPC_URL,
            Network::Avalanche => &AVALANCHE_RPC_URL,
            Network::Custom(custom) => &custom.rpc_url_http,
        }
    }

    /// Points a built-in network at another RPC endpoint, keeping its chain metadata.
    pub fn with_rpc_url(self, rpc_url: &str) -> Result<Self> {
        let mut custom = CustomNetwork::new(rpc_url, self.chain_id())?
            .with_native_symbol(self.native_symbol());
        custom.explorer_url = self.explorer_url().map(str::to_string);
        Ok(Network::Custom(custom))
    }

    pub fn explorer_url(&self) -> Option<&str> {
        match self {
            Network::SaharaTestnet => Some("https://testnet-explorer.saharalabs.ai"),
            Network::Ethereum => Some("https://etherscan.io"),
            Network::Bsc => Some("https://bscscan.com"),
            Network::Polygon => Some("https://polygonscan.com"),
            Network::Avalanche => Some("https://snowtrace.io"),
            Network::Custom(custom) => custom.explorer_url.as_deref(),
        }
    }

    /// Link to a transaction on the network's block explorer.
    pub fn tx_explorer_url(&self, tx_hash: &TxHash) -> Option<String> {
        self.explorer_url()
            .map(|base| format!("{}/tx/{tx_hash}", base.trim_end_matches('/')))
    }

    pub fn native_symbol(&self) -> &str {
        match self {
            Network::SaharaTestnet => "SAHARA",
            Network::Ethereum => "ETH",
            Network::Bsc => "BNB",
            Network::Polygon => "MATIC",
            Network::Avalanche => "AVAX",
            Network::Custom(custom) => &custom.native_symbol,
        }
    }

    pub fn native_asset(&self) -> AssetDescriptor {
        let decimals = match self {
            Network::Custom(custom) => custom.native_decimals,
            _ => NATIVE_DECIMALS,
        };
        AssetDescriptor::Native {
            symbol: self.native_symbol().to_string(),
            decimals,
        }
    }

    pub fn popular_tokens(&self) -> &'static [TokenInfo] {
        asset::popular_tokens(self)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (chain id {})", self.name(), self.chain_id())
    }
}
