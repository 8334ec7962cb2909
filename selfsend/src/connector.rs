// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! The seam between transfer logic and a live chain.
//!
//! Every chain read and write a transfer task performs goes through [`ChainConnector`], so
//! the scheduler can be exercised against a mock without a node.

use crate::common::{Address, Calldata, GasPrice, TxHash, U256};
use crate::contract::erc20::Erc20Token;
use crate::error::{NetworkError, Result};
use crate::Network;
use alloy::network::Ethereum;
use alloy::providers::{Provider, ProviderBuilder, ReqwestProvider};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::http::{reqwest, Http};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::time::Duration;

/// Interval between receipt lookups while waiting for a transaction to be mined.
pub const DEFAULT_CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Chain access used by transfer tasks. Implementations must be safe to share between
/// concurrently running tasks and must not retry on their own.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChainConnector: Send + Sync {
    /// Native coin balance of `account`, in base units.
    async fn native_balance(&self, account: Address) -> Result<U256, NetworkError>;

    /// Balance of `account` on the token contract `token`, in base units.
    async fn token_balance(&self, token: Address, account: Address) -> Result<U256, NetworkError>;

    /// Price per gas unit the node currently suggests.
    async fn fee_hint(&self) -> Result<GasPrice, NetworkError>;

    /// Next transaction sequence number (nonce) of `account`, pending transactions included.
    async fn sequence_number(&self, account: Address) -> Result<u64, NetworkError>;

    async fn estimate_gas(&self, request: TransactionRequest) -> Result<u64, NetworkError>;

    /// Broadcasts a signed, encoded transaction.
    async fn submit(&self, raw_transaction: Calldata) -> Result<TxHash, NetworkError>;

    /// Resolves once the transaction is mined. A reverted transaction is an error.
    async fn await_confirmation(&self, tx_hash: TxHash) -> Result<TxHash, NetworkError>;

    /// Symbol and decimals of a token contract.
    async fn token_metadata(&self, token: Address) -> Result<(String, u8), NetworkError>;
}

/// [`ChainConnector`] backed by a JSON-RPC HTTP endpoint.
#[derive(Clone)]
pub struct EvmConnector {
    provider: ReqwestProvider,
    confirmation_poll_interval: Duration,
}

impl EvmConnector {
    pub fn new(rpc_url: reqwest::Url) -> Self {
        Self {
            provider: ProviderBuilder::new().on_http(rpc_url),
            confirmation_poll_interval: DEFAULT_CONFIRMATION_POLL_INTERVAL,
        }
    }

    pub fn with_confirmation_poll_interval(mut self, interval: Duration) -> Self {
        self.confirmation_poll_interval = interval;
        self
    }

    /// Connects to the network's RPC endpoint and checks that it serves the expected chain.
    pub async fn connect(network: &Network) -> Result<Self> {
        let connector = Self::new(network.rpc_url().clone());
        let chain_id = connector.chain_id().await?;
        if chain_id != network.chain_id() {
            return Err(crate::Error::InvalidConfiguration(format!(
                "RPC endpoint {} serves chain id {chain_id}, expected {} for {}",
                network.rpc_url(),
                network.chain_id(),
                network.name()
            )));
        }
        info!("Connected to {network} via {}", network.rpc_url());
        Ok(connector)
    }

    pub async fn chain_id(&self) -> Result<u64, NetworkError> {
        Ok(self.provider.get_chain_id().await?)
    }

    fn token(
        &self,
        token: Address,
    ) -> Erc20Token<Http<reqwest::Client>, &ReqwestProvider, Ethereum> {
        Erc20Token::new(token, &self.provider)
    }
}

#[async_trait]
impl ChainConnector for EvmConnector {
    async fn native_balance(&self, account: Address) -> Result<U256, NetworkError> {
        Ok(self.provider.get_balance(account).await?)
    }

    async fn token_balance(&self, token: Address, account: Address) -> Result<U256, NetworkError> {
        self.token(token).balance_of(account).await
    }

    async fn fee_hint(&self) -> Result<GasPrice, NetworkError> {
        Ok(self.provider.get_gas_price().await?)
    }

    async fn sequence_number(&self, account: Address) -> Result<u64, NetworkError> {
        Ok(self
            .provider
            .get_transaction_count(account)
            .pending()
            .await?)
    }

    async fn estimate_gas(&self, request: TransactionRequest) -> Result<u64, NetworkError> {
        Ok(self.provider.estimate_gas(&request).await?)
    }

    async fn submit(&self, raw_transaction: Calldata) -> Result<TxHash, NetworkError> {
        let pending = self
            .provider
            .send_raw_transaction(&raw_transaction)
            .await
            .inspect_err(|err| error!("Error sending raw transaction: {err:?}"))?;
        let tx_hash = *pending.tx_hash();
        debug!("Transaction {tx_hash} accepted by the node");
        Ok(tx_hash)
    }

    async fn await_confirmation(&self, tx_hash: TxHash) -> Result<TxHash, NetworkError> {
        loop {
            match self.provider.get_transaction_receipt(tx_hash).await? {
                Some(receipt) if receipt.status() => {
                    debug!(
                        "Transaction {tx_hash} mined in block {:?}",
                        receipt.block_number
                    );
                    return Ok(receipt.transaction_hash);
                }
                Some(_) => {
                    return Err(NetworkError::permanent(format!(
                        "Transaction {tx_hash} reverted"
                    )))
                }
                None => tokio::time::sleep(self.confirmation_poll_interval).await,
            }
        }
    }

    async fn token_metadata(&self, token: Address) -> Result<(String, u8), NetworkError> {
        let contract = self.token(token);
        let symbol = contract.symbol().await?;
        let decimals = contract.decimals().await?;
        Ok((symbol, decimals))
    }
}
