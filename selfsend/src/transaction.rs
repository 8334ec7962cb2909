// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::amount::{select_native_amount, select_token_amount, AmountDecision};
use crate::asset::AssetDescriptor;
use crate::common::{Address, Amount, Calldata, GasPrice, TxHash, U256};
use crate::config::TransferPlan;
use crate::connector::ChainConnector;
use crate::contract::erc20::transfer_calldata;
use crate::credential::Credential;
use crate::error::{Error, NetworkError, Result};
use crate::fee::estimate_fee;
use crate::utils::format_units;
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TransactionBuilder;
use alloy::rpc::types::TransactionRequest;

/// A signed self-transfer, ready to broadcast.
#[derive(Debug, Clone)]
pub struct SignedTransfer {
    pub raw_transaction: Calldata,
    pub amount: Amount,
    pub gas_price: GasPrice,
    pub gas_limit: u64,
    pub nonce: u64,
}

#[derive(Debug, Clone)]
pub enum Preparation {
    Ready(SignedTransfer),
    SkippedZeroBalance,
    SkippedInsufficientForFee,
}

/// Native value transfer from `account` to itself.
pub fn native_transfer_request(
    account: Address,
    amount: Amount,
    gas_price: GasPrice,
    nonce: u64,
    gas_limit: u64,
    chain_id: u64,
) -> TransactionRequest {
    TransactionRequest::default()
        .with_from(account)
        .with_to(account)
        .with_value(amount)
        .with_gas_price(gas_price)
        .with_nonce(nonce)
        .with_gas_limit(gas_limit)
        .with_chain_id(chain_id)
}

/// `transfer(account, amount)` against `token`. The gas limit is left unset so the
/// request can be estimated first.
pub fn token_transfer_request(
    account: Address,
    token: Address,
    amount: Amount,
    gas_price: GasPrice,
    nonce: u64,
    chain_id: u64,
) -> TransactionRequest {
    TransactionRequest::default()
        .with_from(account)
        .with_to(token)
        .with_input(transfer_calldata(account, amount))
        .with_gas_price(gas_price)
        .with_nonce(nonce)
        .with_chain_id(chain_id)
}

/// Adds 20 % headroom to a gas estimate, rounded down.
pub fn inflate_gas_limit(estimate: u64) -> u64 {
    let inflated = u128::from(estimate) * 6 / 5;
    u64::try_from(inflated).unwrap_or(u64::MAX)
}

/// Signs the request with the credential and returns the EIP-2718 encoding.
pub async fn sign_transaction(
    request: TransactionRequest,
    credential: &Credential,
) -> Result<Calldata> {
    let envelope = request.build(&credential.wallet()).await.map_err(|err| {
        error!("Error signing transaction for {}: {err}", credential.account_ref());
        Error::Build(err.to_string())
    })?;
    Ok(envelope.encoded_2718().into())
}

/// Reads balances, fee and nonce, selects an amount and signs the transfer.
pub async fn prepare_transfer<C: ChainConnector + ?Sized>(
    connector: &C,
    plan: &TransferPlan,
    credential: &Credential,
) -> Result<Preparation> {
    match &plan.asset {
        AssetDescriptor::Native { symbol, decimals } => {
            prepare_native(connector, plan, credential, symbol, *decimals).await
        }
        AssetDescriptor::Token {
            contract_address,
            symbol,
            decimals,
        } => prepare_token(connector, plan, credential, *contract_address, symbol, *decimals).await,
    }
}

async fn prepare_native<C: ChainConnector + ?Sized>(
    connector: &C,
    plan: &TransferPlan,
    credential: &Credential,
    symbol: &str,
    decimals: u8,
) -> Result<Preparation> {
    let account = credential.account();
    let balance = connector.native_balance(account).await?;
    info!(
        "Balance of {}: {} {symbol}",
        credential.account_ref(),
        format_units(balance, decimals)
    );
    if balance.is_zero() {
        return Ok(Preparation::SkippedZeroBalance);
    }

    let gas_price = estimate_fee(&plan.fee, connector).await?;
    let gas_limit = plan.native_gas_limit;
    let cost = U256::from(gas_price).saturating_mul(U256::from(gas_limit));
    let amount = match select_native_amount(balance, cost) {
        AmountDecision::Transfer(amount) => amount,
        AmountDecision::SkipZeroBalance => return Ok(Preparation::SkippedZeroBalance),
        AmountDecision::SkipInsufficientForFee => {
            debug!("Balance {balance} does not cover cost {cost}");
            return Ok(Preparation::SkippedInsufficientForFee);
        }
    };

    let nonce = connector.sequence_number(account).await?;
    let request = native_transfer_request(
        account,
        amount,
        gas_price,
        nonce,
        gas_limit,
        plan.network.chain_id(),
    );
    let raw_transaction = sign_transaction(request, credential).await?;
    Ok(Preparation::Ready(SignedTransfer {
        raw_transaction,
        amount,
        gas_price,
        gas_limit,
        nonce,
    }))
}

async fn prepare_token<C: ChainConnector + ?Sized>(
    connector: &C,
    plan: &TransferPlan,
    credential: &Credential,
    token: Address,
    symbol: &str,
    decimals: u8,
) -> Result<Preparation> {
    let account = credential.account();
    let balance = connector.token_balance(token, account).await?;
    info!(
        "Balance of {}: {} {symbol}",
        credential.account_ref(),
        format_units(balance, decimals)
    );

    let amount = match select_token_amount(balance) {
        AmountDecision::Transfer(amount) => amount,
        AmountDecision::SkipZeroBalance => return Ok(Preparation::SkippedZeroBalance),
        AmountDecision::SkipInsufficientForFee => {
            return Ok(Preparation::SkippedInsufficientForFee)
        }
    };

    let gas_price = estimate_fee(&plan.fee, connector).await?;
    let nonce = connector.sequence_number(account).await?;
    let request = token_transfer_request(
        account,
        token,
        amount,
        gas_price,
        nonce,
        plan.network.chain_id(),
    );

    let estimate = connector.estimate_gas(request.clone()).await?;
    let fee_budget = U256::from(gas_price).saturating_mul(U256::from(estimate));
    let native_balance = connector.native_balance(account).await?;
    if native_balance < fee_budget {
        debug!("Native balance {native_balance} does not cover fee {fee_budget}");
        return Ok(Preparation::SkippedInsufficientForFee);
    }

    let gas_limit = inflate_gas_limit(estimate);
    let raw_transaction = sign_transaction(request.with_gas_limit(gas_limit), credential).await?;
    Ok(Preparation::Ready(SignedTransfer {
        raw_transaction,
        amount,
        gas_price,
        gas_limit,
        nonce,
    }))
}

/// Broadcasts the transfer and waits for it to be mined.
pub async fn submit_and_confirm<C: ChainConnector + ?Sized>(
    connector: &C,
    transfer: SignedTransfer,
) -> Result<TxHash, NetworkError> {
    let tx_hash = connector.submit(transfer.raw_transaction).await?;
    debug!("Submitted {tx_hash}, waiting for confirmation");
    connector.await_confirmation(tx_hash).await
}
