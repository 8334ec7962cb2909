// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::common::{Address, Calldata, U256};
use crate::contract::erc20::IERC20::IERC20Instance;
use crate::error::NetworkError;
use alloy::providers::{Network, Provider};
use alloy::sol;
use alloy::sol_types::SolCall;
use alloy::transports::Transport;

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
        function transfer(address to, uint256 value) external returns (bool);
    }
);

/// Read access to a fungible token contract. Writes are never sent through the contract
/// instance, transfers are encoded with [`transfer_calldata`] and signed locally.
pub struct Erc20Token<T: Transport + Clone, P: Provider<T, N>, N: Network> {
    pub contract: IERC20Instance<T, P, N>,
}

impl<T, P, N> Erc20Token<T, P, N>
where
    T: Transport + Clone,
    P: Provider<T, N>,
    N: Network,
{
    pub fn new(contract_address: Address, provider: P) -> Self {
        let contract = IERC20::new(contract_address, provider);
        Erc20Token { contract }
    }

    /// Get the raw token balance of an address.
    pub async fn balance_of(&self, account: Address) -> Result<U256, NetworkError> {
        debug!("Getting token balance of account: {account:?}");
        let balance = self
            .contract
            .balanceOf(account)
            .call()
            .await
            .inspect_err(|err| error!("Error getting token balance of {account:?}: {err:?}"))?
            ._0;
        debug!("Token balance of account {account} is {balance}");
        Ok(balance)
    }

    pub async fn symbol(&self) -> Result<String, NetworkError> {
        Ok(self.contract.symbol().call().await?._0)
    }

    pub async fn decimals(&self) -> Result<u8, NetworkError> {
        Ok(self.contract.decimals().call().await?._0)
    }
}

/// ABI encoded `transfer(to, value)`.
pub fn transfer_calldata(to: Address, value: U256) -> Calldata {
    IERC20::transferCall { to, value }.abi_encode().into()
}
