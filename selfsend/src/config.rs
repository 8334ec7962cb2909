// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::asset::AssetDescriptor;
use crate::error::{Error, Result};
use crate::fee::FeeConfig;
use crate::Network;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gas limit of a plain value transfer.
pub const DEFAULT_NATIVE_GAS_LIMIT: u64 = 21_000;

/// Bounds of the random pre-transfer delay, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    min_delay_secs: u64,
    max_delay_secs: u64,
}

impl TimingConfig {
    pub fn new(min_delay_secs: u64, max_delay_secs: u64) -> Result<Self> {
        if min_delay_secs == 0 {
            return Err(Error::InvalidConfiguration(
                "Minimum delay must be greater than zero".to_string(),
            ));
        }
        if min_delay_secs > max_delay_secs {
            return Err(Error::InvalidConfiguration(format!(
                "Minimum delay ({min_delay_secs}s) exceeds maximum delay ({max_delay_secs}s)"
            )));
        }
        Ok(Self {
            min_delay_secs,
            max_delay_secs,
        })
    }

    pub fn min_delay_secs(&self) -> u64 {
        self.min_delay_secs
    }

    pub fn max_delay_secs(&self) -> u64 {
        self.max_delay_secs
    }

    /// Uniform over `[min, max]`, both ends included.
    pub fn random_delay(&self) -> Duration {
        let secs = rand::thread_rng().gen_range(self.min_delay_secs..=self.max_delay_secs);
        Duration::from_secs(secs)
    }
}

/// Everything every task of a batch shares. Immutable once the batch starts.
#[derive(Debug, Clone)]
pub struct TransferPlan {
    pub network: Network,
    pub asset: AssetDescriptor,
    pub timing: TimingConfig,
    pub fee: FeeConfig,
    /// Gas limit used for native transfers.
    pub native_gas_limit: u64,
}

impl TransferPlan {
    pub fn new(
        network: Network,
        asset: AssetDescriptor,
        timing: TimingConfig,
        fee: FeeConfig,
    ) -> Self {
        Self {
            network,
            asset,
            timing,
            fee,
            native_gas_limit: DEFAULT_NATIVE_GAS_LIMIT,
        }
    }

    pub fn with_native_gas_limit(mut self, gas_limit: u64) -> Self {
        self.native_gas_limit = gas_limit;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.native_gas_limit == 0 {
            return Err(Error::InvalidConfiguration(
                "Native gas limit must be greater than zero".to_string(),
            ));
        }
        if let FeeConfig::Fixed { price_per_unit: 0 } = self.fee {
            return Err(Error::InvalidConfiguration(
                "Fixed gas price must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
