// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::common::GasPrice;
use crate::connector::ChainConnector;
use crate::error::NetworkError;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Upper bound of the fee jitter, in parts per million added on top of the hint.
pub const MAX_FEE_JITTER_PPM: u128 = 100_000;
const PPM: u128 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeConfig {
    /// Query the node and add a random jitter of 0 to 10 %.
    Auto,
    /// Use the price unchanged, in wei per gas unit.
    Fixed { price_per_unit: GasPrice },
}

impl FeeConfig {
    pub fn fixed_gwei(gwei: u64) -> Self {
        FeeConfig::Fixed {
            price_per_unit: u128::from(gwei) * 1_000_000_000,
        }
    }
}

/// Price per gas unit for one transaction. Only fails when the fee hint query fails.
pub async fn estimate_fee<C: ChainConnector + ?Sized>(
    config: &FeeConfig,
    connector: &C,
) -> Result<GasPrice, NetworkError> {
    match config {
        FeeConfig::Fixed { price_per_unit } => Ok(*price_per_unit),
        FeeConfig::Auto => {
            let hint = connector.fee_hint().await?;
            let ppm = rand::thread_rng().gen_range(0..=MAX_FEE_JITTER_PPM);
            let fee = apply_jitter(hint, ppm);
            trace!("Fee hint {hint} with jitter {ppm} ppm gives {fee}");
            Ok(fee)
        }
    }
}

/// `hint × (1 + ppm / 1_000_000)`, rounded down.
fn apply_jitter(hint: GasPrice, ppm: u128) -> GasPrice {
    let extra = (hint / PPM) * ppm + (hint % PPM) * ppm / PPM;
    hint.saturating_add(extra)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::MockChainConnector;
    use crate::error::NetworkErrorKind;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn fixed_price_is_returned_unchanged_without_network() {
        let connector = MockChainConnector::new();
        let fee = estimate_fee(&FeeConfig::Fixed { price_per_unit: 7 }, &connector)
            .await
            .expect("fixed fee");
        assert_eq!(fee, 7);
    }

    #[tokio::test]
    async fn auto_fee_stays_within_ten_percent_of_hint() {
        let mut connector = MockChainConnector::new();
        connector.expect_fee_hint().returning(|| Ok(20));

        for _ in 0..500 {
            let fee = estimate_fee(&FeeConfig::Auto, &connector)
                .await
                .expect("auto fee");
            assert!((20..=22).contains(&fee), "fee {fee} outside band");
        }
    }

    #[tokio::test]
    async fn auto_fee_with_realistic_hint_is_jittered() {
        let hint = 3_000_000_000u128;
        let mut connector = MockChainConnector::new();
        connector.expect_fee_hint().returning(move || Ok(hint));

        let mut fees = Vec::new();
        for _ in 0..200 {
            let fee = estimate_fee(&FeeConfig::Auto, &connector)
                .await
                .expect("auto fee");
            assert!(fee >= hint && fee <= hint + hint / 10);
            fees.push(fee);
        }
        fees.sort_unstable();
        fees.dedup();
        assert!(fees.len() > 1, "jitter never varied");
    }

    #[tokio::test]
    async fn hint_failure_is_propagated() {
        let mut connector = MockChainConnector::new();
        connector
            .expect_fee_hint()
            .returning(|| Err(NetworkError::transient("connection reset")));

        let err = estimate_fee(&FeeConfig::Auto, &connector)
            .await
            .expect_err("hint failed");
        assert_matches!(err.kind, NetworkErrorKind::Transient);
    }

    #[test]
    fn jitter_bounds_are_exact() {
        assert_eq!(apply_jitter(20, 0), 20);
        assert_eq!(apply_jitter(20, MAX_FEE_JITTER_PPM), 22);
        assert_eq!(apply_jitter(1_000_000, 50_000), 1_050_000);
        assert_eq!(apply_jitter(u128::MAX, MAX_FEE_JITTER_PPM), u128::MAX);
    }

    #[test]
    fn gwei_conversion() {
        assert_eq!(
            FeeConfig::fixed_gwei(3),
            FeeConfig::Fixed {
                price_per_unit: 3_000_000_000
            }
        );
    }
}
