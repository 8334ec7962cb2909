// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Randomized, balance-aware transfer amounts.
//!
//! Amounts are drawn from the thread-local generator, which is seeded from the operating
//! system. There is deliberately no way to seed it.

use crate::common::{Amount, U256};
use rand::Rng;

/// Token transfers move at most this share of the balance, in parts per million.
pub const MAX_TOKEN_SHARE_PPM: u64 = 900_000;
const PPM: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountDecision {
    Transfer(Amount),
    SkipZeroBalance,
    SkipInsufficientForFee,
}

/// Native transfers: draws from `[0, balance - cost]`.
pub fn select_native_amount(balance: U256, cost: U256) -> AmountDecision {
    if balance.is_zero() {
        return AmountDecision::SkipZeroBalance;
    }
    if balance <= cost {
        return AmountDecision::SkipInsufficientForFee;
    }
    let spendable = balance - cost;
    AmountDecision::Transfer(uniform_inclusive(&mut rand::thread_rng(), spendable))
}

/// Token transfers: draws a share `r` from `[0, 0.9]`, then an amount from
/// `[0, floor(balance × r)]`. The fee is paid in the native coin and checked separately.
pub fn select_token_amount(balance: U256) -> AmountDecision {
    if balance.is_zero() {
        return AmountDecision::SkipZeroBalance;
    }
    let mut rng = rand::thread_rng();
    let share_ppm = rng.gen_range(0..=MAX_TOKEN_SHARE_PPM);
    let cap = scale_ppm(balance, share_ppm);
    AmountDecision::Transfer(uniform_inclusive(&mut rng, cap))
}

/// `floor(value × ppm / 1_000_000)` without intermediate overflow, for `ppm <= 1_000_000`.
fn scale_ppm(value: U256, ppm: u64) -> U256 {
    let ppm = U256::from(ppm);
    let million = U256::from(PPM);
    (value / million) * ppm + (value % million) * ppm / million
}

/// Uniform draw from `[0, max]` by rejection sampling over the bit length of `max + 1`.
pub(crate) fn uniform_inclusive<R: Rng + ?Sized>(rng: &mut R, max: U256) -> U256 {
    if max == U256::MAX {
        return U256::from_be_bytes(rng.gen::<[u8; 32]>());
    }
    let bound = max + U256::from(1u8);
    let shift = 256 - bound.bit_len();
    loop {
        let candidate = U256::from_be_bytes(rng.gen::<[u8; 32]>()) >> shift;
        if candidate < bound {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn native_amount(balance: u64, cost: u64) -> AmountDecision {
        select_native_amount(U256::from(balance), U256::from(cost))
    }

    #[test]
    fn zero_balance_short_circuits_before_fee_check() {
        assert_eq!(native_amount(0, 10), AmountDecision::SkipZeroBalance);
        assert_eq!(native_amount(0, 0), AmountDecision::SkipZeroBalance);
        assert_eq!(
            select_token_amount(U256::ZERO),
            AmountDecision::SkipZeroBalance
        );
    }

    #[test]
    fn balance_not_covering_cost_is_skipped() {
        assert_eq!(native_amount(5, 10), AmountDecision::SkipInsufficientForFee);
        // spendable = 0
        assert_eq!(
            native_amount(10, 10),
            AmountDecision::SkipInsufficientForFee
        );
    }

    #[test]
    fn one_spendable_unit_yields_zero_or_one() {
        let mut seen = [false; 2];
        for _ in 0..200 {
            match native_amount(11, 10) {
                AmountDecision::Transfer(amount) if amount <= U256::from(1) => {
                    seen[amount.to::<usize>()] = true;
                }
                other => panic!("unexpected decision {other:?}"),
            }
        }
        assert_eq!(seen, [true, true]);
    }

    #[test]
    fn native_amount_never_exceeds_spendable() {
        for _ in 0..1_000 {
            assert_matches!(
                native_amount(100, 10),
                AmountDecision::Transfer(amount) if amount <= U256::from(90)
            );
        }
    }

    #[test]
    fn token_amount_never_exceeds_ninety_percent() {
        let balance = U256::from(1_000u64);
        for _ in 0..2_000 {
            assert_matches!(
                select_token_amount(balance),
                AmountDecision::Transfer(amount) if amount <= U256::from(900)
            );
        }

        // floor(1 × 0.9) = 0
        for _ in 0..100 {
            assert_eq!(
                select_token_amount(U256::from(1)),
                AmountDecision::Transfer(U256::ZERO)
            );
        }
    }

    #[test]
    fn token_amount_handles_full_width_balances() {
        let cap = scale_ppm(U256::MAX, MAX_TOKEN_SHARE_PPM);
        for _ in 0..100 {
            assert_matches!(
                select_token_amount(U256::MAX),
                AmountDecision::Transfer(amount) if amount <= cap
            );
        }
    }

    #[test]
    fn share_scaling_rounds_down() {
        assert_eq!(scale_ppm(U256::from(100), 900_000), U256::from(90));
        assert_eq!(scale_ppm(U256::from(9), 900_000), U256::from(8));
        assert_eq!(scale_ppm(U256::from(1_999_999), 500_000), U256::from(999_999));
        assert_eq!(scale_ppm(U256::MAX, 1_000_000), U256::MAX);
    }

    #[test]
    fn uniform_draw_covers_range_evenly() {
        let mut rng = rand::thread_rng();
        let mut counts = [0u32; 10];
        for _ in 0..20_000 {
            let value = uniform_inclusive(&mut rng, U256::from(9));
            counts[value.to::<usize>()] += 1;
        }
        // expected 2000 per bucket; the bounds sit far outside any plausible deviation
        for (value, count) in counts.iter().enumerate() {
            assert!(
                (1_600..=2_400).contains(count),
                "value {value} drawn {count} times"
            );
        }
    }

    #[test]
    fn uniform_draw_at_degenerate_bounds() {
        let mut rng = rand::thread_rng();
        assert_eq!(uniform_inclusive(&mut rng, U256::ZERO), U256::ZERO);
        // Must terminate and stay in range for the widest bound.
        let _ = uniform_inclusive(&mut rng, U256::MAX);
        let half = U256::MAX >> 1;
        for _ in 0..100 {
            assert!(uniform_inclusive(&mut rng, half) <= half);
        }
    }
}
