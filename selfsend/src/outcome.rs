// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::common::{Address, TxHash};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeStatus {
    Success(TxHash),
    SkippedZeroBalance,
    SkippedInsufficientForFee,
    Cancelled,
    Failed(String),
}

impl OutcomeStatus {
    /// Status name without its payload, used for summaries.
    pub fn label(&self) -> &'static str {
        match self {
            OutcomeStatus::Success(_) => "success",
            OutcomeStatus::SkippedZeroBalance => "skipped (zero balance)",
            OutcomeStatus::SkippedInsufficientForFee => "skipped (insufficient for fee)",
            OutcomeStatus::Cancelled => "cancelled",
            OutcomeStatus::Failed(_) => "failed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeStatus::Success(_))
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Success(tx_hash) => write!(f, "success ({tx_hash})"),
            OutcomeStatus::Failed(reason) => write!(f, "failed: {reason}"),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// Terminal record of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub account: Address,
    pub status: OutcomeStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// All outcomes of one batch, in the order the credentials were supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRun {
    pub outcomes: Vec<TransferOutcome>,
    /// Whether a stop was requested before the batch finished.
    pub stopped: bool,
}

impl BatchRun {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn successes(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status.is_success())
            .count()
    }

    /// Number of outcomes per status label.
    pub fn summary(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for outcome in &self.outcomes {
            *counts.entry(outcome.status.label()).or_insert(0) += 1;
        }
        counts
    }

    pub fn outcome_for(&self, account: &Address) -> Option<&TransferOutcome> {
        self.outcomes
            .iter()
            .find(|outcome| &outcome.account == account)
    }
}
