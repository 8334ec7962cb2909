// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Fan-out of one transfer task per credential.
//!
//! Every task owns its credential and walks
//! `Pending -> Waiting -> CheckingCancellation -> Estimating -> Submitting -> Confirming`
//! to exactly one terminal [`OutcomeStatus`]. Cancellation is only observed before any
//! network call is made: a stop request ends pending waits early and turns those tasks
//! into `Cancelled`, while tasks already talking to the chain run to completion.

use crate::cancellation::StopSignal;
use crate::common::Address;
use crate::config::TransferPlan;
use crate::connector::ChainConnector;
use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::event::{EventSink, Severity};
use crate::outcome::{BatchRun, OutcomeStatus, TransferOutcome};
use crate::transaction::{prepare_transfer, submit_and_confirm, Preparation};
use crate::utils::format_units;
use chrono::Utc;
use futures::FutureExt;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::Instrument;

/// Runs batches of self-transfers for one plan against one connector.
#[derive(Clone)]
pub struct Scheduler {
    connector: Arc<dyn ChainConnector>,
    plan: Arc<TransferPlan>,
    events: EventSink,
}

impl Scheduler {
    pub fn new(connector: Arc<dyn ChainConnector>, plan: TransferPlan) -> Self {
        Self {
            connector,
            plan: Arc::new(plan),
            events: EventSink::disabled(),
        }
    }

    pub fn with_event_sink(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn plan(&self) -> &TransferPlan {
        &self.plan
    }

    /// Validates the batch and spawns one task per credential. Must be called from within
    /// a tokio runtime.
    pub fn start(&self, credentials: Vec<Credential>) -> Result<BatchHandle> {
        self.plan.validate()?;
        if credentials.is_empty() {
            return Err(Error::InvalidConfiguration(
                "No credentials supplied".to_string(),
            ));
        }
        let mut seen = HashSet::with_capacity(credentials.len());
        for credential in &credentials {
            if !seen.insert(credential.account()) {
                return Err(Error::InvalidConfiguration(format!(
                    "Account {} supplied more than once",
                    credential.account()
                )));
            }
        }

        let stop = StopSignal::new();
        let accounts: Vec<Address> = credentials.iter().map(Credential::account).collect();
        let mut tasks = JoinSet::new();

        info!(
            "Starting {} transfer tasks on {} with {}",
            credentials.len(),
            self.plan.network,
            self.plan.asset
        );
        for (index, credential) in credentials.into_iter().enumerate() {
            let span = info_span!("transfer", account = %credential.account_ref());
            let task = TransferTask {
                index,
                credential,
                plan: Arc::clone(&self.plan),
                connector: Arc::clone(&self.connector),
                events: self.events.clone(),
                stop: stop.clone(),
            };
            let _ = tasks.spawn(task.run().instrument(span));
        }

        Ok(BatchHandle {
            stopper: BatchStopper {
                stop,
                events: self.events.clone(),
            },
            tasks,
            accounts,
            events: self.events.clone(),
        })
    }

    /// Starts a batch and waits for every task to finish.
    pub async fn run(&self, credentials: Vec<Credential>) -> Result<BatchRun> {
        Ok(self.start(credentials)?.wait().await)
    }
}

/// Requests a stop of a running batch. Cheap to clone and usable while the batch is
/// being awaited.
#[derive(Debug, Clone)]
pub struct BatchStopper {
    stop: StopSignal,
    events: EventSink,
}

impl BatchStopper {
    /// Returns immediately. Only the first request has an effect; later ones return
    /// `false`.
    pub fn request_stop(&self) -> bool {
        let first = self.stop.request_stop();
        if first {
            warn!("Stop requested, transfers that have not started will be cancelled");
            self.events.emit(
                Severity::Warning,
                None,
                "Stop requested, transfers that have not started will be cancelled",
            );
        }
        first
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.is_stop_requested()
    }
}

/// A running batch. Dropping it without waiting aborts every task.
pub struct BatchHandle {
    stopper: BatchStopper,
    tasks: JoinSet<(usize, TransferOutcome)>,
    accounts: Vec<Address>,
    events: EventSink,
}

impl BatchHandle {
    pub fn request_stop(&self) -> bool {
        self.stopper.request_stop()
    }

    pub fn stopper(&self) -> BatchStopper {
        self.stopper.clone()
    }

    /// Waits until every task is terminal. A stop request does not shorten this wait.
    pub async fn wait(mut self) -> BatchRun {
        let mut slots: Vec<Option<TransferOutcome>> = vec![None; self.accounts.len()];
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(err) => error!("Transfer task did not complete: {err}"),
            }
        }

        let finished_at = Utc::now();
        let outcomes = slots
            .into_iter()
            .zip(&self.accounts)
            .map(|(slot, account)| {
                slot.unwrap_or_else(|| TransferOutcome {
                    account: *account,
                    status: OutcomeStatus::Failed("task aborted".to_string()),
                    started_at: finished_at,
                    finished_at,
                })
            })
            .collect();

        let stopped = self.stopper.is_stop_requested();
        if stopped {
            info!("Batch stopped, all transfer tasks have finished");
            self.events
                .emit(Severity::Info, None, "Batch stopped, all transfer tasks have finished");
        } else {
            info!("All transfer tasks completed");
            self.events
                .emit(Severity::Info, None, "All transfer tasks completed");
        }

        BatchRun { outcomes, stopped }
    }
}

/// Everything one task needs, moved into it at spawn time.
struct TransferTask {
    index: usize,
    credential: Credential,
    plan: Arc<TransferPlan>,
    connector: Arc<dyn ChainConnector>,
    events: EventSink,
    stop: StopSignal,
}

impl TransferTask {
    async fn run(self) -> (usize, TransferOutcome) {
        let index = self.index;
        let account = self.credential.account();
        let account_ref = self.credential.account_ref();
        let events = self.events.clone();
        let network = self.plan.network.clone();
        let started_at = Utc::now();

        let status = match AssertUnwindSafe(self.drive(&account_ref))
            .catch_unwind()
            .await
        {
            Ok(status) => status,
            Err(_) => {
                error!("Transfer task panicked");
                OutcomeStatus::Failed("task panicked".to_string())
            }
        };

        let (severity, message) = match &status {
            OutcomeStatus::Success(tx_hash) => {
                let message = match network.tx_explorer_url(tx_hash) {
                    Some(link) => format!("Transfer confirmed: {tx_hash} ({link})"),
                    None => format!("Transfer confirmed: {tx_hash}"),
                };
                info!("{message}");
                (Severity::Success, message)
            }
            OutcomeStatus::SkippedZeroBalance => {
                info!("Skipped, zero balance");
                (Severity::Warning, "Skipped: zero balance".to_string())
            }
            OutcomeStatus::SkippedInsufficientForFee => {
                info!("Skipped, balance does not cover the fee");
                (
                    Severity::Warning,
                    "Skipped: insufficient balance for fee".to_string(),
                )
            }
            OutcomeStatus::Cancelled => {
                info!("Cancelled before submission");
                (Severity::Warning, "Cancelled before submission".to_string())
            }
            OutcomeStatus::Failed(reason) => {
                error!("Transfer failed: {reason}");
                (Severity::Error, format!("Transfer failed: {reason}"))
            }
        };
        events.emit(severity, Some(&account_ref), message);

        let outcome = TransferOutcome {
            account,
            status,
            started_at,
            finished_at: Utc::now(),
        };
        (index, outcome)
    }

    async fn drive(self, account_ref: &str) -> OutcomeStatus {
        let delay = self.plan.timing.random_delay();
        debug!("Waiting {delay:?} before transfer");
        self.events.emit(
            Severity::Info,
            Some(account_ref),
            format!("Waiting {}s before transfer", delay.as_secs()),
        );

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = self.stop.stopped() => debug!("Stop requested while waiting"),
        }
        if self.stop.is_stop_requested() {
            return OutcomeStatus::Cancelled;
        }

        let connector = self.connector.as_ref();
        let transfer = match prepare_transfer(connector, &self.plan, &self.credential).await {
            Ok(Preparation::Ready(transfer)) => transfer,
            Ok(Preparation::SkippedZeroBalance) => return OutcomeStatus::SkippedZeroBalance,
            Ok(Preparation::SkippedInsufficientForFee) => {
                return OutcomeStatus::SkippedInsufficientForFee
            }
            Err(err) => return OutcomeStatus::Failed(err.to_string()),
        };

        let asset = &self.plan.asset;
        self.events.emit(
            Severity::Info,
            Some(account_ref),
            format!(
                "Submitting {} {} to self (nonce {}, gas price {}, gas limit {})",
                format_units(transfer.amount, asset.decimals()),
                asset.symbol(),
                transfer.nonce,
                transfer.gas_price,
                transfer.gas_limit
            ),
        );

        match submit_and_confirm(connector, transfer).await {
            Ok(tx_hash) => OutcomeStatus::Success(tx_hash),
            Err(err) => OutcomeStatus::Failed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Calldata, TxHash, U256};
    use crate::config::TimingConfig;
    use crate::connector::MockChainConnector;
    use crate::error::NetworkError;
    use crate::event::TransferEvent;
    use crate::fee::FeeConfig;
    use crate::Network;
    use alloy::consensus::{Transaction, TxEnvelope};
    use alloy::eips::eip2718::Decodable2718;
    use assert_matches::assert_matches;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    fn credentials(count: usize) -> Vec<Credential> {
        (1..=count)
            .map(|i| Credential::from_private_key(&format!("{i:064x}")).expect("valid key"))
            .collect()
    }

    fn native_plan(min: u64, max: u64, fee: FeeConfig) -> TransferPlan {
        TransferPlan::new(
            Network::Bsc,
            Network::Bsc.native_asset(),
            TimingConfig::new(min, max).expect("valid timing"),
            fee,
        )
    }

    fn drain(receiver: &mut mpsc::Receiver<TransferEvent>) -> Vec<TransferEvent> {
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn mixed_balances_scenario() {
        let credentials = credentials(3);
        let balances: HashMap<Address, U256> = credentials
            .iter()
            .map(Credential::account)
            .zip([U256::ZERO, U256::from(100), U256::from(5)])
            .collect();
        let submitted = Arc::new(Mutex::new(Vec::<Calldata>::new()));

        let mut connector = MockChainConnector::new();
        connector
            .expect_native_balance()
            .returning(move |account| Ok(balances[&account]));
        connector.expect_fee_hint().never();
        connector.expect_sequence_number().returning(|_| Ok(0));
        let recorded = Arc::clone(&submitted);
        connector.expect_submit().times(1).returning(move |raw| {
            recorded.lock().expect("lock").push(raw);
            Ok(TxHash::repeat_byte(0xab))
        });
        connector
            .expect_await_confirmation()
            .times(1)
            .returning(Ok);

        // cost = 10 per unit x 1 unit
        let plan =
            native_plan(1, 1, FeeConfig::Fixed { price_per_unit: 10 }).with_native_gas_limit(1);
        let scheduler = Scheduler::new(Arc::new(connector), plan);
        let run = scheduler.run(credentials).await.expect("batch ran");

        let statuses: Vec<_> = run.outcomes.iter().map(|o| o.status.clone()).collect();
        assert_eq!(
            statuses,
            vec![
                OutcomeStatus::SkippedZeroBalance,
                OutcomeStatus::Success(TxHash::repeat_byte(0xab)),
                OutcomeStatus::SkippedInsufficientForFee,
            ]
        );
        assert!(!run.stopped);

        let submitted = submitted.lock().expect("lock");
        let envelope =
            TxEnvelope::decode_2718(&mut submitted[0].as_ref()).expect("valid envelope");
        assert!(envelope.value() <= U256::from(90));
    }

    #[tokio::test(start_paused = true)]
    async fn first_network_call_happens_within_delay_bounds() {
        let credentials = credentials(20);
        let first_calls = Arc::new(Mutex::new(Vec::<Instant>::new()));

        let mut connector = MockChainConnector::new();
        let recorded = Arc::clone(&first_calls);
        connector.expect_native_balance().returning(move |_| {
            recorded.lock().expect("lock").push(Instant::now());
            Ok(U256::ZERO)
        });

        let plan = native_plan(2, 5, FeeConfig::Auto);
        let started = Instant::now();
        let run = Scheduler::new(Arc::new(connector), plan)
            .run(credentials)
            .await
            .expect("batch ran");

        assert_eq!(run.len(), 20);
        let first_calls = first_calls.lock().expect("lock");
        assert_eq!(first_calls.len(), 20);
        for call in first_calls.iter() {
            let waited = call.duration_since(started);
            assert!(
                waited >= Duration::from_secs(2) && waited <= Duration::from_secs(5),
                "first call after {waited:?}"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_any_task_leaves_waiting_cancels_everything() {
        let mut connector = MockChainConnector::new();
        connector.expect_native_balance().never();
        connector.expect_submit().never();

        let (events, mut receiver) = EventSink::channel(64);
        let scheduler = Scheduler::new(
            Arc::new(connector),
            native_plan(100, 200, FeeConfig::Auto),
        )
        .with_event_sink(events);

        let handle = scheduler.start(credentials(5)).expect("started");
        assert!(handle.request_stop());
        let started = Instant::now();
        let run = handle.wait().await;

        assert!(run.stopped);
        assert_eq!(run.len(), 5);
        assert!(run
            .outcomes
            .iter()
            .all(|outcome| outcome.status == OutcomeStatus::Cancelled));
        // Pending waits end early.
        assert!(started.elapsed() < Duration::from_secs(100));

        let events = drain(&mut receiver);
        assert!(events
            .iter()
            .all(|event| !event.message.starts_with("Submitting")));
    }

    #[tokio::test(start_paused = true)]
    async fn second_stop_request_has_no_further_effect() {
        let (events, mut receiver) = EventSink::channel(64);
        let scheduler = Scheduler::new(
            Arc::new(MockChainConnector::new()),
            native_plan(10, 20, FeeConfig::Auto),
        )
        .with_event_sink(events);

        let handle = scheduler.start(credentials(2)).expect("started");
        let stopper = handle.stopper();
        assert!(handle.request_stop());
        assert!(!stopper.request_stop());
        assert!(!handle.request_stop());
        let run = handle.wait().await;

        assert_eq!(run.summary().get("cancelled"), Some(&2));
        let stop_warnings = drain(&mut receiver)
            .into_iter()
            .filter(|event| event.account.is_none() && event.severity == Severity::Warning)
            .count();
        assert_eq!(stop_warnings, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_balance_never_reaches_fee_estimation() {
        let mut connector = MockChainConnector::new();
        connector
            .expect_native_balance()
            .times(1)
            .returning(|_| Ok(U256::ZERO));
        connector.expect_fee_hint().never();
        connector.expect_sequence_number().never();
        connector.expect_submit().never();

        let run = Scheduler::new(Arc::new(connector), native_plan(1, 2, FeeConfig::Auto))
            .run(credentials(1))
            .await
            .expect("batch ran");
        assert_eq!(run.outcomes[0].status, OutcomeStatus::SkippedZeroBalance);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_stay_local_to_their_task() {
        let credentials = credentials(3);
        let failing = credentials[1].account();
        let input: Vec<Address> = credentials.iter().map(Credential::account).collect();

        let mut connector = MockChainConnector::new();
        connector.expect_native_balance().returning(move |account| {
            if account == failing {
                Err(NetworkError::transient("connection reset"))
            } else {
                Ok(U256::from(1_000_000u64))
            }
        });
        connector.expect_fee_hint().returning(|| Ok(1));
        connector.expect_sequence_number().returning(|_| Ok(0));
        connector
            .expect_submit()
            .times(2)
            .returning(|_| Ok(TxHash::repeat_byte(7)));
        connector.expect_await_confirmation().returning(Ok);

        let (events, mut receiver) = EventSink::channel(64);
        let run = Scheduler::new(Arc::new(connector), native_plan(1, 3, FeeConfig::Auto))
            .with_event_sink(events)
            .run(credentials)
            .await
            .expect("batch ran");

        let accounts: Vec<Address> = run.outcomes.iter().map(|o| o.account).collect();
        assert_eq!(accounts, input);
        assert!(run.outcomes[0].status.is_success());
        assert_matches!(
            &run.outcomes[1].status,
            OutcomeStatus::Failed(reason) if reason.contains("connection reset")
        );
        assert!(run.outcomes[2].status.is_success());

        let events = drain(&mut receiver);
        for account in &input {
            let account_ref = crate::credential::short_address(account);
            let own: Vec<_> = events
                .iter()
                .filter(|event| event.account.as_deref() == Some(account_ref.as_str()))
                .collect();
            assert!(own.first().is_some_and(|e| e.message.starts_with("Waiting")));
            assert!(own.len() >= 2);
        }
        assert_eq!(
            events
                .iter()
                .filter(|event| event.message.starts_with("Submitting"))
                .count(),
            2
        );
        assert!(events.iter().any(|event| event.severity == Severity::Success
            && event.message.contains("https://bscscan.com/tx/")));
    }

    /// Panics on every balance read of one account and reports zero for the rest.
    struct PanickingConnector {
        account: Address,
    }

    #[async_trait::async_trait]
    impl ChainConnector for PanickingConnector {
        async fn native_balance(&self, account: Address) -> Result<U256, NetworkError> {
            if account == self.account {
                panic!("balance decoding bug");
            }
            Ok(U256::ZERO)
        }

        async fn token_balance(&self, _: Address, _: Address) -> Result<U256, NetworkError> {
            unreachable!("native batch")
        }

        async fn fee_hint(&self) -> Result<u128, NetworkError> {
            unreachable!("zero balances")
        }

        async fn sequence_number(&self, _: Address) -> Result<u64, NetworkError> {
            unreachable!("zero balances")
        }

        async fn estimate_gas(
            &self,
            _: alloy::rpc::types::TransactionRequest,
        ) -> Result<u64, NetworkError> {
            unreachable!("native batch")
        }

        async fn submit(&self, _: Calldata) -> Result<TxHash, NetworkError> {
            unreachable!("zero balances")
        }

        async fn await_confirmation(&self, _: TxHash) -> Result<TxHash, NetworkError> {
            unreachable!("zero balances")
        }

        async fn token_metadata(&self, _: Address) -> Result<(String, u8), NetworkError> {
            unreachable!("native batch")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_task_fails_alone() {
        let credentials = credentials(3);
        let connector = PanickingConnector {
            account: credentials[0].account(),
        };

        let run = Scheduler::new(Arc::new(connector), native_plan(1, 1, FeeConfig::Auto))
            .run(credentials)
            .await
            .expect("batch ran");

        assert_eq!(
            run.outcomes[0].status,
            OutcomeStatus::Failed("task panicked".to_string())
        );
        assert_eq!(run.outcomes[1].status, OutcomeStatus::SkippedZeroBalance);
        assert_eq!(run.outcomes[2].status, OutcomeStatus::SkippedZeroBalance);
    }

    #[tokio::test]
    async fn empty_or_duplicate_credentials_are_rejected() {
        let scheduler = Scheduler::new(
            Arc::new(MockChainConnector::new()),
            native_plan(1, 2, FeeConfig::Auto),
        );
        assert_matches!(
            scheduler.start(Vec::new()).err(),
            Some(Error::InvalidConfiguration(_))
        );

        let mut duplicated = credentials(2);
        duplicated.push(duplicated[0].clone());
        assert_matches!(
            scheduler.start(duplicated).err(),
            Some(Error::InvalidConfiguration(_))
        );
    }
}
