// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc::{self, error::TrySendError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Info,
        Severity::Success,
        Severity::Warning,
        Severity::Error,
    ];
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "INFO",
            Severity::Success => "SUCCESS",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    /// Redacted account reference, absent for batch level events.
    pub account: Option<String>,
    pub message: String,
}

impl TransferEvent {
    pub fn new(severity: Severity, account: Option<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            severity,
            account,
            message: message.into(),
        }
    }
}

impl fmt::Display for TransferEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{}] ",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.severity
        )?;
        if let Some(account) = &self.account {
            write!(f, "{account}: ")?;
        }
        write!(f, "{}", self.message)
    }
}

/// Non-blocking, append-only event delivery shared by every task of a batch.
///
/// A full buffer drops the event instead of holding up the task that produced it.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: Option<mpsc::Sender<TransferEvent>>,
}

impl EventSink {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<TransferEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    /// A sink that discards every event.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn emit(&self, severity: Severity, account: Option<&str>, message: impl Into<String>) {
        let Some(sender) = &self.sender else {
            return;
        };
        let event = TransferEvent::new(severity, account.map(str::to_string), message);
        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!("Event buffer full, dropping event: {event}");
            }
            Err(TrySendError::Closed(_)) => {
                trace!("Event receiver closed");
            }
        }
    }
}
