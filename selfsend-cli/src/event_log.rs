// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use chrono::Local;
use color_eyre::eyre::{eyre, Context, Result};
use colored::Colorize;
use selfsend::{Severity, TransferEvent};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Which events are printed while a batch runs. Every event is kept regardless.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub severity: Option<Severity>,
    pub keyword: Option<String>,
}

impl LogFilter {
    pub fn matches(&self, event: &TransferEvent) -> bool {
        if self.severity.is_some_and(|severity| severity != event.severity) {
            return false;
        }
        match &self.keyword {
            Some(keyword) => {
                let keyword = keyword.to_lowercase();
                event.message.to_lowercase().contains(&keyword)
                    || event
                        .account
                        .as_ref()
                        .is_some_and(|account| account.to_lowercase().contains(&keyword))
            }
            None => true,
        }
    }
}

/// `all`, `info`, `success`, `warning` or `error`.
pub fn parse_severity_filter(value: &str) -> Result<Option<Severity>> {
    match value.trim().to_lowercase().as_str() {
        "all" => Ok(None),
        "info" => Ok(Some(Severity::Info)),
        "success" => Ok(Some(Severity::Success)),
        "warning" | "warn" => Ok(Some(Severity::Warning)),
        "error" => Ok(Some(Severity::Error)),
        other => Err(eyre!(
            "Unknown severity {other:?}, expected all, info, success, warning or error"
        )),
    }
}

/// Every event received during a batch, in arrival order.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<TransferEvent>,
}

impl EventLog {
    pub fn push(&mut self, event: TransferEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn counts(&self) -> BTreeMap<Severity, usize> {
        let mut counts: BTreeMap<Severity, usize> =
            Severity::ALL.iter().map(|severity| (*severity, 0)).collect();
        for event in &self.events {
            *counts.entry(event.severity).or_insert(0) += 1;
        }
        counts
    }

    /// Writes every event to `transaction_logs_<timestamp>.txt` inside `dir`.
    pub fn export(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir).wrap_err_with(|| format!("Failed to create {dir:?}"))?;
        let file_name = format!(
            "transaction_logs_{}.txt",
            Local::now().format("%Y-%m-%dT%H-%M-%S")
        );
        let path = dir.join(file_name);
        let mut text = String::new();
        for event in &self.events {
            text.push_str(&event.to_string());
            text.push('\n');
        }
        fs::write(&path, text).wrap_err_with(|| format!("Failed to write log to {path:?}"))?;
        info!("Exported {} events to {path:?}", self.events.len());
        Ok(path)
    }
}

pub fn print_event(event: &TransferEvent) {
    let line = event.to_string();
    let line = match event.severity {
        Severity::Info => line.normal(),
        Severity::Success => line.green(),
        Severity::Warning => line.yellow(),
        Severity::Error => line.red(),
    };
    println!("{line}");
}

/// Collects events from the receiver, printing those that pass the filter.
/// Send a signal to the returned sender to stop collecting and to return the log via the
/// join handle.
pub fn collect_events(
    mut event_receiver: mpsc::Receiver<TransferEvent>,
    filter: LogFilter,
) -> (JoinHandle<EventLog>, oneshot::Sender<()>) {
    let (completed_tx, mut completed_rx) = oneshot::channel::<()>();
    let collector = tokio::spawn(async move {
        let mut log = EventLog::default();
        loop {
            tokio::select! {
                event = event_receiver.recv() => match event {
                    Some(event) => {
                        if filter.matches(&event) {
                            print_event(&event);
                        }
                        log.push(event);
                    }
                    None => break,
                },
                _ = &mut completed_rx => break,
            }
        }

        // drain anything sent before the completion signal
        while let Ok(event) = event_receiver.try_recv() {
            if filter.matches(&event) {
                print_event(&event);
            }
            log.push(event);
        }
        log
    });
    (collector, completed_tx)
}
