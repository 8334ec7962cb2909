// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use super::{NetworkArgs, RunArgs};
use crate::access::keys::load_credentials;
use crate::access::settings::{parse_gas_price, Settings};
use crate::event_log::{collect_events, parse_severity_filter, EventLog, LogFilter};
use color_eyre::eyre::{eyre, Context, Result};
use color_eyre::Section;
use colored::Colorize;
use prettytable::{Cell, Row, Table};
use selfsend::asset::{resolve_asset, AssetSpec};
use selfsend::credential::short_address;
use selfsend::scheduler::BatchStopper;
use selfsend::utils::{get_network_from_env, short_tx_hash};
use selfsend::{
    BatchRun, CustomNetwork, EventSink, EvmConnector, Network, OutcomeStatus, Scheduler,
    TimingConfig, TransferPlan,
};
use std::sync::Arc;

const EVENT_BUFFER: usize = 1024;
/// 128 + SIGINT
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    /// The first ctrl-c: transfers that have not started are cancelled.
    StopRequested,
    /// Any later ctrl-c: the process exits.
    Exit,
}

fn on_interrupt(stopper: &BatchStopper) -> Interrupt {
    if stopper.request_stop() {
        Interrupt::StopRequested
    } else {
        Interrupt::Exit
    }
}

pub async fn run(args: RunArgs) -> Result<()> {
    let settings = Settings::load(args.settings.as_deref())?;
    let timing = TimingConfig::new(
        args.min_delay.unwrap_or(settings.min_delay_secs),
        args.max_delay.unwrap_or(settings.max_delay_secs),
    )
    .wrap_err("Invalid delay range")
    .with_suggestion(|| "the minimum delay must be at least 1s and not exceed the maximum")?;
    let fee = parse_gas_price(args.gas_price.as_deref().unwrap_or(&settings.gas_price))?;
    let filter = LogFilter {
        severity: parse_severity_filter(&args.log_filter)?,
        keyword: args.log_search.clone(),
    };

    let network = resolve_network(&args.network)?;
    let credentials = load_credentials(
        args.keys.keys_file.as_deref(),
        args.keys.mnemonic.as_deref(),
        args.keys.mnemonic_count,
    )?;
    println!("Loaded {} accounts", credentials.len());

    println!("Connecting to {network}...");
    let connector = EvmConnector::connect(&network)
        .await
        .wrap_err_with(|| format!("Failed to connect to {}", network.rpc_url()))
        .with_suggestion(|| "check the RPC URL, or pass another one with --rpc-url")?;

    let asset_spec: AssetSpec = args.asset.parse()?;
    let asset = resolve_asset(&network, &asset_spec, &connector)
        .await
        .wrap_err("Failed to resolve the asset")
        .with_suggestion(|| "run `selfsend tokens <network>` to list the known tokens")?;

    let mut plan = TransferPlan::new(network, asset, timing, fee);
    if let Some(gas_limit) = args.native_gas_limit {
        plan = plan.with_native_gas_limit(gas_limit);
    }
    println!(
        "Sending {} on {} with a {}s to {}s delay",
        plan.asset,
        plan.network,
        timing.min_delay_secs(),
        timing.max_delay_secs()
    );

    let (events, event_receiver) = EventSink::channel(EVENT_BUFFER);
    let (collector, collection_done) = collect_events(event_receiver, filter);

    let handle = Scheduler::new(Arc::new(connector), plan.clone())
        .with_event_sink(events)
        .start(credentials)?;

    let stopper = handle.stopper();
    let ctrl_c = tokio::spawn(async move {
        loop {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("Listening to ctrl-c error: {err}");
                break;
            }
            match on_interrupt(&stopper) {
                Interrupt::StopRequested => println!(
                    "Stopping, waiting for in-flight transfers. Press Ctrl-C again to exit now"
                ),
                Interrupt::Exit => {
                    warn!("Second ctrl-c received, exiting without waiting for transfers");
                    eprintln!("Exiting, in-flight transfers may still be mined");
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
            }
        }
    });

    let run = handle.wait().await;
    ctrl_c.abort();
    let _ = collection_done.send(());
    let log = collector.await?;

    print_summary(&plan.network, &run, &log);

    if let Some(dir) = args.export_log {
        let path = log.export(&dir)?;
        println!("Exported {} events to {}", log.len(), path.display());
    }
    Ok(())
}

fn resolve_network(args: &NetworkArgs) -> Result<Network> {
    let network = match (&args.network, &args.rpc_url, args.chain_id) {
        (None, None, None) => get_network_from_env()
            .wrap_err("No network selected")
            .with_suggestion(|| "pass --network, e.g. --network bsc")
            .with_suggestion(|| "or pass --rpc-url together with --chain-id for a custom network")?,
        (Some(identifier), rpc_url, None) => {
            let network = Network::from_identifier(identifier)
                .with_suggestion(|| "run `selfsend networks` to list the built-in networks")?;
            match rpc_url {
                Some(rpc_url) => network.with_rpc_url(rpc_url)?,
                None => network,
            }
        }
        (None, Some(rpc_url), Some(chain_id)) => {
            Network::Custom(CustomNetwork::new(rpc_url, chain_id)?)
        }
        (Some(_), _, Some(_)) => {
            return Err(eyre!("--network and --chain-id cannot be combined"))
                .with_suggestion(|| "use --rpc-url to point a built-in network elsewhere");
        }
        (None, None, Some(_)) | (None, Some(_), None) => {
            return Err(eyre!("A custom network needs both --rpc-url and --chain-id"));
        }
    };
    info!("Using network {network} via {}", network.rpc_url());
    Ok(network)
}

fn print_summary(network: &Network, run: &BatchRun, log: &EventLog) {
    println!();
    if run.stopped {
        println!("{}", "Batch stopped".yellow());
    } else {
        println!("{}", "All transfer tasks completed".green());
    }

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Account"),
        Cell::new("Status"),
        Cell::new("Transaction"),
    ]));
    for outcome in &run.outcomes {
        let (status, transaction) = match &outcome.status {
            OutcomeStatus::Success(tx_hash) => (
                outcome.status.label().to_string(),
                network
                    .tx_explorer_url(tx_hash)
                    .unwrap_or_else(|| short_tx_hash(tx_hash)),
            ),
            OutcomeStatus::Failed(reason) => (format!("failed: {reason}"), String::new()),
            other => (other.label().to_string(), String::new()),
        };
        table.add_row(Row::new(vec![
            Cell::new(&short_address(&outcome.account)),
            Cell::new(&status),
            Cell::new(&transaction),
        ]));
    }
    table.printstd();

    let statuses: Vec<String> = run
        .summary()
        .into_iter()
        .map(|(label, count)| format!("{label}: {count}"))
        .collect();
    println!("Outcomes: {}", statuses.join(", "));

    let severities: Vec<String> = log
        .counts()
        .into_iter()
        .map(|(severity, count)| format!("{severity}: {count}"))
        .collect();
    println!("Events: {}", severities.join(", "));
}

#[cfg(test)]
mod tests {
    use super::*;
    use selfsend::{Credential, FeeConfig};

    fn network_args(
        network: Option<&str>,
        rpc_url: Option<&str>,
        chain_id: Option<u64>,
    ) -> NetworkArgs {
        NetworkArgs {
            network: network.map(str::to_string),
            rpc_url: rpc_url.map(str::to_string),
            chain_id,
        }
    }

    #[test]
    fn built_in_network_with_rpc_override() {
        let network = resolve_network(&network_args(
            Some("avalanche"),
            Some("http://localhost:9650/ext/bc/C/rpc"),
            None,
        ))
        .expect("resolved");
        assert_eq!(network.chain_id(), 43114);
        assert_eq!(network.native_symbol(), "AVAX");
    }

    #[test]
    fn custom_network_from_flags() {
        let network = resolve_network(&network_args(
            None,
            Some("http://localhost:8545"),
            Some(31337),
        ))
        .expect("resolved");
        assert_eq!(network.chain_id(), 31337);
    }

    #[test]
    fn unknown_or_contradictory_networks_fail() {
        assert!(resolve_network(&network_args(Some("solana"), None, None)).is_err());
        assert!(resolve_network(&network_args(Some("bsc"), None, Some(56))).is_err());
        assert!(resolve_network(&network_args(None, Some("http://localhost:8545"), None)).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn second_interrupt_exits() {
        let network = Network::Custom(
            CustomNetwork::new("http://localhost:8545", 31337).expect("valid url"),
        );
        let plan = TransferPlan::new(
            network.clone(),
            network.native_asset(),
            TimingConfig::new(3_600, 3_600).expect("valid timing"),
            FeeConfig::Auto,
        );
        let credentials = vec![Credential::from_private_key(&format!("{:064x}", 1))
            .expect("valid key")];
        let connector = EvmConnector::new(network.rpc_url().clone());
        let handle = Scheduler::new(Arc::new(connector), plan)
            .start(credentials)
            .expect("started");

        let stopper = handle.stopper();
        assert_eq!(on_interrupt(&stopper), Interrupt::StopRequested);
        assert_eq!(on_interrupt(&stopper), Interrupt::Exit);
        assert_eq!(on_interrupt(&stopper), Interrupt::Exit);

        let run = handle.wait().await;
        assert!(run.stopped);
        assert_eq!(run.outcomes[0].status, OutcomeStatus::Cancelled);
    }
}
