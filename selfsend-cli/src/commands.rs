// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

mod accounts;
mod catalog;
mod run;
mod settings;

use crate::opt::Opt;
use clap::{Args, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum SubCmd {
    /// Run one randomized self-transfer per account.
    ///
    /// Every account waits a random delay, then sends a random share of its balance to itself.
    /// Press Ctrl-C once to cancel the transfers that have not started yet and wait for the
    /// others to finish. Press it again to exit immediately, without waiting for
    /// confirmations.
    Run(RunArgs),

    /// List the accounts a key source resolves to, without touching the network.
    Accounts {
        #[command(flatten)]
        keys: KeySourceArgs,
    },

    /// List the built-in networks.
    Networks,

    /// List the well known tokens of a network.
    Tokens {
        /// Network identifier, name or chain id.
        network: String,
    },

    /// Show or change the stored defaults.
    Settings {
        #[command(subcommand)]
        command: SettingsCmd,
    },
}

#[derive(Args, Debug)]
pub struct NetworkArgs {
    /// Built-in network identifier, name or chain id, e.g. "bsc" or "56".
    ///
    /// Falls back to the EVM_NETWORK, RPC_URL and CHAIN_ID env vars.
    #[arg(long)]
    pub network: Option<String>,

    /// RPC endpoint, overriding the network's default.
    #[arg(long)]
    pub rpc_url: Option<String>,

    /// Chain id of a custom network. Requires --rpc-url.
    #[arg(long, requires = "rpc_url")]
    pub chain_id: Option<u64>,
}

#[derive(Args, Debug)]
pub struct KeySourceArgs {
    /// File with one hex encoded private key per line.
    #[arg(long, conflicts_with = "mnemonic")]
    pub keys_file: Option<PathBuf>,

    /// Derive accounts from a BIP-39 mnemonic.
    ///
    /// Prefer the SELFSEND_MNEMONIC env var, which keeps the phrase out of the process list.
    #[arg(long, env = "SELFSEND_MNEMONIC", hide_env_values = true)]
    pub mnemonic: Option<String>,

    /// Number of accounts to derive from the mnemonic.
    #[arg(long, default_value_t = 1)]
    pub mnemonic_count: u32,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub network: NetworkArgs,

    #[command(flatten)]
    pub keys: KeySourceArgs,

    /// "native", a well known token symbol (e.g. USDT) or a token contract address.
    #[arg(long, default_value = "native")]
    pub asset: String,

    /// Minimum delay before a transfer, in seconds.
    #[arg(long)]
    pub min_delay: Option<u64>,

    /// Maximum delay before a transfer, in seconds.
    #[arg(long)]
    pub max_delay: Option<u64>,

    /// "auto" or a fixed price in gwei.
    #[arg(long)]
    pub gas_price: Option<String>,

    /// Gas limit of native transfers.
    #[arg(long)]
    pub native_gas_limit: Option<u64>,

    /// Settings file to read defaults from instead of the one in the data dir.
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Only print events of this severity: all, info, success, warning or error.
    #[arg(long, default_value = "all")]
    pub log_filter: String,

    /// Only print events containing this text.
    #[arg(long)]
    pub log_search: Option<String>,

    /// Write every event to a timestamped file in this directory when the batch ends.
    #[arg(long)]
    pub export_log: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCmd {
    /// Print the stored defaults.
    Show,

    /// Change one or more stored defaults.
    Set {
        #[arg(long)]
        min_delay: Option<u64>,
        #[arg(long)]
        max_delay: Option<u64>,
        /// "auto" or a fixed price in gwei.
        #[arg(long)]
        gas_price: Option<String>,
    },
}

pub async fn handle_subcommand(opt: Opt) -> Result<()> {
    match opt.command {
        SubCmd::Run(args) => run::run(args).await,
        SubCmd::Accounts { keys } => accounts::list(&keys),
        SubCmd::Networks => {
            catalog::networks();
            Ok(())
        }
        SubCmd::Tokens { network } => catalog::tokens(&network),
        SubCmd::Settings { command } => match command {
            SettingsCmd::Show => settings::show(),
            SettingsCmd::Set {
                min_delay,
                max_delay,
                gas_price,
            } => settings::set(min_delay, max_delay, gas_price),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn run_arguments_parse() {
        let opt = Opt::try_parse_from([
            "selfsend",
            "--log-output-dest",
            "stderr",
            "run",
            "--network",
            "bsc",
            "--keys-file",
            "keys.txt",
            "--asset",
            "USDT",
            "--min-delay",
            "5",
            "--gas-price",
            "3",
        ])
        .expect("valid arguments");

        let SubCmd::Run(args) = opt.command else {
            panic!("expected run");
        };
        assert_eq!(args.network.network.as_deref(), Some("bsc"));
        assert_eq!(args.keys.keys_file, Some(PathBuf::from("keys.txt")));
        assert_eq!(args.asset, "USDT");
        assert_eq!(args.min_delay, Some(5));
        assert_eq!(args.max_delay, None);
        assert_eq!(args.gas_price.as_deref(), Some("3"));
        assert_eq!(args.log_filter, "all");
    }

    #[test]
    fn conflicting_key_sources_are_rejected() {
        let result = Opt::try_parse_from([
            "selfsend",
            "run",
            "--keys-file",
            "keys.txt",
            "--mnemonic",
            "test test test test test test test test test test test junk",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_log_options_parse_after_the_subcommand() {
        let opt = Opt::try_parse_from([
            "selfsend",
            "networks",
            "--log-output-dest",
            "stderr",
            "--log-targets",
            "selfsend=DEBUG",
            "--max-log-files",
            "5",
            "--max-archived-log-files",
            "2",
        ])
        .expect("valid arguments");
        assert_eq!(opt.log_targets.as_deref(), Some("selfsend=DEBUG"));
        assert_eq!(opt.max_log_files, Some(5));
        assert_eq!(opt.max_archived_log_files, Some(2));
    }

    #[test]
    fn chain_id_requires_rpc_url() {
        assert!(Opt::try_parse_from(["selfsend", "run", "--chain-id", "31337"]).is_err());
        assert!(Opt::try_parse_from([
            "selfsend",
            "--log-output-dest",
            "stderr",
            "run",
            "--rpc-url",
            "http://localhost:8545",
            "--chain-id",
            "31337",
        ])
        .is_ok());
    }
}
