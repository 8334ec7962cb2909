// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

#[macro_use]
extern crate tracing;

mod access;
mod commands;
mod event_log;
mod opt;

use clap::Parser;
use color_eyre::{eyre::Context, Result, Section};

use opt::Opt;
use selfsend_logging::{Level, LogBuilder, LogFormat, ReloadHandle, WorkerGuard};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let opt = Opt::parse();
    let _log_guards = init_logging(&opt)?;

    info!("\"{}\"", redacted_invocation(std::env::args()));
    info!("selfsend {}", env!("CARGO_PKG_VERSION"));

    commands::handle_subcommand(opt).await
}

/// Arguments whose value is a secret and must never reach the logs.
const SECRET_ARGS: [&str; 1] = ["--mnemonic"];
const REDACTED: &str = "<redacted>";

/// The command line as typed, with the values of [`SECRET_ARGS`] replaced.
fn redacted_invocation(args: impl IntoIterator<Item = String>) -> String {
    let mut redact_next = false;
    args.into_iter()
        .map(|arg| {
            if redact_next {
                redact_next = false;
                return REDACTED.to_string();
            }
            if SECRET_ARGS.contains(&arg.as_str()) {
                redact_next = true;
                return arg;
            }
            match arg.split_once('=') {
                Some((flag, _)) if SECRET_ARGS.contains(&flag) => format!("{flag}={REDACTED}"),
                _ => arg,
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn init_logging(opt: &Opt) -> Result<(ReloadHandle, Option<WorkerGuard>)> {
    let logging_targets = vec![
        ("selfsend".to_string(), Level::TRACE),
        ("selfsend_logging".to_string(), Level::TRACE),
    ];
    let mut log_builder = LogBuilder::new(logging_targets);
    log_builder.output_dest(opt.log_output_dest.clone());
    log_builder.format(opt.log_format.unwrap_or(LogFormat::Default));
    if let Some(files) = opt.max_log_files {
        log_builder.max_log_files(files);
    }
    if let Some(files) = opt.max_archived_log_files {
        log_builder.max_archived_log_files(files);
    }
    let (reload_handle, guard) = log_builder.initialize()?;

    if let Some(targets) = &opt.log_targets {
        reload_handle
            .modify_log_level(targets)
            .wrap_err_with(|| format!("Invalid --log-targets value {targets:?}"))
            .with_suggestion(|| r#"expected e.g. "selfsend=DEBUG,alloy_provider=TRACE" or "all""#)?;
        info!("Log targets changed to {targets}");
    }
    Ok((reload_handle, guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str = "test test test test test test test test test test test junk";

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn logged_invocation_hides_the_mnemonic() {
        let logged = redacted_invocation(args(&[
            "selfsend",
            "accounts",
            "--mnemonic",
            PHRASE,
            "--mnemonic-count",
            "2",
        ]));
        assert_eq!(
            logged,
            "selfsend accounts --mnemonic <redacted> --mnemonic-count 2"
        );
        assert!(!logged.contains("junk"));

        let inline = format!("--mnemonic={PHRASE}");
        let logged = redacted_invocation(args(&["selfsend", "run", &inline]));
        assert_eq!(logged, "selfsend run --mnemonic=<redacted>");
    }

    #[test]
    fn other_arguments_are_logged_as_typed() {
        let logged = redacted_invocation(args(&["selfsend", "run", "--network", "bsc"]));
        assert_eq!(logged, "selfsend run --network bsc");
    }
}
