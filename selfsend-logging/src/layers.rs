// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::{
    appender,
    error::{Error, Result},
    LogFormat, LogOutputDest,
};
use std::collections::BTreeMap;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_core::{Event, Level, Subscriber};
use tracing_subscriber::{
    filter::Targets,
    fmt::{
        self as tracing_fmt,
        format::Writer,
        time::{FormatTime, SystemTime},
        FmtContext, FormatEvent, FormatFields,
    },
    layer::Filter,
    registry::LookupSpan,
    reload::{self, Handle},
    Layer, Registry,
};

/// Environment variable holding the CSV of logging targets.
pub const SELFSEND_LOG_ENV: &str = "SELFSEND_LOG";

const MAX_LOG_SIZE: usize = 20 * 1024 * 1024;
const MAX_UNCOMPRESSED_LOG_FILES: usize = 10;
const MAX_LOG_FILES: usize = 1000;
// Every workspace crate at TRACE
const ALL_SELFSEND_LOGS: &str = "all";
// TRACE for our crates, DEBUG for the rpc stack underneath
const VERBOSE_SELFSEND_LOGS: &str = "v";

const WORKSPACE_TARGETS: [&str; 2] = ["selfsend", "selfsend_logging"];
const RPC_STACK_TARGETS: [&str; 3] = ["alloy_provider", "alloy_rpc_client", "alloy_transport_http"];

/// Handle that implements functions to change the log level on the fly.
pub struct ReloadHandle(pub(crate) Handle<Box<dyn Filter<Registry> + Send + Sync>, Registry>);

impl ReloadHandle {
    /// Modify the log level to the provided CSV value
    /// Example input: `alloy_provider=DEBUG,all,selfsend=INFO`
    ///
    /// An explicitly listed target wins over the level a keyword would have given it.
    pub fn modify_log_level(&self, logging_value: &str) -> Result<()> {
        let targets: Vec<(String, Level)> = get_logging_targets(logging_value)?;
        self.0.modify(|old_filter| {
            let new_filter: Box<dyn Filter<Registry> + Send + Sync> =
                Box::new(Targets::new().with_targets(targets));
            *old_filter = new_filter;
        })?;

        Ok(())
    }
}

/// `[time LEVEL module/span/span] message fields`
#[derive(Default)]
pub(crate) struct LogFormatter;

impl<S, N> FormatEvent<S, N> for LogFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let level = *event.metadata().level();
        let module = event.metadata().module_path().unwrap_or("<unknown module>");
        let time = SystemTime;

        write!(writer, "[")?;
        time.format_time(&mut writer)?;
        write!(writer, " {level} {module}")?;
        ctx.visit_spans(|span| write!(writer, "/{}", span.name()))?;
        write!(writer, "] ")?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// The layers composed into the global subscriber.
#[derive(Default)]
pub(crate) struct TracingLayers {
    pub(crate) layers: Vec<Box<dyn Layer<Registry> + Send + Sync>>,
    pub(crate) log_appender_guard: Option<WorkerGuard>,
}

impl TracingLayers {
    pub(crate) fn fmt_layer(
        &mut self,
        default_logging_targets: Vec<(String, Level)>,
        output_dest: &LogOutputDest,
        format: LogFormat,
        max_uncompressed_log_files: Option<usize>,
        max_compressed_log_files: Option<usize>,
    ) -> Result<ReloadHandle> {
        let layer = match output_dest {
            LogOutputDest::Stdout => {
                println!("Logging to stdout");
                tracing_fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .event_format(LogFormatter)
                    .boxed()
            }
            LogOutputDest::Stderr => tracing_fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .event_format(LogFormatter)
                .with_writer(std::io::stderr)
                .boxed(),
            LogOutputDest::Path(path) => {
                std::fs::create_dir_all(path)?;
                println!("Logging to directory: {path:?}");

                let max_uncompressed_log_files =
                    max_uncompressed_log_files.unwrap_or(MAX_UNCOMPRESSED_LOG_FILES);
                // total files, so always more than the uncompressed ones
                let max_log_files = match max_compressed_log_files {
                    Some(compressed) => compressed + max_uncompressed_log_files,
                    None => std::cmp::max(max_uncompressed_log_files, MAX_LOG_FILES),
                };
                let (file_rotation, worker_guard) = appender::file_rotater(
                    path,
                    MAX_LOG_SIZE,
                    max_uncompressed_log_files,
                    max_log_files,
                );
                self.log_appender_guard = Some(worker_guard);

                match format {
                    LogFormat::Json => tracing_fmt::layer()
                        .json()
                        .flatten_event(true)
                        .with_writer(file_rotation)
                        .boxed(),
                    LogFormat::Default => tracing_fmt::layer()
                        .with_ansi(false)
                        .with_writer(file_rotation)
                        .event_format(LogFormatter)
                        .boxed(),
                }
            }
        };

        let targets = match std::env::var(SELFSEND_LOG_ENV) {
            Ok(log_val) => {
                println!("Using {SELFSEND_LOG_ENV}={log_val}");
                get_logging_targets(&log_val)?
            }
            Err(_) => default_logging_targets,
        };

        let target_filters: Box<dyn Filter<Registry> + Send + Sync> =
            Box::new(Targets::new().with_targets(targets));
        let (filter, reload_handle) = reload::Layer::new(target_filters);

        let layer = layer.with_filter(filter);
        self.layers.push(Box::new(layer));

        Ok(ReloadHandle(reload_handle))
    }
}

/// Parses a CSV of logging targets, e.g. `selfsend=DEBUG,alloy_provider=WARN` or `all`.
pub(crate) fn get_logging_targets(logging_env_value: &str) -> Result<Vec<(String, Level)>> {
    let mut targets = BTreeMap::new();
    let mut all_keyword = false;
    let mut verbose_keyword = false;

    for crate_log_level in logging_env_value.split(',').map(str::trim) {
        if crate_log_level.is_empty() {
            continue;
        }
        if crate_log_level == ALL_SELFSEND_LOGS {
            all_keyword = true;
            continue;
        } else if crate_log_level == VERBOSE_SELFSEND_LOGS {
            verbose_keyword = true;
            continue;
        }

        let mut split = crate_log_level.split('=');
        let crate_name = split.next().ok_or_else(|| {
            Error::LoggingConfiguration("Could not obtain crate name in logging string".to_string())
        })?;
        let log_level = split.next().unwrap_or("trace");
        targets.insert(crate_name.to_string(), get_log_level_from_str(log_level)?);
    }

    let mut keyword_targets = BTreeMap::new();
    if all_keyword || verbose_keyword {
        for target in WORKSPACE_TARGETS {
            keyword_targets.insert(target.to_string(), Level::TRACE);
        }
        let rpc_level = if all_keyword {
            Level::TRACE
        } else {
            Level::DEBUG
        };
        for target in RPC_STACK_TARGETS {
            keyword_targets.insert(target.to_string(), rpc_level);
        }
    }

    keyword_targets.extend(targets);
    Ok(keyword_targets.into_iter().collect())
}

fn get_log_level_from_str(log_level: &str) -> Result<Level> {
    match log_level.to_lowercase().as_str() {
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(Error::LoggingConfiguration(format!(
            "Log level {log_level} is not supported"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_targets_are_parsed_with_levels() -> color_eyre::Result<()> {
        let targets = get_logging_targets("selfsend=debug, alloy_provider=WARN")?;
        assert_eq!(
            targets,
            vec![
                ("alloy_provider".to_string(), Level::WARN),
                ("selfsend".to_string(), Level::DEBUG),
            ]
        );
        Ok(())
    }

    #[test]
    fn missing_level_defaults_to_trace() -> color_eyre::Result<()> {
        let targets = get_logging_targets("selfsend")?;
        assert_eq!(targets, vec![("selfsend".to_string(), Level::TRACE)]);
        Ok(())
    }

    #[test]
    fn explicit_target_overrides_keyword() -> color_eyre::Result<()> {
        let targets = get_logging_targets("all,selfsend=INFO")?;
        let selfsend = targets
            .iter()
            .find(|(target, _)| target == "selfsend")
            .map(|(_, level)| *level);
        assert_eq!(selfsend, Some(Level::INFO));
        assert!(targets.contains(&("alloy_provider".to_string(), Level::TRACE)));
        Ok(())
    }

    #[test]
    fn verbose_keyword_keeps_rpc_stack_at_debug() -> color_eyre::Result<()> {
        let targets = get_logging_targets("v")?;
        assert!(targets.contains(&("alloy_provider".to_string(), Level::DEBUG)));
        assert!(targets.contains(&("selfsend".to_string(), Level::TRACE)));
        Ok(())
    }

    #[test]
    fn error_level_is_not_downgraded() -> color_eyre::Result<()> {
        let targets = get_logging_targets("selfsend=error")?;
        assert_eq!(targets, vec![("selfsend".to_string(), Level::ERROR)]);
        Ok(())
    }

    #[test]
    fn unknown_level_is_rejected() {
        assert!(get_logging_targets("selfsend=loud").is_err());
    }
}
