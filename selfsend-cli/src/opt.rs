// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::commands::SubCmd;
use selfsend_logging::{LogFormat, LogOutputDest};
use clap::Parser;

// Please do not remove the blank lines in these doc comments.
// They are used for inserting line breaks when the help menu is rendered in the UI.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Opt {
    /// Available sub commands.
    #[clap(subcommand)]
    pub command: SubCmd,

    /// Specify the logging format.
    ///
    /// Valid values are "default" or "json".
    ///
    /// If the argument is not used, the default format will be applied.
    #[clap(long, global = true, value_parser = LogFormat::parse_from_str, verbatim_doc_comment)]
    pub log_format: Option<LogFormat>,

    /// Specify the logging output destination.
    ///
    /// Valid values are "stdout", "stderr", "data-dir", or a custom path.
    ///
    /// `data-dir` is the default value.
    ///
    /// The data directory location is platform specific:
    ///  - Linux: $HOME/.local/share/selfsend/logs
    ///  - macOS: $HOME/Library/Application Support/selfsend/logs
    ///  - Windows: C:\Users\<username>\AppData\Roaming\selfsend\logs
    #[allow(rustdoc::invalid_html_tags)]
    #[clap(long, global = true, value_parser = LogOutputDest::parse_from_str, verbatim_doc_comment, default_value = "data-dir")]
    pub log_output_dest: LogOutputDest,

    /// Override the logging targets, as a CSV of target=level pairs.
    ///
    /// Applied on top of the SELFSEND_LOG env var once logging has started. The keyword "all"
    /// enables the selfsend crates and the RPC stack at TRACE, "v" keeps the RPC stack at DEBUG.
    ///
    /// Example: "selfsend=DEBUG,alloy_provider=TRACE"
    #[clap(long, global = true, verbatim_doc_comment)]
    pub log_targets: Option<String>,

    /// Specify the maximum number of uncompressed log files to store.
    ///
    /// After that many files are reached, the older ones are compressed.
    #[clap(long, global = true, verbatim_doc_comment)]
    pub max_log_files: Option<usize>,

    /// Specify the maximum number of compressed log files to store.
    ///
    /// Once reached, the oldest compressed file is removed.
    #[clap(long, global = true, verbatim_doc_comment)]
    pub max_archived_log_files: Option<usize>,
}
