// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};
use std::{
    env,
    ffi::OsStr,
    fmt, io,
    io::Write,
    path::{Path, PathBuf},
};
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};

const FALLBACK_BINARY_NAME: &str = "selfsend";

/// Builds a non-blocking writer over a size-rotated log file inside `dir`.
///
/// `uncompressed_files` rotated files are kept as plain text, anything older is compressed,
/// and at most `max_files` files are kept in total.
pub(super) fn file_rotater(
    dir: &PathBuf,
    max_bytes: usize,
    uncompressed_files: usize,
    max_files: usize,
) -> (NonBlocking, WorkerGuard) {
    let binary_name = env::current_exe()
        .map(|path| {
            path.file_stem()
                .unwrap_or(OsStr::new(FALLBACK_BINARY_NAME))
                .to_string_lossy()
                .into_owned()
        })
        .unwrap_or_else(|_| FALLBACK_BINARY_NAME.to_string());

    let appender = RotatingFileAppender::new(
        dir,
        format!("{binary_name}.log"),
        AppendTimestamp::default(FileLimit::MaxFiles(max_files)),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::OnRotate(uncompressed_files),
    );

    // Transfer logs are the audit trail of a batch, so apply backpressure instead of dropping lines.
    NonBlockingBuilder::default()
        .lossy(false)
        .finish(appender)
}

/// Wraps `file_rotate` so it can be used as the sink of a `tracing_appender` writer.
///
/// The active file keeps its name, which allows `tail -f` on it while older files get a
/// timestamp suffix.
pub(super) struct RotatingFileAppender {
    writer: FileRotate<AppendTimestamp>,
}

impl RotatingFileAppender {
    pub(super) fn new(
        directory: impl AsRef<Path>,
        file_name: impl AsRef<Path>,
        file_limit: AppendTimestamp,
        max_log_size: ContentLimit,
        compression: Compression,
    ) -> Self {
        let path = directory.as_ref().join(file_name.as_ref());
        let writer = FileRotate::new(
            path,
            file_limit,
            max_log_size,
            compression,
            #[cfg(unix)]
            None,
        );

        Self { writer }
    }
}

impl Write for RotatingFileAppender {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl fmt::Debug for RotatingFileAppender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotatingFileAppender").finish()
    }
}
