//! Rotation-aware tailing of a single log file.
//!
//! [`LogTailer::poll`] is a deterministic, synchronous read of everything new
//! since the previous call; the caller owns the cadence. Rotation is detected
//! by comparing the inode behind the path against the inode of the open
//! handle, and the old handle is drained before switching so lines written
//! just before the swap are not lost. Uses synchronous `std::fs` since these
//! are quick local operations.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Seek, SeekFrom};
use std::mem;
use std::path::PathBuf;

use tracing::{info, warn};

/// Longest line carried through; anything bigger is dropped.
const MAX_LINE_LEN: usize = 1_048_576; // 1 MB safety limit.

/// Errors from polling the watched file.
#[derive(Debug, thiserror::Error)]
pub enum TailError {
    /// The file exists but could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        /// Path being watched.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The path could not be stat'ed for rotation detection.
    #[error("failed to stat {path}: {source}")]
    Metadata {
        /// Path being watched.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Seeking or reading the open handle failed.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path being watched.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// What a stat of the watched path revealed about the open handle.
enum Probe {
    /// Same file, nothing suspicious.
    Unchanged,
    /// Same file but shorter than what we already read (copytruncate).
    Truncated,
    /// The path now points at a different file (rotation by rename/recreate).
    Replaced,
    /// The path is gone.
    Removed,
}

/// An open handle onto the watched file.
#[derive(Debug)]
struct OpenFile {
    reader: BufReader<File>,
    inode: u64,
    /// Read position after the last drain, for truncation detection.
    offset: u64,
}

/// Follows one log file across rotation, truncation and deletion, yielding
/// complete lines.
///
/// Nothing is opened until the first [`poll`](LogTailer::poll). A trailing
/// line that has no newline yet is buffered across polls and reported only
/// once it completes, so callers never see half-written lines.
#[derive(Debug)]
pub struct LogTailer {
    path: PathBuf,
    open: Option<OpenFile>,
    partial: String,
    /// Seek past pre-existing content on the first attach only.
    skip_existing: bool,
}

impl LogTailer {
    /// Create a tailer for `path`.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            open: None,
            partial: String::new(),
            skip_existing: true,
        }
    }

    /// Whether a file handle is currently open.
    ///
    /// Callers typically retry sooner while detached (waiting for the file
    /// to appear) and poll at the normal cadence while attached.
    pub fn is_attached(&self) -> bool {
        self.open.is_some()
    }

    /// Read every complete line that appeared since the last call.
    ///
    /// Handles attaching (first sight of the file), rotation (drain the old
    /// handle, then read the replacement from its start), deletion (drain,
    /// then stay detached until the path reappears), and truncation (restart
    /// from the top). The very first attach seeks to the end of the file:
    /// history from before the watcher started is not reported.
    ///
    /// # Errors
    ///
    /// Returns a [`TailError`] on I/O failure. The tailer stays usable; the
    /// next poll continues from a consistent state.
    pub fn poll(&mut self) -> Result<Vec<String>, TailError> {
        let mut lines = Vec::new();

        let probe = match &self.open {
            None => None,
            Some(open) => Some(self.probe(open.inode, open.offset)?),
        };

        match probe {
            None => {
                if !self.try_attach()? {
                    return Ok(lines);
                }
            }
            Some(Probe::Unchanged) => {}
            Some(Probe::Truncated) => {
                info!(path = %self.path.display(), "log file truncated, restarting from the top");
                self.rewind()?;
            }
            Some(Probe::Replaced) => {
                info!(path = %self.path.display(), "log file replaced, reopening");
                self.drain(&mut lines)?;
                self.flush_partial(&mut lines);
                self.open = None;
                if !self.try_attach()? {
                    return Ok(lines);
                }
            }
            Some(Probe::Removed) => {
                info!(path = %self.path.display(), "log file removed, waiting for it to reappear");
                self.drain(&mut lines)?;
                self.flush_partial(&mut lines);
                self.open = None;
                return Ok(lines);
            }
        }

        self.drain(&mut lines)?;
        Ok(lines)
    }

    /// Stat the path and classify it against the open handle.
    fn probe(&self, inode: u64, offset: u64) -> Result<Probe, TailError> {
        match std::fs::metadata(&self.path) {
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(Probe::Removed),
            Err(source) => Err(TailError::Metadata {
                path: self.path.clone(),
                source,
            }),
            Ok(metadata) if file_id(&metadata) != inode => Ok(Probe::Replaced),
            Ok(metadata) if metadata.len() < offset => Ok(Probe::Truncated),
            Ok(_) => Ok(Probe::Unchanged),
        }
    }

    /// Open the path if it exists. Returns whether a handle is now open.
    fn try_attach(&mut self) -> Result<bool, TailError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(source) if source.kind() == ErrorKind::NotFound => {
                // Whatever shows up later is new content; read it from the start.
                self.skip_existing = false;
                return Ok(false);
            }
            Err(source) => {
                return Err(TailError::Open {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let metadata = file.metadata().map_err(|source| TailError::Metadata {
            path: self.path.clone(),
            source,
        })?;
        let inode = file_id(&metadata);

        let mut reader = BufReader::new(file);
        let offset = if self.skip_existing {
            reader
                .seek(SeekFrom::End(0))
                .map_err(|source| TailError::Read {
                    path: self.path.clone(),
                    source,
                })?
        } else {
            0
        };
        self.skip_existing = false;

        info!(path = %self.path.display(), "tailing log file");
        self.open = Some(OpenFile {
            reader,
            inode,
            offset,
        });
        Ok(true)
    }

    /// Restart from the top of the current handle after a truncation.
    fn rewind(&mut self) -> Result<(), TailError> {
        let path = self.path.clone();
        if let Some(open) = self.open.as_mut() {
            open.reader
                .seek(SeekFrom::Start(0))
                .map_err(|source| TailError::Read { path, source })?;
            open.offset = 0;
        }
        self.partial.clear();
        Ok(())
    }

    /// Read complete lines from the open handle into `lines`, buffering a
    /// trailing unterminated line for a later poll.
    fn drain(&mut self, lines: &mut Vec<String>) -> Result<(), TailError> {
        let path = self.path.clone();
        let Some(open) = self.open.as_mut() else {
            return Ok(());
        };

        let mut chunk = String::new();
        loop {
            chunk.clear();
            let bytes_read =
                open.reader
                    .read_line(&mut chunk)
                    .map_err(|source| TailError::Read {
                        path: path.clone(),
                        source,
                    })?;
            if bytes_read == 0 {
                break;
            }

            if chunk.ends_with('\n') {
                let mut line = mem::take(&mut self.partial);
                line.push_str(&chunk);
                line.truncate(line.trim_end_matches(['\r', '\n']).len());
                if line.len() > MAX_LINE_LEN {
                    continue;
                }
                lines.push(line);
            } else {
                self.partial.push_str(&chunk);
                if self.partial.len() > MAX_LINE_LEN {
                    warn!(path = %path.display(), "dropping oversized unterminated line");
                    self.partial.clear();
                }
            }
        }

        open.offset = open
            .reader
            .stream_position()
            .map_err(|source| TailError::Read { path, source })?;
        Ok(())
    }

    /// Emit the buffered unterminated line. Used when the file it came from
    /// is going away and its newline will never arrive.
    fn flush_partial(&mut self, lines: &mut Vec<String>) {
        if !self.partial.is_empty() {
            let mut line = mem::take(&mut self.partial);
            line.truncate(line.trim_end_matches('\r').len());
            lines.push(line);
        }
    }
}

/// Identity of the file behind a metadata record, for rotation detection.
#[cfg(unix)]
fn file_id(metadata: &std::fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.ino()
}

/// Without inode identity, rotation by replacement goes undetected;
/// truncation detection still works.
#[cfg(not(unix))]
fn file_id(_metadata: &std::fs::Metadata) -> u64 {
    0
}
