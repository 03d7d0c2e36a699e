// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Error handling. */

use {std::path::PathBuf, thiserror::Error};

/// Primary crate error type.
#[derive(Debug, Error)]
pub enum DebianError {
    #[error("hex parsing error: {0:?}")]
    Hex(#[from] hex::FromHexError),

    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("integer parsing error: {0:?}")]
    ParseInt(#[from] std::num::ParseIntError),

    #[error("control file parse error: {0}")]
    ControlParseError(String),

    #[error("required field missing in control file: {0}")]
    ControlRequiredFieldMissing(String),

    #[error("field {0} must be a single line")]
    ControlSimpleValueNoMultiline(String),

    #[error("expected 1 paragraph in source control file; got {0}")]
    DebianSourceControlFileParagraphMismatch(usize),

    #[error("the Source field is empty")]
    DebianSourceControlEmptySource,

    #[error("required field missing in Package-List entry: {0}")]
    ControlPackageListMissingField(&'static str),

    #[error("digest missing from checksum entry")]
    ChecksumEntryMissingDigest,

    #[error("size missing from checksum entry")]
    ChecksumEntryMissingSize,

    #[error("path missing from checksum entry")]
    ChecksumEntryMissingPath,

    #[error("checksum entry path unexpectedly has spaces: {0}")]
    ChecksumEntryPathWithSpaces(String),

    #[error("bad hex digest {0}: {1:?}")]
    ContentDigestBadHex(String, hex::FromHexError),

    #[error("failed to parse dependency expression: {0}")]
    DependencyParse(String),

    #[error("failed to parse architecture: {0}")]
    ArchitectureParse(String),

    #[error("the epoch component has non-digit characters: {0}")]
    EpochNonNumeric(String),

    #[error("upstream_version component has illegal character: {0}")]
    UpstreamVersionIllegalChar(String),

    #[error("upstream_version component is empty: {0}")]
    UpstreamVersionEmpty(String),

    #[error("debian_revision component has illegal character: {0}")]
    DebianRevisionIllegalChar(String),

    #[error("destination exists and is not a directory: {}", .0.display())]
    InvalidDestination(PathBuf),

    #[error("destination would overwrite the source file {}", .0.display())]
    DestinationIsSource(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    IoTransfer {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("size mismatch on {}: expected {expected}, got {actual}", path.display())]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("digest mismatch on {}: expected {expected}, got {actual}", path.display())]
    DigestMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("build dependency cycle detected: {}", .0.join(" -> "))]
    CycleDetected(Vec<String>),

    #[error("binary package {binary} is produced by both {first} and {second}")]
    DuplicateBinaryProvider {
        binary: String,
        first: String,
        second: String,
    },

    #[error("source package {0} appears more than once")]
    DuplicateSource(String),

    #[error("build graph has no node with index {0}")]
    BuildGraphUnknownNode(usize),
}

impl DebianError {
    /// Construct an [DebianError::IoTransfer] bound to a path.
    pub fn io_transfer(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoTransfer {
            path: path.into(),
            source,
        }
    }
}

/// Result wrapper for this crate.
pub type Result<T> = std::result::Result<T, DebianError>;
