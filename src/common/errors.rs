//! Error types for the fastq to run-folder conversion.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for fastq2bcl operations
pub type Result<T> = std::result::Result<T, Fastq2BclError>;

/// Every way a conversion can fail. None of these are recoverable per record:
/// a partially written flowcell is not a useful artifact.
#[derive(Error, Debug)]
pub enum Fastq2BclError {
    /// The sequence description does not follow the Illumina header grammar
    #[error("Sequence identifier not recognized: '{description}' ({reason})")]
    MalformedDescription {
        /// The full description line
        description: String,
        /// Which part of the grammar failed
        reason: String,
    },

    /// The grammar matched but a required field is empty
    #[error("Requested key '{field}' not found in '{description}'")]
    MissingField {
        /// Name of the missing field
        field: &'static str,
        /// The full description line
        description: String,
    },

    /// A user supplied mask that is not 1-4 `<cycles><N|Y>` segments
    #[error("Incorrect mask string: '{mask}'")]
    InvalidMask {
        /// The mask as given
        mask: String,
    },

    /// Index or UMI present in the description while I1/I2 files are given too
    #[error(
        "usage of {source_kind} from sequence description and I1/I2 files simultaneously is unsupported"
    )]
    ConflictingIndexSource {
        /// "index" or "UMI"
        source_kind: &'static str,
    },

    /// A secondary stream is out of sync with R1
    #[error("{stream} record id '{id}' does not match R1 record id '{expected}'")]
    IdentityMismatch {
        /// Which stream (R2, I1, I2)
        stream: &'static str,
        /// The offending id
        id: String,
        /// The R1 id at the same position
        expected: String,
    },

    /// A secondary stream ran out of records before R1
    #[error("{stream} file '{path}' ended before R1 (expected record '{expected}')")]
    StreamExhausted {
        /// Which stream (R2, I1, I2)
        stream: &'static str,
        /// Path of the short file
        path: PathBuf,
        /// The R1 id with no partner
        expected: String,
    },

    /// An input file does not exist
    #[error("Could not find input file '{path}'")]
    MissingInput {
        /// The path as given
        path: PathBuf,
    },

    /// An input file holds no records at all
    #[error("FASTQ file '{path}' contains no records")]
    EmptyInput {
        /// Path of the empty file
        path: PathBuf,
    },

    /// The FASTQ reader rejected a file
    #[error("Invalid FASTQ file '{path}': {reason}")]
    InvalidFastq {
        /// Path of the file
        path: PathBuf,
        /// Explanation from the reader
        reason: String,
    },

    /// A cluster coordinate that cannot be converted to a location
    #[error("Invalid cluster position '{value}'")]
    InvalidPosition {
        /// The raw coordinate
        value: String,
    },

    /// The output directory is unusable
    #[error("Output directory '{path}' {reason}")]
    OutputDir {
        /// The output directory
        path: PathBuf,
        /// What is wrong with it
        reason: &'static str,
    },

    /// An output file or directory could not be written
    #[error("Could not write '{path}': {source}")]
    Write {
        /// The file or cycle directory being written
        path: PathBuf,
        source: std::io::Error,
    },

    /// RunInfo.xml could not be deserialized
    #[error("Error parsing RunInfo: {0}")]
    RunInfo(#[from] serde_xml_rs::Error),

    /// A written run folder is internally inconsistent
    #[error("Verification of '{path}' failed: {reason}")]
    Verification {
        /// The run folder
        path: PathBuf,
        /// The first inconsistency found
        reason: String,
    },

    /// Underlying I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The cycle worker pool could not be built
    #[error("Error configuring threadpool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
