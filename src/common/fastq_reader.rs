//! Read gzipped FASTQ files into owned records.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use flate2::read::MultiGzDecoder;
use log::debug;
use seq_io::fastq::{Reader, Record};

use crate::errors::{Fastq2BclError, Result};

/// Offset between FASTQ quality characters and PHRED scores
const PHRED_OFFSET: u8 = 33;

/// One FASTQ record with the quality line converted to PHRED scores
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastqRecord {
    /// header up to the first whitespace, used to pair records across files
    pub id: String,
    /// the whole header line, id included
    pub description: String,
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
}

impl FastqRecord {
    fn from_record<R: Record>(record: &R, path: &Path) -> Result<Self> {
        let description = std::str::from_utf8(record.head())
            .map_err(|e| Fastq2BclError::InvalidFastq {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
            .to_owned();

        let id = description
            .split(char::is_whitespace)
            .next()
            .unwrap_or("")
            .to_owned();

        let qual = record
            .qual()
            .iter()
            .map(|&q| q.saturating_sub(PHRED_OFFSET))
            .collect();

        Ok(FastqRecord {
            id,
            description,
            seq: record.seq().to_vec(),
            qual,
        })
    }
}

/// The gzipped FASTQ files of one conversion. Only R1 is mandatory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FastqInputs {
    pub r1: PathBuf,
    pub r2: Option<PathBuf>,
    pub i1: Option<PathBuf>,
    pub i2: Option<PathBuf>,
}

/// Streams the records of one `.fastq.gz` file
pub struct FastqReader {
    path: PathBuf,
    reader: Reader<MultiGzDecoder<BufReader<File>>>,
}

impl FastqReader {
    /// Open a gzipped FASTQ file. The file handle is released when the
    /// reader is dropped.
    pub fn open(path: &Path) -> Result<Self> {
        debug!("Opening gz file {}", path.display());
        let file = File::open(path)?;
        let gz = MultiGzDecoder::new(BufReader::new(file));

        Ok(FastqReader {
            path: path.to_path_buf(),
            reader: Reader::new(gz),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for FastqReader {
    type Item = Result<FastqRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = &self.path;
        self.reader.next().map(|record| match record {
            Ok(r) => FastqRecord::from_record(&r, path),
            Err(e) => Err(Fastq2BclError::InvalidFastq {
                path: path.clone(),
                reason: e.to_string(),
            }),
        })
    }
}

/// Read only the first record of a gzipped FASTQ file
pub fn read_first_record(path: &Path) -> Result<FastqRecord> {
    FastqReader::open(path)?
        .next()
        .unwrap_or_else(|| {
            Err(Fastq2BclError::EmptyInput {
                path: path.to_path_buf(),
            })
        })
}
