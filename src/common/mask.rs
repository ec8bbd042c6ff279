//! The read structure of a run: how many cycles each read has and which
//! reads are indexes. Either parsed from a mask string such as `110N10Y10Y110N`
//! or derived from the input files.

use std::{fmt, path::PathBuf, str::FromStr};

use itertools::Itertools;
use log::{debug, info};

use crate::errors::{Fastq2BclError, Result};
use crate::fastq_reader::{read_first_record, FastqInputs};
use crate::seq_description::{parse_seq_description, SeqDescription};

/// Most reads a run can declare
pub const MAX_READS: usize = 4;

/// One read of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadSegment {
    /// number of cycles (bases) in the read
    pub num_cycles: u32,
    /// whether this is an index read
    pub is_index: bool,
    /// 1-based position of the read in the run
    pub number: u32,
}

impl fmt::Display for ReadSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.num_cycles, if self.is_index { 'Y' } else { 'N' })
    }
}

/// Ordered reads of the run; numbers are contiguous from 1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    reads: Vec<ReadSegment>,
}

/// Whether index/UMI bases found in the R1 description are folded into the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmbedOptions {
    pub exclude_index: bool,
    pub exclude_umi: bool,
}

/// Index and UMI bases to append to R1 for one record, checked against the
/// presence of I1/I2 files
pub fn embedded_bases(
    desc: &SeqDescription,
    options: EmbedOptions,
    has_index_files: bool,
) -> Result<(Option<Vec<u8>>, Option<Vec<u8>>)> {
    let index = if options.exclude_index {
        None
    } else {
        desc.embedded_index()
    };
    if index.is_some() && has_index_files {
        return Err(Fastq2BclError::ConflictingIndexSource {
            source_kind: "index",
        });
    }

    let umi = if options.exclude_umi {
        None
    } else {
        desc.embedded_umi()
    };
    if umi.is_some() && has_index_files {
        return Err(Fastq2BclError::ConflictingIndexSource { source_kind: "UMI" });
    }

    Ok((index, umi))
}

/// parse `<digits><N|Y>` at the start of `s`, returning the rest
fn parse_segment(s: &str) -> Option<(u32, bool, &str)> {
    let digits = s.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let num_cycles: u32 = s[..digits].parse().ok()?;
    let is_index = match s.as_bytes().get(digits)? {
        b'N' => false,
        b'Y' => true,
        _ => return None,
    };
    Some((num_cycles, is_index, &s[digits + 1..]))
}

impl FromStr for Mask {
    type Err = Fastq2BclError;

    /// Parse 1 to 4 `<cycles><N|Y>` segments covering the whole string
    fn from_str(mask: &str) -> Result<Self> {
        let invalid = || Fastq2BclError::InvalidMask {
            mask: mask.to_owned(),
        };

        let mut reads = Vec::new();
        let mut rest = mask;
        while !rest.is_empty() {
            let (num_cycles, is_index, tail) = parse_segment(rest).ok_or_else(invalid)?;
            if num_cycles == 0 || reads.len() == MAX_READS {
                return Err(invalid());
            }
            reads.push((num_cycles, is_index));
            rest = tail;
        }

        if reads.is_empty() {
            return Err(invalid());
        }

        Ok(Mask::from_reads(reads))
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reads.iter().join(""))
    }
}

impl Mask {
    /// Number reads in order; zero-cycle reads are dropped
    fn from_reads<I: IntoIterator<Item = (u32, bool)>>(reads: I) -> Self {
        let reads = reads
            .into_iter()
            .filter(|&(num_cycles, _)| num_cycles > 0)
            .enumerate()
            .map(|(i, (num_cycles, is_index))| ReadSegment {
                num_cycles,
                is_index,
                number: i as u32 + 1,
            })
            .collect();

        Mask { reads }
    }

    /// Parse a user supplied mask; an absent mask is an error
    pub fn from_mask_string(mask: Option<&str>) -> Result<Self> {
        match mask {
            Some(m) => m.parse(),
            None => Err(Fastq2BclError::InvalidMask {
                mask: String::new(),
            }),
        }
    }

    /// Build the mask from read lengths. `r1_desc` is the parsed description
    /// of the first R1 record; its index and UMI become one extra index read
    /// directly after R1 unless excluded.
    pub fn derive(
        r1_len: usize,
        r1_desc: &SeqDescription,
        i1_len: Option<usize>,
        i2_len: Option<usize>,
        r2_len: Option<usize>,
        options: EmbedOptions,
    ) -> Result<Self> {
        let has_index_files = i1_len.is_some() || i2_len.is_some();
        let (index, umi) = embedded_bases(r1_desc, options, has_index_files)?;

        let embedded_cycles =
            index.map_or(0, |i| i.len()) + umi.map_or(0, |u| u.len());
        debug!("{} embedded index/UMI cycles", embedded_cycles);

        let reads = vec![
            Some((r1_len, false)),
            Some((embedded_cycles, true)),
            i1_len.map(|l| (l, true)),
            i2_len.map(|l| (l, true)),
            r2_len.map(|l| (l, false)),
        ];

        Ok(Mask::from_reads(
            reads
                .into_iter()
                .flatten()
                .map(|(len, is_index)| (len as u32, is_index)),
        ))
    }

    /// Derive the mask from the first record of each input file
    pub fn from_files(inputs: &FastqInputs, options: EmbedOptions) -> Result<Self> {
        let r1 = read_first_record(&inputs.r1)?;
        let r1_desc = parse_seq_description(&r1.description)?;

        Mask::from_first_r1(r1.seq.len(), &r1_desc, inputs, options)
    }

    /// Derive the mask when the first R1 record is already parsed; only the
    /// I1/I2/R2 files are opened
    pub fn from_first_r1(
        r1_len: usize,
        r1_desc: &SeqDescription,
        inputs: &FastqInputs,
        options: EmbedOptions,
    ) -> Result<Self> {
        let first_len = |path: &Option<PathBuf>| -> Result<Option<usize>> {
            match path {
                Some(p) => Ok(Some(read_first_record(p)?.seq.len())),
                None => Ok(None),
            }
        };

        let mask = Mask::derive(
            r1_len,
            r1_desc,
            first_len(&inputs.i1)?,
            first_len(&inputs.i2)?,
            first_len(&inputs.r2)?,
            options,
        )?;

        info!("mask string from files: {}", mask);

        Ok(mask)
    }

    pub fn reads(&self) -> &[ReadSegment] {
        &self.reads
    }

    /// Total cycles over all reads
    pub fn num_cycles(&self) -> usize {
        self.reads.iter().map(|r| r.num_cycles as usize).sum()
    }
}
