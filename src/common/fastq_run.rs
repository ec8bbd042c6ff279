//! Represents a set of FASTQ files loaded as one synthetic sequencing run:
//! the run metadata from the first R1 record, the read structure, and every
//! cluster held in memory.

use log::{info, warn};

use crate::assemble_reads::{read_fastq_files, ClusterRecord};
use crate::errors::{Fastq2BclError, Result};
use crate::fastq_reader::{read_first_record, FastqInputs};
use crate::mask::{EmbedOptions, Mask};
use crate::run_layout::mock_run_id;
use crate::seq_description::{parse_seq_description, SeqDescription};

/// A run assembled from FASTQ files, read-only once loaded
#[derive(Debug)]
pub struct FastqRun {
    /// the input files the run was loaded from
    pub inputs: FastqInputs,
    /// description fields of the first R1 record
    pub seq_description: SeqDescription,
    /// mock run id built from the description
    pub run_id: String,
    /// read structure written to RunInfo.xml
    pub mask: Mask,
    /// every cluster, in R1 order
    pub clusters: Vec<ClusterRecord>,
}

/// Fail early on input paths that are not files
pub fn check_inputs(inputs: &FastqInputs) -> Result<()> {
    let paths = std::iter::once(&inputs.r1)
        .chain(inputs.r2.iter())
        .chain(inputs.i1.iter())
        .chain(inputs.i2.iter());

    for path in paths {
        if !path.is_file() {
            return Err(Fastq2BclError::MissingInput { path: path.clone() });
        }
    }
    Ok(())
}

impl FastqRun {
    /// Loads every record of `inputs`. When `mask` is None the read structure
    /// is derived from the first record of each file.
    pub fn read_paths(
        inputs: FastqInputs,
        mask: Option<Mask>,
        options: EmbedOptions,
    ) -> Result<FastqRun> {
        check_inputs(&inputs)?;

        let first_record = read_first_record(&inputs.r1)?;
        let seq_description = parse_seq_description(&first_record.description)?;
        info!("first record seqdesc fields: {:?}", seq_description);

        let run_id = mock_run_id(&seq_description);

        let mask = match mask {
            Some(m) => m,
            None => {
                Mask::from_first_r1(first_record.seq.len(), &seq_description, &inputs, options)?
            }
        };
        info!("mask: {}", mask);

        let clusters = read_fastq_files(&inputs, options)?;

        let fastq_run = FastqRun {
            inputs,
            seq_description,
            run_id,
            mask,
            clusters,
        };

        if fastq_run.mask.num_cycles() != fastq_run.num_cycles() {
            warn!(
                "mask {} declares {} cycles but the longest read has {}",
                fastq_run.mask,
                fastq_run.mask.num_cycles(),
                fastq_run.num_cycles(),
            );
        }

        Ok(fastq_run)
    }

    /// Number of cycles to write: the longest assembled read
    pub fn num_cycles(&self) -> usize {
        self.clusters.iter().map(|c| c.len()).max().unwrap_or(0)
    }

    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }
}
