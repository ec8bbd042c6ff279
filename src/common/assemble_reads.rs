//! Zip the R1/I1/I2/R2 streams into one concatenated read per cluster.

use std::path::PathBuf;

use log::{debug, info};

use crate::errors::{Fastq2BclError, Result};
use crate::fastq_reader::{FastqInputs, FastqReader, FastqRecord};
use crate::mask::{embedded_bases, EmbedOptions};
use crate::seq_description::parse_seq_description;

/// Quality given to index/UMI bases copied out of the description
pub const EMBEDDED_QSCORE: u8 = 40;

/// The bases and qualities of one cluster over all cycles, with its raw
/// `[x, y]` position from the read id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterRecord {
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
    pub position: [String; 2],
}

impl ClusterRecord {
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    fn extend(&mut self, seq: &[u8], qual: &[u8]) {
        self.seq.extend_from_slice(seq);
        self.qual.extend_from_slice(qual);
    }

    fn extend_embedded(&mut self, bases: &[u8]) {
        self.seq.extend_from_slice(bases);
        self.qual
            .extend(std::iter::repeat(EMBEDDED_QSCORE).take(bases.len()));
    }
}

/// A secondary stream that has to stay in lock-step with R1
struct Partner {
    stream: &'static str,
    reader: FastqReader,
}

impl Partner {
    fn open(stream: &'static str, path: &Option<PathBuf>) -> Result<Option<Self>> {
        match path {
            Some(p) => Ok(Some(Partner {
                stream,
                reader: FastqReader::open(p)?,
            })),
            None => Ok(None),
        }
    }

    /// next record, which must carry the same id as the R1 record
    fn next_matching(&mut self, r1: &FastqRecord) -> Result<FastqRecord> {
        let record = match self.reader.next() {
            Some(record) => record?,
            None => {
                return Err(Fastq2BclError::StreamExhausted {
                    stream: self.stream,
                    path: self.reader.path().to_path_buf(),
                    expected: r1.id.clone(),
                })
            }
        };

        if record.id != r1.id {
            return Err(Fastq2BclError::IdentityMismatch {
                stream: self.stream,
                id: record.id,
                expected: r1.id.clone(),
            });
        }

        Ok(record)
    }
}

/// Build one cluster from a set of synchronized records. The order of the
/// bases is R1, embedded index, embedded UMI, I1, I2, R2.
pub fn assemble_cluster(
    r1: &FastqRecord,
    i1: Option<&FastqRecord>,
    i2: Option<&FastqRecord>,
    r2: Option<&FastqRecord>,
    options: EmbedOptions,
) -> Result<ClusterRecord> {
    let desc = parse_seq_description(&r1.description)?;
    let (index, umi) = embedded_bases(&desc, options, i1.is_some() || i2.is_some())?;

    let mut cluster = ClusterRecord {
        seq: Vec::with_capacity(r1.seq.len()),
        qual: Vec::with_capacity(r1.qual.len()),
        position: [desc.x_pos, desc.y_pos],
    };

    cluster.extend(&r1.seq, &r1.qual);

    if let Some(index) = index {
        cluster.extend_embedded(&index);
    }
    if let Some(umi) = umi {
        cluster.extend_embedded(&umi);
    }

    for record in vec![i1, i2, r2].into_iter().flatten() {
        cluster.extend(&record.seq, &record.qual);
    }

    Ok(cluster)
}

/// Read every record of the inputs into memory as clusters, in R1 order.
/// All readers are dropped (and their files closed) on return, error or not.
pub fn read_fastq_files(inputs: &FastqInputs, options: EmbedOptions) -> Result<Vec<ClusterRecord>> {
    let r1_reader = FastqReader::open(&inputs.r1)?;
    let mut i1 = Partner::open("I1", &inputs.i1)?;
    let mut i2 = Partner::open("I2", &inputs.i2)?;
    let mut r2 = Partner::open("R2", &inputs.r2)?;

    let mut clusters = Vec::new();

    for r1 in r1_reader {
        let r1 = r1?;

        let i1_record = i1.as_mut().map(|p| p.next_matching(&r1)).transpose()?;
        let i2_record = i2.as_mut().map(|p| p.next_matching(&r1)).transpose()?;
        let r2_record = r2.as_mut().map(|p| p.next_matching(&r1)).transpose()?;

        clusters.push(assemble_cluster(
            &r1,
            i1_record.as_ref(),
            i2_record.as_ref(),
            r2_record.as_ref(),
            options,
        )?);

        if clusters.len() % 100_000 == 0 {
            debug!("assembled {} clusters", clusters.len());
        }
    }

    if clusters.is_empty() {
        return Err(Fastq2BclError::EmptyInput {
            path: inputs.r1.clone(),
        });
    }

    info!("assembled {} clusters", clusters.len());

    Ok(clusters)
}
