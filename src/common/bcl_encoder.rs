//! Transpose the clusters into cycles and write one `.bcl` and one `.stats`
//! file per cycle.
//!
//! Format of a `.bcl` file:
//!  1. `u32` number of clusters
//!  2. `[u8; num_clusters]` of packed calls: bits 0-1 are the base
//!     (A, C, G, T = 0..3), bits 2-7 the quality score; `0x00` is a no-call

use byteorder::{LittleEndian, WriteBytesExt};
use log::{debug, info};
use ndarray::parallel::prelude::*;
use ndarray::{Array2, ArrayView1, Axis};
use rayon::ThreadPoolBuilder;
use std::{
    fs::{create_dir_all, File},
    io::{prelude::*, BufWriter},
    path::Path,
};

use crate::assemble_reads::ClusterRecord;
use crate::errors::{Fastq2BclError, Result};
use crate::run_layout::{bcl_path, cycle_dir, stats_path, STATS_SIZE};

/// Highest quality score that fits in the six quality bits
pub const MAX_QSCORE: u8 = 63;

/// converts a base to its two-bit value, or None for a no-call
#[inline]
fn base_to_u8(base: u8) -> Option<u8> {
    match base.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

/// Pack a base and its quality into one byte
#[inline]
pub fn encode_cluster_byte(base: u8, qscore: u8) -> u8 {
    match base_to_u8(base) {
        Some(b) => (qscore.min(MAX_QSCORE) << 2) | b,
        None => 0,
    }
}

/// the packed call of `cluster` at `cycle`, padding short clusters with no-calls
#[inline]
fn cluster_call(cluster: &ClusterRecord, cycle: usize) -> u8 {
    match (cluster.seq.get(cycle), cluster.qual.get(cycle)) {
        (Some(&base), Some(&qscore)) => encode_cluster_byte(base, qscore),
        _ => 0,
    }
}

/// Build the cycle-major call matrix: row `c` holds cycle `c` of every cluster,
/// in cluster order. Rows are filled in parallel on the current thread pool.
pub fn transpose_calls(clusters: &[ClusterRecord], n_cycles: usize) -> Array2<u8> {
    let mut calls = Array2::zeros((n_cycles, clusters.len()));

    calls
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(cycle, mut row)| {
            row.iter_mut()
                .zip(clusters)
                .for_each(|(call, cluster)| *call = cluster_call(cluster, cycle));
        });

    calls
}

pub fn encode_bcl<W: Write>(wtr: &mut W, calls: ArrayView1<u8>) -> std::io::Result<()> {
    wtr.write_u32::<LittleEndian>(calls.len() as u32)?;
    for &call in calls.iter() {
        wtr.write_u8(call)?;
    }
    Ok(())
}

/// The `.stats` file is a zeroed placeholder
pub fn write_stats(stats_path: &Path) -> std::io::Result<()> {
    File::create(stats_path)?.write_all(&[0u8; STATS_SIZE])
}

/// Write the `.bcl` and `.stats` files of one cycle (counted from 0)
pub fn write_cycle(run_path: &Path, cycle: usize, calls: ArrayView1<u8>) -> std::io::Result<()> {
    create_dir_all(cycle_dir(run_path, cycle))?;

    let mut wtr = BufWriter::new(File::create(bcl_path(run_path, cycle))?);
    encode_bcl(&mut wtr, calls)?;
    wtr.flush()?;

    write_stats(&stats_path(run_path, cycle))
}

/// Write every cycle of the run using `n_threads` workers (0 lets rayon pick).
/// Each cycle is an independent pair of files, so cycles are written in any
/// order; the first failure aborts the whole write and names its cycle directory.
pub fn write_bcls_and_stats(
    run_path: &Path,
    clusters: &[ClusterRecord],
    n_cycles: usize,
    n_threads: usize,
) -> Result<()> {
    let pool = ThreadPoolBuilder::new().num_threads(n_threads).build()?;

    info!(
        "Writing {} cycles of {} clusters with {} threads",
        n_cycles,
        clusters.len(),
        pool.current_num_threads()
    );

    pool.install(|| {
        let calls = transpose_calls(clusters, n_cycles);

        calls
            .axis_iter(Axis(0))
            .into_par_iter()
            .enumerate()
            .try_for_each(|(cycle, row)| {
                debug!("writing cycle {}", cycle + 1);
                write_cycle(run_path, cycle, row).map_err(|e| (cycle, e))
            })
    })
    .map_err(|(cycle, source)| Fastq2BclError::Write {
        path: cycle_dir(run_path, cycle),
        source,
    })
}
