//! Write `*.filter` and `*.control` files for a tile of synthetic clusters.
//!
//! Both share a layout:
//!  1. `u32` zero
//!  2. `u32` format version (3 for filter, 2 for control)
//!  3. `u32` number of clusters
//!  4. the per-cluster body

use byteorder::{LittleEndian, WriteBytesExt};
use std::{
    fs::{create_dir_all, File},
    io::{prelude::*, BufWriter},
    path::Path,
};

const FILTER_VERSION: u32 = 3;
const CONTROL_VERSION: u32 = 2;

fn write_header<W: Write>(wtr: &mut W, version: u32, n_clusters: usize) -> std::io::Result<()> {
    wtr.write_u32::<LittleEndian>(0)?;
    wtr.write_u32::<LittleEndian>(version)?;
    wtr.write_u32::<LittleEndian>(n_clusters as u32)?;
    Ok(())
}

/// Every synthetic cluster passes filter: one `0x01` byte per cluster
pub fn encode_filter<W: Write>(wtr: &mut W, n_clusters: usize) -> std::io::Result<()> {
    write_header(wtr, FILTER_VERSION, n_clusters)?;
    wtr.write_all(&vec![1u8; n_clusters])
}

/// No control reads: two zero bytes per cluster
pub fn encode_control<W: Write>(wtr: &mut W, n_clusters: usize) -> std::io::Result<()> {
    write_header(wtr, CONTROL_VERSION, n_clusters)?;
    wtr.write_all(&vec![0u8; 2 * n_clusters])
}

fn create(path: &Path) -> std::io::Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

pub fn write_filter(filter_path: &Path, n_clusters: usize) -> std::io::Result<()> {
    let mut wtr = create(filter_path)?;
    encode_filter(&mut wtr, n_clusters)?;
    wtr.flush()
}

pub fn write_control(control_path: &Path, n_clusters: usize) -> std::io::Result<()> {
    let mut wtr = create(control_path)?;
    encode_control(&mut wtr, n_clusters)?;
    wtr.flush()
}
