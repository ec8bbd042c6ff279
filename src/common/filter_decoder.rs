//! Read `*.filter` and `*.control` files back into per-cluster values.

use byteorder::{LittleEndian, ReadBytesExt};

use std::{fs::File, io::Read, path::Path};

/// A filter holds one pass/fail flag per cluster
pub type Filter = Vec<bool>;

/// Decode a `.filter` file into a `Filter`
///
/// Format of a `.filter` file:
///  1. Two `u32` containing header info (ignored)
///  2. `u32` representing the number of clusters
///  3. `[u8; num_clusters]` of true/false (1 or 0) values
pub fn filter_decoder(filter_path: &Path) -> std::io::Result<Filter> {
    let mut rdr = File::open(filter_path)?;

    let _ = rdr.read_u64::<LittleEndian>()?;

    let num_clusters = rdr.read_u32::<LittleEndian>()? as usize;

    let mut bin_mask = vec![0u8; num_clusters];
    rdr.read_exact(&mut bin_mask)?;

    Ok(bin_mask.into_iter().map(|b| b != 0).collect())
}

/// Decode a `.control` file into one control value per cluster
///
/// Format of a `.control` file:
///  1. Two `u32` containing header info (ignored)
///  2. `u32` representing the number of clusters
///  3. `[u16; num_clusters]` of control flags
pub fn control_decoder(control_path: &Path) -> std::io::Result<Vec<u16>> {
    let mut rdr = File::open(control_path)?;

    let _ = rdr.read_u64::<LittleEndian>()?;

    let num_clusters = rdr.read_u32::<LittleEndian>()? as usize;

    let mut controls = vec![0u16; num_clusters];
    rdr.read_u16_into::<LittleEndian>(&mut controls)?;

    Ok(controls)
}
