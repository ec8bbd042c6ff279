//! Write the `*.locs` file: cluster positions as `f32` pairs.

use byteorder::{LittleEndian, WriteBytesExt};
use std::{
    fs::{create_dir_all, File},
    io::{prelude::*, BufWriter},
    path::Path,
};

use crate::errors::{Fastq2BclError, Result};

/// Convert read id coordinates to locs coordinates.
///
/// This is `(v - 1000) / 10`, the inverse of the conversion bcl2fastq uses
/// when reading locs. It is kept as-is for compatibility with existing
/// fixtures; it is not known to be the instrument's own formula.
pub fn encode_loc(x: i64, y: i64) -> [f32; 2] {
    [
        ((x - 1000) as f64 / 10.0) as f32,
        ((y - 1000) as f64 / 10.0) as f32,
    ]
}

/// The 8 little-endian bytes of one encoded location
pub fn encode_loc_bytes(x: i64, y: i64) -> [u8; 8] {
    let [fx, fy] = encode_loc(x, y);
    let mut bytes = [0u8; 8];
    bytes[..4].copy_from_slice(&fx.to_le_bytes());
    bytes[4..].copy_from_slice(&fy.to_le_bytes());
    bytes
}

fn parse_coordinate(raw: &str) -> Result<i64> {
    raw.parse().map_err(|_| Fastq2BclError::InvalidPosition {
        value: raw.to_owned(),
    })
}

/// Encode a `.locs` file
///
/// Format of a `.locs` file:
///  1. `u32` 1 and `f32` 1.0 (`01 00 00 00 00 00 80 3F`)
///  2. `u32` number of clusters
///  3. `[f32; 2 * num_clusters]` of [x, y] pairs
pub fn encode_locs<W: Write, S: AsRef<str>>(wtr: &mut W, positions: &[[S; 2]]) -> Result<()> {
    wtr.write_u32::<LittleEndian>(1)?;
    wtr.write_f32::<LittleEndian>(1.0)?;
    wtr.write_u32::<LittleEndian>(positions.len() as u32)?;

    for [x, y] in positions {
        let [fx, fy] = encode_loc(parse_coordinate(x.as_ref())?, parse_coordinate(y.as_ref())?);
        wtr.write_f32::<LittleEndian>(fx)?;
        wtr.write_f32::<LittleEndian>(fy)?;
    }

    Ok(())
}

pub fn write_locs<S: AsRef<str>>(locs_path: &Path, positions: &[[S; 2]]) -> Result<()> {
    if let Some(parent) = locs_path.parent() {
        create_dir_all(parent)?;
    }
    let mut wtr = BufWriter::new(File::create(locs_path)?);
    encode_locs(&mut wtr, positions)?;
    wtr.flush()?;
    Ok(())
}
