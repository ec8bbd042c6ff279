//! Read per-cycle `*.bcl` files back into packed calls.

use byteorder::{LittleEndian, ReadBytesExt};
use std::{fs::File, io::Read, path::Path};

/// converts the two base bits of a call to a base, or N for a no-call
#[inline]
pub fn decode_basecall(call: u8) -> (u8, u8) {
    if call == 0 {
        return (b'N', 0);
    }
    let base = match call & 0b11 {
        0 => b'A',
        1 => b'C',
        2 => b'G',
        _ => b'T',
    };
    (base, call >> 2)
}

/// Decode a `.bcl` file into one packed call per cluster
///
/// Format of a `.bcl` file:
///  1. `u32` number of clusters
///  2. `[u8; num_clusters]` of packed calls
pub fn bcl_decoder(bcl_path: &Path) -> std::io::Result<Vec<u8>> {
    let mut rdr = File::open(bcl_path)?;

    let num_clusters = rdr.read_u32::<LittleEndian>()? as usize;

    let mut calls = vec![0u8; num_clusters];
    rdr.read_exact(&mut calls)?;

    Ok(calls)
}
