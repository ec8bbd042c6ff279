//! Reads `*.locs` files back into integer read-id coordinates

use byteorder::{LittleEndian, ReadBytesExt};
use std::{
    fs::File,
    io::{BufReader, Error, ErrorKind},
    path::Path,
};

/// One [x, y] read-id coordinate per cluster
pub type Locs = Vec<[u32; 2]>;

/// inverse of the encoder transform `(raw - 1000) / 10`
#[inline]
fn decode_coord(v: f32) -> u32 {
    ((v as f64) * 10. + 1000.).round() as u32
}

/// Decode a `.locs` file into a `Locs` struct
///
/// Format of a `.locs` file:
///  1. `u32` version (1) and `f32` 1.0
///  2. `u32` representing number of clusters (locations)
///  3. `[f32; 2 * num_clusters]` of [x, y] pairs
pub fn locs_decoder(locs_path: &Path) -> std::io::Result<Locs> {
    let mut rdr = BufReader::new(File::open(locs_path)?);

    let version = rdr.read_u32::<LittleEndian>()?;
    let scale = rdr.read_f32::<LittleEndian>()?;
    if version != 1 || scale != 1.0 {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!("unexpected locs header: version {}, {}", version, scale),
        ));
    }

    let num_clusters = rdr.read_u32::<LittleEndian>()? as usize;

    let mut coords = vec![0f32; num_clusters * 2];
    rdr.read_f32_into::<LittleEndian>(&mut coords)?;

    Ok(coords
        .chunks_exact(2)
        .map(|xy| [decode_coord(xy[0]), decode_coord(xy[1])])
        .collect())
}
