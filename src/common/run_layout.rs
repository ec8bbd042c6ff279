//! Names and paths inside the synthetic run folder. Every run has a single
//! lane (1) with a single tile (1101).

use std::path::{Path, PathBuf};

use crate::seq_description::SeqDescription;

/// Lane and tile prefix shared by all per-tile files
const TILE_PREFIX: &str = "s_1_1101";

/// Size of the placeholder `.stats` file
pub const STATS_SIZE: usize = 108;

/// Mock run id: `YYMMDD_<instrument>_<run number, 4 digits>_<flowcell>`
pub fn mock_run_id(desc: &SeqDescription) -> String {
    format!(
        "YYMMDD_{}_{:0>4}_{}",
        desc.instrument, desc.run_number, desc.flowcell_id,
    )
}

pub fn run_info_path(run_path: &Path) -> PathBuf {
    run_path.join("RunInfo.xml")
}

pub fn basecalls_dir(run_path: &Path) -> PathBuf {
    run_path.join("Data/Intensities/BaseCalls/L001")
}

pub fn locs_path(run_path: &Path) -> PathBuf {
    run_path.join(format!("Data/Intensities/L001/{}.locs", TILE_PREFIX))
}

pub fn filter_path(run_path: &Path) -> PathBuf {
    basecalls_dir(run_path).join(format!("{}.filter", TILE_PREFIX))
}

pub fn control_path(run_path: &Path) -> PathBuf {
    basecalls_dir(run_path).join(format!("{}.control", TILE_PREFIX))
}

/// Directory of a cycle, `cycle` counted from 0 (written as `C<cycle + 1>.1`)
pub fn cycle_dir(run_path: &Path, cycle: usize) -> PathBuf {
    basecalls_dir(run_path).join(format!("C{}.1", cycle + 1))
}

pub fn bcl_path(run_path: &Path, cycle: usize) -> PathBuf {
    cycle_dir(run_path, cycle).join(format!("{}.bcl", TILE_PREFIX))
}

pub fn stats_path(run_path: &Path, cycle: usize) -> PathBuf {
    cycle_dir(run_path, cycle).join(format!("{}.stats", TILE_PREFIX))
}
