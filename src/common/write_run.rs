//! Write a `FastqRun` out as a run folder, and check a written folder for
//! internal consistency.

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::bcl_decoder::bcl_decoder;
use crate::bcl_encoder::write_bcls_and_stats;
use crate::errors::{Fastq2BclError, Result};
use crate::fastq_reader::FastqInputs;
use crate::fastq_run::FastqRun;
use crate::filter_decoder::{control_decoder, filter_decoder};
use crate::filter_encoder::{write_control, write_filter};
use crate::locs_decoder::locs_decoder;
use crate::locs_encoder::write_locs;
use crate::mask::{EmbedOptions, Mask};
use crate::run_info_parser::parse_run_info;
use crate::run_info_writer::write_run_info_xml;
use crate::run_layout::{
    bcl_path, control_path, cycle_dir, filter_path, locs_path, run_info_path, stats_path,
    STATS_SIZE,
};

/// Counts read back from a written run
#[derive(Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub n_clusters: usize,
    pub n_cycles: usize,
}

/// The output directory must exist, be a directory and be writable
pub fn check_output_dir(outdir: &Path) -> Result<()> {
    let out_err = |reason| Fastq2BclError::OutputDir {
        path: outdir.to_path_buf(),
        reason,
    };

    if !outdir.exists() {
        return Err(out_err("does not exist"));
    }
    if !outdir.is_dir() {
        return Err(out_err("is not a directory"));
    }
    // an anonymous file is removed as soon as it is dropped
    if tempfile::tempfile_in(outdir).is_err() {
        return Err(out_err("is not writable"));
    }
    Ok(())
}

/// attach the path being written to a bare I/O error
fn write_err(path: PathBuf) -> impl FnOnce(Fastq2BclError) -> Fastq2BclError {
    move |e| match e {
        Fastq2BclError::Io(source) => Fastq2BclError::Write { path, source },
        other => other,
    }
}

/// Write every file of `fastq_run` under `outdir/<run id>` and return that path
pub fn write_run(fastq_run: &FastqRun, outdir: &Path, n_threads: usize) -> Result<PathBuf> {
    let run_path = outdir.join(&fastq_run.run_id);
    let n_clusters = fastq_run.num_clusters();
    let desc = &fastq_run.seq_description;

    info!("Writing run to {}", run_path.display());

    write_run_info_xml(
        &run_info_path(&run_path),
        &fastq_run.run_id,
        &desc.run_number,
        &desc.flowcell_id,
        &desc.instrument,
        &fastq_run.mask,
    )
    .map_err(|source| Fastq2BclError::Write {
        path: run_info_path(&run_path),
        source,
    })?;
    debug!("wrote {}", run_info_path(&run_path).display());

    write_filter(&filter_path(&run_path), n_clusters)
        .map_err(|source| Fastq2BclError::Write {
            path: filter_path(&run_path),
            source,
        })?;
    write_control(&control_path(&run_path), n_clusters)
        .map_err(|source| Fastq2BclError::Write {
            path: control_path(&run_path),
            source,
        })?;

    let positions: Vec<_> = fastq_run.clusters.iter().map(|c| c.position.clone()).collect();
    write_locs(&locs_path(&run_path), &positions).map_err(write_err(locs_path(&run_path)))?;
    info!("Wrote filter, control and locs for {} clusters", n_clusters);

    write_bcls_and_stats(
        &run_path,
        &fastq_run.clusters,
        fastq_run.num_cycles(),
        n_threads,
    )?;

    Ok(run_path)
}

/// Convert `inputs` into a run folder under `outdir`, returning the absolute
/// run path. The output directory and an explicit mask are both validated
/// before any input is read.
pub fn fastq2bcl(
    outdir: &Path,
    inputs: FastqInputs,
    mask: Option<&str>,
    options: EmbedOptions,
    n_threads: usize,
) -> Result<(PathBuf, FastqRun)> {
    let outdir = std::env::current_dir()?.join(outdir);
    check_output_dir(&outdir)?;
    info!("Output directory: {}", outdir.display());

    let mask = match mask {
        Some(m) => Some(m.parse::<Mask>()?),
        None => None,
    };

    let fastq_run = FastqRun::read_paths(inputs, mask, options)?;
    let run_path = write_run(&fastq_run, &outdir, n_threads)?;

    Ok((run_path, fastq_run))
}

/// Read a written run back and check that every file agrees on the number of
/// clusters, and that each cycle declared in RunInfo.xml has its files
pub fn verify_run(run_path: &Path) -> Result<RunSummary> {
    let fail = |path: PathBuf, reason: String| Fastq2BclError::Verification { path, reason };

    let run_info = parse_run_info(&run_info_path(run_path))?;
    let n_cycles = run_info.num_cycles();

    let n_clusters = filter_decoder(&filter_path(run_path))?.len();

    let n_controls = control_decoder(&control_path(run_path))?.len();
    if n_controls != n_clusters {
        return Err(fail(
            control_path(run_path),
            format!("{} controls for {} clusters", n_controls, n_clusters),
        ));
    }

    let n_locs = locs_decoder(&locs_path(run_path))?.len();
    if n_locs != n_clusters {
        return Err(fail(
            locs_path(run_path),
            format!("{} locations for {} clusters", n_locs, n_clusters),
        ));
    }

    for cycle in 0..n_cycles {
        if !cycle_dir(run_path, cycle).is_dir() {
            return Err(fail(cycle_dir(run_path, cycle), "missing cycle directory".to_owned()));
        }

        let n_calls = bcl_decoder(&bcl_path(run_path, cycle))?.len();
        if n_calls != n_clusters {
            return Err(fail(
                bcl_path(run_path, cycle),
                format!("{} calls for {} clusters", n_calls, n_clusters),
            ));
        }

        let stats_len = std::fs::metadata(stats_path(run_path, cycle))?.len() as usize;
        if stats_len != STATS_SIZE {
            return Err(fail(
                stats_path(run_path, cycle),
                format!("{} bytes, expected {}", stats_len, STATS_SIZE),
            ));
        }
    }

    info!("Verified {} cycles of {} clusters", n_cycles, n_clusters);

    Ok(RunSummary {
        n_clusters,
        n_cycles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bcl_decoder::decode_basecall;
    use crate::fastq_reader::test_files::write_fastq_gz;

    const RUN_ID: &str = "YYMMDD_M11111_0222_000000000-K9H97";

    fn head(x: usize, read: usize) -> String {
        format!(
            "M11111:222:000000000-K9H97:1:1101:{}:1328 {}:N:0:1",
            1000 + x,
            read
        )
    }

    fn seq_of(len: usize, offset: usize) -> (String, String) {
        let seq: String = "ACGT".chars().cycle().skip(offset).take(len).collect();
        (seq, "I".repeat(len))
    }

    /// `n` records of `len` bases for read number `read`
    fn records(n: usize, len: usize, read: usize) -> Vec<(String, String, String)> {
        (0..n)
            .map(|i| {
                let (seq, qual) = seq_of(len, i);
                (head(i, read), seq, qual)
            })
            .collect()
    }

    fn write_records(dir: &Path, name: &str, recs: &[(String, String, String)]) -> PathBuf {
        let borrowed: Vec<_> = recs
            .iter()
            .map(|(h, s, q)| (h.as_str(), s.as_str(), q.as_str()))
            .collect();
        write_fastq_gz(dir, name, &borrowed)
    }

    #[test]
    fn single_end_run() {
        let input = tempfile::tempdir().unwrap();
        let outdir = tempfile::tempdir().unwrap();
        let r1 = write_records(input.path(), "R1.fastq.gz", &records(3, 110, 1));

        let inputs = FastqInputs { r1, ..Default::default() };
        let (run_path, fastq_run) =
            fastq2bcl(outdir.path(), inputs, None, EmbedOptions::default(), 1).unwrap();

        assert_eq!(run_path, outdir.path().join(RUN_ID));
        assert_eq!(fastq_run.run_id, RUN_ID);
        assert_eq!(fastq_run.mask.to_string(), "110N");

        let last_bcl = bcl_decoder(&bcl_path(&run_path, 109)).unwrap();
        assert_eq!(last_bcl.len(), 3);
        assert!(!cycle_dir(&run_path, 110).exists());

        let first_bcl = bcl_decoder(&bcl_path(&run_path, 0)).unwrap();
        let first_bases: Vec<_> = first_bcl.into_iter().map(decode_basecall).collect();
        assert_eq!(first_bases, vec![(b'A', 40), (b'C', 40), (b'G', 40)]);

        let summary = verify_run(&run_path).unwrap();
        assert_eq!(
            summary,
            RunSummary {
                n_clusters: 3,
                n_cycles: 110
            }
        );
    }

    #[test]
    fn paired_end_run() {
        let input = tempfile::tempdir().unwrap();
        let outdir = tempfile::tempdir().unwrap();
        let r1 = write_records(input.path(), "R1.fastq.gz", &records(2, 309, 1));
        let r2 = write_records(input.path(), "R2.fastq.gz", &records(2, 309, 2));

        let inputs = FastqInputs {
            r1,
            r2: Some(r2),
            ..Default::default()
        };
        let (run_path, fastq_run) =
            fastq2bcl(outdir.path(), inputs, None, EmbedOptions::default(), 2).unwrap();

        assert_eq!(fastq_run.mask.to_string(), "309N309N");

        let xml = std::fs::read_to_string(run_info_path(&run_path)).unwrap();
        assert_eq!(xml.matches("<Read ").count(), 2);
        assert!(xml.contains(r#"<Read NumCycles="309" Number="2" IsIndexedRead="N" />"#));

        assert_eq!(verify_run(&run_path).unwrap().n_cycles, 618);
    }

    #[test]
    fn locations_match_read_ids() {
        let input = tempfile::tempdir().unwrap();
        let outdir = tempfile::tempdir().unwrap();
        let r1 = write_records(input.path(), "R1.fastq.gz", &records(2, 4, 1));

        let inputs = FastqInputs { r1, ..Default::default() };
        let (run_path, _) =
            fastq2bcl(outdir.path(), inputs, None, EmbedOptions::default(), 1).unwrap();

        let locs = locs_decoder(&locs_path(&run_path)).unwrap();
        assert_eq!(locs, vec![[1000, 1328], [1001, 1328]]);
        assert_eq!(filter_decoder(&filter_path(&run_path)).unwrap(), vec![true, true]);
    }

    #[test]
    fn mismatched_reads_write_no_cycles() {
        let input = tempfile::tempdir().unwrap();
        let outdir = tempfile::tempdir().unwrap();
        let r1 = write_records(input.path(), "R1.fastq.gz", &records(2, 10, 1));
        let mut r2_recs = records(2, 10, 2);
        r2_recs[1].0 = "M11111:222:000000000-K9H97:1:1101:9:9 2:N:0:1".to_owned();
        let r2 = write_records(input.path(), "R2.fastq.gz", &r2_recs);

        let inputs = FastqInputs {
            r1,
            r2: Some(r2),
            ..Default::default()
        };
        let err = fastq2bcl(outdir.path(), inputs, None, EmbedOptions::default(), 1).unwrap_err();

        assert!(matches!(err, Fastq2BclError::IdentityMismatch { .. }));
        assert!(!cycle_dir(&outdir.path().join(RUN_ID), 0).exists());
    }

    #[test]
    fn bad_mask_is_checked_first() {
        let outdir = tempfile::tempdir().unwrap();
        let inputs = FastqInputs {
            r1: "test_data/no_file_R1.fastq.gz".into(),
            ..Default::default()
        };

        let err = fastq2bcl(outdir.path(), inputs, Some("110Q"), EmbedOptions::default(), 1)
            .unwrap_err();

        assert!(matches!(err, Fastq2BclError::InvalidMask { .. }));
        assert_eq!(std::fs::read_dir(outdir.path()).unwrap().count(), 0);
    }

    #[test]
    #[should_panic(expected = r#"does not exist"#)]
    fn no_outdir() {
        check_output_dir(Path::new("test_data/no_such_dir")).unwrap();
    }

    #[test]
    #[should_panic(expected = r#"is not a directory"#)]
    fn outdir_is_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, b"").unwrap();

        check_output_dir(&file).unwrap();
    }

    #[test]
    fn verify_catches_short_bcl() {
        let input = tempfile::tempdir().unwrap();
        let outdir = tempfile::tempdir().unwrap();
        let r1 = write_records(input.path(), "R1.fastq.gz", &records(2, 4, 1));

        let inputs = FastqInputs { r1, ..Default::default() };
        let (run_path, _) =
            fastq2bcl(outdir.path(), inputs, None, EmbedOptions::default(), 1).unwrap();

        std::fs::write(bcl_path(&run_path, 2), b"\x01\x00\x00\x00\x05").unwrap();

        let err = verify_run(&run_path).unwrap_err();
        assert!(matches!(err, Fastq2BclError::Verification { .. }));
        assert!(err.to_string().contains("1 calls for 2 clusters"), "{}", err);
    }

    #[test]
    fn verify_catches_missing_cycle() {
        let input = tempfile::tempdir().unwrap();
        let outdir = tempfile::tempdir().unwrap();
        let r1 = write_records(input.path(), "R1.fastq.gz", &records(2, 4, 1));

        let inputs = FastqInputs { r1, ..Default::default() };
        let (run_path, _) =
            fastq2bcl(outdir.path(), inputs, None, EmbedOptions::default(), 1).unwrap();

        std::fs::remove_dir_all(cycle_dir(&run_path, 3)).unwrap();

        let err = verify_run(&run_path).unwrap_err();
        assert!(err.to_string().contains("missing cycle directory"), "{}", err);
    }

    #[test]
    fn malformed_later_record_writes_nothing() {
        let input = tempfile::tempdir().unwrap();
        let outdir = tempfile::tempdir().unwrap();
        let mut recs = records(2, 10, 1);
        recs[1].0 = "garbage".to_owned();
        let r1 = write_records(input.path(), "R1.fastq.gz", &recs);

        let inputs = FastqInputs { r1, ..Default::default() };
        let err = fastq2bcl(outdir.path(), inputs, None, EmbedOptions::default(), 1).unwrap_err();

        assert!(matches!(err, Fastq2BclError::MalformedDescription { .. }));
        assert!(err.to_string().contains("'garbage'"), "{}", err);
        assert_eq!(std::fs::read_dir(outdir.path()).unwrap().count(), 0);
    }

    #[test]
    fn write_error_names_the_file() {
        let input = tempfile::tempdir().unwrap();
        let outdir = tempfile::tempdir().unwrap();
        let r1 = write_records(input.path(), "R1.fastq.gz", &records(2, 4, 1));

        let inputs = FastqInputs { r1, ..Default::default() };
        let fastq_run = FastqRun::read_paths(inputs, None, EmbedOptions::default()).unwrap();

        // a plain file where the BaseCalls lane directory should go
        let run_path = outdir.path().join(RUN_ID);
        let lane_dir = filter_path(&run_path).parent().unwrap().to_path_buf();
        std::fs::create_dir_all(lane_dir.parent().unwrap()).unwrap();
        std::fs::write(&lane_dir, b"").unwrap();

        let err = write_run(&fastq_run, outdir.path(), 1).unwrap_err();
        match &err {
            Fastq2BclError::Write { path, .. } => assert_eq!(path, &filter_path(&run_path)),
            other => panic!("expected a write error, got {:?}", other),
        }
        assert!(err.to_string().contains("s_1_1101.filter"), "{}", err);
    }

    #[test]
    fn writable_check_leaves_no_file() {
        let outdir = tempfile::tempdir().unwrap();

        check_output_dir(outdir.path()).unwrap();
        assert_eq!(std::fs::read_dir(outdir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn unwritable_outdir() {
        use std::os::unix::fs::PermissionsExt;

        let outdir = tempfile::tempdir().unwrap();
        std::fs::set_permissions(outdir.path(), std::fs::Permissions::from_mode(0o555)).unwrap();

        // root ignores permission bits; only check when the directory is really closed
        let writable = tempfile::tempfile_in(outdir.path()).is_ok();
        let result = check_output_dir(outdir.path());
        std::fs::set_permissions(outdir.path(), std::fs::Permissions::from_mode(0o755)).unwrap();

        if writable {
            assert!(result.is_ok());
        } else {
            let err = result.unwrap_err();
            assert!(err.to_string().ends_with("is not writable"), "{}", err);
        }
    }
}
