//! fastq2bcl converts gzipped FASTQ files into a synthetic Illumina run folder
//! (RunInfo.xml, filter, control, locs and per-cycle bcl files) that
//! demultiplexing tools can read back.

use clap::{value_t, App, Arg, ArgMatches};
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use common::errors::Result;
use common::fastq_reader::FastqInputs;
use common::mask::EmbedOptions;
use common::write_run::{fastq2bcl, verify_run};

fn log_level(verbosity: u64) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let inputs = FastqInputs {
        r1: PathBuf::from(matches.value_of("R1").unwrap_or_default()),
        r2: matches.value_of("R2").map(PathBuf::from),
        i1: matches.value_of("I1").map(PathBuf::from),
        i2: matches.value_of("I2").map(PathBuf::from),
    };
    info!("Input files: {:?}", inputs);

    let options = EmbedOptions {
        exclude_index: matches.is_present("exclude-index"),
        exclude_umi: matches.is_present("exclude-umi"),
    };

    let outdir = PathBuf::from(matches.value_of("outdir").unwrap_or("."));
    let mask = matches.value_of("mask");
    info!("User defined mask: {:?}", mask);

    let n_threads = value_t!(matches, "threads", usize).unwrap_or_else(|e| e.exit());

    let (run_path, fastq_run) = fastq2bcl(&outdir, inputs, mask, options, n_threads)?;

    if matches.is_present("verify") {
        let summary = verify_run(&run_path)?;
        println!(
            "VERIFIED: {} clusters, {} cycles",
            summary.n_clusters, summary.n_cycles
        );
    }

    println!("RUNDIR: {}", run_path.display());
    println!("RUNID:  {}", fastq_run.run_id);
    println!("MASK:   {}", fastq_run.mask);
    println!("SEQDESC FIELDS:");
    for (key, val) in fastq_run.seq_description.fields() {
        println!("{:<15} {}", key, val.unwrap_or("---"));
    }

    Ok(())
}

/// Parses command line arguments and runs the conversion
fn main() {
    let matches = App::new("fastq2bcl")
        .version(clap::crate_version!())
        .about("Convert fastq.gz reads and metadata into a bcl2fastq-able run directory")
        .arg(
            Arg::with_name("R1")
                .help("fastq.gz with R1 reads")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("R2")
                .help("fastq.gz with R2 reads")
                .index(2),
        )
        .arg(
            Arg::with_name("I1")
                .help("fastq.gz with I1 reads")
                .index(3),
        )
        .arg(
            Arg::with_name("I2")
                .help("fastq.gz with I2 reads")
                .index(4),
        )
        .arg(
            Arg::with_name("outdir")
                .short("o")
                .long("outdir")
                .help("output directory for the mocked run (default: current directory)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("mask")
                .short("m")
                .long("mask")
                .help("read structure in the format 110N10Y10Y110N")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("exclude-index")
                .long("exclude-index")
                .help("do not add index bases found in the R1 sequence description"),
        )
        .arg(
            Arg::with_name("exclude-umi")
                .long("exclude-umi")
                .help("do not add UMI bases found in the R1 sequence description"),
        )
        .arg(
            Arg::with_name("threads")
                .long("threads")
                .help("number of threads used to write cycle files (0 uses all cores)")
                .default_value("1")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verify")
                .long("verify")
                .help("read the written run back and check it for consistency"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("set log level to info, -vv for debug"),
        )
        .get_matches();

    env_logger::Builder::from_env(
        Env::default().default_filter_or(log_level(matches.occurrences_of("verbose"))),
    )
    .init();

    if let Err(e) = run(&matches) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
