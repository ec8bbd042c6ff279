pub mod errors;

pub mod fastq_reader;
pub mod seq_description;

pub mod assemble_reads;
pub mod mask;

pub mod bcl_encoder;
pub mod filter_encoder;
pub mod locs_encoder;
pub mod run_info_writer;
pub mod run_layout;

pub mod bcl_decoder;
pub mod filter_decoder;
pub mod locs_decoder;
pub mod run_info_parser;

pub mod fastq_run;
pub mod write_run;
