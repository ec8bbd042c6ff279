//! Deserializes the `RunInfo.xml` of a written run back into a struct, so a
//! run folder can be checked against its declared read structure.

use std::{fs::File, path::Path};

use serde::{de, Deserialize};
use serde_xml_rs::from_reader;

use crate::errors::Result;
use crate::mask::ReadSegment;

/// The top-level struct for the contents of RunInfo.xml
#[derive(Debug, PartialEq, Eq)]
pub struct RunInfo {
    /// Version number of this file
    pub version: u32,
    /// Full run id string (date, instrument, number, flowcell)
    pub id: String,
    /// Number representing how many runs this instrument has performed
    pub number: u64,
    /// Flowcell serial number
    pub flowcell: String,
    /// Instrument serial number/identifier
    pub instrument: String,
    /// The date of the run
    pub date: String,
    /// Format of the run: read lengths, and which are indexes
    pub reads: Vec<ReadSegment>,
    /// Flowcell information: number of lanes, surfaces, and tiles
    pub flowcell_layout: FlowcellLayout,
}

impl RunInfo {
    /// Total cycles over all reads
    pub fn num_cycles(&self) -> usize {
        self.reads.iter().map(|r| r.num_cycles as usize).sum()
    }
}

/// Deserialize RunInfo, including flattening the inner Run struct
/// into the top level
impl<'de> Deserialize<'de> for RunInfo {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Outer {
            #[serde(rename = "Version")]
            version: u32,
            #[serde(rename = "Run")]
            run: Inner,
        }

        #[derive(Deserialize)]
        struct Inner {
            #[serde(rename = "Id")]
            id: String,
            #[serde(rename = "Number")]
            number: u64,
            #[serde(rename = "Flowcell")]
            flowcell: String,
            #[serde(rename = "Instrument")]
            instrument: String,
            #[serde(rename = "Date")]
            date: String,
            #[serde(rename = "Reads", deserialize_with = "reads_to_vec")]
            reads: Vec<ReadSegment>,
            #[serde(rename = "FlowcellLayout")]
            flowcell_layout: FlowcellLayout,
        }

        #[derive(Deserialize)]
        struct Reads {
            #[serde(rename = "Read")]
            read: Vec<ReadElement>,
        }

        #[derive(Deserialize)]
        struct ReadElement {
            #[serde(rename = "Number")]
            number: u32,
            #[serde(rename = "NumCycles")]
            num_cycles: u32,
            #[serde(rename = "IsIndexedRead", deserialize_with = "bool_from_string")]
            is_indexed_read: bool,
        }

        fn reads_to_vec<'de, D>(deserializer: D) -> std::result::Result<Vec<ReadSegment>, D::Error>
        where
            D: de::Deserializer<'de>,
        {
            let reads = Reads::deserialize(deserializer)?;

            Ok(reads
                .read
                .into_iter()
                .map(|r| ReadSegment {
                    num_cycles: r.num_cycles,
                    is_index: r.is_indexed_read,
                    number: r.number,
                })
                .collect())
        }

        let helper = Outer::deserialize(deserializer)?;

        Ok(RunInfo {
            version: helper.version,
            id: helper.run.id,
            number: helper.run.number,
            flowcell: helper.run.flowcell,
            instrument: helper.run.instrument,
            date: helper.run.date,
            reads: helper.run.reads,
            flowcell_layout: helper.run.flowcell_layout,
        })
    }
}

/// Convert from Y or N character to a boolean
fn bool_from_string<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: de::Deserializer<'de>,
{
    match String::deserialize(deserializer)?.as_ref() {
        "Y" => Ok(true),
        "N" => Ok(false),
        other => Err(de::Error::invalid_value(
            de::Unexpected::Str(other),
            &"Y or N",
        )),
    }
}

/// Information about the flowcell used in the run
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct FlowcellLayout {
    /// Number of lanes
    #[serde(rename = "LaneCount")]
    pub lane_count: usize,
    /// Number of surfaces per lane
    #[serde(rename = "SurfaceCount")]
    pub surface_count: usize,
    /// Swathes per lane
    #[serde(rename = "SwathCount")]
    pub swath_count: u64,
    /// Number of tiles per swath
    #[serde(rename = "TileCount")]
    pub tile_count: u64,
}

/// Parse a `RunInfo.xml` file into a `RunInfo` struct
pub fn parse_run_info(run_info_path: &Path) -> Result<RunInfo> {
    let run_xml = File::open(run_info_path)?;

    let run_info: RunInfo = from_reader(run_xml)?;

    Ok(run_info)
}
