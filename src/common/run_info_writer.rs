//! Render `RunInfo.xml` for a synthetic run: one lane, one tile, and one
//! `<Read>` element per read of the mask.

use std::{
    fs::{create_dir_all, File},
    io::prelude::*,
    path::Path,
};

use itertools::Itertools;

use crate::mask::{Mask, ReadSegment};

fn read_element(read: &ReadSegment) -> String {
    format!(
        r#"            <Read NumCycles="{}" Number="{}" IsIndexedRead="{}" />"#,
        read.num_cycles,
        read.number,
        if read.is_index { 'Y' } else { 'N' },
    )
}

pub fn generate_run_info_xml(
    run_id: &str,
    run_number: &str,
    flowcell_id: &str,
    instrument: &str,
    mask: &Mask,
) -> String {
    let reads = mask.reads().iter().map(read_element).join("\n");

    format!(
        r#"<?xml version="1.0"?>
<RunInfo xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" Version="2">
    <Run Id="{}" Number="{}">
        <Flowcell>{}</Flowcell>
        <Instrument>{}</Instrument>
        <Date>YYMMDD</Date>
        <Reads>
{}
        </Reads>
        <FlowcellLayout LaneCount="1" SurfaceCount="1" SwathCount="1" TileCount="1" />
    </Run>
</RunInfo>
"#,
        run_id, run_number, flowcell_id, instrument, reads,
    )
}

/// Write `RunInfo.xml` to `run_info_path` and return its contents
pub fn write_run_info_xml(
    run_info_path: &Path,
    run_id: &str,
    run_number: &str,
    flowcell_id: &str,
    instrument: &str,
    mask: &Mask,
) -> std::io::Result<String> {
    let run_info = generate_run_info_xml(run_id, run_number, flowcell_id, instrument, mask);

    if let Some(parent) = run_info_path.parent() {
        create_dir_all(parent)?;
    }
    File::create(run_info_path)?.write_all(run_info.as_bytes())?;

    Ok(run_info)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED_XML: &str = r#"<?xml version="1.0"?>
<RunInfo xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" Version="2">
    <Run Id="YYMMDD_M11111_0222_000000000-K9H97" Number="222">
        <Flowcell>000000000-K9H97</Flowcell>
        <Instrument>M11111</Instrument>
        <Date>YYMMDD</Date>
        <Reads>
            <Read NumCycles="110" Number="1" IsIndexedRead="N" />
        </Reads>
        <FlowcellLayout LaneCount="1" SurfaceCount="1" SwathCount="1" TileCount="1" />
    </Run>
</RunInfo>
"#;

    #[test]
    fn generate() {
        let mask: Mask = "110N".parse().unwrap();
        let xml = generate_run_info_xml(
            "YYMMDD_M11111_0222_000000000-K9H97",
            "222",
            "000000000-K9H97",
            "M11111",
            &mask,
        );
        assert_eq!(xml, EXPECTED_XML);
    }

    #[test]
    fn one_element_per_read() {
        let mask: Mask = "151N8Y8Y151N".parse().unwrap();
        let xml = generate_run_info_xml("run", "1", "FC", "A00111", &mask);

        assert!(xml.contains(r#"<Read NumCycles="151" Number="1" IsIndexedRead="N" />"#));
        assert!(xml.contains(r#"<Read NumCycles="8" Number="2" IsIndexedRead="Y" />"#));
        assert!(xml.contains(r#"<Read NumCycles="8" Number="3" IsIndexedRead="Y" />"#));
        assert!(xml.contains(r#"<Read NumCycles="151" Number="4" IsIndexedRead="N" />"#));
        assert_eq!(xml.matches("<Read ").count(), 4);
    }

    #[test]
    fn write() {
        let dir = tempfile::tempdir().unwrap();
        let run_info_path = dir.path().join("YYMMDD_M11111_0222_000000000-K9H97/RunInfo.xml");
        let mask: Mask = "110N".parse().unwrap();

        let xml = write_run_info_xml(
            &run_info_path,
            "YYMMDD_M11111_0222_000000000-K9H97",
            "222",
            "000000000-K9H97",
            "M11111",
            &mask,
        )
        .unwrap();

        assert_eq!(std::fs::read_to_string(&run_info_path).unwrap(), xml);
        assert_eq!(xml, EXPECTED_XML);
    }
}
