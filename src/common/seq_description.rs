//! Parse the description line of an Illumina FASTQ record into its fields.
//!
//! Grammar of a description line:
//!
//! ```text
//! <instrument>:<run_number>:<flowcell_id>:<lane>:<tile>[:<x_pos>][:<y_pos>][:<UMI>] <read>:<is_filtered>:<control_number>:<index>
//! ```
//!
//! Anything after the `index` field is ignored, as are characters past the
//! longest valid `index` prefix.

use log::debug;

use crate::errors::{Fastq2BclError, Result};

/// Fields of a validated description. `umi` is the only optional one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqDescription {
    pub instrument: String,
    pub run_number: String,
    pub flowcell_id: String,
    pub lane: String,
    pub tile: String,
    pub x_pos: String,
    pub y_pos: String,
    pub umi: Option<String>,
    pub read: String,
    pub is_filtered: String,
    pub control_number: String,
    pub index: String,
}

/// Fields as captured by the grammar, before the required ones are checked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields {
    pub instrument: String,
    pub run_number: String,
    pub flowcell_id: String,
    pub lane: String,
    pub tile: String,
    pub x_pos: Option<String>,
    pub y_pos: Option<String>,
    pub umi: Option<String>,
    pub read: String,
    pub is_filtered: String,
    pub control_number: String,
    pub index: String,
}

/// Outcome of matching a line against the grammar
#[derive(Debug, PartialEq, Eq)]
pub enum Scan {
    Matched(RawFields),
    NoMatch(&'static str),
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_instrument(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn is_flowcell(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

fn is_umi(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_uppercase() || b == b'-')
}

fn is_filter_flag(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b == b'Y' || b == b'N')
}

/// longest prefix made of `[0-9A-Z+]`
fn index_prefix(s: &str) -> &str {
    let end = s
        .bytes()
        .position(|b| !(b.is_ascii_digit() || b.is_ascii_uppercase() || b == b'+'))
        .unwrap_or_else(|| s.len());
    &s[..end]
}

/// Match the id half (`instrument:...:tile[:x][:y][:umi]`)
fn scan_id(id: &str, fields: &mut RawFields) -> std::result::Result<(), &'static str> {
    let parts: Vec<&str> = id.split(':').collect();
    if parts.len() < 5 {
        return Err("expected at least five ':' separated fields before the space");
    }

    if !is_instrument(parts[0]) {
        return Err("bad instrument");
    }
    if !is_digits(parts[1]) {
        return Err("bad run number");
    }
    if !is_flowcell(parts[2]) {
        return Err("bad flowcell id");
    }
    if !is_digits(parts[3]) {
        return Err("bad lane");
    }
    if !is_digits(parts[4]) {
        return Err("bad tile");
    }

    fields.instrument = parts[0].to_owned();
    fields.run_number = parts[1].to_owned();
    fields.flowcell_id = parts[2].to_owned();
    fields.lane = parts[3].to_owned();
    fields.tile = parts[4].to_owned();

    // the trailing parts fill x, y and UMI in order; each slot may be skipped
    // (an empty part or a part that only fits a later slot leaves it unset)
    let mut slot = 0;
    for part in &parts[5..] {
        loop {
            let fits = match slot {
                0 | 1 => part.is_empty() || is_digits(part),
                2 => part.is_empty() || is_umi(part),
                _ => return Err("unexpected trailing field in read id"),
            };
            if fits {
                break;
            }
            slot += 1;
        }

        if !part.is_empty() {
            let value = Some((*part).to_owned());
            match slot {
                0 => fields.x_pos = value,
                1 => fields.y_pos = value,
                _ => fields.umi = value,
            }
        }
        slot += 1;
    }

    Ok(())
}

/// Match the comment half (`read:is_filtered:control_number:index`)
fn scan_comment(comment: &str, fields: &mut RawFields) -> std::result::Result<(), &'static str> {
    let mut parts = comment.splitn(4, ':');

    let read = parts.next().unwrap_or("");
    let is_filtered = parts.next().ok_or("missing is_filtered")?;
    let control_number = parts.next().ok_or("missing control number")?;
    let index = index_prefix(parts.next().ok_or("missing index")?);

    if !is_digits(read) {
        return Err("bad read number");
    }
    if !is_filter_flag(is_filtered) {
        return Err("bad filter flag");
    }
    if !is_digits(control_number) {
        return Err("bad control number");
    }
    if index.is_empty() {
        return Err("bad index");
    }

    fields.read = read.to_owned();
    fields.is_filtered = is_filtered.to_owned();
    fields.control_number = control_number.to_owned();
    fields.index = index.to_owned();

    Ok(())
}

/// Match a description line against the grammar without validating it
pub fn scan_seq_description(text: &str) -> Scan {
    let (split, sep) = match text.char_indices().find(|(_, c)| c.is_whitespace()) {
        Some(found) => found,
        None => return Scan::NoMatch("no whitespace between read id and comment"),
    };
    // exactly one whitespace character separates the halves; it may be wider than a byte
    let (id, comment) = (&text[..split], &text[split + sep.len_utf8()..]);

    let mut fields = RawFields::default();

    if let Err(reason) = scan_id(id, &mut fields) {
        return Scan::NoMatch(reason);
    }
    if let Err(reason) = scan_comment(comment, &mut fields) {
        return Scan::NoMatch(reason);
    }

    Scan::Matched(fields)
}

fn required(
    field: &'static str,
    value: Option<String>,
    description: &str,
) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => {
            debug!("Found key {} with value {}", field, v);
            Ok(v)
        }
        _ => Err(Fastq2BclError::MissingField {
            field,
            description: description.to_owned(),
        }),
    }
}

impl RawFields {
    /// Check that every required field was captured
    pub fn validate(self, description: &str) -> Result<SeqDescription> {
        let umi = self.umi.filter(|u| !u.is_empty());
        if umi.is_none() {
            debug!("Found None value for optional key UMI");
        }

        Ok(SeqDescription {
            instrument: required("instrument", Some(self.instrument), description)?,
            run_number: required("run_number", Some(self.run_number), description)?,
            flowcell_id: required("flowcell_id", Some(self.flowcell_id), description)?,
            lane: required("lane", Some(self.lane), description)?,
            tile: required("tile", Some(self.tile), description)?,
            x_pos: required("x_pos", self.x_pos, description)?,
            y_pos: required("y_pos", self.y_pos, description)?,
            umi,
            read: required("read", Some(self.read), description)?,
            is_filtered: required("is_filtered", Some(self.is_filtered), description)?,
            control_number: required("control_number", Some(self.control_number), description)?,
            index: required("index", Some(self.index), description)?,
        })
    }
}

/// Parse and validate a FASTQ description line
pub fn parse_seq_description(text: &str) -> Result<SeqDescription> {
    match scan_seq_description(text) {
        Scan::Matched(fields) => fields.validate(text),
        Scan::NoMatch(reason) => Err(Fastq2BclError::MalformedDescription {
            description: text.to_owned(),
            reason: reason.to_owned(),
        }),
    }
}

impl SeqDescription {
    /// Field names and values in grammar order, for reporting
    pub fn fields(&self) -> Vec<(&'static str, Option<&str>)> {
        vec![
            ("instrument", Some(self.instrument.as_str())),
            ("run_number", Some(self.run_number.as_str())),
            ("flowcell_id", Some(self.flowcell_id.as_str())),
            ("lane", Some(self.lane.as_str())),
            ("tile", Some(self.tile.as_str())),
            ("x_pos", Some(self.x_pos.as_str())),
            ("y_pos", Some(self.y_pos.as_str())),
            ("UMI", self.umi.as_deref()),
            ("read", Some(self.read.as_str())),
            ("is_filtered", Some(self.is_filtered.as_str())),
            ("control_number", Some(self.control_number.as_str())),
            ("index", Some(self.index.as_str())),
        ]
    }

    /// Index bases carried in the description, if it holds a real index
    /// rather than the sample-number placeholder `1`
    pub fn embedded_index(&self) -> Option<Vec<u8>> {
        if self.index == "1" {
            return None;
        }
        Some(self.index.bytes().filter(|&b| b != b'+').collect())
    }

    /// UMI bases carried in the read id, without the read separators
    pub fn embedded_umi(&self) -> Option<Vec<u8>> {
        self.umi
            .as_ref()
            .map(|u| u.bytes().filter(|&b| b != b'-' && b != b'+').collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected(umi: Option<&str>) -> SeqDescription {
        SeqDescription {
            instrument: "M11111".to_owned(),
            run_number: "222".to_owned(),
            flowcell_id: "000000000-K9H97".to_owned(),
            lane: "1".to_owned(),
            tile: "1101".to_owned(),
            x_pos: "19304".to_owned(),
            y_pos: "1328".to_owned(),
            umi: umi.map(|u| u.to_owned()),
            read: "1".to_owned(),
            is_filtered: "N".to_owned(),
            control_number: "0".to_owned(),
            index: "1".to_owned(),
        }
    }

    #[test]
    fn parse() {
        let fields =
            parse_seq_description("M11111:222:000000000-K9H97:1:1101:19304:1328 1:N:0:1").unwrap();
        assert_eq!(fields, expected(None));
    }

    #[test]
    fn parse_with_umi() {
        let fields =
            parse_seq_description("M11111:222:000000000-K9H97:1:1101:19304:1328:AAACGGG 1:N:0:1")
                .unwrap();
        assert_eq!(fields, expected(Some("AAACGGG")));
        assert_eq!(fields.embedded_umi(), Some(b"AAACGGG".to_vec()));
    }

    #[test]
    fn parse_is_idempotent() {
        let line = "A00111:296:HJCWWDSXX:2:2217:30192:13432:ACGT-TTGA 2:Y:18:ACGTACGT+TTGGCCAA";
        let first = parse_seq_description(line).unwrap();
        let second = parse_seq_description(line).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.index, "ACGTACGT+TTGGCCAA");
        assert_eq!(first.embedded_index(), Some(b"ACGTACGTTTGGCCAA".to_vec()));
        assert_eq!(first.embedded_umi(), Some(b"ACGTTTGA".to_vec()));
    }

    #[test]
    fn sentinel_index_is_not_embedded() {
        let fields = expected(None);
        assert_eq!(fields.embedded_index(), None);
        assert_eq!(fields.embedded_umi(), None);
    }

    #[test]
    fn trailing_text_is_ignored() {
        let fields =
            parse_seq_description("M11111:222:000000000-K9H97:1:1101:19304:1328 1:N:0:1 extra")
                .unwrap();
        assert_eq!(fields, expected(None));
    }

    #[test]
    fn scan_leaves_positions_unset() {
        match scan_seq_description("M11111:222:000000000-K9H97:1:1101:::AAACGGG 1:N:0:1") {
            Scan::Matched(raw) => {
                assert_eq!(raw.x_pos, None);
                assert_eq!(raw.y_pos, None);
                assert_eq!(raw.umi, Some("AAACGGG".to_owned()));
            }
            Scan::NoMatch(reason) => panic!("unexpected mismatch: {}", reason),
        }
    }

    #[test]
    fn fields_in_order() {
        let fields = expected(None);
        let names: Vec<_> = fields.fields().iter().map(|(k, _)| *k).collect();
        assert_eq!(names[0], "instrument");
        assert_eq!(names[7], "UMI");
        assert_eq!(fields.fields()[7].1, None);
    }

    #[test]
    fn too_short() {
        let err = parse_seq_description("AAA:1:2").unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Sequence identifier not recognized: 'AAA:1:2'"));
    }

    #[test]
    fn unicode_separator() {
        for sep in &['\u{a0}', '\u{85}', '\u{3000}'] {
            let line = format!("M11111:222:000000000-K9H97:1:1101:19304:1328{}1:N:0:1", sep);
            assert_eq!(parse_seq_description(&line).unwrap(), expected(None));
        }
    }

    #[test]
    fn unicode_separator_bad_comment() {
        let err = parse_seq_description("M11111:222:000000000-K9H97:1:1101:19304:1328\u{3000}\u{3000}")
            .unwrap_err();
        assert!(matches!(err, Fastq2BclError::MalformedDescription { .. }));
    }

    #[test]
    fn bad_comment() {
        let err = parse_seq_description("M11111:222:000000000-K9H97:1:1101:19304:1328 1:Q:0:1")
            .unwrap_err();
        assert!(err.to_string().ends_with("(bad filter flag)"));
    }

    #[test]
    #[should_panic(expected = r#"MissingField { field: "x_pos""#)]
    fn missing_positions() {
        parse_seq_description("M11111:222:000000000-K9H97:1:1101:::AAACGGG 1:N:0:1").unwrap();
    }

    #[test]
    #[should_panic(expected = r#"MissingField { field: "y_pos""#)]
    fn missing_y() {
        parse_seq_description("M11111:222:000000000-K9H97:1:1101:19304 1:N:0:1").unwrap();
    }
}
