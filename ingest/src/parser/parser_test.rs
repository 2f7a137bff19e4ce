use super::{parse_file, parse_file_name, parse_output, ParseError, RunParameters};
use crate::identifier::Identifier;
use std::fs;

const OUTPUT: &str = "\
Allocated 64 DPU(s)
NR_TASKLETS\t16\tBL\t10
CPU-DPU Time (ms): 1.25\tDPU Kernel Time (ms): 10.5\tInter-DPU Time (ms): 0.5\tDPU-CPU Time (ms): 2
[OK] Outputs are equal
";

fn id(measure: &str) -> Identifier {
    Identifier::new("BS", 16, 10, 64, measure).unwrap()
}

#[test]
pub fn file_name_with_suffix() {
    assert_eq!(
        parse_file_name("out_tl2_bl1_dpus4_suffix").unwrap(),
        RunParameters {
            tasklets: 2,
            bl: 1,
            dpus: 4
        }
    );
}

#[test]
pub fn file_name_without_out_prefix() {
    assert!(matches!(
        parse_file_name("foo_tl2_bl1_dpus4"),
        Err(ParseError::NotAnOutput { .. })
    ));
}

#[test]
pub fn file_name_with_bad_segments() {
    assert!(matches!(
        parse_file_name("out_tlx_bl1_dpus4"),
        Err(ParseError::InvalidInteger { .. })
    ));
    assert!(matches!(
        parse_file_name("out_tl2_bl1"),
        Err(ParseError::MissingSegment { prefix: "dpus", .. })
    ));
    assert!(matches!(
        parse_file_name("out_bl1_tl2_dpus4"),
        Err(ParseError::MissingSegment { prefix: "tl", .. })
    ));
}

#[test]
pub fn extracts_measurement_fields() {
    let run = parse_output("BS", "out_tl16_bl10_dpus64", OUTPUT).unwrap();

    assert_eq!(run.len(), 4);
    assert_eq!(run.get(&id("CPU-DPU Time (ms)")), Some(1.25));
    assert_eq!(run.get(&id("DPU Kernel Time (ms)")), Some(10.5));
    assert_eq!(run.get(&id("Inter-DPU Time (ms)")), Some(0.5));
    assert_eq!(run.get(&id("DPU-CPU Time (ms)")), Some(2.0));
}

#[test]
pub fn ignores_lines_without_prefix() {
    let content = "DPU Kernel Time (ms): 3.0\n  CPU time (ms): 4.0\n";

    let run = parse_output("BS", "out_tl16_bl10_dpus64", content).unwrap();

    assert!(run.is_empty());
}

#[test]
pub fn later_line_wins() {
    let content = "CPU time (ms): 1.0\r\nCPU time (ms): 2.0\r\n";

    let run = parse_output("BS", "out_tl16_bl10_dpus64", content).unwrap();

    assert_eq!(run.len(), 1);
    assert_eq!(run.get(&id("CPU time (ms)")), Some(2.0));
}

#[test]
pub fn rejects_non_numeric_values() {
    let content = "CPU time (ms): fast\n";

    assert!(matches!(
        parse_output("BS", "out_tl16_bl10_dpus64", content),
        Err(ParseError::InvalidValue { line: 1, .. })
    ));
    assert!(matches!(
        parse_output("BS", "out_tl16_bl10_dpus64", "\nCPU time (ms): nan\n"),
        Err(ParseError::NonFiniteValue { line: 2, .. })
    ));
}

#[test]
pub fn rejects_separator_in_measure() {
    assert!(matches!(
        parse_output("BS", "out_tl16_bl10_dpus64", "CPU:time (ms): 1.0\n"),
        Err(ParseError::InvalidMeasure { .. })
    ));
}

#[test]
pub fn reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out_tl16_bl10_dpus64_run1");
    fs::write(&path, OUTPUT).unwrap();

    let run = parse_file(&path, "BS").unwrap();

    assert_eq!(run.len(), 4);
    assert!(matches!(
        parse_file(dir.path().join("out_tl1_bl1_dpus1"), "BS"),
        Err(ParseError::Read { .. })
    ));
}
