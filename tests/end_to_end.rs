use std::fs;
use std::io::Write;

use tempfile::{tempdir, NamedTempFile};
use tobii_split::{PipelineConfig, TobiiDataProcess};

const HEADER: &str = "Recording timestamp\tComputer timestamp\tSensor\tParticipant name\tRecording name\tRecording start time\tPresented Stimulus name\tGaze point X";

fn write_export(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file.flush().unwrap();
    file
}

fn config(save_folder: &std::path::Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.partition.groupby_column = Some("Recording name".to_string());
    config.format.delete_stimulus_names = vec!["Text".to_string()];
    config.output.save_folder = save_folder.to_path_buf();
    config
}

#[test]
fn formats_and_writes_reference_recording() {
    let export = write_export(&[
        "0\t100\tEye Tracker\tP1\tG1\t10:00:00.000\t\t500",
        "4\t104\tEye Tracker\tP1\tG1\t10:00:00.000\tText\t501",
        "8\t108\tEye Tracker\tP1\tG1\t10:00:00.000\tImageA\t502",
        "12\t112\tEye Tracker\tP1\tG1\t10:00:00.000\tImageA\t503",
    ]);
    let out = tempdir().unwrap();

    let mut process = TobiiDataProcess::load(export.path(), config(out.path())).unwrap();
    process.divide().unwrap();
    let format_report = process.format();
    let save_report = process.save().unwrap();

    assert!(format_report.is_clean());
    assert!(save_report.is_clean());

    let content = fs::read_to_string(out.path().join("G1_P1.csv")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            "time,Participant name,Recording name,Presented Stimulus name,Gaze point X",
            "10:00:00.008000,P1,G1,ImageA,502",
            "10:00:00.012000,P1,G1,ImageA,503",
        ]
    );
}

#[test]
fn nan_stimulus_rows_are_dropped() {
    let export = write_export(&[
        "0\t100\tEye Tracker\tP1\tG1\t10:00:00.000\tNaN\t500",
        "4\t104\tEye Tracker\tP1\tG1\t10:00:00.000\tImageA\t501",
    ]);
    let out = tempdir().unwrap();

    let mut process = TobiiDataProcess::load(export.path(), config(out.path())).unwrap();
    process.divide().unwrap();
    assert!(process.format().is_clean());
    process.save().unwrap();

    let content = fs::read_to_string(out.path().join("G1_P1.csv")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[1..], ["10:00:00.004000,P1,G1,ImageA,501"]);
}

#[test]
fn failed_subset_is_written_unformatted() {
    let export = write_export(&[
        "0\t100\tEye Tracker\tP1\tA\t10:00:00.000\tImageA\t1",
        "0\t100\tEye Tracker\tP2\tB\t10.00.00\tImageB\t2",
        "0\t100\tEye Tracker\tP3\tC\t11:00:00.000\tImageC\t3",
        "4\t104\tEye Tracker\tP3\tC\t11:00:00.000\tImageC\t4",
    ]);
    let out = tempdir().unwrap();

    let mut process = TobiiDataProcess::load(export.path(), config(out.path())).unwrap();
    process.divide().unwrap();
    let format_report = process.format();
    let save_report = process.save().unwrap();

    let failed: Vec<&str> = format_report.failed().map(|(key, _)| key).collect();
    assert_eq!(failed, vec!["B_P2"]);
    assert_eq!(save_report.written.len(), 3);

    let b = fs::read_to_string(out.path().join("B_P2.csv")).unwrap();
    assert_eq!(b.lines().next(), Some(HEADER.replace('\t', ",").as_str()));

    let c = fs::read_to_string(out.path().join("C_P3.csv")).unwrap();
    let c_lines: Vec<&str> = c.lines().collect();
    assert_eq!(c_lines.len(), 3);
    assert!(c_lines[1].starts_with("11:00:00,"));
    assert!(c_lines[2].starts_with("11:00:00.004000,"));
}

#[test]
fn save_fails_when_folder_is_missing() {
    let export = write_export(&["0\t100\tEye Tracker\tP1\tG1\t10:00:00.000\tImageA\t1"]);
    let out = tempdir().unwrap();
    let missing = out.path().join("not-created");

    let mut process = TobiiDataProcess::load(export.path(), config(&missing)).unwrap();
    process.divide().unwrap();
    process.format();

    assert!(process.save().is_err());
    assert!(!missing.exists());
}
