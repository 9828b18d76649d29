//! Smoke tests: drive the full stack the way the binary wires it, with
//! real files on both ends.

use std::fs::File;
use std::io::{BufWriter, Read, Write};

use tempfile::tempdir;

use dmsift_actions::{build_pipeline, ExecContext, Mode};
use dmsift_pipeline::{Engine, InputSource};

fn record(type_id: &str, timestamp: &str) -> String {
    format!(
        "<dm_log_packet><pair key=\"type_id\">{type_id}</pair>\
         <pair key=\"timestamp\">{timestamp}</pair></dm_log_packet>\n"
    )
}

#[test]
fn file_to_file_extraction_round_trip() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("capture.xml");
    let output_path = dir.path().join("out.txt");

    let mut input = String::new();
    for i in 0..200 {
        input.push_str(&record(
            &format!("TYPE_{i}"),
            &format!("2020-01-01 00:{:02}:{:02}.000000", i / 60, i % 60),
        ));
    }
    std::fs::write(&input_path, &input).unwrap();

    let inputs = vec![InputSource::new(
        input_path.display().to_string(),
        Box::new(File::open(&input_path).unwrap()),
    )];
    let output: Box<dyn Write + Send> =
        Box::new(BufWriter::new(File::create(&output_path).unwrap()));

    let pipeline = build_pipeline(Mode::Extract(vec!["all_packet_type".into()])).unwrap();
    let context = Engine::new(8, inputs, pipeline, ExecContext::new(output))
        .unwrap()
        .run()
        .unwrap();
    context.finish().unwrap();

    let mut written = String::new();
    File::open(&output_path)
        .unwrap()
        .read_to_string(&mut written)
        .unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 200);
    for (i, line) in lines.iter().enumerate() {
        assert!(line.ends_with(&format!("$ TYPE_{i}")), "line {i}: {line}");
    }
}

#[test]
fn two_input_files_are_processed_in_argument_order() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("a.xml");
    let second = dir.path().join("b.xml");
    std::fs::write(&first, record("FIRST", "2020-01-01 00:00:00")).unwrap();
    std::fs::write(&second, record("SECOND", "2020-01-01 00:00:01")).unwrap();

    let inputs = vec![
        InputSource::new("a.xml", Box::new(File::open(&first).unwrap())),
        InputSource::new("b.xml", Box::new(File::open(&second).unwrap())),
    ];
    let output_path = dir.path().join("out.txt");
    let output: Box<dyn Write + Send> =
        Box::new(BufWriter::new(File::create(&output_path).unwrap()));

    let pipeline = build_pipeline(Mode::Extract(vec!["all_packet_type".into()])).unwrap();
    Engine::new(4, inputs, pipeline, ExecContext::new(output))
        .unwrap()
        .run()
        .unwrap()
        .finish()
        .unwrap();

    let written = std::fs::read_to_string(&output_path).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("FIRST"));
    assert!(lines[1].contains("SECOND"));
}

#[test]
fn truncated_final_record_is_dropped_without_failing() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("truncated.xml");
    let mut text = record("WHOLE", "2020-01-01 00:00:00");
    text.push_str("<dm_log_packet><pair key=\"type_id\">PARTIAL");
    std::fs::write(&input_path, &text).unwrap();

    let inputs = vec![InputSource::new(
        "truncated.xml",
        Box::new(File::open(&input_path).unwrap()),
    )];
    let output_path = dir.path().join("out.txt");
    let output: Box<dyn Write + Send> =
        Box::new(BufWriter::new(File::create(&output_path).unwrap()));

    let pipeline = build_pipeline(Mode::Extract(vec!["all_packet_type".into()])).unwrap();
    Engine::new(2, inputs, pipeline, ExecContext::new(output))
        .unwrap()
        .run()
        .unwrap()
        .finish()
        .unwrap();

    let written = std::fs::read_to_string(&output_path).unwrap();
    assert_eq!(written.lines().count(), 1);
    assert!(written.contains("WHOLE"));
}
