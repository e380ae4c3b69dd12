//! End-to-end pipeline tests: real files in, real files out, both parse
//! strategies, compression, and the fast-to-robust retry.

use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;
use tempfile::TempDir;
use trace_slim::filter::FilterConfig;
use trace_slim::pipeline::{run, SlimOptions};
use trace_slim::utils::error::{PipelineError, VerifyError};

fn slim(
    content: &[u8],
    input_name: &str,
    output_name: &str,
    filter: FilterConfig,
) -> (TempDir, PathBuf, Result<(), PipelineError>) {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join(input_name);
    let output = dir.path().join(output_name);
    fs::write(&input, content).unwrap();

    let result = run(&SlimOptions {
        input,
        output: output.clone(),
        filter,
    });
    (dir, output, result)
}

fn events(path: &PathBuf) -> Vec<serde_json::Value> {
    let text = fs::read_to_string(path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    parsed.as_array().unwrap().clone()
}

#[test]
fn test_join_on_single_line_array_uses_full_parser() {
    // A whole-document array on one line defeats the line splitter; the
    // pipeline must transparently retry with the full parser.
    let content = br#"[{"ph":"B","ts":0,"name":"a","cat":"c"},{"ph":"E","ts":100,"name":"a","cat":"c"}]"#;
    let (_dir, output, result) = slim(
        content,
        "in.json",
        "out.json",
        FilterConfig {
            join: true,
            ..Default::default()
        },
    );
    result.unwrap();

    let events = events(&output);
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0],
        serde_json::json!({"ph":"X","ts":0,"dur":100,"cat":"c","name":"a"})
    );
}

#[test]
fn test_multiline_objects_use_full_parser() {
    let content = b"[\n  {\"ph\": \"B\",\n   \"ts\": 0, \"name\": \"a\"},\n  {\"ph\": \"E\", \"ts\": 100, \"name\": \"a\"}\n]\n";
    let (_dir, output, result) = slim(
        content,
        "in.json",
        "out.json",
        FilterConfig {
            join: true,
            ..Default::default()
        },
    );
    result.unwrap();

    let events = events(&output);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["ph"], "X");
    assert_eq!(events[0]["dur"], 100);
}

#[test]
fn test_close_synthesizes_end_for_unterminated_begin() {
    let content = b"{\"ph\":\"B\",\"ts\":0,\"name\":\"a\"},\n{\"ph\":\"I\",\"ts\":50}\n";
    let (_dir, output, result) = slim(
        content,
        "in.json",
        "out.json",
        FilterConfig {
            close: true,
            ..Default::default()
        },
    );
    result.unwrap();

    let events = events(&output);
    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["ph"], "B");
    assert_eq!(events[1]["ph"], "I");
    assert_eq!(events[2]["ph"], "E");
    assert_eq!(events[2]["ts"], 50);
    assert_eq!(events[2]["name"], "a");
}

#[test]
fn test_unterminated_begin_dropped_silently_by_default() {
    let content = b"{\"ph\":\"B\",\"ts\":0,\"name\":\"a\"},\n{\"ph\":\"I\",\"ts\":50}\n";
    let (_dir, output, result) = slim(
        content,
        "in.json",
        "out.json",
        FilterConfig {
            join: true,
            ..Default::default()
        },
    );
    result.unwrap();

    // The held B never gets an E and close was not requested
    let events = events(&output);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["ph"], "I");
}

#[test]
fn test_sample_filter_end_to_end() {
    let content = b"{\"ph\":\"X\",\"ts\":0,\"dur\":0},\n{\"ph\":\"X\",\"ts\":50,\"dur\":10},\n{\"ph\":\"X\",\"ts\":90,\"dur\":10}\n";
    let (_dir, output, result) = slim(
        content,
        "in.json",
        "out.json",
        FilterConfig {
            sample: Some(100),
            ..Default::default()
        },
    );
    result.unwrap();

    let events = events(&output);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["ts"], 0);
    assert_eq!(events[1]["ts"], 90);
}

#[test]
fn test_min_dur_filter_end_to_end() {
    let content = b"{\"ph\":\"X\",\"ts\":0,\"dur\":10},\n{\"ph\":\"X\",\"ts\":20,\"dur\":11}\n";
    let (_dir, output, result) = slim(
        content,
        "in.json",
        "out.json",
        FilterConfig {
            min_dur: Some(10),
            ..Default::default()
        },
    );
    result.unwrap();

    let events = events(&output);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["dur"], 11);
}

#[test]
fn test_everything_filtered_yields_valid_empty_array() {
    let content = b"{\"ph\":\"X\",\"ts\":1,\"dur\":1}\n";
    let (_dir, output, result) = slim(
        content,
        "in.json",
        "out.json",
        FilterConfig {
            min_dur: Some(1000),
            ..Default::default()
        },
    );
    result.unwrap();

    assert_eq!(fs::read_to_string(&output).unwrap(), "[\n]\n");
}

#[test]
fn test_pass_through_events_keep_exact_bytes() {
    // Odd spacing must survive the trip in fast mode...
    let line = "{\"ts\": 5,  \"ph\": \"I\", \"custom\": {\"k\": [1, 2]}}";
    let content = format!("{},\n", line);
    let (_dir, output, result) = slim(
        content.as_bytes(),
        "in.json",
        "out.json",
        FilterConfig::default(),
    );
    result.unwrap();
    assert!(fs::read_to_string(&output).unwrap().contains(line));

    // ...and in robust mode
    let element = "{\"ph\":\"I\",  \"ts\": 1}";
    let content = format!("[ {} ]", element);
    let (_dir, output, result) = slim(
        content.as_bytes(),
        "in.json",
        "out.json",
        FilterConfig::default(),
    );
    result.unwrap();
    assert!(fs::read_to_string(&output).unwrap().contains(element));
}

#[test]
fn test_identical_runs_produce_identical_bytes() {
    let content = b"{\"ph\":\"B\",\"ts\":0,\"name\":\"a\"},\n{\"ph\":\"E\",\"ts\":40,\"name\":\"a\"},\n{\"ph\":\"X\",\"ts\":100,\"dur\":60}\n";
    let filter = FilterConfig {
        join: true,
        sample: Some(50),
        ..Default::default()
    };
    let (_dir1, out1, result1) = slim(content, "in.json", "out.json", filter.clone());
    let (_dir2, out2, result2) = slim(content, "in.json", "out.json", filter);
    result1.unwrap();
    result2.unwrap();
    assert_eq!(fs::read(&out1).unwrap(), fs::read(&out2).unwrap());
}

#[test]
fn test_verify_mismatch_aborts_the_run() {
    let content = b"{\"ph\":\"B\",\"ts\":0,\"name\":\"a\"},\n{\"ph\":\"E\",\"ts\":10,\"name\":\"b\"}\n";
    let (_dir, _output, result) = slim(
        content,
        "in.json",
        "out.json",
        FilterConfig {
            verify: true,
            ..Default::default()
        },
    );
    let err = result.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Verify(VerifyError::Mismatch { field: "name", .. })
    ));
}

#[test]
fn test_end_without_begin_aborts_the_run() {
    let content = b"{\"ph\":\"E\",\"ts\":10,\"name\":\"a\"}\n";
    let (_dir, _output, result) = slim(
        content,
        "in.json",
        "out.json",
        FilterConfig {
            close: true,
            ..Default::default()
        },
    );
    let err = result.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Verify(VerifyError::UnmatchedEnd(_))
    ));
}

#[test]
fn test_unparseable_input_fails_in_both_modes() {
    let (_dir, _output, result) = slim(
        b"this is not json at all\n",
        "in.json",
        "out.json",
        FilterConfig::default(),
    );
    assert!(matches!(result.unwrap_err(), PipelineError::Parse(_)));
}

#[test]
fn test_gzip_input_and_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.json.gz");
    let output = dir.path().join("out.json.gz");

    let mut encoder =
        flate2::write::GzEncoder::new(fs::File::create(&input).unwrap(), flate2::Compression::default());
    encoder
        .write_all(b"{\"ph\":\"B\",\"ts\":0,\"name\":\"a\"},\n{\"ph\":\"E\",\"ts\":100,\"name\":\"a\"}\n")
        .unwrap();
    encoder.finish().unwrap();

    run(&SlimOptions {
        input,
        output: output.clone(),
        filter: FilterConfig {
            join: true,
            ..Default::default()
        },
    })
    .unwrap();

    let mut decoded = String::new();
    flate2::read::MultiGzDecoder::new(fs::File::open(&output).unwrap())
        .read_to_string(&mut decoded)
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&decoded).unwrap();
    let events = parsed.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["ph"], "X");
    assert_eq!(events[0]["dur"], 100);
}

#[test]
fn test_brotli_input_and_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.json.br");
    let output = dir.path().join("out.json.br");

    {
        let mut writer =
            brotli::CompressorWriter::new(fs::File::create(&input).unwrap(), 4096, 5, 22);
        writer
            .write_all(b"{\"ph\":\"I\",\"ts\":1},\n{\"ph\":\"X\",\"ts\":0,\"dur\":10}\n")
            .unwrap();
    }

    run(&SlimOptions {
        input,
        output: output.clone(),
        filter: FilterConfig::default(),
    })
    .unwrap();

    let mut decoded = String::new();
    brotli::Decompressor::new(fs::File::open(&output).unwrap(), 4096)
        .read_to_string(&mut decoded)
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&decoded).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 2);
}
