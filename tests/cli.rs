mod common;

use common::*;
use form_sentinel::{journal, BodyPart, Config, Frame, Landmark};
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn squat_recording_counts_reps() {
    let dir = TempDir::new().unwrap();
    let frames: Vec<(f64, Option<Frame>)> = [170.0, 80.0, 170.0, 85.0, 165.0]
        .iter()
        .enumerate()
        .map(|(i, a)| (i as f64 * 0.5, Some(legs_at(*a))))
        .collect();
    let input = write_recording(&dir, "squat.jsonl", &frames);

    sentinel()
        .args(["exercise", "squat", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("squat: 2 reps"));
}

#[test]
fn absent_frames_are_skipped() {
    let dir = TempDir::new().unwrap();
    let frames = vec![
        (0.0, Some(legs_at(170.0))),
        (0.5, None),
        (1.0, Some(legs_at(80.0))),
        (1.5, None),
        (2.0, Some(legs_at(170.0))),
    ];
    let input = write_recording(&dir, "gaps.jsonl", &frames);

    let output = sentinel()
        .args(["--json", "exercise", "squat", "--input"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let lines: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1]["stage"], "down");
    assert_eq!(lines[2]["count"], 1);
    assert_eq!(lines[2]["exercise"], "squat");
}

#[test]
fn plank_reports_longest_hold() {
    let dir = TempDir::new().unwrap();
    let mut frames: Vec<(f64, Option<Frame>)> =
        (0..=4).map(|s| (s as f64, Some(trunk_at(175.0)))).collect();
    frames.push((5.0, Some(trunk_at(150.0))));
    let input = write_recording(&dir, "plank.jsonl", &frames);

    sentinel()
        .args(["exercise", "plank", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("FIX FORM"))
        .stdout(predicate::str::contains("plank: longest hold 4s"));
}

#[test]
fn truncated_frame_fails_with_line_number() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bad.jsonl");
    let short = serde_json::to_string(&vec![Landmark::new(0.5, 0.5); 20]).unwrap();
    std::fs::write(
        &input,
        format!("{{\"t\": 0.0}}\n{{\"t\": 0.1, \"landmarks\": {short}}}\n"),
    )
    .unwrap();

    sentinel()
        .args(["exercise", "squat", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "replay line 2: expected 33 landmarks per frame, got 20",
        ));
}

#[test]
fn slouching_side_view_raises_alarm_and_journals() {
    let dir = TempDir::new().unwrap();
    let frames: Vec<(f64, Option<Frame>)> = (0..=10)
        .map(|i| (i as f64 * 0.5, Some(side_profile(0.2))))
        .collect();
    let side = write_recording(&dir, "side.jsonl", &frames);
    let journal_path = dir.path().join("sessions.csv");

    sentinel()
        .args(["posture", "--user", "tester", "--side"])
        .arg(&side)
        .arg("--journal")
        .arg(&journal_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("alarm=true"))
        .stdout(predicate::str::contains("neck"))
        .stdout(predicate::str::contains("session tester: monitored 5s"));

    let rows = journal::read_all(&journal_path).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user, "tester");
    assert_eq!(rows[0].neck, 1);
    assert_eq!(rows[0].back, 1);
    assert_eq!(rows[0].total_errors, 2);
}

#[test]
fn upright_side_view_stays_quiet() {
    let dir = TempDir::new().unwrap();
    let frames: Vec<(f64, Option<Frame>)> = (0..=10)
        .map(|i| (i as f64 * 0.5, Some(side_profile(0.0))))
        .collect();
    let side = write_recording(&dir, "side.jsonl", &frames);

    sentinel()
        .args(["posture", "--side"])
        .arg(&side)
        .assert()
        .success()
        .stdout(predicate::str::contains("side=good"))
        .stdout(predicate::str::contains("alarm=true").not())
        .stdout(predicate::str::contains("0 errors"));
}

/// Front-facing user; `nose_y` is normalized.
fn facing(nose_y: f32) -> Frame {
    let mut frame = Frame::default();
    frame.set(BodyPart::Nose, Landmark::new(0.5, nose_y));
    frame.set(BodyPart::LeftEar, Landmark::new(0.44, nose_y - 0.03));
    frame.set(BodyPart::RightEar, Landmark::new(0.56, nose_y - 0.03));
    frame.set(BodyPart::LeftShoulder, Landmark::new(0.4, 0.5));
    frame.set(BodyPart::RightShoulder, Landmark::new(0.6, 0.5));
    frame
}

#[test]
fn front_view_needs_calibration() {
    let dir = TempDir::new().unwrap();
    let mut frames = vec![(0.0, Some(facing(0.3)))];
    frames.extend((1..=10).map(|i| (i as f64 * 0.5, Some(facing(0.38)))));
    let front = write_recording(&dir, "front.jsonl", &frames);

    sentinel()
        .args(["posture", "--front"])
        .arg(&front)
        .assert()
        .success()
        .stdout(predicate::str::contains("front=unknown"))
        .stdout(predicate::str::contains("alarm=true").not());

    let output = sentinel()
        .args(["--json", "posture", "--calibrate", "--front"])
        .arg(&front)
        .output()
        .unwrap();
    assert!(output.status.success());

    let lines: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines[0]["front"], true);
    assert_eq!(lines[1]["front"], false);
    assert!(lines.iter().any(|l| l["alarm"] == true));

    let summary = lines.last().unwrap();
    assert_eq!(summary["close"], 1);
}

#[test]
fn posture_requires_a_view() {
    sentinel()
        .arg("posture")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--front or --side"));
}

#[test]
fn profiles_are_listed() {
    sentinel()
        .arg("profiles")
        .assert()
        .success()
        .stdout(predicate::str::contains("standard"))
        .stdout(predicate::str::contains("lenient   neck=50"))
        .stdout(predicate::str::contains("delay=5s"));
}

#[test]
fn init_config_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sentinel.toml");

    sentinel().arg("init-config").arg(&path).assert().success();

    let config = Config::load(&path).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn unknown_profile_in_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("sentinel.toml");
    std::fs::write(&config, "profile = \"sloppy\"\n").unwrap();
    let side = write_recording(&dir, "side.jsonl", &[(0.0, Some(side_profile(0.0)))]);

    sentinel()
        .args(["posture", "--side"])
        .arg(&side)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown threshold profile 'sloppy'"));
}

#[test]
fn finished_view_stops_counting_against_posture() {
    let dir = TempDir::new().unwrap();
    let side_frames: Vec<(f64, Option<Frame>)> = (0..=4)
        .map(|i| (i as f64 * 0.5, Some(side_profile(0.2))))
        .collect();
    let front_frames: Vec<(f64, Option<Frame>)> = (0..=12)
        .map(|i| (i as f64 * 0.5, Some(facing(0.3))))
        .collect();
    let side = write_recording(&dir, "side.jsonl", &side_frames);
    let front = write_recording(&dir, "front.jsonl", &front_frames);

    sentinel()
        .args(["posture", "--calibrate", "--front"])
        .arg(&front)
        .arg("--side")
        .arg(&side)
        .assert()
        .success()
        .stdout(predicate::str::contains("side=bad"))
        .stdout(predicate::str::contains("front=good    side=unknown"))
        .stdout(predicate::str::contains("alarm=true").not())
        .stdout(predicate::str::contains("0 errors"));
}
