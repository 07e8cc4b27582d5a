#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use form_sentinel::{BodyPart, Frame, Landmark};
use tempfile::TempDir;

pub fn sentinel() -> Command {
    let mut cmd = Command::cargo_bin("form-sentinel").unwrap();
    cmd.env("RUST_LOG", "warn");
    cmd
}

/// Places `a`, vertex `b` and `c` so the angle at `b` is `degrees`.
pub fn bend(frame: &mut Frame, parts: [BodyPart; 3], origin: (f32, f32), degrees: f32) {
    let (ox, oy) = origin;
    let r = 0.15;
    let rad = degrees.to_radians();
    frame.set(parts[0], Landmark::new(ox, oy - r));
    frame.set(parts[1], Landmark::new(ox, oy));
    frame.set(parts[2], Landmark::new(ox + r * rad.sin(), oy - r * rad.cos()));
}

pub fn legs_at(degrees: f32) -> Frame {
    let mut frame = Frame::default();
    bend(
        &mut frame,
        [BodyPart::LeftHip, BodyPart::LeftKnee, BodyPart::LeftAnkle],
        (0.4, 0.6),
        degrees,
    );
    bend(
        &mut frame,
        [BodyPart::RightHip, BodyPart::RightKnee, BodyPart::RightAnkle],
        (0.6, 0.6),
        degrees,
    );
    frame
}

pub fn trunk_at(degrees: f32) -> Frame {
    let mut frame = Frame::default();
    bend(
        &mut frame,
        [BodyPart::LeftShoulder, BodyPart::LeftHip, BodyPart::LeftKnee],
        (0.5, 0.5),
        degrees,
    );
    frame
}

/// Left profile in normalized coordinates. `ear_dx` pushes the head forward.
pub fn side_profile(ear_dx: f32) -> Frame {
    let mut frame = Frame::default();
    frame.set(BodyPart::LeftHip, Landmark::new(0.5, 0.7));
    frame.set(BodyPart::LeftShoulder, Landmark::new(0.5, 0.4));
    frame.set(BodyPart::LeftEar, Landmark::new(0.5 + ear_dx, 0.3));
    frame
}

/// Writes a JSON-lines recording; `None` frames become absences.
pub fn write_recording(dir: &TempDir, name: &str, frames: &[(f64, Option<Frame>)]) -> PathBuf {
    let mut out = String::new();
    for (t, frame) in frames {
        let landmarks = match frame {
            Some(frame) => serde_json::to_string(frame.landmarks()).unwrap(),
            None => "null".to_string(),
        };
        out.push_str(&format!("{{\"t\": {t}, \"landmarks\": {landmarks}}}\n"));
    }
    let path = dir.path().join(name);
    fs::write(&path, out).unwrap();
    path
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}
