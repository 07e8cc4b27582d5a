//! Exercise repetition counting and desk-posture feedback from 33-point body
//! landmarks.
//!
//! Pose estimation happens elsewhere. This crate starts from landmark
//! coordinates and turns them into joint angles, then into rep counts, hold
//! timers, posture verdicts and a debounced bad-posture alarm.
//!
//! ```ignore
//! use form_sentinel::{ExerciseClassifier, ExerciseKind, Frame};
//!
//! let mut squat = ExerciseClassifier::new(ExerciseKind::Squat);
//! let frame = Frame::new(landmarks_from_pose_model)?;
//! let report = squat.process(&frame);
//! println!("{} reps, {}", report.count, report.feedback);
//! ```

pub mod alarm;
pub mod config;
pub mod error;
pub mod exercise;
pub mod geometry;
pub mod journal;
pub mod landmark;
pub mod posture;
pub mod replay;
pub mod session;

pub use alarm::{AlarmDebouncer, AlarmTick};
pub use config::{Config, ThresholdProfile, ViewSettings};
pub use error::SentinelError;
pub use exercise::{ExerciseClassifier, ExerciseKind, ExerciseReport, Feedback, JointAngles, Stage};
pub use landmark::{BodyPart, Frame, Landmark, Point2D};
pub use posture::{
    ErrorCategory, FrontMonitor, PostureBaseline, PostureIssue, PostureReport, PostureStatus,
    SideMonitor, View,
};
pub use session::{MonitorSession, SessionSummary, StatusSnapshot};
