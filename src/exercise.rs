//! Repetition counters and the plank hold timer.
//!
//! Every classifier reduces a frame to one or two joint angles and feeds them
//! through a small hysteresis state machine. The count only moves on the
//! transition into the "closing" stage, which is unreachable from itself, so
//! jitter around a single threshold never double-counts.
//!
//! A frame whose tracked joints collapse onto each other has no angle. It
//! leaves every counter where it was and breaks a plank hold.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::geometry::{try_angle, DEGENERATE_ANGLE};
use crate::landmark::{BodyPart, Frame};

const DEPTH_ENGAGE: f32 = 90.0;
const DEPTH_WARNING: f32 = 100.0;
const EXTENSION_RELEASE: f32 = 160.0;

const JACK_RAISED: f32 = 160.0;
const JACK_CLOSED: f32 = 30.0;

const KNEE_RAISED: f32 = 110.0;
const KNEE_LOWERED: f32 = 160.0;

const BEND_ENGAGE: f32 = 155.0;
const BEND_UPRIGHT: f32 = 170.0;

const PLANK_MIN: f32 = 165.0;
const PLANK_MAX: f32 = 185.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseKind {
    Squat,
    #[value(name = "pushup")]
    #[serde(rename = "pushup")]
    PushUp,
    JumpingJack,
    SideBend,
    HighKnees,
    Plank,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 6] = [
        ExerciseKind::Squat,
        ExerciseKind::PushUp,
        ExerciseKind::JumpingJack,
        ExerciseKind::SideBend,
        ExerciseKind::HighKnees,
        ExerciseKind::Plank,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExerciseKind::Squat => "squat",
            ExerciseKind::PushUp => "pushup",
            ExerciseKind::JumpingJack => "jumping-jack",
            ExerciseKind::SideBend => "side-bend",
            ExerciseKind::HighKnees => "high-knees",
            ExerciseKind::Plank => "plank",
        }
    }

    /// Plank reports whole seconds held instead of repetitions.
    pub fn is_timed(self) -> bool {
        matches!(self, ExerciseKind::Plank)
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExerciseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExerciseKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown exercise '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    #[serde(rename = "up")]
    Up,
    #[serde(rename = "down")]
    Down,
    #[serde(rename = "center")]
    Center,
    #[serde(rename = "left")]
    Left,
    #[serde(rename = "right")]
    Right,
    #[serde(rename = "Hold")]
    Hold,
    #[serde(rename = "FIX FORM")]
    FixForm,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Up => "up",
            Stage::Down => "down",
            Stage::Center => "center",
            Stage::Left => "left",
            Stage::Right => "right",
            Stage::Hold => "Hold",
            Stage::FixForm => "FIX FORM",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Ready,
    Cue,
    Good,
    GoDeeper,
    WrongForm,
}

/// Advisory text forwarded to the caller. Never drives control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub text: &'static str,
}

impl Feedback {
    const fn new(kind: FeedbackKind, text: &'static str) -> Self {
        Self { kind, text }
    }

    /// Downstream consumers look for the "Good" keyword, so every good-form
    /// text carries it.
    pub fn is_good(&self) -> bool {
        self.text.contains("Good")
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text)
    }
}

const READY: Feedback = Feedback::new(FeedbackKind::Ready, "Ready");

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExerciseReport {
    /// Representative angle in degrees.
    pub angle: f32,
    /// Repetitions, or whole seconds held for timed exercises.
    pub count: u32,
    pub feedback: Feedback,
    pub stage: Stage,
}

/// Bilateral joint angles measured from one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointAngles {
    pub left: f32,
    pub right: f32,
}

impl JointAngles {
    pub fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Same angle on both sides.
    pub fn uniform(angle: f32) -> Self {
        Self::new(angle, angle)
    }

    pub fn average(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn min(&self) -> f32 {
        self.left.min(self.right)
    }
}

fn joint(frame: &Frame, [a, vertex, c]: [BodyPart; 3]) -> Option<f32> {
    try_angle(frame.point(a), frame.point(vertex), frame.point(c))
}

fn bilateral(frame: &Frame, left: [BodyPart; 3], right: [BodyPart; 3]) -> Option<JointAngles> {
    Some(JointAngles::new(joint(frame, left)?, joint(frame, right)?))
}

const LEFT_LEG: [BodyPart; 3] = [BodyPart::LeftHip, BodyPart::LeftKnee, BodyPart::LeftAnkle];
const RIGHT_LEG: [BodyPart; 3] = [BodyPart::RightHip, BodyPart::RightKnee, BodyPart::RightAnkle];
const LEFT_ARM: [BodyPart; 3] = [BodyPart::LeftShoulder, BodyPart::LeftElbow, BodyPart::LeftWrist];
const RIGHT_ARM: [BodyPart; 3] = [
    BodyPart::RightShoulder,
    BodyPart::RightElbow,
    BodyPart::RightWrist,
];
const LEFT_ARMPIT: [BodyPart; 3] = [BodyPart::LeftHip, BodyPart::LeftShoulder, BodyPart::LeftElbow];
const RIGHT_ARMPIT: [BodyPart; 3] = [
    BodyPart::RightHip,
    BodyPart::RightShoulder,
    BodyPart::RightElbow,
];
const LEFT_TRUNK: [BodyPart; 3] = [BodyPart::LeftShoulder, BodyPart::LeftHip, BodyPart::LeftKnee];
const RIGHT_TRUNK: [BodyPart; 3] = [
    BodyPart::RightShoulder,
    BodyPart::RightHip,
    BodyPart::RightKnee,
];

/// Texts for one bend-and-extend exercise.
#[derive(Debug, Clone, Copy)]
struct FlexionCues {
    name: &'static str,
    bottom: Feedback,
    counted: Feedback,
    shallow: Feedback,
}

/// Shared down/up machine behind squats and push-ups.
#[derive(Debug, Clone)]
struct FlexionCounter {
    cues: FlexionCues,
    stage: Stage,
    counter: u32,
    feedback: Feedback,
}

impl FlexionCounter {
    fn new(cues: FlexionCues) -> Self {
        Self {
            cues,
            stage: Stage::Up,
            counter: 0,
            feedback: READY,
        }
    }

    fn reset(&mut self) {
        *self = Self::new(self.cues);
    }

    fn advance(&mut self, angle: f32) -> ExerciseReport {
        if angle < DEPTH_ENGAGE {
            if self.stage != Stage::Down {
                debug!(exercise = self.cues.name, angle, "reached bottom");
            }
            self.stage = Stage::Down;
            self.feedback = self.cues.bottom;
        }

        if angle > EXTENSION_RELEASE && self.stage == Stage::Down {
            self.stage = Stage::Up;
            self.counter += 1;
            self.feedback = self.cues.counted;
            info!(exercise = self.cues.name, count = self.counter, "rep counted");
        }

        if self.stage == Stage::Down && angle > DEPTH_WARNING {
            self.feedback = self.cues.shallow;
        }

        self.report(angle)
    }

    fn report(&self, angle: f32) -> ExerciseReport {
        ExerciseReport {
            angle,
            count: self.counter,
            feedback: self.feedback,
            stage: self.stage,
        }
    }
}

/// Knee flexion, averaged over both legs.
#[derive(Debug, Clone)]
pub struct Squat(FlexionCounter);

impl Squat {
    const CUES: FlexionCues = FlexionCues {
        name: "squat",
        bottom: Feedback::new(FeedbackKind::Good, "Good! Keep your back straight"),
        counted: Feedback::new(FeedbackKind::Good, "Good rep!"),
        shallow: Feedback::new(FeedbackKind::GoDeeper, "Lower your hips!"),
    };

    pub fn new() -> Self {
        Self(FlexionCounter::new(Self::CUES))
    }

    pub fn reset(&mut self) {
        self.0.reset();
    }

    pub fn measure(frame: &Frame) -> Option<JointAngles> {
        bilateral(frame, LEFT_LEG, RIGHT_LEG)
    }

    pub fn advance(&mut self, angles: JointAngles) -> ExerciseReport {
        self.0.advance(angles.average())
    }
}

impl Default for Squat {
    fn default() -> Self {
        Self::new()
    }
}

/// Elbow flexion, averaged over both arms.
#[derive(Debug, Clone)]
pub struct PushUp(FlexionCounter);

impl PushUp {
    const CUES: FlexionCues = FlexionCues {
        name: "pushup",
        bottom: Feedback::new(FeedbackKind::Cue, "Keep your body straight"),
        counted: Feedback::new(FeedbackKind::Good, "Good job!"),
        shallow: Feedback::new(FeedbackKind::GoDeeper, "Go deeper!"),
    };

    pub fn new() -> Self {
        Self(FlexionCounter::new(Self::CUES))
    }

    pub fn reset(&mut self) {
        self.0.reset();
    }

    pub fn measure(frame: &Frame) -> Option<JointAngles> {
        bilateral(frame, LEFT_ARM, RIGHT_ARM)
    }

    pub fn advance(&mut self, angles: JointAngles) -> ExerciseReport {
        self.0.advance(angles.average())
    }
}

impl Default for PushUp {
    fn default() -> Self {
        Self::new()
    }
}

/// Arm abduction at the shoulder, averaged over both sides.
#[derive(Debug, Clone)]
pub struct JumpingJack {
    stage: Stage,
    counter: u32,
    feedback: Feedback,
}

impl JumpingJack {
    pub fn new() -> Self {
        Self {
            stage: Stage::Down,
            counter: 0,
            feedback: READY,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn measure(frame: &Frame) -> Option<JointAngles> {
        bilateral(frame, LEFT_ARMPIT, RIGHT_ARMPIT)
    }

    pub fn advance(&mut self, angles: JointAngles) -> ExerciseReport {
        let angle = angles.average();

        if angle > JACK_RAISED {
            self.stage = Stage::Up;
            self.feedback = Feedback::new(FeedbackKind::Cue, "Clap!");
        }

        if angle < JACK_CLOSED && self.stage == Stage::Up {
            self.stage = Stage::Down;
            self.counter += 1;
            self.feedback = Feedback::new(FeedbackKind::Good, "Good!");
            info!(exercise = "jumping-jack", count = self.counter, "rep counted");
        }

        self.report(angle)
    }

    fn report(&self, angle: f32) -> ExerciseReport {
        ExerciseReport {
            angle,
            count: self.counter,
            feedback: self.feedback,
            stage: self.stage,
        }
    }
}

impl Default for JumpingJack {
    fn default() -> Self {
        Self::new()
    }
}

/// Hip flexion of whichever leg is higher. Counts on the way up.
#[derive(Debug, Clone)]
pub struct HighKnees {
    stage: Stage,
    counter: u32,
    feedback: Feedback,
}

impl HighKnees {
    pub fn new() -> Self {
        Self {
            stage: Stage::Down,
            counter: 0,
            feedback: Feedback::new(FeedbackKind::Cue, "Run in place!"),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn measure(frame: &Frame) -> Option<JointAngles> {
        bilateral(frame, LEFT_TRUNK, RIGHT_TRUNK)
    }

    pub fn advance(&mut self, angles: JointAngles) -> ExerciseReport {
        let angle = angles.min();

        if angle < KNEE_RAISED {
            if self.stage == Stage::Down {
                self.stage = Stage::Up;
                self.counter += 1;
                self.feedback = Feedback::new(FeedbackKind::Good, "Good, knees up!");
                info!(exercise = "high-knees", count = self.counter, "rep counted");
            }
        } else if angle > KNEE_LOWERED {
            self.stage = Stage::Down;
        }

        self.report(angle)
    }

    fn report(&self, angle: f32) -> ExerciseReport {
        ExerciseReport {
            angle,
            count: self.counter,
            feedback: self.feedback,
            stage: self.stage,
        }
    }
}

impl Default for HighKnees {
    fn default() -> Self {
        Self::new()
    }
}

/// Lateral trunk flexion, each side tracked independently.
#[derive(Debug, Clone)]
pub struct SideBend {
    stage: Stage,
    counter: u32,
    feedback: Feedback,
}

impl SideBend {
    pub fn new() -> Self {
        Self {
            stage: Stage::Center,
            counter: 0,
            feedback: Feedback::new(FeedbackKind::Cue, "Stand up straight"),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn measure(frame: &Frame) -> Option<JointAngles> {
        bilateral(frame, LEFT_TRUNK, RIGHT_TRUNK)
    }

    pub fn advance(&mut self, angles: JointAngles) -> ExerciseReport {
        if angles.left > BEND_UPRIGHT && angles.right > BEND_UPRIGHT {
            if matches!(self.stage, Stage::Left | Stage::Right) {
                self.counter += 1;
                self.feedback = Feedback::new(FeedbackKind::Good, "Good!");
                info!(exercise = "side-bend", count = self.counter, "rep counted");
            }
            self.stage = Stage::Center;
        } else if angles.left < BEND_ENGAGE {
            self.stage = Stage::Left;
            self.feedback = Feedback::new(FeedbackKind::Cue, "Nice bend");
        } else if angles.right < BEND_ENGAGE {
            self.stage = Stage::Right;
            self.feedback = Feedback::new(FeedbackKind::Cue, "Nice bend");
        }

        self.report(angles.min())
    }

    fn report(&self, angle: f32) -> ExerciseReport {
        ExerciseReport {
            angle,
            count: self.counter,
            feedback: self.feedback,
            stage: self.stage,
        }
    }
}

impl Default for SideBend {
    fn default() -> Self {
        Self::new()
    }
}

/// Hold timer on the left shoulder-hip-knee line.
#[derive(Debug, Clone)]
pub struct Plank {
    hold_start: Option<Instant>,
    duration: u32,
    stage: Stage,
    feedback: Feedback,
}

impl Plank {
    pub fn new() -> Self {
        Self {
            hold_start: None,
            duration: 0,
            stage: Stage::FixForm,
            feedback: Feedback::new(FeedbackKind::Cue, "Get into plank position"),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn measure(frame: &Frame) -> Option<f32> {
        joint(frame, LEFT_TRUNK)
    }

    pub fn advance(&mut self, angle: f32, now: Instant) -> ExerciseReport {
        if angle > PLANK_MIN && angle < PLANK_MAX {
            let start = *self.hold_start.get_or_insert_with(|| {
                debug!(angle, "plank hold started");
                now
            });
            self.duration = now.saturating_duration_since(start).as_secs() as u32;
            self.stage = Stage::Hold;
            self.feedback = Feedback::new(FeedbackKind::Good, "Hold steady... Good job!");
        } else {
            self.break_hold(angle, now);
            if angle <= PLANK_MIN {
                self.feedback = Feedback::new(FeedbackKind::WrongForm, "Lower your hips!");
            } else {
                self.feedback =
                    Feedback::new(FeedbackKind::WrongForm, "Lift your hips, don't sag!");
            }
        }

        self.report(angle)
    }

    /// No measurable trunk line: the hold ends as if form broke.
    pub fn interrupt(&mut self, now: Instant) -> ExerciseReport {
        self.break_hold(DEGENERATE_ANGLE, now);
        self.feedback = Feedback::new(FeedbackKind::WrongForm, "Get into plank position");
        self.report(DEGENERATE_ANGLE)
    }

    fn break_hold(&mut self, angle: f32, now: Instant) {
        if let Some(start) = self.hold_start.take() {
            info!(
                held_secs = now.saturating_duration_since(start).as_secs(),
                angle, "plank hold broken"
            );
        }
        self.duration = 0;
        self.stage = Stage::FixForm;
    }

    fn report(&self, angle: f32) -> ExerciseReport {
        ExerciseReport {
            angle,
            count: self.duration,
            feedback: self.feedback,
            stage: self.stage,
        }
    }
}

impl Default for Plank {
    fn default() -> Self {
        Self::new()
    }
}

/// One active exercise session. The set of exercises is closed.
#[derive(Debug, Clone)]
pub enum ExerciseClassifier {
    Squat(Squat),
    PushUp(PushUp),
    JumpingJack(JumpingJack),
    SideBend(SideBend),
    HighKnees(HighKnees),
    Plank(Plank),
}

impl ExerciseClassifier {
    pub fn new(kind: ExerciseKind) -> Self {
        match kind {
            ExerciseKind::Squat => Self::Squat(Squat::new()),
            ExerciseKind::PushUp => Self::PushUp(PushUp::new()),
            ExerciseKind::JumpingJack => Self::JumpingJack(JumpingJack::new()),
            ExerciseKind::SideBend => Self::SideBend(SideBend::new()),
            ExerciseKind::HighKnees => Self::HighKnees(HighKnees::new()),
            ExerciseKind::Plank => Self::Plank(Plank::new()),
        }
    }

    pub fn kind(&self) -> ExerciseKind {
        match self {
            Self::Squat(_) => ExerciseKind::Squat,
            Self::PushUp(_) => ExerciseKind::PushUp,
            Self::JumpingJack(_) => ExerciseKind::JumpingJack,
            Self::SideBend(_) => ExerciseKind::SideBend,
            Self::HighKnees(_) => ExerciseKind::HighKnees,
            Self::Plank(_) => ExerciseKind::Plank,
        }
    }

    pub fn reset(&mut self) {
        debug!(exercise = %self.kind(), "classifier reset");
        match self {
            Self::Squat(c) => c.reset(),
            Self::PushUp(c) => c.reset(),
            Self::JumpingJack(c) => c.reset(),
            Self::SideBend(c) => c.reset(),
            Self::HighKnees(c) => c.reset(),
            Self::Plank(c) => c.reset(),
        }
    }

    /// Joint angles this exercise tracks, or `None` when a tracked joint
    /// has collapsed. Plank reports its single angle on both sides.
    pub fn measure(&self, frame: &Frame) -> Option<JointAngles> {
        match self {
            Self::Squat(_) => Squat::measure(frame),
            Self::PushUp(_) => PushUp::measure(frame),
            Self::JumpingJack(_) => JumpingJack::measure(frame),
            Self::SideBend(_) => SideBend::measure(frame),
            Self::HighKnees(_) => HighKnees::measure(frame),
            Self::Plank(_) => Plank::measure(frame).map(JointAngles::uniform),
        }
    }

    pub fn advance(&mut self, angles: JointAngles, now: Instant) -> ExerciseReport {
        match self {
            Self::Squat(c) => c.advance(angles),
            Self::PushUp(c) => c.advance(angles),
            Self::JumpingJack(c) => c.advance(angles),
            Self::SideBend(c) => c.advance(angles),
            Self::HighKnees(c) => c.advance(angles),
            Self::Plank(c) => c.advance(angles.left, now),
        }
    }

    /// Reports the current state unchanged, at [`DEGENERATE_ANGLE`].
    /// A plank hold is interrupted.
    pub fn skip(&mut self, now: Instant) -> ExerciseReport {
        match self {
            Self::Squat(c) => c.0.report(DEGENERATE_ANGLE),
            Self::PushUp(c) => c.0.report(DEGENERATE_ANGLE),
            Self::JumpingJack(c) => c.report(DEGENERATE_ANGLE),
            Self::SideBend(c) => c.report(DEGENERATE_ANGLE),
            Self::HighKnees(c) => c.report(DEGENERATE_ANGLE),
            Self::Plank(c) => c.interrupt(now),
        }
    }

    pub fn process_at(&mut self, frame: &Frame, now: Instant) -> ExerciseReport {
        match self.measure(frame) {
            Some(angles) => self.advance(angles, now),
            None => {
                debug!(exercise = %self.kind(), "joints collapsed, frame skipped");
                self.skip(now)
            }
        }
    }

    pub fn process(&mut self, frame: &Frame) -> ExerciseReport {
        self.process_at(frame, Instant::now())
    }
}
