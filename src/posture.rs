use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ThresholdProfile, ViewSettings};
use crate::error::{Result, SentinelError};
use crate::geometry::{angle, calculate_tilt, find_angle};
use crate::landmark::{BodyPart, Frame, Point2D};

const FRONT_PARTS: [BodyPart; 5] = [
    BodyPart::Nose,
    BodyPart::LeftEar,
    BodyPart::RightEar,
    BodyPart::LeftShoulder,
    BodyPart::RightShoulder,
];
const CALIBRATION_PARTS: [BodyPart; 3] = [
    BodyPart::Nose,
    BodyPart::LeftShoulder,
    BodyPart::RightShoulder,
];
const SIDE_PARTS: [BodyPart; 3] = [BodyPart::LeftEar, BodyPart::LeftShoulder, BodyPart::LeftHip];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Front,
    Side,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Front => f.write_str("front"),
            View::Side => f.write_str("side"),
        }
    }
}

/// `Unknown` means nobody was seen. It is never a kind of `Bad`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum PostureStatus {
    Good,
    Bad,
    #[default]
    Unknown,
}

impl PostureStatus {
    pub fn as_option(self) -> Option<bool> {
        match self {
            PostureStatus::Good => Some(true),
            PostureStatus::Bad => Some(false),
            PostureStatus::Unknown => None,
        }
    }

    pub fn is_present(self) -> bool {
        self != PostureStatus::Unknown
    }

    /// Bad if any view is bad, otherwise good if any view saw someone.
    pub fn combine(statuses: impl IntoIterator<Item = PostureStatus>) -> PostureStatus {
        statuses
            .into_iter()
            .fold(PostureStatus::Unknown, |acc, status| match (acc, status) {
                (PostureStatus::Bad, _) | (_, PostureStatus::Bad) => PostureStatus::Bad,
                (PostureStatus::Good, _) | (_, PostureStatus::Good) => PostureStatus::Good,
                _ => PostureStatus::Unknown,
            })
    }
}

impl From<Option<bool>> for PostureStatus {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => PostureStatus::Good,
            Some(false) => PostureStatus::Bad,
            None => PostureStatus::Unknown,
        }
    }
}

impl From<PostureStatus> for Option<bool> {
    fn from(status: PostureStatus) -> Self {
        status.as_option()
    }
}

impl fmt::Display for PostureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostureStatus::Good => f.write_str("good"),
            PostureStatus::Bad => f.write_str("bad"),
            PostureStatus::Unknown => f.write_str("unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Tilt,
    Close,
    Neck,
    Back,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Tilt => "tilt",
            ErrorCategory::Close => "close",
            ErrorCategory::Neck => "neck",
            ErrorCategory::Back => "back",
        };
        f.write_str(name)
    }
}

/// One failed check, with the value that failed it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "issue", content = "value", rename_all = "snake_case")]
pub enum PostureIssue {
    HeadTilt(f32),
    ShoulderTilt(f32),
    /// How far the nose-to-shoulder distance shrank past the reference, pixels.
    ForwardHead(f32),
    NeckInclination(f32),
    TorsoInclination(f32),
    RoundedShoulders(f32),
}

impl PostureIssue {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PostureIssue::HeadTilt(_) | PostureIssue::ShoulderTilt(_) => ErrorCategory::Tilt,
            PostureIssue::ForwardHead(_) => ErrorCategory::Close,
            PostureIssue::NeckInclination(_) => ErrorCategory::Neck,
            PostureIssue::TorsoInclination(_) | PostureIssue::RoundedShoulders(_) => {
                ErrorCategory::Back
            }
        }
    }
}

impl fmt::Display for PostureIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostureIssue::HeadTilt(deg) => write!(f, "head tilted ({deg:.0})"),
            PostureIssue::ShoulderTilt(deg) => write!(f, "shoulders uneven ({deg:.0})"),
            PostureIssue::ForwardHead(px) => write!(f, "head dropped ({px:.0}px)"),
            PostureIssue::NeckInclination(deg) => write!(f, "neck forward ({deg:.0})"),
            PostureIssue::TorsoInclination(deg) => write!(f, "leaning ({deg:.0})"),
            PostureIssue::RoundedShoulders(deg) => write!(f, "shoulders rounded ({deg:.0})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostureReport {
    pub view: View,
    pub status: PostureStatus,
    pub issues: Vec<PostureIssue>,
}

impl PostureReport {
    pub fn unknown(view: View) -> Self {
        Self {
            view,
            status: PostureStatus::Unknown,
            issues: Vec::new(),
        }
    }

    fn from_issues(view: View, issues: Vec<PostureIssue>) -> Self {
        let status = if issues.is_empty() {
            PostureStatus::Good
        } else {
            PostureStatus::Bad
        };
        Self {
            view,
            status,
            issues,
        }
    }

    pub fn categories(&self) -> BTreeSet<ErrorCategory> {
        self.issues.iter().map(PostureIssue::category).collect()
    }
}

/// Reference nose and shoulder heights captured from one upright snapshot, pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostureBaseline {
    pub nose_y: f32,
    pub shoulder_y: f32,
}

impl PostureBaseline {
    pub fn distance(&self) -> f32 {
        self.shoulder_y - self.nose_y
    }
}

fn pixel(frame: &Frame, part: BodyPart, view: &ViewSettings) -> Point2D {
    frame
        .point(part)
        .scaled(view.frame_width as f32, view.frame_height as f32)
}

fn present<'a>(
    frame: Option<&'a Frame>,
    parts: &[BodyPart],
    settings: &ViewSettings,
    view: View,
) -> Option<&'a Frame> {
    let frame = frame?;
    if let Some(hidden) = frame.first_hidden(parts, settings.min_visibility) {
        debug!(%view, ?hidden, "landmark below visibility floor");
        return None;
    }
    Some(frame)
}

/// Head and shoulder checks from a camera facing the user.
#[derive(Debug, Clone)]
pub struct FrontMonitor {
    profile: ThresholdProfile,
    settings: ViewSettings,
    baseline: Option<PostureBaseline>,
}

impl FrontMonitor {
    pub fn new(profile: ThresholdProfile, settings: ViewSettings) -> Self {
        Self {
            profile,
            settings,
            baseline: None,
        }
    }

    pub fn calibrate(&mut self, frame: &Frame) -> Result<PostureBaseline> {
        if let Some(hidden) = frame.first_hidden(&CALIBRATION_PARTS, self.settings.min_visibility) {
            return Err(SentinelError::NotVisible(hidden));
        }

        let nose = pixel(frame, BodyPart::Nose, &self.settings);
        let left = pixel(frame, BodyPart::LeftShoulder, &self.settings);
        let right = pixel(frame, BodyPart::RightShoulder, &self.settings);
        let baseline = PostureBaseline {
            nose_y: nose.y,
            shoulder_y: (left.y + right.y) / 2.0,
        };

        info!(
            nose_y = baseline.nose_y,
            shoulder_y = baseline.shoulder_y,
            "front view calibrated"
        );
        self.baseline = Some(baseline);
        Ok(baseline)
    }

    pub fn clear_calibration(&mut self) {
        self.baseline = None;
    }

    pub fn baseline(&self) -> Option<PostureBaseline> {
        self.baseline
    }

    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_some()
    }

    /// An uncalibrated front view is not monitoring and reports `Unknown`.
    pub fn check(&self, frame: Option<&Frame>) -> PostureReport {
        let Some(frame) = present(frame, &FRONT_PARTS, &self.settings, View::Front) else {
            return PostureReport::unknown(View::Front);
        };
        let Some(baseline) = self.baseline else {
            return PostureReport::unknown(View::Front);
        };

        let s = &self.settings;
        let nose = pixel(frame, BodyPart::Nose, s);
        let left_ear = pixel(frame, BodyPart::LeftEar, s);
        let right_ear = pixel(frame, BodyPart::RightEar, s);
        let left_shoulder = pixel(frame, BodyPart::LeftShoulder, s);
        let right_shoulder = pixel(frame, BodyPart::RightShoulder, s);

        let mut issues = Vec::new();

        let head_tilt = calculate_tilt(left_ear, right_ear);
        if head_tilt > self.profile.tilt_thresh {
            issues.push(PostureIssue::HeadTilt(head_tilt));
        }

        let shoulder_tilt = calculate_tilt(left_shoulder, right_shoulder);
        if shoulder_tilt > self.profile.tilt_thresh {
            issues.push(PostureIssue::ShoulderTilt(shoulder_tilt));
        }

        let shoulder_y = (left_shoulder.y + right_shoulder.y) / 2.0;
        let current = shoulder_y - nose.y;
        if current < baseline.distance() - self.profile.offset_y {
            issues.push(PostureIssue::ForwardHead(baseline.distance() - current));
        }

        PostureReport::from_issues(View::Front, issues)
    }
}

/// Neck, torso and shoulder-rounding checks from a camera at the user's left.
#[derive(Debug, Clone)]
pub struct SideMonitor {
    profile: ThresholdProfile,
    settings: ViewSettings,
}

impl SideMonitor {
    pub fn new(profile: ThresholdProfile, settings: ViewSettings) -> Self {
        Self { profile, settings }
    }

    pub fn check(&self, frame: Option<&Frame>) -> PostureReport {
        let Some(frame) = present(frame, &SIDE_PARTS, &self.settings, View::Side) else {
            return PostureReport::unknown(View::Side);
        };

        let s = &self.settings;
        let ear = pixel(frame, BodyPart::LeftEar, s);
        let shoulder = pixel(frame, BodyPart::LeftShoulder, s);
        let hip = pixel(frame, BodyPart::LeftHip, s);

        let mut issues = Vec::new();

        let neck = find_angle(shoulder, ear);
        if neck > self.profile.neck_thresh {
            issues.push(PostureIssue::NeckInclination(neck));
        }

        let torso = find_angle(hip, shoulder);
        if torso > self.profile.torso_thresh {
            issues.push(PostureIssue::TorsoInclination(torso));
        }

        let rounding = angle(ear, shoulder, hip);
        if rounding < self.profile.shoulder_round_thresh {
            issues.push(PostureIssue::RoundedShoulders(rounding));
        }

        PostureReport::from_issues(View::Side, issues)
    }
}
