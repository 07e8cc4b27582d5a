use serde::{Deserialize, Serialize};

use crate::error::{Result, SentinelError};

pub const LANDMARK_COUNT: usize = 33;

/// Standard 33-point body model indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyPart {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl BodyPart {
    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Maps a normalized image coordinate into pixel space.
    pub fn scaled(self, width: f32, height: f32) -> Self {
        Self {
            x: self.x * width,
            y: self.y * height,
        }
    }
}

fn full_visibility() -> f32 {
    1.0
}

/// One tracked body point, normalized to the image (origin top-left, y down).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    #[serde(default = "full_visibility")]
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility: 1.0,
        }
    }

    pub fn with_visibility(mut self, visibility: f32) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn point(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// A complete body: exactly [`LANDMARK_COUNT`] landmarks in model order.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    landmarks: Vec<Landmark>,
}

impl Frame {
    pub fn new(landmarks: Vec<Landmark>) -> Result<Self> {
        if landmarks.len() != LANDMARK_COUNT {
            return Err(SentinelError::LandmarkCount {
                expected: LANDMARK_COUNT,
                actual: landmarks.len(),
            });
        }
        Ok(Self { landmarks })
    }

    pub fn get(&self, part: BodyPart) -> &Landmark {
        &self.landmarks[part.index()]
    }

    pub fn point(&self, part: BodyPart) -> Point2D {
        self.get(part).point()
    }

    pub fn set(&mut self, part: BodyPart, landmark: Landmark) {
        self.landmarks[part.index()] = landmark;
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    /// True when every listed part reaches the visibility floor.
    pub fn visible(&self, parts: &[BodyPart], min_visibility: f32) -> bool {
        parts
            .iter()
            .all(|part| self.get(*part).visibility >= min_visibility)
    }

    /// First listed part below the visibility floor, if any.
    pub fn first_hidden(&self, parts: &[BodyPart], min_visibility: f32) -> Option<BodyPart> {
        parts
            .iter()
            .copied()
            .find(|part| self.get(*part).visibility < min_visibility)
    }
}

impl Default for Frame {
    /// Every landmark at the image centre, fully visible.
    fn default() -> Self {
        Self {
            landmarks: vec![Landmark::new(0.5, 0.5); LANDMARK_COUNT],
        }
    }
}
