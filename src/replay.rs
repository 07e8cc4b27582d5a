use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::SentinelError;
use crate::landmark::{Frame, Landmark};

#[derive(Deserialize)]
struct ReplayRecord {
    t: f64,
    #[serde(default)]
    landmarks: Option<Vec<Landmark>>,
}

/// One recorded pose-estimator output. `frame` is `None` when nobody was detected.
#[derive(Debug, Clone)]
pub struct ReplayFrame {
    pub timestamp: Duration,
    pub frame: Option<Frame>,
}

/// Reads landmark frames recorded as JSON lines:
/// `{"t": 0.5, "landmarks": [{"x": .., "y": .., "visibility": ..}, ...]}`.
pub struct LandmarkSource {
    reader: Box<dyn BufRead>,
    line: usize,
}

impl LandmarkSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open landmark recording {}", path.display()))?;
        Ok(Self::from_reader(BufReader::new(file)))
    }

    pub fn from_reader(reader: impl BufRead + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            line: 0,
        }
    }

    /// Next frame, or `None` at end of input. Blank lines are skipped.
    pub fn read_frame(&mut self) -> Result<Option<ReplayFrame>> {
        let mut buf = String::new();
        loop {
            buf.clear();
            if self.reader.read_line(&mut buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;
            if !buf.trim().is_empty() {
                break;
            }
        }

        let line = self.line;
        let record: ReplayRecord = serde_json::from_str(buf.trim()).map_err(|e| {
            SentinelError::Replay {
                line,
                message: e.to_string(),
            }
        })?;

        let timestamp = Duration::try_from_secs_f64(record.t).map_err(|_| SentinelError::Replay {
            line,
            message: format!("invalid timestamp {}", record.t),
        })?;

        let frame = match record.landmarks {
            Some(landmarks) if !landmarks.is_empty() => {
                Some(Frame::new(landmarks).map_err(|e| SentinelError::Replay {
                    line,
                    message: e.to_string(),
                })?)
            }
            _ => None,
        };

        Ok(Some(ReplayFrame { timestamp, frame }))
    }

    pub fn read_all(mut self) -> Result<Vec<ReplayFrame>> {
        let mut frames = Vec::new();
        while let Some(frame) = self.read_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }
}

impl Iterator for LandmarkSource {
    type Item = Result<ReplayFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_frame().transpose()
    }
}
