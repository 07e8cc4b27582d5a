//! The monitor-session handle shared by capture loops and status queries.
//!
//! Each camera loop owns its own [`crate::posture::FrontMonitor`] or
//! [`crate::posture::SideMonitor`] and only publishes finished reports here.
//! The debouncer and its tally live behind one mutex, so reports may arrive
//! from separate threads.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::alarm::{AlarmDebouncer, AlarmTick};
use crate::config::ThresholdProfile;
use crate::posture::{ErrorCategory, PostureReport, PostureStatus, View};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub front: PostureStatus,
    pub side: PostureStatus,
    pub alarm: bool,
    /// Set only on the tick that counted the episode.
    pub fired: bool,
    pub categories: BTreeSet<ErrorCategory>,
}

/// One row of the session journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub started_at: DateTime<Local>,
    pub user: String,
    pub target_secs: u64,
    pub actual_secs: u64,
    pub total_errors: u32,
    pub tilt: u32,
    pub close: u32,
    pub neck: u32,
    pub back: u32,
}

#[derive(Debug)]
struct SessionState {
    front: PostureReport,
    side: PostureReport,
    debouncer: AlarmDebouncer,
}

#[derive(Debug, Clone)]
pub struct MonitorSession {
    user: String,
    target: Duration,
    started_at: DateTime<Local>,
    state: Arc<Mutex<SessionState>>,
}

impl MonitorSession {
    pub fn new(profile: &ThresholdProfile, user: impl Into<String>, target: Duration) -> Self {
        let user = user.into();
        info!(%user, target_secs = target.as_secs(), "monitor session started");
        Self {
            user,
            target,
            started_at: Local::now(),
            state: Arc::new(Mutex::new(SessionState {
                front: PostureReport::unknown(View::Front),
                side: PostureReport::unknown(View::Side),
                debouncer: AlarmDebouncer::new(profile.alarm_delay()),
            })),
        }
    }

    /// Replaces the latest report for the report's view.
    pub fn publish(&self, report: PostureReport) {
        let mut state = self.state.lock();
        match report.view {
            View::Front => state.front = report,
            View::Side => state.side = report,
        }
    }

    /// Latest published report for one view.
    pub fn latest(&self, view: View) -> PostureReport {
        let state = self.state.lock();
        match view {
            View::Front => state.front.clone(),
            View::Side => state.side.clone(),
        }
    }

    /// Combines both views and advances the alarm debouncer by one tick.
    pub fn check(&self, now: Instant) -> StatusSnapshot {
        let mut state = self.state.lock();
        let status = PostureStatus::combine([state.front.status, state.side.status]);

        let mut categories = state.front.categories();
        categories.extend(state.side.categories());

        let AlarmTick { alarm, fired } = state.debouncer.tick(status, &categories, now);

        StatusSnapshot {
            front: state.front.status,
            side: state.side.status,
            alarm,
            fired,
            categories,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        let state = self.state.lock();
        let debouncer = &state.debouncer;
        SessionSummary {
            started_at: self.started_at,
            user: self.user.clone(),
            target_secs: self.target.as_secs(),
            actual_secs: debouncer.monitored_time().as_secs(),
            total_errors: debouncer.total_errors(),
            tilt: debouncer.count(ErrorCategory::Tilt),
            close: debouncer.count(ErrorCategory::Close),
            neck: debouncer.count(ErrorCategory::Neck),
            back: debouncer.count(ErrorCategory::Back),
        }
    }

    /// Forgets both views and the tally. Thresholds are kept.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.front = PostureReport::unknown(View::Front);
        state.side = PostureReport::unknown(View::Side);
        state.debouncer.reset();
    }
}
