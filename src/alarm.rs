//! Debounced bad-posture alarm.
//!
//! A bad episode starts on the first `Bad` tick and ends on any `Good` or
//! `Unknown` tick. The alarm is raised once the episode has lasted longer
//! than the configured delay, and the error tally moves exactly once per
//! episode. Ticks where nobody is present neither count toward monitored
//! time nor keep an episode alive.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};

use crate::posture::{ErrorCategory, PostureStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AlarmTick {
    /// The current episode has outlasted the delay.
    pub alarm: bool,
    /// This tick latched the episode and updated the tally.
    pub fired: bool,
}

#[derive(Debug, Clone)]
pub struct AlarmDebouncer {
    delay: Duration,
    bad_since: Option<Instant>,
    already_counted_this_episode: bool,
    error_tally: BTreeMap<ErrorCategory, u32>,
    alarms_fired: u32,
    monitored: Duration,
    last_present: Option<Instant>,
}

impl AlarmDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            bad_since: None,
            already_counted_this_episode: false,
            error_tally: BTreeMap::new(),
            alarms_fired: 0,
            monitored: Duration::ZERO,
            last_present: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn tick(
        &mut self,
        status: PostureStatus,
        categories: &BTreeSet<ErrorCategory>,
        now: Instant,
    ) -> AlarmTick {
        if status.is_present() {
            if let Some(previous) = self.last_present {
                self.monitored += now.saturating_duration_since(previous);
            }
            self.last_present = Some(now);
        } else {
            self.last_present = None;
        }

        if status != PostureStatus::Bad {
            if self.bad_since.take().is_some() {
                debug!(%status, "bad posture episode ended");
            }
            self.already_counted_this_episode = false;
            return AlarmTick::default();
        }

        let since = *self.bad_since.get_or_insert_with(|| {
            debug!("bad posture episode started");
            now
        });
        let alarm = now.saturating_duration_since(since) > self.delay;

        let mut fired = false;
        if alarm && !self.already_counted_this_episode {
            self.already_counted_this_episode = true;
            self.alarms_fired += 1;
            for category in categories {
                *self.error_tally.entry(*category).or_insert(0) += 1;
            }
            fired = true;
            warn!(
                categories = ?categories,
                alarms = self.alarms_fired,
                "bad posture alarm"
            );
        }

        AlarmTick { alarm, fired }
    }

    pub fn in_episode(&self) -> bool {
        self.bad_since.is_some()
    }

    pub fn count(&self, category: ErrorCategory) -> u32 {
        self.error_tally.get(&category).copied().unwrap_or(0)
    }

    pub fn alarms_fired(&self) -> u32 {
        self.alarms_fired
    }

    /// Sum of the per-category tally.
    pub fn total_errors(&self) -> u32 {
        self.error_tally.values().sum()
    }

    /// Time spent with someone in view.
    pub fn monitored_time(&self) -> Duration {
        self.monitored
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(t0: Instant, secs: f64) -> Instant {
        t0 + Duration::from_secs_f64(secs)
    }

    fn tilt() -> BTreeSet<ErrorCategory> {
        BTreeSet::from([ErrorCategory::Tilt])
    }

    #[test]
    fn fires_once_after_the_delay() {
        let mut debouncer = AlarmDebouncer::new(Duration::from_secs(3));
        let t0 = Instant::now();

        assert!(!debouncer.tick(PostureStatus::Bad, &tilt(), t0).alarm);
        assert!(!debouncer.tick(PostureStatus::Bad, &tilt(), at(t0, 2.9)).alarm);

        let tick = debouncer.tick(PostureStatus::Bad, &tilt(), at(t0, 3.1));
        assert!(tick.alarm);
        assert!(tick.fired);

        let mut t = 3.5;
        while t <= 10.0 {
            let tick = debouncer.tick(PostureStatus::Bad, &tilt(), at(t0, t));
            assert!(tick.alarm);
            assert!(!tick.fired);
            t += 0.5;
        }

        assert_eq!(debouncer.count(ErrorCategory::Tilt), 1);
        assert_eq!(debouncer.alarms_fired(), 1);
        assert_eq!(debouncer.total_errors(), 1);
    }

    #[test]
    fn exactly_the_delay_is_not_enough() {
        let mut debouncer = AlarmDebouncer::new(Duration::from_secs(3));
        let t0 = Instant::now();
        debouncer.tick(PostureStatus::Bad, &tilt(), t0);
        assert!(!debouncer.tick(PostureStatus::Bad, &tilt(), at(t0, 3.0)).alarm);
    }

    #[test]
    fn unknown_never_alarms_and_ends_the_episode() {
        let mut debouncer = AlarmDebouncer::new(Duration::from_secs(3));
        let t0 = Instant::now();
        debouncer.tick(PostureStatus::Bad, &tilt(), t0);
        debouncer.tick(PostureStatus::Bad, &tilt(), at(t0, 2.0));

        let mut t = 2.5;
        while t <= 12.0 {
            let tick = debouncer.tick(PostureStatus::Unknown, &BTreeSet::new(), at(t0, t));
            assert_eq!(tick, AlarmTick::default());
            assert!(!debouncer.in_episode());
            t += 0.5;
        }

        // Bad again: a fresh episode, not a continuation.
        assert!(!debouncer.tick(PostureStatus::Bad, &tilt(), at(t0, 12.5)).alarm);
        assert!(!debouncer.tick(PostureStatus::Bad, &tilt(), at(t0, 14.0)).alarm);
        assert_eq!(debouncer.alarms_fired(), 0);
        assert_eq!(debouncer.total_errors(), 0);
    }

    #[test]
    fn each_episode_tallies_its_own_categories() {
        let mut debouncer = AlarmDebouncer::new(Duration::from_secs(3));
        let t0 = Instant::now();
        let neck_and_back = BTreeSet::from([ErrorCategory::Neck, ErrorCategory::Back]);

        debouncer.tick(PostureStatus::Bad, &tilt(), t0);
        assert!(debouncer.tick(PostureStatus::Bad, &tilt(), at(t0, 4.0)).fired);
        debouncer.tick(PostureStatus::Good, &BTreeSet::new(), at(t0, 5.0));

        debouncer.tick(PostureStatus::Bad, &neck_and_back, at(t0, 6.0));
        assert!(debouncer.tick(PostureStatus::Bad, &neck_and_back, at(t0, 9.5)).fired);

        assert_eq!(debouncer.alarms_fired(), 2);
        assert_eq!(debouncer.count(ErrorCategory::Tilt), 1);
        assert_eq!(debouncer.count(ErrorCategory::Neck), 1);
        assert_eq!(debouncer.count(ErrorCategory::Back), 1);
        assert_eq!(debouncer.count(ErrorCategory::Close), 0);
        assert_eq!(debouncer.total_errors(), 3);
    }

    #[test]
    fn absence_pauses_monitored_time() {
        let mut debouncer = AlarmDebouncer::new(Duration::from_secs(3));
        let t0 = Instant::now();
        let none = BTreeSet::new();

        debouncer.tick(PostureStatus::Good, &none, t0);
        debouncer.tick(PostureStatus::Good, &none, at(t0, 4.0));
        debouncer.tick(PostureStatus::Unknown, &none, at(t0, 5.0));
        debouncer.tick(PostureStatus::Unknown, &none, at(t0, 60.0));
        debouncer.tick(PostureStatus::Bad, &tilt(), at(t0, 61.0));
        debouncer.tick(PostureStatus::Good, &none, at(t0, 63.0));

        assert_eq!(debouncer.monitored_time(), Duration::from_secs(6));

        debouncer.reset();
        assert_eq!(debouncer.monitored_time(), Duration::ZERO);
        assert_eq!(debouncer.delay(), Duration::from_secs(3));
    }
}
