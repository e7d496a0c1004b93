use anyhow::Result;
use chrono::{Datelike, NaiveDateTime, Timelike};
use rand::Rng;
use serde::Deserialize;
use std::time::Duration;

/// Hours and reply delay for one kind of day.
#[derive(Debug, Clone, Deserialize)]
pub struct DayPattern {
    /// `[start, end)` local hours.
    #[serde(default)]
    pub active_hours: Vec<(u32, u32)>,
    /// Uniform delay range in seconds before answering.
    #[serde(default = "default_response_delay")]
    pub response_delay: (f64, f64),
}

impl Default for DayPattern {
    fn default() -> Self {
        Self {
            active_hours: Vec::new(),
            response_delay: default_response_delay(),
        }
    }
}

fn default_response_delay() -> (f64, f64) {
    (5.0, 20.0)
}

impl DayPattern {
    fn validate(&self, day: &str) -> Result<()> {
        for &(start, end) in &self.active_hours {
            if start >= end || end > 24 {
                anyhow::bail!(
                    "extensions.activity.{}.active_hours entry [{}, {}] must satisfy start < end <= 24",
                    day,
                    start,
                    end
                );
            }
        }
        let (a, b) = self.response_delay;
        for value in [a, b] {
            if value < 0.0 || Duration::try_from_secs_f64(value).is_err() {
                anyhow::bail!(
                    "extensions.activity.{}.response_delay must hold non-negative seconds, got {}",
                    day,
                    value
                );
            }
        }
        Ok(())
    }
}

/// Weekday / weekend activity schedule. A day kind with no table is never active.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityPatterns {
    #[serde(default)]
    pub weekday: DayPattern,
    #[serde(default)]
    pub weekend: DayPattern,
}

impl ActivityPatterns {
    pub fn validate(&self) -> Result<()> {
        self.weekday.validate("weekday")?;
        self.weekend.validate("weekend")
    }

    fn pattern_for(&self, now: &NaiveDateTime) -> &DayPattern {
        // Saturday and Sunday
        if now.weekday().number_from_monday() >= 6 {
            &self.weekend
        } else {
            &self.weekday
        }
    }

    pub fn is_active(&self, now: NaiveDateTime) -> bool {
        let hour = now.hour();
        self.pattern_for(&now)
            .active_hours
            .iter()
            .any(|&(start, end)| start <= hour && hour < end)
    }

    pub fn response_delay<R: Rng + ?Sized>(&self, now: NaiveDateTime, rng: &mut R) -> Duration {
        let (a, b) = self.pattern_for(&now).response_delay;
        let lo = a.min(b).max(0.0);
        let hi = a.max(b).max(0.0);
        if !lo.is_finite() || !hi.is_finite() {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(rng.gen_range(lo..=hi)).unwrap_or_default()
    }
}
