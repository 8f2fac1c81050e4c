//! Cooldown timer module.
//!
//! A `CooldownTimer` counts elapsed time towards a period. It is driven by
//! explicit `tick(dt)` calls; there is no background task. States:
//!
//! ```text
//!            resume               tick: elapsed >= period
//!   Idle ────────────▶ Running ───────────────────────────▶ (Completed)
//!    ▲                  │   ▲                                   │
//!    └──── pause ───────┘   └──────── elapsed = 0 ──────────────┘
//! ```
//!
//! `Completed` is transient: `tick` reports it through [`TickOutcome`] and
//! the timer keeps running from zero.

use serde::{Deserialize, Serialize};

/// Smallest period a timer accepts, in seconds.
pub const DEFAULT_MIN_PERIOD: f64 = 1e-3;

/// Which of an entity's timers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimerKind {
    Attack,
    Special,
}

/// Whether the timer is counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerState {
    Idle,
    Running,
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// Progress after the tick, in `[0, 1]`.
    pub progress: f64,
    /// True when the period was reached during this tick.
    pub completed: bool,
}

/// A periodic timer with pause/resume/reset semantics.
///
/// # Examples
///
/// ```rust
/// use wavecore::CooldownTimer;
///
/// let mut timer = CooldownTimer::new(1.0);
/// timer.resume();
///
/// assert!(!timer.tick(0.4).completed);
/// timer.pause();
/// assert!(!timer.tick(10.0).completed); // paused: no progress
/// timer.resume();
/// assert!((timer.progress() - 0.4).abs() < 1e-9);
///
/// let outcome = timer.tick(0.6);
/// assert!(outcome.completed);
/// assert_eq!(timer.elapsed(), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CooldownTimer {
    elapsed: f64,
    period: f64,
    running: bool,
    min_period: f64,
}

impl CooldownTimer {
    /// Create an idle timer with the given period.
    pub fn new(period: f64) -> Self {
        Self::with_min_period(period, DEFAULT_MIN_PERIOD)
    }

    /// Create an idle timer with a custom lower bound for the period.
    pub fn with_min_period(period: f64, min_period: f64) -> Self {
        let min_period = if min_period.is_finite() && min_period > 0.0 {
            min_period
        } else {
            DEFAULT_MIN_PERIOD
        };
        Self {
            elapsed: 0.0,
            period: normalize_period(period, min_period),
            running: false,
            min_period,
        }
    }

    pub fn state(&self) -> TimerState {
        if self.running {
            TimerState::Running
        } else {
            TimerState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    /// `elapsed / period`, clamped to `[0, 1]`.
    pub fn progress(&self) -> f64 {
        (self.elapsed / self.period).clamp(0.0, 1.0)
    }

    /// Start counting. Keeps the elapsed time; no-op while running.
    pub fn resume(&mut self) {
        self.running = true;
    }

    /// Stop counting, keeping the elapsed time. No-op while idle.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Zero the elapsed time without touching the running flag.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    /// Change the period.
    ///
    /// The value is taken by magnitude and raised to the minimum period.
    /// Elapsed time is rescaled so that progress is unchanged: a timer at
    /// 40% of a 2s period sits at 40% of the new period.
    pub fn set_period(&mut self, period: f64) {
        let progress = self.progress();
        self.period = normalize_period(period, self.min_period);
        self.elapsed = progress * self.period;
    }

    /// Advance by `dt` seconds.
    ///
    /// Idle timers do not move. Negative or non-finite `dt` counts as zero.
    /// On reaching the period the outcome is marked completed and elapsed
    /// time restarts from zero; any overshoot is dropped.
    pub fn tick(&mut self, dt: f64) -> TickOutcome {
        if !self.running {
            return TickOutcome {
                progress: self.progress(),
                completed: false,
            };
        }

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed += dt;

        if self.elapsed / self.period >= 1.0 {
            self.elapsed = 0.0;
            return TickOutcome {
                progress: 0.0,
                completed: true,
            };
        }

        TickOutcome {
            progress: self.progress(),
            completed: false,
        }
    }
}

fn normalize_period(period: f64, min_period: f64) -> f64 {
    if period.is_finite() {
        period.abs().max(min_period)
    } else {
        min_period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_timer_is_idle() {
        let mut timer = CooldownTimer::new(2.0);
        assert_eq!(timer.state(), TimerState::Idle);
        let outcome = timer.tick(5.0);
        assert!(!outcome.completed);
        assert_eq!(timer.elapsed(), 0.0);
    }

    #[test]
    fn test_non_positive_period_is_coerced() {
        assert_eq!(CooldownTimer::new(-2.0).period(), 2.0);
        assert_eq!(CooldownTimer::new(0.0).period(), DEFAULT_MIN_PERIOD);
        assert_eq!(CooldownTimer::new(f64::NAN).period(), DEFAULT_MIN_PERIOD);
        assert_eq!(CooldownTimer::with_min_period(0.0, 0.05).period(), 0.05);
    }

    #[test]
    fn test_zero_period_timer_fires_every_tick() {
        let mut timer = CooldownTimer::new(0.0);
        timer.resume();
        for _ in 0..5 {
            assert!(timer.tick(1.0 / 60.0).completed);
        }
    }

    #[test]
    fn test_progress_is_monotonic_until_wrap() {
        let mut timer = CooldownTimer::new(1.0);
        timer.resume();
        let mut last = timer.progress();
        let mut wrapped = false;
        for _ in 0..30 {
            let outcome = timer.tick(0.07);
            if outcome.completed {
                assert_eq!(outcome.progress, 0.0);
                wrapped = true;
                break;
            }
            assert!(outcome.progress >= last);
            last = outcome.progress;
        }
        assert!(wrapped);
    }

    #[test]
    fn test_pause_preserves_elapsed() {
        let mut timer = CooldownTimer::new(2.0);
        timer.resume();
        timer.tick(0.8);
        timer.pause();
        for _ in 0..10 {
            timer.tick(0.5);
        }
        assert!((timer.progress() - 0.4).abs() < 1e-9);
        timer.resume();
        timer.resume();
        assert!((timer.elapsed() - 0.8).abs() < 1e-9);
        assert!(timer.tick(1.2).completed);
    }

    #[test]
    fn test_double_pause_is_noop() {
        let mut timer = CooldownTimer::new(1.0);
        timer.pause();
        timer.pause();
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[test]
    fn test_reset_keeps_running_flag() {
        let mut timer = CooldownTimer::new(1.0);
        timer.resume();
        timer.tick(0.5);
        timer.reset();
        assert_eq!(timer.elapsed(), 0.0);
        assert!(timer.is_running());

        timer.pause();
        timer.reset();
        assert!(!timer.is_running());
    }

    #[test]
    fn test_set_period_rescales_elapsed() {
        let mut timer = CooldownTimer::new(2.0);
        timer.resume();
        timer.tick(0.5);
        timer.set_period(4.0);
        assert!((timer.progress() - 0.25).abs() < 1e-9);
        assert!((timer.elapsed() - 1.0).abs() < 1e-9);

        timer.set_period(-1.0);
        assert_eq!(timer.period(), 1.0);
        assert!((timer.elapsed() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_negative_dt_is_ignored() {
        let mut timer = CooldownTimer::new(1.0);
        timer.resume();
        timer.tick(0.3);
        timer.tick(-5.0);
        timer.tick(f64::INFINITY);
        assert!((timer.elapsed() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_overshoot_is_dropped() {
        let mut timer = CooldownTimer::new(1.0);
        timer.resume();
        assert!(timer.tick(3.5).completed);
        assert_eq!(timer.elapsed(), 0.0);
        assert!(timer.is_running());
    }
}
