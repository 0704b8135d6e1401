//! Power summaries.
//!
//! A single score per player that matchmaking and leaderboards read. It
//! is recomputed from the player context while the player is active and
//! decays geometrically once they go idle.

use crate::config::DecayConfig;
use crate::context::PlayerContext;
use crate::error::Result;
use crate::ids::PlayerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate standing of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerSummary {
    pub player_id: PlayerId,
    pub score: u64,
    pub last_computed_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    /// Decay periods already applied since `last_active_at`.
    #[serde(default)]
    pub decay_periods_applied: u32,
}

/// What the decay rule decided for one summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecayStep {
    /// Player is still active; recompute instead.
    Active,
    /// Idle, but no new period has elapsed since the last decay.
    Idle,
    /// Idle and `periods` new periods applied.
    Decayed { summary: PowerSummary, periods: u32 },
}

impl PowerSummary {
    pub fn new(player_id: PlayerId, score: u64, now: DateTime<Utc>) -> Self {
        Self {
            player_id,
            score,
            last_computed_at: now,
            last_active_at: now,
            decay_periods_applied: 0,
        }
    }

    /// Mark the player active at `at`; decay restarts from there.
    pub fn record_activity(&mut self, at: DateTime<Utc>) {
        if at > self.last_active_at {
            self.last_active_at = at;
            self.decay_periods_applied = 0;
        }
    }

    /// Whole days since the player was last active, never negative.
    pub fn inactive_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_active_at).num_days().max(0)
    }

    /// Apply geometric decay for periods not yet applied.
    ///
    /// Periods count from `last_active_at`, so running the pass twice in
    /// the same period never decays twice.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chrono::{Duration, Utc};
    /// use titanstat::config::DecayConfig;
    /// use titanstat::power::{DecayStep, PowerSummary};
    /// use titanstat::PlayerId;
    ///
    /// let start = Utc::now();
    /// let summary = PowerSummary::new(PlayerId::new("p-1"), 1000, start);
    /// let step = summary.decay(start + Duration::days(7), &DecayConfig::default());
    /// match step {
    ///     DecayStep::Decayed { summary, periods } => {
    ///         assert_eq!(periods, 1);
    ///         assert_eq!(summary.score, 950);
    ///     }
    ///     other => panic!("unexpected {other:?}"),
    /// }
    /// ```
    pub fn decay(&self, now: DateTime<Utc>, config: &DecayConfig) -> DecayStep {
        let idle = self.inactive_days(now);
        if idle < config.inactivity_days {
            return DecayStep::Active;
        }
        let elapsed = u32::try_from(idle / config.period_days.max(1)).unwrap_or(u32::MAX);
        let periods = elapsed.saturating_sub(self.decay_periods_applied);
        if periods == 0 {
            return DecayStep::Idle;
        }
        let exponent = i32::try_from(periods).unwrap_or(i32::MAX);
        let decayed = (self.score as f64 * config.factor.powi(exponent)).floor();
        let score = (decayed.max(0.0) as u64).min(self.score);
        DecayStep::Decayed {
            summary: PowerSummary {
                score,
                last_computed_at: now,
                decay_periods_applied: self.decay_periods_applied.saturating_add(periods),
                ..self.clone()
            },
            periods,
        }
    }
}

/// Score computed from a fresh context plus recent performance.
pub fn score(context: &PlayerContext, performance: f64, config: &DecayConfig) -> u64 {
    let combat = &context.combat;
    let performance = (performance.max(0.0) * config.performance_weight).floor() as u64;
    combat
        .attack()
        .saturating_add(combat.defense())
        .saturating_add(combat.max_hp.value / 10)
        .saturating_add(u64::from(context.identity.level).saturating_mul(config.level_weight))
        .saturating_add(performance)
}

/// External source of recent performance, e.g. workout consistency.
pub trait PerformanceSignals: Send + Sync {
    fn recent_performance(&self, player_id: &PlayerId) -> Result<f64>;
}

impl<F> PerformanceSignals for F
where
    F: Fn(&PlayerId) -> Result<f64> + Send + Sync,
{
    fn recent_performance(&self, player_id: &PlayerId) -> Result<f64> {
        self(player_id)
    }
}

/// Signals source that reports nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSignals;

impl PerformanceSignals for NoSignals {
    fn recent_performance(&self, _player_id: &PlayerId) -> Result<f64> {
        Ok(0.0)
    }
}
