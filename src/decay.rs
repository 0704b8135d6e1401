//! Decay/recalculation pass.
//!
//! Invoked by an external scheduler. Walks every tracked power summary and
//! either recomputes it (active players) or decays it (idle players). One
//! player's failure is recorded and the pass moves on.

use crate::config::EngineConfig;
use crate::context::ContextBuilder;
use crate::error::{EngineError, Result};
use crate::ids::PlayerId;
use crate::power::{self, DecayStep, PerformanceSignals, PowerSummary};
use crate::store::{PlayerStore, PowerStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// A per-player failure recorded by the pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassError {
    pub player_id: PlayerId,
    pub message: String,
}

/// Summary of one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PassReport {
    pub processed: usize,
    pub recalculated: usize,
    pub decayed: usize,
    /// Idle players with no new decay period.
    pub unchanged: usize,
    pub errors: Vec<PassError>,
    /// The pass stopped early on request.
    pub interrupted: bool,
}

enum Processed {
    Recalculated { from: u64, to: u64 },
    Decayed { from: u64, to: u64, periods: u32 },
    Unchanged,
}

/// Batch recompute-or-decay over every tracked player.
pub struct DecayPass<'a> {
    players: &'a dyn PlayerStore,
    power: &'a dyn PowerStore,
    signals: &'a dyn PerformanceSignals,
    config: &'a EngineConfig,
}

impl<'a> DecayPass<'a> {
    pub fn new(
        players: &'a dyn PlayerStore,
        power: &'a dyn PowerStore,
        signals: &'a dyn PerformanceSignals,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            players,
            power,
            signals,
            config,
        }
    }

    /// Run the pass to completion.
    ///
    /// Recently active players are recalculated from a fresh context;
    /// idle ones decay by one factor per whole idle period not yet applied.
    /// A failure for one player is recorded in the report and the pass
    /// moves on.
    ///
    /// # Arguments
    ///
    /// * `now` - Evaluation time for idle periods
    ///
    /// # Returns
    ///
    /// Counts of recalculated, decayed and unchanged players plus the
    /// per-player errors. Only a failure to list the tracked summaries
    /// aborts the pass.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chrono::{Duration, Utc};
    /// use titanstat::power::NoSignals;
    /// use titanstat::{DecayPass, EngineConfig, InMemoryStore, PlayerId, PowerSummary};
    ///
    /// let store = InMemoryStore::new();
    /// let now = Utc::now();
    /// let idle = PowerSummary::new(PlayerId::new("idle"), 1000, now - Duration::days(14));
    /// store.put_summary(idle).unwrap();
    ///
    /// let config = EngineConfig::default();
    /// let report = DecayPass::new(&store, &store, &NoSignals, &config)
    ///     .run_pass(now)
    ///     .unwrap();
    /// assert_eq!(report.decayed, 1);
    /// assert_eq!(store.summary(&PlayerId::new("idle")).unwrap().unwrap().score, 902);
    /// ```
    pub fn run_pass(&self, now: DateTime<Utc>) -> Result<PassReport> {
        self.run_pass_interruptible(now, &AtomicBool::new(false))
    }

    /// Run the pass, checking `stop` before each player.
    ///
    /// A player already started is always finished.
    pub fn run_pass_interruptible(
        &self,
        now: DateTime<Utc>,
        stop: &AtomicBool,
    ) -> Result<PassReport> {
        let tracked = self.power.tracked()?;
        let mut report = PassReport::default();

        for summary in &tracked {
            if stop.load(Ordering::Relaxed) {
                report.interrupted = true;
                break;
            }
            report.processed += 1;
            match self.process(summary, now) {
                Ok(Processed::Recalculated { from, to }) => {
                    report.recalculated += 1;
                    debug!(player = %summary.player_id, from, to, "power recalculated");
                }
                Ok(Processed::Decayed { from, to, periods }) => {
                    report.decayed += 1;
                    debug!(player = %summary.player_id, from, to, periods, "power decayed");
                }
                Ok(Processed::Unchanged) => report.unchanged += 1,
                Err(err) => {
                    warn!(
                        player = %summary.player_id,
                        error = %err,
                        "power pass failed for player"
                    );
                    report.errors.push(PassError {
                        player_id: summary.player_id.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            processed = report.processed,
            recalculated = report.recalculated,
            decayed = report.decayed,
            unchanged = report.unchanged,
            errors = report.errors.len(),
            interrupted = report.interrupted,
            "power pass finished"
        );
        Ok(report)
    }

    fn process(&self, summary: &PowerSummary, now: DateTime<Utc>) -> Result<Processed> {
        match summary.decay(now, &self.config.decay) {
            DecayStep::Active => {
                let next = self.recompute(summary, now)?;
                self.power.save_summary(&next)?;
                Ok(Processed::Recalculated {
                    from: summary.score,
                    to: next.score,
                })
            }
            DecayStep::Decayed {
                summary: next,
                periods,
            } => {
                self.power.save_summary(&next)?;
                Ok(Processed::Decayed {
                    from: summary.score,
                    to: next.score,
                    periods,
                })
            }
            DecayStep::Idle => Ok(Processed::Unchanged),
        }
    }

    fn recompute(&self, summary: &PowerSummary, now: DateTime<Utc>) -> Result<PowerSummary> {
        let context =
            ContextBuilder::new(self.players, self.config).build(&summary.player_id, now)?;
        let performance = self.signals.recent_performance(&summary.player_id)?;
        if !performance.is_finite() {
            return Err(EngineError::PersistenceFailure(format!(
                "performance signal for {} is not finite",
                summary.player_id
            )));
        }
        Ok(PowerSummary {
            score: power::score(&context, performance, &self.config.decay),
            last_computed_at: now,
            decay_periods_applied: 0,
            ..summary.clone()
        })
    }
}
