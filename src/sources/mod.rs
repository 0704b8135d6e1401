//! Buff sources.
//!
//! One module per data source. Every source is a pure function of the
//! snapshot (plus its own config section) and returns at most one
//! [`ActiveBuff`](crate::buff::ActiveBuff). Sources validate their own
//! factors, so a malformed value is rejected here and never reaches the
//! fold.
//!
//! Dispatch lives on [`BuffSource::derive`](crate::buff::BuffSource::derive).

pub mod archetype;
pub mod boost;
pub mod equipment;
pub mod mood;
pub mod rank;
pub mod skill;
