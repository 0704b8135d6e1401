//! Identifier types.
//!
//! Every entity the engine talks about (players, opponents, sessions,
//! items, skills, decrees) is addressed by an interned string identifier.
//! Uses `Arc<str>` so cloning an id into buffs, transcripts and reports is
//! cheap and comparison stays fast.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Create a new id from a string slice.
            pub fn new(s: &str) -> Self {
                Self(Arc::from(s))
            }

            /// Get the string representation of this id.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(Arc::from(s))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                self.0.as_ref().serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from(s))
            }
        }
    };
}

interned_id!(
    /// Already-authenticated player identifier.
    ///
    /// ```rust
    /// use titanstat::PlayerId;
    ///
    /// let a = PlayerId::new("p-1");
    /// let b: PlayerId = "p-1".into();
    /// assert_eq!(a, b);
    /// assert_eq!(a.as_str(), "p-1");
    /// ```
    PlayerId
);
interned_id!(
    /// Opponent (boss, wave, scripted enemy) identifier.
    OpponentId
);
interned_id!(
    /// Encounter session identifier.
    SessionId
);
interned_id!(
    /// Equipment item identifier.
    ItemId
);
interned_id!(
    /// Skill identifier, also used as a node in the skill tree.
    SkillId
);
interned_id!(
    /// Time-limited decree identifier.
    DecreeId
);
