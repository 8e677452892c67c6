//! Game events detected on screen
//!
//! The set of kinds is closed. Each watch cycle yields one [`EventFlags`]
//! with every kind evaluated, and consumers walk them in [`GameEventKind::ALL`]
//! order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A discrete game event the companion reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameEventKind {
    /// Round end banner or scoreboard
    RoundEnded,
    /// The player got a kill
    Kill,
    /// The player died
    Death,
}

impl GameEventKind {
    /// Every kind, in dispatch order
    pub const ALL: [Self; 3] = [Self::RoundEnded, Self::Kill, Self::Death];

    /// Wire label used by detectors
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::RoundEnded => "round_ended",
            Self::Kill => "player_killed_enemy",
            Self::Death => "player_died",
        }
    }

    /// Parse a wire label; `None` for anything outside the closed set
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label() == label)
    }
}

impl fmt::Display for GameEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GameEventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| Error::Vision(format!("unknown event kind: {s}")))
    }
}

/// One watch cycle's worth of event flags
///
/// Missing keys deserialize as `false`; unknown keys are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFlags {
    /// Round ended
    #[serde(default)]
    pub round_ended: bool,
    /// Player killed an enemy
    #[serde(default, rename = "player_killed_enemy")]
    pub kill: bool,
    /// Player died
    #[serde(default, rename = "player_died")]
    pub death: bool,
}

impl EventFlags {
    /// No events
    #[must_use]
    pub const fn none() -> Self {
        Self {
            round_ended: false,
            kill: false,
            death: false,
        }
    }

    /// Flags with exactly the given kinds set
    #[must_use]
    pub fn with(kinds: &[GameEventKind]) -> Self {
        let mut flags = Self::none();
        for kind in kinds {
            flags.set(*kind, true);
        }
        flags
    }

    /// Whether `kind` occurred
    #[must_use]
    pub const fn occurred(&self, kind: GameEventKind) -> bool {
        match kind {
            GameEventKind::RoundEnded => self.round_ended,
            GameEventKind::Kill => self.kill,
            GameEventKind::Death => self.death,
        }
    }

    /// Set the flag for `kind`
    pub const fn set(&mut self, kind: GameEventKind, occurred: bool) {
        match kind {
            GameEventKind::RoundEnded => self.round_ended = occurred,
            GameEventKind::Kill => self.kill = occurred,
            GameEventKind::Death => self.death = occurred,
        }
    }

    /// All `(kind, occurred)` pairs in dispatch order
    pub fn iter(&self) -> impl Iterator<Item = (GameEventKind, bool)> + '_ {
        GameEventKind::ALL
            .into_iter()
            .map(|kind| (kind, self.occurred(kind)))
    }

    /// The first kind that occurred, in dispatch order
    #[must_use]
    pub fn first_occurred(&self) -> Option<GameEventKind> {
        GameEventKind::ALL
            .into_iter()
            .find(|kind| self.occurred(*kind))
    }

    /// Whether any flag is set
    #[must_use]
    pub const fn any(&self) -> bool {
        self.round_ended || self.kill || self.death
    }
}
