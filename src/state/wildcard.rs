//! Per-player wildcard (power-up) lifecycle types.
//!
//! Each player carries one slate of four independent wildcards. A wildcard is
//! either available or used; the used variant owns its usage timestamp and,
//! for the elimination kinds, the letters that were struck out. Invalid
//! combinations (a result without a usage, a timestamp on an available card)
//! are unrepresentable.

use std::time::{Duration, SystemTime};

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::phase::AnswerLetter;

/// The four wildcard kinds a player can spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WildcardKind {
    /// Call a friend; host runs a 45 second countdown.
    PhoneCall,
    /// Search the internet; host runs a 35 second countdown.
    PhoneSearch,
    /// Two wrong answers eliminated immediately.
    FiftyFifty,
    /// A minigame-decided number of wrong answers (0-3) eliminated.
    Roulette,
}

impl WildcardKind {
    /// All kinds, in the order they are presented to the host.
    pub const ALL: [WildcardKind; 4] = [
        WildcardKind::PhoneCall,
        WildcardKind::PhoneSearch,
        WildcardKind::FiftyFifty,
        WildcardKind::Roulette,
    ];

    /// Snake-case name used in channel payloads and storage.
    pub fn as_str(self) -> &'static str {
        match self {
            WildcardKind::PhoneCall => "phone_call",
            WildcardKind::PhoneSearch => "phone_search",
            WildcardKind::FiftyFifty => "fifty_fifty",
            WildcardKind::Roulette => "roulette",
        }
    }

    /// Host-observed countdown for the assistance kinds. The countdown is
    /// informational; the phase lock remains the only submission gate.
    pub fn countdown(self) -> Option<Duration> {
        match self {
            WildcardKind::PhoneCall => Some(Duration::from_secs(45)),
            WildcardKind::PhoneSearch => Some(Duration::from_secs(35)),
            WildcardKind::FiftyFifty | WildcardKind::Roulette => None,
        }
    }

    /// Whether using this kind produces an eliminated-letters result.
    pub fn is_elimination(self) -> bool {
        matches!(self, WildcardKind::FiftyFifty | WildcardKind::Roulette)
    }
}

impl std::fmt::Display for WildcardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a single wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WildcardState {
    /// Not spent yet; a grant is permitted.
    Available,
    /// Spent; revivable only by an explicit host action.
    Used {
        /// When the wildcard was marked used.
        at: SystemTime,
        /// Eliminated letters, present for the elimination kinds only.
        eliminated: Option<Vec<AnswerLetter>>,
    },
}

impl WildcardState {
    /// Whether a grant is currently permitted.
    pub fn is_available(&self) -> bool {
        matches!(self, WildcardState::Available)
    }

    /// Eliminated letters stored with a used elimination wildcard.
    pub fn eliminated(&self) -> Option<&[AnswerLetter]> {
        match self {
            WildcardState::Used {
                eliminated: Some(letters),
                ..
            } => Some(letters),
            _ => None,
        }
    }
}

/// One player's full slate of wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WildcardSlate {
    /// Phone-a-friend state.
    pub phone_call: WildcardState,
    /// Internet-search state.
    pub phone_search: WildcardState,
    /// 50/50 state.
    pub fifty_fifty: WildcardState,
    /// Roulette state.
    pub roulette: WildcardState,
}

impl Default for WildcardSlate {
    fn default() -> Self {
        Self {
            phone_call: WildcardState::Available,
            phone_search: WildcardState::Available,
            fifty_fifty: WildcardState::Available,
            roulette: WildcardState::Available,
        }
    }
}

impl WildcardSlate {
    /// Borrow the state for a kind.
    pub fn get(&self, kind: WildcardKind) -> &WildcardState {
        match kind {
            WildcardKind::PhoneCall => &self.phone_call,
            WildcardKind::PhoneSearch => &self.phone_search,
            WildcardKind::FiftyFifty => &self.fifty_fifty,
            WildcardKind::Roulette => &self.roulette,
        }
    }

    /// Mutably borrow the state for a kind.
    pub fn get_mut(&mut self, kind: WildcardKind) -> &mut WildcardState {
        match kind {
            WildcardKind::PhoneCall => &mut self.phone_call,
            WildcardKind::PhoneSearch => &mut self.phone_search,
            WildcardKind::FiftyFifty => &mut self.fifty_fifty,
            WildcardKind::Roulette => &mut self.roulette,
        }
    }
}

/// Draw `count` distinct letters uniformly from the wrong-answer slots.
///
/// The correct slot can never appear in the result because only the three
/// wrong letters are candidates. `count` is clamped to the candidate count.
pub fn draw_eliminations<R: Rng + ?Sized>(
    wrong_letters: [AnswerLetter; 3],
    count: usize,
    rng: &mut R,
) -> Vec<AnswerLetter> {
    let mut candidates = wrong_letters.to_vec();
    candidates.shuffle(rng);
    candidates.truncate(count.min(3));
    candidates
}
