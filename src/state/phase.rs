//! Reveal phases of the active question and the single visibility ordering
//! shared by every consumer (host, display, player views).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Answer slot letters of a materialized question arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum AnswerLetter {
    /// Slot A.
    A,
    /// Slot B.
    B,
    /// Slot C.
    C,
    /// Slot D.
    D,
}

impl AnswerLetter {
    /// All four slots in display order.
    pub const ALL: [AnswerLetter; 4] = [
        AnswerLetter::A,
        AnswerLetter::B,
        AnswerLetter::C,
        AnswerLetter::D,
    ];

    /// Zero-based slot index backing this letter.
    pub fn index(self) -> usize {
        match self {
            AnswerLetter::A => 0,
            AnswerLetter::B => 1,
            AnswerLetter::C => 2,
            AnswerLetter::D => 3,
        }
    }

    /// Letter for a zero-based slot index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Uppercase single-letter representation used in events and storage.
    pub fn as_str(self) -> &'static str {
        match self {
            AnswerLetter::A => "A",
            AnswerLetter::B => "B",
            AnswerLetter::C => "C",
            AnswerLetter::D => "D",
        }
    }
}

impl std::fmt::Display for AnswerLetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reveal/lock/score stage of the current question within a room.
///
/// The host may set any phase directly; ordering only matters for deciding
/// what is visible, via [`GamePhase::reveal_rank`]. Two phases carry side
/// effects handled by the phase service: `locked` stops answer submission and
/// entering `reveal` finalizes scores for the question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Nothing about the question is shown yet.
    Hidden,
    /// Question text visible, no answers yet.
    Question,
    /// Answers up to slot A visible.
    AnswerA,
    /// Answers up to slot B visible.
    AnswerB,
    /// Answers up to slot C visible.
    AnswerC,
    /// Answers up to slot D visible.
    AnswerD,
    /// All answers visible, submissions closed.
    Locked,
    /// Correct answer shown, scores for this question final.
    Reveal,
    /// Terminal phase once the host ends the game.
    Finished,
}

impl GamePhase {
    /// Total ordering of reveal progression. Every "is X visible at phase P"
    /// question is answered by comparing ranks, so host, display, and player
    /// views can never disagree on what a phase shows.
    pub fn reveal_rank(self) -> u8 {
        match self {
            GamePhase::Hidden => 0,
            GamePhase::Question => 1,
            GamePhase::AnswerA => 2,
            GamePhase::AnswerB => 3,
            GamePhase::AnswerC => 4,
            GamePhase::AnswerD => 5,
            GamePhase::Locked => 6,
            GamePhase::Reveal => 7,
            GamePhase::Finished => 8,
        }
    }

    /// Whether the question text is visible.
    pub fn shows_question(self) -> bool {
        self.reveal_rank() >= GamePhase::Question.reveal_rank()
    }

    /// Whether the given answer slot is visible.
    pub fn shows_answer(self, letter: AnswerLetter) -> bool {
        let unlocked_at = match letter {
            AnswerLetter::A => GamePhase::AnswerA,
            AnswerLetter::B => GamePhase::AnswerB,
            AnswerLetter::C => GamePhase::AnswerC,
            AnswerLetter::D => GamePhase::AnswerD,
        };
        self.reveal_rank() >= unlocked_at.reveal_rank()
    }

    /// Whether the correct answer is disclosed.
    pub fn shows_correct(self) -> bool {
        matches!(self, GamePhase::Reveal)
    }

    /// Authoritative submission guard: answer mutation is rejected from
    /// `locked` onward, everywhere.
    pub fn accepts_answers(self) -> bool {
        !matches!(self, GamePhase::Locked | GamePhase::Reveal | GamePhase::Finished)
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GamePhase::Hidden => "hidden",
            GamePhase::Question => "question",
            GamePhase::AnswerA => "answer_a",
            GamePhase::AnswerB => "answer_b",
            GamePhase::AnswerC => "answer_c",
            GamePhase::AnswerD => "answer_d",
            GamePhase::Locked => "locked",
            GamePhase::Reveal => "reveal",
            GamePhase::Finished => "finished",
        };
        f.write_str(name)
    }
}
