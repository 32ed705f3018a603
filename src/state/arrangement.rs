//! Room-scoped randomized answer arrangements.
//!
//! The canonical question stores the correct text and three wrong texts; each
//! room gets its own shuffled placement so the same questionnaire never plays
//! with the same slot layout twice. A full Fisher-Yates shuffle of the four
//! texts gives every slot an equal chance of holding the correct answer.

use rand::{Rng, seq::SliceRandom};

use crate::state::phase::AnswerLetter;

/// A fixed placement of four answer texts into slots A-D, remembering which
/// slot received the correct text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrangement {
    /// Answer texts by slot index (A=0 .. D=3).
    pub answers: [String; 4],
    /// Slot holding the true correct answer.
    pub correct_letter: AnswerLetter,
}

impl Arrangement {
    /// Shuffle the correct text and the three wrong texts into slots.
    pub fn materialize<R: Rng + ?Sized>(
        correct: &str,
        wrong: [&str; 3],
        rng: &mut R,
    ) -> Self {
        // Tag the correct text so duplicates among answer strings cannot
        // confuse the position lookup after shuffling.
        let mut tagged: Vec<(bool, &str)> = vec![
            (true, correct),
            (false, wrong[0]),
            (false, wrong[1]),
            (false, wrong[2]),
        ];
        tagged.shuffle(rng);

        let correct_index = tagged
            .iter()
            .position(|(is_correct, _)| *is_correct)
            .unwrap_or(0);

        let answers = [
            tagged[0].1.to_owned(),
            tagged[1].1.to_owned(),
            tagged[2].1.to_owned(),
            tagged[3].1.to_owned(),
        ];

        Self {
            answers,
            // Index is always in 0..4 after a shuffle of four elements.
            correct_letter: AnswerLetter::from_index(correct_index)
                .unwrap_or(AnswerLetter::A),
        }
    }

    /// Reshuffle an existing arrangement in place of its four texts. The
    /// multiset of texts is preserved exactly; only placement changes.
    pub fn rerandomize<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let correct = self.answer(self.correct_letter);
        let wrong = self.wrong_letters().map(|letter| self.answer(letter));
        Self::materialize(correct, wrong, rng)
    }

    /// Text occupying the given slot.
    pub fn answer(&self, letter: AnswerLetter) -> &str {
        &self.answers[letter.index()]
    }

    /// The three slots that do not hold the correct answer.
    pub fn wrong_letters(&self) -> [AnswerLetter; 3] {
        let mut wrong = [AnswerLetter::A; 3];
        let mut cursor = 0;
        for letter in AnswerLetter::ALL {
            if letter != self.correct_letter {
                wrong[cursor] = letter;
                cursor += 1;
            }
        }
        wrong
    }

    /// Resolve a submitted answer text to its slot by exact match.
    pub fn resolve(&self, text: &str) -> Option<AnswerLetter> {
        AnswerLetter::ALL
            .into_iter()
            .find(|letter| self.answer(*letter) == text)
    }
}
