//! Quiz scoring
//!
//! A submission is perfect when the selected answers are exactly the correct
//! ones. Anything else, including an empty submission, is partial.

use serde::{Deserialize, Serialize};

use crate::topic::{Feedback, Quiz};

/// Result of scoring one submission
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOutcome {
    /// Selected answer indices, sorted and deduplicated
    pub selected: Vec<usize>,
    /// Indices of every correct answer
    pub correct: Vec<usize>,
    /// Correct answers the user missed
    pub missed: Vec<usize>,
    /// Incorrect answers the user picked
    pub wrong: Vec<usize>,
    pub perfect: bool,
}

impl QuizOutcome {
    /// Feedback text for this outcome
    pub fn feedback<'a>(&self, feedback: &'a Feedback) -> &'a str {
        if self.perfect {
            &feedback.perfect
        } else {
            &feedback.partial
        }
    }

    /// Number of correct answers picked
    pub fn score(&self) -> usize {
        self.correct.len() - self.missed.len()
    }
}

impl Quiz {
    /// Score a submission. Out-of-range indices are dropped with a warning.
    pub fn evaluate(&self, selected: &[usize]) -> QuizOutcome {
        let mut picked: Vec<usize> = selected
            .iter()
            .copied()
            .filter(|&i| {
                let ok = i < self.answers.len();
                if !ok {
                    tracing::warn!(index = i, answers = self.answers.len(), "ignoring out-of-range quiz answer");
                }
                ok
            })
            .collect();
        picked.sort_unstable();
        picked.dedup();

        let correct: Vec<usize> = self
            .answers
            .iter()
            .enumerate()
            .filter(|(_, a)| a.correct)
            .map(|(i, _)| i)
            .collect();
        let missed: Vec<usize> = correct
            .iter()
            .copied()
            .filter(|i| picked.binary_search(i).is_err())
            .collect();
        let wrong: Vec<usize> = picked
            .iter()
            .copied()
            .filter(|&i| !self.answers[i].correct)
            .collect();

        QuizOutcome {
            perfect: missed.is_empty() && wrong.is_empty() && !picked.is_empty(),
            selected: picked,
            correct,
            missed,
            wrong,
        }
    }
}
