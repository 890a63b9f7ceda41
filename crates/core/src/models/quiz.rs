//! Quiz model - a question with votable alternatives

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One selectable answer option with its running tally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alternative {
    /// Stable opaque token, independent of position
    pub id: String,
    pub text: String,
    pub vote_count: u32,
}

/// A question and its alternatives, as held by a live room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub question: String,
    pub alternatives: Vec<Alternative>,
}

impl Quiz {
    /// Find an alternative by id
    pub fn alternative(&self, id: &str) -> Option<&Alternative> {
        self.alternatives.iter().find(|a| a.id == id)
    }

    /// Sum of all vote counts
    pub fn total_votes(&self) -> u32 {
        self.alternatives.iter().map(|a| a.vote_count).sum()
    }

    /// Share of the votes an alternative holds, in percent
    pub fn percentage(&self, id: &str) -> Option<f64> {
        let alternative = self.alternative(id)?;
        let total = self.total_votes();
        if total == 0 {
            return Some(0.0);
        }
        Some(f64::from(alternative.vote_count) * 100.0 / f64::from(total))
    }

    /// Move one vote from `previous` (if any) to `chosen`.
    ///
    /// The chosen alternative is checked before anything is touched, so a
    /// failed call leaves every count as it was. Re-choosing the current
    /// alternative changes nothing.
    pub(crate) fn reassign_vote(&mut self, previous: Option<&str>, chosen: &str) -> Result<()> {
        let chosen_idx = self
            .alternatives
            .iter()
            .position(|a| a.id == chosen)
            .ok_or_else(|| Error::AlternativeNotFound(chosen.to_string()))?;

        if previous == Some(chosen) {
            return Ok(());
        }

        if let Some(previous) = previous {
            if let Some(prev) = self.alternatives.iter_mut().find(|a| a.id == previous) {
                prev.vote_count = prev.vote_count.saturating_sub(1);
            }
        }

        self.alternatives[chosen_idx].vote_count += 1;
        Ok(())
    }

    /// Take back a vote, e.g. when its caster leaves the room
    pub(crate) fn retract_vote(&mut self, option_id: &str) {
        if let Some(alt) = self.alternatives.iter_mut().find(|a| a.id == option_id) {
            alt.vote_count = alt.vote_count.saturating_sub(1);
        }
    }
}

/// Alternative as submitted by the creating player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeDraft {
    pub id: String,
    pub text: String,
}

impl AlternativeDraft {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Quiz as submitted with a create-room request. Any vote counts a client
/// sends along are ignored; a room's tallies always start at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDraft {
    pub question: String,
    pub alternatives: Vec<AlternativeDraft>,
}

impl QuizDraft {
    pub fn new(question: impl Into<String>, alternatives: Vec<AlternativeDraft>) -> Self {
        Self {
            question: question.into(),
            alternatives,
        }
    }

    /// Presence checks: question and every option text must be non-blank,
    /// at least one option, option ids present and distinct.
    pub fn validate(&self) -> Result<()> {
        if self.question.trim().is_empty() {
            return Err(Error::Validation("Question is required.".into()));
        }
        if self.alternatives.is_empty() {
            return Err(Error::Validation("At least one option is required.".into()));
        }

        let mut seen = HashSet::new();
        for (idx, alt) in self.alternatives.iter().enumerate() {
            if alt.id.trim().is_empty() {
                return Err(Error::Validation(format!("Option {} has no id.", idx + 1)));
            }
            if alt.text.trim().is_empty() {
                return Err(Error::Validation(format!("Option {} is empty.", idx + 1)));
            }
            if !seen.insert(alt.id.as_str()) {
                return Err(Error::Validation(format!(
                    "Option id '{}' is used twice.",
                    alt.id
                )));
            }
        }

        Ok(())
    }

    /// Validate and turn into a live quiz with zeroed tallies
    pub fn into_quiz(self) -> Result<Quiz> {
        self.validate()?;
        Ok(Quiz {
            question: self.question.trim().to_string(),
            alternatives: self
                .alternatives
                .into_iter()
                .map(|a| Alternative {
                    id: a.id,
                    text: a.text.trim().to_string(),
                    vote_count: 0,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuizDraft {
        QuizDraft::new(
            "Best editor?",
            vec![
                AlternativeDraft::new("opt-1", "vim"),
                AlternativeDraft::new("opt-2", "emacs"),
            ],
        )
    }

    #[test]
    fn test_into_quiz_zeroes_tallies() {
        let quiz = draft().into_quiz().unwrap();
        assert_eq!(quiz.alternatives.len(), 2);
        assert_eq!(quiz.total_votes(), 0);
        assert_eq!(quiz.alternative("opt-2").unwrap().text, "emacs");
    }

    #[test]
    fn test_client_vote_counts_ignored() {
        let json = r#"{"question":"Q","alternatives":[{"id":"a","text":"A","voteCount":99}]}"#;
        let draft: QuizDraft = serde_json::from_str(json).unwrap();
        let quiz = draft.into_quiz().unwrap();
        assert_eq!(quiz.alternatives[0].vote_count, 0);
    }

    #[test]
    fn test_blank_fields_rejected() {
        let mut d = draft();
        d.question = "   ".into();
        assert!(matches!(d.validate(), Err(Error::Validation(_))));

        let mut d = draft();
        d.alternatives[1].text = "".into();
        assert!(matches!(d.validate(), Err(Error::Validation(_))));

        let mut d = draft();
        d.alternatives.clear();
        assert!(matches!(d.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut d = draft();
        d.alternatives[1].id = "opt-1".into();
        assert!(matches!(d.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_reassign_moves_single_vote() {
        let mut quiz = draft().into_quiz().unwrap();
        quiz.reassign_vote(None, "opt-1").unwrap();
        quiz.reassign_vote(Some("opt-1"), "opt-2").unwrap();

        assert_eq!(quiz.alternative("opt-1").unwrap().vote_count, 0);
        assert_eq!(quiz.alternative("opt-2").unwrap().vote_count, 1);
    }

    #[test]
    fn test_reassign_same_choice_is_noop() {
        let mut quiz = draft().into_quiz().unwrap();
        quiz.reassign_vote(None, "opt-2").unwrap();
        let before = quiz.clone();
        quiz.reassign_vote(Some("opt-2"), "opt-2").unwrap();
        assert_eq!(quiz, before);
    }

    #[test]
    fn test_unknown_alternative_leaves_counts() {
        let mut quiz = draft().into_quiz().unwrap();
        quiz.reassign_vote(None, "opt-1").unwrap();
        let before = quiz.clone();

        let err = quiz.reassign_vote(Some("opt-1"), "nope").unwrap_err();
        assert_eq!(err, Error::AlternativeNotFound("nope".into()));
        assert_eq!(quiz, before);
    }

    #[test]
    fn test_decrement_floors_at_zero() {
        let mut quiz = draft().into_quiz().unwrap();
        quiz.reassign_vote(Some("opt-1"), "opt-2").unwrap();
        assert_eq!(quiz.alternative("opt-1").unwrap().vote_count, 0);
        assert_eq!(quiz.alternative("opt-2").unwrap().vote_count, 1);
    }

    #[test]
    fn test_percentage() {
        let mut quiz = draft().into_quiz().unwrap();
        assert_eq!(quiz.percentage("opt-1"), Some(0.0));
        quiz.reassign_vote(None, "opt-1").unwrap();
        quiz.reassign_vote(None, "opt-1").unwrap();
        quiz.reassign_vote(None, "opt-2").unwrap();
        let pct = quiz.percentage("opt-1").unwrap();
        assert!((pct - 66.666).abs() < 0.01);
        assert_eq!(quiz.percentage("missing"), None);
    }
}
