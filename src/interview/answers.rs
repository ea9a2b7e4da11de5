use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{passes, AptitudeSet};
use crate::generation::Contract;

/// Chosen option per question id.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Answers(BTreeMap<String, String>);

impl Answers {
    pub fn record(&mut self, question_id: &str, option: &str) {
        self.0.insert(question_id.to_string(), option.to_string());
    }

    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.0.get(question_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ids of questions in `set` that have no recorded answer, in set order.
    pub fn missing(&self, set: &AptitudeSet) -> Vec<String> {
        set.questions
            .iter()
            .filter(|item| !self.0.contains_key(&item.id))
            .map(|item| item.id.clone())
            .collect()
    }

    pub fn correct_count(&self, set: &AptitudeSet) -> usize {
        set.questions
            .iter()
            .filter(|item| self.get(&item.id) == Some(item.correct_answer.as_str()))
            .count()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AptitudeScore {
    pub correct: usize,
    pub total: usize,
    /// `100 * correct / total`.
    pub score: f64,
}

impl AptitudeScore {
    pub fn new(correct: usize, total: usize) -> Self {
        let score = if total == 0 {
            0.0
        } else {
            100.0 * correct as f64 / total as f64
        };
        Self {
            correct,
            total,
            score,
        }
    }

    pub fn passed(&self) -> bool {
        passes(self.score)
    }
}

/// The backend's verdict on one code submission.
#[derive(Serialize, Deserialize, JsonSchema, Validate, Clone, Debug, PartialEq)]
pub struct EvaluationResult {
    /// Score out of 100 based on correctness and efficiency.
    #[validate(range(min = 0.0, max = 100.0))]
    pub score: f64,
    pub feedback: String,
    /// True iff `score >= 70`.
    pub passed: bool,
}

impl EvaluationResult {
    pub fn is_consistent(&self) -> bool {
        self.passed == passes(self.score)
    }
}

impl Contract for EvaluationResult {
    const NAME: &'static str = "EvaluationResult";

    fn conformance(&self) -> Result<(), String> {
        self.validate().map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::decode;
    use crate::interview::questions::fixtures::aptitude_set;

    #[test]
    fn test_score_is_percentage_of_correct_answers() {
        let set = aptitude_set();
        let mut answers = Answers::default();
        for (n, item) in set.questions.iter().enumerate() {
            answers.record(&item.id, if n < 4 { "A" } else { "B" });
        }
        let score = AptitudeScore::new(answers.correct_count(&set), set.len());
        assert_eq!(score.correct, 4);
        assert_eq!(score.score, 80.0);
        assert!(score.passed());

        assert_eq!(AptitudeScore::new(3, 5).score, 60.0);
        assert!(!AptitudeScore::new(3, 5).passed());
    }

    #[test]
    fn test_missing_lists_unanswered_in_order() {
        let set = aptitude_set();
        let mut answers = Answers::default();
        answers.record("q2", "A");
        answers.record("q4", "C");
        assert_eq!(answers.missing(&set), vec!["q1", "q3", "q5"]);
    }

    #[test]
    fn test_evaluation_score_must_be_in_range() {
        let ok = decode::<EvaluationResult>(r#"{"score":70,"feedback":"fine","passed":true}"#);
        assert!(ok.unwrap().is_consistent());

        let too_high = r#"{"score":140,"feedback":"","passed":true}"#;
        assert!(decode::<EvaluationResult>(too_high).is_err());
        let not_a_number = r#"{"score":"high","feedback":"","passed":true}"#;
        assert!(decode::<EvaluationResult>(not_a_number).is_err());
    }

    #[test]
    fn test_consistency_follows_threshold() {
        let mut result = EvaluationResult {
            score: 69.5,
            feedback: String::new(),
            passed: false,
        };
        assert!(result.is_consistent());
        result.passed = true;
        assert!(!result.is_consistent());
    }
}
