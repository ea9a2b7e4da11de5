use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::generation::Contract;

pub const APTITUDE_SET_SIZE: usize = 5;

#[derive(Serialize, Deserialize, JsonSchema, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Quantitative,
    Logical,
    Verbal,
}

#[derive(Serialize, Deserialize, JsonSchema, Validate, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AptitudeItem {
    #[validate(length(min = 1))]
    pub id: String,
    pub category: Category,
    #[validate(length(min = 1))]
    pub question_text: String,
    /// Exactly four distinct options.
    #[validate(length(equal = 4))]
    pub options: Vec<String>,
    /// Must equal one of `options` exactly.
    pub correct_answer: String,
}

impl AptitudeItem {
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|candidate| candidate == option)
    }

    pub fn public_view(&self) -> QuestionView {
        QuestionView {
            id: self.id.clone(),
            category: self.category,
            question_text: self.question_text.clone(),
            options: self.options.clone(),
        }
    }

    fn check(&self) -> Result<(), String> {
        self.validate()
            .map_err(|e| format!("question {}: {}", self.id, e))?;

        let distinct: HashSet<&str> = self.options.iter().map(String::as_str).collect();
        if distinct.len() != self.options.len() {
            return Err(format!("question {}: options are not distinct", self.id));
        }
        if !self.has_option(&self.correct_answer) {
            return Err(format!(
                "question {}: correct answer {:?} is not one of the options",
                self.id, self.correct_answer
            ));
        }
        Ok(())
    }
}

/// An item as shown to the candidate, without the answer key.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: String,
    pub category: Category,
    pub question_text: String,
    pub options: Vec<String>,
}

/// Five questions, consumed in order.
#[derive(Serialize, Deserialize, JsonSchema, Validate, Clone, Debug, PartialEq)]
pub struct AptitudeSet {
    #[validate(length(equal = 5))]
    pub questions: Vec<AptitudeItem>,
}

impl AptitudeSet {
    pub fn item(&self, id: &str) -> Option<&AptitudeItem> {
        self.questions.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

impl Contract for AptitudeSet {
    const NAME: &'static str = "AptitudeSet";

    fn conformance(&self) -> Result<(), String> {
        self.validate().map_err(|e| e.to_string())?;

        let mut ids = HashSet::new();
        for item in &self.questions {
            item.check()?;
            if !ids.insert(item.id.as_str()) {
                return Err(format!("duplicate question id {}", item.id));
            }
        }
        Ok(())
    }
}
