use std::fmt;
use std::str::FromStr;

use log::{info, warn};
use parking_lot::Mutex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{prompts, CallSlot, EvaluationResult, InterviewError, Result, Round, RoundStatus};
use crate::generation::{Contract, StructuredGenerationClient};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    Python,
    Java,
    Cpp,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::JavaScript,
        Language::Python,
        Language::Java,
        Language::Cpp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::JavaScript => "JavaScript",
            Language::Python => "Python",
            Language::Java => "Java",
            Language::Cpp => "C++",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = InterviewError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| {
                lang.as_str() == wanted || lang.display_name().to_ascii_lowercase() == wanted
            })
            .ok_or_else(|| InterviewError::InvalidInput(format!("unsupported language {:?}", s)))
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
pub struct CodingExample {
    pub input: String,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Starter function templates, one per supported language.
#[derive(Serialize, Deserialize, JsonSchema, Validate, Clone, Debug, PartialEq)]
pub struct StarterCode {
    #[validate(length(min = 1))]
    pub javascript: String,
    #[validate(length(min = 1))]
    pub python: String,
    #[validate(length(min = 1))]
    pub java: String,
    #[validate(length(min = 1))]
    pub cpp: String,
}

impl StarterCode {
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::JavaScript => &self.javascript,
            Language::Python => &self.python,
            Language::Java => &self.java,
            Language::Cpp => &self.cpp,
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Validate, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CodingProblem {
    #[validate(length(min = 1))]
    pub title: String,
    /// Problem statement without examples.
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 2, max = 3))]
    pub examples: Vec<CodingExample>,
    pub constraints: Vec<String>,
    pub starter_code: StarterCode,
}

impl Contract for CodingProblem {
    const NAME: &'static str = "CodingProblem";

    fn conformance(&self) -> std::result::Result<(), String> {
        self.validate().map_err(|e| e.to_string())?;
        self.starter_code
            .validate()
            .map_err(|e| format!("starterCode: {}", e))
    }
}

/// What is sent for evaluation: the problem, the current source and its language.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub problem_title: String,
    pub source: String,
    pub language: Language,
}

struct CodingState {
    problem: Option<CodingProblem>,
    language: Language,
    source: String,
    result: Option<EvaluationResult>,
    /// Evaluations the backend actually returned.
    attempts: u32,
}

pub struct CodingEngine {
    client: StructuredGenerationClient,
    slot: CallSlot,
    state: Mutex<CodingState>,
}

impl CodingEngine {
    pub fn new(client: StructuredGenerationClient, default_language: Language) -> Self {
        Self {
            client,
            slot: CallSlot::new(Round::Coding),
            state: Mutex::new(CodingState {
                problem: None,
                language: default_language,
                source: String::new(),
                result: None,
                attempts: 0,
            }),
        }
    }

    /// Generate the problem and load the default language's starter code.
    pub async fn start(&self) -> Result<CodingProblem> {
        if let Some(problem) = &self.state.lock().problem {
            return Ok(problem.clone());
        }

        let call = self.slot.begin()?;
        let generated = self
            .client
            .generate::<CodingProblem>(prompts::coding_problem())
            .await
            .map_err(InterviewError::from);

        let result = generated.map(|problem| {
            let mut state = self.state.lock();
            state.source = problem.starter_code.get(state.language).to_string();
            state.problem = Some(problem.clone());
            info!("💻 Coding problem ready: {}", problem.title);
            problem
        });
        call.settle(result)
    }

    /// Switch language. The source is reset to that language's starter code and
    /// any edits are discarded.
    pub fn set_language(&self, language: Language) -> Result<String> {
        if self.slot.is_pending() {
            return Err(InterviewError::Busy);
        }
        let mut state = self.state.lock();
        let starter = state
            .problem
            .as_ref()
            .ok_or(InterviewError::NotStarted)?
            .starter_code
            .get(language)
            .to_string();

        state.language = language;
        state.source = starter.clone();
        Ok(starter)
    }

    pub fn edit_source(&self, source: &str) -> Result<()> {
        if self.slot.is_pending() {
            return Err(InterviewError::Busy);
        }
        let mut state = self.state.lock();
        if state.problem.is_none() {
            return Err(InterviewError::NotStarted);
        }
        state.source = source.to_string();
        Ok(())
    }

    /// Evaluate `source` in the active language. A result whose pass flag
    /// disagrees with its score is an integrity violation and is not recorded.
    /// A call that returns no evaluation does not count as an attempt.
    pub async fn run(&self, source: &str) -> Result<EvaluationResult> {
        let call = self.slot.begin()?;

        let (prompt, submission) = {
            let mut state = self.state.lock();
            let Some(problem) = state.problem.as_ref() else {
                return call.settle(Err(InterviewError::NotStarted));
            };
            let submission = Submission {
                problem_title: problem.title.clone(),
                source: source.to_string(),
                language: state.language,
            };
            let prompt = prompts::evaluation(&problem.description, source, state.language);
            state.source = source.to_string();
            (prompt, submission)
        };

        info!(
            "▶️ Evaluating {} submission for {}",
            submission.language, submission.problem_title
        );

        let evaluated = self
            .client
            .generate::<EvaluationResult>(prompt)
            .await
            .map_err(InterviewError::from);
        if evaluated.is_ok() {
            self.state.lock().attempts += 1;
        }

        let evaluated = evaluated.and_then(|result| {
            if result.is_consistent() {
                Ok(result)
            } else {
                warn!(
                    "⚠️ Evaluation flags passed={} with score {}",
                    result.passed, result.score
                );
                Err(InterviewError::IntegrityViolation(format!(
                    "passed={} is inconsistent with score {}",
                    result.passed, result.score
                )))
            }
        });

        if let Ok(result) = &evaluated {
            info!("📊 Evaluation: score {} passed={}", result.score, result.passed);
            self.state.lock().result = Some(result.clone());
        }
        call.settle(evaluated)
    }

    pub fn problem(&self) -> Option<CodingProblem> {
        self.state.lock().problem.clone()
    }

    pub fn language(&self) -> Language {
        self.state.lock().language
    }

    pub fn source(&self) -> String {
        self.state.lock().source.clone()
    }

    pub fn latest_result(&self) -> Option<EvaluationResult> {
        self.state.lock().result.clone()
    }

    pub fn attempts(&self) -> u32 {
        self.state.lock().attempts
    }

    pub fn status(&self) -> RoundStatus {
        self.slot.status()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::generation::{decode, GenerationError};
    use crate::testing::ScriptedBackend;
    use std::sync::Arc;

    fn started(backend: &Arc<ScriptedBackend>) -> CodingEngine {
        CodingEngine::new(
            StructuredGenerationClient::new(backend.clone(), "test-model"),
            Language::JavaScript,
        )
    }

    #[test]
    fn test_language_parsing() {
        assert_eq!("python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("C++".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!(" JavaScript ".parse::<Language>().unwrap(), Language::JavaScript);
        assert!(matches!("rust".parse::<Language>(), Err(InterviewError::InvalidInput(_))));
    }

    #[test]
    fn test_problem_contract() {
        let raw = serde_json::to_string(&coding_problem()).unwrap();
        assert!(raw.contains("starterCode"));
        assert!(decode::<CodingProblem>(&raw).is_ok());

        let mut one_example = coding_problem();
        one_example.examples.truncate(1);
        let raw = serde_json::to_string(&one_example).unwrap();
        assert!(decode::<CodingProblem>(&raw).is_err());

        let mut blank_starter = coding_problem();
        blank_starter.starter_code.java.clear();
        let raw = serde_json::to_string(&blank_starter).unwrap();
        match decode::<CodingProblem>(&raw).unwrap_err() {
            GenerationError::SchemaViolation { reason, .. } => assert!(reason.contains("java")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_start_loads_default_starter_code() {
        let backend = ScriptedBackend::new();
        backend.push_json(&coding_problem());
        let engine = started(&backend);

        assert_eq!(engine.set_language(Language::Python), Err(InterviewError::NotStarted));
        engine.start().await.unwrap();
        assert_eq!(engine.language(), Language::JavaScript);
        assert_eq!(engine.source(), coding_problem().starter_code.javascript);
    }

    #[tokio::test]
    async fn test_set_language_discards_edits() {
        let backend = ScriptedBackend::new();
        backend.push_json(&coding_problem());
        let engine = started(&backend);
        engine.start().await.unwrap();

        engine.edit_source("function twoSum() { return [0, 1]; }").unwrap();
        let starter = engine.set_language(Language::Python).unwrap();
        assert_eq!(starter, coding_problem().starter_code.python);
        assert_eq!(engine.source(), starter);

        engine.set_language(Language::JavaScript).unwrap();
        assert_eq!(engine.source(), coding_problem().starter_code.javascript);
    }

    #[tokio::test]
    async fn test_run_records_consistent_result() {
        let backend = ScriptedBackend::new();
        backend.push_json(&coding_problem());
        backend.push_json(&evaluation(55.0, false));
        backend.push_json(&evaluation(90.0, true));
        let engine = started(&backend);
        engine.start().await.unwrap();

        let first = engine.run("return null;").await.unwrap();
        assert!(!first.passed);
        let second = engine.run("return [0, 1];").await.unwrap();
        assert!(second.passed);

        assert_eq!(engine.attempts(), 2);
        assert_eq!(engine.latest_result(), Some(second));
        assert_eq!(engine.source(), "return [0, 1];");

        let prompt = backend.prompts().pop().unwrap();
        assert!(prompt.contains("return [0, 1];"));
        assert!(prompt.contains("JavaScript"));
    }

    #[tokio::test]
    async fn test_inconsistent_pass_flag_is_integrity_violation() {
        let backend = ScriptedBackend::new();
        backend.push_json(&coding_problem());
        backend.push_json(&evaluation(40.0, true));
        let engine = started(&backend);
        engine.start().await.unwrap();

        let err = engine.run("x").await.unwrap_err();
        assert!(matches!(err, InterviewError::IntegrityViolation(_)));
        assert!(engine.latest_result().is_none());
        assert_eq!(engine.attempts(), 1);
        assert!(matches!(engine.status(), RoundStatus::Failed(_)));
    }

    #[tokio::test]
    async fn test_run_before_start_makes_no_call() {
        let backend = ScriptedBackend::new();
        let engine = started(&backend);
        assert_eq!(engine.run("x").await, Err(InterviewError::NotStarted));
        assert_eq!(backend.calls(), 0);
        assert_eq!(engine.attempts(), 0);
    }
}
