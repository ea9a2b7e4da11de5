use log::info;
use parking_lot::Mutex;

use super::{
    prompts, Answers, AptitudeScore, AptitudeSet, CallSlot, InterviewError, QuestionView, Result,
    Round, RoundStatus,
};
use crate::generation::StructuredGenerationClient;

#[derive(Default)]
struct AptitudeState {
    set: Option<AptitudeSet>,
    answers: Answers,
    score: Option<AptitudeScore>,
}

pub struct AptitudeEngine {
    client: StructuredGenerationClient,
    slot: CallSlot,
    state: Mutex<AptitudeState>,
}

impl AptitudeEngine {
    pub fn new(client: StructuredGenerationClient) -> Self {
        Self {
            client,
            slot: CallSlot::new(Round::Aptitude),
            state: Mutex::new(AptitudeState::default()),
        }
    }

    /// Generate the question set. Once a set exists it is returned as-is; after
    /// a failed call the caller may simply call `start` again.
    pub async fn start(&self) -> Result<Vec<QuestionView>> {
        if let Some(set) = &self.state.lock().set {
            return Ok(set.questions.iter().map(|item| item.public_view()).collect());
        }

        let call = self.slot.begin()?;
        let generated = self
            .client
            .generate::<AptitudeSet>(prompts::aptitude_set())
            .await
            .map_err(InterviewError::from);

        let result = generated.map(|set| {
            info!("📝 Aptitude set ready with {} questions", set.len());
            let view = set.questions.iter().map(|item| item.public_view()).collect();
            let mut state = self.state.lock();
            state.set = Some(set);
            state.answers = Answers::default();
            view
        });
        call.settle(result)
    }

    pub fn answer(&self, question_id: &str, option: &str) -> Result<()> {
        let mut state = self.state.lock();
        if state.score.is_some() {
            return Err(InterviewError::AlreadySubmitted);
        }
        let set = state.set.as_ref().ok_or(InterviewError::NotStarted)?;
        let item = set
            .item(question_id)
            .ok_or_else(|| {
                InterviewError::InvalidInput(format!("unknown question {}", question_id))
            })?;
        if !item.has_option(option) {
            return Err(InterviewError::InvalidInput(format!(
                "{:?} is not an option for question {}",
                option, question_id
            )));
        }

        state.answers.record(question_id, option);
        Ok(())
    }

    /// Score the set. Every question must be answered; the answers are sealed
    /// afterwards.
    pub fn submit(&self) -> Result<AptitudeScore> {
        let mut state = self.state.lock();
        if state.score.is_some() {
            return Err(InterviewError::AlreadySubmitted);
        }
        let set = state.set.as_ref().ok_or(InterviewError::NotStarted)?;

        let missing = state.answers.missing(set);
        if !missing.is_empty() {
            return Err(InterviewError::InvalidInput(format!(
                "unanswered questions: {}",
                missing.join(", ")
            )));
        }

        let score = AptitudeScore::new(state.answers.correct_count(set), set.len());
        info!(
            "📊 Aptitude submitted: {}/{} correct ({}%)",
            score.correct, score.total, score.score
        );
        state.score = Some(score);
        Ok(score)
    }

    pub fn questions(&self) -> Option<Vec<QuestionView>> {
        self.state
            .lock()
            .set
            .as_ref()
            .map(|set| set.questions.iter().map(|item| item.public_view()).collect())
    }

    pub fn answers(&self) -> Answers {
        self.state.lock().answers.clone()
    }

    pub fn score(&self) -> Option<AptitudeScore> {
        self.state.lock().score
    }

    pub fn status(&self) -> RoundStatus {
        self.slot.status()
    }
}
