use std::sync::Arc;

use log::{error, info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;

use super::{
    Answers, AptitudeEngine, AptitudeScore, CodingEngine, CodingProblem, EvaluationResult,
    FinalReport, HrEngine, InterviewError, Language, QuestionView, ReportEngine, Result, Round,
    RoundStatus, Transcript,
};
use crate::config::InterviewSettings;
use crate::database::{ResultRecord, ResultStore};
use crate::generation::StructuredGenerationClient;
use crate::proctoring::ProctoringMonitor;
use crate::session::{CandidateSession, SessionSnapshot, Stage};

/// Feedback handed to the report when no evaluation was ever recorded.
const NO_FEEDBACK: &str = "No feedback";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AptitudeOutcome {
    pub score: AptitudeScore,
    pub stage: Stage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub result: EvaluationResult,
    pub stage: Stage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status", content = "reason")]
pub enum PersistenceStatus {
    Pending,
    Saved,
    Failed(String),
}

/// What `finish` hands back: the report, whether it was stored, and the
/// advisory strike count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub report: FinalReport,
    pub persistence: PersistenceStatus,
    pub strikes: u32,
}

/// Drives one candidate through Login, Aptitude, Coding, HR and Report. The
/// stage only moves forward, and only after the current round reports a
/// verified success.
pub struct InterviewOrchestrator {
    session: Mutex<CandidateSession>,
    monitor: Arc<ProctoringMonitor>,
    aptitude: AptitudeEngine,
    coding: CodingEngine,
    hr: HrEngine,
    report: ReportEngine,
    store: Arc<dyn ResultStore>,
    completion: Arc<Mutex<Option<Completion>>>,
}

impl InterviewOrchestrator {
    pub fn new(
        client: StructuredGenerationClient,
        store: Arc<dyn ResultStore>,
        settings: &InterviewSettings,
    ) -> Self {
        Self {
            session: Mutex::new(CandidateSession::new()),
            monitor: Arc::new(ProctoringMonitor::new()),
            aptitude: AptitudeEngine::new(client.clone()),
            coding: CodingEngine::new(client.clone(), settings.default_language),
            hr: HrEngine::new(client.clone(), &settings.hr_opening_line),
            report: ReportEngine::new(client),
            store,
            completion: Arc::new(Mutex::new(None)),
        }
    }

    /// Shared handle for wiring the environment's visibility stream.
    pub fn monitor(&self) -> Arc<ProctoringMonitor> {
        Arc::clone(&self.monitor)
    }

    pub fn stage(&self) -> Stage {
        self.session.lock().stage()
    }

    pub fn session(&self) -> SessionSnapshot {
        self.session.lock().snapshot(self.monitor.strikes())
    }

    pub fn strikes(&self) -> u32 {
        self.monitor.strikes()
    }

    pub fn login(&self, candidate_name: &str) -> Result<()> {
        if candidate_name.trim().is_empty() {
            return Err(InterviewError::InvalidInput(
                "candidate name must not be empty".to_string(),
            ));
        }

        {
            let mut session = self.session.lock();
            expect(&session, Stage::Login)?;
            session.start(candidate_name)?;
            info!(
                "👤 {} logged in (session {})",
                session.candidate_name(),
                session.session_id()
            );
        }
        self.monitor.arm();
        Ok(())
    }

    pub async fn start_aptitude(&self) -> Result<Vec<QuestionView>> {
        self.expect_stage(Stage::Aptitude)?;
        self.aptitude.start().await
    }

    pub fn answer(&self, question_id: &str, option: &str) -> Result<()> {
        self.expect_stage(Stage::Aptitude)?;
        self.aptitude.answer(question_id, option)
    }

    /// Score the aptitude round and move to Coding on a pass, Failed otherwise.
    pub fn submit_aptitude(&self) -> Result<AptitudeOutcome> {
        self.expect_stage(Stage::Aptitude)?;
        let score = self.aptitude.submit()?;

        let next = if score.passed() {
            Stage::Coding
        } else {
            Stage::Failed
        };
        self.advance(next)?;
        if next == Stage::Failed {
            self.monitor.disarm();
        }
        Ok(AptitudeOutcome { score, stage: next })
    }

    pub async fn start_coding(&self) -> Result<CodingProblem> {
        self.expect_stage(Stage::Coding)?;
        self.coding.start().await
    }

    pub fn set_language(&self, language: Language) -> Result<String> {
        self.expect_stage(Stage::Coding)?;
        self.coding.set_language(language)
    }

    pub fn edit_source(&self, source: &str) -> Result<()> {
        self.expect_stage(Stage::Coding)?;
        self.coding.edit_source(source)
    }

    /// Evaluate a submission. A passing result moves the interview to HR; a
    /// failing one leaves it in Coding for another attempt.
    pub async fn run_code(&self, source: &str) -> Result<RunOutcome> {
        self.expect_stage(Stage::Coding)?;
        let result = self.coding.run(source).await?;

        if result.passed {
            self.advance(Stage::Hr)?;
        }
        Ok(RunOutcome {
            result,
            stage: self.stage(),
        })
    }

    pub async fn send_hr(&self, text: &str) -> Result<String> {
        self.expect_stage(Stage::Hr)?;
        if self.report.status().is_pending() {
            return Err(InterviewError::Busy);
        }
        self.hr.send(text).await
    }

    /// Synthesize the report, move to Report and store the outcome once. Calling
    /// it again returns the same completion without another generation call.
    ///
    /// The result write runs on its own task, so it completes and updates the
    /// stored completion even if the caller stops waiting.
    pub async fn finish(&self) -> Result<Completion> {
        let existing = self.completion.lock().clone();
        if let Some(completion) = existing {
            return Ok(completion);
        }
        self.expect_stage(Stage::Hr)?;
        if self.hr.status().is_pending() {
            return Err(InterviewError::Busy);
        }

        let aptitude_score = self.aptitude.score().map(|s| s.score).unwrap_or_default();
        let coding_feedback = self
            .coding
            .latest_result()
            .map(|result| result.feedback)
            .unwrap_or_else(|| NO_FEEDBACK.to_string());
        let transcript = self.hr.transcript();

        let report = self
            .report
            .synthesize(aptitude_score, &coding_feedback, &transcript)
            .await?;

        self.advance(Stage::Report)?;
        self.monitor.disarm();

        let pending = Completion {
            report,
            persistence: PersistenceStatus::Pending,
            strikes: self.monitor.strikes(),
        };
        *self.completion.lock() = Some(pending.clone());

        if let Err(e) = self.persist(&pending.report).await {
            error!("❌ Result write task ended abnormally: {}", e);
            record_persistence(&self.completion, PersistenceStatus::Failed(e.to_string()));
        }
        let completion = self.completion.lock().clone().unwrap_or(pending);
        Ok(completion)
    }

    fn persist(&self, report: &FinalReport) -> JoinHandle<()> {
        let candidate_name = self.session.lock().candidate_name().to_string();
        let record = ResultRecord::final_round(
            &candidate_name,
            report.overall_score,
            report.verdict.is_hire(),
        );
        let store = Arc::clone(&self.store);
        let completion = Arc::clone(&self.completion);

        tokio::spawn(async move {
            let status = match store.append(&record).await {
                Ok(()) => {
                    info!("💾 Final result stored for {}", candidate_name);
                    PersistenceStatus::Saved
                }
                Err(e) => {
                    error!("❌ Could not store final result for {}: {}", candidate_name, e);
                    PersistenceStatus::Failed(e.to_string())
                }
            };
            record_persistence(&completion, status);
        })
    }

    pub fn aptitude_set(&self) -> Option<Vec<QuestionView>> {
        self.aptitude.questions()
    }

    pub fn aptitude_answers(&self) -> Answers {
        self.aptitude.answers()
    }

    pub fn aptitude_score(&self) -> Option<AptitudeScore> {
        self.aptitude.score()
    }

    pub fn coding_problem(&self) -> Option<CodingProblem> {
        self.coding.problem()
    }

    pub fn coding_language(&self) -> Language {
        self.coding.language()
    }

    pub fn coding_source(&self) -> String {
        self.coding.source()
    }

    pub fn latest_evaluation(&self) -> Option<EvaluationResult> {
        self.coding.latest_result()
    }

    pub fn coding_attempts(&self) -> u32 {
        self.coding.attempts()
    }

    pub fn transcript(&self) -> Transcript {
        self.hr.transcript()
    }

    pub fn report(&self) -> Option<FinalReport> {
        self.report.report()
    }

    pub fn completion(&self) -> Option<Completion> {
        self.completion.lock().clone()
    }

    pub fn round_status(&self, round: Round) -> RoundStatus {
        match round {
            Round::Aptitude => self.aptitude.status(),
            Round::Coding => self.coding.status(),
            Round::Hr => self.hr.status(),
            Round::Report => self.report.status(),
        }
    }

    fn expect_stage(&self, expected: Stage) -> Result<()> {
        expect(&self.session.lock(), expected)
    }

    fn advance(&self, next: Stage) -> Result<()> {
        let mut session = self.session.lock();
        let from = session.stage();
        session.advance(next).map_err(|e| {
            warn!("⚠️ Rejected transition: {}", e);
            e
        })?;
        info!("➡️ Stage {} -> {} for {}", from, next, session.candidate_name());
        Ok(())
    }
}

fn record_persistence(completion: &Mutex<Option<Completion>>, status: PersistenceStatus) {
    if let Some(completion) = completion.lock().as_mut() {
        completion.persistence = status;
    }
}

fn expect(session: &CandidateSession, expected: Stage) -> Result<()> {
    let actual = session.stage();
    if actual != expected {
        return Err(InterviewError::WrongStage { expected, actual });
    }
    Ok(())
}
