use std::fmt;

use log::info;
use parking_lot::Mutex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{prompts, CallSlot, InterviewError, Result, Round, RoundStatus, Transcript};
use crate::generation::{Contract, StructuredGenerationClient};

#[derive(Serialize, Deserialize, JsonSchema, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    #[serde(rename = "Strong Hire")]
    StrongHire,
    Hire,
    #[serde(rename = "No Hire")]
    NoHire,
}

impl Verdict {
    pub fn is_hire(&self) -> bool {
        !matches!(self, Verdict::NoHire)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::StrongHire => "Strong Hire",
            Verdict::Hire => "Hire",
            Verdict::NoHire => "No Hire",
        })
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Validate, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinalReport {
    #[validate(range(min = 0.0, max = 100.0))]
    pub overall_score: f64,
    #[validate(length(min = 3, max = 4))]
    pub strengths: Vec<String>,
    #[validate(length(min = 1, max = 2))]
    pub weaknesses: Vec<String>,
    pub verdict: Verdict,
    #[validate(length(min = 1))]
    pub summary: String,
}

impl Contract for FinalReport {
    const NAME: &'static str = "FinalReport";

    fn conformance(&self) -> std::result::Result<(), String> {
        self.validate().map_err(|e| e.to_string())
    }
}

/// Synthesizes the report exactly once. Later calls return the stored report.
pub struct ReportEngine {
    client: StructuredGenerationClient,
    slot: CallSlot,
    report: Mutex<Option<FinalReport>>,
}

impl ReportEngine {
    pub fn new(client: StructuredGenerationClient) -> Self {
        Self {
            client,
            slot: CallSlot::new(Round::Report),
            report: Mutex::new(None),
        }
    }

    pub async fn synthesize(
        &self,
        aptitude_score: f64,
        coding_feedback: &str,
        transcript: &Transcript,
    ) -> Result<FinalReport> {
        if let Some(report) = self.report.lock().as_ref() {
            return Ok(report.clone());
        }

        let call = self.slot.begin()?;
        let prompt = prompts::final_report(aptitude_score, coding_feedback, transcript);
        let generated = self
            .client
            .generate::<FinalReport>(prompt)
            .await
            .map_err(InterviewError::from);

        if let Ok(report) = &generated {
            info!(
                "📋 Final report: {} (overall {})",
                report.verdict, report.overall_score
            );
            *self.report.lock() = Some(report.clone());
        }
        call.settle(generated)
    }

    pub fn report(&self) -> Option<FinalReport> {
        self.report.lock().clone()
    }

    pub fn status(&self) -> RoundStatus {
        self.slot.status()
    }
}
