use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Interview stage. `Login` is initial; `Report` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Login,
    Aptitude,
    Coding,
    Hr,
    Report,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Report | Stage::Failed)
    }

    /// Stages during which the proctoring monitor is armed.
    pub fn is_proctored(self) -> bool {
        matches!(self, Stage::Aptitude | Stage::Coding | Stage::Hr)
    }

    pub fn can_advance_to(self, next: Stage) -> bool {
        matches!(
            (self, next),
            (Stage::Login, Stage::Aptitude)
                | (Stage::Aptitude, Stage::Coding)
                | (Stage::Aptitude, Stage::Failed)
                | (Stage::Coding, Stage::Hr)
                | (Stage::Hr, Stage::Report)
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Login => "login",
            Stage::Aptitude => "aptitude",
            Stage::Coding => "coding",
            Stage::Hr => "hr",
            Stage::Report => "report",
            Stage::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot move from {from} to {to}")]
pub struct InvalidTransition {
    pub from: Stage,
    pub to: Stage,
}

/// One candidate's run through the interview. Owned by the orchestrator; the
/// strike count lives in the proctoring monitor and is joined in snapshots.
#[derive(Debug, Clone)]
pub struct CandidateSession {
    session_id: Uuid,
    candidate_name: String,
    stage: Stage,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
}

impl CandidateSession {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            candidate_name: String::new(),
            stage: Stage::Login,
            created_at: Utc::now(),
            started_at: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn candidate_name(&self) -> &str {
        &self.candidate_name
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Record the candidate's name and leave `Login`. The name is fixed from here on.
    pub fn start(&mut self, candidate_name: &str) -> Result<(), InvalidTransition> {
        self.advance(Stage::Aptitude)?;
        self.candidate_name = candidate_name.trim().to_string();
        self.started_at = Some(Utc::now());
        Ok(())
    }

    pub fn advance(&mut self, next: Stage) -> Result<(), InvalidTransition> {
        if !self.stage.can_advance_to(next) {
            return Err(InvalidTransition {
                from: self.stage,
                to: next,
            });
        }
        self.stage = next;
        Ok(())
    }

    pub fn snapshot(&self, strikes: u32) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            candidate_name: self.candidate_name.clone(),
            stage: self.stage,
            strikes,
            created_at: self.created_at,
            started_at: self.started_at,
        }
    }
}

impl Default for CandidateSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub candidate_name: String,
    pub stage: Stage,
    pub strikes: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
}
