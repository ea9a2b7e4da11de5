use std::fmt;

use log::info;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::{prompts, CallSlot, InterviewError, Result, Round, RoundStatus};
use crate::generation::StructuredGenerationClient;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Candidate,
    Interviewer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Candidate => f.write_str("candidate"),
            Role::Interviewer => f.write_str("interviewer"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Append-only conversation log. It always opens with an interviewer turn and
/// alternates strictly after that.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn seeded(opening_line: &str) -> Self {
        Self {
            turns: vec![Turn {
                role: Role::Interviewer,
                content: opening_line.to_string(),
            }],
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// One `role: content` line per turn.
    pub fn render(&self) -> String {
        self.render_with(|role| role.to_string())
    }

    /// Same as `render` with upper-case role labels.
    pub fn render_upper(&self) -> String {
        self.render_with(|role| role.to_string().to_uppercase())
    }

    fn render_with(&self, label: impl Fn(Role) -> String) -> String {
        self.turns
            .iter()
            .map(|turn| format!("{}: {}", label(turn.role), turn.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn push(&mut self, role: Role, content: String) {
        debug_assert!(self.last().map(|turn| turn.role) != Some(role));
        self.turns.push(Turn { role, content });
    }
}

pub struct HrEngine {
    client: StructuredGenerationClient,
    slot: CallSlot,
    transcript: Mutex<Transcript>,
}

impl HrEngine {
    pub fn new(client: StructuredGenerationClient, opening_line: &str) -> Self {
        Self {
            client,
            slot: CallSlot::new(Round::Hr),
            transcript: Mutex::new(Transcript::seeded(opening_line)),
        }
    }

    /// Append the candidate's message and the interviewer's reply together once
    /// the reply arrives. A failed or abandoned call leaves the transcript
    /// untouched, so it only ever grows by whole exchanges.
    pub async fn send(&self, text: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(InterviewError::InvalidInput(
                "message must not be empty".to_string(),
            ));
        }

        let call = self.slot.begin()?;
        let prompt = prompts::hr_turn(&self.transcript.lock(), text);

        let reply = self
            .client
            .generate_text(prompt)
            .await
            .map_err(InterviewError::from);

        if let Ok(question) = &reply {
            let mut transcript = self.transcript.lock();
            transcript.push(Role::Candidate, text.to_string());
            transcript.push(Role::Interviewer, question.clone());
            info!("🗣️ HR exchange recorded ({} turns)", transcript.len());
        }
        call.settle(reply)
    }

    pub fn transcript(&self) -> Transcript {
        self.transcript.lock().clone()
    }

    pub fn status(&self) -> RoundStatus {
        self.slot.status()
    }
}
