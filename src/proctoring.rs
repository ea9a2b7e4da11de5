use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

pub const STRIKE_WARNING: &str = "WARNING: Tab switching detected. Violation recorded.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Emitted once per recorded strike for the presentation layer to show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrikeWarning {
    pub strike: u32,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug)]
struct MonitorState {
    armed: bool,
    visibility: Visibility,
    strikes: u32,
}

/// Counts visible -> hidden transitions while armed. Purely observational: it
/// never touches the stage machine or any round engine.
pub struct ProctoringMonitor {
    state: Mutex<MonitorState>,
    warnings: broadcast::Sender<StrikeWarning>,
}

impl ProctoringMonitor {
    pub fn new() -> Self {
        let (warnings, _) = broadcast::channel(16);
        Self {
            state: Mutex::new(MonitorState {
                armed: false,
                visibility: Visibility::Visible,
                strikes: 0,
            }),
            warnings,
        }
    }

    pub fn arm(&self) {
        let mut state = self.state.lock();
        if !state.armed {
            state.armed = true;
            info!("👁️ Proctoring armed");
        }
    }

    pub fn disarm(&self) {
        let mut state = self.state.lock();
        if state.armed {
            state.armed = false;
            info!("👁️ Proctoring disarmed with {} strike(s)", state.strikes);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.state.lock().armed
    }

    pub fn strikes(&self) -> u32 {
        self.state.lock().strikes
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StrikeWarning> {
        self.warnings.subscribe()
    }

    /// Feed one visibility event. Returns the warning if a strike was recorded.
    pub fn observe(&self, visibility: Visibility) -> Option<StrikeWarning> {
        let warning = {
            let mut state = self.state.lock();
            let previous = std::mem::replace(&mut state.visibility, visibility);

            let left_view = previous == Visibility::Visible && visibility == Visibility::Hidden;
            if !(state.armed && left_view) {
                return None;
            }

            state.strikes = state.strikes.saturating_add(1);
            StrikeWarning {
                strike: state.strikes,
                message: STRIKE_WARNING.to_string(),
                at: Utc::now(),
            }
        };

        warn!("🚨 Visibility lost - strike #{}", warning.strike);
        // Nobody listening is fine; the count is the record.
        let _ = self.warnings.send(warning.clone());
        Some(warning)
    }

    /// Drain an environment visibility stream until its sender is dropped.
    pub fn spawn_listener(
        self: &Arc<Self>,
        mut events: mpsc::Receiver<Visibility>,
    ) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(visibility) = events.recv().await {
                debug!("Visibility event: {:?}", visibility);
                monitor.observe(visibility);
            }
            info!("Visibility stream closed");
        })
    }
}

impl Default for ProctoringMonitor {
    fn default() -> Self {
        Self::new()
    }
}
