//! Control messages exchanged with a subscriber, and the dispatcher that
//! answers them.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::monitor::{ChangeMonitor, MonitorReporter, MonitorState, TracingMonitorReporter};
use crate::session::run_extraction;
use crate::traits::{DocumentHost, Notifier};

/// Request half of the request/response channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    GetParticipants,
    StartMonitoring,
    StopMonitoring,
}

/// Response to a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Participants { participants: Vec<String> },
    Failure { success: bool, error: String },
    Ack { success: bool },
}

impl Response {
    pub fn ack() -> Self {
        Response::Ack { success: true }
    }

    pub fn failure(error: &AppError) -> Self {
        Response::Failure {
            success: false,
            error: error.to_string(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Response::Failure { .. })
    }
}

/// Push messages sent without a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    ParticipantsUpdated { participants: Vec<String> },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::ParticipantsUpdated { .. } => "PARTICIPANTS_UPDATED",
        }
    }
}

/// Answers control requests against one monitor and its host.
pub struct ControlChannel<H, N, R = TracingMonitorReporter> {
    monitor: ChangeMonitor<H, N, R>,
}

impl<H, N, R> Clone for ControlChannel<H, N, R> {
    fn clone(&self) -> Self {
        Self {
            monitor: self.monitor.clone(),
        }
    }
}

impl<H, N, R> ControlChannel<H, N, R>
where
    H: DocumentHost,
    N: Notifier,
    R: MonitorReporter,
{
    pub fn new(monitor: ChangeMonitor<H, N, R>) -> Self {
        Self { monitor }
    }

    pub fn monitor(&self) -> &ChangeMonitor<H, N, R> {
        &self.monitor
    }

    /// Dispatch one request. Never panics; failures become
    /// [`Response::Failure`].
    pub fn handle(&self, request: Request) -> Response {
        tracing::debug!(?request, "Handling control request");
        match request {
            Request::GetParticipants => match self.monitor.host().document() {
                Some(tree) => Response::Participants {
                    participants: run_extraction(&tree),
                },
                None => Response::failure(&AppError::NoDocument),
            },
            Request::StartMonitoring => match self.monitor.start() {
                Ok(()) => Response::ack(),
                Err(e) => {
                    tracing::warn!(error = %e, "Could not start monitoring");
                    Response::failure(&e)
                }
            },
            Request::StopMonitoring => {
                self.monitor.stop();
                Response::ack()
            }
        }
    }

    pub fn state(&self) -> MonitorState {
        self.monitor.state()
    }
}
