use tokio::sync::mpsc;

use super::events::{DecisionEvent, DownloadDecisionEvent};
use super::Actuator;

/// Any event the pipeline hands to the host.
#[derive(Debug, Clone)]
pub enum ActuatorEvent {
    Navigation(DecisionEvent),
    Download(DownloadDecisionEvent),
}

/// Forwards every decision to an unbounded channel for the host's own task
/// to apply.
#[derive(Debug, Clone)]
pub struct ChannelActuator {
    tx: mpsc::UnboundedSender<ActuatorEvent>,
}

impl ChannelActuator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ActuatorEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: ActuatorEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("actuator receiver dropped, decision discarded");
        }
    }
}

impl Actuator for ChannelActuator {
    fn apply(&self, event: &DecisionEvent) {
        self.send(ActuatorEvent::Navigation(event.clone()));
    }

    fn apply_download(&self, event: &DownloadDecisionEvent) {
        self.send(ActuatorEvent::Download(event.clone()));
    }
}
