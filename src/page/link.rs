//! Mailbox types and the coordinator's handle onto a page

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time;

use super::shortcut::Key;
use crate::commands::VoiceCommand;
use crate::coordinator::TabId;
use crate::ipc::Response;
use crate::recognition::{EngineEvent, RestartToken};
use crate::scroll::ScrollState;

/// Delivery failures towards a page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("tab {0} is not reachable")]
    Unreachable(TabId),

    #[error("tab {0} dropped the request")]
    NoReply(TabId),

    #[error("tab {0} did not answer within {1:?}")]
    Timeout(TabId, Duration),
}

/// Requests a coordinator or observer sends to a page
#[derive(Debug, Clone, PartialEq)]
pub enum PageRequest {
    /// The tab lost focus: pause scrolling and stop the engine
    Suspend,
    /// The tab became active again
    Resume,
    /// Run a resolved command. Inside the debounce window the command is
    /// dropped and the reply is `success: false`, `error: "command debounced"`.
    ExecuteVoiceCommand {
        command: VoiceCommand,
        original_command: Option<String>,
    },
    GetScrollState,
    ToggleRecording,
}

/// A page's answer; always carries the current scroll state
#[derive(Debug, Clone, PartialEq)]
pub struct PageReply {
    pub success: bool,
    pub scroll_state: ScrollState,
    pub error: Option<String>,
}

impl PageReply {
    pub fn ok(scroll_state: ScrollState) -> Self {
        Self {
            success: true,
            scroll_state,
            error: None,
        }
    }

    pub fn failure(scroll_state: ScrollState, error: impl Into<String>) -> Self {
        Self {
            success: false,
            scroll_state,
            error: Some(error.into()),
        }
    }
}

/// Everything a page's mailbox can receive
#[derive(Debug)]
pub enum PageMessage {
    Request {
        request: PageRequest,
        reply: oneshot::Sender<PageReply>,
    },
    /// Event from the speech engine
    Engine(EngineEvent),
    /// Recurring scroll tick
    Tick,
    Visibility(bool),
    Key(Key),
    RestartDue(RestartToken),
    /// The coordinator answered a submitted transcript
    CommandSettled {
        seq: u64,
        transcript: String,
        response: Option<Response>,
    },
    ReleaseGate(u64),
    Shutdown,
}

impl PageMessage {
    pub(crate) fn tick() -> Self {
        PageMessage::Tick
    }
}

/// Cloneable sending side of a page's mailbox
#[derive(Debug, Clone)]
pub struct PageLink {
    tab_id: TabId,
    tx: mpsc::UnboundedSender<PageMessage>,
}

impl PageLink {
    pub fn new(tab_id: TabId, tx: mpsc::UnboundedSender<PageMessage>) -> Self {
        Self { tab_id, tx }
    }

    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Fire-and-forget delivery
    pub fn post(&self, message: PageMessage) -> Result<(), RelayError> {
        self.tx
            .send(message)
            .map_err(|_| RelayError::Unreachable(self.tab_id))
    }

    /// Send a request and wait up to `timeout` for the reply
    pub async fn request(
        &self,
        request: PageRequest,
        timeout: Duration,
    ) -> Result<PageReply, RelayError> {
        let (reply, rx) = oneshot::channel();
        self.post(PageMessage::Request { request, reply })?;

        match time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(RelayError::NoReply(self.tab_id)),
            Err(_) => Err(RelayError::Timeout(self.tab_id, timeout)),
        }
    }
}
