//! Headless browser
//!
//! An in-memory host with one window, a headless document per tab and a
//! scripted speech engine, wired to a coordinator. The daemon serves this
//! over IPC; tests drive it directly.

mod document;
mod engine;
mod host;

pub use document::{DocumentState, HeadlessDocument, HeadlessVideo, Navigation};
pub use engine::{EngineControl, ScriptedEngine};
pub use host::InMemoryHost;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::commands::Classifier;
use crate::coordinator::{BrowserHost, Coordinator, CoordinatorHandle, TabId};
use crate::events::StateEvent;
use crate::ipc::{Request, Response};
use crate::page::{Key, PageInstance, PageLink, PageMessage, PageSettings, RelayError};
use crate::recognition::{EngineError, EngineEvent};

pub struct Browser {
    host: Arc<InMemoryHost>,
    coordinator: Coordinator,
    handle: CoordinatorHandle,
    settings: PageSettings,
    documents: Mutex<HashMap<TabId, HeadlessDocument>>,
    engines: Mutex<HashMap<TabId, EngineControl>>,
}

impl Browser {
    /// Build the host and coordinator and spawn their tasks.
    /// Must be called from within a tokio runtime.
    pub fn start(
        settings: PageSettings,
        relay_timeout: Duration,
        events: broadcast::Sender<StateEvent>,
    ) -> Self {
        let (host, host_events) = InMemoryHost::new();
        let host = Arc::new(host);
        let coordinator = Coordinator::new(
            host.clone() as Arc<dyn BrowserHost>,
            Classifier::default(),
            events,
            relay_timeout,
        );
        let (handle, inbox) = CoordinatorHandle::channel();

        tokio::spawn(coordinator.clone().run(inbox));
        tokio::spawn(coordinator.clone().run_host_events(host_events));

        Self {
            host,
            coordinator,
            handle,
            settings,
            documents: Mutex::new(HashMap::new()),
            engines: Mutex::new(HashMap::new()),
        }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn host(&self) -> &InMemoryHost {
        &self.host
    }

    /// Observer view of a tab's document
    pub fn document(&self, tab: TabId) -> Option<HeadlessDocument> {
        self.documents().get(&tab).cloned()
    }

    pub async fn open_tab(&self, url: impl Into<String>) -> TabId {
        self.open_tab_with(HeadlessDocument::new(url)).await
    }

    /// Open a tab showing `document`. The first tab is activated.
    pub async fn open_tab_with(&self, document: HeadlessDocument) -> TabId {
        let tab = self.host.open_tab(document.snapshot().url);
        let mut control = None;
        let link = PageInstance::spawn(
            tab,
            document.clone(),
            |link| {
                let engine = ScriptedEngine::new(link);
                control = Some(engine.control());
                engine
            },
            self.handle.clone(),
            self.settings,
        );
        self.coordinator.register_page(link).await;
        self.documents().insert(tab, document);
        if let Some(control) = control {
            self.engines().insert(tab, control);
        }
        info!(%tab, "tab opened");

        if self.host.active_tab().is_none() {
            if let Err(e) = self.host.activate_tab(tab) {
                debug!(%tab, error = %e, "could not activate first tab");
            }
        }
        tab
    }

    pub fn close_tab(&self, tab: TabId) -> Response {
        match self.host.close_tab(tab) {
            Ok(()) => {
                self.documents().remove(&tab);
                self.engines().remove(&tab);
                Response::ok().with_tab_id(tab)
            }
            Err(e) => Response::failure(e.to_string()),
        }
    }

    pub fn activate_tab(&self, tab: TabId) -> Response {
        match self.host.activate_tab(tab) {
            Ok(()) => Response::ok().with_tab_id(tab),
            Err(e) => Response::failure(e.to_string()),
        }
    }

    /// Deliver a final transcript as if the tab's engine had heard it
    pub async fn transcript(&self, tab: TabId, text: impl Into<String>) -> Response {
        let event = EngineEvent::Result {
            transcript: text.into(),
            is_final: true,
        };
        self.post(tab, PageMessage::Engine(event)).await
    }

    /// Fail the tab's running speech engine with `error`
    pub fn fail_engine(&self, tab: TabId, error: EngineError) -> Response {
        let Some(control) = self.engines().get(&tab).cloned() else {
            return Response::failure(RelayError::Unreachable(tab).to_string());
        };
        if control.fail(error) {
            Response::ok().with_tab_id(tab)
        } else {
            Response::failure("Speech engine is not running")
        }
    }

    pub async fn set_visibility(&self, tab: TabId, visible: bool) -> Response {
        self.post(tab, PageMessage::Visibility(visible)).await
    }

    pub async fn press_key(&self, tab: TabId, key: Key) -> Response {
        self.post(tab, PageMessage::Key(key)).await
    }

    /// Serve one request: host requests here, the rest by the coordinator
    pub async fn dispatch(&self, request: Request) -> Response {
        match request {
            Request::OpenTab { url } => {
                let tab = self.open_tab(url).await;
                Response::ok().with_tab_id(tab)
            }
            Request::CloseTab { tab_id } => self.close_tab(tab_id),
            Request::ActivateTab { tab_id } => self.activate_tab(tab_id),
            Request::Transcript { tab_id, text } => self.transcript(tab_id, text).await,
            Request::SetVisibility { tab_id, visible } => {
                self.set_visibility(tab_id, visible).await
            }
            Request::PressKey { tab_id, key } => self.press_key(tab_id, key).await,
            Request::FailEngine { tab_id, error } => self.fail_engine(tab_id, error),
            request => self.coordinator.handle(request, None).await,
        }
    }

    async fn post(&self, tab: TabId, message: PageMessage) -> Response {
        let result = match self.coordinator.page(tab).await {
            Some(link) => link.post(message),
            None => Err(RelayError::Unreachable(tab)),
        };
        match result {
            Ok(()) => Response::ok().with_tab_id(tab),
            Err(e) => Response::failure(e.to_string()),
        }
    }

    pub async fn page(&self, tab: TabId) -> Option<PageLink> {
        self.coordinator.page(tab).await
    }

    fn documents(&self) -> MutexGuard<'_, HashMap<TabId, HeadlessDocument>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn engines(&self) -> MutexGuard<'_, HashMap<TabId, EngineControl>> {
        self.engines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
