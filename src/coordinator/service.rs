//! Coordinator service
//!
//! Each request is handled on its own task against a shared registry,
//! the way the IPC server handles clients. Registry locks are never held
//! across a page round-trip.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

use super::host::{adjacent_index, BrowserHost, HostEvent, TabDirection, TabId, WindowState};
use super::registry::Registry;
use crate::commands::{Classifier, VoiceCommand};
use crate::events::StateEvent;
use crate::ipc::{Request, Response};
use crate::page::{PageLink, PageMessage, PageReply, PageRequest, RelayError};
use crate::scroll::ScrollState;

/// Outcome of delivering one notification to one page
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub tab_id: TabId,
    pub result: Result<PageReply, RelayError>,
}

/// A request travelling from a page to the coordinator
#[derive(Debug)]
pub struct Envelope {
    pub request: Request,
    pub origin: Option<TabId>,
    pub reply: Option<oneshot::Sender<Response>>,
}

/// Sending side of the coordinator inbox, held by pages
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl CoordinatorHandle {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Fire-and-forget. Returns `false` if the coordinator is gone.
    pub fn post(&self, request: Request, origin: Option<TabId>) -> bool {
        self.tx
            .send(Envelope {
                request,
                origin,
                reply: None,
            })
            .is_ok()
    }

    /// Send a request; the receiver resolves with the response, or errors
    /// if the coordinator is gone.
    pub fn request(&self, request: Request, origin: Option<TabId>) -> oneshot::Receiver<Response> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(Envelope {
            request,
            origin,
            reply: Some(reply),
        });
        rx
    }
}

/// The privileged process-wide component
#[derive(Clone)]
pub struct Coordinator {
    registry: Arc<RwLock<Registry>>,
    host: Arc<dyn BrowserHost>,
    classifier: Arc<Classifier>,
    events: broadcast::Sender<StateEvent>,
    relay_timeout: Duration,
}

impl Coordinator {
    pub fn new(
        host: Arc<dyn BrowserHost>,
        classifier: Classifier,
        events: broadcast::Sender<StateEvent>,
        relay_timeout: Duration,
    ) -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry::new())),
            host,
            classifier: Arc::new(classifier),
            events,
            relay_timeout,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.events.subscribe()
    }

    pub async fn register_page(&self, link: PageLink) {
        let tab_id = link.tab_id();
        if self.registry.write().await.register(link).is_some() {
            warn!(%tab_id, "page re-registered, previous link replaced");
        }
        debug!(%tab_id, "page registered");
    }

    pub async fn page(&self, tab: TabId) -> Option<PageLink> {
        self.registry.read().await.link(tab)
    }

    pub async fn active_tab_id(&self) -> Option<TabId> {
        self.registry.read().await.active_tab_id()
    }

    /// Process requests from pages until every handle is dropped
    ///
    /// Scroll state echoes are applied inline, in arrival order, since a
    /// page's updates must land in the order it sent them. Everything that
    /// may wait on a page or the host runs on its own task.
    pub async fn run(self, mut inbox: mpsc::UnboundedReceiver<Envelope>) {
        info!("coordinator started");
        while let Some(envelope) = inbox.recv().await {
            if matches!(envelope.request, Request::UpdateScrollState { .. }) {
                self.dispatch(envelope).await;
                continue;
            }
            let coordinator = self.clone();
            tokio::spawn(async move { coordinator.dispatch(envelope).await });
        }
        info!("coordinator stopped");
    }

    async fn dispatch(&self, envelope: Envelope) {
        let response = self.handle(envelope.request, envelope.origin).await;
        if let Some(reply) = envelope.reply {
            let _ = reply.send(response);
        }
    }

    /// Follow tab lifecycle events raised by the host
    pub async fn run_host_events(self, mut events: mpsc::UnboundedReceiver<HostEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                HostEvent::Activated(tab) => {
                    self.on_tab_activated(tab).await;
                }
                HostEvent::Removed(tab) => {
                    self.on_tab_removed(tab).await;
                }
            }
        }
    }

    /// Suspend every other page, then resume `tab`
    ///
    /// Deliveries are best-effort; an unreachable page is reported in the
    /// result and does not stop the others.
    pub async fn on_tab_activated(&self, tab: TabId) -> Vec<Delivery> {
        let (others, target) = {
            let mut registry = self.registry.write().await;
            let previous = registry.activate(tab);
            debug!(%tab, ?previous, "tab activated");
            (registry.links_except(tab), registry.link(tab))
        };
        let _ = self.events.send(StateEvent::ActiveTabChanged { tab_id: tab });

        let mut deliveries = self.broadcast(others, PageRequest::Suspend).await;
        if let Some(link) = target {
            deliveries.push(Delivery {
                tab_id: tab,
                result: link.request(PageRequest::Resume, self.relay_timeout).await,
            });
        }

        for delivery in &deliveries {
            if let Err(e) = &delivery.result {
                debug!(tab_id = %delivery.tab_id, error = %e, "lifecycle notification not delivered");
            }
        }
        deliveries
    }

    /// Forget a closed tab and stop its page
    pub async fn on_tab_removed(&self, tab: TabId) -> Option<PageLink> {
        let link = self.registry.write().await.unregister(tab);
        if let Some(link) = &link {
            let _ = link.post(PageMessage::Shutdown);
        }
        let _ = self.events.send(StateEvent::TabClosed { tab_id: tab });
        info!(%tab, "tab removed");
        link
    }

    /// Fan a request out to `targets`, capturing each result
    pub async fn broadcast(&self, targets: Vec<PageLink>, request: PageRequest) -> Vec<Delivery> {
        let timeout = self.relay_timeout;
        join_all(targets.into_iter().map(|link| {
            let request = request.clone();
            async move {
                Delivery {
                    tab_id: link.tab_id(),
                    result: link.request(request, timeout).await,
                }
            }
        }))
        .await
    }

    /// Handle one request. `origin` is the sending page, if any.
    pub async fn handle(&self, request: Request, origin: Option<TabId>) -> Response {
        match request {
            Request::ExecuteCommand { command, tab_id } => {
                let target = self.target(tab_id, origin).await;
                self.execute_command(command, target).await
            }

            Request::ExecuteVoiceCommand {
                command,
                original_command,
                tab_id,
            } => {
                let target = self.target(tab_id, origin).await;
                self.relay(
                    target,
                    PageRequest::ExecuteVoiceCommand {
                        command,
                        original_command,
                    },
                )
                .await
            }

            Request::UpdateScrollState { state } => {
                let (tracked, merged) = {
                    let mut registry = self.registry.write().await;
                    if registry.tracks(origin) {
                        (true, registry.merge_scroll_state(&state))
                    } else {
                        (false, registry.last_known_scroll_state())
                    }
                };

                // Background tabs are reported as-is without moving the aggregate.
                let reported = if tracked {
                    merged
                } else {
                    let mut own = ScrollState::default();
                    own.apply(&state);
                    own
                };
                let _ = self.events.send(StateEvent::ScrollStateChanged {
                    tab_id: origin,
                    state: reported,
                });
                Response::ok().with_scroll_state(merged)
            }

            Request::GetScrollState { tab_id: Some(tab) } => {
                self.relay(Some(tab), PageRequest::GetScrollState).await
            }

            Request::GetScrollState { tab_id: None } => {
                let state = self.registry.read().await.last_known_scroll_state();
                Response::ok().with_scroll_state(state)
            }

            Request::SwitchTab { direction, tab_id } => {
                let target = self.target(tab_id, origin).await;
                self.switch_tab(direction, target)
            }

            Request::MaximizeWindow => self.set_window(WindowState::Maximized),

            Request::MinimizeWindow => self.set_window(WindowState::Minimized),

            Request::GetActiveTabId => Response {
                success: true,
                active_tab_id: self.active_tab_id().await,
                ..Default::default()
            },

            Request::ToggleRecording { tab_id } => {
                let target = self.target(tab_id, origin).await;
                self.relay(target, PageRequest::ToggleRecording).await
            }

            Request::Ping => Response::ok().with_message("pong"),

            Request::Subscribe => Response::ok(),

            Request::OpenTab { .. }
            | Request::CloseTab { .. }
            | Request::ActivateTab { .. }
            | Request::Transcript { .. }
            | Request::SetVisibility { .. }
            | Request::PressKey { .. }
            | Request::FailEngine { .. } => Response::failure("Unknown action"),
        }
    }

    /// Explicit tab, else the sender, else the active tab
    async fn target(&self, explicit: Option<TabId>, origin: Option<TabId>) -> Option<TabId> {
        match explicit.or(origin) {
            Some(tab) => Some(tab),
            None => self.active_tab_id().await,
        }
    }

    async fn execute_command(&self, command: String, target: Option<TabId>) -> Response {
        let Some(tab) = target else {
            return Response::failure("No active tab found");
        };

        let action = self.classifier.classify(&command);
        let _ = self.events.send(StateEvent::CommandResolved {
            tab_id: tab,
            transcript: command.clone(),
            action,
        });

        let Some(action) = action else {
            debug!(%tab, %command, "could not process command");
            return Response::failure("Could not process command");
        };

        info!(%tab, %action, %command, "relaying command");
        self.relay(
            Some(tab),
            PageRequest::ExecuteVoiceCommand {
                command: VoiceCommand::Action(action),
                original_command: Some(command),
            },
        )
        .await
        .with_action(Some(action))
    }

    /// Send a request to one page and translate the reply
    async fn relay(&self, target: Option<TabId>, request: PageRequest) -> Response {
        let Some(tab) = target else {
            return Response::failure("No active tab found");
        };
        let Some(link) = self.page(tab).await else {
            return Response::failure(RelayError::Unreachable(tab).to_string());
        };

        match link.request(request, self.relay_timeout).await {
            Ok(reply) => Response {
                success: reply.success,
                error: reply.error,
                scroll_state: Some(reply.scroll_state),
                ..Default::default()
            },
            Err(e) => {
                warn!(%tab, error = %e, "relay failed");
                Response::failure(e.to_string())
            }
        }
    }

    fn switch_tab(&self, direction: TabDirection, current: Option<TabId>) -> Response {
        let Some(current) = current else {
            return Response::failure("Current tab not found");
        };

        let tabs = match self.host.tabs_in_current_window() {
            Ok(tabs) => tabs,
            Err(e) => return Response::failure(e.to_string()),
        };
        let Some(index) = tabs.iter().position(|t| t.id == current) else {
            return Response::failure("Current tab not found");
        };

        let next = adjacent_index(index, tabs.len(), direction);
        if next == index {
            return Response::failure("Could not switch tab");
        }

        let next_tab = tabs[next].id;
        match self.host.activate_tab(next_tab) {
            Ok(()) => {
                info!(from = %current, to = %next_tab, ?direction, "switched tab");
                Response::ok().with_tab_id(next_tab)
            }
            Err(e) => Response::failure(e.to_string()),
        }
    }

    fn set_window(&self, target: WindowState) -> Response {
        let current = match self.host.window_state() {
            Ok(state) => state,
            Err(e) => return Response::failure(e.to_string()),
        };
        if current == target {
            return Response::ok().with_message(format!("Window already {}", target));
        }

        match self.host.set_window_state(target) {
            Ok(()) => {
                info!(from = %current, to = %target, "window state changed");
                Response::ok()
            }
            Err(e) => Response::failure(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::InMemoryHost;
    use crate::commands::ActionId;
    use crate::scroll::ScrollStatePatch;

    const TIMEOUT: Duration = Duration::from_millis(200);

    /// A page that answers every request and records what it was asked
    fn fake_page(id: u32) -> (PageLink, mpsc::UnboundedReceiver<PageRequest>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (seen_tx, seen_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if let PageMessage::Request { request, reply } = message {
                    let _ = seen_tx.send(request);
                    let _ = reply.send(PageReply::ok(ScrollState::default()));
                }
            }
        });
        (PageLink::new(TabId(id), tx), seen_rx)
    }

    fn dead_page(id: u32) -> PageLink {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        PageLink::new(TabId(id), tx)
    }

    fn setup() -> (Coordinator, Arc<InMemoryHost>, broadcast::Receiver<StateEvent>) {
        let (host, host_events) = InMemoryHost::new();
        // Host events are driven by hand in these tests.
        drop(host_events);
        let host = Arc::new(host);
        let (events, rx) = broadcast::channel(64);
        let coordinator = Coordinator::new(
            host.clone() as Arc<dyn BrowserHost>,
            Classifier::default(),
            events,
            TIMEOUT,
        );
        (coordinator, host, rx)
    }

    #[tokio::test]
    async fn test_activation_suspends_others_despite_unreachable_page() {
        let (coordinator, _host, mut events) = setup();
        let (one, mut one_seen) = fake_page(1);
        let (two, mut two_seen) = fake_page(2);
        coordinator.register_page(one).await;
        coordinator.register_page(two).await;
        coordinator.register_page(dead_page(3)).await;

        let deliveries = coordinator.on_tab_activated(TabId(1)).await;

        let outcome: Vec<(TabId, bool)> = deliveries
            .iter()
            .map(|d| (d.tab_id, d.result.is_ok()))
            .collect();
        assert_eq!(
            outcome,
            vec![(TabId(2), true), (TabId(3), false), (TabId(1), true)]
        );
        assert_eq!(
            deliveries[1].result,
            Err(RelayError::Unreachable(TabId(3)))
        );
        assert_eq!(two_seen.recv().await, Some(PageRequest::Suspend));
        assert_eq!(one_seen.recv().await, Some(PageRequest::Resume));
        assert_eq!(coordinator.active_tab_id().await, Some(TabId(1)));
        assert_eq!(
            events.recv().await.unwrap(),
            StateEvent::ActiveTabChanged { tab_id: TabId(1) }
        );
    }

    #[tokio::test]
    async fn test_switch_tab_wraps_around() {
        let (coordinator, host, _events) = setup();
        let first = host.open_tab("https://a.example");
        host.open_tab("https://b.example");
        let last = host.open_tab("https://c.example");
        host.activate_tab(first).unwrap();

        let response = coordinator
            .handle(
                Request::SwitchTab {
                    direction: TabDirection::Left,
                    tab_id: None,
                },
                Some(first),
            )
            .await;
        assert!(response.success);
        assert_eq!(response.tab_id, Some(last));
        assert_eq!(host.active_tab(), Some(last));

        let response = coordinator
            .handle(
                Request::SwitchTab {
                    direction: TabDirection::Right,
                    tab_id: None,
                },
                Some(last),
            )
            .await;
        assert_eq!(response.tab_id, Some(first));
    }

    #[tokio::test]
    async fn test_switch_tab_failures() {
        let (coordinator, host, _events) = setup();
        let request = || Request::SwitchTab {
            direction: TabDirection::Right,
            tab_id: None,
        };

        let response = coordinator.handle(request(), None).await;
        assert_eq!(response.error.as_deref(), Some("Current tab not found"));

        let only = host.open_tab("https://a.example");
        let response = coordinator.handle(request(), Some(only)).await;
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Could not switch tab"));
    }

    #[tokio::test]
    async fn test_window_already_in_state() {
        let (coordinator, _host, _events) = setup();

        let response = coordinator.handle(Request::MaximizeWindow, None).await;
        assert!(response.success);
        assert_eq!(response.message, None);

        let response = coordinator.handle(Request::MaximizeWindow, None).await;
        assert!(response.success);
        assert_eq!(response.message.as_deref(), Some("Window already maximized"));

        let response = coordinator.handle(Request::MinimizeWindow, None).await;
        assert!(response.success);
        assert_eq!(response.message, None);
    }

    #[tokio::test]
    async fn test_execute_command_relays_classified_action() {
        let (coordinator, _host, mut events) = setup();
        let (page, mut seen) = fake_page(4);
        coordinator.register_page(page).await;

        let response = coordinator
            .handle(
                Request::ExecuteCommand {
                    command: "please scroll down faster now".into(),
                    tab_id: None,
                },
                Some(TabId(4)),
            )
            .await;

        assert!(response.success);
        assert_eq!(response.action, Some(ActionId::ScrollDown));
        assert_eq!(
            seen.recv().await,
            Some(PageRequest::ExecuteVoiceCommand {
                command: VoiceCommand::Action(ActionId::ScrollDown),
                original_command: Some("please scroll down faster now".into()),
            })
        );
        assert!(matches!(
            events.recv().await.unwrap(),
            StateEvent::CommandResolved { action: Some(ActionId::ScrollDown), .. }
        ));
    }

    #[tokio::test]
    async fn test_execute_command_without_match() {
        let (coordinator, _host, mut events) = setup();
        let (page, mut seen) = fake_page(5);
        coordinator.register_page(page).await;

        let response = coordinator
            .handle(
                Request::ExecuteCommand {
                    command: "xyzzy plugh".into(),
                    tab_id: None,
                },
                Some(TabId(5)),
            )
            .await;

        assert!(!response.success);
        assert_eq!(response.action, None);
        assert_eq!(response.error.as_deref(), Some("Could not process command"));
        assert_eq!(
            events.recv().await.unwrap(),
            StateEvent::CommandResolved {
                tab_id: TabId(5),
                transcript: "xyzzy plugh".into(),
                action: None,
            }
        );
        assert!(seen.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_execute_command_without_tab() {
        let (coordinator, _host, _events) = setup();
        let response = coordinator
            .handle(
                Request::ExecuteCommand {
                    command: "start".into(),
                    tab_id: None,
                },
                None,
            )
            .await;
        assert_eq!(response.error.as_deref(), Some("No active tab found"));
    }

    #[tokio::test]
    async fn test_background_updates_leave_aggregate_alone() {
        let (coordinator, _host, _events) = setup();
        coordinator.on_tab_activated(TabId(1)).await;

        let running = ScrollStatePatch {
            active: Some(true),
            speed: Some(3.0),
            ..Default::default()
        };
        coordinator
            .handle(Request::UpdateScrollState { state: running }, Some(TabId(2)))
            .await;
        let response = coordinator
            .handle(Request::GetScrollState { tab_id: None }, None)
            .await;
        assert_eq!(response.scroll_state, Some(ScrollState::default()));

        coordinator
            .handle(Request::UpdateScrollState { state: running }, Some(TabId(1)))
            .await;
        let state = coordinator
            .handle(Request::GetScrollState { tab_id: None }, None)
            .await
            .scroll_state
            .unwrap();
        assert!(state.active);
        assert_eq!(state.speed, 3.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_scroll_echoes_from_one_page_apply_in_order() {
        let (coordinator, _host, _events) = setup();
        coordinator.on_tab_activated(TabId(1)).await;
        let (handle, inbox) = CoordinatorHandle::channel();
        tokio::spawn(coordinator.clone().run(inbox));

        for round in 0..20 {
            for i in 0..40u32 {
                let speed = if i == 39 { 4.0 } else { 0.5 + f64::from(i % 9) * 0.5 };
                let patch = ScrollStatePatch {
                    active: Some(round % 2 == 0),
                    speed: Some(speed),
                    ..Default::default()
                };
                assert!(handle.post(Request::UpdateScrollState { state: patch }, Some(TabId(1))));
            }

            let response = handle
                .request(Request::GetScrollState { tab_id: None }, None)
                .await
                .unwrap();
            let state = response.scroll_state.unwrap();
            assert_eq!(state.speed, 4.0, "round {}", round);
            assert_eq!(state.active, round % 2 == 0, "round {}", round);
        }
    }

    #[tokio::test]
    async fn test_relay_to_unknown_tab() {
        let (coordinator, _host, _events) = setup();
        let response = coordinator
            .handle(Request::GetScrollState { tab_id: Some(TabId(42)) }, None)
            .await;
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("tab 42 is not reachable"));
    }

    #[tokio::test]
    async fn test_host_requests_are_unknown_here() {
        let (coordinator, _host, _events) = setup();
        let response = coordinator
            .handle(Request::OpenTab { url: "https://a.example".into() }, None)
            .await;
        assert_eq!(response, Response::failure("Unknown action"));
    }

    #[tokio::test]
    async fn test_tab_removal_shuts_page_down() {
        let (coordinator, _host, _events) = setup();
        let (tx, mut rx) = mpsc::unbounded_channel();
        coordinator.register_page(PageLink::new(TabId(6), tx)).await;
        coordinator.on_tab_activated(TabId(6)).await;

        assert!(coordinator.on_tab_removed(TabId(6)).await.is_some());
        assert_eq!(coordinator.active_tab_id().await, None);
        assert!(coordinator.page(TabId(6)).await.is_none());

        // Resume from the activation, then shutdown.
        assert!(matches!(rx.recv().await, Some(PageMessage::Request { .. })));
        assert!(matches!(rx.recv().await, Some(PageMessage::Shutdown)));
    }
}
