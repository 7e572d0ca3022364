//! Per-tab page actor
//!
//! Handles one mailbox message at a time, so every mutation of the scroll
//! machine and recognition session is serialized. Anything that waits
//! (coordinator replies, restart delays, gate release) runs in a spawned
//! task that posts a follow-up message back into the mailbox.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use super::environment::PageEnvironment;
use super::indicator::status_text;
use super::link::{PageLink, PageMessage, PageReply, PageRequest};
use super::shortcut::{Key, TripleTap};
use crate::commands::{ActionId, VoiceCommand};
use crate::coordinator::{CoordinatorHandle, TabDirection, TabId};
use crate::ipc::{Request, Response};
use crate::notice::Notice;
use crate::recognition::{
    Debouncer, EngineEvent, RecognitionSession, RestartToken, SessionEffect, SpeechEngine,
};
use crate::scroll::{Direction, IntervalTicker, ScrollMachine, ScrollState, SPEED_STEP};

pub const MIN_ZOOM: f64 = 0.3;
pub const MAX_ZOOM: f64 = 3.0;
pub const ZOOM_STEP: f64 = 0.1;

/// Timing knobs for a page
#[derive(Debug, Clone, Copy)]
pub struct PageSettings {
    pub tick_interval: Duration,
    pub debounce: Duration,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            tick_interval: crate::scroll::DEFAULT_TICK_INTERVAL,
            debounce: crate::recognition::MIN_DEBOUNCE_WINDOW,
        }
    }
}

/// One tab's page script
pub struct PageInstance<E: SpeechEngine, D: PageEnvironment> {
    tab_id: TabId,
    env: D,
    scroll: ScrollMachine<IntervalTicker<PageMessage>>,
    session: RecognitionSession<E>,
    debouncer: Debouncer,
    shortcut: TripleTap,
    visible: bool,
    tab_active: bool,
    coordinator: CoordinatorHandle,
    mailbox: mpsc::UnboundedSender<PageMessage>,
    published: Option<ScrollState>,
    status: String,
}

impl<E, D> PageInstance<E, D>
where
    E: SpeechEngine + 'static,
    D: PageEnvironment + 'static,
{
    /// Start a page task. `make_engine` receives the page's own link so the
    /// engine can deliver its events into the mailbox.
    pub fn spawn<F>(
        tab_id: TabId,
        env: D,
        make_engine: F,
        coordinator: CoordinatorHandle,
        settings: PageSettings,
    ) -> PageLink
    where
        F: FnOnce(PageLink) -> E,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let link = PageLink::new(tab_id, tx.clone());
        let engine = make_engine(link.clone());

        let page = Self {
            tab_id,
            env,
            scroll: ScrollMachine::new(
                IntervalTicker::new(tx.clone(), PageMessage::tick),
                settings.tick_interval,
            ),
            session: RecognitionSession::new(engine),
            debouncer: Debouncer::new(settings.debounce),
            shortcut: TripleTap::new(),
            visible: true,
            tab_active: true,
            coordinator,
            mailbox: tx,
            published: None,
            status: String::new(),
        };

        tokio::spawn(page.run(rx));
        link
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<PageMessage>) {
        info!(tab_id = %self.tab_id, "page instance started");
        self.publish();

        while let Some(message) = rx.recv().await {
            if matches!(message, PageMessage::Shutdown) {
                break;
            }
            self.handle(message);
            self.publish();
        }

        // Unload: drop intent first so no pending restart can fire.
        self.session.stop();
        self.scroll.stop();
        info!(tab_id = %self.tab_id, "page instance stopped");
    }

    fn can_listen(&self) -> bool {
        self.visible && self.tab_active
    }

    fn handle(&mut self, message: PageMessage) {
        match message {
            PageMessage::Request { request, reply } => {
                let response = self.on_request(request);
                if reply.send(response).is_err() {
                    debug!(tab_id = %self.tab_id, "requester went away before reply");
                }
            }

            PageMessage::Engine(event) => self.on_engine_event(event),

            PageMessage::Tick => {
                if let Some(dy) = self.scroll.tick(self.visible) {
                    self.env.scroll_by(dy);
                }
            }

            PageMessage::Visibility(visible) => self.on_visibility(visible),

            PageMessage::Key(key) => self.on_key(key),

            PageMessage::RestartDue(token) => {
                let can_listen = self.can_listen();
                self.session.restart_due(token, can_listen);
            }

            PageMessage::CommandSettled {
                seq,
                transcript,
                response,
            } => self.on_command_settled(seq, transcript, response),

            PageMessage::ReleaseGate(seq) => self.session.release_gate(seq),

            PageMessage::Shutdown => {}
        }
    }

    fn on_request(&mut self, request: PageRequest) -> PageReply {
        match request {
            PageRequest::Suspend => {
                self.tab_active = false;
                self.scroll.suspend();
                self.session.suspend();
            }

            PageRequest::Resume => {
                self.tab_active = true;
                self.scroll.restore();
                if self.can_listen() {
                    let effects = self.session.resume();
                    self.apply(effects);
                }
            }

            PageRequest::ExecuteVoiceCommand {
                command,
                original_command,
            } => {
                if !self.debouncer.accept(Instant::now()) {
                    debug!(tab_id = %self.tab_id, %command, "command debounced");
                    return PageReply::failure(self.scroll.state(), "command debounced");
                }
                self.execute(command, original_command);
            }

            PageRequest::GetScrollState => {}

            PageRequest::ToggleRecording => self.toggle_recording(),
        }

        PageReply::ok(self.scroll.state())
    }

    fn on_engine_event(&mut self, event: EngineEvent) {
        let can_listen = self.can_listen();
        let effects = self.session.handle(event, can_listen);
        self.apply(effects);
    }

    fn on_visibility(&mut self, visible: bool) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        debug!(tab_id = %self.tab_id, visible, "page visibility changed");

        if visible {
            self.scroll.restore();
            if self.can_listen() {
                let effects = self.session.resume();
                self.apply(effects);
            }
        } else {
            self.scroll.suspend();
            self.session.suspend();
        }
    }

    fn on_key(&mut self, key: Key) {
        if self.shortcut.press(key, Instant::now()) {
            debug!(tab_id = %self.tab_id, "recognition shortcut pressed");
            self.toggle_recording();
        }
    }

    fn toggle_recording(&mut self) {
        let effects = self.session.toggle();
        self.apply(effects);
    }

    fn apply(&mut self, effects: Vec<SessionEffect>) {
        for effect in effects {
            match effect {
                SessionEffect::Submit { transcript, seq } => self.submit(transcript, seq),
                SessionEffect::ScheduleRestart { token, after } => self.schedule_restart(token, after),
                SessionEffect::Notify(notice) => self.notify(notice),
            }
        }
    }

    /// Send a transcript to the coordinator; the answer comes back as
    /// `CommandSettled`.
    fn submit(&mut self, transcript: String, seq: u64) {
        debug!(tab_id = %self.tab_id, %transcript, "submitting transcript");
        let pending = self.coordinator.request(
            Request::ExecuteCommand {
                command: transcript.clone(),
                tab_id: Some(self.tab_id),
            },
            Some(self.tab_id),
        );
        let mailbox = self.mailbox.clone();

        tokio::spawn(async move {
            let response = pending.await.ok();
            let _ = mailbox.send(PageMessage::CommandSettled {
                seq,
                transcript,
                response,
            });
        });
    }

    fn on_command_settled(&mut self, seq: u64, transcript: String, response: Option<Response>) {
        match response {
            Some(response) if response.success => {
                debug!(tab_id = %self.tab_id, action = ?response.action, "command executed");
            }
            Some(response) if response.action.is_none() => {
                self.notify(Notice::info(format!(
                    "Command not recognized: \"{}\"",
                    transcript
                )));
            }
            Some(response) => {
                debug!(tab_id = %self.tab_id, error = ?response.error, "command not executed");
            }
            None => warn!(tab_id = %self.tab_id, "coordinator unavailable"),
        }

        let mailbox = self.mailbox.clone();
        let window = self.debouncer.window();
        tokio::spawn(async move {
            time::sleep(window).await;
            let _ = mailbox.send(PageMessage::ReleaseGate(seq));
        });
    }

    fn schedule_restart(&self, token: RestartToken, after: Duration) {
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            time::sleep(after).await;
            let _ = mailbox.send(PageMessage::RestartDue(token));
        });
    }

    fn notify(&mut self, notice: Notice) {
        debug!(tab_id = %self.tab_id, %notice, "notice");
        self.env.show_notice(&notice);
    }

    fn relay(&self, request: Request) {
        if !self.coordinator.post(request, Some(self.tab_id)) {
            warn!(tab_id = %self.tab_id, "coordinator unavailable, request dropped");
        }
    }

    /// Echo state changes to the coordinator and refresh the indicator
    fn publish(&mut self) {
        let state = self.scroll.state();
        if self.published != Some(state) {
            self.published = Some(state);
            self.relay(Request::UpdateScrollState {
                state: state.into(),
            });
        }

        let status = status_text(
            &state,
            self.session.listening() && self.session.desired_listening(),
        );
        if status != self.status {
            self.env.render_status(&status);
            self.status = status;
        }
    }

    fn execute(&mut self, command: VoiceCommand, original: Option<String>) {
        debug!(tab_id = %self.tab_id, %command, ?original, "executing command");

        match command {
            VoiceCommand::Action(action) => self.execute_action(action),

            VoiceCommand::SetScrollSpeed(value) => {
                match value.and_then(|speed| self.scroll.set_speed(speed)) {
                    Some(speed) => self.notify(Notice::info(format!("Speed: {:.1}px/tick", speed))),
                    None => debug!(?value, "speed command ignored"),
                }
            }

            VoiceCommand::Unknown(raw) => {
                debug!(tab_id = %self.tab_id, %raw, "unrecognized command");
                if let Some(original) = original {
                    self.notify(Notice::warning(format!(
                        "Command not recognized: \"{}\"",
                        original
                    )));
                }
            }
        }
    }

    fn execute_action(&mut self, action: ActionId) {
        match action {
            ActionId::StartScrolling => {
                self.scroll.start();
                self.notify(Notice::success("Auto-scrolling started"));
            }
            ActionId::StopScrolling => {
                self.scroll.stop();
                self.notify(Notice::info("Auto-scrolling stopped"));
            }
            ActionId::PauseScrolling => {
                self.scroll.toggle_pause();
                let message = if self.scroll.state().paused {
                    "Scrolling paused"
                } else {
                    "Scrolling resumed"
                };
                self.notify(Notice::info(message));
            }
            ActionId::ResumeScrolling => {
                self.scroll.resume();
                self.notify(Notice::success("Auto-scrolling resumed"));
            }
            ActionId::IncreaseSpeed => self.change_speed(SPEED_STEP),
            ActionId::DecreaseSpeed => self.change_speed(-SPEED_STEP),
            ActionId::ScrollUp => {
                self.scroll.set_direction(Direction::Backward);
                self.notify(Notice::info("Direction: Scrolling up"));
            }
            ActionId::ScrollDown => {
                self.scroll.set_direction(Direction::Forward);
                self.notify(Notice::info("Direction: Scrolling down"));
            }
            ActionId::GoToTop => {
                self.scroll.stop();
                self.env.scroll_to_top();
                self.notify(Notice::info("Scrolled to top"));
            }
            ActionId::GoToBottom => {
                self.scroll.stop();
                self.env.scroll_to_bottom();
                self.notify(Notice::info("Scrolled to bottom"));
            }
            ActionId::LeftTab => self.switch_tab(TabDirection::Left),
            ActionId::RightTab => self.switch_tab(TabDirection::Right),
            ActionId::PauseVideo => self.pause_video(),
            ActionId::PlayVideo => self.play_video(),
            ActionId::MaximizeVideo => self.maximize_video(),
            ActionId::MinimizeVideo => self.minimize_video(),
            ActionId::MaximizeWindow => {
                self.relay(Request::MaximizeWindow);
                self.notify(Notice::info("Window maximized"));
            }
            ActionId::MinimizeWindow => {
                self.relay(Request::MinimizeWindow);
                self.notify(Notice::info("Window minimized"));
            }
            ActionId::StopListening | ActionId::Goodbye => {
                let effects = self.session.stop();
                self.apply(effects);
            }
            ActionId::GoBack => {
                self.env.history_back();
                self.notify(Notice::info("Navigated back"));
            }
            ActionId::GoForward => {
                self.env.history_forward();
                self.notify(Notice::info("Navigated forward"));
            }
            ActionId::Refresh => {
                self.env.reload();
                self.notify(Notice::info("Page refreshed"));
            }
            ActionId::ZoomIn => self.adjust_zoom(ZOOM_STEP),
            ActionId::ZoomOut => self.adjust_zoom(-ZOOM_STEP),
            ActionId::FocusSearch => {
                if self.env.focus_search() {
                    self.notify(Notice::info("Search input focused"));
                } else {
                    self.notify(Notice::warning("No search input found"));
                }
            }
        }
    }

    fn change_speed(&mut self, delta: f64) {
        let speed = self.scroll.change_speed(delta);
        self.notify(Notice::info(format!("Speed: {:.1}px/tick", speed)));
    }

    fn switch_tab(&mut self, direction: TabDirection) {
        self.relay(Request::SwitchTab {
            direction,
            tab_id: Some(self.tab_id),
        });
        let side = match direction {
            TabDirection::Left => "left",
            TabDirection::Right => "right",
        };
        self.notify(Notice::info(format!("Switched to {} tab", side)));
    }

    fn adjust_zoom(&mut self, delta: f64) {
        let current = self.env.zoom();
        let current = if current.is_finite() && current > 0.0 { current } else { 1.0 };
        let zoom = ((current + delta) * 100.0).round() / 100.0;
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.env.set_zoom(zoom);
        self.notify(Notice::info(format!("Zoom: {}%", (zoom * 100.0).round())));
    }

    fn pause_video(&mut self) {
        let notice = match self.env.video() {
            None => Notice::warning("No video found"),
            Some(video) if video.paused => Notice::info("Video is already paused"),
            Some(_) => {
                self.env.pause_video();
                Notice::info("Video paused")
            }
        };
        self.notify(notice);
    }

    fn play_video(&mut self) {
        let notice = match self.env.video() {
            None => Notice::warning("No video found"),
            Some(video) if !video.paused => Notice::info("Video is already playing"),
            Some(_) => match self.env.play_video() {
                Ok(()) => Notice::info("Video playing"),
                Err(e) => {
                    debug!(error = %e, "video play failed");
                    Notice::error("Failed to play video")
                }
            },
        };
        self.notify(notice);
    }

    fn maximize_video(&mut self) {
        let notice = if self.env.video().is_none() {
            Notice::warning("No video found")
        } else if self.env.is_fullscreen() {
            Notice::info("Already in fullscreen mode")
        } else {
            match self.env.request_video_fullscreen() {
                Ok(()) => Notice::info("Video maximized"),
                Err(e) => {
                    debug!(error = %e, "fullscreen rejected, using fallback");
                    self.env.set_video_fallback_maximized(true);
                    Notice::info("Video maximized (fallback mode)")
                }
            }
        };
        self.notify(notice);
    }

    fn minimize_video(&mut self) {
        let notice = if self.env.video().is_none() {
            Notice::warning("No video found")
        } else if self.env.is_fullscreen() {
            match self.env.exit_fullscreen() {
                Ok(()) => Notice::info("Exited fullscreen"),
                Err(_) => Notice::error("Failed to exit fullscreen"),
            }
        } else {
            self.env.set_video_fallback_maximized(false);
            Notice::info("Video minimized")
        };
        self.notify(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{HeadlessDocument, ScriptedEngine};
    use crate::coordinator::Envelope;
    use crate::notice::NoticeLevel;

    const WAIT: Duration = Duration::from_secs(1);

    struct Harness {
        link: PageLink,
        doc: HeadlessDocument,
        inbox: mpsc::UnboundedReceiver<Envelope>,
    }

    impl Harness {
        fn new(doc: HeadlessDocument) -> Self {
            let (handle, inbox) = CoordinatorHandle::channel();
            let link = PageInstance::spawn(
                TabId(1),
                doc.clone(),
                ScriptedEngine::new,
                handle,
                PageSettings::default(),
            );
            Self { link, doc, inbox }
        }

        async fn request(&self, request: PageRequest) -> PageReply {
            self.link.request(request, WAIT).await.unwrap()
        }

        async fn run(&self, action: ActionId) -> PageReply {
            self.request(PageRequest::ExecuteVoiceCommand {
                command: VoiceCommand::Action(action),
                original_command: None,
            })
            .await
        }

        fn post(&self, message: PageMessage) {
            self.link.post(message).unwrap();
        }

        fn notice(&self) -> Notice {
            self.doc.last_notice().unwrap()
        }

        /// Next envelope that is not a scroll state echo
        async fn next_request(&mut self) -> Envelope {
            loop {
                let envelope = self.inbox.recv().await.unwrap();
                if !matches!(envelope.request, Request::UpdateScrollState { .. }) {
                    return envelope;
                }
            }
        }
    }

    async fn settle() {
        time::sleep(Duration::from_millis(1)).await;
    }

    async fn past_debounce() {
        time::sleep(Duration::from_millis(501)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_scrolling_moves_page() {
        let page = Harness::new(HeadlessDocument::new("https://example.com"));

        let reply = page.run(ActionId::StartScrolling).await;
        assert!(reply.success);
        assert!(reply.scroll_state.active);
        assert_eq!(page.notice(), Notice::success("Auto-scrolling started"));

        time::sleep(Duration::from_millis(200)).await;
        assert!(page.doc.snapshot().scroll_y > 0.0);
        assert_eq!(page.doc.snapshot().status, "↓ 1.0px/tick");
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_inside_window_are_debounced() {
        let page = Harness::new(HeadlessDocument::new("https://example.com"));
        page.run(ActionId::StartScrolling).await;

        let reply = page.run(ActionId::StopScrolling).await;
        assert!(!reply.success);
        assert_eq!(reply.error.as_deref(), Some("command debounced"));
        assert!(reply.scroll_state.active);

        past_debounce().await;
        let reply = page.run(ActionId::StopScrolling).await;
        assert!(reply.success);
        assert!(!reply.scroll_state.active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_suspend_freezes_and_resume_restores() {
        let page = Harness::new(HeadlessDocument::new("https://example.com"));
        page.run(ActionId::StartScrolling).await;
        time::sleep(Duration::from_millis(100)).await;

        let reply = page.request(PageRequest::Suspend).await;
        assert!(reply.scroll_state.paused);
        assert!(reply.scroll_state.suspended_by_suspend);

        let frozen = page.doc.snapshot().scroll_y;
        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(page.doc.snapshot().scroll_y, frozen);

        let reply = page.request(PageRequest::Resume).await;
        assert!(reply.scroll_state.active);
        assert!(!reply.scroll_state.paused);
        time::sleep(Duration::from_millis(100)).await;
        assert!(page.doc.snapshot().scroll_y > frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_pause_survives_tab_switch() {
        let page = Harness::new(HeadlessDocument::new("https://example.com"));
        page.run(ActionId::StartScrolling).await;
        past_debounce().await;
        page.run(ActionId::PauseScrolling).await;
        assert_eq!(page.notice(), Notice::info("Scrolling paused"));

        page.request(PageRequest::Suspend).await;
        let reply = page.request(PageRequest::Resume).await;
        assert!(reply.scroll_state.paused);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_page_does_not_scroll() {
        let page = Harness::new(HeadlessDocument::new("https://example.com"));
        page.run(ActionId::StartScrolling).await;

        page.post(PageMessage::Visibility(false));
        let reply = page.request(PageRequest::GetScrollState).await;
        assert!(reply.scroll_state.paused);
        let frozen = page.doc.snapshot().scroll_y;
        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(page.doc.snapshot().scroll_y, frozen);

        page.post(PageMessage::Visibility(true));
        let reply = page.request(PageRequest::GetScrollState).await;
        assert!(!reply.scroll_state.paused);
    }

    #[tokio::test(start_paused = true)]
    async fn test_speed_notices() {
        let page = Harness::new(HeadlessDocument::new("https://example.com"));
        let reply = page.run(ActionId::IncreaseSpeed).await;
        assert_eq!(reply.scroll_state.speed, 1.5);
        assert_eq!(page.notice(), Notice::info("Speed: 1.5px/tick"));

        past_debounce().await;
        let reply = page
            .request(PageRequest::ExecuteVoiceCommand {
                command: VoiceCommand::SetScrollSpeed(Some(9.0)),
                original_command: None,
            })
            .await;
        assert!(reply.success);
        assert_eq!(reply.scroll_state.speed, 1.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zoom_is_clamped() {
        let mut doc = HeadlessDocument::new("https://example.com");
        doc.set_zoom(2.95);
        let page = Harness::new(doc);

        page.run(ActionId::ZoomIn).await;
        assert_eq!(page.doc.snapshot().zoom, 3.0);
        assert_eq!(page.notice(), Notice::info("Zoom: 300%"));

        past_debounce().await;
        page.run(ActionId::ZoomOut).await;
        assert_eq!(page.doc.snapshot().zoom, 2.9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_video_commands() {
        let page = Harness::new(HeadlessDocument::new("https://example.com").with_video(true));

        page.run(ActionId::PauseVideo).await;
        assert_eq!(page.notice(), Notice::info("Video is already paused"));

        past_debounce().await;
        page.run(ActionId::PlayVideo).await;
        assert_eq!(page.notice(), Notice::info("Video playing"));
        assert_eq!(page.doc.video(), Some(crate::page::VideoInfo { paused: false }));

        past_debounce().await;
        page.run(ActionId::MaximizeVideo).await;
        assert_eq!(page.notice(), Notice::info("Video maximized"));

        past_debounce().await;
        page.run(ActionId::MaximizeVideo).await;
        assert_eq!(page.notice(), Notice::info("Already in fullscreen mode"));

        past_debounce().await;
        page.run(ActionId::MinimizeVideo).await;
        assert_eq!(page.notice(), Notice::info("Exited fullscreen"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fullscreen_fallback_and_missing_video() {
        let page = Harness::new(
            HeadlessDocument::new("https://example.com")
                .with_video(false)
                .deny_fullscreen(),
        );
        page.run(ActionId::MaximizeVideo).await;
        assert_eq!(page.notice(), Notice::info("Video maximized (fallback mode)"));
        assert_eq!(page.doc.snapshot().video.map(|v| v.fallback_maximized), Some(true));

        let bare = Harness::new(HeadlessDocument::new("https://example.com"));
        bare.run(ActionId::PlayVideo).await;
        assert_eq!(bare.notice().level, NoticeLevel::Warning);
        assert_eq!(bare.notice().message, "No video found");
    }

    #[tokio::test(start_paused = true)]
    async fn test_go_to_top_stops_scrolling() {
        let page = Harness::new(HeadlessDocument::new("https://example.com"));
        page.run(ActionId::StartScrolling).await;
        time::sleep(Duration::from_millis(600)).await;

        let reply = page.run(ActionId::GoToTop).await;
        assert!(!reply.scroll_state.active);
        assert_eq!(page.doc.snapshot().scroll_y, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_focus_reports_missing_input() {
        let page = Harness::new(HeadlessDocument::new("https://example.com"));
        page.run(ActionId::FocusSearch).await;
        assert_eq!(page.notice(), Notice::warning("No search input found"));

        let page = Harness::new(HeadlessDocument::new("https://example.com").with_search_input());
        page.run(ActionId::FocusSearch).await;
        assert!(page.doc.snapshot().search_focused);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tab_switch_is_relayed() {
        let mut page = Harness::new(HeadlessDocument::new("https://example.com"));
        page.run(ActionId::LeftTab).await;

        let envelope = page.next_request().await;
        assert_eq!(
            envelope.request,
            Request::SwitchTab {
                direction: TabDirection::Left,
                tab_id: Some(TabId(1)),
            }
        );
        assert_eq!(envelope.origin, Some(TabId(1)));
        assert_eq!(page.notice(), Notice::info("Switched to left tab"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transcript_is_submitted_once_per_gate() {
        let mut page = Harness::new(HeadlessDocument::new("https://example.com"));
        page.request(PageRequest::ToggleRecording).await;
        settle().await;
        assert_eq!(page.notice(), Notice::info("Voice activated - Listening..."));
        assert_eq!(page.doc.snapshot().status, "Listening...");

        let heard = |text: &str| {
            PageMessage::Engine(EngineEvent::Result {
                transcript: text.to_string(),
                is_final: true,
            })
        };
        page.post(heard("xyzzy"));
        page.post(heard("scroll down"));

        let envelope = page.next_request().await;
        assert_eq!(
            envelope.request,
            Request::ExecuteCommand {
                command: "xyzzy".into(),
                tab_id: Some(TabId(1)),
            }
        );
        envelope
            .reply
            .unwrap()
            .send(Response::failure("Could not process command"))
            .unwrap();
        settle().await;
        assert_eq!(page.notice(), Notice::info("Command not recognized: \"xyzzy\""));

        // The second result arrived while the gate was closed.
        past_debounce().await;
        assert!(page.inbox.try_recv().map_or(true, |e| matches!(
            e.request,
            Request::UpdateScrollState { .. }
        )));

        page.post(heard("scroll up"));
        let envelope = page.next_request().await;
        assert!(matches!(
            envelope.request,
            Request::ExecuteCommand { ref command, .. } if command == "scroll up"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_ignored_when_not_listening() {
        let mut page = Harness::new(HeadlessDocument::new("https://example.com"));
        page.post(PageMessage::Engine(EngineEvent::Result {
            transcript: "start".into(),
            is_final: true,
        }));
        settle().await;
        while let Ok(envelope) = page.inbox.try_recv() {
            assert!(matches!(envelope.request, Request::UpdateScrollState { .. }));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_page_restarts_listening_when_visible() {
        let page = Harness::new(HeadlessDocument::new("https://example.com"));
        page.request(PageRequest::ToggleRecording).await;
        settle().await;

        page.post(PageMessage::Visibility(false));
        settle().await;
        assert_eq!(page.doc.snapshot().status, "Ready");

        page.post(PageMessage::Visibility(true));
        time::sleep(Duration::from_millis(400)).await;
        assert_eq!(page.doc.snapshot().status, "Ready");
        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(page.doc.snapshot().status, "Listening...");
    }

    #[tokio::test(start_paused = true)]
    async fn test_triple_arrow_down_toggles_recording() {
        let page = Harness::new(HeadlessDocument::new("https://example.com"));
        for _ in 0..3 {
            page.post(PageMessage::Key(Key::ArrowDown));
        }
        settle().await;
        assert_eq!(page.doc.snapshot().status, "Listening...");

        page.run(ActionId::StopListening).await;
        assert_eq!(page.notice(), Notice::info("Voice recognition stopped"));
        settle().await;
        assert_eq!(page.doc.snapshot().status, "Ready");
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_closes_mailbox() {
        let page = Harness::new(HeadlessDocument::new("https://example.com"));
        page.post(PageMessage::Shutdown);
        settle().await;
        assert!(page.link.is_closed());
        let result = page.link.request(PageRequest::GetScrollState, WAIT).await;
        assert!(result.is_err());
    }
}
