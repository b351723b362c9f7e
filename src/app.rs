use std::sync::Arc;

use ratatui::layout::Rect;
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::Settings;
use crate::conversation::{Conversation, RequestId};
use crate::error::ReplyError;
use crate::fetcher::ReplyFetcher;
use crate::input::InputBuffer;
use crate::tui::AppEvent;

pub struct App {
    pub should_quit: bool,
    pub title: String,

    // Chat state
    pub conversation: Conversation,
    pub input: InputBuffer,
    pub serialize_submissions: bool,

    // Chat scrolling (lines from the top); `follow` pins the view to the newest row
    pub chat_scroll: u16,
    pub chat_max_scroll: u16,
    pub chat_height: u16,
    pub follow: bool,

    // Animation state
    pub animation_frame: u8, // 0-2 for the typing dots

    // Areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub send_area: Option<Rect>,

    fetcher: Arc<dyn ReplyFetcher>,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        settings: &Settings,
        fetcher: Arc<dyn ReplyFetcher>,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            title: settings.title.clone(),

            conversation: Conversation::new(),
            input: InputBuffer::new(),
            serialize_submissions: settings.serialize_submissions,

            chat_scroll: 0,
            chat_max_scroll: 0,
            chat_height: 0,
            follow: true,

            animation_frame: 0,

            chat_area: None,
            send_area: None,

            fetcher,
            events,
        }
    }

    /// Send whatever is in the input box.
    ///
    /// Blank input is ignored and left in place. Otherwise the text is
    /// appended as a user message, the input is cleared and a background task
    /// fetches the reply, posting it back as [`AppEvent::Reply`].
    pub fn submit(&mut self) -> Option<RequestId> {
        if self.input.is_blank() {
            return None;
        }
        if self.serialize_submissions && self.conversation.is_typing() {
            debug!("reply pending, holding input");
            return None;
        }

        let text = self.input.take();
        let id = self.conversation.begin_exchange(text.clone());
        self.follow = true;

        let fetcher = Arc::clone(&self.fetcher);
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = fetcher.fetch_reply(&text).await;
            // The loop may already be gone if the user quit
            let _ = events.send(AppEvent::Reply { id, outcome });
        });

        Some(id)
    }

    /// Apply a finished exchange. Failures are already logged by the
    /// conversation and are returned for callers that care.
    pub fn complete_exchange(
        &mut self,
        id: RequestId,
        outcome: Result<String, ReplyError>,
    ) -> Result<(), ReplyError> {
        let result = self.conversation.complete_exchange(id, outcome);
        if !self.conversation.is_typing() {
            self.animation_frame = 0;
        }
        result
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.conversation.is_typing() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Chat scrolling
    pub fn scroll_up(&mut self, lines: u16) {
        self.follow = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.chat_max_scroll);
        if self.chat_scroll == self.chat_max_scroll {
            self.follow = true;
        }
    }

    pub fn scroll_page_up(&mut self) {
        self.scroll_up(self.chat_height.max(2) / 2);
    }

    pub fn scroll_page_down(&mut self) {
        self.scroll_down(self.chat_height.max(2) / 2);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow = true;
        self.chat_scroll = self.chat_max_scroll;
    }

    /// Record the chat viewport after layout so scrolling stays in range.
    pub fn set_chat_viewport(&mut self, total_lines: usize, height: u16) {
        let total = u16::try_from(total_lines).unwrap_or(u16::MAX);
        self.chat_height = height;
        self.chat_max_scroll = total.saturating_sub(height);
        if self.follow || self.chat_scroll > self.chat_max_scroll {
            self.chat_scroll = self.chat_max_scroll;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::conversation::Message;
    use async_trait::async_trait;
    use tokio::sync::Semaphore;

    /// Replies with a fixed answer or fails.
    pub(crate) struct StaticFetcher(pub Result<String, ReplyError>);

    #[async_trait]
    impl ReplyFetcher for StaticFetcher {
        async fn fetch_reply(&self, _user_message: &str) -> Result<String, ReplyError> {
            self.0.clone()
        }
    }

    /// Holds each reply until a permit is added to the gate.
    struct GatedFetcher {
        gate: Arc<Semaphore>,
    }

    impl GatedFetcher {
        fn closed() -> Self {
            Self { gate: Arc::new(Semaphore::new(0)) }
        }
    }

    #[async_trait]
    impl ReplyFetcher for GatedFetcher {
        async fn fetch_reply(&self, user_message: &str) -> Result<String, ReplyError> {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| ReplyError::RequestFailed(e.to_string()))?;
            permit.forget();
            Ok(format!("re: {}", user_message))
        }
    }

    pub(crate) fn app_with(
        fetcher: impl ReplyFetcher + 'static,
    ) -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(&Settings::default(), Arc::new(fetcher), tx);
        (app, rx)
    }

    async fn settle_next(app: &mut App, rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> Result<(), ReplyError> {
        match rx.recv().await {
            Some(AppEvent::Reply { id, outcome }) => app.complete_exchange(id, outcome),
            other => panic!("expected reply event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_appends_user_message_and_clears_input() {
        let (mut app, _rx) = app_with(StaticFetcher(Ok("Hi there".to_string())));
        app.input.set("hello");

        assert!(app.submit().is_some());

        assert_eq!(app.conversation.messages(), &[Message::user("hello")]);
        assert_eq!(app.input.as_str(), "");
        assert!(app.conversation.is_typing());
    }

    #[tokio::test]
    async fn test_blank_submit_is_noop() {
        let (mut app, _rx) = app_with(StaticFetcher(Ok("Hi there".to_string())));

        assert!(app.submit().is_none());
        app.input.set("   ");
        assert!(app.submit().is_none());

        assert!(app.conversation.messages().is_empty());
        assert_eq!(app.input.as_str(), "   ");
        assert!(!app.conversation.is_typing());
    }

    #[tokio::test]
    async fn test_successful_reply_is_appended() {
        let (mut app, mut rx) = app_with(StaticFetcher(Ok("Hi there".to_string())));
        app.input.set("hello");
        app.submit();

        settle_next(&mut app, &mut rx).await.unwrap();

        assert_eq!(
            app.conversation.messages(),
            &[Message::user("hello"), Message::bot("Hi there")]
        );
        assert!(!app.conversation.is_typing());
    }

    #[tokio::test]
    async fn test_failed_reply_appends_nothing() {
        let failure = ReplyError::RequestFailed("503 Service Unavailable".to_string());
        let (mut app, mut rx) = app_with(StaticFetcher(Err(failure.clone())));
        app.input.set("hello");
        app.submit();

        let result = settle_next(&mut app, &mut rx).await;

        assert_eq!(result, Err(failure));
        assert_eq!(app.conversation.messages(), &[Message::user("hello")]);
        assert!(!app.conversation.is_typing());
    }

    #[tokio::test]
    async fn test_user_message_is_sent_as_typed() {
        let (mut app, _rx) = app_with(GatedFetcher::closed());
        app.input.set("  hola  ");
        app.submit();

        assert_eq!(app.conversation.messages(), &[Message::user("  hola  ")]);
    }

    #[tokio::test]
    async fn test_overlapping_submits_both_go_out() {
        let gate = Arc::new(Semaphore::new(0));
        let (mut app, mut rx) = app_with(GatedFetcher { gate: Arc::clone(&gate) });

        app.input.set("one");
        app.submit();
        app.input.set("two");
        app.submit();
        assert_eq!(app.conversation.in_flight(), 2);

        gate.add_permits(2);
        settle_next(&mut app, &mut rx).await.unwrap();
        assert!(app.conversation.is_typing());
        settle_next(&mut app, &mut rx).await.unwrap();
        assert!(!app.conversation.is_typing());

        let mut replies: Vec<&str> = app.conversation.messages()[2..]
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        replies.sort();
        assert_eq!(replies, vec!["re: one", "re: two"]);
    }

    #[tokio::test]
    async fn test_serialized_mode_holds_second_submit() {
        let (mut app, _rx) = app_with(GatedFetcher::closed());
        app.serialize_submissions = true;

        app.input.set("one");
        assert!(app.submit().is_some());
        app.input.set("two");
        assert!(app.submit().is_none());

        assert_eq!(app.conversation.messages(), &[Message::user("one")]);
        assert_eq!(app.input.as_str(), "two");
    }

    #[tokio::test]
    async fn test_tick_only_animates_while_typing() {
        let (mut app, mut rx) = app_with(StaticFetcher(Ok("ok".to_string())));
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        app.input.set("hello");
        app.submit();
        app.tick_animation();
        app.tick_animation();
        assert_eq!(app.animation_frame, 2);
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        app.tick_animation();
        settle_next(&mut app, &mut rx).await.unwrap();
        assert_eq!(app.animation_frame, 0);
    }

    #[tokio::test]
    async fn test_scrolling_up_stops_following() {
        let (mut app, _rx) = app_with(StaticFetcher(Ok("ok".to_string())));
        app.set_chat_viewport(30, 10);
        assert_eq!(app.chat_scroll, 20);

        app.scroll_up(5);
        assert!(!app.follow);
        app.set_chat_viewport(40, 10);
        assert_eq!(app.chat_scroll, 15);

        app.scroll_down(100);
        assert!(app.follow);
        assert_eq!(app.chat_scroll, 30);
    }
}
