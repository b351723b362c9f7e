use std::sync::Arc;

use secretaria_chat::tui::AppEvent;
use secretaria_chat::{handler, App, HttpReplyFetcher, Message, Settings};
use tokio::sync::mpsc;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn app_against(server: &MockServer) -> (App, mpsc::UnboundedReceiver<AppEvent>) {
    let settings = Settings {
        endpoint: format!("{}/answer_query", server.uri()),
        ..Settings::default()
    };
    let (tx, rx) = mpsc::unbounded_channel();
    let fetcher = Arc::new(HttpReplyFetcher::new(&settings.endpoint));
    (App::new(&settings, fetcher, tx), rx)
}

#[tokio::test]
async fn test_reply_from_service_is_shown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/answer_query"))
        .and(body_json(serde_json::json!({ "user_message": "¿Dónde está mi cita?" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "answer": "Mañana a las 9" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (mut app, mut rx) = app_against(&server).await;
    app.input.set("¿Dónde está mi cita?");
    app.submit();
    assert!(app.conversation.is_typing());

    let event = rx.recv().await.expect("reply event");
    handler::handle_event(&mut app, event);

    assert_eq!(
        app.conversation.messages(),
        &[Message::user("¿Dónde está mi cita?"), Message::bot("Mañana a las 9")]
    );
    assert!(!app.conversation.is_typing());
}

#[tokio::test]
async fn test_service_error_leaves_only_user_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let (mut app, mut rx) = app_against(&server).await;
    app.input.set("hello");
    app.submit();

    let event = rx.recv().await.expect("reply event");
    handler::handle_event(&mut app, event);

    assert_eq!(app.conversation.messages(), &[Message::user("hello")]);
    assert!(!app.conversation.is_typing());
}
