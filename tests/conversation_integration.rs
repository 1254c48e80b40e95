//! End-to-end tests: a real HTTP server backed by the rig OpenAI provider, with
//! the model endpoint stubbed by wiremock.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use orchestra_search::config::AppConfig;
use orchestra_search::llm::create_provider;
use orchestra_search::preferences::{CollectorConfig, PreferenceCollector, PreferenceSchema};
use orchestra_search::web::{AppState, app_routes};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Chat completion body whose content is a fenced JSON block.
fn completion(response: &str, instrument: &str, position: &str, location: &str, side_gigs: bool) -> Value {
    let block = json!({
        "response": response,
        "instrument": instrument,
        "position": position,
        "location": location,
        "side_gigs": side_gigs,
    });
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_760_000_000,
        "model": "gpt-4o-mini",
        "system_fingerprint": null,
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": format!("```json\n{block}\n```"),
                "refusal": null
            },
            "logprobs": null,
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 100, "completion_tokens": 40, "total_tokens": 140}
    })
}

/// Start the app on a random port against `model`, return its base URL.
async fn start_server(model: &MockServer) -> String {
    let base_url = format!("{}/v1", model.uri());
    let config = AppConfig::from_lookup(|key| match key {
        "OPENAI_API_KEY" => Some("sk-test".to_string()),
        "ORCHESTRA_OPENAI_BASE_URL" => Some(base_url.clone()),
        _ => None,
    })
    .unwrap();
    let collector = PreferenceCollector::new(
        create_provider(&config).unwrap(),
        PreferenceSchema::orchestra(),
        CollectorConfig::default(),
    );
    let state = AppState::new(Arc::new(collector), config.session_idle_timeout).unwrap();
    let app = app_routes(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{port}")
}

async fn create_session(client: &reqwest::Client, base: &str) -> String {
    let created: Value = client
        .post(format!("{base}/api/sessions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    created["id"].as_str().unwrap().to_string()
}

async fn send(client: &reqwest::Client, base: &str, id: &str, message: &str) -> Value {
    client
        .post(format!("{base}/api/sessions/{id}/messages"))
        .json(&json!({ "message": message }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn two_turns_collect_every_preference() {
    timeout(TEST_TIMEOUT, async {
        let model = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("concertmaster"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                "Perfect, I have everything.",
                "",
                "assistant concertmaster",
                "",
                false,
            )))
            .with_priority(1)
            .mount(&model)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                "Got it!",
                "violin",
                "",
                "Minneapolis",
                true,
            )))
            .mount(&model)
            .await;

        let base = start_server(&model).await;
        let client = reqwest::Client::new();
        let id = create_session(&client, &base).await;

        let first = send(
            &client,
            &base,
            &id,
            "I'm a violinist from Minneapolis and I'd like side gigs too.",
        )
        .await;
        assert_eq!(first["state"]["step"], "collecting");
        assert_eq!(first["display"][0]["text"], "Got it!");
        assert_eq!(
            first["display"][1]["text"],
            "Could you also provide information for: position?"
        );

        let second = send(&client, &base, &id, "An assistant concertmaster job.").await;
        assert_eq!(second["state"]["step"], "done");
        assert_eq!(second["state"]["record"]["instrument"], "violin");
        assert_eq!(second["state"]["record"]["position"], "assistant concertmaster");
        assert_eq!(second["state"]["record"]["location"], "Minneapolis");
        assert_eq!(second["state"]["record"]["side_gigs"], true);

        let requests = model.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        let body: Value = serde_json::from_slice(&requests[1].body).unwrap();
        assert_eq!(body["temperature"], 0.0);
        // Prior turn is replayed before the new prompt.
        assert_eq!(body["messages"].as_array().unwrap().len(), 3);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn model_outage_keeps_session_and_allows_retry() {
    timeout(TEST_TIMEOUT, async {
        let model = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&model)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                "Thanks!", "cello", "", "", false,
            )))
            .mount(&model)
            .await;

        let base = start_server(&model).await;
        let client = reqwest::Client::new();
        let id = create_session(&client, &base).await;

        let failed = send(&client, &base, &id, "I play cello").await;
        assert_eq!(failed["display"][0]["type"], "error");
        assert!(failed["state"]["turns"].as_array().unwrap().is_empty());
        assert_eq!(failed["state"]["record"]["instrument"], "");

        let retried = send(&client, &base, &id, "I play cello").await;
        assert_eq!(retried["display"][0]["type"], "bot_message");
        assert_eq!(retried["state"]["record"]["instrument"], "cello");
        assert_eq!(retried["state"]["turns"].as_array().unwrap().len(), 1);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn chat_page_is_served() {
    timeout(TEST_TIMEOUT, async {
        let model = MockServer::start().await;
        let base = start_server(&model).await;

        let client = reqwest::Client::new();
        let response = client.get(format!("{base}/")).send().await.unwrap();
        assert!(response.status().is_success());
        assert!(response.url().path().starts_with("/sessions/"));

        let html = response.text().await.unwrap();
        assert!(html.contains("Orchestra Search Demo"));
        assert!(html.contains("Submit information"));
        assert!(model.received_requests().await.unwrap().is_empty());
    })
    .await
    .expect("test timed out");
}
