//! HTTP contract tests for the completion backend, knowledge lookup and
//! integrations.
//!
//! The clients are blocking, so every call runs on `spawn_blocking` while the
//! mock server keeps serving on the test runtime.

use arjun::config::{IntegrationsConfig, KnowledgeConfig, LlmConfig};
use arjun::error::ArjunError;
use arjun::history::ChatMessage;
use arjun::integrations::{HttpIntegrations, Integrations};
use arjun::knowledge::{KnowledgeSource, WikipediaSource};
use arjun::llm::{ApiCompletion, Completion};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn llm_config(uri: &str) -> LlmConfig {
    LlmConfig {
        api_url: uri.to_owned(),
        api_key: "test-key".to_owned(),
        timeout_s: 5,
        ..LlmConfig::default()
    }
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Completion backend
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn completion_sends_model_messages_and_auth() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gemma:2b",
            "stream": false,
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "Hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Hi there")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = ApiCompletion::new(&llm_config(&mock_server.uri()));
    let reply = tokio::task::spawn_blocking(move || {
        backend.complete(
            "gemma:2b",
            &[ChatMessage::system("be brief"), ChatMessage::user("Hello")],
        )
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(reply, "Hi there");
}

#[tokio::test]
async fn completion_accepts_v1_suffixed_base_and_strips_reasoning() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body("<think>plan the answer</think>\n Paris.")),
        )
        .mount(&mock_server)
        .await;

    let backend = ApiCompletion::new(&llm_config(&format!("{}/v1/", mock_server.uri())));
    let reply = tokio::task::spawn_blocking(move || {
        backend.complete("m", &[ChatMessage::user("capital of france?")])
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(reply, "Paris.");
}

#[tokio::test]
async fn completion_status_error_maps_to_llm_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&mock_server)
        .await;

    let backend = ApiCompletion::new(&llm_config(&mock_server.uri()));
    let err = tokio::task::spawn_blocking(move || backend.complete("m", &[ChatMessage::user("hi")]))
        .await
        .unwrap()
        .unwrap_err();

    assert!(matches!(err, ArjunError::Llm(ref msg) if msg.contains("500")));
}

#[tokio::test]
async fn completion_without_content_is_an_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&mock_server)
        .await;

    let backend = ApiCompletion::new(&llm_config(&mock_server.uri()));
    let err = tokio::task::spawn_blocking(move || backend.complete("m", &[ChatMessage::user("hi")]))
        .await
        .unwrap()
        .unwrap_err();

    assert!(matches!(err, ArjunError::Llm(_)));
}

#[tokio::test]
async fn completion_with_non_json_body_is_an_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&mock_server)
        .await;

    let backend = ApiCompletion::new(&llm_config(&mock_server.uri()));
    let err = tokio::task::spawn_blocking(move || backend.complete("m", &[ChatMessage::user("hi")]))
        .await
        .unwrap()
        .unwrap_err();

    assert!(matches!(err, ArjunError::Llm(ref msg) if msg.contains("invalid completion response")));
}

// ────────────────────────────────────────────────────────────────────────────
// Knowledge lookup
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn wikipedia_summary_is_trimmed_to_sentences() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rest_v1/page/summary/Ada_Lovelace"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "standard",
            "extract": "Ada Lovelace was a mathematician. She wrote the first program. She died in 1852."
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/rest_v1/page/summary/Mercury"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "disambiguation",
            "extract": "Mercury may refer to several things."
        })))
        .mount(&mock_server)
        .await;

    let source = WikipediaSource::new(&KnowledgeConfig {
        api_url: mock_server.uri(),
        ..KnowledgeConfig::default()
    });
    let (summary, ambiguous) = tokio::task::spawn_blocking(move || {
        (source.summary("Ada Lovelace", 2), source.summary("Mercury", 2))
    })
    .await
    .unwrap();

    assert_eq!(
        summary.unwrap(),
        "Ada Lovelace was a mathematician. She wrote the first program."
    );
    assert!(matches!(ambiguous, Err(ArjunError::Lookup(_))));
}

// ────────────────────────────────────────────────────────────────────────────
// Integrations
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn weather_returns_condition_line() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Pune"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Sunny +31°C ↗11km/h\n"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let integrations = HttpIntegrations::new(&IntegrationsConfig {
        weather_url: mock_server.uri(),
        ..IntegrationsConfig::default()
    });
    let line = tokio::task::spawn_blocking(move || integrations.weather("Pune"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(line, "Sunny +31°C ↗11km/h");
}

#[tokio::test]
async fn headlines_use_api_key_and_country() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/top-headlines"))
        .and(query_param("country", "in"))
        .and(header("X-Api-Key", "news-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "articles": [
                {"title": "Monsoon arrives early"},
                {"title": null},
                {"title": "Markets close higher"}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let integrations = HttpIntegrations::new(&IntegrationsConfig {
        news_api_key: "news-key".to_owned(),
        ..IntegrationsConfig::default()
    })
    .with_news_url(mock_server.uri());
    let titles = tokio::task::spawn_blocking(move || integrations.headlines())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(titles, vec!["Monsoon arrives early", "Markets close higher"]);
}

#[test]
fn headlines_without_key_fail_fast() {
    let integrations = HttpIntegrations::new(&IntegrationsConfig::default());
    assert!(matches!(
        integrations.headlines(),
        Err(ArjunError::Integration(_))
    ));
}
