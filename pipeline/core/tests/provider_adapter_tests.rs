// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP-level adapter tests against a local mock server: request shape per
//! provider dialect, envelope unwrapping and status classification.

use mockito::Matcher;
use serde_json::json;
use std::io::Write;
use std::time::Duration;

use atlas_core::application::retry::RetryCoordinator;
use atlas_core::application::validator;
use atlas_core::domain::config::ProviderSettings;
use atlas_core::domain::provider::{
    EnforcementTier, Payload, ProviderError, ProviderKind, RetryPolicy,
};
use atlas_core::domain::records::{EntityKind, ModelIdentity};
use atlas_core::infrastructure::llm::create_adapter;

fn settings(kind: ProviderKind, endpoint: &str) -> ProviderSettings {
    ProviderSettings::with_defaults(kind, "test-key").endpoint(endpoint)
}

fn chat_completion(content: &str) -> String {
    json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

#[tokio::test]
async fn test_mistral_reply_is_unwrapped_as_json_only_text() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "mistral-large-latest",
            "response_format": {"type": "json_object"}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_completion(
            "```json\n{\"description\": \"Asia\", \"num_country\": 48,}\n```",
        ))
        .create_async()
        .await;

    let adapter = create_adapter(settings(ProviderKind::Mistral, &server.url())).unwrap();
    let raw = adapter.fetch_entity(EntityKind::Continent, "Asia").await.unwrap();

    mock.assert_async().await;
    assert_eq!(raw.tier, EnforcementTier::JsonOnly);
    let record = validator::validate_continent(&raw, "Asia").unwrap();
    assert_eq!(record.country_count, 48);
}

#[tokio::test]
async fn test_openai_sends_json_schema_response_format() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o",
            "response_format": {
                "type": "json_schema",
                "json_schema": {"name": "cities_info", "strict": true}
            }
        })))
        .with_status(200)
        .with_body(chat_completion("{\"cities\": []}"))
        .create_async()
        .await;

    let adapter = create_adapter(settings(ProviderKind::OpenAi, &server.url())).unwrap();
    let raw = adapter.fetch_entity(EntityKind::Cities, "Chad").await.unwrap();

    mock.assert_async().await;
    assert_eq!(raw.tier, EnforcementTier::Enforced);
    assert!(validator::validate_cities(&raw, "Chad").unwrap().is_empty());
}

#[tokio::test]
async fn test_deepseek_uses_single_user_message() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({"model": "deepseek-chat"})),
            Matcher::Regex(r#""messages":\[\{"role":"user""#.to_string()),
        ]))
        .with_status(200)
        .with_body(chat_completion("{\"description\": \"d\"}"))
        .create_async()
        .await;

    let adapter = create_adapter(settings(ProviderKind::DeepSeek, &server.url())).unwrap();
    adapter.fetch_entity(EntityKind::Country, "Chad").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_anthropic_tool_call_is_typed() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "test-key")
        .match_header("anthropic-version", "2023-06-01")
        .match_body(Matcher::PartialJson(json!({
            "tool_choice": {"type": "tool", "name": "record_continent_info"}
        })))
        .with_status(200)
        .with_body(
            json!({
                "id": "msg_1",
                "type": "message",
                "content": [{
                    "type": "tool_use",
                    "id": "toolu_1",
                    "name": "record_continent_info",
                    "input": {
                        "description": "Europe",
                        "area_sq_mile": 3930000,
                        "area_sq_km": 10180000,
                        "population": 745000000,
                        "num_country": 44
                    }
                }],
                "stop_reason": "tool_use"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let adapter = create_adapter(settings(ProviderKind::Anthropic, &server.url())).unwrap();
    let raw = adapter.fetch_entity(EntityKind::Continent, "Europe").await.unwrap();

    mock.assert_async().await;
    assert_eq!(raw.tier, EnforcementTier::Strict);
    assert!(matches!(raw.payload, Payload::Typed(_)));
    assert_eq!(validator::validate_continent(&raw, "Europe").unwrap().country_count, 44);
}

#[tokio::test]
async fn test_anthropic_without_tool_call_is_malformed() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_body(json!({"content": [{"type": "text", "text": "I cannot."}]}).to_string())
        .create_async()
        .await;

    let adapter = create_adapter(settings(ProviderKind::Anthropic, &server.url())).unwrap();
    let err = adapter.fetch_entity(EntityKind::Country, "Chad").await.unwrap_err();
    assert!(matches!(err, ProviderError::MalformedResponse(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_google_generate_content() {
    let cities = json!({
        "cities": [{
            "name": "N'Djamena",
            "is_capital": true,
            "description": "Capital",
            "interesting_fact": "On the Chari",
            "area_sq_mile": 40,
            "area_sq_km": 104,
            "population": 1500000,
            "airport_code": "NDJ"
        }]
    });
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
        .match_header("x-goog-api-key", "test-key")
        .match_body(Matcher::PartialJson(json!({
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .with_status(200)
        .with_body(
            json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": cities.to_string()}]}
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let adapter = create_adapter(settings(ProviderKind::Google, &server.url())).unwrap();
    let raw = adapter.fetch_entity(EntityKind::Cities, "Chad").await.unwrap();

    mock.assert_async().await;
    let cities = validator::validate_cities(&raw, "Chad").unwrap();
    assert_eq!(cities[0].name, "N'Djamena");
    assert_eq!(cities[0].airport_code.as_deref(), Some("NDJ"));
}

#[tokio::test]
async fn test_cohere_v2_chat() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v2/chat")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "command-r-plus-08-2024",
            "response_format": {"type": "json_object"}
        })))
        .with_status(200)
        .with_body(
            json!({
                "id": "c1",
                "finish_reason": "COMPLETE",
                "message": {
                    "role": "assistant",
                    "content": [{"type": "text", "text": "{\"description\": \"Oceania\"}"}]
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let adapter = create_adapter(settings(ProviderKind::Cohere, &server.url())).unwrap();
    let raw = adapter.fetch_entity(EntityKind::Continent, "Oceania").await.unwrap();

    mock.assert_async().await;
    assert_eq!(raw.payload, Payload::Text("{\"description\": \"Oceania\"}".into()));
    assert_eq!(
        adapter.fetch_identity(),
        ModelIdentity::new("Cohere", "command-r-plus-08-2024")
    );
}

#[tokio::test]
async fn test_http_status_classification() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("Unauthorized".into()))
        .with_status(401)
        .create_async()
        .await;
    server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("Throttled".into()))
        .with_status(429)
        .with_header("retry-after", "7")
        .create_async()
        .await;
    server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("Broken".into()))
        .with_status(503)
        .with_body("upstream unavailable")
        .create_async()
        .await;

    let adapter = create_adapter(settings(ProviderKind::Groq, &server.url())).unwrap();

    let err = adapter.fetch_entity(EntityKind::Country, "Unauthorized").await.unwrap_err();
    assert!(matches!(err, ProviderError::Authentication(_)));

    let err = adapter.fetch_entity(EntityKind::Country, "Throttled").await.unwrap_err();
    assert_eq!(err, ProviderError::RateLimited { retry_after: Some(Duration::from_secs(7)) });

    let err = adapter.fetch_entity(EntityKind::Country, "Broken").await.unwrap_err();
    assert_eq!(err, ProviderError::Server { status: 503, body: "upstream unavailable".into() });
}

#[tokio::test]
async fn test_server_errors_are_retried_to_budget() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .expect(3)
        .create_async()
        .await;

    let mut settings = settings(ProviderKind::Ai21, &server.url());
    settings.retry = RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(5),
        rate_limit_delay: None,
    };
    let adapter = create_adapter(settings).unwrap();
    let err = RetryCoordinator::for_adapter(adapter.as_ref())
        .fetch(adapter.as_ref(), EntityKind::Continent, "Asia")
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, ProviderError::Exhausted { attempts: 3, .. }));
}

fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(5),
        rate_limit_delay: None,
    }
}

#[tokio::test]
async fn test_slow_reply_times_out_and_spends_an_attempt() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_secs(1));
            w.write_all(b"{}")
        })
        .expect(3)
        .create_async()
        .await;

    let mut settings = settings(ProviderKind::Groq, &server.url());
    settings.timeout = Duration::from_millis(200);
    settings.retry = fast_retry(2);
    let adapter = create_adapter(settings).unwrap();

    let err = adapter.fetch_entity(EntityKind::Country, "Chad").await.unwrap_err();
    assert!(matches!(err, ProviderError::Timeout(_)), "got {err:?}");
    assert!(err.is_retryable());

    let err = RetryCoordinator::for_adapter(adapter.as_ref())
        .fetch(adapter.as_ref(), EntityKind::Country, "Chad")
        .await
        .unwrap_err();
    match err {
        ProviderError::Exhausted { attempts, last } => {
            assert_eq!(attempts, 2);
            assert!(matches!(*last, ProviderError::Timeout(_)));
        }
        other => panic!("expected exhausted retries, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_deepseek_profile_gets_five_attempts() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::PartialJson(json!({"model": "deepseek-chat"})))
        .with_status(200)
        .with_body(chat_completion("   "))
        .expect(5)
        .create_async()
        .await;

    let mut settings = settings(ProviderKind::DeepSeek, &server.url());
    settings.retry.base_delay = Duration::from_millis(5);
    settings.retry.rate_limit_delay = None;
    let adapter = create_adapter(settings).unwrap();
    assert_eq!(adapter.retry_policy().max_attempts, 5);

    let err = RetryCoordinator::for_adapter(adapter.as_ref())
        .fetch(adapter.as_ref(), EntityKind::Country, "Chad")
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, ProviderError::Exhausted { attempts: 5, .. }), "got {err:?}");
}

#[tokio::test]
async fn test_enforced_replies_missing_required_fields_are_rejected() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
        .with_status(200)
        .with_body(
            json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{"text": "{\"description\": \"Oceania\"}"}]
                    }
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("POST", "/v2/chat")
        .with_status(200)
        .with_body(
            json!({
                "message": {
                    "role": "assistant",
                    "content": [{"type": "text", "text": "{\"description\": \"Oceania\"}"}]
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    for kind in [ProviderKind::Google, ProviderKind::Cohere] {
        let adapter = create_adapter(settings(kind, &server.url())).unwrap();
        let raw = adapter.fetch_entity(EntityKind::Continent, "Oceania").await.unwrap();
        assert_eq!(raw.tier, EnforcementTier::Enforced);

        let err = validator::validate_continent(&raw, "Oceania").unwrap_err();
        assert!(err.fields.contains(&"population".to_string()), "{kind}: {:?}", err.fields);
        assert!(err.fields.contains(&"num_country".to_string()), "{kind}: {:?}", err.fields);
    }
}
