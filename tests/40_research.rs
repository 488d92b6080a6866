mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

// The research assistant sits behind the session middleware and nothing
// else: a valid session is enough, whether or not the principal belongs to
// a tenant. These run without a database or LLM backend.

#[tokio::test]
async fn research_requires_a_session() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/companies/research/ask", server.base_url))
        .json(&json!({ "question": "who are my competitors?" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn membershipless_session_reaches_the_assistant() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::mint_session_token();

    // An empty question must fail validation (400), not authorization (403):
    // the handler logic is reachable for a principal with no tenant.
    let res = client
        .post(format!("{}/api/companies/research/ask", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "question": "" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], json!("BAD_REQUEST"));
    Ok(())
}

#[tokio::test]
async fn chat_stream_always_ends_with_the_done_sentinel() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::mint_session_token();

    // No LLM backend is configured, so the upstream open fails; the relay
    // must still answer 200 with a sentinel-terminated event stream.
    let res = client
        .post(format!("{}/api/companies/research/chat", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "question": "who are my competitors?" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[reqwest::header::CONTENT_TYPE],
        "text/event-stream"
    );

    let body = res.text().await?;
    assert!(
        body.ends_with("data: [DONE]\n\n"),
        "stream did not end with the sentinel: {:?}",
        body
    );
    Ok(())
}
