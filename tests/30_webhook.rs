mod common;

use anyhow::Result;
use reqwest::StatusCode;

// The billing webhook authenticates by signature alone. Everything here must
// be rejected before the payload reaches any tenant mutation, so these tests
// run without a database.

#[tokio::test]
async fn webhook_without_signature_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/marketing/billing/webhook", server.base_url))
        .body(r#"{"type":"checkout.session.completed"}"#)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], serde_json::json!("BAD_REQUEST"));
    Ok(())
}

#[tokio::test]
async fn webhook_with_garbage_signature_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/marketing/billing/webhook", server.base_url))
        .header("stripe-signature", "not-a-signature")
        .body(r#"{"type":"checkout.session.completed"}"#)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn webhook_with_wrong_secret_signature_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // Well-formed header, signed with a different secret than the server's
    let res = client
        .post(format!("{}/api/marketing/billing/webhook", server.base_url))
        .header(
            "stripe-signature",
            "t=1700000000,v1=deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef",
        )
        .body(r#"{"type":"invoice.payment_failed"}"#)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
