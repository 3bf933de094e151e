//! Full session-to-metadata chain against a mock identity provider.
//!
//! Exercises the sequence the direct provisioning path performs: resolve
//! the session, read the user, then patch the metadata bag with the
//! internal id. One mock server plays the provider for the whole chain.

use secrecy::SecretString;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hemolink_core::ExternalUserId;
use hemolink_server::config::IdentityConfig;
use hemolink_server::identity::{IdentityClient, IdentityError};

const SECRET_KEY: &str = "sk_test_wG5kQ9pXvR2mJ8tZ1cB4nH7d";

fn config(base_url: &str) -> IdentityConfig {
    IdentityConfig {
        api_url: base_url.to_owned(),
        secret_key: SecretString::from(SECRET_KEY),
        webhook_secret: SecretString::from("whsec_aW50ZWdyYXRpb24tdGVzdC1rZXk="),
    }
}

#[tokio::test]
async fn test_session_to_metadata_chain() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/sessions/verify"))
        .and(header("authorization", format!("Bearer {SECRET_KEY}")))
        .and(body_json(serde_json::json!({ "token": "sess_live" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "user_id": "user_77" })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/users/user_77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "user_77",
            "email_addresses": [{ "email_address": "dana@example.com" }],
            "first_name": "Dana",
            "last_name": "Okafor",
            "public_metadata": {}
        })))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/v1/users/user_77/metadata"))
        .and(body_json(serde_json::json!({
            "public_metadata": { "db_id": 7, "role": "donor" }
        })))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = IdentityClient::new(&config(&server.uri())).expect("client builds");

    let external_id = client.resolve_session("sess_live").await.expect("resolves");
    assert_eq!(external_id, ExternalUserId::from("user_77"));

    let user = client.get_user(&external_id).await.expect("user exists");
    assert_eq!(
        user.primary_email().expect("has email").as_str(),
        "dana@example.com"
    );
    assert!(user.public_metadata.is_empty());

    client
        .update_public_metadata(
            &external_id,
            serde_json::json!({ "db_id": 7, "role": "donor" }),
        )
        .await
        .expect("patch succeeds");
}

#[tokio::test]
async fn test_expired_session_is_unauthenticated() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/sessions/verify"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = IdentityClient::new(&config(&server.uri())).expect("client builds");
    let result = client.resolve_session("sess_expired").await;
    assert!(matches!(result, Err(IdentityError::Unauthenticated)));
}

#[tokio::test]
async fn test_deleted_user_surfaces_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/sessions/verify"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "user_id": "user_gone" })),
        )
        .mount(&server)
        .await;

    // Session still resolves but the user was deleted in between.
    Mock::given(method("GET"))
        .and(path("/v1/users/user_gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = IdentityClient::new(&config(&server.uri())).expect("client builds");
    let external_id = client.resolve_session("sess_live").await.expect("resolves");

    let result = client.get_user(&external_id).await;
    assert!(matches!(result, Err(IdentityError::UserNotFound(_))));
}

#[tokio::test]
async fn test_provider_5xx_surfaces_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/users/user_77"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = IdentityClient::new(&config(&server.uri())).expect("client builds");
    let result = client.get_user(&ExternalUserId::from("user_77")).await;

    match result {
        Err(IdentityError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}
