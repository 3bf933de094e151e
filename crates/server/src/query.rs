//! Read-only query service client.
//!
//! Dashboards read User Records through a GraphQL layer over the store
//! rather than through this API; the one server-side consumer is the
//! `/api/me/record` read-back route. The single `users_by_pk` query is
//! issued over plain reqwest - codegen would buy nothing here.
//!
//! Authorization: the query service trusts a claim embedded in a
//! provider-issued token, which the caller forwards as a bearer credential.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use hemolink_core::UserId;

/// Per-call timeout for query service requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const USER_BY_PK_QUERY: &str = r"
query UserById($id: Int!) {
  users_by_pk(id: $id) {
    id
    email
    name
    role
    blood_group
    last_donation_date
  }
}
";

/// Errors that can occur when talking to the query service.
#[derive(Debug, Error)]
pub enum QueryError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The query service returned GraphQL errors.
    #[error("GraphQL errors: {0}")]
    GraphQL(String),

    /// Failed to parse the response.
    #[error("parse error: {0}")]
    Parse(String),
}

/// A User Record as the query service projects it.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct QueriedUser {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: String,
    pub blood_group: Option<String>,
    pub last_donation_date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse {
    data: Option<QueryData>,
    errors: Option<Vec<GraphQLMessage>>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    users_by_pk: Option<QueriedUser>,
}

#[derive(Debug, Deserialize)]
struct GraphQLMessage {
    message: String,
}

/// Read-only GraphQL client for the query service.
#[derive(Clone)]
pub struct QueryClient {
    client: reqwest::Client,
    endpoint: String,
}

impl QueryClient {
    /// Create a client for the given GraphQL endpoint.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Http` if the HTTP client fails to build.
    pub fn new(endpoint: &str) -> Result<Self, QueryError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_owned(),
        })
    }

    /// Fetch a User Record by internal id, on behalf of the given token.
    ///
    /// Returns `None` when the id does not exist (or the claim does not
    /// allow reading it - the service hides rows it will not serve).
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Http` on transport failure and
    /// `QueryError::GraphQL` if the service rejects the query.
    pub async fn user_by_id(
        &self,
        id: UserId,
        claim_token: &str,
    ) -> Result<Option<QueriedUser>, QueryError> {
        let body = serde_json::json!({
            "query": USER_BY_PK_QUERY,
            "variables": { "id": id.as_i32() },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(claim_token)
            .json(&body)
            .send()
            .await?;

        let parsed: GraphQLResponse = response
            .json()
            .await
            .map_err(|e| QueryError::Parse(e.to_string()))?;

        if let Some(errors) = parsed.errors
            && !errors.is_empty()
        {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(QueryError::GraphQL(messages.join("; ")));
        }

        Ok(parsed.data.and_then(|d| d.users_by_pk))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_user_by_id_found() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/graphql"))
            .and(bearer_token("claim-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "users_by_pk": {
                        "id": 42,
                        "email": "ann@x.com",
                        "name": "Ann Lee",
                        "role": "donor",
                        "blood_group": "O-",
                        "last_donation_date": "2026-01-01"
                    }
                }
            })))
            .mount(&server)
            .await;

        let client = QueryClient::new(&format!("{}/v1/graphql", server.uri())).unwrap();
        let user = client
            .user_by_id(UserId::new(42), "claim-token")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(user.email, "ann@x.com");
        assert_eq!(user.blood_group.as_deref(), Some("O-"));
    }

    #[tokio::test]
    async fn test_user_by_id_missing_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "users_by_pk": null }
            })))
            .mount(&server)
            .await;

        let client = QueryClient::new(&server.uri()).unwrap();
        let user = client.user_by_id(UserId::new(7), "claim-token").await.unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_graphql_errors_surface() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "errors": [{ "message": "field 'users_by_pk' not found" }]
            })))
            .mount(&server)
            .await;

        let client = QueryClient::new(&server.uri()).unwrap();
        let result = client.user_by_id(UserId::new(7), "claim-token").await;
        assert!(matches!(result, Err(QueryError::GraphQL(_))));
    }
}
