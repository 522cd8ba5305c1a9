use reqwest::{
    StatusCode,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::{ExpectedData, ExpectedError, TestApp};

/// Where queries are posted.
pub const GRAPHQL_PATH: &str = "/graphql";

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<&'a Value>,
}

#[derive(Debug, Clone)]
enum Expectation {
    Data(ExpectedData),
    Error(ExpectedError),
}

/// A query and what its response should look like.
#[derive(Debug, Clone)]
pub struct GraphQlTest {
    query: String,
    expectation: Expectation,
    headers: HeaderMap,
}

impl GraphQlTest {
    /// A query that should succeed with the expected data.
    pub fn new(query: impl Into<String>, expected_data: ExpectedData) -> Self {
        Self {
            query: query.into(),
            expectation: Expectation::Data(expected_data),
            headers: HeaderMap::new(),
        }
    }

    /// A query that should fail with the expected error.
    pub fn error(query: impl Into<String>, expected_error: ExpectedError) -> Self {
        Self {
            query: query.into(),
            expectation: Expectation::Error(expected_error),
            headers: HeaderMap::new(),
        }
    }

    /// Send an extra header with the query.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Post the query to the app and check the response.
    pub async fn run(&self, app: &TestApp) -> Result<(), GraphQlTestError> {
        self.run_with_variables(app, None).await
    }

    /// Post the query with variables to the app and check the response.
    pub async fn run_with_variables(
        &self,
        app: &TestApp,
        variables: Option<&Value>,
    ) -> Result<(), GraphQlTestError> {
        let request = QueryRequest {
            query: &self.query,
            variables,
        };

        let response = app
            .client()
            .post(app.url(GRAPHQL_PATH))
            .headers(self.headers.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("{status} {body}");

        self.check(status, &body)
    }

    /// Check a response against the expectation.
    ///
    /// Successful queries must respond `200 OK`. Errors may respond with any status.
    pub fn check(&self, status: StatusCode, body: &str) -> Result<(), GraphQlTestError> {
        let result = match &self.expectation {
            Expectation::Data(expected) => {
                if status != StatusCode::OK {
                    return Err(GraphQlTestError::Status {
                        status,
                        body: body.to_string(),
                    });
                }
                expected.check(body)
            }
            Expectation::Error(expected) => expected.check(body),
        };

        result.map_err(|expected| GraphQlTestError::Mismatch {
            expected,
            body: body.to_string(),
        })
    }
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum GraphQlTestError {
    #[error("Failed to post query: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Expected 200 OK, got {status}:\n{body}")]
    Status { status: StatusCode, body: String },

    #[error("Expected response to {expected}, got:\n{body}")]
    Mismatch { expected: String, body: String },
}
