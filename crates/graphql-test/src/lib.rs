//! # graphql-test
//! Post GraphQL queries to a running application and check the raw responses.
//!
//! Each test creates its own [`TestApp`], which stops its server when dropped.
//!

mod app;
mod expectation;
mod query;

pub use app::{TestApp, TestAppError};
pub use expectation::{ExpectedData, ExpectedError, condense_json};
pub use query::{GRAPHQL_PATH, GraphQlTest, GraphQlTestError};
