use reqwest::StatusCode;
use serde_json::Value;
use uuid::Uuid;

/// What a successful response body must look like.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedData {
    /// The body is exactly this.
    Exact(String),

    /// The body contains this.
    Contains(String),

    /// The body contains every one of these.
    ContainsAll(Vec<String>),

    /// The body contains every one of these ids, hyphenated lowercase.
    ///
    /// Matching is case sensitive, so a body that writes ids in uppercase
    /// (`6F1A2B3C-...`) does not match. Use [`ExpectedData::Contains`] with the uppercase string
    /// for those.
    ContainsUuids(Vec<Uuid>),

    /// The body is `{"data":<json>}`. The json may be pretty printed.
    ExactJson(String),

    /// The body contains the json. The json may be pretty printed.
    ContainsJson(String),

    /// The body contains each key with its value, e.g. `"name":"Jared"` or `"age":42`.
    ContainsKvps(Vec<(String, Value)>),
}

impl ExpectedData {
    /// Check a body, returning what was expected of it if it does not match.
    pub fn check(&self, body: &str) -> Result<(), String> {
        match self {
            Self::Exact(exact) => equal(body, exact),
            Self::Contains(needle) => contain(body, needle),
            Self::ContainsAll(needles) => needles.iter().try_for_each(|needle| contain(body, needle)),
            Self::ContainsUuids(uuids) => uuids
                .iter()
                .try_for_each(|uuid| contain(body, &uuid.to_string())),
            Self::ExactJson(json) => equal(body, &format!(r#"{{"data":{}}}"#, condense_json(json))),
            Self::ContainsJson(json) => contain(body, &condense_json(json)),
            Self::ContainsKvps(pairs) => pairs
                .iter()
                .try_for_each(|(key, value)| contain(body, &key_value(key, value))),
        }
    }
}

/// What an error response body must look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedError {
    /// The body contains `<code>: <reason>`, e.g. `401: Unauthorized`.
    Status(StatusCode),

    /// The body contains this.
    Match(String),
}

impl ExpectedError {
    /// Check a body, returning what was expected of it if it does not match.
    pub fn check(&self, body: &str) -> Result<(), String> {
        match self {
            Self::Status(status) => {
                let reason = status.canonical_reason().unwrap_or_default();
                contain(body, &format!("{}: {reason}", status.as_u16()))
            }
            Self::Match(needle) => contain(body, needle),
        }
    }
}

/// Squash pretty printed json onto one line the way servers write it.
///
/// Each line is trimmed and the lines joined, then `": ` becomes `":`.
pub fn condense_json(json: &str) -> String {
    json.lines()
        .map(str::trim)
        .collect::<String>()
        .replace("\": ", "\":")
}

fn key_value(key: &str, value: &Value) -> String {
    match value {
        Value::String(string) => format!(r#""{key}":"{string}""#),
        other => format!(r#""{key}":{other}"#),
    }
}

fn equal(body: &str, expected: &str) -> Result<(), String> {
    if body == expected {
        Ok(())
    } else {
        Err(format!("equal `{expected}`"))
    }
}

fn contain(body: &str, needle: &str) -> Result<(), String> {
    if body.contains(needle) {
        Ok(())
    } else {
        Err(format!("contain `{needle}`"))
    }
}
