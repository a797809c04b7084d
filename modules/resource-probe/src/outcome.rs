//! Normalized probe outcomes.

use policy_model_sdk::Decision;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

const DENIAL_MARKERS: [&str; 2] = ["access denied", "forbidden"];

/// What a probe observed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// 2xx with the decoded body (`Null` when empty, a string when not JSON).
    Success { body: Value },
    Forbidden { status: u16 },
    NotFound,
    /// Any other 4xx: the operation did not happen.
    Rejected { status: u16 },
    /// No usable answer: connection failure, timeout or 5xx.
    TransportError { message: String },
}

impl Outcome {
    #[must_use]
    pub fn success(body: Value) -> Self {
        Self::Success { body }
    }

    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportError {
            message: message.into(),
        }
    }

    /// Access decision this outcome demonstrates; `None` when inconclusive.
    #[must_use]
    pub fn decision(&self) -> Option<Decision> {
        match self {
            Self::Success { .. } => Some(Decision::Allowed),
            Self::Forbidden { .. } | Self::NotFound | Self::Rejected { .. } => {
                Some(Decision::Denied)
            }
            Self::TransportError { .. } => None,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Success { body } => Some(body),
            _ => None,
        }
    }

    /// Identifier of the resource in a success body.
    #[must_use]
    pub fn resource_id(&self) -> Option<String> {
        self.body().and_then(resource_id)
    }

    /// Short, single-line description for reports.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Success { .. } => "success".to_owned(),
            Self::Forbidden { status } => format!("forbidden (HTTP {status})"),
            Self::NotFound => "not found".to_owned(),
            Self::Rejected { status } => format!("rejected (HTTP {status})"),
            Self::TransportError { message } => format!("transport error: {message}"),
        }
    }
}

/// Map a response status and body onto an [`Outcome`].
#[must_use]
pub fn classify(status: StatusCode, body: &[u8]) -> Outcome {
    if status.is_success() {
        let value = decode(body);
        if error_field_denies(&value) {
            return Outcome::Forbidden {
                status: status.as_u16(),
            };
        }
        return Outcome::success(value);
    }

    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || carries_denial_marker(body)
    {
        return Outcome::Forbidden {
            status: status.as_u16(),
        };
    }
    if status == StatusCode::NOT_FOUND {
        return Outcome::NotFound;
    }
    if status.is_client_error() {
        return Outcome::Rejected {
            status: status.as_u16(),
        };
    }

    let snippet: String = String::from_utf8_lossy(body).chars().take(200).collect();
    Outcome::transport(format!("HTTP {}: {}", status.as_u16(), snippet.trim()))
}

fn decode(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

fn carries_denial_marker(body: &[u8]) -> bool {
    let text = String::from_utf8_lossy(body).to_lowercase();
    DENIAL_MARKERS.iter().any(|m| text.contains(m))
}

fn error_field_denies(value: &Value) -> bool {
    value
        .get("error")
        .filter(|e| !e.is_null())
        .is_some_and(|e| carries_denial_marker(e.to_string().as_bytes()))
}

/// Identifier fields used across LlamaStack resources.
const ID_FIELDS: [&str; 5] = ["id", "identifier", "dataset_id", "toolgroup_id", "name"];

/// First identifier-like field of `item`.
#[must_use]
pub fn resource_id(item: &Value) -> Option<String> {
    ID_FIELDS
        .iter()
        .find_map(|f| item.get(*f).and_then(Value::as_str))
        .map(str::to_owned)
}

/// Entries of a list response (`{"data": [...]}` or a bare array).
#[must_use]
pub fn list_items(body: &Value) -> &[Value] {
    body.get("data")
        .unwrap_or(body)
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Entry of a list response whose id or name equals `key`. Searches the
/// given page only.
#[must_use]
pub fn find_item<'a>(body: &'a Value, key: &str) -> Option<&'a Value> {
    list_items(body).iter().find(|item| {
        ID_FIELDS
            .iter()
            .any(|f| item.get(*f).and_then(Value::as_str) == Some(key))
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn status_mapping() {
        assert!(classify(StatusCode::OK, br#"{"data": []}"#).is_success());
        assert_eq!(
            classify(StatusCode::UNAUTHORIZED, b""),
            Outcome::Forbidden { status: 401 }
        );
        assert_eq!(
            classify(StatusCode::FORBIDDEN, b"{}"),
            Outcome::Forbidden { status: 403 }
        );
        assert_eq!(classify(StatusCode::NOT_FOUND, b""), Outcome::NotFound);
        assert_eq!(
            classify(StatusCode::UNPROCESSABLE_ENTITY, b"{}"),
            Outcome::Rejected { status: 422 }
        );
        assert!(matches!(
            classify(StatusCode::BAD_GATEWAY, b"upstream"),
            Outcome::TransportError { .. }
        ));
    }

    #[test]
    fn denial_marker_in_error_body_is_forbidden() {
        let body = br#"{"detail": "Access denied: user lacks role"}"#;
        assert_eq!(
            classify(StatusCode::BAD_REQUEST, body),
            Outcome::Forbidden { status: 400 }
        );
        assert_eq!(
            classify(StatusCode::INTERNAL_SERVER_ERROR, b"Forbidden by policy"),
            Outcome::Forbidden { status: 500 }
        );
    }

    #[test]
    fn success_with_denial_error_field_is_forbidden() {
        let body = br#"{"error": {"message": "Access denied to tool"}, "output": []}"#;
        assert_eq!(
            classify(StatusCode::OK, body),
            Outcome::Forbidden { status: 200 }
        );
        let ok = br#"{"error": null, "output": []}"#;
        assert!(classify(StatusCode::OK, ok).is_success());
    }

    #[test]
    fn decisions() {
        assert_eq!(Outcome::success(Value::Null).decision(), Some(Decision::Allowed));
        assert_eq!(Outcome::NotFound.decision(), Some(Decision::Denied));
        assert_eq!(Outcome::Rejected { status: 400 }.decision(), Some(Decision::Denied));
        assert_eq!(Outcome::transport("timeout").decision(), None);
    }

    #[test]
    fn non_json_and_empty_bodies() {
        assert_eq!(
            classify(StatusCode::NO_CONTENT, b"").body(),
            Some(&Value::Null)
        );
        assert_eq!(
            classify(StatusCode::OK, b"plain").body(),
            Some(&Value::String("plain".to_owned()))
        );
    }

    #[test]
    fn list_search_matches_id_or_name() {
        let body = json!({"data": [
            {"id": "vs_1", "name": "scratch"},
            {"id": "vs_2", "name": "vs_mlteam_team"}
        ]});
        assert_eq!(find_item(&body, "vs_mlteam_team").unwrap()["id"], "vs_2");
        assert_eq!(find_item(&body, "vs_1").unwrap()["name"], "scratch");
        assert!(find_item(&body, "missing").is_none());

        let bare = json!([{"identifier": "openai/gpt-4o"}]);
        assert!(find_item(&bare, "openai/gpt-4o").is_some());
        assert!(list_items(&json!({"other": 1})).is_empty());
    }

    #[test]
    fn list_search_stays_on_the_given_page() {
        let page = json!({
            "data": [{"id": "vs_1", "name": "scratch"}],
            "has_more": true,
            "last_id": "vs_1"
        });
        assert!(find_item(&page, "scratch").is_some());
        assert!(find_item(&page, "vs_mlteam_team").is_none());
    }

    #[test]
    fn resource_id_prefers_id() {
        let outcome = Outcome::success(json!({"id": "file-1", "name": "x"}));
        assert_eq!(outcome.resource_id().as_deref(), Some("file-1"));
        assert_eq!(Outcome::NotFound.resource_id(), None);
    }
}
