use std::str::FromStr;

use anyhow::{anyhow, Context};
use serde_json::json;
use uuid::Uuid;

use crate::CommentId;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Content must be between 1 and 500 characters, got {0}")]
    InvalidContentLength(usize),

    #[error("Comment {0:?} is a reply and cannot be replied to")]
    NestedReply(CommentId),

    #[error("Rejected by server: {0}")]
    Validation(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Not found")]
    NotFound,

    #[error("A vote on comment {0:?} is already in flight")]
    VoteInFlight(CommentId),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::InvalidContentLength(_) => StatusCode::BAD_REQUEST,
            Error::NestedReply(_) => StatusCode::BAD_REQUEST,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::VoteInFlight(_) => StatusCode::CONFLICT,
            Error::Network(_) => StatusCode::BAD_GATEWAY,
            Error::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Error::Server { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Whether the caller should be offered to retry the failed operation
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Unknown(_) | Error::Network(_) | Error::Timeout | Error::Server { .. }
        )
    }

    /// Whether this error was raised locally, before any request was sent
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Error::InvalidContentLength(_) | Error::NestedReply(_) | Error::VoteInFlight(_)
        )
    }

    /// Fallback for responses whose body is not a parseable error
    pub fn from_status(status: u16, message: String) -> Error {
        match status {
            401 => Error::Unauthenticated,
            403 => Error::PermissionDenied,
            404 => Error::NotFound,
            400..=499 => Error::Validation(message),
            _ => Error::Server { status, message },
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "message": msg,
                "type": "unknown",
            }),
            Error::InvalidContentLength(len) => json!({
                "message": "content length out of bounds",
                "type": "invalid-content-length",
                "length": len,
            }),
            Error::NestedReply(parent) => json!({
                "message": "replies cannot be replied to",
                "type": "nested-reply",
                "parent": parent.0,
            }),
            Error::Validation(msg) => json!({
                "message": msg,
                "type": "validation",
            }),
            Error::Unauthenticated => json!({
                "message": "authentication required",
                "type": "unauthenticated",
            }),
            Error::PermissionDenied => json!({
                "message": "permission denied",
                "type": "permission-denied",
            }),
            Error::NotFound => json!({
                "message": "not found",
                "type": "not-found",
            }),
            Error::VoteInFlight(comment) => json!({
                "message": "vote already in flight",
                "type": "vote-in-flight",
                "comment": comment.0,
            }),
            Error::Network(msg) => json!({
                "message": msg,
                "type": "network",
            }),
            Error::Timeout => json!({
                "message": "request timed out",
                "type": "timeout",
            }),
            Error::Server { status, message } => json!({
                "message": message,
                "type": "server",
                "status": status,
            }),
        })
        .expect("serializing error")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let message = || {
            String::from(
                data.get("message")
                    .and_then(|msg| msg.as_str())
                    .unwrap_or(""),
            )
        };
        let comment_id = |field: &str| {
            data.get(field)
                .and_then(|id| id.as_str())
                .and_then(|id| Uuid::from_str(id).ok())
                .map(CommentId)
                .ok_or_else(|| anyhow!("error has no proper comment id in field {field:?}"))
        };
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "unknown" => Error::Unknown(message()),
                "invalid-content-length" => Error::InvalidContentLength(
                    data.get("length")
                        .and_then(|l| l.as_u64())
                        .ok_or_else(|| anyhow!("content length error without a length"))?
                        as usize,
                ),
                "nested-reply" => Error::NestedReply(comment_id("parent")?),
                "validation" => Error::Validation(message()),
                "unauthenticated" => Error::Unauthenticated,
                "permission-denied" => Error::PermissionDenied,
                "not-found" => Error::NotFound,
                "vote-in-flight" => Error::VoteInFlight(comment_id("comment")?),
                "network" => Error::Network(message()),
                "timeout" => Error::Timeout,
                "server" => Error::Server {
                    status: data
                        .get("status")
                        .and_then(|s| s.as_u64())
                        .and_then(|s| u16::try_from(s).ok())
                        .ok_or_else(|| anyhow!("server error without a proper status"))?,
                    message: message(),
                },
                _ => return Err(anyhow!("error contents has unknown type")),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_survive_the_wire() {
        let id = CommentId(Uuid::new_v4());
        for err in [
            Error::Unknown(String::from("boom")),
            Error::InvalidContentLength(501),
            Error::NestedReply(id),
            Error::Validation(String::from("duplicate comment")),
            Error::Unauthenticated,
            Error::PermissionDenied,
            Error::NotFound,
            Error::VoteInFlight(id),
            Error::Timeout,
            Error::Server {
                status: 503,
                message: String::from("maintenance"),
            },
        ] {
            assert_eq!(Error::parse(&err.contents()).unwrap(), err);
        }
    }

    #[test]
    fn unparseable_bodies_fall_back_on_status() {
        assert!(Error::parse(b"<html>bad gateway</html>").is_err());
        assert_eq!(
            Error::from_status(401, String::new()),
            Error::Unauthenticated
        );
        assert_eq!(
            Error::from_status(403, String::new()),
            Error::PermissionDenied
        );
        assert_eq!(Error::from_status(404, String::new()), Error::NotFound);
        assert_eq!(
            Error::from_status(400, String::from("bad")),
            Error::Validation(String::from("bad"))
        );
        assert!(Error::from_status(502, String::new()).is_retryable());
    }

    #[test]
    fn only_transport_failures_are_retryable() {
        assert!(Error::Network(String::from("reset")).is_retryable());
        assert!(Error::Timeout.is_retryable());
        assert!(!Error::PermissionDenied.is_retryable());
        assert!(!Error::InvalidContentLength(0).is_retryable());
        assert!(Error::InvalidContentLength(0).is_local());
        assert!(!Error::Unauthenticated.is_local());
    }
}
