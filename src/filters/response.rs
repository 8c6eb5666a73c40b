//! Deferred response modifications.

use axum::http::response::Parts;
use axum::http::{HeaderName, HeaderValue, StatusCode};

/// Response-side effects collected while filters run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResponsePatch {
    status: Option<StatusCode>,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl ResponsePatch {
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.push((name, value));
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.headers.is_empty()
    }

    /// Apply onto response parts. Later patches override earlier ones.
    pub fn apply(&self, parts: &mut Parts) {
        if let Some(status) = self.status {
            parts.status = status;
        }
        for (name, value) in &self.headers {
            parts.headers.insert(name.clone(), value.clone());
        }
    }
}
