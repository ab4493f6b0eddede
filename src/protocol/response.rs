//! Responses
//!
//! What a request turns into before it is rendered as a reply line.

/// Outcome of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NotFound,
    Error,
}

/// One reply line, before rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,

    /// GET value for `Ok`, message for `Error`
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// `OK`, or the value itself when there is one
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            payload: None,
        }
    }

    /// `ERR <message>`
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: Some(message.as_bytes().to_vec()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Error message, for ERROR responses
    pub fn error_message(&self) -> Option<String> {
        match (self.status, &self.payload) {
            (Status::Error, Some(message)) => Some(String::from_utf8_lossy(message).into_owned()),
            _ => None,
        }
    }
}
