use std::io::{self, Write};

use crate::request::{Headers, CONTENT_LENGTH};


pub const HTTP_VERSION: &str = "HTTP/1.1";

pub const HTTP_200: u16 = 200;
pub const HTTP_201: u16 = 201;
pub const HTTP_400: u16 = 400;
pub const HTTP_404: u16 = 404;
pub const HTTP_405: u16 = 405;
pub const HTTP_500: u16 = 500;

/// Reason phrases for every status this server emits.
pub const STATUS_REASONS: &[(u16, &str)] = &[
    (HTTP_200, "OK"),
    (HTTP_201, "No Content"),
    (HTTP_400, "Bad Request"),
    (HTTP_404, "Not Found"),
    (HTTP_405, "Method Not Allowed"),
    (HTTP_500, "Internal Server Error"),
];

/// Empty for codes missing from `STATUS_REASONS`.
pub fn reason_phrase(status: u16) -> &'static str {
    STATUS_REASONS.iter()
        .find(|(code, _)| *code == status)
        .map(|(_, reason)| *reason)
        .unwrap_or("")
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    headers: Headers,
    body: Vec<u8>,
}

impl Response {
    /// Response carrying `content`; `Content-Length` is derived from it
    /// whenever it is non-empty.
    pub fn new<B: Into<Vec<u8>>>(status: u16, content: B, mut headers: Headers) -> Response {
        let body = content.into();
        if !body.is_empty() {
            headers.insert(CONTENT_LENGTH, body.len().to_string());
        }
        Response { status, headers, body }
    }

    /// Bare status line, no headers and no body.
    pub fn empty(status: u16) -> Response {
        Response { status, headers: Headers::new(), body: Vec::new() }
    }

    pub fn with_header<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Response {
        self.headers.insert(name, value);
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let head = format!(
            "{} {} {}\r\n{}\r\n",
            HTTP_VERSION, self.status, reason_phrase(self.status), self.headers
        );
        let mut bytes = Vec::with_capacity(head.len() + self.body.len());
        bytes.extend_from_slice(head.as_bytes());
        bytes.extend_from_slice(&self.body);
        bytes
    }

    /// Serializes into `writer`, returning the number of bytes written.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<usize> {
        let bytes = self.to_bytes();
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(bytes.len())
    }
}
