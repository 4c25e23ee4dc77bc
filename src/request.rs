use std::fmt;

use crate::error::ParseError;
use crate::frame::Frame;


const NEWLINE: &str = "\r\n";
const HEADER_SEPARATOR: &str = ": ";
pub const CONTENT_LENGTH: &str = "Content-Length";


/// Insertion-ordered header list. Names are case-sensitive; inserting an
/// existing name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Headers(Vec::new())
    }

    pub fn insert<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    /// Last entry whose name matches ignoring ASCII case.
    pub fn get_ignore_case(&self, name: &str) -> Option<&str> {
        self.0.iter().rev().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Declared body length, 0 if absent or unparsable.
    pub fn content_length(&self) -> usize {
        self.get_ignore_case(CONTENT_LENGTH)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0)
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            write!(f, "{}: {}{}", name, value, NEWLINE)?;
        }
        Ok(())
    }
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    path: String,
    version: String,
    headers: Headers,
    body: Vec<u8>,
}

impl Request {
    /// Parses a request head (start-line and header lines, no trailing blank
    /// line) and attaches at most `Content-Length` bytes of `body`.
    pub fn parse(head: &[u8], body: &[u8]) -> Result<Request, ParseError> {
        let text = String::from_utf8_lossy(head);
        let mut lines = text.split(NEWLINE);

        let start_line = lines.next().unwrap_or_default();
        let tokens: Vec<&str> = start_line.split(' ').collect();
        let (method, path, version) = match tokens[..] {
            [m, p, v] if !m.is_empty() && !p.is_empty() && !v.is_empty() => (m, p, v),
            _ => return Err(ParseError::BadStartLine(start_line.to_string())),
        };

        let mut headers = Headers::new();
        for line in lines.filter(|l| !l.is_empty()) {
            match split_header(line) {
                Some((name, value)) => headers.insert(name, value),
                None => return Err(ParseError::BadHeader(line.to_string())),
            }
        }

        let declared = headers.content_length().min(body.len());

        Ok(Request {
            method: method.to_string(),
            path: path.to_string(),
            version: version.to_string(),
            body: body[..declared].to_vec(),
            headers,
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}


/// `Name: Value` split; `None` unless the separator occurs exactly once.
fn split_header(line: &str) -> Option<(&str, &str)> {
    let parts: Vec<&str> = line.split(HEADER_SEPARATOR).collect();
    match parts[..] {
        [name, value] => Some((name, value)),
        _ => None,
    }
}

/// Body length a raw head declares, read with the same header rules as
/// `Request::parse`. Malformed lines are skipped here, the parser rejects them.
pub fn declared_length(head: &[u8]) -> Option<u64> {
    let text = String::from_utf8_lossy(head);
    let headers: Headers = text.split(NEWLINE).skip(1).filter_map(split_header).collect();
    headers.get_ignore_case(CONTENT_LENGTH).and_then(|v| v.trim().parse::<u64>().ok())
}


pub fn parse_request(frame: &Frame) -> Result<Request, ParseError> {
    Request::parse(frame.head(), frame.body())
}
