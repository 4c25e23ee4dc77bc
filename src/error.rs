use std::io;

use thiserror::Error;


/// Failure to assemble a complete request frame from the stream.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The peer closed the connection without sending a single byte.
    #[error("connection closed before any data was received")]
    Empty,

    /// The stream ended after some bytes but before the frame was complete.
    #[error("connection closed in the middle of a request frame")]
    UnexpectedEof,

    #[error("request head exceeds {0} bytes")]
    HeadTooLarge(usize),

    #[error("declared body of {0} bytes is too large")]
    BodyTooLarge(u64),

    #[error("socket error: {0}")]
    Io(#[from] io::Error),
}

/// Structurally malformed request head.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid start line `{0}`")]
    BadStartLine(String),

    #[error("invalid header `{0}`")]
    BadHeader(String),
}

/// Anything that prevents a connection from producing a `Request`.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// File storage failures, one variant per storage operation.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("could not open file: {0}")]
    Open(io::Error),

    #[error("could not read file: {0}")]
    Read(io::Error),

    #[error("could not create file: {0}")]
    Create(io::Error),

    #[error("could not write file: {0}")]
    Write(io::Error),
}
