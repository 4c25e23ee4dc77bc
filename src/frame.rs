use std::io::{ErrorKind, Read};

use crate::error::ReadError;
use crate::request::declared_length;
use crate::utils::find_subsequence;


pub const READ_CHUNK_SIZE: usize = 1024;
pub const MAX_HEAD_SIZE: usize = 64 * 1024;
pub const MAX_BODY_SIZE: usize = 16 * 1024 * 1024;

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";


/// Growable byte buffer fed from a reader one chunk at a time.
#[derive(Debug)]
pub struct FrameBuffer {
    buf: Vec<u8>,
    chunk_size: usize,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::with_chunk_size(READ_CHUNK_SIZE)
    }

    pub fn with_chunk_size(chunk_size: usize) -> Self {
        FrameBuffer { buf: Vec::with_capacity(chunk_size), chunk_size: chunk_size.max(1) }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Reads a single chunk and appends it. Returns the number of bytes read,
    /// zero meaning the peer closed its side.
    pub fn fill<R: Read + ?Sized>(&mut self, reader: &mut R) -> Result<usize, ReadError> {
        let start = self.buf.len();
        self.buf.resize(start + self.chunk_size, 0);
        loop {
            match reader.read(&mut self.buf[start..]) {
                Ok(n) => {
                    self.buf.truncate(start + n);
                    return Ok(n);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.buf.truncate(start);
                    return Err(ReadError::Io(e));
                }
            }
        }
    }

    /// Keeps reading until at least `n` bytes are buffered in total.
    pub fn need<R: Read + ?Sized>(&mut self, reader: &mut R, n: usize) -> Result<(), ReadError> {
        while self.buf.len() < n {
            if self.fill(reader)? == 0 {
                return Err(self.eof_error());
            }
        }
        Ok(())
    }

    fn eof_error(&self) -> ReadError {
        if self.buf.is_empty() {
            ReadError::Empty
        } else {
            ReadError::UnexpectedEof
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}


/// Raw request bytes split into head and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
    head_len: usize,
    body_len: usize,
}

impl Frame {
    /// Start-line and header lines, without the terminating blank line.
    pub fn head(&self) -> &[u8] {
        &self.bytes[..self.head_len]
    }

    /// Exactly the declared number of body bytes.
    pub fn body(&self) -> &[u8] {
        let start = self.head_len + HEAD_TERMINATOR.len();
        &self.bytes[start..start + self.body_len]
    }
}


pub fn read_frame<R: Read + ?Sized>(reader: &mut R) -> Result<Frame, ReadError> {
    read_frame_with(reader, FrameBuffer::new())
}

pub fn read_frame_with<R: Read + ?Sized>(reader: &mut R, mut buffer: FrameBuffer) -> Result<Frame, ReadError> {
    let mut scanned = 0;
    let head_len = loop {
        if let Some(pos) = find_subsequence(&buffer.as_slice()[scanned..], HEAD_TERMINATOR) {
            break scanned + pos;
        }
        // the terminator may straddle two chunks
        scanned = buffer.len().saturating_sub(HEAD_TERMINATOR.len() - 1);
        if buffer.len() > MAX_HEAD_SIZE {
            return Err(ReadError::HeadTooLarge(MAX_HEAD_SIZE));
        }
        if buffer.fill(reader)? == 0 {
            return Err(buffer.eof_error());
        }
    };
    if head_len > MAX_HEAD_SIZE {
        return Err(ReadError::HeadTooLarge(MAX_HEAD_SIZE));
    }

    let declared = declared_length(&buffer.as_slice()[..head_len]).unwrap_or(0);
    let body_len = usize::try_from(declared)
        .ok()
        .filter(|len| *len <= MAX_BODY_SIZE)
        .ok_or(ReadError::BodyTooLarge(declared))?;
    let frame_len = head_len
        .checked_add(HEAD_TERMINATOR.len())
        .and_then(|len| len.checked_add(body_len))
        .ok_or(ReadError::BodyTooLarge(declared))?;
    buffer.need(reader, frame_len)?;

    Ok(Frame { bytes: buffer.buf, head_len, body_len })
}
