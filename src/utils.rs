use rand::Rng;
use std::time::{Duration, SystemTime, UNIX_EPOCH};


const ID_CHARSET: &[u8] = b"0123456789abcdef";

pub type ErrorStr = &'static str;
pub type Result<T> = std::result::Result<T, ErrorStr>;
pub type ResultV = Result<()>;


pub fn generate_hex_id(length: u32) -> String {
    let mut rng = rand::thread_rng();

    (0..length).map(
        |_| {
            let idx = rng.gen_range(0..ID_CHARSET.len());
            ID_CHARSET[idx] as char
        }
    ).collect()
}


fn current_duration() -> Duration {
    // a clock set before the epoch only skews the logged timings
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default()
}

pub fn time_us() -> u128 {
    current_duration().as_micros()
}

/// Position of the first occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_id_has_requested_length_and_charset() {
        let id = generate_hex_id(8);
        assert_eq!(id.len(), 8);
        assert!(id.bytes().all(|b| ID_CHARSET.contains(&b)));
    }

    #[test]
    fn finds_subsequence() {
        assert_eq!(find_subsequence(b"GET / HTTP/1.1\r\n\r\n", b"\r\n\r\n"), Some(14));
        assert_eq!(find_subsequence(b"abc", b"\r\n\r\n"), None);
        assert_eq!(find_subsequence(b"abc", b""), None);
    }
}
