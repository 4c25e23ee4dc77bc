use crate::error::StorageError;
use crate::request::{Headers, Request, CONTENT_LENGTH};
use crate::response::{Response, HTTP_200, HTTP_201, HTTP_400, HTTP_404, HTTP_405, HTTP_500};
use crate::storage::Storage;


const MODULE: &str = "HANDLERS";

pub const ECHO_SEGMENT: &str = "echo/";
pub const FILES_SEGMENT: &str = "/files";
const FILE_PREFIX: &str = "/files/";
pub const USER_AGENT: &str = "User-Agent";

const TEXT_PLAIN: &str = "text/plain";
const OCTET_STREAM: &str = "application/octet-stream";
const ALLOWED_FILE_METHODS: &str = "GET, POST";


/// Signature shared by every route handler.
pub type Handler = fn(&Request, &dyn Storage) -> Response;


fn content_type(value: &str) -> Headers {
    [("Content-Type", value)].into_iter().collect()
}

pub fn root(_r: &Request, _storage: &dyn Storage) -> Response {
    Response::empty(HTTP_200)
}

pub fn echo(r: &Request, _storage: &dyn Storage) -> Response {
    let path = r.path();
    let text = path.find(ECHO_SEGMENT)
        .map(|idx| &path[idx + ECHO_SEGMENT.len()..])
        .unwrap_or_default();
    Response::new(HTTP_200, text, content_type(TEXT_PLAIN))
}

pub fn user_agent(r: &Request, _storage: &dyn Storage) -> Response {
    let agent = r.header(USER_AGENT).unwrap_or_default();
    Response::new(HTTP_200, agent, content_type(TEXT_PLAIN))
}

pub fn not_found(_r: &Request, _storage: &dyn Storage) -> Response {
    Response::empty(HTTP_404)
}

/// Name of the file addressed by a `/files/<name>` path, empty when the
/// path has no such segment.
pub fn file_name(path: &str) -> &str {
    path.find(FILE_PREFIX)
        .map(|idx| &path[idx + FILE_PREFIX.len()..])
        .unwrap_or_default()
}

pub fn files(r: &Request, storage: &dyn Storage) -> Response {
    let name = file_name(r.path());
    match r.method() {
        "GET" => handle_file_get(name, storage),
        "POST" => handle_file_post(name, r.body(), storage),
        method => {
            debug!("[{}] Method {} is not supported for {}", MODULE, method, r.path());
            Response::empty(HTTP_405).with_header("Allow", ALLOWED_FILE_METHODS)
        }
    }
}

fn handle_file_get(name: &str, storage: &dyn Storage) -> Response {
    match storage.read(name) {
        Ok(data) => {
            let length = data.len();
            Response::new(HTTP_200, data, content_type(OCTET_STREAM))
                .with_header(CONTENT_LENGTH, length.to_string())
        }
        Err(e) => {
            debug!("[{}] Serving `{}` failed: {}", MODULE, name, e);
            Response::empty(HTTP_404)
        }
    }
}

fn handle_file_post(name: &str, body: &[u8], storage: &dyn Storage) -> Response {
    match storage.write(name, body) {
        Ok(()) => Response::empty(HTTP_201),
        Err(e @ StorageError::Write(_)) => {
            error!("[{}] Storing `{}` failed: {}", MODULE, name, e);
            Response::empty(HTTP_500)
        }
        Err(e) => {
            warn!("[{}] Storing `{}` failed: {}", MODULE, name, e);
            Response::empty(HTTP_400)
        }
    }
}


#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io;
    use std::sync::Mutex;

    use crate::storage::DirStorage;
    use crate::storage::tests::temp_root;

    pub(crate) fn request(raw: &str) -> Request {
        let (head, body) = raw.split_once("\r\n\r\n").unwrap_or((raw, ""));
        Request::parse(head.as_bytes(), body.as_bytes()).unwrap()
    }

    /// Storage that fails with a fixed error kind, or records writes.
    pub(crate) struct StubStorage {
        pub(crate) fail: Option<fn(io::Error) -> StorageError>,
        pub(crate) written: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl StubStorage {
        pub(crate) fn failing(fail: fn(io::Error) -> StorageError) -> Self {
            StubStorage { fail: Some(fail), written: Mutex::new(Vec::new()) }
        }
    }

    impl Storage for StubStorage {
        fn read(&self, _name: &str) -> Result<Vec<u8>, StorageError> {
            match self.fail {
                Some(fail) => Err(fail(io::Error::new(io::ErrorKind::Other, "stub"))),
                None => Ok(Vec::new()),
            }
        }

        fn write(&self, name: &str, data: &[u8]) -> Result<(), StorageError> {
            if let Some(fail) = self.fail {
                return Err(fail(io::Error::new(io::ErrorKind::Other, "stub")));
            }
            self.written.lock().unwrap().push((name.to_string(), data.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn echo_returns_text_after_segment() {
        let resp = echo(&request("GET /echo/hello HTTP/1.1"), &DirStorage::new(None));
        assert_eq!(resp.status(), HTTP_200);
        assert_eq!(resp.body(), b"hello");
        assert_eq!(resp.headers().get("Content-Type"), Some("text/plain"));
        assert_eq!(resp.headers().get("Content-Length"), Some("5"));
    }

    #[test]
    fn echo_does_not_decode() {
        let resp = echo(&request("GET /echo/a%20b/c HTTP/1.1"), &DirStorage::new(None));
        assert_eq!(resp.body(), b"a%20b/c");
    }

    #[test]
    fn user_agent_defaults_to_empty() {
        let storage = DirStorage::new(None);
        let resp = user_agent(&request("GET /user-agent HTTP/1.1\r\nUser-Agent: test-client"), &storage);
        assert_eq!(resp.body(), b"test-client");

        let resp = user_agent(&request("GET /user-agent HTTP/1.1"), &storage);
        assert_eq!(resp.status(), HTTP_200);
        assert!(resp.body().is_empty());
        assert_eq!(resp.headers().get("Content-Length"), None);
    }

    #[test]
    fn file_name_follows_files_segment() {
        assert_eq!(file_name("/files/new.txt"), "new.txt");
        assert_eq!(file_name("/files/dir/a.bin"), "dir/a.bin");
        assert_eq!(file_name("/files"), "");
        assert_eq!(file_name("/filesystem"), "");
        assert_eq!(file_name("/api/files/x"), "x");
    }

    #[test]
    fn get_existing_file_sets_length() {
        let root = temp_root();
        std::fs::write(root.join("data.bin"), b"\x00\x01abc").unwrap();
        std::fs::write(root.join("empty.txt"), b"").unwrap();
        let storage = DirStorage::new(Some(root.clone()));

        let resp = files(&request("GET /files/data.bin HTTP/1.1"), &storage);
        assert_eq!(resp.status(), HTTP_200);
        assert_eq!(resp.body(), b"\x00\x01abc");
        assert_eq!(resp.headers().get("Content-Type"), Some("application/octet-stream"));
        assert_eq!(resp.headers().get("Content-Length"), Some("5"));

        let resp = files(&request("GET /files/empty.txt HTTP/1.1"), &storage);
        assert_eq!(resp.status(), HTTP_200);
        assert_eq!(resp.headers().get("Content-Length"), Some("0"));
        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn read_failures_collapse_to_not_found() {
        for fail in [StorageError::Open as fn(io::Error) -> StorageError, StorageError::Read] {
            let resp = files(&request("GET /files/x HTTP/1.1"), &StubStorage::failing(fail));
            assert_eq!(resp, Response::empty(HTTP_404));
        }
    }

    #[test]
    fn post_maps_storage_errors() {
        let post = request("POST /files/x HTTP/1.1\r\nContent-Length: 1\r\n\r\nz");
        assert_eq!(files(&post, &StubStorage::failing(StorageError::Create)).status(), HTTP_400);
        assert_eq!(files(&post, &StubStorage::failing(StorageError::Write)).status(), HTTP_500);
    }

    #[test]
    fn post_stores_request_body() {
        let storage = StubStorage { fail: None, written: Mutex::new(Vec::new()) };
        let resp = files(&request("POST /files/new.txt HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc"), &storage);
        assert_eq!(resp, Response::empty(HTTP_201));
        assert_eq!(*storage.written.lock().unwrap(), vec![("new.txt".to_string(), b"abc".to_vec())]);
    }

    #[test]
    fn other_methods_are_not_allowed() {
        let resp = files(&request("DELETE /files/x HTTP/1.1"), &DirStorage::new(None));
        assert_eq!(resp.status(), HTTP_405);
        assert_eq!(resp.headers().get("Allow"), Some("GET, POST"));
        assert!(resp.body().is_empty());
    }
}
