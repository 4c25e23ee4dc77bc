use std::sync::Arc;

use crate::handlers::{self, Handler, ECHO_SEGMENT, FILES_SEGMENT};
use crate::request::Request;
use crate::response::Response;
use crate::storage::Storage;


const MODULE: &str = "ROUTER";

const USER_AGENT_SEGMENT: &str = "/user-agent";


/// Path predicate of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    Exact(&'static str),
    Contains(&'static str),
}

impl Matcher {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Matcher::Exact(expected) => path == *expected,
            Matcher::Contains(segment) => path.contains(segment),
        }
    }
}

pub struct Route {
    pub name: &'static str,
    pub matcher: Matcher,
    pub handler: Handler,
}

/// Ordered routing table, first match wins. Requests matching no route get
/// the fallback handler.
pub struct Router {
    routes: Vec<Route>,
    fallback: Handler,
    storage: Arc<dyn Storage>,
}

impl Router {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Router {
            routes: vec![
                Route { name: "root", matcher: Matcher::Exact("/"), handler: handlers::root },
                Route { name: "echo", matcher: Matcher::Contains(ECHO_SEGMENT), handler: handlers::echo },
                Route { name: "user-agent", matcher: Matcher::Contains(USER_AGENT_SEGMENT), handler: handlers::user_agent },
                Route { name: "files", matcher: Matcher::Contains(FILES_SEGMENT), handler: handlers::files },
            ],
            fallback: handlers::not_found,
            storage,
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// First route whose matcher accepts `path`.
    pub fn matching(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.matcher.matches(path))
    }

    pub fn route(&self, r: &Request) -> Response {
        match self.matching(r.path()) {
            Some(route) => {
                debug!("[{}] {} {} -> {}", MODULE, r.method(), r.path(), route.name);
                (route.handler)(r, self.storage.as_ref())
            }
            None => {
                debug!("[{}] {} {} -> no route", MODULE, r.method(), r.path());
                (self.fallback)(r, self.storage.as_ref())
            }
        }
    }
}
