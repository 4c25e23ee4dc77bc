use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use threadpool::ThreadPool;

use crate::config::ServerConfig;
use crate::context::Context;
use crate::error::{FrameError, ReadError};
use crate::frame::read_frame;
use crate::request::{parse_request, Request};
use crate::response::{Response, HTTP_400};
use crate::router::Router;


const MODULE: &str = "SERVER";


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Accepted,
    Reading,
    Parsed,
    Routed,
    Responding,
    ErrorResponding,
    Closed,
}

/// What happened on a connection once it is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub state: ConnectionState,
    /// Status sent to the peer, `None` when nothing was written.
    pub status: Option<u16>,
    pub bytes_sent: usize,
}

struct Driver<'a> {
    ctx: &'a mut Context,
    state: ConnectionState,
}

impl<'a> Driver<'a> {
    fn advance(&mut self, next: ConnectionState) {
        trace!("[{}] {:?} -> {:?}", self.ctx.qid, self.state, next);
        self.state = next;
    }

    fn respond<W: Write + ?Sized>(&mut self, stream: &mut W, response: &Response) -> Outcome {
        let (status, sent) = match response.write_to(stream) {
            Ok(n) => (Some(response.status()), n),
            Err(e) => {
                warn!("[{}] Failed to write response: {}", self.ctx.qid, e);
                (None, 0)
            }
        };
        self.ctx.fix();
        info!(
            "Respond to [{}]: time: {}ms; status: {}; sent: {} bytes",
            self.ctx.qid, self.ctx.time_ms(), response.status(), sent
        );
        self.close(status, sent)
    }

    fn close(&mut self, status: Option<u16>, bytes_sent: usize) -> Outcome {
        self.advance(ConnectionState::Closed);
        Outcome { state: self.state, status, bytes_sent }
    }
}


fn read_request<R: Read + ?Sized>(stream: &mut R) -> Result<Request, FrameError> {
    let frame = read_frame(stream)?;
    Ok(parse_request(&frame)?)
}

/// Runs one request/response cycle over `stream`. The caller owns the stream
/// and closes it once this returns.
pub fn handle_connection<S: Read + Write + ?Sized>(stream: &mut S, router: &Router, ctx: &mut Context) -> Outcome {
    let mut driver = Driver { ctx, state: ConnectionState::Accepted };
    driver.advance(ConnectionState::Reading);

    let request = match read_request(stream) {
        Ok(request) => request,
        Err(FrameError::Read(ReadError::Empty)) => {
            debug!("[{}] Peer closed without sending a request", driver.ctx.qid);
            return driver.close(None, 0);
        }
        Err(e) => {
            warn!("[{}] Rejecting malformed request: {}", driver.ctx.qid, e);
            driver.advance(ConnectionState::ErrorResponding);
            return driver.respond(stream, &Response::empty(HTTP_400));
        }
    };
    driver.advance(ConnectionState::Parsed);

    let headers: String = request.headers().iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<String>>()
        .join("\\r\\n");
    info!(
        "New Request [qid={}]: method: {}; url: {}; headers='{}'",
        driver.ctx.qid, request.method(), request.path(), headers
    );

    let response = router.route(&request);
    driver.advance(ConnectionState::Routed);
    driver.advance(ConnectionState::Responding);
    driver.respond(stream, &response)
}

/// Handles an accepted socket and closes it, whatever happens while serving.
pub fn serve_connection(mut stream: TcpStream, router: &Router, read_timeout: Option<Duration>) {
    let mut ctx = Context::new(stream.peer_addr().ok());
    if let Some(peer) = ctx.peer {
        debug!("[{}] Accepted connection from {}", ctx.qid, peer);
    }
    if let Err(e) = stream.set_read_timeout(read_timeout) {
        warn!("[{}] Could not set read timeout: {}", ctx.qid, e);
    }

    let served = panic::catch_unwind(AssertUnwindSafe(|| handle_connection(&mut stream, router, &mut ctx)));
    if served.is_err() {
        warn!("[{}] Connection handler panicked, dropping connection", ctx.qid);
    }

    if let Err(e) = stream.shutdown(Shutdown::Both) {
        debug!("[{}] Shutdown after response failed: {}", ctx.qid, e);
    }
}


pub struct Server {
    listener: TcpListener,
    router: Arc<Router>,
    pool: ThreadPool,
    read_timeout: Option<Duration>,
}

impl Server {
    pub fn bind(cfg: &ServerConfig, router: Router) -> io::Result<Server> {
        let listener = TcpListener::bind(cfg.address())?;
        Ok(Server {
            listener,
            router: Arc::new(router),
            pool: ThreadPool::new(cfg.workers.max(1)),
            read_timeout: cfg.read_timeout(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept loop. Only returns if the listener stops yielding connections.
    pub fn run(self) {
        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let router = self.router.clone();
                    let read_timeout = self.read_timeout;
                    self.pool.execute(move || serve_connection(stream, &router, read_timeout));
                }
                Err(e) => error!("[{}] Error accepting connection: {}", MODULE, e),
            }
        }
    }
}
