use std::io::{self, BufReader, Write};
use std::net::TcpStream;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::context::ServerContext;
use crate::handler::dispatcher::Dispatcher;
use crate::http::error::HttpError;
use crate::http::parser::{ParseError, parse_http_request};
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder};
use crate::http::writer::ResponseWriter;

pub const ACCESS_LOG: &str = "access_log";

/// Everything a connection needs to turn a request into a response.
/// Built once per server and shared by all connections.
#[derive(Debug)]
pub struct Pipeline {
    pub context: ServerContext,
    pub dispatcher: Dispatcher,
    pub responses: ResponseBuilder,
    pub writer: ResponseWriter,
}

pub struct Connection {
    stream: TcpStream,
    remote_address: String,
    pipeline: Arc<Pipeline>,
    response: Response,
    starting_line: String,
    state: ConnectionState,
}

#[derive(Debug)]
pub enum ConnectionState {
    Idle,
    ReadingRequest,
    Dispatching(Request),
    WritingResponse,
    Errored(HttpError),
    Closed,
}

impl Connection {
    pub fn new(stream: TcpStream, pipeline: Arc<Pipeline>) -> Self {
        let remote_address = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        Self {
            stream,
            remote_address,
            pipeline,
            response: Response::new(),
            starting_line: String::new(),
            state: ConnectionState::Idle,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Serves exactly one request. The socket is closed when the
    /// connection is dropped.
    pub fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Idle => {
                    socket2::SockRef::from(&self.stream).set_keepalive(false)?;
                    self.response = self.pipeline.responses.build_new();
                    self.state = ConnectionState::ReadingRequest;
                }

                ConnectionState::ReadingRequest => {
                    let mut reader = BufReader::new(&self.stream);
                    self.state = match parse_http_request(&mut reader, &self.remote_address) {
                        Ok(request) => {
                            self.starting_line = request.starting_line().to_string();
                            ConnectionState::Dispatching(request)
                        }
                        Err(ParseError::Rejected(err)) => ConnectionState::Errored(err),
                        Err(ParseError::EndOfStream) => {
                            tracing::debug!(remote = %self.remote_address, "Client closed connection before sending a request");
                            ConnectionState::Closed
                        }
                        Err(ParseError::Io(e)) => {
                            tracing::warn!(remote = %self.remote_address, error = %e, "Failed to read request");
                            ConnectionState::Closed
                        }
                    };
                }

                ConnectionState::Dispatching(request) => {
                    let pipeline = Arc::clone(&self.pipeline);
                    self.state = match pipeline.dispatcher.handle(&pipeline.context, &request, &mut self.response) {
                        Ok(()) => ConnectionState::WritingResponse,
                        Err(err) => ConnectionState::Errored(err),
                    };
                }

                ConnectionState::Errored(err) => {
                    self.absorb(&err)?;
                    self.state = ConnectionState::WritingResponse;
                }

                ConnectionState::WritingResponse => {
                    let head = is_head_request(&self.starting_line);
                    self.pipeline.responses.finalize(&mut self.response, head);
                    send_response(
                        &self.pipeline.writer,
                        &mut &self.stream,
                        &self.remote_address,
                        &self.starting_line,
                        &self.response,
                    )?;
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => break,
            }
        }
        Ok(())
    }

    /// Turns an error into the status and headers of the pending response.
    fn absorb(&mut self, err: &HttpError) -> Result<(), HttpError> {
        let status = err.status_code();
        if status >= 500 {
            tracing::error!(remote = %self.remote_address, status, error = ?err, "{err}");
        } else {
            tracing::warn!(remote = %self.remote_address, status, "{err}");
        }

        if self.starting_line.is_empty() {
            if let Some(line) = err.starting_line() {
                self.starting_line = line.to_string();
            }
        }
        self.response.set_status(status);
        for (name, value) in err.response_headers() {
            self.response.set_header(name, value)?;
        }
        Ok(())
    }
}

/// Writes the access log entry, then the response. The entry is kept
/// even when the write fails.
fn send_response<W: Write>(
    writer: &ResponseWriter,
    out: &mut W,
    remote_address: &str,
    starting_line: &str,
    response: &Response,
) -> io::Result<()> {
    tracing::info!(
        target: ACCESS_LOG,
        remote = %remote_address,
        request = %starting_line,
        status = response.status(),
        bytes = response.body_len(),
        "Request served"
    );
    writer.write(out, response)
}

fn is_head_request(starting_line: &str) -> bool {
    starting_line.split(' ').next() == Some(Method::HEAD.as_str())
}

/// Runs a connection to completion, logging whatever escapes it.
///
/// Never panics, so a misbehaving connection can not take a worker thread down.
pub fn serve(stream: TcpStream, pipeline: Arc<Pipeline>) {
    let outcome = catch_unwind(AssertUnwindSafe(move || {
        let mut connection = Connection::new(stream, pipeline);
        let result = connection.run();
        (connection.remote_address, result)
    }));

    match outcome {
        Ok((_, Ok(()))) => {}
        Ok((remote, Err(e))) => tracing::error!(remote = %remote, error = %e, "Connection failed"),
        Err(_) => tracing::error!("Connection worker panicked"),
    }
}
