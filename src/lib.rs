//! rawhttp - HTTP/1.1 server on plain TCP sockets
//!
//! One request per connection, served on a worker thread: the request is
//! parsed straight off the socket, dispatched to a handler by URI, and the
//! response is written back before the socket is closed.

pub mod cli;
pub mod clock;
pub mod config;
pub mod context;
pub mod handler;
pub mod http;
pub mod resources;
pub mod server;
pub mod template;
