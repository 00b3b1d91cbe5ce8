use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use tracing::info;

use crate::http::connection;
use crate::server::Shared;

/// Accept loop. Hands every connection to the worker pool until the server
/// is stopped or `accept` fails.
pub(crate) fn run(listener: TcpListener, shared: Arc<Shared>) {
    info!(address = ?listener.local_addr().ok(), "Listening");

    loop {
        match listener.accept() {
            Ok((socket, peer)) => {
                if shared.stopping.load(Ordering::Acquire) {
                    break;
                }
                tracing::debug!(peer = %peer, "Accepted connection");

                let pipeline = Arc::clone(&shared.pipeline);
                if let Err(e) = shared.pool.execute(Box::new(move || connection::serve(socket, pipeline))) {
                    tracing::error!(peer = %peer, error = %e, "Can not submit connection to worker pool");
                }
            }
            Err(e) => {
                if !shared.stopping.load(Ordering::Acquire) {
                    tracing::error!(error = %e, "Can not accept client socket");
                    shared.teardown();
                }
                break;
            }
        }
    }
    // Listener dropped here, which closes the server socket.
}
