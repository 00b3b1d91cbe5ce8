use std::io::{self, Write};

use crate::http::request::HTTP_VERSION;
use crate::http::response::Response;
use crate::http::status::StatusTable;

/// Serializes a finalized [`Response`] onto a byte sink.
#[derive(Debug, Clone)]
pub struct ResponseWriter {
    statuses: StatusTable,
}

impl ResponseWriter {
    pub fn new(statuses: StatusTable) -> Self {
        Self { statuses }
    }

    /// Writes the status line, headers in insertion order and the body.
    ///
    /// The head is flushed before the body so a client sees the headers even
    /// when a large body is still on its way.
    pub fn write<W: Write>(&self, out: &mut W, response: &Response) -> io::Result<()> {
        let status = response.status();
        let mut head = format!("{HTTP_VERSION} {status} {}\r\n", self.statuses.message(status));
        for (name, value) in response.headers().iter() {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");

        out.write_all(head.as_bytes())?;
        out.flush()?;

        if !response.is_body_empty() {
            out.write_all(&response.body())?;
            out.flush()?;
        }
        Ok(())
    }
}
