use minijinja::context;

use crate::context::ServerContext;
use crate::handler::Handler;
use crate::http::error::HttpError;
use crate::http::request::{Method, Request};
use crate::http::response::Response;

pub const SERVER_INFO_URI: &str = "/info";
pub const SERVER_INFO_TEMPLATE: &str = "server-info.html";

/// Renders a page describing this server instance. GET only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerInfoHandler;

impl Handler for ServerInfoHandler {
    fn handle(&self, context: &ServerContext, request: &Request, response: &mut Response) -> anyhow::Result<()> {
        if request.method() != Method::GET {
            return Err(HttpError::status(400, format!("{} is not supported by {}", request.method(), request.uri())).into());
        }

        let info = context.server_info();
        let threads = match info.thread_count {
            0 => "UNLIMITED".to_string(),
            n => n.to_string(),
        };
        let methods = context
            .supported_methods()
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let statuses: Vec<_> = context
            .statuses()
            .iter()
            .map(|(code, message)| context! { code, message })
            .collect();

        let html = context.templates().render(
            SERVER_INFO_TEMPLATE,
            context! {
                SERVER_NAME => info.name,
                SERVER_PORT => info.port,
                THREAD_COUNT => threads,
                SUPPORTED_REQUEST_METHODS => methods,
                SUPPORTED_RESPONSE_STATUSES => statuses,
            },
        )?;
        response.set_body(html);
        Ok(())
    }
}
