use crate::context::ServerContext;
use crate::handler::Handler;
use crate::http::request::Request;
use crate::http::response::Response;

pub const HELLO_URI: &str = "/hello";

#[derive(Debug, Clone, Copy, Default)]
pub struct HelloHandler;

impl Handler for HelloHandler {
    fn handle(&self, _context: &ServerContext, _request: &Request, response: &mut Response) -> anyhow::Result<()> {
        response.set_body("Hello world");
        Ok(())
    }
}
