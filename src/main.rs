use rawhttp::cli::{Command, parse_command};
use rawhttp::config::Config;
use rawhttp::handler::hello::{HELLO_URI, HelloHandler};
use rawhttp::handler::server_info::{SERVER_INFO_URI, ServerInfoHandler};
use rawhttp::server::{ServerBuilder, ShutdownHandle};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    let mut server = ServerBuilder::new(cfg)
        .handler(HELLO_URI, HelloHandler)?
        .handler(SERVER_INFO_URI, ServerInfoHandler)?
        .bind()?;
    let shutdown = server.start()?;
    tracing::info!("Type 'q', 'quit' or 'exit' to stop the server");

    tokio::select! {
        res = console(shutdown.clone()) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    tokio::task::spawn_blocking(move || shutdown.stop()).await?;
    drop(server);

    // A pending stdin read would otherwise keep the runtime alive.
    std::process::exit(0)
}

/// Reads console commands until a quit command or end of input.
async fn console(shutdown: ShutdownHandle) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Command::Quit => return Ok(()),
            Command::Unsupported(cmd) => {
                tracing::warn!(cmd = %cmd, "Unsupported cmd. Only q, quit or exit are supported");
            }
        }
        if shutdown.is_stopped() {
            break;
        }
    }
    Ok(())
}
