//! A small demo server exercising plain, chunked and status-page responses.
//!
//! ```bash
//! RUST_LOG=debug cargo run --bin rafale-demo -- --addr 127.0.0.1:8080
//! curl -i http://127.0.0.1:8080/
//! curl -i http://127.0.0.1:8080/stream
//! curl -i http://127.0.0.1:8080/teapot
//! curl -i http://127.0.0.1:8080/missing
//! ```

use std::sync::Arc;

use clap::Parser;
use http::Method;
use tracing_subscriber::EnvFilter;

use rafale::{HttpServer, Router};

#[derive(Parser)]
#[command(name = "rafale-demo")]
#[command(about = "Demo HTTP server", long_about = None)]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut router = Router::new();

    router.on(Method::GET, "/", |_req, res| {
        res.begin(200)?
            .header("Content-Type", "text/plain")?
            .write("rafale demo server\n")?
            .write("try /stream, /teapot, or any missing path\n")?
            .end()
    });

    router.on(Method::GET, "/stream", |_req, res| {
        res.begin(200)?
            .header("Content-Type", "text/plain")?
            .make_chunked()?;
        for i in 1..=5 {
            res.write(format!("chunk {i}\n"))?;
        }
        res.end()
    });

    router.on(Method::GET, "/teapot", |_req, res| {
        // Ends empty; the 418 status page below provides the body.
        res.begin(418)?.end()
    });

    router.on_error(404, |req, res| {
        res.begin(0)?
            .header("Content-Type", "text/plain")?
            .write(format!("no such path: {}\n", req.url))?
            .end()
    });
    router.on_error(418, |_req, res| {
        res.begin(0)?
            .header("Content-Type", "text/plain")?
            .write("short and stout\n")?
            .end()
    });

    let server = HttpServer::new(Arc::new(router));
    let handle = server.start(cli.addr.as_str())?;
    tracing::info!(addr = %handle.addr(), "demo server running");

    if let Err(err) = handle.join() {
        tracing::error!(?err, "server terminated abnormally");
    }
    Ok(())
}
