//! Show a handful of callsigns on HamDXMap
//!
//! Run with: cargo run --example show_callsigns [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example show_callsigns                    # binds to 0.0.0.0:12345
//!   cargo run --example show_callsigns localhost          # binds to 127.0.0.1:12345
//!   cargo run --example show_callsigns 127.0.0.1:12346    # binds to 127.0.0.1:12346
//!
//! Open https://dxmap.f5uii.net/, enable the wtSock connector and point it at
//! the bind address. Every ten seconds another partial callsign shows up on
//! the map; after the last one the server shuts down gracefully.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dxmap_rs::server::config::DEFAULT_PORT;
use dxmap_rs::{DxMapServer, MapPublisher, ServerConfig};

const CALLSIGNS: [&str; 5] = ["F5UII", "W1AW", "PY1PY", "DL3NEY", "ZL2CTM"];

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:12345
/// - "localhost:12346" -> 127.0.0.1:12346
/// - "127.0.0.1" -> 127.0.0.1:12345
/// - "0.0.0.0:12345" -> 0.0.0.0:12345
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: show_callsigns [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:{})", DEFAULT_PORT);
}

async fn show_callsigns(publisher: MapPublisher) {
    for call in CALLSIGNS {
        tokio::time::sleep(Duration::from_secs(10)).await;

        if let Err(e) = publisher.show_partial_call(call).await {
            tracing::warn!(call = call, error = %e, "Cannot show callsign");
            return;
        }
        tracing::info!(call = call, "Callsign shown");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let bind_addr = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dxmap_rs=debug".parse()?)
                .add_directive("show_callsigns=info".parse()?),
        )
        .init();

    let server = Arc::new(DxMapServer::new(ServerConfig::with_addr(bind_addr)));

    let serving = Arc::clone(&server);
    let serve_task = tokio::spawn(async move { serving.serve().await });

    tokio::select! {
        _ = show_callsigns(server.publisher().clone()) => {}
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    if let Err(e) = server.graceful_shutdown().await {
        eprintln!("Error closing the server: {}", e);
    }

    match serve_task.await? {
        Ok(()) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
