use chess_arena::api::router::create_router;
use chess_arena::api::state::AppState;
use chess_arena::config::AppConfig;

#[tokio::main]
async fn main() {
    // Handle --health-check flag for container health probes.
    if std::env::args().any(|a| a == "--health-check") {
        match health_check().await {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("Health check failed: {e}");
                std::process::exit(1);
            }
        }
    }

    let config = AppConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .init();

    let bind_addr = config.bind_addr();
    let state = AppState::new(config);
    let app = create_router(state);

    tracing::info!(
        "chess-arena v{} starting on {bind_addr}",
        env!("CARGO_PKG_VERSION")
    );

    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("failed to bind {bind_addr}: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}

/// Lightweight health check: send raw HTTP/1.1 request and check for 200 OK.
async fn health_check() -> Result<(), Box<dyn std::error::Error>> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let port = AppConfig::from_env().port;
    let mut stream = tokio::net::TcpStream::connect(format!("127.0.0.1:{port}")).await?;
    let request =
        format!("GET /health HTTP/1.1\r\nHost: 127.0.0.1:{port}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;
    let mut buf = vec![0u8; 1024];
    let n = stream.read(&mut buf).await?;
    let response = String::from_utf8_lossy(&buf[..n]);
    if response.starts_with("HTTP/1.1 200") {
        Ok(())
    } else {
        Err(format!(
            "Unexpected response: {}",
            response.lines().next().unwrap_or("")
        )
        .into())
    }
}
