mod args;
mod config;
mod logging;

use std::io;
use std::net::SocketAddr;

use app_api::AppContext;
use board_app::{AppState, spawn_poller};
use http_api::{BOARD_TOKEN_HEADER, HttpState, generate_access_token};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = args::parse_args().map_err(|err| {
        eprintln!("{err}");
        args::print_help();
        io::Error::new(io::ErrorKind::InvalidInput, "invalid arguments")
    })?;

    logging::init(args.json_logs).map_err(io::Error::other)?;

    let loaded = config::load_or_create(args.config.clone()).map_err(io::Error::other)?;
    if loaded.created {
        eprintln!(
            "Created config at {}. Fill in the [api] credentials and at least one \
             [categories.<name>] table, then run again.",
            loaded.paths.file.display()
        );
        return Ok(());
    }

    let mut board_config = loaded.config;
    board_config.apply_env_overrides();
    let port = args.port.unwrap_or(board_config.server.port);
    let app_state = AppState::new(board_config).map_err(|err| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{}: {}", loaded.paths.file.display(), err),
        )
    })?;
    tracing::info!(config = %loaded.paths.file.display(), "configuration loaded");

    if args.once {
        let snapshot = app_state.services.dashboard.refresh().await;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let schedule = app_state.poll_schedule()?;
    let poller = spawn_poller(app_state.services.dashboard.clone(), schedule);

    let context = AppContext {
        app_state,
        config_path: Some(loaded.paths.file),
    };
    let access_token = generate_access_token();
    let router = http_api::router(HttpState::new(context, access_token.clone()));

    let (listener, actual_port, used_fallback) = bind_port(port).await?;
    let url = format!("http://127.0.0.1:{actual_port}");

    if used_fallback {
        tracing::warn!(
            configured = port,
            actual = actual_port,
            "configured port was unavailable"
        );
    }

    println!("Schedule board is running at {url}");
    println!("Send `{BOARD_TOKEN_HEADER}: {access_token}` with each /api request.");
    println!("Press Ctrl+C to stop.");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    poller.abort();
    tracing::info!("stopped");

    Ok(())
}

async fn bind_port(port: u16) -> Result<(tokio::net::TcpListener, u16, bool), io::Error> {
    if port == 0 {
        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let actual_port = listener.local_addr()?.port();
        return Ok((listener, actual_port, false));
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => Ok((listener, port, false)),
        Err(_) => {
            let listener =
                tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
            let actual_port = listener.local_addr()?.port();
            Ok((listener, actual_port, true))
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for Ctrl+C");
    }
}
