use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::response::Html;
use clap::Parser;
use tower_http::services::{ServeDir, ServeFile};

use edupanel::app::document_store::{DocumentStore, InMemoryDocumentStore, LocalFsDocumentStore};
use edupanel::config::{StoreKind, Tunables};
use edupanel::server::{AppState, router};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct AppArgs {
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    #[arg(long, default_value = "workspace-app")]
    data_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = StoreKind::Fs)]
    store: StoreKind,

    /// Where uploaded files are written (default: `<data-dir>/uploads`).
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Static web assets directory (serve if exists).
    #[arg(long, default_value = "web/dist")]
    web_dir: PathBuf,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    edupanel::logging::init()?;

    let args = AppArgs::parse();
    tracing::info!(?args, "starting edupanel-app");

    let tunables = Tunables::from_env();
    let store: Arc<dyn DocumentStore> = match args.store {
        StoreKind::Fs => {
            tracing::info!(data_dir = %args.data_dir.display(), "using local filesystem document store");
            Arc::new(LocalFsDocumentStore::new(&args.data_dir))
        }
        StoreKind::Memory => {
            tracing::warn!("using in-memory document store; data is lost on exit");
            Arc::new(InMemoryDocumentStore::new())
        }
    };
    let upload_dir = args
        .upload_dir
        .clone()
        .unwrap_or_else(|| args.data_dir.join("uploads"));
    tracing::info!(
        upload_dir = %upload_dir.display(),
        session_ttl_secs = tunables.session_ttl_secs,
        max_upload_bytes = tunables.max_upload_bytes,
        max_body_bytes = tunables.max_body_bytes,
        "configured"
    );

    let state = AppState::new(store, upload_dir, tunables);
    if state.users.is_empty().await? {
        tracing::warn!("no users yet; /api/auth/register is open until the first one is created");
    }

    let mut app = router(state);

    let web_index = args.web_dir.join("index.html");
    if web_index.exists() {
        let static_files = ServeDir::new(args.web_dir).not_found_service(ServeFile::new(web_index));
        app = app.fallback_service(static_files);
    } else {
        app = app.fallback(|| async {
            Html(
                r#"<!doctype html>
<html>
  <head><meta charset="utf-8"><title>edupanel-app</title></head>
  <body>
    <h1>edupanel-app</h1>
    <p>web assets not found. Build the admin UI into <code>web/dist</code> or run a dev server.</p>
  </body>
</html>
"#,
            )
        });
    }

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", args.addr))?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(?err, "listen for ctrl-c");
    }
}
