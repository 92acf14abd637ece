mod wiring;

use crate::{cli, context, rest, storage::SqliteStorage};
use anyhow::{Context as AnyhowContext, Result};
use tokio_util::sync::CancellationToken;

pub struct App {
    pub ctx: context::Context,
    pub storage: SqliteStorage,
}

impl App {
    pub fn from_cli() -> Result<Self> {
        let cli = cli::parse();
        let ctx = context::Context::from_cli(&cli);

        crate::tracing::init(ctx.config.log_file.as_deref());
        log::info!("🚀 Starting ecoleta-server");
        log::info!("🌐 REST API: http://{}", ctx.config.api_listen);
        log::info!("🔗 Public base URL: {}", ctx.config.public_url);
        log::info!("📂 Data dir: {}", ctx.config.data_dir.display());
        log::info!("🖼️ Uploads dir: {}", ctx.config.uploads_dir.display());
        if let Some(path) = ctx.config.log_file.as_deref() {
            log::info!("📝 Log file: {}", path.display());
        }

        wiring::init_data_dirs(&ctx.config).context("initializing data dirs")?;
        let storage = wiring::init_storage(&ctx.config)?;

        Ok(Self { ctx, storage })
    }
}

pub async fn run_daemon(app: App) -> Result<()> {
    let shutdown = CancellationToken::new();

    let api_addr = app.ctx.config.api_listen;
    let public_url = app.ctx.config.public_url.clone();
    let uploads = wiring::build_upload_store(&app.ctx.config);
    let rest_storage = app.storage.clone();
    let rest_shutdown = shutdown.clone();

    let mut rest_handle = tokio::spawn(async move {
        if let Err(e) = rest::serve(api_addr, rest_storage, public_url, uploads, rest_shutdown).await
        {
            log::error!("REST server error: {}", e);
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("🧨 Ctrl-C received, shutting down");
            shutdown.cancel();
            if let Err(e) = rest_handle.await {
                log::error!("REST server task failed: {}", e);
                return Err(e.into());
            }
        }
        res = &mut rest_handle => {
            shutdown.cancel();
            if let Err(e) = res {
                log::error!("REST server task failed: {}", e);
                return Err(e.into());
            }
        }
    }

    log::info!("✅ Shutdown complete");
    Ok(())
}

pub async fn run() -> Result<()> {
    let app = App::from_cli()?;
    run_daemon(app).await
}
