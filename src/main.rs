use std::sync::Arc;

use ovpn_bundler::settings::Settings;
use ovpn_bundler::web::{create_router, AppState};

use ovb_pki::{probe_openvpn_version, SystemRunner, ToolRunner};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Arc::new(Settings::from_env());
    tracing::info!(
        bind = %settings.bind_addr,
        easy_rsa = %settings.easy_rsa_dir.display(),
        openvpn = %settings.openvpn_binary.display(),
        "starting ovpn-bundler"
    );

    let runner: Arc<dyn ToolRunner> = Arc::new(SystemRunner);
    match probe_openvpn_version(runner.as_ref(), &settings.openvpn_binary).await {
        Ok(Some(version)) => tracing::info!(%version, "found OpenVPN binary"),
        Ok(None) => tracing::warn!("OpenVPN binary did not report a version"),
        Err(e) => tracing::warn!("cannot probe OpenVPN binary: {}", e),
    }

    let state = AppState::new(settings.clone(), runner);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .expect("cannot bind listen address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown requested");
}
