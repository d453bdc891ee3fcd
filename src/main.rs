use std::env;

use todo_service::config::AppConfig;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn parse_port_arg(args: &[String], flag: &str) -> Option<u16> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return args[i + 1].parse::<u16>().ok();
        }
        i += 1;
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();
    let config = AppConfig::from_env()?.with_port(parse_port_arg(&args, "--port"));

    let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "todo_service",
        "todo service starting: RUST_LOG='{}', bind={}, http_port={}, issuer='{}', access_ttl={}s, refresh_ttl={}s",
        rust_log, config.bind, config.http_port, config.auth.issuer, config.auth.access_ttl_secs, config.auth.refresh_ttl_secs
    );

    todo_service::server::run(config).await
}
