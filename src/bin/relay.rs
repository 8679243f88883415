#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use othello_sync::config::RelayConfig;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RelayConfig::from_env().context("reading relay configuration")?;
    othello_sync::relay::server::run(&config)
        .await
        .with_context(|| format!("relay on {} stopped", config.bind_addr()))?;
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
