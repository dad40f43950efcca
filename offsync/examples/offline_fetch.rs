//! Assemble the engine from configuration, install a tiny manifest, then
//! fetch the same asset twice: the second hit is served from cache.
//!
//! Run with: cargo run --example offline_fetch

use offsync::prelude::*;

const CONFIG: &str = r#"
version: v1
api_prefix: /api/
manifest:
  - https://example.com/
offline_page: https://example.com/
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let config = EngineConfig::from_yaml_str(CONFIG)?;
    let dispatcher = EventDispatcher::from_config(&config)?;

    dispatcher.dispatch(EngineEvent::Install).await?;
    dispatcher.dispatch(EngineEvent::Activate).await?;

    for round in 1..=2 {
        let outcome = dispatcher
            .dispatch(EngineEvent::Fetch(CapturedRequest::get(
                "https://example.com/",
            )))
            .await?;
        if let EventOutcome::Fetched(fetched) = outcome {
            println!(
                "round {round}: {} bytes via {:?} ({})",
                fetched.response.body.len(),
                fetched.source,
                fetched.strategy,
            );
        }
    }

    Ok(())
}
