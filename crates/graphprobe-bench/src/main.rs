use anyhow::Context;
use graphprobe_bench::{BenchConfig, BenchContext, BenchmarkRun};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,graphprobe=debug")),
        )
        .init();

    let config = BenchConfig::from_env().context("failed to load configuration")?;
    info!(
        tenant = %config.endpoint.tenant_id,
        graph = %config.endpoint.graph_url,
        poll = ?config.poll,
        "configuration loaded"
    );

    let client = config
        .build_client()
        .context("failed to build Graph client")?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("shutdown requested, aborting run");
                cancel.cancel();
            }
        }
    });

    let ctx = BenchContext::new(Arc::new(client))
        .with_poll_policy(config.poll)
        .with_cancellation(cancel);

    let report = match BenchmarkRun::new(&ctx, config.plan).execute().await {
        Ok(report) => report,
        Err(err) if err.is_cancelled() => {
            warn!(error = %err, "run cancelled");
            return Ok(());
        }
        Err(err) => return Err(anyhow::Error::new(err).context("benchmark run failed")),
    };

    for measurement in &report.measurements {
        info!(
            scenario = %measurement.scenario,
            group = %measurement.display_name,
            seconds = measurement.visibility_latency.as_secs_f64(),
            attempts = measurement.attempts,
            "result"
        );
    }
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
