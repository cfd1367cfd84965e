use std::io::Write;

use anyhow::{Context, Result};
use todo_smoke::{RequestIssuer, render_pretty};
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Posts the todo and writes the rendered reply to `out`. Nothing is written
/// unless the request and both decode steps succeed.
async fn run(issuer: &RequestIssuer, out: &mut impl Write) -> Result<()> {
    debug!(endpoint = issuer.endpoint(), "posting todo");

    let document = issuer
        .issue()
        .await
        .with_context(|| format!("POST {} failed", issuer.endpoint()))?;
    let rendered = render_pretty(&document).context("failed to render response")?;

    writeln!(out, "{rendered}").context("failed to write response")?;
    out.flush().context("failed to flush stdout")?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let issuer = RequestIssuer::new().context("failed to build http client")?;
    let mut stdout = std::io::stdout().lock();
    run(&issuer, &mut stdout).await
}
