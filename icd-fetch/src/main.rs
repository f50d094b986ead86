use anyhow::Result;
use clap::Parser;
use icd_fetch::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Startup failures propagate and exit non-zero; per-node failures only show up in the report.
    let report = run(cli).await?;
    tracing::info!("CLI completed successfully");
    println!("Data collection complete.\nReport:");
    println!("{:#?}", report);
    Ok(())
}
