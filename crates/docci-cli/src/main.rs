//! Primary entrypoint for the `docci` CLI binary.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    docci_cli::run().await
}
