//! openapi-mcp-proxy entry point

use clap::Parser;
use openapi_mcp_proxy::cli::{self, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    cli::init_tracing();

    let cli = Cli::parse();
    if let Err(e) = cli.execute().await {
        let exit_code = cli::error::display_error(&e);
        std::process::exit(exit_code);
    }
}
