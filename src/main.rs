use std::process;

use tracing::error;

use cmctl::cli::{log_filter, parse_with_env_file, run};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load .env file first so RUST_LOG and env-backed flags both see it
    let loaded = parse_with_env_file(std::env::args_os());
    let verbose = loaded.as_ref().map_or(0, |cli| cli.verbose);

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose))
        .with_writer(std::io::stderr)
        .init();

    let cli = match loaded {
        Ok(cli) => cli,
        Err(e) => {
            error!("{}", e);
            println!("{}", e);
            process::exit(1);
        }
    };

    match run(&cli).await {
        Ok(output) => print!("{}", output),
        Err(e) => {
            error!("{}", e);
            println!("{}", e);
            process::exit(1);
        }
    }
}
