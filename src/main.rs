use clap::Parser;
use tracing_subscriber::EnvFilter;

use hexapod_zenoh_runtime::config::MAESTRO_PORT;
use hexapod_zenoh_runtime::runtime::{self, RuntimeOptions};

/// Hexapod gait runtime: zenoh command words in, Maestro servo pulses out
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Serial port for the Maestro servo controller
    #[arg(long, default_value = MAESTRO_PORT)]
    port: String,

    /// Run without hardware; frames are computed and published only
    #[arg(long)]
    no_motors: bool,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();
    let opts = RuntimeOptions {
        port: args.port,
        motors: !args.no_motors,
    };

    if let Err(e) = runtime::run(opts).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
