//! RT Node - Main Entry Point

use rt_node::{init_logging, run, NodeConfig, NodeError, DEFAULT_CONFIG_PATH};
use tracing::info;

const USAGE: &str = "Usage: rt-node [--config <path>] [--run-for <seconds>]";

struct Args {
    config_path: String,
    run_for_secs: Option<u64>,
}

fn parse_args() -> Result<Args, NodeError> {
    let mut args = Args {
        config_path: DEFAULT_CONFIG_PATH.to_string(),
        run_for_secs: None,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                args.config_path = iter
                    .next()
                    .ok_or_else(|| NodeError::Usage(format!("--config needs a path\n{}", USAGE)))?;
            }
            "--run-for" => {
                let secs = iter.next().ok_or_else(|| {
                    NodeError::Usage(format!("--run-for needs a number of seconds\n{}", USAGE))
                })?;
                let secs = secs
                    .parse()
                    .map_err(|_| NodeError::Usage(format!("invalid duration: {}", secs)))?;
                args.run_for_secs = Some(secs);
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            other => {
                return Err(NodeError::Usage(format!("unknown argument: {}\n{}", other, USAGE)));
            }
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args()?;

    let mut config = NodeConfig::load(&args.config_path)?;
    if args.run_for_secs.is_some() {
        config.run_for_secs = args.run_for_secs;
    }
    init_logging(&config.logging)?;

    info!("=== RT Node v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded from {} (if present) and environment",
        args.config_path
    );
    info!(
        "Tick rate {} Hz, sensor period {} ticks, network period {} ticks",
        config.kernel.tick_rate_hz, config.sensor.period_ticks, config.network.period_ticks
    );

    let summary = run(config).await?;
    summary.log();

    Ok(())
}
