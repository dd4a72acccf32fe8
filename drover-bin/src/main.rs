mod sim;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use drover_bridge::{Bridge, BridgeRuntime};
use drover_bus::{BusConnector, LocalBus};
use drover_config::ConfigLoader;
use drover_core::Position;
use drover_engine::{EngineFacade, EngineProbe};

use sim::{SimProbe, SimWorld};

/// Local harness: runs the bridge against a simulated world, feeding
/// controller JSON from stdin into the command topic and printing all bus
/// traffic to stdout (logs go to stderr).
#[derive(Parser)]
#[command(
    name = "drover",
    version,
    about = "Command-and-control bridge for long-range agent navigation"
)]
struct Cli {
    /// Path to drover.toml (defaults to ~/.drover/drover.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter override, e.g. "debug" or "drover_bridge=trace"
    #[arg(long)]
    log: Option<String>,

    /// Simulated walking speed in m/s
    #[arg(long, default_value_t = 4.3)]
    sim_speed: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ConfigLoader::load(cli.config.as_deref())?.get();

    let filter = cli
        .log
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut bus = LocalBus::new(1024);
    let mut inbound = bus.start().await?;
    let bus = Arc::new(bus);

    let world = SimWorld::new(Position::new(0.0, 64.0, 0.0), cli.sim_speed);
    let probe_world = world.clone();
    let engine = EngineFacade::new(Box::new(move || {
        Some(Box::new(SimProbe(probe_world)) as Box<dyn EngineProbe>)
    }));

    let bridge = Bridge::new(&config, world.clone(), bus.clone(), engine, Utc::now());
    let (runtime, handle) = BridgeRuntime::new(bridge, config.bridge.tick_hz);
    let runtime_task = tokio::spawn(runtime.run());

    // Advance the simulated world at the tick rate.
    let tick_ms = 1_000 / u64::from(config.bridge.tick_hz.max(1));
    {
        let world = world.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_millis(tick_ms));
            loop {
                ticker.tick().await;
                world.advance(tick_ms as f64 / 1000.0);
            }
        });
    }

    // Bus → stdout, one "<topic> <json>" line per message.
    {
        let mut events = bus.subscribe();
        tokio::spawn(async move {
            while let Ok(msg) = events.recv().await {
                println!("{} {}", msg.topic, msg.payload);
            }
        });
    }

    // Command topic → bridge op queue.
    {
        let handle = handle.clone();
        let cmd_topic = config.bus.cmd_topic.clone();
        tokio::spawn(async move {
            while let Some(msg) = inbound.recv().await {
                if msg.topic == cmd_topic {
                    handle.inbound(msg.payload).await;
                }
            }
        });
    }

    // stdin → command topic, as a remote controller would publish.
    {
        let bus = bus.clone();
        let cmd_topic = config.bus.cmd_topic.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let line = line.trim();
                if !line.is_empty() {
                    bus.send_raw(cmd_topic.clone(), line.to_string());
                }
            }
        });
    }

    info!(cmd_topic = %config.bus.cmd_topic, "harness ready; paste controller JSON on stdin");
    tokio::signal::ctrl_c().await?;
    handle.shutdown().await;
    runtime_task.await?;
    Ok(())
}
