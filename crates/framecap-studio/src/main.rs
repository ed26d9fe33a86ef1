use anyhow::Result;
use clap::Parser;

use framecap_engine::config::{FramerateMode, InitProperties};
use framecap_engine::host::HostDiscovery;
use framecap_engine::logging::{LoggingConfig, init_logging};
use framecap_engine::manager::FpsManager;
use framecap_engine::sim::{self, SimConfig, SimHost};
use framecap_engine::time::RateMeter;
use framecap_engine::window::{Runtime, RuntimeConfig};

#[derive(Parser, Debug)]
#[command(name = "framecap-studio")]
#[command(about = "Frame pacing playground: a live window or a headless simulation")]
#[command(version)]
struct Cli {
    /// Framerate cap (0 disables pacing)
    #[arg(short, long, default_value_t = 30)]
    limit: u32,

    /// Pacing mode: max-fps, fixed-fps or forked-fps
    #[arg(short, long, default_value_t = FramerateMode::MaxFps)]
    mode: FramerateMode,

    /// Run the deterministic simulation instead of opening a window
    #[arg(long)]
    headless: bool,

    /// Simulated run length (headless only)
    #[arg(long, default_value_t = 5000.0)]
    duration_ms: f64,

    /// Timer jitter amplitude (headless only)
    #[arg(long, default_value_t = 0.0)]
    jitter_ms: f64,

    /// Drive host frames continuously at this period instead of on request
    /// (headless only)
    #[arg(long)]
    frame_period_ms: Option<f64>,

    /// Log filter, overriding RUST_LOG
    #[arg(long)]
    log: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(match &cli.log {
        Some(filter) => LoggingConfig::with_filter(filter.clone()),
        None => LoggingConfig::default(),
    });

    let props = InitProperties {
        max_framerate: Some(cli.limit as f64),
        mode: Some(cli.mode),
    };

    if cli.headless {
        log::info!("simulating {} ms of {} @ {}", cli.duration_ms, cli.mode, cli.limit);
        run_headless(&cli, &props)
    } else {
        log::info!("opening window: arrows change the cap, M cycles mode, 0 disables");
        Runtime::run(RuntimeConfig::default(), props)
    }
}

fn run_headless(cli: &Cli, props: &InitProperties) -> Result<()> {
    let sim_config = match cli.frame_period_ms {
        Some(period) => SimConfig::continuous(period),
        None => SimConfig::default(),
    }
    .with_jitter(cli.jitter_ms);

    let host = SimHost::new(sim_config);
    let mut manager = FpsManager::new(props, HostDiscovery::exposed(host))?;
    let events = sim::run_for(&mut manager, cli.duration_ms);

    let host = manager.host();
    let full = meter(&host.full_tick_times());
    let logic = meter(&host.logic_tick_times());
    let renders = meter(host.renders());

    println!();
    println!(
        "  framecap simulation: {} @ {} for {} ms",
        manager.current_mode_or_disabled(),
        cli.limit,
        cli.duration_ms
    );
    println!("  ----------------------------------------------");
    println!("  events delivered   {events}");
    println!("  host frames        {}", host.host_frames());
    println!("  pump frames        {}", host.pump_frames());
    report("full ticks", &full);
    report("logic ticks", &logic);
    report("renders", &renders);
    println!();

    Ok(())
}

fn meter(times: &[f64]) -> RateMeter {
    let mut meter = RateMeter::new();
    for &t in times {
        meter.record(t);
    }
    meter
}

fn report(label: &str, meter: &RateMeter) {
    match (meter.average_period(), meter.rate()) {
        (Some(period), Some(rate)) => println!(
            "  {label:<18} {:<6} every {period:.3} ms ({rate:.2}/s)",
            meter.count()
        ),
        _ => println!("  {label:<18} {}", meter.count()),
    }
}
