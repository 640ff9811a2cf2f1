use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::{signal, time::Duration};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use guitar_led::{
    config::{append_config_data, ControllerConfig},
    device::{MemoryPinRegistry, ScriptedGpio, POLL_INTERVAL_MS},
    sim::{parse_trace, SimHost, TraceSample},
    GuitarLedController,
};

#[derive(Parser, Debug)]
#[command(name = "guitar-led")]
#[command(about = "Replay rotary-encoder traces through the guitar LED preset selector")]
#[command(version)]
struct Cli {
    /// Host config file holding the `Guitar-Led` section (cfg.json)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Pin trace to replay, one `A B SW [xN]` line per 2ms tick
    #[arg(long, value_name = "FILE")]
    trace: Option<PathBuf>,

    /// Pace the replay in real time instead of as fast as possible
    #[arg(long)]
    realtime: bool,

    /// Print effects and palettes in sorted order
    #[arg(long)]
    print_sorted: bool,

    /// Print the config section as it would be saved
    #[arg(long)]
    dump_config: bool,

    /// Write the (merged) config section back to the config file
    #[arg(long, requires = "config")]
    save: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let gpio = ScriptedGpio::new();
    let mut controller =
        GuitarLedController::new(gpio.clone(), MemoryPinRegistry::new(), SimHost::new());

    let mut root = match cli.config.as_ref() {
        Some(path) => ControllerConfig::load_root(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => serde_json::json!({}),
    };
    if ControllerConfig::section(&root).is_none() {
        info!("No Guitar-Led config found; using defaults");
    } else if !controller.read_from_config(&root) {
        info!("Stored config predates the preset band; using defaults for missing keys");
    }

    if let Err(e) = controller.setup() {
        error!("Setup failed, controller disabled: {}", e);
    }

    if cli.print_sorted {
        print_sorted(&controller);
    }

    if cli.dump_config {
        let mut section = serde_json::json!({});
        controller.add_to_config(&mut section);
        println!("{}", serde_json::to_string_pretty(&section)?);
        println!("{}", append_config_data());
    }

    if let Some(path) = cli.trace.as_ref() {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let samples = parse_trace(&text)?;
        info!("Replaying {} trace lines", samples.len());

        tokio::select! {
            _ = replay(&mut controller, &gpio, &samples, cli.realtime) => {}
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, stopping replay...");
            }
        }

        let host = controller.host();
        println!(
            "{} preset steps, current preset {}, next press goes {}",
            host.steps().len(),
            host.preset()
                .map(|p| p.to_string())
                .unwrap_or_else(|| "none".to_string()),
            if controller.move_forward() { "forward" } else { "backward" }
        );
    }

    if cli.save {
        if let Some(path) = cli.config.as_ref() {
            controller.add_to_config(&mut root);
            ControllerConfig::save_root(path, &root)?;
            info!("Saved config to {:?}", path);
        }
    }

    controller.teardown();
    Ok(())
}

type SimController = GuitarLedController<ScriptedGpio, MemoryPinRegistry, SimHost>;

/// Feed every trace sample to the pins and tick once per sample
async fn replay(
    controller: &mut SimController,
    gpio: &ScriptedGpio,
    samples: &[TraceSample],
    realtime: bool,
) {
    let mut interval = tokio::time::interval(Duration::from_millis(POLL_INTERVAL_MS));
    let pins = controller.pins().pins();
    if !controller.is_enabled() {
        warn!("Controller is disabled; the trace will have no effect");
    }

    for sample in samples {
        for _ in 0..sample.repeat {
            gpio.set(pins.pin_a, sample.a);
            gpio.set(pins.pin_b, sample.b);
            gpio.set(pins.pin_c, sample.switch);

            controller.host_mut().advance(POLL_INTERVAL_MS);
            controller.tick();

            if realtime {
                interval.tick().await;
            } else {
                tokio::task::yield_now().await;
            }
        }
    }
}

fn print_sorted(controller: &SimController) {
    println!("Effects:");
    for (i, name) in controller.sorted_mode_names().iter().enumerate() {
        println!("  {:3} {}", i, name);
    }
    println!("Palettes:");
    for (i, name) in controller.sorted_palette_names().iter().enumerate() {
        println!("  {:3} {}", i, name);
    }
}
