//! motor-sim
//! Roda um controlador simulado a partir de um arquivo TOML e imprime a trajetória

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use canmotor_core::{
    ControlMode, ControllerConfig, DeviceSpec, LoopbackFactory, ManualClock, MotorController,
    MotorTelemetry, SimConfig,
};
use clap::{Parser, ValueEnum};
use colored::*;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "motor-sim")]
#[command(author = "SIL Contributors")]
#[command(version = "2026.1.16")]
#[command(about = "Simulated CAN motor controller runner", long_about = None)]
struct Cli {
    /// Controller configuration (.toml); defaults to a simulated SPARK MAX
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Control mode
    #[arg(short, long, value_enum, default_value_t = ModeArg::Position)]
    mode: ModeArg,

    /// Demand in the mode's units
    #[arg(short, long, allow_hyphen_values = true)]
    demand: f64,

    /// Arbitrary feedforward (volts)
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    feedforward: f64,

    /// Simulated time (seconds)
    #[arg(long, default_value_t = 5.0)]
    duration: f64,

    /// Control loop period (seconds)
    #[arg(long, default_value_t = 0.02)]
    period: f64,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Percent,
    Voltage,
    Position,
    Velocity,
    ProfiledPosition,
    ProfiledVelocity,
}

impl From<ModeArg> for ControlMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Percent => ControlMode::PercentOutput,
            ModeArg::Voltage => ControlMode::Voltage,
            ModeArg::Position => ControlMode::Position,
            ModeArg::Velocity => ControlMode::Velocity,
            ModeArg::ProfiledPosition => ControlMode::ProfiledPosition,
            ModeArg::ProfiledVelocity => ControlMode::ProfiledVelocity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

/// Maior número de ciclos aceito em uma execução
const MAX_STEPS: usize = 10_000_000;

/// Uma linha da trajetória
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
struct Sample {
    time: f64,
    #[serde(flatten)]
    telemetry: MotorTelemetry,
}

/// Parâmetros da execução
#[derive(Debug, Clone, Copy)]
struct Run {
    mode: ControlMode,
    demand: f64,
    feedforward: f64,
    duration: f64,
    period: f64,
}

fn main() {
    // Logs em stderr; stdout fica só com a trajetória
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "canmotor_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run_command(&cli) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let run = Run {
        mode: cli.mode.into(),
        demand: cli.demand,
        feedforward: cli.feedforward,
        duration: cli.duration,
        period: cli.period,
    };

    let samples = simulate(&config, run)?;

    match cli.format {
        OutputFormat::Csv => {
            println!("time,position,velocity,percent,current,temperature");
            for s in &samples {
                let t = s.telemetry;
                println!(
                    "{:.4},{:.6},{:.6},{:.4},{:.3},{:.1}",
                    s.time, t.position, t.velocity, t.percent, t.current, t.temperature
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&samples)?);
        }
    }

    Ok(())
}

/// Lê a configuração e garante que o controlador seja simulado
fn load_config(path: Option<&Path>) -> anyhow::Result<ControllerConfig> {
    let mut config = match path {
        Some(path) => ControllerConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ControllerConfig::new("motor-sim", DeviceSpec::spark_max(1)),
    };

    if config.simulation.is_none() {
        config.simulation = Some(SimConfig::default());
    }
    Ok(config)
}

/// Executa o laço de controle com relógio manual
fn simulate(config: &ControllerConfig, run: Run) -> anyhow::Result<Vec<Sample>> {
    if !run.period.is_finite() || run.period <= 0.0 {
        bail!("period must be positive, got {}", run.period);
    }
    if !run.duration.is_finite() || run.duration < 0.0 {
        bail!("duration must be non-negative, got {}", run.duration);
    }

    let cycles = (run.duration / run.period).round();
    if cycles > MAX_STEPS as f64 {
        bail!(
            "duration/period gives {} cycles, limit is {}",
            cycles,
            MAX_STEPS
        );
    }
    let steps = cycles as usize;

    let clock = ManualClock::new(0.0);
    let mut controller = MotorController::from_config(&LoopbackFactory, config, Arc::new(clock.clone()))?;

    info!(name = controller.name(), mode = %run.mode, demand = run.demand, steps, "simulation start");

    let mut samples = Vec::with_capacity(steps + 1);
    for step in 0..=steps {
        let time = step as f64 * run.period;
        clock.set(time);
        // Repetido a cada ciclo, como em um laço real
        controller.set(run.mode, run.demand, run.feedforward)?;
        controller.update();
        samples.push(Sample { time, telemetry: controller.telemetry() });
    }

    info!(
        name = controller.name(),
        position = controller.position(),
        settled = controller.within_tolerance(0.01),
        "simulation done"
    );
    Ok(samples)
}
