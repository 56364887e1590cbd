use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use steering_core::{SimConfig, Simulation, TargetEvent};
use tracing::info;

/// Run the neural steering simulation headless and print a JSON run summary.
#[derive(Parser, Debug)]
#[command(name = "steer", version, about)]
struct Cli {
    /// JSON file with a (partial) SimConfig; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    /// Number of agents to spawn.
    #[arg(long)]
    agents: Option<usize>,

    #[arg(long)]
    width: Option<f64>,

    #[arg(long)]
    height: Option<f64>,

    /// Layer sizes, e.g. `4,8,2`.
    #[arg(long, value_delimiter = ',')]
    topology: Option<Vec<usize>>,

    /// Initial target as `X,Y`.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    target: Option<Vec<f64>>,

    /// Scripted click: move the target to (X, Y) before tick STEP. Repeatable.
    #[arg(long = "click", value_name = "STEP:X:Y", value_parser = parse_click)]
    clicks: Vec<TargetEvent>,

    /// Number of ticks to run.
    #[arg(long, default_value_t = 600)]
    steps: usize,

    /// Record a frame every N ticks.
    #[arg(long, default_value_t = 60)]
    sample_every: usize,

    /// Evaluate brains on all cores.
    #[arg(long)]
    parallel: bool,

    /// Write the summary here instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Single-line JSON.
    #[arg(long)]
    compact: bool,
}

fn parse_click(raw: &str) -> Result<TargetEvent, String> {
    let parts: Vec<&str> = raw.split(':').collect();
    let [step, x, y] = parts.as_slice() else {
        return Err(format!("expected STEP:X:Y, got {raw:?}"));
    };
    let step = step
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("bad step {step:?}: {e}"))?;
    let x = x.trim().parse::<f64>().map_err(|e| format!("bad x {x:?}: {e}"))?;
    let y = y.trim().parse::<f64>().map_err(|e| format!("bad y {y:?}: {e}"))?;
    Ok(TargetEvent { step, x, y })
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    let mut sim = Simulation::try_new(config).context("failed to build simulation")?;
    info!(
        agents = sim.agent_count(),
        steps = cli.steps,
        clicks = cli.clicks.len(),
        "running headless simulation"
    );
    let summary = sim
        .try_run_experiment(cli.steps, cli.sample_every, &cli.clicks)
        .context("simulation run failed")?;

    let out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("cannot create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut out = BufWriter::new(out);
    if cli.compact {
        serde_json::to_writer(&mut out, &summary)?;
    } else {
        serde_json::to_writer_pretty(&mut out, &summary)?;
    }
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

fn build_config(cli: &Cli) -> Result<SimConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
            serde_json::from_reader(io::BufReader::new(file))
                .with_context(|| format!("invalid config in {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(agents) = cli.agents {
        config.num_agents = agents;
    }
    if let Some(width) = cli.width {
        config.arena_width = width;
    }
    if let Some(height) = cli.height {
        config.arena_height = height;
    }
    if let Some(topology) = &cli.topology {
        config.topology = topology.clone();
    }
    if let Some(target) = &cli.target {
        let &[x, y] = target.as_slice() else {
            bail!("--target takes exactly two values");
        };
        config.initial_target = [x, y];
    }
    if cli.parallel {
        config.parallel_tick = true;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_parses_step_and_coordinates() {
        assert_eq!(
            parse_click("30:120.5:-4"),
            Ok(TargetEvent {
                step: 30,
                x: 120.5,
                y: -4.0
            })
        );
    }

    #[test]
    fn click_rejects_malformed_input() {
        assert!(parse_click("30:120").is_err());
        assert!(parse_click("x:1:2").is_err());
        assert!(parse_click("1:2:3:4").is_err());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "steer",
            "--agents",
            "9",
            "--topology",
            "4,8,8,2",
            "--target",
            "10,-20",
            "--click",
            "5:1:2",
            "--parallel",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.num_agents, 9);
        assert_eq!(config.topology, vec![4, 8, 8, 2]);
        assert_eq!(config.initial_target, [10.0, -20.0]);
        assert!(config.parallel_tick);
        assert_eq!(cli.clicks.len(), 1);
        assert_eq!(cli.steps, 600);
    }

    #[test]
    fn invalid_topology_flag_is_reported() {
        let cli = Cli::parse_from(["steer", "--topology", "3,2"]);
        let err = build_config(&cli).unwrap_err();
        assert!(format!("{err:#}").contains("input layer"));
    }
}
