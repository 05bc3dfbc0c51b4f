use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueHint};
use serde::de::DeserializeOwned;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use ringlight::board::{plan_board, BoardFrame};
use ringlight::power::StringSupply;
use ringlight::summary::DesignSummary;
use ringlight::{find_min_divisible_design, ParameterSet, RingLightDesign, SearchRequest};

#[derive(Parser)]
#[command(author, version, about = "Ring light geometry and divisor-constrained design search")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search for the design closest to the base whose light count divides evenly
    Search {
        /// Search request (JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        request: PathBuf,

        /// Write the winning parameters (with divisor) to this file
        #[arg(long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },

    /// Print the board placement plan for a parameter file
    Place {
        /// Parameters (JSON) with the divisor attached
        #[arg(value_hint = ValueHint::FilePath)]
        params: PathBuf,

        /// Board frame overrides (JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        frame: Option<PathBuf>,

        /// Number of mounting holes
        #[arg(long, default_value_t = 4)]
        mount_holes: usize,
    },

    /// Print the LED string power budget
    Power {
        /// Total number of LEDs on the board
        #[arg(long)]
        leds: Option<usize>,

        /// Supply overrides (JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        supply: Option<PathBuf>,
    },
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn run_search(request: &Path, out: Option<&Path>) -> Result<()> {
    let request: SearchRequest = read_json(request)?;
    let result = find_min_divisible_design(&request)?;
    println!("{}", DesignSummary::new(&result)?);

    if let Some(out) = out {
        let json = serde_json::to_string_pretty(&result.params)?;
        fs::write(out, json).with_context(|| format!("writing {}", out.display()))?;
        info!(path = %out.display(), "wrote parameters");
    }
    Ok(())
}

fn run_place(params: &Path, frame: Option<&Path>, mount_holes: usize) -> Result<()> {
    let params: ParameterSet = read_json(params)?;
    let frame = match frame {
        Some(path) => read_json(path)?,
        None => BoardFrame::default(),
    };
    let design = RingLightDesign::new(params)?;
    let plan = plan_board(&design, &frame, mount_holes)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

fn run_power(leds: Option<usize>, supply: Option<&Path>) -> Result<()> {
    let supply = match supply {
        Some(path) => read_json(path)?,
        None => StringSupply::default(),
    };
    let budget = supply.budget()?;
    println!("strings");
    println!("----------------------------------");
    println!("leds per string:  {}", budget.leds_per_string);
    println!("operating curr:   {:.3}(A)", budget.operating_current);
    println!("led forward volt: {:.3}(V)", budget.forward_voltage);
    println!("resistor volt:    {:.3}(V)", budget.resistor_voltage);
    println!("resistor power:   {:.3}(W)", budget.resistor_power);
    println!("resistor value:   {:.0}(Ohm)", budget.resistor_value);

    if let Some(leds) = leds {
        let board = supply.board_power(leds)?;
        println!();
        println!("full light");
        println!("----------------------------------");
        println!("number strings: {}", board.strings);
        println!("total current:  {:.3}(A)", board.total_current);
        println!("total power:    {:.3}(W)", board.total_power);
    }
    Ok(())
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Search { request, out } => run_search(&request, out.as_deref()),
        Command::Place {
            params,
            frame,
            mount_holes,
        } => run_place(&params, frame.as_deref(), mount_holes),
        Command::Power { leds, supply } => run_power(leds, supply.as_deref()),
    }
}
