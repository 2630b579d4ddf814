//! Command line interface

use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Parser};
use env_logger::Target;
use log::{info, LevelFilter};

use crate::atpg::{Outcome, TestGenerator, TestVector};
use crate::compact::compact_tests;
use crate::io::{parse_fault, read_circuit_file, write_vector_file};

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about = "FAN-based test pattern generation for combinational circuits", long_about = None)]
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .args(["fault", "all"]),
))]
pub struct Cli {
    /// Circuit netlist in bench format
    #[arg(long)]
    pub circuit: PathBuf,

    /// Single fault to target, written <line>/<0|1>
    #[arg(long)]
    pub fault: Option<String>,

    /// Target both polarities of every line
    #[arg(long)]
    pub all: bool,

    /// Output file for the test vectors
    #[arg(long, default_value = "tests.txt")]
    pub output: PathBuf,

    /// Merge compatible test vectors before writing them
    #[arg(long)]
    pub compact: bool,

    /// Verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Log to this file instead of standard error
    #[arg(long)]
    pub log: Option<PathBuf>,
}

/// Initialize the logger according to the command line
pub fn init_logger(cli: &Cli) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
    if let Some(path) = &cli.log {
        let file = File::create(path)
            .with_context(|| format!("cannot create log file {}", path.display()))?;
        builder.target(Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

/// Run test generation as requested and write the vector file
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut circuit = read_circuit_file(&cli.circuit)
        .with_context(|| format!("failed to read {}", cli.circuit.display()))?;
    info!(
        "parsed {}: {} lines, {} gates, {} inputs, {} outputs",
        cli.circuit.display(),
        circuit.nb_lines(),
        circuit.nb_gates(),
        circuit.primary_inputs().len(),
        circuit.primary_outputs().len()
    );

    let single = cli
        .fault
        .as_deref()
        .map(|text| parse_fault(text, &circuit))
        .transpose()?;

    let tests: BTreeMap<String, TestVector> = {
        let mut generator = TestGenerator::new(&mut circuit)?;
        match single {
            Some(fault) => {
                let name = cli.fault.clone().unwrap();
                match generator.find_test(fault)? {
                    Outcome::Test(vector) => BTreeMap::from([(name, vector)]),
                    Outcome::Undetectable => {
                        info!("fault {} is undetectable", name);
                        BTreeMap::new()
                    }
                }
            }
            None => generator.generate_all_tests()?,
        }
    };

    let rows: Vec<(String, TestVector)> = if cli.compact {
        compact_tests(&tests)
            .into_iter()
            .map(|(faults, vector)| (faults.join(", "), vector))
            .collect()
    } else {
        tests.into_iter().collect()
    };

    info!("writing {} vectors to {}", rows.len(), cli.output.display());
    write_vector_file(&cli.output, &circuit, &rows)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    Ok(())
}
