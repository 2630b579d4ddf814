//! Reading netlists and faults, writing test vectors

mod bench;
mod fault;
mod vectors;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use thiserror::Error;

pub use bench::read_bench;
pub use fault::parse_fault;
pub use vectors::{read_vectors, write_vectors};

use crate::atpg::TestVector;
use crate::circuit::{BuildError, Circuit};

/// Failures of the textual front end: I/O, malformed statements, and the
/// structural inconsistencies surfaced when the parsed graph is validated.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Underlying file error
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A statement that cannot be parsed
    #[error("line {line}: {message}")]
    Syntax {
        /// 1-based source line
        line: usize,
        /// What went wrong
        message: String,
    },
    /// A fault names a line the netlist does not define
    #[error("unknown line {0}")]
    UnknownLine(String),
    /// A fault description that is not `<line>/<0|1>`
    #[error("invalid fault description {0:?}, expected <line>/<0|1>")]
    InvalidFault(String),
    /// The parsed graph failed validation
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Read a circuit from a bench-format netlist file
pub fn read_circuit_file(path: &Path) -> Result<Circuit, ParseError> {
    let file = File::open(path)?;
    read_bench(file)
}

/// Write labelled test vectors to a file
pub fn write_vector_file(
    path: &Path,
    circuit: &Circuit,
    rows: &[(String, TestVector)],
) -> Result<(), ParseError> {
    let mut file = BufWriter::new(File::create(path)?);
    write_vectors(&mut file, circuit, rows)?;
    Ok(())
}
