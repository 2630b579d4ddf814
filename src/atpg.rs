//! Test pattern generation
//!
//! The driver owns the search state for one circuit: the preprocessed
//! topology, the frontiers, the decision stack and the statistics. One
//! `find_test` call handles one fault; `generate_all_tests` sweeps both
//! polarities of every candidate line.

pub mod backtrace;
pub mod decision;
pub mod frontier;
pub mod implication;
pub mod objective;
pub mod sensitization;

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use kdam::{tqdm, BarExt};
use log::{debug, info};
use thiserror::Error;

use crate::atpg::decision::DecisionNode;
use crate::atpg::frontier::Frontiers;
use crate::atpg::implication::{imply, ImplyFailure};
use crate::circuit::{BuildError, Circuit, Fault, LineKind, Topology};
use crate::logic::LogicValue;

/// Primary-input assignment detecting a fault; unconstrained inputs are X
pub type TestVector = BTreeMap<String, LogicValue>;

/// Result of searching for a single fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The assignment distinguishes the faulty circuit
    Test(TestVector),
    /// The search space is exhausted: the fault is redundant
    Undetectable,
}

/// Hard failures of the generator. Exhausted searches are not errors; these
/// indicate a broken netlist or a bug in the engine itself.
#[derive(Debug, Error)]
pub enum AtpgError {
    /// The circuit failed structural validation
    #[error(transparent)]
    Build(#[from] BuildError),
    /// The implication engine tripped its iteration bound
    #[error("implication did not reach a fixed point within its iteration bound")]
    ImplicationDiverged,
    /// The main loop tripped its iteration bound
    #[error("search iteration limit reached for fault {0}")]
    SearchLimit(String),
}

/// Counters for one `find_test` run
#[derive(Debug, Clone, Copy, Default)]
pub struct Stats {
    /// Decisions attempted
    pub decisions: u64,
    /// Backtrack operations performed
    pub backtracks: u64,
    /// Implication fixed points computed
    pub implications: u64,
    /// Deepest decision stack seen
    pub max_stack_depth: usize,
    /// Wall-clock time spent
    pub elapsed: Duration,
}

impl Stats {
    fn absorb(&mut self, other: &Stats) {
        self.decisions += other.decisions;
        self.backtracks += other.backtracks;
        self.implications += other.implications;
        self.max_stack_depth = self.max_stack_depth.max(other.max_stack_depth);
        self.elapsed += other.elapsed;
    }
}

/// Upper bound on decisions per fault; a safety net for the main loop
const MAX_SEARCH_ITERATIONS: usize = 10_000;

/// Search engine for one circuit. Topology is computed once and reused
/// across faults; values, frontiers and the stack reset per fault.
pub struct TestGenerator<'a> {
    pub(crate) circuit: &'a mut Circuit,
    pub(crate) topo: Topology,
    pub(crate) frontiers: Frontiers,
    pub(crate) stack: Vec<DecisionNode>,
    pub(crate) stats: Stats,
}

impl<'a> TestGenerator<'a> {
    /// Validate the circuit and run topology analysis
    pub fn new(circuit: &'a mut Circuit) -> Result<TestGenerator<'a>, AtpgError> {
        circuit.validate()?;
        let topo = Topology::analyze(circuit)?;
        Ok(TestGenerator {
            circuit,
            topo,
            frontiers: Frontiers::new(),
            stack: Vec::new(),
            stats: Stats::default(),
        })
    }

    /// Counters of the most recent run
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// The preprocessed structural tables
    pub fn topology(&self) -> &Topology {
        &self.topo
    }

    /// Find a primary-input assignment that detects the given fault, or
    /// prove that none exists.
    pub fn find_test(&mut self, fault: Fault) -> Result<Outcome, AtpgError> {
        let started = Instant::now();
        let name = self.fault_name(fault);
        info!("searching test for {}", name);

        self.circuit.reset_values();
        self.stack.clear();
        self.stats = Stats::default();
        self.circuit.inject_fault(fault);

        self.stats.implications += 1;
        match imply(self.circuit, &self.topo, &mut self.frontiers) {
            Ok(()) => {}
            Err(ImplyFailure::Conflict(c)) => {
                debug!("initial implication conflicts: {}", c);
                self.stats.elapsed = started.elapsed();
                self.log_stats(&name, false);
                return Ok(Outcome::Undetectable);
            }
            Err(ImplyFailure::Diverged) => return Err(AtpgError::ImplicationDiverged),
        }

        for _ in 0..MAX_SEARCH_ITERATIONS {
            if self.circuit.test_found() {
                self.stats.elapsed = started.elapsed();
                self.log_stats(&name, true);
                return Ok(Outcome::Test(self.circuit.current_test()));
            }
            self.stats.decisions += 1;
            let progress = self.make_decision()?;
            self.stats.max_stack_depth = self.stats.max_stack_depth.max(self.stack.len());
            if !progress {
                self.stats.elapsed = started.elapsed();
                self.log_stats(&name, false);
                return Ok(Outcome::Undetectable);
            }
        }
        Err(AtpgError::SearchLimit(name))
    }

    /// Run `find_test` for both polarities of every line that is not a
    /// primary output. Detected faults map to their vector under the key
    /// `<line>/<polarity>`; redundant faults are left out.
    pub fn generate_all_tests(&mut self) -> Result<BTreeMap<String, TestVector>, AtpgError> {
        let candidates: Vec<Fault> = self
            .circuit
            .lines()
            .filter(|l| l.kind != LineKind::PrimaryOutput)
            .flat_map(|l| {
                [
                    Fault { line: l.id, stuck_at: false },
                    Fault { line: l.id, stuck_at: true },
                ]
            })
            .collect();

        let mut tests = BTreeMap::new();
        let mut undetectable = 0usize;
        let mut total = Stats::default();
        let mut progress = tqdm!(total = candidates.len());
        progress.set_description("Faults");
        for fault in candidates {
            let name = self.fault_name(fault);
            match self.find_test(fault)? {
                Outcome::Test(vector) => {
                    tests.insert(name, vector);
                }
                Outcome::Undetectable => undetectable += 1,
            }
            total.absorb(&self.stats);
            progress.update(1).ok();
        }
        eprintln!();

        let attempted = tests.len() + undetectable;
        info!(
            "generated {} tests, {} undetectable faults ({:.2}% coverage)",
            tests.len(),
            undetectable,
            100.0 * tests.len() as f64 / attempted.max(1) as f64
        );
        info!(
            "totals: {} decisions, {} backtracks, {} implications in {:?}",
            total.decisions, total.backtracks, total.implications, total.elapsed
        );
        self.stats = total;
        Ok(tests)
    }

    pub(crate) fn fault_name(&self, fault: Fault) -> String {
        format!(
            "{}/{}",
            self.circuit.line(fault.line).name,
            fault.stuck_at as u8
        )
    }

    fn log_stats(&self, fault: &str, found: bool) {
        info!(
            "{}: {} ({} decisions, {} backtracks, {} implications, depth {}, {:?})",
            fault,
            if found { "test found" } else { "undetectable" },
            self.stats.decisions,
            self.stats.backtracks,
            self.stats.implications,
            self.stats.max_stack_depth,
            self.stats.elapsed
        );
    }
}
