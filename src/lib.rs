//! Test pattern generation for combinational logic
//!
//! Fantail generates input vectors that detect single stuck-at faults in
//! gate-level netlists, using the FAN search strategy: five-valued
//! implication to a fixed point, multiple backtrace to head lines, unique
//! sensitization along dominator paths, and chronological backtracking.
//!
//! # Usage
//!
//! The command line tool reads bench-format netlists:
//! ```bash
//! fantail --circuit adder.bench --fault sum3/0
//! fantail --circuit adder.bench --all --compact --output adder.test
//! ```
//!
//! As a library, build a [`Circuit`], hand it to a [`TestGenerator`] and
//! ask for tests:
//! ```
//! # use fantail::{Circuit, Fault, GateKind, TestGenerator, Outcome};
//! let mut circuit = Circuit::new();
//! let a = circuit.declare_input("a");
//! let b = circuit.declare_input("b");
//! let y = circuit.declare_output("y");
//! circuit.add_gate(GateKind::And, vec![a, b], y).unwrap();
//!
//! let mut generator = TestGenerator::new(&mut circuit).unwrap();
//! let result = generator.find_test(Fault { line: a, stuck_at: false }).unwrap();
//! assert!(matches!(result, Outcome::Test(_)));
//! ```
//!
//! The engine handles combinational logic and the single stuck-at fault
//! model only. Faults are processed one at a time; runs on separate
//! circuits are independent and may be parallelized by the caller.

#![warn(missing_docs)]

pub mod atpg;
pub mod circuit;
pub mod cmd;
pub mod compact;
pub mod io;
pub mod logic;

pub use atpg::{AtpgError, Outcome, Stats, TestGenerator, TestVector};
pub use circuit::{BuildError, Circuit, Fault, Gate, GateId, Line, LineId, LineKind, Topology};
pub use logic::{GateKind, LogicValue};
