//! Objective selection: what the next decision should try to achieve
//!
//! Priorities, first match wins: activate the fault, propagate it through
//! the D-frontier, justify a J-frontier gate. When none of these yields an
//! assignable line, the decision engine has to backtrack.

use log::debug;

use crate::atpg::backtrace::{best_final_objective, multiple_backtrace};
use crate::atpg::frontier::{justification_objectives, propagation_objectives, Frontiers};
use crate::circuit::{Circuit, LineId};

/// Outcome of objective selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Try this value on this line next
    Assign(LineId, bool),
    /// Nothing left to try from this state
    NoProgress,
}

/// Choose what the next decision should try, in priority order
pub fn next_objective(circuit: &Circuit, frontiers: &Frontiers) -> NextStep {
    // 1. the fault must be activated before anything can propagate
    if let Some(fault) = circuit.fault() {
        let site = circuit.line(fault.line);
        if !site.is_assigned() {
            let target = !fault.stuck_at;
            debug!(
                "activating fault: {} stuck-at-{} needs {}",
                site.name, fault.stuck_at as u8, target as u8
            );
            if site.is_input() || site.is_head_line {
                return NextStep::Assign(fault.line, target);
            }
            let finals = multiple_backtrace(circuit, &[(fault.line, target)]);
            return match best_final_objective(&finals) {
                Some((line, value)) => NextStep::Assign(line, value),
                None => NextStep::NoProgress,
            };
        }
    }

    // 2. drive the fault effect toward an output
    if let Some(gate) = frontiers.select_d_gate(circuit) {
        debug!("propagating through {}", circuit.gate(gate).name);
        let initial = propagation_objectives(circuit, gate);
        if !initial.is_empty() {
            let finals = multiple_backtrace(circuit, &initial);
            if let Some((line, value)) = best_final_objective(&finals) {
                return NextStep::Assign(line, value);
            }
        }
    }

    // 3. justify an assigned-but-unsupported output
    if let Some(gate) = frontiers.select_j_gate(circuit) {
        debug!("justifying {}", circuit.gate(gate).name);
        let initial = justification_objectives(circuit, gate);
        if !initial.is_empty() {
            let finals = multiple_backtrace(circuit, &initial);
            if let Some((line, value)) = best_final_objective(&finals) {
                return NextStep::Assign(line, value);
            }
        }
    }

    NextStep::NoProgress
}
