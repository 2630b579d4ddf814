//! Decision stack and chronological backtracking
//!
//! Each decision tries a preferred binary value on a line; on conflict the
//! complement is tried against the same snapshot; when both fail the stack
//! unwinds. Rolling back an attempt restores a full value snapshot; undoing
//! a committed decision rebuilds the circuit from the remaining stack.

use log::{debug, trace};

use crate::atpg::implication::{imply, x_path_exists, ImplyFailure};
use crate::atpg::objective::{next_objective, NextStep};
use crate::atpg::{AtpgError, TestGenerator};
use crate::circuit::LineId;
use crate::logic::LogicValue;

/// One entry of the decision stack
#[derive(Debug, Clone, Copy)]
pub struct DecisionNode {
    /// The decided line
    pub line: LineId,
    /// Value currently applied
    pub value: bool,
    /// The complementary value
    pub alternative: bool,
    /// Whether the alternative has already been attempted
    pub tried_alternative: bool,
}

impl TestGenerator<'_> {
    /// Pick the next objective and commit a consistent value for it.
    /// Returns false when the search space is exhausted.
    pub(crate) fn make_decision(&mut self) -> Result<bool, AtpgError> {
        let (line, value) = match next_objective(self.circuit, &self.frontiers) {
            NextStep::Assign(line, value) => (line, value),
            NextStep::NoProgress => {
                debug!("no objective available, backtracking");
                return self.backtrack();
            }
        };
        debug!(
            "decision {}: {} = {}",
            self.stack.len(),
            self.circuit.line(line).name,
            value as u8
        );

        if self.try_value(line, value)? {
            self.stack.push(DecisionNode {
                line,
                value,
                alternative: !value,
                tried_alternative: false,
            });
            return Ok(true);
        }

        trace!("preferred value failed, trying the complement");
        if self.try_value(line, !value)? {
            self.stack.push(DecisionNode {
                line,
                value: !value,
                alternative: value,
                tried_alternative: true,
            });
            return Ok(true);
        }

        debug!("both polarities failed for {}", self.circuit.line(line).name);
        self.backtrack()
    }

    /// Apply a value and run implication against a snapshot. A conflict, or
    /// a non-empty D-frontier with no X-path left to any output, rolls the
    /// snapshot back and reports failure.
    pub(crate) fn try_value(&mut self, line: LineId, value: bool) -> Result<bool, AtpgError> {
        let snapshot = self.circuit.snapshot_values();
        self.circuit.assign(line, LogicValue::from_bool(value));
        self.stats.implications += 1;
        match imply(self.circuit, &self.topo, &mut self.frontiers) {
            Ok(()) => {}
            Err(ImplyFailure::Conflict(conflict)) => {
                trace!(
                    "{} = {} conflicts: {}",
                    self.circuit.line(line).name,
                    value as u8,
                    conflict
                );
                self.circuit.restore_values(&snapshot);
                self.frontiers.recompute(self.circuit);
                return Ok(false);
            }
            Err(ImplyFailure::Diverged) => return Err(AtpgError::ImplicationDiverged),
        }

        if !self.frontiers.d_frontier().is_empty() && !x_path_exists(self.circuit) {
            trace!("no X-path from the fault effect to any output");
            self.circuit.restore_values(&snapshot);
            self.frontiers.recompute(self.circuit);
            return Ok(false);
        }
        Ok(true)
    }

    /// Chronological backtrack: pop decisions until one with an untried
    /// alternative can be re-applied on a rebuilt circuit. Returns false
    /// when the stack empties, proving the fault undetectable.
    pub(crate) fn backtrack(&mut self) -> Result<bool, AtpgError> {
        self.stats.backtracks += 1;
        loop {
            let Some(mut node) = self.stack.pop() else {
                debug!("decision stack exhausted");
                return Ok(false);
            };
            if node.tried_alternative {
                continue;
            }
            debug!(
                "backtracking to {}, trying {}",
                self.circuit.line(node.line).name,
                node.alternative as u8
            );
            if !self.rebuild_from_stack()? {
                // the remaining prefix is itself inconsistent; keep popping
                continue;
            }
            if self.try_value(node.line, node.alternative)? {
                node.value = node.alternative;
                node.tried_alternative = true;
                self.stack.push(node);
                return Ok(true);
            }
        }
    }

    /// Reconstruct the circuit state implied by the current stack: reset,
    /// re-inject the fault, replay every decision, re-imply.
    fn rebuild_from_stack(&mut self) -> Result<bool, AtpgError> {
        self.circuit.reset_values();
        if let Some(fault) = self.circuit.fault() {
            self.circuit.inject_fault(fault);
        }
        for i in 0..self.stack.len() {
            let node = self.stack[i];
            self.circuit.assign(node.line, LogicValue::from_bool(node.value));
        }
        self.stats.implications += 1;
        match imply(self.circuit, &self.topo, &mut self.frontiers) {
            Ok(()) => Ok(true),
            Err(ImplyFailure::Conflict(_)) => Ok(false),
            Err(ImplyFailure::Diverged) => Err(AtpgError::ImplicationDiverged),
        }
    }
}
