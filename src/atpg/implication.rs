//! Implication engine: forward simulation and backward justification driven
//! to a fixed point, with conflict detection and the X-path cutoff

use std::collections::VecDeque;

use log::trace;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::atpg::frontier::Frontiers;
use crate::atpg::sensitization::unique_sensitization;
use crate::circuit::{Circuit, GateId, LineId, Topology};
use crate::logic::{GateKind, LogicValue};

/// Iterations of the fixed-point loop before declaring divergence. Each
/// iteration assigns at least one line or terminates, so any circuit that
/// trips this bound has exposed a bug, not a hard input.
const MAX_IMPLY_ITERATIONS: usize = 100;

/// A logical contradiction found while propagating assignments. Conflicts
/// are routine search events: the caller rolls back to its snapshot and
/// tries something else.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// Evaluated and assigned output values disagree
    #[error("gate {0} evaluates differently from its assigned output")]
    GateInconsistent(GateId),
    /// The good value at the site equals the stuck polarity
    #[error("fault site {0} carries its stuck-at value in the good circuit")]
    FaultMasked(LineId),
    /// The site carries the D/D' value of the opposite fault
    #[error("fault site {0} holds a faulty value of the wrong polarity")]
    FaultPolarity(LineId),
    /// A faulty value exists but can no longer reach any output
    #[error("fault effect is blocked: no faulty output and empty D-frontier")]
    PropagationBlocked,
    /// Backward justification hit an incompatible assignment
    #[error("justification would overwrite the assigned value of line {0}")]
    JustificationContradiction(LineId),
}

/// Why an `imply` call did not reach a clean fixed point
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImplyFailure {
    /// Routine contradiction; roll back and continue the search
    Conflict(Conflict),
    /// The iteration bound tripped — an implementation bug
    Diverged,
}

/// Propagate all consequences of the current assignments: alternate forward
/// simulation and backward justification, recompute the frontiers, and
/// apply unique sensitization whenever the D-frontier narrows to a single
/// gate, until nothing changes or a conflict surfaces.
pub fn imply(
    circuit: &mut Circuit,
    topo: &Topology,
    frontiers: &mut Frontiers,
) -> Result<(), ImplyFailure> {
    for iteration in 0..MAX_IMPLY_ITERATIONS {
        trace!("implication iteration {}", iteration);
        let mut changed = false;
        while circuit.simulate_forward() {
            changed = true;
        }
        loop {
            let justified = justify_backward(circuit).map_err(ImplyFailure::Conflict)?;
            if !justified {
                break;
            }
            changed = true;
        }
        frontiers.recompute(circuit);

        if let [gate] = frontiers.d_frontier() {
            if unique_sensitization(circuit, topo, *gate) {
                changed = true;
                frontiers.recompute(circuit);
            }
        }

        if let Some(conflict) = has_conflict(circuit, frontiers) {
            trace!("conflict: {}", conflict);
            return Err(ImplyFailure::Conflict(conflict));
        }
        if !changed {
            return Ok(());
        }
    }
    Err(ImplyFailure::Diverged)
}

/// One backward-justification pass: derive input values forced by assigned
/// outputs. Only the non-controlling binary cases imply anything; a
/// controlling output cannot pick which input caused it, and parity gates
/// are out of scope for backward reasoning.
fn justify_backward(circuit: &mut Circuit) -> Result<bool, Conflict> {
    let mut changed = false;
    // netlists list gates roughly input-to-output; walking them in reverse
    // lets a justification chain collapse in one pass
    for gi in (0..circuit.nb_gates()).rev() {
        let id = GateId(gi as u32);
        let output = circuit.gate(id).output;
        let out_value = circuit.line(output).value;
        if !out_value.is_assigned() {
            continue;
        }
        let kind = circuit.gate(id).kind;
        match kind {
            GateKind::Not | GateKind::Buf => {
                let input = circuit.gate(id).inputs[0];
                let wanted = if kind == GateKind::Not {
                    out_value.invert()
                } else {
                    out_value
                };
                if !circuit.line(input).is_assigned() {
                    circuit.assign(input, wanted);
                    changed = true;
                }
            }
            GateKind::And | GateKind::Nand | GateKind::Or | GateKind::Nor => {
                // positive-form output: is every input forced non-controlling?
                let wanted = if kind.is_inverting() {
                    out_value.invert()
                } else {
                    out_value
                };
                let nc = kind.non_controlling_value().unwrap();
                if wanted != nc {
                    continue;
                }
                let controlling = kind.controlling_value().unwrap();
                let inputs = circuit.gate(id).inputs.clone();
                for input in inputs {
                    let line = circuit.line(input);
                    if line.value == controlling {
                        return Err(Conflict::JustificationContradiction(input));
                    }
                    if !line.is_assigned() {
                        circuit.assign(input, nc);
                        changed = true;
                    }
                }
            }
            GateKind::Xor | GateKind::Xnor => {}
        }
    }
    Ok(changed)
}

/// Scan for the conflict conditions that end an implication pass
pub fn has_conflict(circuit: &Circuit, frontiers: &Frontiers) -> Option<Conflict> {
    // a fault site whose good projection equals the stuck polarity can
    // never be activated; a faulty value of the wrong polarity is the same
    // contradiction wearing D/D' clothes
    if let Some(fault) = circuit.fault() {
        let line = circuit.line(fault.line);
        if line.is_assigned() {
            let good = line.value.good_value();
            if good == LogicValue::from_bool(fault.stuck_at) {
                return Some(if line.is_faulty() {
                    Conflict::FaultPolarity(fault.line)
                } else {
                    Conflict::FaultMasked(fault.line)
                });
            }
        }
    }

    for gate in circuit.gates() {
        if gate.all_inputs_assigned(circuit) && circuit.line(gate.output).is_assigned() {
            // a gate driving the fault site legitimately disagrees with its
            // output; compare through the same conversion assignment uses
            let expected = circuit.faulted_value(gate.output, gate.evaluate(circuit));
            if expected.is_assigned() && expected != circuit.line(gate.output).value {
                return Some(Conflict::GateInconsistent(gate.id));
            }
        }
    }

    if frontiers.d_frontier().is_empty() && !circuit.test_found() {
        let any_faulty = circuit.lines().any(|l| l.is_faulty());
        if any_faulty {
            return Some(Conflict::PropagationBlocked);
        }
    }

    None
}

/// Whether some faulty line still has a forward path to a primary output on
/// which every gate can be sensitized: no side input assigned to the
/// controlling value and no assigned non-faulty value on the way. Used as
/// an early cutoff to refute hopeless decisions.
pub fn x_path_exists(circuit: &Circuit) -> bool {
    let mut queue: VecDeque<LineId> = circuit
        .lines()
        .filter(|l| l.is_faulty())
        .map(|l| l.id)
        .collect();
    if queue.is_empty() {
        return false;
    }

    let mut visited: FxHashSet<LineId> = FxHashSet::default();
    while let Some(current) = queue.pop_front() {
        if circuit.line(current).is_output() {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        for &g in &circuit.line(current).fanouts {
            let gate = circuit.gate(g);
            let out = circuit.line(gate.output);
            if out.is_assigned() && !out.is_faulty() {
                continue;
            }
            let blocked = gate.kind.controlling_value().is_some_and(|controlling| {
                gate.inputs
                    .iter()
                    .any(|&l| l != current && circuit.line(l).value == controlling)
            });
            if !blocked && !visited.contains(&gate.output) {
                queue.push_back(gate.output);
            }
        }
    }
    false
}
