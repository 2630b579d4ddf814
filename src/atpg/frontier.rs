//! D- and J-frontier bookkeeping
//!
//! Both frontiers are recomputed from scratch after every implication
//! fixed point; membership is a pure function of the current line values.

use log::trace;

use crate::circuit::{Circuit, GateId, LineId};
use crate::logic::{GateKind, LogicValue};

/// The two work lists driving the search: gates through which the fault can
/// still propagate, and gates whose assigned output is not yet justified.
#[derive(Debug, Clone, Default)]
pub struct Frontiers {
    d: Vec<GateId>,
    j: Vec<GateId>,
}

impl Frontiers {
    /// Two empty frontiers
    pub fn new() -> Frontiers {
        Frontiers::default()
    }

    /// Gates a fault effect can still pass through
    pub fn d_frontier(&self) -> &[GateId] {
        &self.d
    }

    /// Gates whose assigned output still needs input support
    pub fn j_frontier(&self) -> &[GateId] {
        &self.j
    }

    /// Rescan all gates and rebuild both frontiers, keeping the per-gate
    /// D-frontier flag in sync.
    pub fn recompute(&mut self, circuit: &mut Circuit) {
        self.d.clear();
        self.j.clear();
        for i in 0..circuit.nb_gates() {
            let id = GateId(i as u32);
            let gate = circuit.gate(id);
            let in_d = gate.has_faulty_input(circuit)
                && !circuit.line(gate.output).is_assigned()
                && gate.is_sensitizable(circuit);
            let in_j = circuit.line(gate.output).is_assigned()
                && gate.inputs.iter().any(|&l| !circuit.line(l).is_assigned());
            circuit.gate_mut(id).in_d_frontier = in_d;
            if in_d {
                self.d.push(id);
            }
            if in_j {
                self.j.push(id);
            }
        }
        trace!(
            "frontiers: {} in D-frontier, {} in J-frontier",
            self.d.len(),
            self.j.len()
        );
    }

    /// Gate to propagate through: fewest inputs, id on ties
    pub fn select_d_gate(&self, circuit: &Circuit) -> Option<GateId> {
        self.d
            .iter()
            .copied()
            .min_by_key(|&g| (circuit.gate(g).inputs.len(), g))
    }

    /// Gate to justify: fewest unassigned inputs, id on ties
    pub fn select_j_gate(&self, circuit: &Circuit) -> Option<GateId> {
        self.j
            .iter()
            .copied()
            .min_by_key(|&g| (circuit.gate(g).unassigned_inputs(circuit), g))
    }
}

/// Objectives that sensitize the chosen D-frontier gate: every unassigned
/// non-faulty input goes to the non-controlling value. Xor and Xnor have no
/// controlling value and yield nothing; their propagation is unguided.
pub fn propagation_objectives(circuit: &Circuit, gate: GateId) -> Vec<(LineId, bool)> {
    let gate = circuit.gate(gate);
    let Some(nc) = gate.kind.non_controlling_value() else {
        return Vec::new();
    };
    let nc = nc.to_bool().unwrap();
    gate.inputs
        .iter()
        .copied()
        .filter(|&l| {
            let line = circuit.line(l);
            !line.is_faulty() && !line.is_assigned()
        })
        .map(|l| (l, nc))
        .collect()
}

/// Objectives that justify the chosen J-frontier gate's output value
pub fn justification_objectives(circuit: &Circuit, gate: GateId) -> Vec<(LineId, bool)> {
    let gate = circuit.gate(gate);
    let output = circuit.line(gate.output).value;
    let unassigned = || {
        gate.inputs
            .iter()
            .copied()
            .filter(|&l| !circuit.line(l).is_assigned())
    };

    match gate.kind {
        GateKind::And | GateKind::Nand => {
            // map to the positive form: Nand inverts the requested output
            let wanted = if gate.kind == GateKind::Nand {
                output.invert()
            } else {
                output
            };
            match wanted {
                LogicValue::One => unassigned().map(|l| (l, true)).collect(),
                LogicValue::Zero => unassigned().take(1).map(|l| (l, false)).collect(),
                _ => Vec::new(),
            }
        }
        GateKind::Or | GateKind::Nor => {
            let wanted = if gate.kind == GateKind::Nor {
                output.invert()
            } else {
                output
            };
            match wanted {
                LogicValue::Zero => unassigned().map(|l| (l, false)).collect(),
                LogicValue::One => unassigned().take(1).map(|l| (l, true)).collect(),
                _ => Vec::new(),
            }
        }
        GateKind::Not => match output.invert().to_bool() {
            Some(v) => unassigned().map(|l| (l, v)).collect(),
            None => Vec::new(),
        },
        GateKind::Buf => match output.to_bool() {
            Some(v) => unassigned().map(|l| (l, v)).collect(),
            None => Vec::new(),
        },
        // justification objectives for parity gates are not derived here
        GateKind::Xor | GateKind::Xnor => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Fault;
    use crate::logic::GateKind::*;
    use crate::logic::LogicValue::*;

    fn two_gate() -> (Circuit, LineId, LineId, LineId, LineId, LineId) {
        // w = AND(a, b); y = OR(w, c)
        let mut c = Circuit::new();
        let a = c.declare_input("a");
        let b = c.declare_input("b");
        let cc = c.declare_input("c");
        let w = c.ensure_line("w");
        let y = c.declare_output("y");
        c.add_gate(And, vec![a, b], w).unwrap();
        c.add_gate(Or, vec![w, cc], y).unwrap();
        (c, a, b, cc, w, y)
    }

    #[test]
    fn test_d_frontier_membership() {
        let (mut c, a, b, _cc, _w, _y) = two_gate();
        c.inject_fault(Fault { line: a, stuck_at: false });
        c.assign(a, One);
        let mut f = Frontiers::new();
        f.recompute(&mut c);
        // the And gate has a faulty input, X output, X side input
        assert_eq!(f.d_frontier(), &[GateId(0)]);
        assert!(c.gate(GateId(0)).in_d_frontier);
        // a controlling side value evicts it
        c.assign(b, Zero);
        f.recompute(&mut c);
        assert!(f.d_frontier().is_empty());
        assert!(!c.gate(GateId(0)).in_d_frontier);
    }

    #[test]
    fn test_j_frontier_membership() {
        let (mut c, _a, _b, _cc, w, y) = two_gate();
        c.assign(y, One);
        let mut f = Frontiers::new();
        f.recompute(&mut c);
        assert_eq!(f.j_frontier(), &[GateId(1)]);
        c.assign(w, One);
        f.recompute(&mut c);
        // the Or gate still has the unassigned input c
        assert_eq!(f.j_frontier(), &[GateId(1)]);
    }

    #[test]
    fn test_selection_prefers_fewer_inputs() {
        // w = AND(a, b, c); v = NOT(a); y = OR(w, v)
        let mut c = Circuit::new();
        let a = c.declare_input("a");
        let b = c.declare_input("b");
        let cc = c.declare_input("c");
        let w = c.ensure_line("w");
        let v = c.ensure_line("v");
        let y = c.declare_output("y");
        c.add_gate(And, vec![a, b, cc], w).unwrap();
        let not_gate = c.add_gate(Not, vec![a], v).unwrap();
        c.add_gate(Or, vec![w, v], y).unwrap();
        c.inject_fault(Fault { line: a, stuck_at: false });
        c.assign(a, One);
        let mut f = Frontiers::new();
        f.recompute(&mut c);
        assert_eq!(f.d_frontier().len(), 2);
        assert_eq!(f.select_d_gate(&c), Some(not_gate));
    }

    #[test]
    fn test_propagation_objectives() {
        let (mut c, a, b, _cc, _w, _y) = two_gate();
        c.inject_fault(Fault { line: a, stuck_at: false });
        c.assign(a, One);
        let objs = propagation_objectives(&c, GateId(0));
        assert_eq!(objs, vec![(b, true)]);
    }

    #[test]
    fn test_justification_objectives() {
        let (mut c, a, b, cc, w, y) = two_gate();
        c.assign(w, One);
        // And with output 1: every input must be 1
        assert_eq!(
            justification_objectives(&c, GateId(0)),
            vec![(a, true), (b, true)]
        );
        c.assign(y, One);
        c.assign(w, Zero);
        // Or with output 1: one input suffices, the first unassigned is taken
        assert_eq!(justification_objectives(&c, GateId(1)), vec![(cc, true)]);
    }
}
