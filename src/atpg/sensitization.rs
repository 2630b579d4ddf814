//! Unique sensitization
//!
//! When the D-frontier narrows to a single gate, every path from that gate
//! to a primary output runs through the same dominator lines. The side
//! inputs of the gates driving those lines must end up non-controlling on
//! any successful branch, so they can be forced immediately, without
//! spending decisions on them.

use log::debug;
use rustc_hash::FxHashSet;

use crate::circuit::{Circuit, GateId, LineId, Topology};

/// Force the side inputs along the mandatory path of `gate` to their
/// non-controlling values. Inputs inside the gate's forward cone are left
/// alone (they may carry the fault), as are faulty and assigned lines.
/// Returns whether anything was assigned; the caller re-implies if so.
pub fn unique_sensitization(circuit: &mut Circuit, topo: &Topology, gate: GateId) -> bool {
    let dominators = topo.dominators(circuit, gate);
    if dominators.is_empty() {
        return false;
    }
    let cone = forward_cone(circuit, gate);

    let mut changed = false;
    for &dom in &dominators {
        let Some(driver) = circuit.line(dom).driver else {
            continue;
        };
        let Some(nc) = circuit.gate(driver).kind.non_controlling_value() else {
            continue;
        };
        let inputs = circuit.gate(driver).inputs.clone();
        for input in inputs {
            let line = circuit.line(input);
            if cone.contains(&input) || line.is_faulty() || line.is_assigned() {
                continue;
            }
            debug!(
                "unique sensitization: {} = {} (side input of {})",
                line.name,
                nc,
                circuit.gate(driver).name
            );
            circuit.assign(input, nc);
            changed = true;
        }
    }
    changed
}

/// All lines reachable forward from the gate's output, the output included
fn forward_cone(circuit: &Circuit, gate: GateId) -> FxHashSet<LineId> {
    let mut cone = FxHashSet::default();
    let mut stack = vec![circuit.gate(gate).output];
    while let Some(id) = stack.pop() {
        if !cone.insert(id) {
            continue;
        }
        for &g in &circuit.line(id).fanouts {
            stack.push(circuit.gate(g).output);
        }
    }
    cone
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Fault;
    use crate::logic::GateKind::*;
    use crate::logic::LogicValue::*;

    #[test]
    fn test_side_inputs_forced() {
        // w = AND(a, b); t = AND(w, c); y = AND(t, d) -- a single mandatory
        // path w -> t -> y with side inputs c and d
        let mut c = Circuit::new();
        let a = c.declare_input("a");
        let b = c.declare_input("b");
        let ci = c.declare_input("c");
        let di = c.declare_input("d");
        let w = c.ensure_line("w");
        let t = c.ensure_line("t");
        let y = c.declare_output("y");
        let g_w = c.add_gate(And, vec![a, b], w).unwrap();
        c.add_gate(And, vec![w, ci], t).unwrap();
        c.add_gate(And, vec![t, di], y).unwrap();
        c.validate().unwrap();
        let topo = Topology::analyze(&mut c).unwrap();

        c.inject_fault(Fault { line: a, stuck_at: false });
        c.assign(a, One);
        assert!(unique_sensitization(&mut c, &topo, g_w));
        assert_eq!(c.line(ci).value, One);
        assert_eq!(c.line(di).value, One);
        // b feeds the frontier gate itself, not a dominator driver
        assert_eq!(c.line(b).value, X);
        // a second application is a no-op
        assert!(!unique_sensitization(&mut c, &topo, g_w));
    }

    #[test]
    fn test_cone_inputs_left_alone() {
        // w fans out into p and q which reconverge on y; both branches may
        // carry the fault, so neither is a forceable side input
        let mut c = Circuit::new();
        let a = c.declare_input("a");
        let b = c.declare_input("b");
        let w = c.ensure_line("w");
        let p = c.ensure_line("p");
        let q = c.ensure_line("q");
        let y = c.declare_output("y");
        let g_w = c.add_gate(And, vec![a, b], w).unwrap();
        c.add_gate(Buf, vec![w], p).unwrap();
        c.add_gate(Not, vec![w], q).unwrap();
        c.add_gate(Or, vec![p, q], y).unwrap();
        c.validate().unwrap();
        let topo = Topology::analyze(&mut c).unwrap();

        c.inject_fault(Fault { line: a, stuck_at: false });
        c.assign(a, One);
        // the Or gate's inputs p and q are both in the cone
        assert!(!unique_sensitization(&mut c, &topo, g_w));
        assert_eq!(c.line(p).value, X);
        assert_eq!(c.line(q).value, X);
    }
}
