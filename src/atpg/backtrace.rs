//! Multiple backtrace
//!
//! Objectives at internal lines are pushed backward through gate polarities
//! until they land on head lines or primary inputs, accumulating how often
//! each binary value was requested. The strongest surviving preference
//! becomes the next decision candidate.

use std::collections::VecDeque;

use log::trace;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::circuit::{Circuit, LineId};
use crate::logic::GateKind;

/// Request counts for a line: how many transitive objectives asked for
/// value 0 (`n0`) and value 1 (`n1`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Objective {
    /// The requested line
    pub line: LineId,
    /// Requests for value 0
    pub n0: u32,
    /// Requests for value 1
    pub n1: u32,
}

impl Objective {
    fn seed(line: LineId, value: bool) -> Objective {
        if value {
            Objective { line, n0: 0, n1: 1 }
        } else {
            Objective { line, n0: 1, n1: 0 }
        }
    }

    /// Preference strength: how lopsided the requests are
    pub fn strength(&self) -> u32 {
        self.n0.abs_diff(self.n1)
    }

    /// The value asked for more often; ties prefer 1
    pub fn preferred_value(&self) -> bool {
        self.n1 >= self.n0
    }
}

/// Drive the initial objectives back to head lines and primary inputs.
///
/// Internal lines are expanded at most once; objectives landing on an
/// already-assigned line are dropped (they can make no progress). The
/// result is sorted by descending preference strength, head lines before
/// primary inputs on ties, line id as the final tie-break.
pub fn multiple_backtrace(circuit: &Circuit, initial: &[(LineId, bool)]) -> Vec<Objective> {
    let mut queue: VecDeque<Objective> = initial
        .iter()
        .map(|&(line, value)| Objective::seed(line, value))
        .collect();
    let mut processed: FxHashSet<LineId> = FxHashSet::default();
    let mut finals: FxHashMap<LineId, Objective> = FxHashMap::default();

    while let Some(obj) = queue.pop_front() {
        let line = circuit.line(obj.line);
        trace!("backtrace objective {} (n0={}, n1={})", line.name, obj.n0, obj.n1);

        if line.is_assigned() {
            continue;
        }
        if line.is_input() || line.is_head_line {
            finals
                .entry(obj.line)
                .and_modify(|o| {
                    o.n0 += obj.n0;
                    o.n1 += obj.n1;
                })
                .or_insert(obj);
            continue;
        }
        if !processed.insert(obj.line) {
            continue;
        }
        let Some(driver) = line.driver else {
            continue;
        };
        expand_through(circuit, driver, &obj, &mut queue);
    }

    let mut out: Vec<Objective> = finals.into_values().collect();
    out.sort_by_key(|o| {
        let head_first = !circuit.line(o.line).is_head_line;
        (std::cmp::Reverse(o.strength()), head_first, o.line)
    });
    out
}

/// Translate an output objective into input objectives by gate kind
fn expand_through(
    circuit: &Circuit,
    gate: crate::circuit::GateId,
    obj: &Objective,
    queue: &mut VecDeque<Objective>,
) {
    let gate = circuit.gate(gate);
    match gate.kind {
        GateKind::And | GateKind::Nand => {
            // positive form: 1 at the output needs 1 on every input, 0 at
            // the output needs 0 on the cheapest input only
            let (n0, n1) = if gate.kind == GateKind::Nand {
                (obj.n1, obj.n0)
            } else {
                (obj.n0, obj.n1)
            };
            push_and_form(circuit, gate, n0, n1, true, queue);
        }
        GateKind::Or | GateKind::Nor => {
            let (n0, n1) = if gate.kind == GateKind::Nor {
                (obj.n1, obj.n0)
            } else {
                (obj.n0, obj.n1)
            };
            push_and_form(circuit, gate, n1, n0, false, queue);
        }
        GateKind::Not => queue.push_back(Objective {
            line: gate.inputs[0],
            n0: obj.n1,
            n1: obj.n0,
        }),
        GateKind::Buf => queue.push_back(Objective {
            line: gate.inputs[0],
            n0: obj.n0,
            n1: obj.n1,
        }),
        GateKind::Xor | GateKind::Xnor => {
            // either polarity of either input can satisfy a parity request;
            // both sides get the full weight
            let weight = obj.n0 + obj.n1;
            for &input in &gate.inputs {
                queue.push_back(Objective {
                    line: input,
                    n0: weight,
                    n1: weight,
                });
            }
        }
    }
}

/// Common And/Or expansion. `controlling_requests` go to the single
/// easiest-control input, `all_requests` to every input. For the And form
/// (`and_form` true) the controlling value is 0, for the Or form 1.
fn push_and_form(
    circuit: &Circuit,
    gate: &crate::circuit::Gate,
    controlling_requests: u32,
    all_requests: u32,
    and_form: bool,
    queue: &mut VecDeque<Objective>,
) {
    if all_requests > 0 {
        for &input in &gate.inputs {
            let (n0, n1) = if and_form {
                (0, all_requests)
            } else {
                (all_requests, 0)
            };
            queue.push_back(Objective { line: input, n0, n1 });
        }
    }
    if controlling_requests > 0 {
        let (n0, n1) = if and_form {
            (controlling_requests, 0)
        } else {
            (0, controlling_requests)
        };
        queue.push_back(Objective {
            line: easiest_control_input(circuit, gate),
            n0,
            n1,
        });
    }
}

/// The cached easiest-control input if it can still be set, otherwise the
/// first input that can; an assigned input can no longer carry a request.
fn easiest_control_input(circuit: &Circuit, gate: &crate::circuit::Gate) -> LineId {
    let cached = gate.inputs[gate.easiest_control.min(gate.inputs.len() - 1)];
    if !circuit.line(cached).is_assigned() {
        return cached;
    }
    gate.inputs
        .iter()
        .copied()
        .find(|&l| !circuit.line(l).is_assigned())
        .unwrap_or(cached)
}

/// Top candidate of a backtrace run, with the value it should take
pub fn best_final_objective(finals: &[Objective]) -> Option<(LineId, bool)> {
    finals.first().map(|o| (o.line, o.preferred_value()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{Circuit, Topology};
    use crate::logic::GateKind::*;
    use crate::logic::LogicValue::One;

    fn analyzed(f: impl FnOnce(&mut Circuit)) -> Circuit {
        let mut c = Circuit::new();
        f(&mut c);
        c.validate().unwrap();
        Topology::analyze(&mut c).unwrap();
        c
    }

    #[test]
    fn test_and_one_requests_all_inputs() {
        let c = analyzed(|c| {
            let a = c.declare_input("a");
            let b = c.declare_input("b");
            let y = c.declare_output("y");
            c.add_gate(And, vec![a, b], y).unwrap();
        });
        let y = c.find_line("y").unwrap();
        let finals = multiple_backtrace(&c, &[(y, true)]);
        assert_eq!(finals.len(), 2);
        for obj in &finals {
            assert_eq!((obj.n0, obj.n1), (0, 1));
            assert!(obj.preferred_value());
        }
    }

    #[test]
    fn test_and_zero_requests_easiest_input() {
        let c = analyzed(|c| {
            let a = c.declare_input("a");
            let b = c.declare_input("b");
            let y = c.declare_output("y");
            c.add_gate(And, vec![a, b], y).unwrap();
        });
        let y = c.find_line("y").unwrap();
        let a = c.find_line("a").unwrap();
        let finals = multiple_backtrace(&c, &[(y, false)]);
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].line, a);
        assert!(!finals[0].preferred_value());
    }

    #[test]
    fn test_inverting_kinds_swap() {
        let c = analyzed(|c| {
            let a = c.declare_input("a");
            let b = c.declare_input("b");
            let w = c.ensure_line("w");
            let y = c.declare_output("y");
            c.add_gate(Nor, vec![a, b], w).unwrap();
            c.add_gate(Not, vec![w], y).unwrap();
        });
        let y = c.find_line("y").unwrap();
        // y=0 -> w=1 -> Nor output 1 needs all inputs 0
        let finals = multiple_backtrace(&c, &[(y, false)]);
        assert_eq!(finals.len(), 2);
        for obj in &finals {
            assert_eq!((obj.n0, obj.n1), (1, 0));
        }
    }

    #[test]
    fn test_counts_accumulate() {
        // a feeds both And inputs through separate buffers; requests merge
        let c = analyzed(|c| {
            let a = c.declare_input("a");
            let p = c.ensure_line("p");
            let q = c.ensure_line("q");
            let y = c.declare_output("y");
            c.add_gate(Buf, vec![a], p).unwrap();
            c.add_gate(Buf, vec![a], q).unwrap();
            c.add_gate(And, vec![p, q], y).unwrap();
        });
        let y = c.find_line("y").unwrap();
        let a = c.find_line("a").unwrap();
        let finals = multiple_backtrace(&c, &[(y, true)]);
        assert_eq!(finals, vec![Objective { line: a, n0: 0, n1: 2 }]);
    }

    #[test]
    fn test_assigned_lines_dropped() {
        let mut c = analyzed(|c| {
            let a = c.declare_input("a");
            let b = c.declare_input("b");
            let y = c.declare_output("y");
            c.add_gate(And, vec![a, b], y).unwrap();
        });
        let a = c.find_line("a").unwrap();
        let y = c.find_line("y").unwrap();
        c.assign(a, One);
        let finals = multiple_backtrace(&c, &[(y, true)]);
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].line, c.find_line("b").unwrap());
    }

    #[test]
    fn test_stops_at_head_lines() {
        // w = AND(a, b) fans out; a and b are head lines and backtrace
        // stops there instead of emitting the inputs of upstream logic
        let mut c = Circuit::new();
        let a = c.declare_input("a");
        let b = c.declare_input("b");
        let w = c.ensure_line("w");
        let p = c.ensure_line("p");
        let q = c.ensure_line("q");
        let y = c.declare_output("y");
        c.add_gate(And, vec![a, b], w).unwrap();
        c.add_gate(Buf, vec![w], p).unwrap();
        c.add_gate(Not, vec![w], q).unwrap();
        c.add_gate(Or, vec![p, q], y).unwrap();
        c.validate().unwrap();
        Topology::analyze(&mut c).unwrap();

        let finals = multiple_backtrace(&c, &[(p, true)]);
        // p <- w, and w is bound: expansion continues to the head lines
        assert_eq!(finals.len(), 2);
        assert!(finals.iter().all(|o| c.line(o.line).is_head_line));
    }

    #[test]
    fn test_best_objective_tie_prefers_one() {
        let obj = Objective { line: LineId(0), n0: 2, n1: 2 };
        assert!(obj.preferred_value());
        assert_eq!(best_final_objective(&[obj]), Some((LineId(0), true)));
        assert_eq!(best_final_objective(&[]), None);
    }
}
