use core::fmt;

use crate::circuit::{Circuit, LineId};
use crate::logic::{GateKind, LogicValue};

/// Index handle of a gate within its circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GateId(pub u32);

impl GateId {
    /// Position in the circuit's gate table
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// An operator node. Gates reference their lines by id and own none of them.
#[derive(Debug, Clone)]
pub struct Gate {
    /// Stable handle of this gate
    pub id: GateId,
    /// Display name
    pub name: String,
    /// Operator
    pub kind: GateKind,
    /// Input lines, in netlist order
    pub inputs: Vec<LineId>,
    /// The single output line
    pub output: LineId,
    /// Input cheapest to control, cached by the topology pass
    pub easiest_control: usize,
    /// Membership flag maintained by the frontier manager
    pub in_d_frontier: bool,
}

impl Gate {
    /// Create a gate over existing lines
    pub fn new(
        id: GateId,
        name: impl Into<String>,
        kind: GateKind,
        inputs: Vec<LineId>,
        output: LineId,
    ) -> Gate {
        Gate {
            id,
            name: name.into(),
            kind,
            inputs,
            output,
            easiest_control: 0,
            in_d_frontier: false,
        }
    }

    /// Current values of the gate's inputs
    pub fn input_values(&self, circuit: &Circuit) -> Vec<LogicValue> {
        self.inputs
            .iter()
            .map(|&l| circuit.line(l).value)
            .collect()
    }

    /// Evaluate the gate from the current input values
    pub fn evaluate(&self, circuit: &Circuit) -> LogicValue {
        self.kind.evaluate(&self.input_values(circuit))
    }

    /// Whether every input holds a concrete value
    pub fn all_inputs_assigned(&self, circuit: &Circuit) -> bool {
        self.inputs.iter().all(|&l| circuit.line(l).is_assigned())
    }

    /// Whether some input carries D or D'
    pub fn has_faulty_input(&self, circuit: &Circuit) -> bool {
        self.inputs.iter().any(|&l| circuit.line(l).is_faulty())
    }

    /// Number of inputs still at X
    pub fn unassigned_inputs(&self, circuit: &Circuit) -> usize {
        self.inputs
            .iter()
            .filter(|&&l| !circuit.line(l).is_assigned())
            .count()
    }

    /// Whether a fault arriving on an input can still reach the output.
    ///
    /// For And/Or/Nand/Nor a non-faulty side input holding the controlling
    /// value blocks the gate; an X side input does not. Xor and Xnor need
    /// every non-faulty input assigned, since an X there leaves the output
    /// undetermined. Not and Buf always pass the fault through.
    pub fn is_sensitizable(&self, circuit: &Circuit) -> bool {
        match self.kind {
            GateKind::And | GateKind::Or | GateKind::Nand | GateKind::Nor => {
                let controlling = self.kind.controlling_value().unwrap();
                self.inputs.iter().all(|&l| {
                    let line = circuit.line(l);
                    line.is_faulty() || line.value != controlling
                })
            }
            GateKind::Not | GateKind::Buf => true,
            GateKind::Xor | GateKind::Xnor => self.inputs.iter().all(|&l| {
                let line = circuit.line(l);
                line.is_faulty() || line.is_assigned()
            }),
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.kind)
    }
}
