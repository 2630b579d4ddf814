use core::fmt;

use crate::circuit::GateId;
use crate::logic::LogicValue;

/// Index handle of a line within its circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(pub u32);

impl LineId {
    /// Position in the circuit's line table
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l{}", self.0)
    }
}

/// Classification of a line at the circuit boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Internal signal
    Normal,
    /// Externally controllable
    PrimaryInput,
    /// Externally observable
    PrimaryOutput,
}

/// A signal line of the circuit.
///
/// Cross-references are index handles: `driver` is the gate producing this
/// line, `fanouts` the gates consuming it (more than one entry makes the
/// line a fanout point). Topology flags are set once by the analyzer.
#[derive(Debug, Clone)]
pub struct Line {
    /// Stable handle of this line
    pub id: LineId,
    /// Netlist name
    pub name: String,
    /// Boundary classification
    pub kind: LineKind,
    /// Current five-valued assignment
    pub value: LogicValue,
    /// Gate producing this line; absent only for primary inputs
    pub driver: Option<GateId>,
    /// Gates consuming this line, in creation order
    pub fanouts: Vec<GateId>,

    /// Whether the current fault sits on this line
    pub is_fault_site: bool,
    /// Stuck-at polarity of the fault site, if any
    pub fault_value: Option<bool>,

    /// Reachable from the inputs without crossing a fanout point
    pub is_free: bool,
    /// Downstream of some fanout point
    pub is_bound: bool,
    /// Free line adjacent to the bound region
    pub is_head_line: bool,

    /// How many times the line was assigned during the current search
    pub assignments: u64,
}

impl Line {
    /// Create an unassigned line
    pub fn new(id: LineId, name: impl Into<String>, kind: LineKind) -> Line {
        Line {
            id,
            name: name.into(),
            kind,
            value: LogicValue::X,
            driver: None,
            fanouts: Vec::new(),
            is_fault_site: false,
            fault_value: None,
            is_free: true,
            is_bound: false,
            is_head_line: false,
            assignments: 0,
        }
    }

    /// Whether the line is a primary input
    pub fn is_input(&self) -> bool {
        self.kind == LineKind::PrimaryInput
    }

    /// Whether the line is a primary output
    pub fn is_output(&self) -> bool {
        self.kind == LineKind::PrimaryOutput
    }

    /// Whether the line holds a concrete value
    pub fn is_assigned(&self) -> bool {
        self.value.is_assigned()
    }

    /// Whether the line carries D or D'
    pub fn is_faulty(&self) -> bool {
        self.value.is_faulty()
    }

    /// A line fans out when more than one gate consumes it
    pub fn is_fanout_point(&self) -> bool {
        self.fanouts.len() > 1
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}
