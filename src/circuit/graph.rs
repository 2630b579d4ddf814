use core::fmt;
use std::collections::BTreeMap;

use log::trace;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::circuit::{Gate, GateId, Line, LineId, LineKind};
use crate::logic::{GateKind, LogicValue};

/// Inconsistencies detected while building the graph. These are hard errors
/// reported by the builder, never by the search.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    /// Two gate statements assign the same line
    #[error("line {0} is driven by more than one gate")]
    MultipleDrivers(String),
    /// A non-input line is never assigned
    #[error("line {0} is not a primary input and has no driving gate")]
    NoDriver(String),
    /// The boundary is incomplete
    #[error("circuit has no primary input")]
    NoInputs,
    /// The boundary is incomplete
    #[error("circuit has no primary output")]
    NoOutputs,
    /// Levelization found a cycle
    #[error("combinational loop through line {0}")]
    CombinationalLoop(String),
}

/// A single stuck-at fault: `line` forced to 0 (`stuck_at` false) or 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault {
    /// The faulted line
    pub line: LineId,
    /// The forced polarity
    pub stuck_at: bool,
}

/// A combinational circuit: dense line and gate tables plus the boundary
/// lists and the currently injected fault.
///
/// All cross-references are integer handles into the two tables, so
/// snapshotting the search state is a plain copy of the value column.
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    lines: Vec<Line>,
    gates: Vec<Gate>,
    inputs: Vec<LineId>,
    outputs: Vec<LineId>,
    names: FxHashMap<String, LineId>,
    fault: Option<Fault>,
}

impl Circuit {
    /// Create an empty circuit
    pub fn new() -> Circuit {
        Circuit::default()
    }

    /// Number of lines
    pub fn nb_lines(&self) -> usize {
        self.lines.len()
    }

    /// Number of gates
    pub fn nb_gates(&self) -> usize {
        self.gates.len()
    }

    /// The line behind a handle
    pub fn line(&self, id: LineId) -> &Line {
        &self.lines[id.index()]
    }

    /// Mutable access to a line
    pub fn line_mut(&mut self, id: LineId) -> &mut Line {
        &mut self.lines[id.index()]
    }

    /// The gate behind a handle
    pub fn gate(&self, id: GateId) -> &Gate {
        &self.gates[id.index()]
    }

    /// Mutable access to a gate
    pub fn gate_mut(&mut self, id: GateId) -> &mut Gate {
        &mut self.gates[id.index()]
    }

    /// Iterate over all lines in id order
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }

    /// Iterate over all gates in id order
    pub fn gates(&self) -> impl Iterator<Item = &Gate> {
        self.gates.iter()
    }

    /// All line handles in id order
    pub fn line_ids(&self) -> impl Iterator<Item = LineId> {
        (0..self.lines.len() as u32).map(LineId)
    }

    /// All gate handles in id order
    pub fn gate_ids(&self) -> impl Iterator<Item = GateId> {
        (0..self.gates.len() as u32).map(GateId)
    }

    /// Primary inputs, in declaration order
    pub fn primary_inputs(&self) -> &[LineId] {
        &self.inputs
    }

    /// Primary outputs, in declaration order
    pub fn primary_outputs(&self) -> &[LineId] {
        &self.outputs
    }

    /// The currently injected fault, if any
    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }

    /// Look a line up by its netlist name
    pub fn find_line(&self, name: &str) -> Option<LineId> {
        self.names.get(name).copied()
    }

    /// Get the line with the given name, creating a Normal line if absent
    pub fn ensure_line(&mut self, name: &str) -> LineId {
        if let Some(&id) = self.names.get(name) {
            return id;
        }
        let id = LineId(self.lines.len() as u32);
        self.lines.push(Line::new(id, name, LineKind::Normal));
        self.names.insert(name.to_string(), id);
        id
    }

    /// Declare a primary input, creating the line if needed
    pub fn declare_input(&mut self, name: &str) -> LineId {
        let id = self.ensure_line(name);
        let line = self.line_mut(id);
        if line.kind == LineKind::Normal {
            line.kind = LineKind::PrimaryInput;
            self.inputs.push(id);
        }
        id
    }

    /// Declare a primary output, creating the line if needed
    pub fn declare_output(&mut self, name: &str) -> LineId {
        let id = self.ensure_line(name);
        let line = self.line_mut(id);
        match line.kind {
            LineKind::Normal => {
                line.kind = LineKind::PrimaryOutput;
                self.outputs.push(id);
            }
            // an input wired straight to the boundary stays an input but
            // still counts as an observation point
            LineKind::PrimaryInput => self.outputs.push(id),
            LineKind::PrimaryOutput => {}
        }
        id
    }

    /// Add a gate and wire the back-edges: the output line learns its
    /// driver, every input line learns a new consumer.
    pub fn add_gate(
        &mut self,
        kind: GateKind,
        inputs: Vec<LineId>,
        output: LineId,
    ) -> Result<GateId, BuildError> {
        if self.line(output).driver.is_some() {
            return Err(BuildError::MultipleDrivers(self.line(output).name.clone()));
        }
        let id = GateId(self.gates.len() as u32);
        let name = format!("g{}", id.0);
        for &input in &inputs {
            self.line_mut(input).fanouts.push(id);
        }
        self.line_mut(output).driver = Some(id);
        self.gates.push(Gate::new(id, name, kind, inputs, output));
        Ok(id)
    }

    /// Check structural invariants: a non-empty boundary and exactly one
    /// driver for every non-input line.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.inputs.is_empty() {
            return Err(BuildError::NoInputs);
        }
        if self.outputs.is_empty() {
            return Err(BuildError::NoOutputs);
        }
        for line in &self.lines {
            if !line.is_input() && line.driver.is_none() {
                return Err(BuildError::NoDriver(line.name.clone()));
            }
        }
        Ok(())
    }

    /// The value a line actually takes when `value` is applied to it: at
    /// the fault site a binary value differing from the stuck polarity
    /// becomes the composite D/D' value; a binary value equal to it stays
    /// as-is and is flagged later by conflict detection.
    pub fn faulted_value(&self, id: LineId, value: LogicValue) -> LogicValue {
        let line = self.line(id);
        if line.is_fault_site {
            if let (Some(stuck), Some(good)) = (line.fault_value, value.to_bool()) {
                if good != stuck {
                    return if stuck { LogicValue::D } else { LogicValue::Dnot };
                }
            }
        }
        value
    }

    /// Set a line value, applying the fault-site conversion
    pub fn assign(&mut self, id: LineId, value: LogicValue) {
        let stored = self.faulted_value(id, value);
        let line = &mut self.lines[id.index()];
        trace!("assign {} = {}", line.name, stored);
        line.value = stored;
        line.assignments += 1;
    }

    /// Reset every line to X and clear the frontier flags; the injected
    /// fault and the topology flags persist.
    pub fn reset_values(&mut self) {
        for line in &mut self.lines {
            line.value = LogicValue::X;
        }
        for gate in &mut self.gates {
            gate.in_d_frontier = false;
        }
    }

    /// Install a fault, clearing any previous site. If the site already
    /// holds a binary value it is re-applied through the D/D' conversion.
    pub fn inject_fault(&mut self, fault: Fault) {
        if let Some(old) = self.fault {
            let line = self.line_mut(old.line);
            line.is_fault_site = false;
            line.fault_value = None;
        }
        self.fault = Some(fault);
        let line = self.line_mut(fault.line);
        line.is_fault_site = true;
        line.fault_value = Some(fault.stuck_at);
        let current = line.value;
        if current.to_bool().is_some() {
            self.assign(fault.line, current);
        }
    }

    /// One forward-simulation pass in gate id order: evaluate every gate
    /// whose output is X and record concrete results. Idempotent; the
    /// implication engine drives it to a fixed point.
    pub fn simulate_forward(&mut self) -> bool {
        let mut changed = false;
        for gi in 0..self.gates.len() {
            let output = self.gates[gi].output;
            if self.line(output).is_assigned() {
                continue;
            }
            let value = self.gates[gi].evaluate(self);
            if value.is_assigned() {
                self.assign(output, value);
                changed = true;
            }
        }
        changed
    }

    /// A test is complete when a primary output carries a faulty value
    pub fn test_found(&self) -> bool {
        self.outputs.iter().any(|&o| self.line(o).is_faulty())
    }

    /// Good-circuit projection of the current primary-input assignment
    pub fn current_test(&self) -> BTreeMap<String, LogicValue> {
        self.inputs
            .iter()
            .map(|&i| {
                let line = self.line(i);
                (line.name.clone(), line.value.good_value())
            })
            .collect()
    }

    /// Copy of the value column, for snapshot/rollback
    pub fn snapshot_values(&self) -> Vec<LogicValue> {
        self.lines.iter().map(|l| l.value).collect()
    }

    /// Write a snapshot back over the value column
    pub fn restore_values(&mut self, snapshot: &[LogicValue]) {
        debug_assert_eq!(snapshot.len(), self.lines.len());
        for (line, &value) in self.lines.iter_mut().zip(snapshot) {
            line.value = value;
        }
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Circuit with {} inputs, {} outputs, {} gates:",
            self.inputs.len(),
            self.outputs.len(),
            self.gates.len()
        )?;
        for gate in &self.gates {
            let inputs: Vec<&str> = gate
                .inputs
                .iter()
                .map(|&l| self.line(l).name.as_str())
                .collect();
            writeln!(
                f,
                "\t{} = {}({})",
                self.line(gate.output).name,
                gate.kind,
                inputs.join(", ")
            )?;
        }
        Ok(())
    }
}
