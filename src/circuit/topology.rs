//! One-shot structural preprocessing of a circuit
//!
//! Computes line levels, fanout points, the free/bound partition with its
//! head lines, reconvergence flags and the dominator ("unique path") sets
//! consumed by unique sensitization. Everything here is a pure function of
//! the graph structure and is computed once, before any search runs.

use std::collections::BTreeSet;

use log::debug;
use rustc_hash::FxHashSet;

use crate::circuit::{BuildError, Circuit, GateId, LineId};

/// Derived structural tables, valid for the lifetime of the circuit
#[derive(Debug, Clone)]
pub struct Topology {
    levels: Vec<u32>,
    max_level: u32,
    fanout_points: Vec<LineId>,
    reconvergent: Vec<bool>,
    head_lines: Vec<LineId>,
}

impl Topology {
    /// Run the full analysis. Sets the free/bound/head flags on the lines
    /// and the easiest-control cache on the gates; deterministic for a
    /// given netlist (gates are visited in id order throughout).
    pub fn analyze(circuit: &mut Circuit) -> Result<Topology, BuildError> {
        let levels = compute_levels(circuit)?;
        let max_level = levels.iter().copied().max().unwrap_or(0);

        let fanout_points: Vec<LineId> = circuit
            .lines()
            .filter(|l| l.is_fanout_point())
            .map(|l| l.id)
            .collect();

        mark_free_and_bound(circuit, &fanout_points);
        let head_lines = mark_head_lines(circuit, &levels);
        cache_easiest_control(circuit, &levels);
        let reconvergent = find_reconvergence(circuit, &fanout_points);

        debug!(
            "topology: {} levels, {} fanout points, {} head lines",
            max_level,
            fanout_points.len(),
            head_lines.len()
        );

        Ok(Topology {
            levels,
            max_level,
            fanout_points,
            reconvergent,
            head_lines,
        })
    }

    /// Distance from the primary inputs: 0 for inputs, 1 + max over the
    /// driver's inputs otherwise
    pub fn level(&self, line: LineId) -> u32 {
        self.levels[line.index()]
    }

    /// The largest level of any line
    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Lines consumed by more than one gate, in id order
    pub fn fanout_points(&self) -> &[LineId] {
        &self.fanout_points
    }

    /// Head lines, sorted by level then id
    pub fn head_lines(&self) -> &[LineId] {
        &self.head_lines
    }

    /// Whether two or more disjoint paths from some fanout point meet here
    pub fn is_reconvergent(&self, line: LineId) -> bool {
        self.reconvergent[line.index()]
    }

    /// Lines lying on every path from the gate's output to the primary
    /// outputs, in level order. The gate's own output is not included.
    ///
    /// A wavefront of lines is advanced in level order; whenever it shrinks
    /// to a single line, that line is common to all paths. The march stops
    /// at the first path that reaches an output while others are pending.
    pub fn dominators(&self, circuit: &Circuit, gate: GateId) -> Vec<LineId> {
        let start = circuit.gate(gate).output;
        let mut wave: BTreeSet<(u32, LineId)> = BTreeSet::new();
        wave.insert((self.level(start), start));
        let mut doms = Vec::new();

        while let Some(&entry) = wave.iter().next() {
            if wave.len() == 1 && entry.1 != start {
                doms.push(entry.1);
            }
            wave.remove(&entry);
            let line = circuit.line(entry.1);
            if line.is_output() || line.fanouts.is_empty() {
                // a path terminates here; nothing past this point can be
                // common to all paths
                break;
            }
            for &g in &line.fanouts {
                let out = circuit.gate(g).output;
                wave.insert((self.level(out), out));
            }
        }
        doms
    }
}

/// Levelize by relaxation over the gates until a pass assigns nothing new
fn compute_levels(circuit: &Circuit) -> Result<Vec<u32>, BuildError> {
    let mut levels: Vec<Option<u32>> = vec![None; circuit.nb_lines()];
    for &input in circuit.primary_inputs() {
        levels[input.index()] = Some(0);
    }

    let mut changed = true;
    while changed {
        changed = false;
        for gate in circuit.gates() {
            if levels[gate.output.index()].is_some() {
                continue;
            }
            let mut max_input = 0;
            let mut all_known = true;
            for &input in &gate.inputs {
                match levels[input.index()] {
                    Some(l) => max_input = max_input.max(l),
                    None => {
                        all_known = false;
                        break;
                    }
                }
            }
            if all_known {
                levels[gate.output.index()] = Some(max_input + 1);
                changed = true;
            }
        }
    }

    levels
        .into_iter()
        .enumerate()
        .map(|(i, l)| {
            l.ok_or_else(|| {
                BuildError::CombinationalLoop(circuit.line(LineId(i as u32)).name.clone())
            })
        })
        .collect()
}

/// Seed every line free, then mark each fanout point and everything
/// reachable from it through the consumer relation as bound.
fn mark_free_and_bound(circuit: &mut Circuit, fanout_points: &[LineId]) {
    for id in circuit.line_ids().collect::<Vec<_>>() {
        let line = circuit.line_mut(id);
        line.is_free = true;
        line.is_bound = false;
        line.is_head_line = false;
    }

    let mut stack: Vec<LineId> = Vec::new();
    for &fp in fanout_points {
        if !circuit.line(fp).is_bound {
            stack.push(fp);
            let line = circuit.line_mut(fp);
            line.is_bound = true;
            line.is_free = false;
        }
        while let Some(id) = stack.pop() {
            let consumers = circuit.line(id).fanouts.clone();
            for g in consumers {
                let out = circuit.gate(g).output;
                let line = circuit.line_mut(out);
                if !line.is_bound {
                    line.is_bound = true;
                    line.is_free = false;
                    stack.push(out);
                }
            }
        }
    }
}

/// A head line is free and feeds at least one gate whose output is bound
fn mark_head_lines(circuit: &mut Circuit, levels: &[u32]) -> Vec<LineId> {
    let mut heads = Vec::new();
    for id in circuit.line_ids().collect::<Vec<_>>() {
        if !circuit.line(id).is_free {
            continue;
        }
        let adjacent_to_bound = circuit
            .line(id)
            .fanouts
            .iter()
            .any(|&g| circuit.line(circuit.gate(g).output).is_bound);
        if adjacent_to_bound {
            circuit.line_mut(id).is_head_line = true;
            heads.push(id);
        }
    }
    heads.sort_by_key(|&l| (levels[l.index()], l));
    heads
}

/// Cache, per gate, the input that is cheapest to control: the one closest
/// to the primary inputs, first on ties.
fn cache_easiest_control(circuit: &mut Circuit, levels: &[u32]) {
    for id in circuit.gate_ids().collect::<Vec<_>>() {
        let easiest = circuit
            .gate(id)
            .inputs
            .iter()
            .enumerate()
            .min_by_key(|&(i, &l)| (levels[l.index()], i))
            .map(|(i, _)| i)
            .unwrap_or(0);
        circuit.gate_mut(id).easiest_control = easiest;
    }
}

/// A line reconverges when the forward cones of two or more branches of a
/// single fanout point both reach it.
fn find_reconvergence(circuit: &Circuit, fanout_points: &[LineId]) -> Vec<bool> {
    let mut reconvergent = vec![false; circuit.nb_lines()];
    let mut hits: Vec<u8> = vec![0; circuit.nb_lines()];

    for &fp in fanout_points {
        hits.iter_mut().for_each(|h| *h = 0);
        for &branch in &circuit.line(fp).fanouts {
            let start = circuit.gate(branch).output;
            let mut seen = FxHashSet::default();
            let mut stack = vec![start];
            while let Some(id) = stack.pop() {
                if !seen.insert(id) {
                    continue;
                }
                hits[id.index()] = hits[id.index()].saturating_add(1);
                for &g in &circuit.line(id).fanouts {
                    stack.push(circuit.gate(g).output);
                }
            }
        }
        for (i, &h) in hits.iter().enumerate() {
            if h >= 2 {
                reconvergent[i] = true;
            }
        }
    }
    reconvergent
}
