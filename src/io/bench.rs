//! Parser for bench-style netlists
//!
//! The format is a list of simple statements:
//! ```text
//!     # comment
//!     INPUT(a)
//!     INPUT(b)
//!     OUTPUT(y)
//!     w = AND(a, b)
//!     y = NOT(w)
//! ```
//! Lines are created on first reference; INPUT and OUTPUT declarations may
//! appear anywhere. Every non-input line must be assigned exactly once.

use std::io::{BufRead, BufReader, Read};

use crate::circuit::Circuit;
use crate::io::ParseError;
use crate::logic::GateKind;

/// Parse a bench-format netlist and validate the resulting graph
pub fn read_bench<R: Read>(reader: R) -> Result<Circuit, ParseError> {
    let mut circuit = Circuit::new();

    for (number, line) in BufReader::new(reader).lines().enumerate() {
        let number = number + 1;
        let line = line?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = text
            .split(['=', '(', ',', ')'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        match parts.as_slice() {
            ["INPUT", name] => {
                circuit.declare_input(name);
            }
            ["OUTPUT", name] => {
                circuit.declare_output(name);
            }
            [output, kind, inputs @ ..] if !inputs.is_empty() => {
                let kind = parse_gate_kind(kind).ok_or_else(|| ParseError::Syntax {
                    line: number,
                    message: format!("unknown gate kind {:?}", kind),
                })?;
                let out = circuit.ensure_line(output);
                let ins = inputs.iter().map(|n| circuit.ensure_line(n)).collect();
                circuit.add_gate(kind, ins, out)?;
            }
            _ => {
                return Err(ParseError::Syntax {
                    line: number,
                    message: format!("cannot parse statement {:?}", text),
                })
            }
        }
    }

    circuit.validate()?;
    Ok(circuit)
}

fn parse_gate_kind(name: &str) -> Option<GateKind> {
    match name.to_uppercase().as_str() {
        "AND" => Some(GateKind::And),
        "OR" => Some(GateKind::Or),
        "NOT" | "INV" => Some(GateKind::Not),
        "NAND" => Some(GateKind::Nand),
        "NOR" => Some(GateKind::Nor),
        "XOR" => Some(GateKind::Xor),
        "XNOR" => Some(GateKind::Xnor),
        "BUF" => Some(GateKind::Buf),
        _ => None,
    }
}
