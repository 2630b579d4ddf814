//! Test-vector files
//!
//! One vector per line, one `0`/`1`/`X` column per primary input, preceded
//! by a header naming the inputs and a comment per vector naming the
//! fault(s) it was generated for:
//! ```text
//!     # test vectors generated by fantail
//!     # inputs: a b c
//!     # a/0
//!     1 1 X
//! ```

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read, Write};

use itertools::Itertools;

use crate::circuit::Circuit;
use crate::io::ParseError;
use crate::logic::LogicValue;

/// Write labelled vectors in primary-input order
pub fn write_vectors<W: Write>(
    writer: &mut W,
    circuit: &Circuit,
    rows: &[(String, BTreeMap<String, LogicValue>)],
) -> std::io::Result<()> {
    let names: Vec<&str> = circuit
        .primary_inputs()
        .iter()
        .map(|&i| circuit.line(i).name.as_str())
        .collect();
    writeln!(writer, "# test vectors generated by fantail")?;
    writeln!(writer, "# inputs: {}", names.iter().join(" "))?;
    for (label, vector) in rows {
        writeln!(writer, "# {}", label)?;
        let row = names
            .iter()
            .map(|&n| vector.get(n).copied().unwrap_or(LogicValue::X))
            .join(" ");
        writeln!(writer, "{}", row)?;
    }
    Ok(())
}

/// Read vectors back: comments and blank lines are skipped, each remaining
/// line is a whitespace-separated list of `0`, `1` or `X`.
pub fn read_vectors<R: Read>(reader: R) -> Result<Vec<Vec<LogicValue>>, ParseError> {
    let mut vectors = Vec::new();
    for (number, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let vector = text
            .split_whitespace()
            .map(|token| match token {
                "0" => Ok(LogicValue::Zero),
                "1" => Ok(LogicValue::One),
                "X" | "x" => Ok(LogicValue::X),
                other => Err(ParseError::Syntax {
                    line: number + 1,
                    message: format!("invalid vector value {:?}", other),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        vectors.push(vector);
    }
    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::GateKind::And;
    use crate::logic::LogicValue::*;

    fn circuit() -> Circuit {
        let mut c = Circuit::new();
        let a = c.declare_input("a");
        let b = c.declare_input("b");
        let y = c.declare_output("y");
        c.add_gate(And, vec![a, b], y).unwrap();
        c
    }

    #[test]
    fn test_round_trip() {
        let c = circuit();
        let rows = vec![
            (
                "a/0".to_string(),
                BTreeMap::from([("a".to_string(), One), ("b".to_string(), One)]),
            ),
            ("b/1".to_string(), BTreeMap::from([("a".to_string(), One)])),
        ];
        let mut buffer = Vec::new();
        write_vectors(&mut buffer, &c, &rows).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.contains("# inputs: a b"));
        assert!(text.contains("# a/0"));

        let vectors = read_vectors(buffer.as_slice()).unwrap();
        // an input missing from the map is emitted as X
        assert_eq!(vectors, vec![vec![One, One], vec![One, X]]);
    }

    #[test]
    fn test_read_rejects_garbage() {
        let err = read_vectors("1 0 2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 1, .. }));
    }
}
