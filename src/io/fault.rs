//! Fault descriptions of the form `<line>/<0|1>`

use crate::circuit::{Circuit, Fault};
use crate::io::ParseError;

/// Resolve a textual fault description against a circuit
pub fn parse_fault(text: &str, circuit: &Circuit) -> Result<Fault, ParseError> {
    let Some((name, polarity)) = text.split_once('/') else {
        return Err(ParseError::InvalidFault(text.to_string()));
    };
    let stuck_at = match polarity {
        "0" => false,
        "1" => true,
        _ => return Err(ParseError::InvalidFault(text.to_string())),
    };
    let line = circuit
        .find_line(name)
        .ok_or_else(|| ParseError::UnknownLine(name.to_string()))?;
    Ok(Fault { line, stuck_at })
}
