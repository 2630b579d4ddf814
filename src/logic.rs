//! Five-valued logic algebra and gate evaluation

use core::fmt;

/// A value carried by a signal line during test generation.
///
/// Beyond the usual binary constants, `D` and `Dnot` encode a divergence
/// between the fault-free and the faulty circuit: `D` is 0 in the good
/// circuit and 1 in the faulty one, `Dnot` the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogicValue {
    /// Unknown / unassigned
    #[default]
    X,
    /// Logic 0 in both circuits
    Zero,
    /// Logic 1 in both circuits
    One,
    /// Good circuit 0, faulty circuit 1
    D,
    /// Good circuit 1, faulty circuit 0
    Dnot,
}

impl LogicValue {
    /// Return whether the value is concrete (not X)
    pub fn is_assigned(self) -> bool {
        self != LogicValue::X
    }

    /// Return whether the value differs between the good and faulty circuit
    pub fn is_faulty(self) -> bool {
        matches!(self, LogicValue::D | LogicValue::Dnot)
    }

    /// Value seen in the fault-free circuit
    pub fn good_value(self) -> LogicValue {
        match self {
            LogicValue::D => LogicValue::Zero,
            LogicValue::Dnot => LogicValue::One,
            v => v,
        }
    }

    /// Value seen in the faulty circuit
    pub fn faulty_value(self) -> LogicValue {
        match self {
            LogicValue::D => LogicValue::One,
            LogicValue::Dnot => LogicValue::Zero,
            v => v,
        }
    }

    /// Five-valued inversion; X stays X
    pub fn invert(self) -> LogicValue {
        match self {
            LogicValue::X => LogicValue::X,
            LogicValue::Zero => LogicValue::One,
            LogicValue::One => LogicValue::Zero,
            LogicValue::D => LogicValue::Dnot,
            LogicValue::Dnot => LogicValue::D,
        }
    }

    /// Convert a boolean to the corresponding constant
    pub fn from_bool(b: bool) -> LogicValue {
        if b {
            LogicValue::One
        } else {
            LogicValue::Zero
        }
    }

    /// The constant corresponding to this value, if it is binary
    pub fn to_bool(self) -> Option<bool> {
        match self {
            LogicValue::Zero => Some(false),
            LogicValue::One => Some(true),
            _ => None,
        }
    }
}

impl fmt::Display for LogicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogicValue::X => "X",
            LogicValue::Zero => "0",
            LogicValue::One => "1",
            LogicValue::D => "D",
            LogicValue::Dnot => "D'",
        };
        write!(f, "{}", s)
    }
}

/// Kinds of logic gates supported in a netlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    /// N-input conjunction
    And,
    /// N-input disjunction
    Or,
    /// Inverter
    Not,
    /// Inverted And
    Nand,
    /// Inverted Or
    Nor,
    /// Two-input parity
    Xor,
    /// Inverted parity
    Xnor,
    /// Buffer
    Buf,
}

impl GateKind {
    /// The input value that determines the output on its own
    /// (0 for And/Nand, 1 for Or/Nor, none for the rest)
    pub fn controlling_value(self) -> Option<LogicValue> {
        match self {
            GateKind::And | GateKind::Nand => Some(LogicValue::Zero),
            GateKind::Or | GateKind::Nor => Some(LogicValue::One),
            _ => None,
        }
    }

    /// Complement of the controlling value
    pub fn non_controlling_value(self) -> Option<LogicValue> {
        self.controlling_value().map(LogicValue::invert)
    }

    /// Whether the gate inverts its positive form (Nand/Nor/Xnor/Not)
    pub fn is_inverting(self) -> bool {
        matches!(
            self,
            GateKind::Nand | GateKind::Nor | GateKind::Xnor | GateKind::Not
        )
    }

    /// Evaluate the gate over five-valued inputs.
    ///
    /// Evaluation is monotone in information: refining any X input never
    /// turns a concrete output back into X.
    pub fn evaluate(self, inputs: &[LogicValue]) -> LogicValue {
        use LogicValue::*;
        match self {
            GateKind::And => eval_and(inputs),
            GateKind::Or => eval_and(&invert_all(inputs)).invert(),
            GateKind::Nand => eval_and(inputs).invert(),
            GateKind::Nor => eval_and(&invert_all(inputs)),
            GateKind::Xor => eval_xor(inputs),
            GateKind::Xnor => eval_xor(inputs).invert(),
            GateKind::Not => match inputs {
                [v] => v.invert(),
                _ => X,
            },
            GateKind::Buf => match inputs {
                [v] => *v,
                _ => X,
            },
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GateKind::And => "AND",
            GateKind::Or => "OR",
            GateKind::Not => "NOT",
            GateKind::Nand => "NAND",
            GateKind::Nor => "NOR",
            GateKind::Xor => "XOR",
            GateKind::Xnor => "XNOR",
            GateKind::Buf => "BUF",
        };
        write!(f, "{}", s)
    }
}

fn invert_all(inputs: &[LogicValue]) -> Vec<LogicValue> {
    inputs.iter().map(|v| v.invert()).collect()
}

/// Five-valued And. A non-faulty 0 dominates; X dominates the remainder;
/// a single faulty polarity among 1s propagates; mixed D and D' cancel to 0
/// (both projections evaluate to 0).
fn eval_and(inputs: &[LogicValue]) -> LogicValue {
    use LogicValue::*;
    let mut saw_x = false;
    let mut saw_d = false;
    let mut saw_dnot = false;
    for v in inputs {
        match v {
            Zero => return Zero,
            X => saw_x = true,
            D => saw_d = true,
            Dnot => saw_dnot = true,
            One => {}
        }
    }
    if saw_x {
        X
    } else if saw_d && saw_dnot {
        Zero
    } else if saw_d {
        D
    } else if saw_dnot {
        Dnot
    } else {
        One
    }
}

/// Xor over any arity: X wherever an input is X or faulty, binary parity
/// otherwise. The faulty-Xor algebra is deliberately not modelled.
fn eval_xor(inputs: &[LogicValue]) -> LogicValue {
    use LogicValue::*;
    let mut parity = false;
    for v in inputs {
        match v {
            X | D | Dnot => return X,
            One => parity = !parity,
            Zero => {}
        }
    }
    LogicValue::from_bool(parity)
}

#[cfg(test)]
mod tests {
    use super::GateKind::*;
    use super::LogicValue::*;
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_projections() {
        assert_eq!(D.good_value(), Zero);
        assert_eq!(Dnot.good_value(), One);
        assert_eq!(D.faulty_value(), One);
        assert_eq!(Dnot.faulty_value(), Zero);
        for v in [X, Zero, One] {
            assert_eq!(v.good_value(), v);
            assert_eq!(v.faulty_value(), v);
        }
    }

    #[test]
    fn test_binary_semantics() {
        for a in [false, true] {
            for b in [false, true] {
                let ins = [LogicValue::from_bool(a), LogicValue::from_bool(b)];
                assert_eq!(And.evaluate(&ins), LogicValue::from_bool(a & b));
                assert_eq!(Or.evaluate(&ins), LogicValue::from_bool(a | b));
                assert_eq!(Nand.evaluate(&ins), LogicValue::from_bool(!(a & b)));
                assert_eq!(Nor.evaluate(&ins), LogicValue::from_bool(!(a | b)));
                assert_eq!(Xor.evaluate(&ins), LogicValue::from_bool(a ^ b));
                assert_eq!(Xnor.evaluate(&ins), LogicValue::from_bool(!(a ^ b)));
            }
            let one = [LogicValue::from_bool(a)];
            assert_eq!(Not.evaluate(&one), LogicValue::from_bool(!a));
            assert_eq!(Buf.evaluate(&one), LogicValue::from_bool(a));
        }
    }

    #[test]
    fn test_faulty_propagation() {
        assert_eq!(And.evaluate(&[D, One]), D);
        assert_eq!(And.evaluate(&[Dnot, One]), Dnot);
        assert_eq!(And.evaluate(&[D, Zero]), Zero);
        assert_eq!(And.evaluate(&[D, X]), X);
        assert_eq!(And.evaluate(&[D, Dnot]), Zero);
        assert_eq!(Or.evaluate(&[D, Zero]), D);
        assert_eq!(Or.evaluate(&[Dnot, Zero]), Dnot);
        assert_eq!(Or.evaluate(&[D, One]), One);
        assert_eq!(Or.evaluate(&[D, Dnot]), One);
        assert_eq!(Not.evaluate(&[D]), Dnot);
        assert_eq!(Not.evaluate(&[Dnot]), D);
        assert_eq!(Buf.evaluate(&[D]), D);
        assert_eq!(Nand.evaluate(&[D, One]), Dnot);
        assert_eq!(Nor.evaluate(&[Dnot, Zero]), D);
    }

    #[test]
    fn test_xor_is_approximate() {
        assert_eq!(Xor.evaluate(&[D, One]), X);
        assert_eq!(Xor.evaluate(&[Dnot, Zero]), X);
        assert_eq!(Xor.evaluate(&[X, One]), X);
        assert_eq!(Xnor.evaluate(&[D, Zero]), X);
        // multi-input parity on pure binary inputs
        assert_eq!(Xor.evaluate(&[One, One, One]), One);
        assert_eq!(Xor.evaluate(&[One, One, Zero]), Zero);
    }

    #[test]
    fn test_controlling_values() {
        assert_eq!(And.controlling_value(), Some(Zero));
        assert_eq!(Nand.controlling_value(), Some(Zero));
        assert_eq!(Or.controlling_value(), Some(One));
        assert_eq!(Nor.controlling_value(), Some(One));
        assert_eq!(Xor.controlling_value(), None);
        assert_eq!(Not.controlling_value(), None);
        assert_eq!(And.non_controlling_value(), Some(One));
        assert_eq!(Nor.non_controlling_value(), Some(Zero));
    }

    fn any_value() -> impl Strategy<Value = LogicValue> {
        prop_oneof![Just(X), Just(Zero), Just(One), Just(D), Just(Dnot)]
    }

    fn any_kind() -> impl Strategy<Value = GateKind> {
        prop_oneof![
            Just(And),
            Just(Or),
            Just(Nand),
            Just(Nor),
            Just(Xor),
            Just(Xnor),
        ]
    }

    /// `refined` specializes `original` if it is equal to it, or if the
    /// original was X.
    fn refines(refined: LogicValue, original: LogicValue) -> bool {
        original == X || refined == original
    }

    proptest! {
        #![proptest_config(ProptestConfig { max_global_rejects: 65536, ..ProptestConfig::default() })]
        #[test]
        fn prop_inversion_pairs(kind in any_kind(), ins in prop::collection::vec(any_value(), 1..5)) {
            let pos = match kind {
                Nand => And,
                Nor => Or,
                Xnor => Xor,
                k => k,
            };
            if kind.is_inverting() {
                prop_assert_eq!(kind.evaluate(&ins), pos.evaluate(&ins).invert());
            }
        }

        #[test]
        fn prop_evaluation_monotone(
            kind in any_kind(),
            ins in prop::collection::vec(any_value(), 2..5),
            at in 0usize..4,
            to in any_value(),
        ) {
            let at = at % ins.len();
            prop_assume!(ins[at] == X && to != X);
            let before = kind.evaluate(&ins);
            let mut refined = ins.clone();
            refined[at] = to;
            let after = kind.evaluate(&refined);
            prop_assert!(refines(after, before),
                "refining input {} of {:?} from X to {:?} changed {:?} to {:?}",
                at, ins, to, before, after);
        }
    }
}
