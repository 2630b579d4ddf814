//! End-to-end test generation scenarios over parsed netlists

use fantail::io::{read_bench, read_vectors, write_vectors};
use fantail::{Circuit, Fault, LogicValue, Outcome, TestGenerator, TestVector};

/// Apply a vector (X inputs forced to 0), simulate with the fault injected,
/// and check that some primary output differs between the good and the
/// faulty circuit.
fn detects(circuit: &mut Circuit, fault: Fault, vector: &TestVector) -> bool {
    circuit.reset_values();
    circuit.inject_fault(fault);
    let inputs = circuit.primary_inputs().to_vec();
    for input in inputs {
        let name = circuit.line(input).name.clone();
        let value = vector.get(&name).copied().unwrap_or(LogicValue::X);
        let value = if value == LogicValue::X {
            LogicValue::Zero
        } else {
            value
        };
        circuit.assign(input, value);
    }
    while circuit.simulate_forward() {}
    circuit
        .primary_outputs()
        .iter()
        .any(|&o| circuit.line(o).is_faulty())
}

fn find(circuit: &mut Circuit, fault_text: &str) -> Outcome {
    let fault = fantail::io::parse_fault(fault_text, circuit).unwrap();
    let mut generator = TestGenerator::new(circuit).unwrap();
    generator.find_test(fault).unwrap()
}

/// Run one fault end to end and verify the vector by dual simulation
fn check_detected(netlist: &str, fault_text: &str) -> TestVector {
    let mut circuit = read_bench(netlist.as_bytes()).unwrap();
    let Outcome::Test(vector) = find(&mut circuit, fault_text) else {
        panic!("expected a test for {}", fault_text);
    };
    let fault = fantail::io::parse_fault(fault_text, &circuit).unwrap();
    assert!(
        detects(&mut circuit, fault, &vector),
        "vector {:?} does not detect {}",
        vector,
        fault_text
    );
    vector
}

#[test]
fn s1_and_input_stuck_at_zero() {
    let v = check_detected("INPUT(a)\nINPUT(b)\nOUTPUT(y)\ny = AND(a, b)\n", "a/0");
    assert_eq!(v["a"], LogicValue::One);
    assert_eq!(v["b"], LogicValue::One);
}

#[test]
fn s2_and_input_stuck_at_one() {
    let v = check_detected("INPUT(a)\nINPUT(b)\nOUTPUT(y)\ny = AND(a, b)\n", "a/1");
    assert_eq!(v["a"], LogicValue::Zero);
    assert_eq!(v["b"], LogicValue::One);
}

#[test]
fn s3_inverter_input_stuck_at_zero() {
    let v = check_detected("INPUT(a)\nOUTPUT(y)\ny = NOT(a)\n", "a/0");
    assert_eq!(v["a"], LogicValue::One);
}

#[test]
fn s4_internal_and_output_stuck_at_zero() {
    let netlist = "\
INPUT(a)
INPUT(b)
OUTPUT(y)
d = AND(a, b)
e = NOT(b)
y = OR(d, e)
";
    let v = check_detected(netlist, "d/0");
    assert_eq!(v["a"], LogicValue::One);
    assert_eq!(v["b"], LogicValue::One);
}

#[test]
fn s5_justification_chain() {
    let netlist = "\
INPUT(a)
INPUT(b)
INPUT(c)
OUTPUT(y)
d = AND(a, b)
e = OR(d, c)
y = NOT(e)
";
    let v = check_detected(netlist, "e/1");
    // any assignment with d = 0 and c = 0 works
    assert_eq!(v["c"], LogicValue::Zero);
    assert!(v["a"] == LogicValue::Zero || v["b"] == LogicValue::Zero);
}

#[test]
fn s6_redundant_fault() {
    // y = OR(a, NOT(a)) is constant 1, so y/1 never changes an output
    let netlist = "\
INPUT(a)
OUTPUT(y)
n = NOT(a)
y = OR(a, n)
";
    let mut circuit = read_bench(netlist.as_bytes()).unwrap();
    assert_eq!(find(&mut circuit, "y/1"), Outcome::Undetectable);
}

#[test]
fn every_detectable_fault_vector_is_sound() {
    // reconvergent fanout keeps the search honest
    let netlist = "\
INPUT(a)
INPUT(b)
INPUT(c)
OUTPUT(y)
s = NOT(a)
p = AND(a, b)
q = AND(s, c)
y = OR(p, q)
";
    let mut circuit = read_bench(netlist.as_bytes()).unwrap();
    let tests = {
        let mut generator = TestGenerator::new(&mut circuit).unwrap();
        generator.generate_all_tests().unwrap()
    };
    assert!(!tests.is_empty());
    for (fault_text, vector) in &tests {
        let fault = fantail::io::parse_fault(fault_text, &circuit).unwrap();
        assert!(
            detects(&mut circuit, fault, vector),
            "vector for {} fails dual simulation",
            fault_text
        );
    }
}

#[test]
fn vector_file_round_trip() {
    let netlist = "INPUT(a)\nINPUT(b)\nOUTPUT(y)\ny = AND(a, b)\n";
    let mut circuit = read_bench(netlist.as_bytes()).unwrap();
    let tests = {
        let mut generator = TestGenerator::new(&mut circuit).unwrap();
        generator.generate_all_tests().unwrap()
    };
    let rows: Vec<(String, TestVector)> = tests.into_iter().collect();
    let mut buffer = Vec::new();
    write_vectors(&mut buffer, &circuit, &rows).unwrap();
    let vectors = read_vectors(buffer.as_slice()).unwrap();
    assert_eq!(vectors.len(), rows.len());
    for vector in &vectors {
        assert_eq!(vector.len(), circuit.primary_inputs().len());
    }
}
