//! Best-effort test-set compaction
//!
//! Merges vectors that are compatible: no primary input is assigned
//! conflicting binary values, and X positions absorb the other vector's
//! assignment. The result detects at least the faults its members were
//! generated for; no fault simulation is performed, so no further coverage
//! is claimed.

use std::collections::BTreeMap;

use log::info;

use crate::atpg::TestVector;
use crate::logic::LogicValue;

/// Greedily fold each vector into the first compatible group. Input order
/// is the map order, so the result is deterministic. Each group lists the
/// faults whose vectors it absorbed.
pub fn compact_tests(tests: &BTreeMap<String, TestVector>) -> Vec<(Vec<String>, TestVector)> {
    let mut groups: Vec<(Vec<String>, TestVector)> = Vec::new();
    for (fault, vector) in tests {
        match groups.iter_mut().find(|(_, merged)| compatible(merged, vector)) {
            Some((faults, merged)) => {
                merge_into(merged, vector);
                faults.push(fault.clone());
            }
            None => groups.push((vec![fault.clone()], vector.clone())),
        }
    }
    info!("compacted {} vectors into {}", tests.len(), groups.len());
    groups
}

/// Two vectors are compatible when no input carries opposite binary values
fn compatible(a: &TestVector, b: &TestVector) -> bool {
    b.iter().all(|(name, &vb)| match a.get(name) {
        Some(&va) => !(va.is_assigned() && vb.is_assigned() && va != vb),
        None => true,
    })
}

/// Fill X positions of `merged` from `vector`
fn merge_into(merged: &mut TestVector, vector: &TestVector) {
    for (name, &value) in vector {
        let slot = merged.entry(name.clone()).or_insert(LogicValue::X);
        if *slot == LogicValue::X {
            *slot = value;
        }
    }
}
