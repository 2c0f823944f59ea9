//! Operator behavior over the suppliers/parts/orders fixture:
//! join cardinality and shape, restriction, projection with and without
//! surviving keys, union dedup, grouped aggregation, and user maps.

mod common;

use common::*;
use relstream::{
    AggregateFn, CandidateKeys, DataType, Heading, MapFn, Relation, Tuple, Value,
};
use relstream::predicate::field;
use std::collections::HashSet;
use std::sync::Arc;

#[test]
fn test_join_parts_orders() {
    let joined = parts().natural_join(&orders());
    assert_eq!(
        joined.heading().names(),
        vec!["PNO", "PName", "Color", "Weight", "City", "SNO", "Qty"]
    );
    assert_eq!(joined.cardinality().unwrap(), 12);
}

#[test]
fn test_join_is_symmetric_in_content() {
    let lr = parts().natural_join(&orders());
    let rl = orders().natural_join(&parts());
    // same set of tuples once both sides are in the same attribute order
    assert_same_body(&lr, &rl.project(lr.heading()));
}

#[test]
fn test_join_with_explicit_target_order() {
    let target = Heading::new([
        ("Qty", DataType::Int64),
        ("SNO", DataType::Int64),
        ("PNO", DataType::Int64),
        ("PName", DataType::Str),
        ("Color", DataType::Str),
        ("Weight", DataType::Float64),
        ("City", DataType::Str),
    ])
    .unwrap();
    let joined = parts().join(&orders(), &target);
    assert_eq!(joined.cardinality().unwrap(), 12);
    assert_eq!(joined.heading(), &target);
}

#[test]
fn test_join_no_matches() {
    let more_orders = Relation::new(
        orders_heading(),
        vec![Tuple::from([99i64, 1, 500])],
        CandidateKeys::new([vec!["PNO", "SNO"]]),
    );
    let joined = parts().natural_join(&more_orders);
    assert_eq!(joined.cardinality().unwrap(), 0);
}

#[test]
fn test_restrict_high_rating() {
    let high = suppliers().restrict(field("Rating").gt(4));
    let body = sorted(&high);
    assert_eq!(
        body,
        vec![Tuple::new(vec![
            Value::from(6),
            Value::from("Coppola Ristorante"),
            Value::from(5),
            Value::from("New Providence"),
        ])]
    );
    // degree and keys unchanged
    assert_eq!(high.degree(), 4);
    assert_eq!(high.keys(), suppliers().keys());
}

#[test]
fn test_project_keeps_surviving_key() {
    let target = Heading::new([("PNO", DataType::Int64), ("SNO", DataType::Int64)]).unwrap();
    let projected = orders().project(&target);
    // {PNO, SNO} is the key, so all twelve tuples remain
    assert_eq!(projected.cardinality().unwrap(), 12);
    assert_eq!(projected.keys(), CandidateKeys::new([vec!["PNO", "SNO"]]));
}

#[test]
fn test_project_dedups_when_no_key_survives() {
    let target = Heading::new([("PNO", DataType::Int64), ("Qty", DataType::Int64)]).unwrap();
    let projected = orders().project(&target);
    // two (1, 200) and two (1, 100) pairs collapse
    assert_eq!(projected.cardinality().unwrap(), 10);
    // the full projected heading becomes the default key
    assert_eq!(projected.keys(), CandidateKeys::new([vec!["PNO", "Qty"]]));
}

#[test]
fn test_project_identity_forwards() {
    let projected = orders().project(&orders_heading());
    assert_same_body(&projected, &orders());
}

#[test]
fn test_union_of_supplier_halves() {
    let all = suppliers_low().union(&suppliers_high());
    assert_eq!(all.cardinality().unwrap(), 6);
    assert_same_body(&all, &suppliers());
}

#[test]
fn test_union_key_intersection() {
    let a = Relation::new(
        orders_heading(),
        vec![],
        CandidateKeys::new([vec!["PNO", "SNO"], vec!["Qty"]]),
    );
    let b = Relation::new(
        orders_heading(),
        vec![],
        CandidateKeys::new([vec!["PNO", "SNO"]]),
    );
    assert_eq!(a.union(&b).keys(), CandidateKeys::new([vec!["PNO", "SNO"]]));
}

#[test]
fn test_diff_removes_right_side() {
    let remaining = suppliers().diff(&suppliers_low());
    assert_same_body(&remaining, &suppliers_high());
    assert_eq!(remaining.keys(), suppliers().keys());
}

#[test]
fn test_group_by_sum_per_part() {
    let target = Heading::new([("PNO", DataType::Int64), ("Qty", DataType::Int64)]).unwrap();
    let value = Heading::new([("Qty", DataType::Int64)]).unwrap();
    let sum: AggregateFn = Arc::new(|values| {
        let mut total = 0i64;
        for v in values {
            if let Value::Int64(q) = v.get(0) {
                total += q;
            }
        }
        Tuple::from([total])
    });
    let grouped = orders().group_by(&target, &value, sum);

    let expected: Vec<Tuple> = vec![
        Tuple::from([1i64, 1300]),
        Tuple::from([2i64, 700]),
        Tuple::from([3i64, 200]),
        Tuple::from([4i64, 900]),
    ];
    assert_eq!(sorted(&grouped), expected);
    // no source key fits inside {PNO}, so the group key is the key
    assert_eq!(grouped.keys(), CandidateKeys::new([vec!["PNO"]]));
}

#[test]
fn test_group_by_on_source_key_degenerates_to_per_row() {
    // grouping by the full key yields one group per order
    let target = orders_heading();
    let value = Heading::new([("Qty", DataType::Int64)]).unwrap();
    let first: AggregateFn = Arc::new(|values| {
        values.into_iter().next().unwrap_or_else(|| Tuple::from([0i64]))
    });
    let grouped = orders().group_by(&target, &value, first);
    assert_same_body(&grouped, &orders());
}

#[test]
fn test_map_doubles_quantity() {
    let input = orders_heading();
    let output = Heading::new([
        ("PNO", DataType::Int64),
        ("SNO", DataType::Int64),
        ("Qty", DataType::Int64),
        ("QtyDoubled", DataType::Int64),
    ])
    .unwrap();
    let double: MapFn = Arc::new(|t| {
        let (pno, sno, qty) = (t.get(0).clone(), t.get(1).clone(), t.get(2).clone());
        let doubled = match qty {
            Value::Int64(q) => Value::Int64(q * 2),
            ref other => other.clone(),
        };
        Tuple::new(vec![pno, sno, qty, doubled])
    });
    let mapped = orders().map(
        &input,
        &output,
        double,
        Some(CandidateKeys::new([vec!["PNO", "SNO"]])),
    );

    let body = sorted(&mapped);
    assert_eq!(body.len(), 12);
    for t in &body {
        let q = match t.get(2) {
            Value::Int64(v) => *v,
            other => panic!("unexpected quantity {other}"),
        };
        assert_eq!(t.get(3), &Value::Int64(2 * q));
    }
    assert_eq!(mapped.keys(), CandidateKeys::new([vec!["PNO", "SNO"]]));
}

#[test]
fn test_map_without_keys_dedups() {
    // collapse every order to its quantity band; duplicates must vanish
    let input = Heading::new([("Qty", DataType::Int64)]).unwrap();
    let output = Heading::new([("Band", DataType::Int64)]).unwrap();
    let band: MapFn = Arc::new(|t| match t.get(0) {
        Value::Int64(q) => Tuple::from([q / 200]),
        _ => Tuple::from([-1i64]),
    });
    let mapped = orders().map(&input, &output, band, None);
    // bands of 100..400 are 0, 1, 1, 2 → {0, 1, 2}
    assert_eq!(mapped.cardinality().unwrap(), 3);
    assert_eq!(mapped.keys(), CandidateKeys::new([vec!["Band"]]));
}

#[test]
fn test_rename_positional() {
    let renamed_heading = Heading::new([
        ("PartNo", DataType::Int64),
        ("SupNo", DataType::Int64),
        ("Quantity", DataType::Int64),
    ])
    .unwrap();
    let renamed = orders().rename(&renamed_heading);
    assert_eq!(renamed.heading(), &renamed_heading);
    assert_eq!(renamed.keys(), CandidateKeys::new([vec!["PartNo", "SupNo"]]));
    // body data flows through unchanged
    let original: HashSet<Tuple> = orders().collect().unwrap().into_iter().collect();
    let renamed_body: HashSet<Tuple> = renamed.collect().unwrap().into_iter().collect();
    assert_eq!(original, renamed_body);
}

#[test]
fn test_sequence_literal_dedups_unless_declared_distinct() {
    let heading = Heading::new([("X", DataType::Int64)]).unwrap();
    let dups = vec![Tuple::from([1i64]), Tuple::from([1i64]), Tuple::from([2i64])];
    let deduped = Relation::new(heading.clone(), dups, CandidateKeys::none());
    assert_eq!(deduped.cardinality().unwrap(), 2);

    let clean = vec![Tuple::from([1i64]), Tuple::from([2i64])];
    let trusted = Relation::new_distinct(heading, clean, CandidateKeys::none());
    assert_eq!(trusted.cardinality().unwrap(), 2);
}

#[test]
fn test_set_literal_streams_distinct() {
    let heading = Heading::new([("X", DataType::Int64)]).unwrap();
    let body: HashSet<Tuple> = (0..5i64).map(|i| Tuple::from([i])).collect();
    let rel = Relation::from_set(heading, body, CandidateKeys::none());
    assert_eq!(rel.cardinality().unwrap(), 5);
}

#[test]
fn test_cardinality_and_collect_agree() {
    let r = parts().natural_join(&orders());
    assert_eq!(r.cardinality().unwrap(), r.collect().unwrap().len());
}
