//! Shared suppliers/parts/orders fixture and comparison helpers.
#![allow(dead_code)]

use relstream::{CandidateKeys, DataType, Heading, Relation, Tuple, Value};

/// Route engine tracing through the test harness; respects `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn suppliers_heading() -> Heading {
    Heading::new([
        ("SNO", DataType::Int64),
        ("SName", DataType::Str),
        ("Rating", DataType::Int64),
        ("City", DataType::Str),
    ])
    .unwrap()
}

fn supplier_rows() -> Vec<(i64, &'static str, i64, &'static str)> {
    vec![
        (1, "Smith", 3, "London"),
        (2, "Jones", 4, "Paris"),
        (3, "Blake", 2, "Paris"),
        (4, "Clark", 4, "London"),
        (5, "Adams", 3, "Athens"),
        (6, "Coppola Ristorante", 5, "New Providence"),
    ]
}

fn supplier_tuple((sno, name, rating, city): (i64, &str, i64, &str)) -> Tuple {
    Tuple::new(vec![
        Value::from(sno),
        Value::from(name),
        Value::from(rating),
        Value::from(city),
    ])
}

pub fn suppliers() -> Relation {
    Relation::new(
        suppliers_heading(),
        supplier_rows().into_iter().map(supplier_tuple).collect(),
        CandidateKeys::new([vec!["SNO"]]),
    )
}

/// Suppliers 1-3, for union scenarios
pub fn suppliers_low() -> Relation {
    Relation::new(
        suppliers_heading(),
        supplier_rows()
            .into_iter()
            .filter(|r| r.0 <= 3)
            .map(supplier_tuple)
            .collect(),
        CandidateKeys::new([vec!["SNO"]]),
    )
}

/// Suppliers 4-6, for union scenarios
pub fn suppliers_high() -> Relation {
    Relation::new(
        suppliers_heading(),
        supplier_rows()
            .into_iter()
            .filter(|r| r.0 > 3)
            .map(supplier_tuple)
            .collect(),
        CandidateKeys::new([vec!["SNO"]]),
    )
}

pub fn parts_heading() -> Heading {
    Heading::new([
        ("PNO", DataType::Int64),
        ("PName", DataType::Str),
        ("Color", DataType::Str),
        ("Weight", DataType::Float64),
        ("City", DataType::Str),
    ])
    .unwrap()
}

pub fn parts() -> Relation {
    let rows: Vec<(i64, &str, &str, f64, &str)> = vec![
        (1, "Nut", "Red", 12.0, "London"),
        (2, "Bolt", "Green", 17.0, "Paris"),
        (3, "Screw", "Blue", 17.0, "Oslo"),
        (4, "Screw", "Red", 14.0, "London"),
        (5, "Cam", "Blue", 12.0, "Paris"),
        (6, "Cog", "Red", 19.0, "London"),
    ];
    Relation::new(
        parts_heading(),
        rows.into_iter()
            .map(|(pno, name, color, weight, city)| {
                Tuple::new(vec![
                    Value::from(pno),
                    Value::from(name),
                    Value::from(color),
                    Value::from(weight),
                    Value::from(city),
                ])
            })
            .collect(),
        CandidateKeys::new([vec!["PNO"]]),
    )
}

pub fn orders_heading() -> Heading {
    Heading::new([
        ("PNO", DataType::Int64),
        ("SNO", DataType::Int64),
        ("Qty", DataType::Int64),
    ])
    .unwrap()
}

/// Twelve orders over parts 1-4. The (PNO, Qty) projection collapses the
/// two (1, 200) and two (1, 100) pairs; quantities sum to 1300, 700,
/// 200, 900 per part.
pub fn order_rows() -> Vec<(i64, i64, i64)> {
    vec![
        (1, 1, 100),
        (1, 2, 200),
        (1, 3, 400),
        (1, 4, 200),
        (1, 5, 100),
        (1, 6, 300),
        (2, 1, 300),
        (2, 2, 400),
        (3, 2, 200),
        (4, 2, 200),
        (4, 4, 300),
        (4, 5, 400),
    ]
}

pub fn orders() -> Relation {
    Relation::new(
        orders_heading(),
        order_rows()
            .into_iter()
            .map(|(pno, sno, qty)| Tuple::from([pno, sno, qty]))
            .collect(),
        CandidateKeys::new([vec!["PNO", "SNO"]]),
    )
}

/// Drain a relation into a sorted vector; operators emit in
/// nondeterministic order.
pub fn sorted(rel: &Relation) -> Vec<Tuple> {
    let mut tuples = rel.collect().expect("stream faulted");
    tuples.sort();
    tuples
}

/// Assert two relations hold the same body, ignoring order.
pub fn assert_same_body(a: &Relation, b: &Relation) {
    assert_eq!(sorted(a), sorted(b));
}
