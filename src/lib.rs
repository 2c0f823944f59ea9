//! # relstream — Streaming Relational Algebra
//!
//! An in-memory relational algebra engine. Query trees are built eagerly
//! over sets of structurally-typed tuples and evaluated lazily: each
//! node streams its body through bounded channels with cooperative
//! cancellation. Every node is itself a relation, so the algebra is
//! closed under all of its operators.
//!
//! ## Pipeline Architecture
//!
//! ```text
//! Literal tuples (sequence / set)
//!     ↓
//! [Builders]            → query tree, rewrites applied per node
//!     ↓                    (collapse, pushdown, distribution)
//! [stream()]            → worker threads per operator,
//!     ↓                    bounded crossbeam channels between stages
//! Result channel        → tuples in nondeterministic order
//!     +                   cancel handle, cascading to child streams
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use relstream::{CandidateKeys, DataType, Heading, Relation, Tuple, Value};
//! use relstream::predicate::field;
//!
//! let suppliers = Relation::new(
//!     Heading::new([
//!         ("SNO", DataType::Int64),
//!         ("SName", DataType::Str),
//!         ("Rating", DataType::Int64),
//!     ]).unwrap(),
//!     vec![
//!         Tuple::new(vec![Value::Int64(1), Value::from("Acme"), Value::Int64(3)]),
//!         Tuple::new(vec![Value::Int64(2), Value::from("Coppola Ristorante"), Value::Int64(5)]),
//!     ],
//!     CandidateKeys::new([vec!["SNO"]]),
//! );
//!
//! let highly_rated = suppliers.restrict(field("Rating").gt(4));
//! assert_eq!(highly_rated.cardinality().unwrap(), 1);
//! ```
//!
//! ## Module Organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `value` | Attribute values and declared types |
//! | `tuple` | Immutable shared rows |
//! | `heading` | Ordered schemas and sub-domain rules |
//! | `keys` | Canonicalized candidate-key sets |
//! | `predicate` | Restriction predicates and comparison DSL |
//! | `stream` | Channel protocol and cancellation |
//! | `expr` | Query-tree nodes, builders, rewrites, operators |
//! | `display` | Algebraic and constructor stringification |
//! | `config` | Engine tunables (workers, channel capacity) |
//! | `error` | Error kinds and latching policy |

pub mod config;
pub mod error;
pub mod heading;
pub mod keys;
pub mod predicate;
pub mod stream;
pub mod tuple;
pub mod value;

mod display;
mod expr;

// Re-export the primary surface
pub use config::EngineConfig;
pub use error::{RelError, RelResult};
pub use expr::{AggregateFn, MapFn, Relation};
pub use heading::{Attribute, Heading};
pub use keys::CandidateKeys;
pub use predicate::{field, Pred, Predicate};
pub use stream::{CancelHandle, TupleSink, TupleSource};
pub use tuple::Tuple;
pub use value::{DataType, Value};
