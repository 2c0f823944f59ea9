//! # Predicates
//!
//! The restriction operator only needs three things from a predicate: the
//! set of attribute names it reads ([`Predicate::domain`]), a compiled
//! boolean function over tuples of a concrete heading
//! ([`Predicate::eval`]), and a textual form for stringification. Domain
//! knowledge is what lets the rewrite rules decide when a restriction can
//! move past a projection.
//!
//! A small comparison DSL is provided for building predicates:
//!
//! ```rust
//! use relstream::predicate::field;
//!
//! let p = field("Rating").gt(4).and(field("City").eq("New Providence"));
//! assert_eq!(p.to_string(), "(Rating > 4 ∧ City = \"New Providence\")");
//! ```

use crate::error::{RelError, RelResult};
use crate::heading::Heading;
use crate::tuple::Tuple;
use crate::value::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A compiled predicate: a pure boolean test over tuples of one heading.
pub type CompiledPredicate = Box<dyn Fn(&Tuple) -> bool + Send + Sync>;

/// The abstract predicate contract used by the restriction operator.
pub trait Predicate: fmt::Display + Send + Sync {
    /// The attribute names this predicate reads.
    fn domain(&self) -> BTreeSet<String>;

    /// Bind against a concrete heading, producing a compiled test.
    ///
    /// Fails when the domain reaches outside the heading or an operand
    /// type conflicts with the heading's declared types.
    fn eval(&self, heading: &Heading) -> RelResult<CompiledPredicate>;
}

/// A cheaply clonable predicate handle, as taken by `Relation::restrict`.
#[derive(Clone)]
pub struct Pred(Arc<dyn Predicate>);

impl Pred {
    pub fn new(predicate: impl Predicate + 'static) -> Pred {
        Pred(Arc::new(predicate))
    }

    /// Conjunction
    pub fn and(self, other: Pred) -> Pred {
        Pred::new(BoolExpr::And(self, other))
    }

    /// Disjunction
    pub fn or(self, other: Pred) -> Pred {
        Pred::new(BoolExpr::Or(self, other))
    }

    /// Negation
    pub fn not(self) -> Pred {
        Pred::new(BoolExpr::Not(self))
    }
}

impl Predicate for Pred {
    fn domain(&self) -> BTreeSet<String> {
        self.0.domain()
    }

    fn eval(&self, heading: &Heading) -> RelResult<CompiledPredicate> {
        self.0.eval(heading)
    }
}

impl fmt::Display for Pred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Check a predicate's domain against a heading, naming the first
/// attribute that falls outside it.
pub(crate) fn check_domain(predicate: &dyn Predicate, heading: &Heading) -> RelResult<()> {
    for attr in predicate.domain() {
        if heading.index_of(&attr).is_none() {
            return Err(RelError::PredicateDomainOutOfSchema {
                attribute: attr,
                heading: heading.to_string(),
            });
        }
    }
    Ok(())
}

/// Start a comparison against the named attribute.
pub fn field(name: impl Into<String>) -> FieldRef {
    FieldRef { name: name.into() }
}

/// An attribute reference under comparison construction
pub struct FieldRef {
    name: String,
}

macro_rules! cmp_builder {
    ($method:ident, $op:expr) => {
        pub fn $method(self, rhs: impl Into<Value>) -> Pred {
            Pred::new(Comparison {
                attr: self.name,
                op: $op,
                rhs: Operand::Literal(rhs.into()),
            })
        }
    };
}

impl FieldRef {
    cmp_builder!(eq, CmpOp::Eq);
    cmp_builder!(ne, CmpOp::Ne);
    cmp_builder!(lt, CmpOp::Lt);
    cmp_builder!(le, CmpOp::Le);
    cmp_builder!(gt, CmpOp::Gt);
    cmp_builder!(ge, CmpOp::Ge);

    /// Compare against another attribute of the same heading.
    pub fn eq_field(self, other: impl Into<String>) -> Pred {
        Pred::new(Comparison {
            attr: self.name,
            op: CmpOp::Eq,
            rhs: Operand::Field(other.into()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn test(self, ord: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CmpOp::Eq => ord == Equal,
            CmpOp::Ne => ord != Equal,
            CmpOp::Lt => ord == Less,
            CmpOp::Le => ord != Greater,
            CmpOp::Gt => ord == Greater,
            CmpOp::Ge => ord != Less,
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "≠",
            CmpOp::Lt => "<",
            CmpOp::Le => "≤",
            CmpOp::Gt => ">",
            CmpOp::Ge => "≥",
        };
        write!(f, "{}", s)
    }
}

enum Operand {
    Literal(Value),
    Field(String),
}

/// attribute ⟨op⟩ literal, or attribute ⟨op⟩ attribute
struct Comparison {
    attr: String,
    op: CmpOp,
    rhs: Operand,
}

impl Predicate for Comparison {
    fn domain(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        names.insert(self.attr.clone());
        if let Operand::Field(other) = &self.rhs {
            names.insert(other.clone());
        }
        names
    }

    fn eval(&self, heading: &Heading) -> RelResult<CompiledPredicate> {
        check_domain(self, heading)?;
        let pos = heading
            .index_of(&self.attr)
            .expect("domain already checked");
        let lhs_type = heading.attributes()[pos].data_type;
        let op = self.op;
        match &self.rhs {
            Operand::Literal(value) => {
                if !lhs_type.assignable_from(&value.data_type()) {
                    return Err(RelError::SchemaMismatch(format!(
                        "comparison of '{}' ({}) with {} literal",
                        self.attr,
                        lhs_type,
                        value.data_type()
                    )));
                }
                let value = value.clone();
                Ok(Box::new(move |t: &Tuple| op.test(t.get(pos).cmp(&value))))
            }
            Operand::Field(other) => {
                let other_pos = heading.index_of(other).expect("domain already checked");
                let other_type = heading.attributes()[other_pos].data_type;
                if !lhs_type.assignable_from(&other_type) {
                    return Err(RelError::SchemaMismatch(format!(
                        "comparison of '{}' ({}) with '{}' ({})",
                        self.attr, lhs_type, other, other_type
                    )));
                }
                Ok(Box::new(move |t: &Tuple| {
                    op.test(t.get(pos).cmp(t.get(other_pos)))
                }))
            }
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rhs {
            Operand::Literal(v) => write!(f, "{} {} {}", self.attr, self.op, v),
            Operand::Field(other) => write!(f, "{} {} {}", self.attr, self.op, other),
        }
    }
}

enum BoolExpr {
    And(Pred, Pred),
    Or(Pred, Pred),
    Not(Pred),
}

impl Predicate for BoolExpr {
    fn domain(&self) -> BTreeSet<String> {
        match self {
            BoolExpr::And(a, b) | BoolExpr::Or(a, b) => {
                a.domain().union(&b.domain()).cloned().collect()
            }
            BoolExpr::Not(a) => a.domain(),
        }
    }

    fn eval(&self, heading: &Heading) -> RelResult<CompiledPredicate> {
        match self {
            BoolExpr::And(a, b) => {
                let fa = a.eval(heading)?;
                let fb = b.eval(heading)?;
                Ok(Box::new(move |t| fa(t) && fb(t)))
            }
            BoolExpr::Or(a, b) => {
                let fa = a.eval(heading)?;
                let fb = b.eval(heading)?;
                Ok(Box::new(move |t| fa(t) || fb(t)))
            }
            BoolExpr::Not(a) => {
                let fa = a.eval(heading)?;
                Ok(Box::new(move |t| !fa(t)))
            }
        }
    }
}

impl fmt::Display for BoolExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolExpr::And(a, b) => write!(f, "({} ∧ {})", a, b),
            BoolExpr::Or(a, b) => write!(f, "({} ∨ {})", a, b),
            BoolExpr::Not(a) => write!(f, "¬({})", a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::DataType;

    fn suppliers() -> Heading {
        Heading::new([
            ("SNO", DataType::Int64),
            ("SName", DataType::Str),
            ("Rating", DataType::Int64),
        ])
        .unwrap()
    }

    #[test]
    fn test_comparison_eval() {
        let p = field("Rating").gt(4);
        let test = p.eval(&suppliers()).unwrap();
        assert!(test(&Tuple::from([
            Value::from(6),
            Value::from("Coppola Ristorante"),
            Value::from(5)
        ])));
        assert!(!test(&Tuple::from([
            Value::from(1),
            Value::from("Acme"),
            Value::from(3)
        ])));
    }

    #[test]
    fn test_field_to_field() {
        let h = Heading::new([("A", DataType::Int64), ("B", DataType::Int64)]).unwrap();
        let test = field("A").eq_field("B").eval(&h).unwrap();
        assert!(test(&Tuple::from([3i64, 3])));
        assert!(!test(&Tuple::from([3i64, 4])));
    }

    #[test]
    fn test_boolean_composition() {
        let p = field("Rating").ge(3).and(field("Rating").le(4)).not();
        let test = p.eval(&suppliers()).unwrap();
        let row = |r: i64| Tuple::from([Value::from(1), Value::from("s"), Value::from(r)]);
        assert!(test(&row(5)));
        assert!(!test(&row(3)));
    }

    #[test]
    fn test_domain() {
        let p = field("Rating").gt(4).or(field("City").eq("Rome"));
        let names: Vec<String> = p.domain().into_iter().collect();
        assert_eq!(names, vec!["City".to_string(), "Rating".to_string()]);
    }

    #[test]
    fn test_out_of_schema() {
        let p = field("City").eq("Rome");
        assert!(matches!(
            p.eval(&suppliers()),
            Err(RelError::PredicateDomainOutOfSchema { .. })
        ));
    }

    #[test]
    fn test_type_conflict() {
        let p = field("Rating").eq("five");
        assert!(matches!(p.eval(&suppliers()), Err(RelError::SchemaMismatch(_))));
    }
}
