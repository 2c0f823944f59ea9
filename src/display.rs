//! Stringification of query trees.
//!
//! Two forms: `Display` renders the single-line algebraic form with the
//! conventional operator symbols, and [`Relation::constructor_string`]
//! renders a multi-line constructor form that lists a literal's body.

use crate::expr::{Op, Relation};
use std::fmt;
use std::fmt::Write as _;

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", algebraic(self))
    }
}

fn algebraic(rel: &Relation) -> String {
    match &rel.node.op {
        Op::Values { .. } | Op::ValueSet { .. } | Op::Faulted => {
            format!("Relation{}", rel.heading())
        }
        Op::Project { source, .. } => format!("π{}({})", rel.heading(), algebraic(source)),
        Op::Restrict { source, predicate } => {
            format!("σ{{{}}}({})", predicate, algebraic(source))
        }
        Op::Rename { source } => format!("ρ{}({})", rel.heading(), algebraic(source)),
        Op::Union { left, right } => format!("({} ∪ {})", algebraic(left), algebraic(right)),
        Op::Diff { left, right } => format!("({} − {})", algebraic(left), algebraic(right)),
        Op::Join { left, right, .. } => {
            format!("({} ⋈ {})", algebraic(left), algebraic(right))
        }
        Op::GroupBy { source, .. } => format!("γ{}({})", rel.heading(), algebraic(source)),
        Op::Map { source, .. } => format!("map{}({})", rel.heading(), algebraic(source)),
    }
}

impl Relation {
    /// Multi-line constructor form. Literals list their body one tuple
    /// per line; operator nodes render as a builder chain over their
    /// children's constructor forms.
    pub fn constructor_string(&self) -> String {
        match &self.node.op {
            Op::Values { tuples, .. } => {
                let mut s = String::new();
                let _ = writeln!(s, "Relation::new(");
                let _ = writeln!(s, "    {},", heading_literal(self));
                for t in tuples {
                    let _ = writeln!(s, "    {},", t);
                }
                s.push(')');
                s
            }
            Op::ValueSet { tuples } => {
                let mut s = String::new();
                let _ = writeln!(s, "Relation::from_set(");
                let _ = writeln!(s, "    {},", heading_literal(self));
                for t in tuples {
                    let _ = writeln!(s, "    {},", t);
                }
                s.push(')');
                s
            }
            Op::Faulted => format!("Relation::faulted({})", heading_literal(self)),
            Op::Project { source, .. } => {
                format!("{}\n.project({})", source.constructor_string(), self.heading())
            }
            Op::Restrict { source, predicate } => {
                format!("{}\n.restrict({})", source.constructor_string(), predicate)
            }
            Op::Rename { source } => {
                format!("{}\n.rename({})", source.constructor_string(), self.heading())
            }
            Op::Union { left, right } => format!(
                "{}\n.union(\n{}\n)",
                left.constructor_string(),
                right.constructor_string()
            ),
            Op::Diff { left, right } => format!(
                "{}\n.diff(\n{}\n)",
                left.constructor_string(),
                right.constructor_string()
            ),
            Op::Join { left, right, .. } => format!(
                "{}\n.join(\n{},\n{}\n)",
                left.constructor_string(),
                right.constructor_string(),
                self.heading()
            ),
            Op::GroupBy { source, .. } => {
                format!("{}\n.group_by({})", source.constructor_string(), self.heading())
            }
            Op::Map { source, .. } => {
                format!("{}\n.map({})", source.constructor_string(), self.heading())
            }
        }
    }
}

fn heading_literal(rel: &Relation) -> String {
    let attrs: Vec<String> = rel
        .heading()
        .iter()
        .map(|a| format!("{} {}", a.name, a.data_type))
        .collect();
    format!("[{}]", attrs.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heading::Heading;
    use crate::keys::CandidateKeys;
    use crate::predicate::field;
    use crate::tuple::Tuple;
    use crate::value::DataType;

    fn suppliers() -> Relation {
        Relation::new(
            Heading::new([("SNO", DataType::Int64), ("Rating", DataType::Int64)]).unwrap(),
            vec![Tuple::from([1i64, 5])],
            CandidateKeys::new([vec!["SNO"]]),
        )
    }

    #[test]
    fn test_algebraic_form() {
        let h = Heading::new([("SNO", DataType::Int64)]).unwrap();
        let q = suppliers().restrict(field("Rating").gt(4)).project(&h);
        // Rating is projected away, so the restriction stays below
        assert_eq!(
            q.to_string(),
            "π{SNO}(σ{Rating > 4}(Relation{SNO, Rating}))"
        );
    }

    #[test]
    fn test_constructor_form_lists_body() {
        let s = suppliers().constructor_string();
        assert!(s.starts_with("Relation::new("));
        assert!(s.contains("SNO int"));
        assert!(s.contains("(1, 5)"));
    }
}
