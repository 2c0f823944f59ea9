//! # Headings
//!
//! A heading is the ordered (name, type) schema of a relation. Names are
//! case-sensitive and unique within a heading; positions are significant
//! for tuple layout. Degree 0 is legal and describes the two nullary
//! relations *dee* and *dum*.
//!
//! Sub-domain relations between headings drive the construction checks of
//! every operator: a projection target must be a sub-domain of its source,
//! union operands must be identical, join inputs must agree on the types
//! of common-named attributes, and so on.

use crate::error::{RelError, RelResult};
use crate::tuple::Tuple;
use crate::value::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One named, typed attribute of a heading
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub data_type: DataType,
}

impl Attribute {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Attribute {
            name: name.into(),
            data_type,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type)
    }
}

/// The ordered schema of a relation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Heading {
    attrs: Arc<[Attribute]>,
}

impl Heading {
    /// Build a heading from (name, type) pairs.
    ///
    /// Fails with `SchemaMismatch` if two attributes share a name.
    pub fn new<N: Into<String>>(
        attrs: impl IntoIterator<Item = (N, DataType)>,
    ) -> RelResult<Heading> {
        let attrs: Vec<Attribute> = attrs
            .into_iter()
            .map(|(name, ty)| Attribute::new(name, ty))
            .collect();
        for (i, a) in attrs.iter().enumerate() {
            if attrs[..i].iter().any(|b| b.name == a.name) {
                return Err(RelError::SchemaMismatch(format!(
                    "duplicate attribute '{}' in heading",
                    a.name
                )));
            }
        }
        Ok(Heading { attrs: attrs.into() })
    }

    /// The empty heading shared by *dee* and *dum*.
    pub fn nullary() -> Heading {
        Heading { attrs: Arc::from([]) }
    }

    pub(crate) fn from_attributes(attrs: Vec<Attribute>) -> Heading {
        Heading { attrs: attrs.into() }
    }

    /// Number of attributes
    pub fn degree(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attrs.iter()
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attrs
    }

    /// Position of `name`, if present
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.attrs.iter().position(|a| a.name == name)
    }

    /// Attribute named `name`, if present
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attrs.iter().find(|a| a.name == name)
    }

    /// Whether every attribute of `self` appears in `other` with an
    /// assignable type.
    pub fn is_sub_domain_of(&self, other: &Heading) -> bool {
        self.attrs.iter().all(|a| {
            other
                .get(&a.name)
                .is_some_and(|b| b.data_type.assignable_from(&a.data_type))
        })
    }

    /// For each attribute of `self`, its position in `other`.
    ///
    /// Fails with `SchemaMismatch` when an attribute is missing or its
    /// type differs, naming the offending attribute.
    pub fn positions_in(&self, other: &Heading) -> RelResult<Vec<usize>> {
        self.attrs
            .iter()
            .map(|a| match other.get(&a.name) {
                Some(b) if b.data_type.assignable_from(&a.data_type) => {
                    Ok(other.index_of(&a.name).expect("attribute just found"))
                }
                Some(b) => Err(RelError::SchemaMismatch(format!(
                    "attribute '{}' is {} here but {} in {}",
                    a.name, a.data_type, b.data_type, other
                ))),
                None => Err(RelError::SchemaMismatch(format!(
                    "attribute '{}' is not in heading {}",
                    a.name, other
                ))),
            })
            .collect()
    }

    /// The common-named attributes of two headings, in `self`'s order.
    ///
    /// Fails with `SchemaMismatch` if a shared name carries conflicting
    /// types on the two sides.
    pub fn common_with(&self, other: &Heading) -> RelResult<Heading> {
        let mut common = Vec::new();
        for a in self.attrs.iter() {
            if let Some(b) = other.get(&a.name) {
                if !a.data_type.assignable_from(&b.data_type) {
                    return Err(RelError::SchemaMismatch(format!(
                        "common attribute '{}' is {} on one side and {} on the other",
                        a.name, a.data_type, b.data_type
                    )));
                }
                common.push(a.clone());
            }
        }
        Ok(Heading::from_attributes(common))
    }

    /// The union of two headings: `self`'s attributes followed by the
    /// attributes only `other` has. Shared names must agree on type.
    pub fn union_with(&self, other: &Heading) -> RelResult<Heading> {
        self.common_with(other)?; // type conflicts surface here
        let mut attrs: Vec<Attribute> = self.attrs.to_vec();
        for b in other.attrs.iter() {
            if self.get(&b.name).is_none() {
                attrs.push(b.clone());
            }
        }
        Ok(Heading::from_attributes(attrs))
    }

    /// The attributes of `self` whose names are absent from `other`.
    pub fn minus(&self, other: &Heading) -> Heading {
        Heading::from_attributes(
            self.attrs
                .iter()
                .filter(|a| other.get(&a.name).is_none())
                .cloned()
                .collect(),
        )
    }

    /// Whether two headings carry the same attribute set, order ignored.
    pub fn set_eq(&self, other: &Heading) -> bool {
        self.degree() == other.degree()
            && self.is_sub_domain_of(other)
            && other.is_sub_domain_of(self)
    }

    /// The zero tuple of this heading: every position holds its type's
    /// fill value. This is what `Relation::zero` returns.
    pub fn zero_tuple(&self) -> Tuple {
        Tuple::new(self.attrs.iter().map(|a| a.data_type.zero()).collect())
    }

    /// Check that a tuple conforms to this heading (arity and types).
    pub fn check_tuple(&self, tuple: &Tuple) -> RelResult<()> {
        if tuple.arity() != self.degree() {
            return Err(RelError::SchemaMismatch(format!(
                "tuple {} has arity {}, heading {} has degree {}",
                tuple,
                tuple.arity(),
                self,
                self.degree()
            )));
        }
        for (i, a) in self.attrs.iter().enumerate() {
            let got = tuple.get(i).data_type();
            if !a.data_type.assignable_from(&got) {
                return Err(RelError::SchemaMismatch(format!(
                    "attribute '{}' expects {}, tuple {} carries {}",
                    a.name, a.data_type, tuple, got
                )));
            }
        }
        Ok(())
    }

    /// Attribute names in heading order
    pub fn names(&self) -> Vec<&str> {
        self.attrs.iter().map(|a| a.name.as_str()).collect()
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, a) in self.attrs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", a.name)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> Heading {
        Heading::new([
            ("PNO", DataType::Int64),
            ("SNO", DataType::Int64),
            ("Qty", DataType::Int64),
        ])
        .unwrap()
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let result = Heading::new([("A", DataType::Int64), ("A", DataType::Str)]);
        assert!(matches!(result, Err(RelError::SchemaMismatch(_))));
    }

    #[test]
    fn test_sub_domain() {
        let sub = Heading::new([("Qty", DataType::Int64), ("PNO", DataType::Int64)]).unwrap();
        assert!(sub.is_sub_domain_of(&orders()));
        assert!(!orders().is_sub_domain_of(&sub));

        let wrong_type = Heading::new([("Qty", DataType::Str)]).unwrap();
        assert!(!wrong_type.is_sub_domain_of(&orders()));
    }

    #[test]
    fn test_positions_in() {
        let sub = Heading::new([("Qty", DataType::Int64), ("PNO", DataType::Int64)]).unwrap();
        assert_eq!(sub.positions_in(&orders()).unwrap(), vec![2, 0]);
        let missing = Heading::new([("Color", DataType::Str)]).unwrap();
        assert!(missing.positions_in(&orders()).is_err());
    }

    #[test]
    fn test_common_and_union() {
        let parts = Heading::new([("PNO", DataType::Int64), ("Color", DataType::Str)]).unwrap();
        let common = parts.common_with(&orders()).unwrap();
        assert_eq!(common.names(), vec!["PNO"]);

        let joined = parts.union_with(&orders()).unwrap();
        assert_eq!(joined.names(), vec!["PNO", "Color", "SNO", "Qty"]);
    }

    #[test]
    fn test_common_type_conflict() {
        let clash = Heading::new([("PNO", DataType::Str)]).unwrap();
        assert!(clash.common_with(&orders()).is_err());
    }

    #[test]
    fn test_zero_tuple_conforms() {
        let h = orders();
        h.check_tuple(&h.zero_tuple()).unwrap();
        assert!(h.check_tuple(&Tuple::from(["x", "y", "z"])).is_err());
    }

    #[test]
    fn test_nullary() {
        let h = Heading::nullary();
        assert_eq!(h.degree(), 0);
        assert_eq!(h.zero_tuple(), Tuple::empty());
        assert!(h.is_sub_domain_of(&orders()));
    }

    #[test]
    fn test_set_eq_ignores_order() {
        let a = Heading::new([("X", DataType::Int64), ("Y", DataType::Str)]).unwrap();
        let b = Heading::new([("Y", DataType::Str), ("X", DataType::Int64)]).unwrap();
        assert!(a.set_eq(&b));
        assert_ne!(a, b);
    }
}
