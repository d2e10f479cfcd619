//! Composite ordering over allow-listed sort fields
//!
//! Callers never hand raw column names to the query layer. Each listing
//! declares a fixed table of [`SortableField`]s mapping a logical field name
//! to a property expression, and a user supplied [`OrderSpec`] is resolved
//! against that table into an [`OrderClause`] before any query text exists.

use async_graphql::Enum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{CatalogError, Result};

/// Sort direction
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[graphql(name = "OrderBy")]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which pattern variable a property is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// The relationship (`r`)
    Edge,
    /// The far end of the relationship (`b`)
    Target,
}

impl Binding {
    pub fn variable(&self) -> &'static str {
        match self {
            Binding::Edge => "r",
            Binding::Target => "b",
        }
    }
}

/// A physical property expression such as `b.title` or `r.updatedAt`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyRef {
    pub binding: Binding,
    pub property: &'static str,
}

impl PropertyRef {
    pub const fn edge(property: &'static str) -> Self {
        Self {
            binding: Binding::Edge,
            property,
        }
    }

    pub const fn target(property: &'static str) -> Self {
        Self {
            binding: Binding::Target,
            property,
        }
    }
}

impl fmt::Display for PropertyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.binding.variable(), self.property)
    }
}

/// One entry of a listing's sort allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortableField {
    pub name: &'static str,
    pub expr: PropertyRef,
}

impl SortableField {
    pub const fn new(name: &'static str, expr: PropertyRef) -> Self {
        Self { name, expr }
    }
}

/// One requested `(field, direction)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    pub field: String,
    pub direction: Direction,
}

/// User supplied composite ordering. The first term is the primary key,
/// later terms break ties in sequence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSpec {
    terms: Vec<OrderTerm>,
}

impl OrderSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a term
    pub fn then(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.terms.push(OrderTerm {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn terms(&self) -> &[OrderTerm] {
        &self.terms
    }

    /// Resolve against an allow-list.
    ///
    /// Unknown or repeated field names fail with [`CatalogError::InvalidOrder`].
    /// The target id is appended as a final ascending key so rows that tie on
    /// every requested field still come back in a fixed order.
    pub fn resolve(&self, allowed: &[SortableField]) -> Result<OrderClause> {
        let mut keys: Vec<(PropertyRef, Direction)> = Vec::with_capacity(self.terms.len() + 1);

        for term in &self.terms {
            let field = allowed
                .iter()
                .find(|f| f.name == term.field)
                .ok_or_else(|| {
                    CatalogError::InvalidOrder(format!(
                        "`{}` is not sortable here (allowed: {})",
                        term.field,
                        allowed.iter().map(|f| f.name).collect::<Vec<_>>().join(", ")
                    ))
                })?;

            if keys.iter().any(|(expr, _)| *expr == field.expr) {
                return Err(CatalogError::InvalidOrder(format!(
                    "`{}` appears more than once",
                    term.field
                )));
            }

            keys.push((field.expr, term.direction));
        }

        let tie_break = PropertyRef::target("id");
        if !keys.iter().any(|(expr, _)| *expr == tie_break) {
            keys.push((tie_break, Direction::Asc));
        }

        Ok(OrderClause { keys })
    }
}

/// A validated `ORDER BY` clause, safe to interpolate into query text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    keys: Vec<(PropertyRef, Direction)>,
}

impl OrderClause {
    pub fn keys(&self) -> &[(PropertyRef, Direction)] {
        &self.keys
    }
}

impl fmt::Display for OrderClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ORDER BY ")?;
        for (idx, (expr, direction)) in self.keys.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", expr, direction)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const READS: &[SortableField] = &[
        SortableField::new("date", PropertyRef::edge("recentReadAt")),
        SortableField::new("title", PropertyRef::target("title")),
    ];

    #[test]
    fn test_direction_renders_keyword() {
        assert_eq!(Direction::default(), Direction::Asc);
        assert_eq!(Direction::Desc.to_string(), "DESC");
        assert_eq!(serde_json::to_value(Direction::Desc).unwrap(), serde_json::json!("DESC"));
    }

    #[test]
    fn test_composite_clause_keeps_sequence_order() {
        let spec = OrderSpec::new()
            .then("date", Direction::Asc)
            .then("title", Direction::Desc);
        let clause = spec.resolve(READS).unwrap();
        assert_eq!(
            clause.to_string(),
            "ORDER BY r.recentReadAt ASC, b.title DESC, b.id ASC"
        );

        let reversed = OrderSpec::new()
            .then("title", Direction::Desc)
            .then("date", Direction::Asc);
        assert_eq!(
            reversed.resolve(READS).unwrap().to_string(),
            "ORDER BY b.title DESC, r.recentReadAt ASC, b.id ASC"
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let spec = OrderSpec::new().then("b.title DESC, b.secret", Direction::Asc);
        let err = spec.resolve(READS).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidOrder(_)));
    }

    #[test]
    fn test_repeated_field_rejected() {
        let spec = OrderSpec::new()
            .then("title", Direction::Asc)
            .then("title", Direction::Desc);
        assert!(matches!(spec.resolve(READS), Err(CatalogError::InvalidOrder(_))));
    }

    #[test]
    fn test_empty_spec_orders_by_target_id() {
        let clause = OrderSpec::new().resolve(READS).unwrap();
        assert_eq!(clause.to_string(), "ORDER BY b.id ASC");
    }
}
