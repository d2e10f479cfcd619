//! `orderBy` inputs for paginated fields
//!
//! Each input lists its fields in composite order: the first declared field
//! is the primary sort key, later fields break ties. Every field defaults to
//! `ASC`.

use async_graphql::InputObject;

use crate::order::{Direction, OrderSpec};

#[derive(InputObject, Debug, Clone, Copy, Default)]
pub struct TitleOrder {
    #[graphql(default)]
    pub title: Direction,
}

impl From<TitleOrder> for OrderSpec {
    fn from(order: TitleOrder) -> Self {
        OrderSpec::new().then("title", order.title)
    }
}

#[derive(InputObject, Debug, Clone, Copy, Default)]
pub struct NameOrder {
    #[graphql(default)]
    pub name: Direction,
}

impl From<NameOrder> for OrderSpec {
    fn from(order: NameOrder) -> Self {
        OrderSpec::new().then("name", order.name)
    }
}

#[derive(InputObject, Debug, Clone, Copy, Default)]
pub struct UpdatedAtOrder {
    #[graphql(default)]
    pub updated_at: Direction,
}

impl From<UpdatedAtOrder> for OrderSpec {
    fn from(order: UpdatedAtOrder) -> Self {
        OrderSpec::new().then("updatedAt", order.updated_at)
    }
}

#[derive(InputObject, Debug, Clone, Copy, Default)]
pub struct ReadBooksOrder {
    /// Date of the latest reading
    #[graphql(default)]
    pub date: Direction,
    #[graphql(default)]
    pub title: Direction,
}

impl From<ReadBooksOrder> for OrderSpec {
    fn from(order: ReadBooksOrder) -> Self {
        OrderSpec::new()
            .then("date", order.date)
            .then("title", order.title)
    }
}

#[derive(InputObject, Debug, Clone, Copy, Default)]
pub struct SeriesPartsOrder {
    #[graphql(default)]
    pub volume: Direction,
    #[graphql(default)]
    pub title: Direction,
}

impl From<SeriesPartsOrder> for OrderSpec {
    fn from(order: SeriesPartsOrder) -> Self {
        OrderSpec::new()
            .then("volume", order.volume)
            .then("title", order.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_field_order_is_sort_order() {
        let spec: OrderSpec = ReadBooksOrder {
            date: Direction::Asc,
            title: Direction::Desc,
        }
        .into();
        let terms: Vec<(&str, Direction)> = spec
            .terms()
            .iter()
            .map(|t| (t.field.as_str(), t.direction))
            .collect();
        assert_eq!(terms, vec![("date", Direction::Asc), ("title", Direction::Desc)]);
    }

    #[test]
    fn test_defaults_are_ascending() {
        let spec: OrderSpec = UpdatedAtOrder::default().into();
        assert_eq!(spec.terms()[0].field, "updatedAt");
        assert_eq!(spec.terms()[0].direction, Direction::Asc);
    }
}
