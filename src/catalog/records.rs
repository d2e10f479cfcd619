//! Typed views of relationship records returned by catalog listings

use async_graphql::{SimpleObject, ID};

use crate::edge::EdgeRecord;
use crate::graph::ExecutorError;
use crate::types::DateTime;

/// `(Author)-[:WRITED_BOOK]->(Book)`
#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct WritingRecord {
    pub author_id: ID,
    pub book_id: ID,
}

impl From<EdgeRecord> for WritingRecord {
    fn from(record: EdgeRecord) -> Self {
        Self {
            author_id: record.origin_id.into(),
            book_id: record.target_id.into(),
        }
    }
}

/// `(Label)-[:LABELED_BOOK]->(Book)`
#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct LabelingRecord {
    pub label_id: ID,
    pub book_id: ID,
}

impl From<EdgeRecord> for LabelingRecord {
    fn from(record: EdgeRecord) -> Self {
        Self {
            label_id: record.origin_id.into(),
            book_id: record.target_id.into(),
        }
    }
}

/// `(Series)-[:PART_OF_SERIES]->(Book)`
#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct SeriesPartRecord {
    pub series_id: ID,
    pub book_id: ID,
    pub volume: Option<i64>,
    pub numbering_as: Option<String>,
}

impl From<EdgeRecord> for SeriesPartRecord {
    fn from(record: EdgeRecord) -> Self {
        Self {
            volume: record.i64_property("volume"),
            numbering_as: record.str_property("numberingAs"),
            series_id: record.origin_id.into(),
            book_id: record.target_id.into(),
        }
    }
}

impl SeriesPartRecord {
    /// A series a book belongs to. Without a `PART_OF_SERIES` relationship
    /// the book only lies on the series chain and carries no numbering.
    pub fn on_chain(series_id: String, book_id: String, part: Option<EdgeRecord>) -> Self {
        match part {
            Some(record) => record.into(),
            None => Self {
                series_id: series_id.into(),
                book_id: book_id.into(),
                volume: None,
                numbering_as: None,
            },
        }
    }
}

/// `(Series)-[:HEAD_OF_SERIES]->(Book)`, the first book of the series chain
#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct SeriesHeadRecord {
    pub series_id: ID,
    pub book_id: ID,
}

impl From<EdgeRecord> for SeriesHeadRecord {
    fn from(record: EdgeRecord) -> Self {
        Self {
            series_id: record.origin_id.into(),
            book_id: record.target_id.into(),
        }
    }
}

/// `(Book)-[:NEXT_BOOK]->(Book)`
#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct NextBookRecord {
    pub previous_id: ID,
    pub next_id: ID,
}

impl From<EdgeRecord> for NextBookRecord {
    fn from(record: EdgeRecord) -> Self {
        Self {
            previous_id: record.origin_id.into(),
            next_id: record.target_id.into(),
        }
    }
}

/// A book reached along `NEXT_BOOK` relationships
#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct ChainedBookRecord {
    pub book_id: ID,
    /// Fewest `NEXT_BOOK` steps between the two books
    pub distance: i64,
}

/// `(User)-[:HAS_BOOK {have}]->(Book)`
#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct HaveBookRecord {
    pub user_id: ID,
    pub book_id: ID,
    pub have: bool,
    pub updated_at: Option<DateTime>,
}

impl TryFrom<EdgeRecord> for HaveBookRecord {
    type Error = ExecutorError;

    fn try_from(record: EdgeRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            have: record.bool_property("have").unwrap_or(false),
            updated_at: record.datetime_property("updatedAt")?,
            user_id: record.origin_id.into(),
            book_id: record.target_id.into(),
        })
    }
}

/// `(User)-[:IS_READING_BOOK {reading}]->(Book)`
#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct ReadingBookRecord {
    pub user_id: ID,
    pub book_id: ID,
    pub reading: bool,
    pub updated_at: Option<DateTime>,
}

impl TryFrom<EdgeRecord> for ReadingBookRecord {
    type Error = ExecutorError;

    fn try_from(record: EdgeRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            reading: record.bool_property("reading").unwrap_or(false),
            updated_at: record.datetime_property("updatedAt")?,
            user_id: record.origin_id.into(),
            book_id: record.target_id.into(),
        })
    }
}

/// `(User)-[:WISHES_TO_READ_BOOK {wish}]->(Book)`
#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct WishReadBookRecord {
    pub user_id: ID,
    pub book_id: ID,
    pub wish: bool,
    pub updated_at: Option<DateTime>,
}

impl TryFrom<EdgeRecord> for WishReadBookRecord {
    type Error = ExecutorError;

    fn try_from(record: EdgeRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            wish: record.bool_property("wish").unwrap_or(false),
            updated_at: record.datetime_property("updatedAt")?,
            user_id: record.origin_id.into(),
            book_id: record.target_id.into(),
        })
    }
}

/// A book the user has but has not read
#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct StackedBookRecord {
    pub user_id: ID,
    pub book_id: ID,
}

impl From<EdgeRecord> for StackedBookRecord {
    fn from(record: EdgeRecord) -> Self {
        Self {
            user_id: record.origin_id.into(),
            book_id: record.target_id.into(),
        }
    }
}

/// `(User)-[:READ_BOOK {recentReadAt}]->(Book)`
#[derive(SimpleObject, Debug, Clone, PartialEq)]
#[graphql(complex)]
pub struct ReadBookRecord {
    pub user_id: ID,
    pub book_id: ID,
    /// Calendar date of the latest reading, `YYYY-MM-DD`
    pub recent_read_at: Option<String>,
}

impl From<EdgeRecord> for ReadBookRecord {
    fn from(record: EdgeRecord) -> Self {
        Self {
            recent_read_at: record.str_property("recentReadAt"),
            user_id: record.origin_id.into(),
            book_id: record.target_id.into(),
        }
    }
}
