//! Offset pagination: skip/limit windows and page envelopes

use serde::Serialize;

use crate::{CatalogError, Result};

/// A validated `skip`/`limit` window.
///
/// A `limit` of zero is legal: the page is empty but the metadata is still
/// computed against the full match set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub skip: u64,
    pub limit: u64,
}

impl Pagination {
    pub fn new(skip: u64, limit: u64) -> Self {
        Self { skip, limit }
    }

    /// Validate GraphQL `Int` arguments
    pub fn from_args(skip: i32, limit: i32) -> Result<Self> {
        if skip < 0 {
            return Err(CatalogError::InvalidPagination(
                "'skip' must be non-negative".to_string(),
            ));
        }
        if limit < 0 {
            return Err(CatalogError::InvalidPagination(
                "'limit' must be non-negative".to_string(),
            ));
        }
        Ok(Self::new(skip as u64, limit as u64))
    }

    /// Number of rows a page over `count` matches holds
    pub fn page_len(&self, count: u64) -> u64 {
        count.saturating_sub(self.skip).min(self.limit)
    }
}

/// Envelope flags derived from the full match count.
///
/// `has_previous` only says a skip was applied to a non-empty set; it stays
/// true when `skip` runs past the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub count: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PageMeta {
    pub fn compute(count: u64, pagination: Pagination) -> Self {
        Self {
            count,
            has_previous: count > 0 && pagination.skip > 0,
            has_next: pagination.skip.saturating_add(pagination.limit) < count,
        }
    }
}

/// One page of results plus metadata over the whole match set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageEnvelope<T> {
    pub nodes: Vec<T>,
    pub count: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> PageEnvelope<T> {
    pub fn new(nodes: Vec<T>, meta: PageMeta) -> Self {
        Self {
            nodes,
            count: meta.count,
            has_previous: meta.has_previous,
            has_next: meta.has_next,
        }
    }

    /// Empty page over an empty set
    pub fn empty() -> Self {
        Self::new(Vec::new(), PageMeta::compute(0, Pagination::default()))
    }

    pub fn meta(&self) -> PageMeta {
        PageMeta {
            count: self.count,
            has_previous: self.has_previous,
            has_next: self.has_next,
        }
    }

    /// Convert every node, keeping the metadata
    pub fn map<U, F>(self, f: F) -> PageEnvelope<U>
    where
        F: FnMut(T) -> U,
    {
        let meta = self.meta();
        PageEnvelope::new(self.nodes.into_iter().map(f).collect(), meta)
    }

    /// Fallible [`map`](Self::map)
    pub fn try_map<U, E, F>(self, f: F) -> std::result::Result<PageEnvelope<U>, E>
    where
        F: FnMut(T) -> std::result::Result<U, E>,
    {
        let meta = self.meta();
        let nodes = self.nodes.into_iter().map(f).collect::<std::result::Result<_, _>>()?;
        Ok(PageEnvelope::new(nodes, meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_limit_zero_still_reports_next() {
        let meta = PageMeta::compute(3, Pagination::new(0, 0));
        assert!(!meta.has_previous);
        assert!(meta.has_next);
        assert_eq!(meta.count, 3);
    }

    #[test]
    fn test_skip_past_end() {
        let meta = PageMeta::compute(3, Pagination::new(10, 3));
        assert!(meta.has_previous);
        assert!(!meta.has_next);
        assert_eq!(Pagination::new(10, 3).page_len(3), 0);
    }

    #[test]
    fn test_empty_set_has_no_previous() {
        let meta = PageMeta::compute(0, Pagination::new(5, 5));
        assert!(!meta.has_previous);
        assert!(!meta.has_next);
    }

    #[test]
    fn test_from_args_rejects_negatives() {
        assert!(matches!(
            Pagination::from_args(-1, 3),
            Err(CatalogError::InvalidPagination(_))
        ));
        assert!(matches!(
            Pagination::from_args(0, -3),
            Err(CatalogError::InvalidPagination(_))
        ));
        assert_eq!(Pagination::from_args(2, 0).unwrap(), Pagination::new(2, 0));
    }

    #[test]
    fn test_map_keeps_meta() {
        let page = PageEnvelope::new(vec![3, 4, 5], PageMeta::compute(9, Pagination::new(0, 3)));
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.nodes, vec![30, 40, 50]);
        assert_eq!(mapped.meta(), PageMeta::compute(9, Pagination::new(0, 3)));
        assert!(!mapped.has_previous);
        assert!(mapped.has_next);
    }

    #[test]
    fn test_try_map_keeps_meta() {
        let page = PageEnvelope::new(vec![1, 2], PageMeta::compute(5, Pagination::new(1, 2)));
        let mapped: PageEnvelope<String> = page
            .try_map(|n| Ok::<_, ()>(n.to_string()))
            .unwrap();
        assert_eq!(mapped.nodes, vec!["1", "2"]);
        assert_eq!(mapped.count, 5);
        assert!(mapped.has_previous);
        assert!(mapped.has_next);
    }

    proptest! {
        #[test]
        fn prop_meta_matches_definition(count in 0u64..1_000, skip in 0u64..1_000, limit in 0u64..1_000) {
            let meta = PageMeta::compute(count, Pagination::new(skip, limit));
            prop_assert_eq!(meta.has_previous, count > 0 && skip > 0);
            prop_assert_eq!(meta.has_next, skip + limit < count);
            prop_assert_eq!(meta.count, count);
        }

        #[test]
        fn prop_page_len_bounds(count in 0u64..1_000, skip in 0u64..1_000, limit in 0u64..1_000) {
            let len = Pagination::new(skip, limit).page_len(count);
            prop_assert!(len <= limit);
            prop_assert!(len <= count.saturating_sub(skip));
            prop_assert_eq!(len, limit.min(count.saturating_sub(skip)));
        }

        #[test]
        fn prop_no_overflow_at_extremes(skip in any::<u64>(), limit in any::<u64>()) {
            let meta = PageMeta::compute(u64::MAX, Pagination::new(skip, limit));
            prop_assert_eq!(meta.has_next, skip.saturating_add(limit) < u64::MAX);
        }
    }
}
