//! Field resolvers for entities and relationship records

use async_graphql::{ComplexObject, Context, OutputType, Result, ResultExt, SimpleObject, ID};

use super::inputs::{NameOrder, ReadBooksOrder, SeriesPartsOrder, TitleOrder, UpdatedAtOrder};
use super::{catalog, loaders};
use crate::catalog::records::{
    ChainedBookRecord, HaveBookRecord, LabelingRecord, NextBookRecord, ReadBookRecord, ReadingBookRecord,
    SeriesHeadRecord, SeriesPartRecord, StackedBookRecord, WishReadBookRecord, WritingRecord,
};
use crate::catalog::{Author, Book, Label, Series, User};
use crate::federation::EntityResolver;
use crate::pagination::{PageEnvelope, Pagination};

/// A page of relationship records with metadata over the whole match set
#[derive(SimpleObject, Debug, Clone)]
#[graphql(concrete(name = "AuthorWritesPage", params(WritingRecord)))]
#[graphql(concrete(name = "LabeledBooksPage", params(LabelingRecord)))]
#[graphql(concrete(name = "SeriesPartsPage", params(SeriesPartRecord)))]
#[graphql(concrete(name = "HaveBooksPage", params(HaveBookRecord)))]
#[graphql(concrete(name = "ReadingBooksPage", params(ReadingBookRecord)))]
#[graphql(concrete(name = "WishReadBooksPage", params(WishReadBookRecord)))]
#[graphql(concrete(name = "StackedBooksPage", params(StackedBookRecord)))]
#[graphql(concrete(name = "ReadBooksPage", params(ReadBookRecord)))]
#[graphql(concrete(name = "ChainedBooksPage", params(ChainedBookRecord)))]
pub struct Page<T: OutputType> {
    pub nodes: Vec<T>,
    pub count: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T: OutputType> From<PageEnvelope<T>> for Page<T> {
    fn from(page: PageEnvelope<T>) -> Self {
        Self {
            count: i64::try_from(page.count).unwrap_or(i64::MAX),
            has_previous: page.has_previous,
            has_next: page.has_next,
            nodes: page.nodes,
        }
    }
}

fn ids(except: Vec<ID>) -> Vec<String> {
    except.into_iter().map(|id| id.0).collect()
}

#[ComplexObject]
impl Author {
    async fn writes(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] skip: i32,
        #[graphql(default)] limit: i32,
        #[graphql(default)] except: Vec<ID>,
        #[graphql(default)] order_by: TitleOrder,
    ) -> Result<Page<WritingRecord>> {
        let pagination = Pagination::from_args(skip, limit).extend()?;
        let page = catalog(ctx)?
            .authors
            .writes(&self.id, pagination, &ids(except), &order_by.into())
            .await
            .extend()?;
        Ok(page.into())
    }
}

#[ComplexObject]
impl Book {
    async fn writers(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] order_by: NameOrder,
    ) -> Result<Vec<WritingRecord>> {
        catalog(ctx)?
            .authors
            .writers_of_book(&self.id, &order_by.into())
            .await
            .extend()
    }

    /// The book's label, `null` when it has none
    async fn label(&self, ctx: &Context<'_>) -> Result<Option<Label>> {
        let label_id = catalog(ctx)?.labels.label_id_of_book(&self.id).await.extend()?;
        match label_id {
            Some(id) => loaders(ctx)?.labels.resolve_reference(&id).await.extend().map(Some),
            None => Ok(None),
        }
    }

    /// Series the book is a part of or lies on the chain of
    async fn series_of(&self, ctx: &Context<'_>) -> Result<Vec<SeriesPartRecord>> {
        catalog(ctx)?.series.series_of_book(&self.id).await.extend()
    }

    async fn previous_books(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] skip: i32,
        #[graphql(default)] limit: i32,
    ) -> Result<Page<ChainedBookRecord>> {
        let pagination = Pagination::from_args(skip, limit).extend()?;
        let page = catalog(ctx)?
            .series
            .previous_books(&self.id, pagination)
            .await
            .extend()?;
        Ok(page.into())
    }

    async fn next_books(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] skip: i32,
        #[graphql(default)] limit: i32,
    ) -> Result<Page<ChainedBookRecord>> {
        let pagination = Pagination::from_args(skip, limit).extend()?;
        let page = catalog(ctx)?.series.next_books(&self.id, pagination).await.extend()?;
        Ok(page.into())
    }
}

#[ComplexObject]
impl Label {
    async fn labeled_books(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] skip: i32,
        #[graphql(default)] limit: i32,
        #[graphql(default)] except: Vec<ID>,
        #[graphql(default)] order_by: TitleOrder,
    ) -> Result<Page<LabelingRecord>> {
        let pagination = Pagination::from_args(skip, limit).extend()?;
        let page = catalog(ctx)?
            .labels
            .labeled_books(&self.id, pagination, &ids(except), &order_by.into())
            .await
            .extend()?;
        Ok(page.into())
    }
}

#[ComplexObject]
impl Series {
    async fn parts(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] skip: i32,
        #[graphql(default)] limit: i32,
        #[graphql(default)] except: Vec<ID>,
        #[graphql(default)] order_by: SeriesPartsOrder,
    ) -> Result<Page<SeriesPartRecord>> {
        let pagination = Pagination::from_args(skip, limit).extend()?;
        let page = catalog(ctx)?
            .series
            .parts(&self.id, pagination, &ids(except), &order_by.into())
            .await
            .extend()?;
        Ok(page.into())
    }

    /// Parts off the chain that starts at `head`
    async fn sub_parts(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] skip: i32,
        #[graphql(default)] limit: i32,
        #[graphql(default)] except: Vec<ID>,
        #[graphql(default)] order_by: SeriesPartsOrder,
    ) -> Result<Page<SeriesPartRecord>> {
        let pagination = Pagination::from_args(skip, limit).extend()?;
        let page = catalog(ctx)?
            .series
            .sub_parts(&self.id, pagination, &ids(except), &order_by.into())
            .await
            .extend()?;
        Ok(page.into())
    }

    async fn head(&self, ctx: &Context<'_>) -> Result<Option<SeriesHeadRecord>> {
        catalog(ctx)?.series.head(&self.id).await.extend()
    }
}

#[ComplexObject]
impl User {
    async fn have_books(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] skip: i32,
        #[graphql(default)] limit: i32,
        #[graphql(default)] order_by: UpdatedAtOrder,
    ) -> Result<Page<HaveBookRecord>> {
        let pagination = Pagination::from_args(skip, limit).extend()?;
        let page = catalog(ctx)?
            .users
            .have_books(&self.id, pagination, &order_by.into())
            .await
            .extend()?;
        Ok(page.into())
    }

    async fn reading_books(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] skip: i32,
        #[graphql(default)] limit: i32,
        #[graphql(default)] order_by: UpdatedAtOrder,
    ) -> Result<Page<ReadingBookRecord>> {
        let pagination = Pagination::from_args(skip, limit).extend()?;
        let page = catalog(ctx)?
            .users
            .reading_books(&self.id, pagination, &order_by.into())
            .await
            .extend()?;
        Ok(page.into())
    }

    async fn wish_read_books(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] skip: i32,
        #[graphql(default)] limit: i32,
        #[graphql(default)] order_by: UpdatedAtOrder,
    ) -> Result<Page<WishReadBookRecord>> {
        let pagination = Pagination::from_args(skip, limit).extend()?;
        let page = catalog(ctx)?
            .users
            .wish_read_books(&self.id, pagination, &order_by.into())
            .await
            .extend()?;
        Ok(page.into())
    }

    /// Books the user has but has not read yet
    async fn stacked_books(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] skip: i32,
        #[graphql(default)] limit: i32,
        #[graphql(default)] order_by: UpdatedAtOrder,
    ) -> Result<Page<StackedBookRecord>> {
        let pagination = Pagination::from_args(skip, limit).extend()?;
        let page = catalog(ctx)?
            .users
            .stacked_books(&self.id, pagination, &order_by.into())
            .await
            .extend()?;
        Ok(page.into())
    }

    async fn read_books(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] skip: i32,
        #[graphql(default)] limit: i32,
        #[graphql(default)] order_by: ReadBooksOrder,
    ) -> Result<Page<ReadBookRecord>> {
        let pagination = Pagination::from_args(skip, limit).extend()?;
        let page = catalog(ctx)?
            .users
            .read_books(&self.id, pagination, &order_by.into())
            .await
            .extend()?;
        Ok(page.into())
    }
}

// Records resolve their endpoints through the per-request loaders; the loads
// of one page are batched into one lookup per node label.

async fn book(ctx: &Context<'_>, id: &ID) -> Result<Book> {
    loaders(ctx)?.books.resolve_reference(id).await.extend()
}

async fn user(ctx: &Context<'_>, id: &ID) -> Result<User> {
    loaders(ctx)?.users.resolve_reference(id).await.extend()
}

#[ComplexObject]
impl WritingRecord {
    async fn author(&self, ctx: &Context<'_>) -> Result<Author> {
        loaders(ctx)?.authors.resolve_reference(&self.author_id).await.extend()
    }

    async fn book(&self, ctx: &Context<'_>) -> Result<Book> {
        book(ctx, &self.book_id).await
    }
}

#[ComplexObject]
impl LabelingRecord {
    async fn label(&self, ctx: &Context<'_>) -> Result<Label> {
        loaders(ctx)?.labels.resolve_reference(&self.label_id).await.extend()
    }

    async fn book(&self, ctx: &Context<'_>) -> Result<Book> {
        book(ctx, &self.book_id).await
    }
}

#[ComplexObject]
impl SeriesPartRecord {
    async fn series(&self, ctx: &Context<'_>) -> Result<Series> {
        loaders(ctx)?.series.resolve_reference(&self.series_id).await.extend()
    }

    async fn book(&self, ctx: &Context<'_>) -> Result<Book> {
        book(ctx, &self.book_id).await
    }
}

#[ComplexObject]
impl HaveBookRecord {
    async fn user(&self, ctx: &Context<'_>) -> Result<User> {
        user(ctx, &self.user_id).await
    }

    async fn book(&self, ctx: &Context<'_>) -> Result<Book> {
        book(ctx, &self.book_id).await
    }
}

#[ComplexObject]
impl ReadingBookRecord {
    async fn user(&self, ctx: &Context<'_>) -> Result<User> {
        user(ctx, &self.user_id).await
    }

    async fn book(&self, ctx: &Context<'_>) -> Result<Book> {
        book(ctx, &self.book_id).await
    }
}

#[ComplexObject]
impl WishReadBookRecord {
    async fn user(&self, ctx: &Context<'_>) -> Result<User> {
        user(ctx, &self.user_id).await
    }

    async fn book(&self, ctx: &Context<'_>) -> Result<Book> {
        book(ctx, &self.book_id).await
    }
}

#[ComplexObject]
impl StackedBookRecord {
    async fn user(&self, ctx: &Context<'_>) -> Result<User> {
        user(ctx, &self.user_id).await
    }

    async fn book(&self, ctx: &Context<'_>) -> Result<Book> {
        book(ctx, &self.book_id).await
    }
}

#[ComplexObject]
impl ReadBookRecord {
    async fn user(&self, ctx: &Context<'_>) -> Result<User> {
        user(ctx, &self.user_id).await
    }

    async fn book(&self, ctx: &Context<'_>) -> Result<Book> {
        book(ctx, &self.book_id).await
    }
}

#[ComplexObject]
impl SeriesHeadRecord {
    async fn series(&self, ctx: &Context<'_>) -> Result<Series> {
        loaders(ctx)?.series.resolve_reference(&self.series_id).await.extend()
    }

    async fn book(&self, ctx: &Context<'_>) -> Result<Book> {
        book(ctx, &self.book_id).await
    }
}

#[ComplexObject]
impl NextBookRecord {
    async fn previous(&self, ctx: &Context<'_>) -> Result<Book> {
        book(ctx, &self.previous_id).await
    }

    async fn next(&self, ctx: &Context<'_>) -> Result<Book> {
        book(ctx, &self.next_id).await
    }
}

#[ComplexObject]
impl ChainedBookRecord {
    async fn book(&self, ctx: &Context<'_>) -> Result<Book> {
        book(ctx, &self.book_id).await
    }
}
