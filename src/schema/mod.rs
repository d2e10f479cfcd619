//! GraphQL schema: query and mutation roots plus federation entity resolvers
//!
//! Every request must go through [`execute`] (or carry the same data), which
//! attaches a fresh set of [`NodeLoaders`] and the optional [`Viewer`].

pub mod inputs;
pub mod objects;

use async_graphql::{Context, EmptySubscription, Object, Request, Response, Result, ResultExt, Schema, ID};
use tracing::debug;

use crate::catalog::records::{
    HaveBookRecord, LabelingRecord, NextBookRecord, ReadingBookRecord, SeriesHeadRecord, SeriesPartRecord,
    WishReadBookRecord, WritingRecord,
};
use crate::catalog::{Author, Book, Catalog, Label, Series, User};
use crate::dataloaders::NodeLoaders;
use crate::federation::EntityResolver;

pub use inputs::{NameOrder, ReadBooksOrder, SeriesPartsOrder, TitleOrder, UpdatedAtOrder};
pub use objects::Page;

pub type CatalogSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Id of the user making the request, taken from trusted request context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer(pub String);

pub fn build_schema(catalog: Catalog) -> CatalogSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(catalog)
        .enable_federation()
        .finish()
}

/// Run one request with its per-request context attached
pub async fn execute(schema: &CatalogSchema, catalog: &Catalog, request: Request, viewer: Option<Viewer>) -> Response {
    let mut request = request.data(NodeLoaders::new(catalog.executor()));
    if let Some(viewer) = viewer {
        debug!(viewer = %viewer.0, "executing as viewer");
        request = request.data(viewer);
    }
    schema.execute(request).await
}

pub(crate) fn catalog<'a>(ctx: &Context<'a>) -> Result<&'a Catalog> {
    ctx.data::<Catalog>()
}

pub(crate) fn loaders<'a>(ctx: &Context<'a>) -> Result<&'a NodeLoaders> {
    ctx.data::<NodeLoaders>()
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn author(&self, ctx: &Context<'_>, id: ID) -> Result<Author> {
        catalog(ctx)?.authors.find_by_id(&id).await.extend()
    }

    async fn all_authors(&self, ctx: &Context<'_>) -> Result<Vec<Author>> {
        catalog(ctx)?.authors.find_all().await.extend()
    }

    async fn book(&self, ctx: &Context<'_>, id: ID) -> Result<Book> {
        catalog(ctx)?.books.find_by_id(&id).await.extend()
    }

    async fn all_books(&self, ctx: &Context<'_>) -> Result<Vec<Book>> {
        catalog(ctx)?.books.find_all().await.extend()
    }

    async fn label(&self, ctx: &Context<'_>, id: ID) -> Result<Label> {
        catalog(ctx)?.labels.find_by_id(&id).await.extend()
    }

    async fn all_labels(&self, ctx: &Context<'_>) -> Result<Vec<Label>> {
        catalog(ctx)?.labels.find_all().await.extend()
    }

    async fn series(&self, ctx: &Context<'_>, id: ID) -> Result<Series> {
        catalog(ctx)?.series.find_by_id(&id).await.extend()
    }

    async fn all_series(&self, ctx: &Context<'_>) -> Result<Vec<Series>> {
        catalog(ctx)?.series.find_all().await.extend()
    }

    async fn user(&self, ctx: &Context<'_>, id: ID) -> Result<User> {
        catalog(ctx)?.users.find_by_id(&id).await.extend()
    }

    /// The requesting user, `null` without a viewer id.
    ///
    /// User nodes only exist once a reading state was recorded, so the viewer
    /// is returned whether or not the node exists yet.
    async fn viewer(&self, ctx: &Context<'_>) -> Option<User> {
        ctx.data_opt::<Viewer>().map(|viewer| User {
            id: ID::from(viewer.0.as_str()),
        })
    }

    #[graphql(entity)]
    async fn find_author_by_id(&self, ctx: &Context<'_>, id: ID) -> Result<Author> {
        loaders(ctx)?.authors.resolve_reference(&id).await.extend()
    }

    #[graphql(entity)]
    async fn find_book_by_id(&self, ctx: &Context<'_>, id: ID) -> Result<Book> {
        loaders(ctx)?.books.resolve_reference(&id).await.extend()
    }

    #[graphql(entity)]
    async fn find_label_by_id(&self, ctx: &Context<'_>, id: ID) -> Result<Label> {
        loaders(ctx)?.labels.resolve_reference(&id).await.extend()
    }

    #[graphql(entity)]
    async fn find_series_by_id(&self, ctx: &Context<'_>, id: ID) -> Result<Series> {
        loaders(ctx)?.series.resolve_reference(&id).await.extend()
    }

    #[graphql(entity)]
    async fn find_user_by_id(&self, ctx: &Context<'_>, id: ID) -> Result<User> {
        loaders(ctx)?.users.resolve_reference(&id).await.extend()
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_author(&self, ctx: &Context<'_>, name: String) -> Result<Author> {
        catalog(ctx)?.authors.create(&name).await.extend()
    }

    async fn create_book(&self, ctx: &Context<'_>, title: String) -> Result<Book> {
        catalog(ctx)?.books.create(&title).await.extend()
    }

    async fn create_label(&self, ctx: &Context<'_>, name: String) -> Result<Label> {
        catalog(ctx)?.labels.create(&name).await.extend()
    }

    async fn create_series(&self, ctx: &Context<'_>, title: String) -> Result<Series> {
        catalog(ctx)?.series.create(&title).await.extend()
    }

    /// Create a series whose chain starts at `bookId`
    async fn create_series_from_book(&self, ctx: &Context<'_>, book_id: ID, title: String) -> Result<SeriesHeadRecord> {
        catalog(ctx)?.series.create_from_book(&book_id, &title).await.extend()
    }

    async fn writed_book(&self, ctx: &Context<'_>, author_id: ID, book_id: ID) -> Result<WritingRecord> {
        catalog(ctx)?.authors.writed_book(&author_id, &book_id).await.extend()
    }

    async fn labeled_book(&self, ctx: &Context<'_>, label_id: ID, book_id: ID) -> Result<LabelingRecord> {
        catalog(ctx)?.labels.labeled_book(&label_id, &book_id).await.extend()
    }

    async fn connect_series_and_book(
        &self,
        ctx: &Context<'_>,
        series_id: ID,
        book_id: ID,
        volume: Option<i64>,
        numbering_as: Option<String>,
    ) -> Result<SeriesPartRecord> {
        catalog(ctx)?
            .series
            .connect_series_and_book(&series_id, &book_id, volume, numbering_as)
            .await
            .extend()
    }

    async fn connect_books_as_next_book(
        &self,
        ctx: &Context<'_>,
        previous_id: ID,
        next_id: ID,
    ) -> Result<NextBookRecord> {
        catalog(ctx)?
            .series
            .connect_books_as_next_book(&previous_id, &next_id)
            .await
            .extend()
    }

    async fn set_have_book(&self, ctx: &Context<'_>, user_id: ID, book_id: ID, have: bool) -> Result<HaveBookRecord> {
        catalog(ctx)?.users.set_have_book(&user_id, &book_id, have).await.extend()
    }

    async fn set_reading_book(
        &self,
        ctx: &Context<'_>,
        user_id: ID,
        book_id: ID,
        reading: bool,
    ) -> Result<ReadingBookRecord> {
        catalog(ctx)?
            .users
            .set_reading_book(&user_id, &book_id, reading)
            .await
            .extend()
    }

    async fn set_wish_read_book(
        &self,
        ctx: &Context<'_>,
        user_id: ID,
        book_id: ID,
        wish: bool,
    ) -> Result<WishReadBookRecord> {
        catalog(ctx)?
            .users
            .set_wish_read_book(&user_id, &book_id, wish)
            .await
            .extend()
    }
}
