//! Catalog management service (categories and books)

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookFields, BookFilter, BookInput},
        category::{Category, CategoryInput},
        user::{non_empty, Identity},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

/// Validated category name and description
fn category_fields(input: CategoryInput) -> AppResult<(String, Option<String>)> {
    input.validate()?;
    let name = input.nama.unwrap_or_default().trim().to_string();
    if name.is_empty() {
        return Err(AppError::missing_field("nama", "Category name is required"));
    }
    Ok((name, non_empty(input.deskripsi)))
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    // -----------------------------------------------------------------
    // Categories
    // -----------------------------------------------------------------

    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        self.repository.categories.list().await
    }

    pub async fn create_category(&self, actor: &Identity, input: CategoryInput) -> AppResult<i32> {
        let (name, description) = category_fields(input)?;
        let id = self
            .repository
            .categories
            .create(&name, description.as_deref())
            .await?;

        self.repository
            .activity
            .record(Some(actor.id), &format!("Added category {} (#{})", name, id))
            .await?;
        tracing::info!(category_id = id, "Category created");
        Ok(id)
    }

    pub async fn update_category(
        &self,
        actor: &Identity,
        id: i32,
        input: CategoryInput,
    ) -> AppResult<()> {
        let (name, description) = category_fields(input)?;
        self.repository
            .categories
            .update(id, &name, description.as_deref())
            .await?;

        self.repository
            .activity
            .record(Some(actor.id), &format!("Renamed category #{} to {}", id, name))
            .await
    }

    pub async fn delete_category(&self, actor: &Identity, id: i32) -> AppResult<()> {
        self.repository.categories.delete(id).await?;
        self.repository
            .activity
            .record(Some(actor.id), &format!("Deleted category #{}", id))
            .await
    }

    // -----------------------------------------------------------------
    // Books
    // -----------------------------------------------------------------

    pub async fn search_books(&self, filter: &BookFilter) -> AppResult<Vec<Book>> {
        self.repository.books.list(filter).await
    }

    pub async fn create_book(&self, actor: &Identity, input: BookInput) -> AppResult<i32> {
        let book = BookFields::try_from(input)?;
        let id = self.repository.books.create(&book).await?;

        self.repository
            .activity
            .record(Some(actor.id), &format!("Added book {} (#{})", book.title, id))
            .await?;
        tracing::info!(book_id = id, stock = book.stock_count, "Book created");
        Ok(id)
    }

    /// Full replacement of a book's fields, stock included
    pub async fn update_book(&self, actor: &Identity, id: i32, input: BookInput) -> AppResult<()> {
        let book = BookFields::try_from(input)?;
        self.repository.books.update(id, &book).await?;

        self.repository
            .activity
            .record(Some(actor.id), &format!("Updated book #{}", id))
            .await
    }

    pub async fn delete_book(&self, actor: &Identity, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        self.repository
            .activity
            .record(Some(actor.id), &format!("Deleted book #{}", id))
            .await
    }
}
