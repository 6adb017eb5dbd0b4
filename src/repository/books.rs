//! Books repository for database operations

use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookFields, BookFilter, StockFilter},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Search the catalog.
    ///
    /// `search` is a case-insensitive substring match over title, author,
    /// publisher and ISBN. Results are ordered by title.
    pub async fn list(&self, filter: &BookFilter) -> AppResult<Vec<Book>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            r#"
            SELECT id, title, author, publisher, year, isbn, category,
                   stock_count, shelf_location, created_at
            FROM books
            WHERE 1 = 1
            "#,
        );

        if let Some(ref search) = filter.search {
            let pattern = format!("%{}%", search);
            builder
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR author ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR publisher ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR isbn ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        if let Some(ref category) = filter.category {
            builder.push(" AND category = ").push_bind(category.clone());
        }

        match filter.stock {
            Some(StockFilter::Available) => {
                builder.push(" AND stock_count > 0");
            }
            Some(StockFilter::Empty) => {
                builder.push(" AND stock_count = 0");
            }
            None => {}
        }

        builder
            .push(" ORDER BY title ASC, id ASC LIMIT ")
            .push_bind(filter.pagination.limit)
            .push(" OFFSET ")
            .push_bind(filter.pagination.offset);

        let books = builder
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, publisher, year, isbn, category,
                   stock_count, shelf_location, created_at
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Create a book, returning its id
    pub async fn create(&self, book: &BookFields) -> AppResult<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO books (title, author, publisher, year, isbn, category, stock_count, shelf_location)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.publisher)
        .bind(&book.year)
        .bind(&book.isbn)
        .bind(&book.category)
        .bind(book.stock_count)
        .bind(&book.shelf_location)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Replace every editable field. `stock_count` is written as given.
    pub async fn update(&self, id: i32, book: &BookFields) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $1, author = $2, publisher = $3, year = $4, isbn = $5,
                category = $6, stock_count = $7, shelf_location = $8
            WHERE id = $9
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.publisher)
        .bind(&book.year)
        .bind(&book.isbn)
        .bind(&book.category)
        .bind(book.stock_count)
        .bind(&book.shelf_location)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    /// Delete a book with no active loans. Returned loans go with it.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let found: Option<i32> = sqlx::query_scalar("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if found.is_none() {
            tx.rollback().await?;
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        let active_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE book_id = $1 AND status = 'active'",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if active_loans > 0 {
            tx.rollback().await?;
            return Err(AppError::Conflict(
                "Book is currently on loan and cannot be deleted".to_string(),
            ));
        }

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
