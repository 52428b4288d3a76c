//! Book catalog service

use crate::{
    error::AppResult,
    models::book::{Book, BookFilter, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books with filters, ordering and cursor
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let filter = BookFilter::try_from(query)?;
        self.repository.books_list(&filter).await
    }

    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.repository.books_get_by_id(id).await
    }

    pub async fn create_book(&self, data: CreateBook) -> AppResult<Book> {
        let book = self.repository.books_create(&data).await?;
        tracing::info!(id = book.id, title = %book.title, "Book created");
        Ok(book)
    }

    /// Apply a partial update. An empty patch writes nothing and returns the current row.
    pub async fn update_book(&self, id: i64, data: UpdateBook) -> AppResult<Book> {
        if data.is_empty() {
            return self.repository.books_get_by_id(id).await;
        }

        let book = self.repository.books_update(id, &data).await?;
        tracing::info!(id, "Book updated");
        Ok(book)
    }

    pub async fn delete_book(&self, id: i64) -> AppResult<()> {
        self.repository.books_delete(id).await?;
        tracing::info!(id, "Book deleted");
        Ok(())
    }
}
