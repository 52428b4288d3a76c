//! Books domain methods on Repository

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookFilter, CreateBook, UpdateBook},
};

const BOOK_COLUMNS: &str = "id, title, author, genre, price, popularity, isbn, created_at";

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Book {} not found", id))
}

impl Repository {
    /// List books matching `filter`, ordered by its sort key then id.
    ///
    /// The cursor only keeps rows with `id > cursor`; it is a stable page
    /// boundary for id order alone.
    pub async fn books_list(&self, filter: &BookFilter) -> AppResult<Vec<Book>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM books WHERE 1=1", BOOK_COLUMNS));

        if let Some(ref search) = filter.search {
            let pattern = format!("%{}%", search);
            builder
                .push(" AND (title LIKE ")
                .push_bind(pattern.clone())
                .push(" OR author LIKE ")
                .push_bind(pattern)
                .push(")");
        }

        if let Some(ref genre) = filter.genre {
            builder.push(" AND genre = ").push_bind(genre.clone());
        }

        if let Some(ref author) = filter.author {
            builder.push(" AND author = ").push_bind(author.clone());
        }

        if let Some(cursor) = filter.cursor {
            builder.push(" AND id > ").push_bind(cursor);
        }

        builder
            .push(" ORDER BY ")
            .push(filter.sort.order_clause())
            .push(" LIMIT ")
            .push_bind(filter.limit);

        let rows = builder
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get book by ID
    pub async fn books_get_by_id(&self, id: i64) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!("SELECT {} FROM books WHERE id = ?", BOOK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Insert a book; id and created_at are assigned here
    pub async fn books_create(&self, data: &CreateBook) -> AppResult<Book> {
        let query = format!(
            r#"
            INSERT INTO books (title, author, genre, price, popularity, isbn, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );

        let row = sqlx::query_as::<_, Book>(&query)
            .bind(&data.title)
            .bind(&data.author)
            .bind(&data.genre)
            .bind(data.price)
            .bind(data.popularity)
            .bind(&data.isbn)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    /// Apply the present fields of `data` in a single UPDATE statement.
    ///
    /// Callers must not pass an empty patch.
    pub async fn books_update(&self, id: i64, data: &UpdateBook) -> AppResult<Book> {
        if data.is_empty() {
            return Err(AppError::Internal("empty book update".to_string()));
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE books SET ");
        {
            let mut sets = builder.separated(", ");

            macro_rules! set_field {
                ($field:expr, $column:expr) => {
                    if let Some(ref val) = $field {
                        sets.push(concat!($column, " = "))
                            .push_bind_unseparated(val.clone());
                    }
                };
            }

            set_field!(data.title, "title");
            set_field!(data.author, "author");
            set_field!(data.genre, "genre");
            set_field!(data.price, "price");
            set_field!(data.popularity, "popularity");
            set_field!(data.isbn, "isbn");
        }

        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(BOOK_COLUMNS);

        builder
            .build_query_as::<Book>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Delete book
    pub async fn books_delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}
