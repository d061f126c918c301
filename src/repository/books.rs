//! Books repository

use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookListEntry, BookListRow, BookShort, CreateBook, UpdateBook},
        PageWindow,
    },
};

use super::{contains_pattern, starts_with_pattern};

const LIST_SELECT: &str = r#"
    SELECT b.id, b.title, b.author_id, b.cover,
           a.first_name AS author_first_name, a.last_name AS author_last_name,
           ARRAY(
               SELECT g.name FROM book_genres bg
               JOIN genres g ON g.id = bg.genre_id
               WHERE bg.book_id = b.id
               ORDER BY g.id
           )::text[] AS genre_names
    FROM books b
    JOIN authors a ON a.id = b.author_id
"#;

/// Search criteria for book listings
#[derive(Debug, Default, Clone, Copy)]
pub struct BookSearch<'a> {
    /// Title or summary contains, or author last name starts with
    pub text: Option<&'a str>,
    pub genre_id: Option<i32>,
}

impl<'a> BookSearch<'a> {
    fn push_conditions(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        let mut separator = " WHERE ";

        if let Some(text) = self.text {
            let contains = contains_pattern(text);
            builder
                .push(separator)
                .push("(b.title ILIKE ")
                .push_bind(contains.clone())
                .push(" OR b.summary ILIKE ")
                .push_bind(contains)
                .push(" OR a.last_name ILIKE ")
                .push_bind(starts_with_pattern(text))
                .push(")");
            separator = " AND ";
        }

        if let Some(genre_id) = self.genre_id {
            builder
                .push(separator)
                .push("EXISTS (SELECT 1 FROM book_genres bg WHERE bg.book_id = b.id AND bg.genre_id = ")
                .push_bind(genre_id)
                .push(")");
        }
    }
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            "SELECT id, title, summary, author_id, cover FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    pub async fn get_short(&self, id: i32) -> AppResult<BookShort> {
        sqlx::query_as::<_, BookShort>("SELECT id, title FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    pub async fn count_all(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count(&self, search: BookSearch<'_>) -> AppResult<i64> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM books b JOIN authors a ON a.id = b.author_id",
        );
        search.push_conditions(&mut builder);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// One page of books ordered by title
    pub async fn search(
        &self,
        search: BookSearch<'_>,
        window: &PageWindow,
    ) -> AppResult<Vec<BookListEntry>> {
        let mut builder = QueryBuilder::<Postgres>::new(LIST_SELECT);
        search.push_conditions(&mut builder);
        builder
            .push(" ORDER BY b.title, b.id LIMIT ")
            .push_bind(window.limit())
            .push(" OFFSET ")
            .push_bind(window.offset());

        let rows = builder
            .build_query_as::<BookListRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(BookListEntry::from).collect())
    }

    /// Create a book with its genres
    pub async fn create(&self, data: &CreateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, summary, author_id, cover)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, summary, author_id, cover
            "#,
        )
        .bind(&data.title)
        .bind(&data.summary)
        .bind(data.author_id)
        .bind(&data.cover)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int[]) ON CONFLICT DO NOTHING",
        )
        .bind(book.id)
        .bind(&data.genre_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(book)
    }

    /// Update a book; a given genre list replaces the current set
    pub async fn update(&self, id: i32, data: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = COALESCE($1, title),
                summary = COALESCE($2, summary),
                author_id = COALESCE($3, author_id),
                cover = CASE WHEN $4 THEN $5 ELSE cover END
            WHERE id = $6
            RETURNING id, title, summary, author_id, cover
            "#,
        )
        .bind(&data.title)
        .bind(&data.summary)
        .bind(data.author_id)
        .bind(data.cover.is_some())
        .bind(data.cover.clone().flatten())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        if let Some(ref genre_ids) = data.genre_ids {
            sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                "INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int[]) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(genre_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(book)
    }

    /// Delete a book and, by cascade, its instances and reviews
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }
}
