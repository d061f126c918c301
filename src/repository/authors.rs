//! Authors repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorListEntry, AuthorListRow, CreateAuthor, UpdateAuthor},
        book::BookShort,
        PageWindow,
    },
};

use super::{contains_pattern, starts_with_pattern};

/// Last name starts with the query, or first name contains it
const SEARCH_CONDITION: &str = "WHERE a.last_name ILIKE $1 OR a.first_name ILIKE $2";

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Postgres>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get author by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            "SELECT id, first_name, last_name, biography FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    pub async fn count_all(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count authors matching the search (all authors when `search` is None)
    pub async fn count(&self, search: Option<&str>) -> AppResult<i64> {
        let count: i64 = match search {
            Some(q) => {
                sqlx::query_scalar(&format!("SELECT COUNT(*) FROM authors a {}", SEARCH_CONDITION))
                    .bind(starts_with_pattern(q))
                    .bind(contains_pattern(q))
                    .fetch_one(&self.pool)
                    .await?
            }
            None => self.count_all().await?,
        };
        Ok(count)
    }

    /// One page of authors ordered by last name, first name
    pub async fn search(
        &self,
        search: Option<&str>,
        window: &PageWindow,
    ) -> AppResult<Vec<AuthorListEntry>> {
        let (where_clause, first_page_param) = match search {
            Some(_) => (SEARCH_CONDITION, 3),
            None => ("", 1),
        };

        let query = format!(
            r#"
            SELECT a.id, a.first_name, a.last_name,
                   ARRAY(
                       SELECT b.title FROM books b
                       WHERE b.author_id = a.id
                       ORDER BY b.title, b.id
                       LIMIT 3
                   )::text[] AS book_titles
            FROM authors a
            {}
            ORDER BY a.last_name, a.first_name, a.id
            LIMIT ${} OFFSET ${}
            "#,
            where_clause,
            first_page_param,
            first_page_param + 1
        );

        let mut builder = sqlx::query_as::<_, AuthorListRow>(&query);
        if let Some(q) = search {
            builder = builder.bind(starts_with_pattern(q)).bind(contains_pattern(q));
        }

        let rows = builder
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(AuthorListEntry::from).collect())
    }

    /// All books of an author in title order
    pub async fn get_books(&self, author_id: i32) -> AppResult<Vec<BookShort>> {
        let books = sqlx::query_as::<_, BookShort>(
            "SELECT id, title FROM books WHERE author_id = $1 ORDER BY title, id",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    pub async fn create(&self, data: &CreateAuthor) -> AppResult<Author> {
        let author = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (first_name, last_name, biography)
            VALUES ($1, $2, $3)
            RETURNING id, first_name, last_name, biography
            "#,
        )
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.biography)
        .fetch_one(&self.pool)
        .await?;
        Ok(author)
    }

    pub async fn update(&self, id: i32, data: &UpdateAuthor) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors SET
                first_name = COALESCE($1, first_name),
                last_name = COALESCE($2, last_name),
                biography = CASE WHEN $3 THEN $4 ELSE biography END
            WHERE id = $5
            RETURNING id, first_name, last_name, biography
            "#,
        )
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(data.biography.is_some())
        .bind(data.biography.clone().flatten())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    /// Delete an author and, by cascade, their books
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Author with id {} not found", id)));
        }
        Ok(())
    }
}
