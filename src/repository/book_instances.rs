//! Book instances repository
//!
//! Reader-side transitions that read before writing run in a transaction
//! holding the row lock, so two requests on the same copy serialize.

use chrono::NaiveDate;
use sqlx::{Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book_instance::{
            BookInstance, BookInstanceDetails, BookInstanceRow, BookStatus, LendingAction,
        },
        PageWindow,
    },
};

use super::{contains_pattern, starts_with_pattern};

const DETAILS_SELECT: &str = r#"
    SELECT bi.id, bi.book_id, b.title AS book_title, bi.due_back,
           bi.reader_id, u.username AS reader_username, bi.status
    FROM book_instances bi
    JOIN books b ON b.id = bi.book_id
    LEFT JOIN users u ON u.id = bi.reader_id
"#;

const ORDERING: &str = " ORDER BY bi.due_back ASC NULLS LAST, bi.id";

/// Admin search criteria
#[derive(Debug, Default, Clone, Copy)]
pub struct InstanceSearch<'a> {
    /// Identifier prefix or book title fragment
    pub text: Option<&'a str>,
    pub status: Option<BookStatus>,
    pub due_back: Option<NaiveDate>,
    pub reader_id: Option<i32>,
}

impl<'a> InstanceSearch<'a> {
    fn push_conditions(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        let mut separator = " WHERE ";

        if let Some(text) = self.text {
            builder
                .push(separator)
                .push("(bi.id::text ILIKE ")
                .push_bind(starts_with_pattern(text))
                .push(" OR b.title ILIKE ")
                .push_bind(contains_pattern(text))
                .push(")");
            separator = " AND ";
        }
        if let Some(status) = self.status {
            builder.push(separator).push("bi.status = ").push_bind(status);
            separator = " AND ";
        }
        if let Some(due_back) = self.due_back {
            builder.push(separator).push("bi.due_back = ").push_bind(due_back);
            separator = " AND ";
        }
        if let Some(reader_id) = self.reader_id {
            builder.push(separator).push("bi.reader_id = ").push_bind(reader_id);
        }
    }
}

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Postgres>,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(
            "SELECT id, book_id, due_back, reader_id, status FROM book_instances WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    pub async fn get_details(&self, id: Uuid, today: NaiveDate) -> AppResult<BookInstanceDetails> {
        let row = sqlx::query_as::<_, BookInstanceRow>(&format!("{} WHERE bi.id = $1", DETAILS_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))?;
        Ok(row.into_details(today))
    }

    pub async fn count_all(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_by_status(&self, status: BookStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// All copies of a book, as listed inline on its page
    pub async fn list_for_book(
        &self,
        book_id: i32,
        today: NaiveDate,
    ) -> AppResult<Vec<BookInstanceDetails>> {
        let rows = sqlx::query_as::<_, BookInstanceRow>(&format!(
            "{} WHERE bi.book_id = $1{}",
            DETAILS_SELECT, ORDERING
        ))
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_details(today)).collect())
    }

    pub async fn count(&self, search: InstanceSearch<'_>) -> AppResult<i64> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM book_instances bi JOIN books b ON b.id = bi.book_id",
        );
        search.push_conditions(&mut builder);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// One page of copies ordered by due-back date
    pub async fn search(
        &self,
        search: InstanceSearch<'_>,
        window: &PageWindow,
        today: NaiveDate,
    ) -> AppResult<Vec<BookInstanceDetails>> {
        let mut builder = QueryBuilder::<Postgres>::new(DETAILS_SELECT);
        search.push_conditions(&mut builder);
        builder
            .push(ORDERING)
            .push(" LIMIT ")
            .push_bind(window.limit())
            .push(" OFFSET ")
            .push_bind(window.offset());

        let rows = builder
            .build_query_as::<BookInstanceRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.into_details(today)).collect())
    }

    /// Insert a fresh copy with a random identifier
    pub async fn create(
        &self,
        book_id: i32,
        status: BookStatus,
        due_back: Option<NaiveDate>,
        reader_id: Option<i32>,
    ) -> AppResult<BookInstance> {
        let instance = sqlx::query_as::<_, BookInstance>(
            r#"
            INSERT INTO book_instances (id, book_id, due_back, reader_id, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, book_id, due_back, reader_id, status
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(book_id)
        .bind(due_back)
        .bind(reader_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(instance)
    }

    /// Take or extend a copy on behalf of its reader.
    ///
    /// Ownership and status are checked against the locked row; on refusal the
    /// transaction is dropped and the row is left untouched.
    pub async fn take(
        &self,
        id: Uuid,
        user_id: i32,
        due_back: NaiveDate,
    ) -> AppResult<(LendingAction, BookInstance)> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, BookInstance>(
            "SELECT id, book_id, due_back, reader_id, status FROM book_instances WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| not_found(id))?;

        let action = current.plan_take(user_id)?;

        let updated = sqlx::query_as::<_, BookInstance>(
            r#"
            UPDATE book_instances
            SET status = $1, due_back = $2, reader_id = $3
            WHERE id = $4
            RETURNING id, book_id, due_back, reader_id, status
            "#,
        )
        .bind(BookStatus::Taken)
        .bind(due_back)
        .bind(user_id)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((action, updated))
    }

    /// Return (delete) a copy on behalf of its reader
    pub async fn return_to_library(&self, id: Uuid, user_id: i32) -> AppResult<BookInstance> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, BookInstance>(
            "SELECT id, book_id, due_back, reader_id, status FROM book_instances WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| not_found(id))?;

        current.ensure_reader(user_id)?;

        sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(current)
    }

    /// Store an already validated admin edit
    pub async fn update(&self, instance: &BookInstance) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(
            r#"
            UPDATE book_instances
            SET status = $1, due_back = $2, reader_id = $3
            WHERE id = $4
            RETURNING id, book_id, due_back, reader_id, status
            "#,
        )
        .bind(instance.status)
        .bind(instance.due_back)
        .bind(instance.reader_id)
        .bind(instance.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(instance.id))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Book instance {} not found", id))
}
