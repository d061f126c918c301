//! Reservation, borrowing and return of book copies

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::CatalogConfig,
    error::{AppError, AppResult},
    models::{
        book::BookShort,
        book_instance::{
            due_date, today, BookInstance, BookInstanceDetails, BookInstanceFilter,
            BookStatus, CreateBookInstance, LendingUpdate, PatchBookInstance,
        },
        Page, PageWindow,
    },
    repository::{book_instances::InstanceSearch, Repository},
};

/// What the reservation page shows before the reader confirms
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReservationForm {
    pub book: BookShort,
    /// Due-back date the reservation would get
    pub due_back: NaiveDate,
}

#[derive(Clone)]
pub struct LendingService {
    repository: Repository,
    config: CatalogConfig,
}

impl LendingService {
    pub fn new(repository: Repository, config: CatalogConfig) -> Self {
        Self { repository, config }
    }

    fn next_due_date(&self) -> NaiveDate {
        due_date(today(), self.config.loan_period_days)
    }

    pub async fn reservation_form(&self, book_id: i32) -> AppResult<ReservationForm> {
        let book = self.repository.books.get_short(book_id).await?;
        Ok(ReservationForm {
            book,
            due_back: self.next_due_date(),
        })
    }

    /// Create a new reserved copy of `book_id` for `user_id`
    pub async fn reserve(&self, user_id: i32, book_id: i32) -> AppResult<BookInstanceDetails> {
        self.repository.books.get_short(book_id).await?;

        let instance = self
            .repository
            .book_instances
            .create(
                book_id,
                BookStatus::Reserved,
                Some(self.next_due_date()),
                Some(user_id),
            )
            .await?;

        tracing::info!(
            instance_id = %instance.id,
            book_id = book_id,
            user_id = user_id,
            "Book reserved"
        );

        self.repository
            .book_instances
            .get_details(instance.id, today())
            .await
    }

    /// Take a reserved copy, or extend a taken one, for its reader
    pub async fn take_or_extend(&self, user_id: i32, id: Uuid) -> AppResult<LendingUpdate> {
        let (action, instance) = self
            .repository
            .book_instances
            .take(id, user_id, self.next_due_date())
            .await
            .map_err(|e| {
                if matches!(e, AppError::Authorization(_) | AppError::BusinessRule(_)) {
                    tracing::warn!(instance_id = %id, user_id = user_id, "Take refused: {}", e);
                }
                e
            })?;

        tracing::info!(
            instance_id = %instance.id,
            user_id = user_id,
            action = ?action,
            due_back = ?instance.due_back,
            "Book instance taken"
        );

        let instance = self
            .repository
            .book_instances
            .get_details(instance.id, today())
            .await?;
        Ok(LendingUpdate { action, instance })
    }

    /// Return a copy; the copy leaves the catalog
    pub async fn return_instance(&self, user_id: i32, id: Uuid) -> AppResult<BookInstance> {
        let instance = self
            .repository
            .book_instances
            .return_to_library(id, user_id)
            .await
            .map_err(|e| {
                if matches!(e, AppError::Authorization(_)) {
                    tracing::warn!(instance_id = %id, user_id = user_id, "Return refused: {}", e);
                }
                e
            })?;

        tracing::info!(instance_id = %id, user_id = user_id, "Book instance returned");
        Ok(instance)
    }

    /// Copies currently assigned to `user_id`, soonest due first
    pub async fn my_instances(
        &self,
        user_id: i32,
        page: Option<&str>,
    ) -> AppResult<Page<BookInstanceDetails>> {
        let search = InstanceSearch {
            reader_id: Some(user_id),
            ..Default::default()
        };
        let total = self.repository.book_instances.count(search).await?;
        let window = PageWindow::resolve(page, total, self.config.my_books_per_page);
        let items = self
            .repository
            .book_instances
            .search(search, &window, today())
            .await?;
        Ok(Page::new(items, window, total))
    }

    /// A copy as seen by its reader
    pub async fn get_own_instance(&self, user_id: i32, id: Uuid) -> AppResult<BookInstanceDetails> {
        let instance = self.repository.book_instances.get_by_id(id).await?;
        instance.ensure_reader(user_id)?;
        self.repository.book_instances.get_details(id, today()).await
    }

    // =========================================================================
    // ADMIN
    // =========================================================================

    pub async fn list_instances(
        &self,
        filter: &BookInstanceFilter,
    ) -> AppResult<Page<BookInstanceDetails>> {
        let text = filter
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());
        let search = InstanceSearch {
            text,
            status: filter.status,
            due_back: filter.due_back,
            reader_id: None,
        };

        let total = self.repository.book_instances.count(search).await?;
        let window = PageWindow::resolve(
            filter.page.as_deref(),
            total,
            self.config.books_per_page,
        );
        let items = self
            .repository
            .book_instances
            .search(search, &window, today())
            .await?;
        Ok(Page::new(items, window, total))
    }

    /// Copies of one book, as listed under it in the admin
    pub async fn list_book_instances(&self, book_id: i32) -> AppResult<Vec<BookInstanceDetails>> {
        self.repository.books.get_short(book_id).await?;
        self.repository
            .book_instances
            .list_for_book(book_id, today())
            .await
    }

    pub async fn get_instance(&self, id: Uuid) -> AppResult<BookInstanceDetails> {
        self.repository.book_instances.get_details(id, today()).await
    }

    pub async fn create_instance(&self, data: &CreateBookInstance) -> AppResult<BookInstanceDetails> {
        data.check()?;
        self.repository.books.get_short(data.book_id).await?;

        let instance = self
            .repository
            .book_instances
            .create(data.book_id, data.status(), data.due_back, data.reader_id)
            .await?;
        tracing::info!(instance_id = %instance.id, book_id = data.book_id, "Book instance created");

        self.get_instance(instance.id).await
    }

    pub async fn patch_instance(
        &self,
        id: Uuid,
        patch: &PatchBookInstance,
    ) -> AppResult<BookInstanceDetails> {
        let current = self.repository.book_instances.get_by_id(id).await?;
        let updated = patch.apply(&current)?;
        self.repository.book_instances.update(&updated).await?;

        tracing::info!(
            instance_id = %id,
            status = %updated.status,
            reader_id = ?updated.reader_id,
            "Book instance updated"
        );
        self.get_instance(id).await
    }

    pub async fn delete_instance(&self, id: Uuid) -> AppResult<()> {
        self.repository.book_instances.delete(id).await?;
        tracing::info!(instance_id = %id, "Book instance deleted");
        Ok(())
    }
}
