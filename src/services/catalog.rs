//! Catalog browsing and administration service

use validator::Validate;

use crate::{
    config::CatalogConfig,
    error::AppResult,
    models::{
        author::{Author, AuthorDetails, AuthorListEntry, CreateAuthor, UpdateAuthor},
        book::{Book, BookDetails, BookListEntry, CreateBook, UpdateBook},
        book_instance::{today, BookStatus},
        genre::{Genre, GenreForm},
        Page, PageWindow,
    },
    repository::{books::BookSearch, Repository},
};

/// Counts shown on the landing page
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct CatalogSummary {
    pub num_books: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_authors: i64,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    config: CatalogConfig,
}

impl CatalogService {
    pub fn new(repository: Repository, config: CatalogConfig) -> Self {
        Self { repository, config }
    }

    pub async fn summary(&self) -> AppResult<CatalogSummary> {
        Ok(CatalogSummary {
            num_books: self.repository.books.count_all().await?,
            num_instances: self.repository.book_instances.count_all().await?,
            num_instances_available: self
                .repository
                .book_instances
                .count_by_status(BookStatus::Available)
                .await?,
            num_authors: self.repository.authors.count_all().await?,
        })
    }

    /// Authors whose last name starts with, or first name contains, `search`
    pub async fn list_authors(
        &self,
        search: Option<&str>,
        page: Option<&str>,
    ) -> AppResult<Page<AuthorListEntry>> {
        let total = self.repository.authors.count(search).await?;
        let window = PageWindow::resolve(page, total, self.config.authors_per_page);
        let authors = self.repository.authors.search(search, &window).await?;
        Ok(Page::new(authors, window, total))
    }

    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetails> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.authors.get_books(id).await?;
        Ok(AuthorDetails::new(author, books))
    }

    /// Books whose title or summary contains, or author last name starts with, `search`
    pub async fn list_books(
        &self,
        search: Option<&str>,
        page: Option<&str>,
    ) -> AppResult<Page<BookListEntry>> {
        self.search_books(
            BookSearch {
                text: search,
                genre_id: None,
            },
            page,
        )
        .await
    }

    pub async fn search_books(
        &self,
        search: BookSearch<'_>,
        page: Option<&str>,
    ) -> AppResult<Page<BookListEntry>> {
        let total = self.repository.books.count(search).await?;
        let window = PageWindow::resolve(page, total, self.config.books_per_page);
        let books = self.repository.books.search(search, &window).await?;
        Ok(Page::new(books, window, total))
    }

    pub async fn get_book(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.repository.books.get_by_id(id).await?;
        let author = self.repository.authors.get_by_id(book.author_id).await?;
        let genres = self.repository.genres.list_for_book(id).await?;
        let instances = self
            .repository
            .book_instances
            .list_for_book(id, today())
            .await?;
        let reviews = self.repository.reviews.list_for_book(id).await?;
        Ok(BookDetails::new(book, author, genres, instances, reviews))
    }

    // =========================================================================
    // ADMIN
    // =========================================================================

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list().await
    }

    pub async fn create_genre(&self, form: &GenreForm) -> AppResult<Genre> {
        form.validate()?;
        let genre = self.repository.genres.create(form).await?;
        tracing::info!(genre_id = genre.id, "Genre created");
        Ok(genre)
    }

    pub async fn update_genre(&self, id: i32, form: &GenreForm) -> AppResult<Genre> {
        form.validate()?;
        self.repository.genres.update(id, form).await
    }

    pub async fn delete_genre(&self, id: i32) -> AppResult<()> {
        self.repository.genres.delete(id).await?;
        tracing::info!(genre_id = id, "Genre deleted");
        Ok(())
    }

    pub async fn create_author(&self, data: &CreateAuthor) -> AppResult<Author> {
        data.validate()?;
        let author = self.repository.authors.create(data).await?;
        tracing::info!(author_id = author.id, "Author created");
        Ok(author)
    }

    pub async fn update_author(&self, id: i32, data: &UpdateAuthor) -> AppResult<Author> {
        data.validate()?;
        self.repository.authors.update(id, data).await
    }

    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!(author_id = id, "Author deleted");
        Ok(())
    }

    pub async fn create_book(&self, data: &CreateBook) -> AppResult<Book> {
        data.validate()?;
        let book = self.repository.books.create(data).await?;
        tracing::info!(book_id = book.id, author_id = book.author_id, "Book created");
        Ok(book)
    }

    pub async fn update_book(&self, id: i32, data: &UpdateBook) -> AppResult<Book> {
        data.validate()?;
        self.repository.books.update(id, data).await
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }
}
