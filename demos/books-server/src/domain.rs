//! The books library.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

/// Accepted genres.
pub const GENRES: [&str; 4] = ["science-fiction", "horror", "romance", "fantasy"];

/// A book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Identifier, assigned on creation.
    pub id: i32,
    /// Title.
    pub title: String,
    /// One of [`GENRES`].
    pub genre: String,
    /// Synopsis.
    pub synopsis: String,
}

/// Domain failures.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    /// The genre is not one of [`GENRES`].
    #[error("unknown genre {0:?}")]
    UnknownGenre(String),

    /// A freshly inserted book could not be read back.
    #[error("expected 1 book, got {0}")]
    Inconsistent(usize),
}

/// Filters for [`BookRepository::select`]; `None` means no filter.
#[derive(Debug, Clone, Default)]
pub struct SelectParams {
    /// Match this id.
    pub id: Option<i32>,
    /// Match this genre.
    pub genre: Option<String>,
}

/// Filters for [`BookRepository::delete`]; `None` means no filter.
#[derive(Debug, Clone, Default)]
pub struct DeleteParams {
    /// Match this id.
    pub id: Option<i32>,
    /// Match this genre.
    pub genre: Option<String>,
}

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Book>,
    last_id: i32,
}

/// In-memory book storage, ordered by id.
#[derive(Debug, Default)]
pub struct BookRepository {
    table: RwLock<Table>,
}

impl BookRepository {
    /// An empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Books matching every given filter.
    pub async fn select(&self, params: &SelectParams) -> Vec<Book> {
        let table = self.table.read().await;
        table
            .rows
            .iter()
            .filter(|book| params.id.is_none_or(|id| book.id == id))
            .filter(|book| params.genre.as_deref().is_none_or(|g| book.genre == g))
            .cloned()
            .collect()
    }

    /// Store a new book and return its id.
    pub async fn insert(&self, title: String, genre: String, synopsis: String) -> i32 {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let id = table.last_id;
        table.rows.push(Book {
            id,
            title,
            genre,
            synopsis,
        });
        id
    }

    /// Remove the books matching every given filter and return how many
    /// were removed. No filter removes everything.
    pub async fn delete(&self, params: &DeleteParams) -> usize {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|book| {
            let id_matches = params.id.is_none_or(|id| book.id == id);
            let genre_matches = params.genre.as_deref().is_none_or(|g| book.genre == g);
            !(id_matches && genre_matches)
        });
        before - table.rows.len()
    }
}

/// Book use cases.
#[derive(Debug, Default)]
pub struct BookService {
    repository: BookRepository,
}

impl BookService {
    /// Serve books from `repository`.
    #[must_use]
    pub const fn new(repository: BookRepository) -> Self {
        Self { repository }
    }

    /// Books, optionally of one genre.
    #[tracing::instrument(name = "BookService ListBooks", skip(self))]
    pub async fn list_books(&self, genre: Option<String>) -> Vec<Book> {
        self.repository
            .select(&SelectParams { id: None, genre })
            .await
    }

    /// Create a book and return it as stored.
    #[tracing::instrument(name = "BookService CreateBook", skip(self, synopsis))]
    pub async fn create_book(
        &self,
        title: String,
        genre: String,
        synopsis: String,
    ) -> Result<Book, DomainError> {
        if !GENRES.contains(&genre.as_str()) {
            return Err(DomainError::UnknownGenre(genre));
        }

        let id = self.repository.insert(title, genre, synopsis).await;
        let mut books = self
            .repository
            .select(&SelectParams {
                id: Some(id),
                genre: None,
            })
            .await;

        match books.len() {
            1 => Ok(books.remove(0)),
            n => Err(DomainError::Inconsistent(n)),
        }
    }

    /// Delete the matching books and return how many were removed.
    #[tracing::instrument(name = "BookService DeleteBook", skip(self))]
    pub async fn delete_books(&self, id: Option<i32>, genre: Option<String>) -> usize {
        self.repository.delete(&DeleteParams { id, genre }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn seeded() -> BookService {
        let service = BookService::default();
        for (title, genre) in [
            ("Dune", "science-fiction"),
            ("It", "horror"),
            ("Hyperion", "science-fiction"),
        ] {
            service
                .create_book(title.to_string(), genre.to_string(), String::new())
                .await
                .unwrap();
        }
        service
    }

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let service = seeded().await;
        let ids: Vec<i32> = service
            .list_books(None)
            .await
            .iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_genre() {
        let service = BookService::default();
        let err = service
            .create_book("x".to_string(), "poetry".to_string(), String::new())
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::UnknownGenre("poetry".to_string()));
    }

    #[tokio::test]
    async fn test_list_by_genre() {
        let service = seeded().await;
        let titles: Vec<String> = service
            .list_books(Some("science-fiction".to_string()))
            .await
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["Dune", "Hyperion"]);
    }

    #[tokio::test]
    async fn test_delete_filters_combine() {
        let service = seeded().await;
        assert_eq!(
            service
                .delete_books(Some(2), Some("science-fiction".to_string()))
                .await,
            0
        );
        assert_eq!(
            service
                .delete_books(None, Some("science-fiction".to_string()))
                .await,
            2
        );
        assert_eq!(service.delete_books(None, None).await, 1);
        assert!(service.list_books(None).await.is_empty());
    }
}
