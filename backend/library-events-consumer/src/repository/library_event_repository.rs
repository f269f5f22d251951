use library_event_schema::{LibraryEvent, LibraryEventType};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::debug;

use super::LibraryEventRepository;
use crate::models::{BookEntity, LibraryEventEntity};

/// PostgreSQL repository for library events and books
#[derive(Clone)]
pub struct PgLibraryEventRepository {
    pool: PgPool,
}

impl PgLibraryEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn upsert_event(
        tx: &mut Transaction<'_, Postgres>,
        event: &LibraryEvent,
    ) -> Result<i32, sqlx::Error> {
        let row = match event.library_event_id {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO library_events (library_event_type)
                    VALUES ($1)
                    RETURNING library_event_id
                    "#,
                )
                .bind(event.library_event_type.as_str())
                .fetch_one(&mut **tx)
                .await?
            }
            Some(id) => {
                sqlx::query(
                    r#"
                    INSERT INTO library_events (library_event_id, library_event_type)
                    VALUES ($1, $2)
                    ON CONFLICT (library_event_id) DO UPDATE SET
                        library_event_type = EXCLUDED.library_event_type
                    RETURNING library_event_id
                    "#,
                )
                .bind(id)
                .bind(event.library_event_type.as_str())
                .fetch_one(&mut **tx)
                .await?
            }
        };

        row.try_get("library_event_id")
    }

    async fn upsert_book(
        tx: &mut Transaction<'_, Postgres>,
        book: &BookEntity,
    ) -> Result<(), sqlx::Error> {
        // One book per event: drop whatever this event pointed at before
        sqlx::query("DELETE FROM books WHERE library_event_id = $1 AND book_id <> $2")
            .bind(book.library_event_id)
            .bind(book.book_id)
            .execute(&mut **tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO books (book_id, book_name, book_author, library_event_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (book_id) DO UPDATE SET
                book_name = EXCLUDED.book_name,
                book_author = EXCLUDED.book_author,
                library_event_id = EXCLUDED.library_event_id
            "#,
        )
        .bind(book.book_id)
        .bind(&book.book_name)
        .bind(&book.book_author)
        .bind(book.library_event_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl LibraryEventRepository for PgLibraryEventRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<LibraryEventEntity>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT e.library_event_id, e.library_event_type,
                   b.book_id, b.book_name, b.book_author
            FROM library_events e
            LEFT JOIN books b ON b.library_event_id = e.library_event_id
            WHERE e.library_event_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let library_event_id: i32 = row.try_get("library_event_id")?;
        let raw_type: String = row.try_get("library_event_type")?;
        let library_event_type = raw_type
            .parse::<LibraryEventType>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?;

        let book = match row.try_get::<Option<i32>, _>("book_id")? {
            Some(book_id) => Some(BookEntity {
                book_id,
                book_name: row.try_get("book_name")?,
                book_author: row.try_get("book_author")?,
                library_event_id,
            }),
            None => None,
        };

        Ok(Some(LibraryEventEntity {
            library_event_id,
            library_event_type,
            book,
        }))
    }

    async fn save(&self, event: &LibraryEvent) -> Result<LibraryEventEntity, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let library_event_id = Self::upsert_event(&mut tx, event).await?;
        let book = BookEntity::linked_to(library_event_id, &event.book);
        Self::upsert_book(&mut tx, &book).await?;

        tx.commit().await?;

        debug!(
            library_event_id,
            book_id = book.book_id,
            event_type = %event.library_event_type,
            "Persisted library event"
        );

        Ok(LibraryEventEntity {
            library_event_id,
            library_event_type: event.library_event_type,
            book: Some(book),
        })
    }
}
