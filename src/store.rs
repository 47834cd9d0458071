use async_trait::async_trait;
use chrono::{FixedOffset, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{NewSubmission, Submission};
use crate::query::{self, FilterState, PageKey};

/// The storage boundary: insert-one, filtered page, filtered count, filtered all.
/// Reads are ordered newest first.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn insert(&self, new: &NewSubmission) -> Result<Submission, StoreError>;

    async fn fetch_page(&self, key: &PageKey) -> Result<Vec<Submission>, StoreError>;

    async fn count(&self, filter: &FilterState) -> Result<u64, StoreError>;

    /// Every matching record, unpaginated.
    async fn fetch_all(&self, filter: &FilterState) -> Result<Vec<Submission>, StoreError>;
}

/// Process-local store, used when no database is configured and in tests.
pub struct MemoryStore {
    offset: FixedOffset,
    rows: RwLock<Vec<Submission>>,
}

impl MemoryStore {
    pub fn new(offset: FixedOffset) -> Self {
        Self::with_rows(offset, Vec::new())
    }

    pub fn with_rows(offset: FixedOffset, rows: Vec<Submission>) -> Self {
        MemoryStore {
            offset,
            rows: RwLock::new(rows),
        }
    }

    async fn matching(&self, filter: &FilterState) -> Vec<Submission> {
        let bounds = filter.bounds(self.offset);
        let mut rows: Vec<Submission> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|s| bounds.matches(s))
            .cloned()
            .collect();
        query::sort_newest_first(&mut rows);
        rows
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn insert(&self, new: &NewSubmission) -> Result<Submission, StoreError> {
        let rec = Submission {
            id: Uuid::new_v4(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            email: new.email.clone(),
            telegram: new.telegram.clone(),
            phone: new.phone.clone(),
            feedback: new.feedback.clone(),
            submitted_at: Utc::now(),
        };
        self.rows.write().await.push(rec.clone());
        Ok(rec)
    }

    async fn fetch_page(&self, key: &PageKey) -> Result<Vec<Submission>, StoreError> {
        let window = key.window();
        Ok(self
            .matching(&key.filter)
            .await
            .into_iter()
            .skip(usize::try_from(window.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(window.limit).unwrap_or(0))
            .collect())
    }

    async fn count(&self, filter: &FilterState) -> Result<u64, StoreError> {
        Ok(self.matching(filter).await.len() as u64)
    }

    async fn fetch_all(&self, filter: &FilterState) -> Result<Vec<Submission>, StoreError> {
        Ok(self.matching(filter).await)
    }
}
