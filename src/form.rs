use crate::error::StoreError;
use crate::models::{Draft, Field, NewSubmission, Submission};
use crate::notice::Notice;
use crate::store::SubmissionStore;
use crate::validation::ValidationError;

/// Clears an in-flight flag when dropped, so a cancelled await never leaves it set.
pub(crate) struct InFlight<'a>(&'a mut bool);

impl<'a> InFlight<'a> {
    pub(crate) fn new(flag: &'a mut bool) -> Self {
        *flag = true;
        InFlight(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// A previous attempt is still in flight; nothing was sent.
    Busy,
    Invalid(ValidationError),
    Saved(Submission),
    Failed,
}

/// The contact form: a draft plus the single-flight submit flag.
#[derive(Debug, Default)]
pub struct FormCapture {
    draft: Draft,
    submitting: bool,
    error: Option<ValidationError>,
    notices: Vec<Notice>,
}

impl FormCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.draft.set(field, value);
    }

    pub fn reset(&mut self) {
        self.draft = Draft::default();
        self.error = None;
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// The last validation failure, for showing next to its field.
    pub fn error(&self) -> Option<&ValidationError> {
        self.error.as_ref()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Validates and marks the form in flight. The caller owes one `finish_submit`.
    pub fn begin_submit(&mut self) -> Result<NewSubmission, SubmitOutcome> {
        if self.submitting {
            return Err(SubmitOutcome::Busy);
        }
        match self.draft.validate() {
            Ok(new) => {
                self.error = None;
                self.submitting = true;
                self.notices
                    .push(Notice::info("Sending…", "Saving your contact details"));
                Ok(new)
            }
            Err(e) => {
                tracing::warn!(field = ?e.field(), "submission rejected: {e}");
                self.notices.push(Notice::error("Check the form", e.to_string()));
                self.error = Some(e.clone());
                Err(SubmitOutcome::Invalid(e))
            }
        }
    }

    pub fn finish_submit(&mut self, result: Result<Submission, StoreError>) -> SubmitOutcome {
        self.submitting = false;
        match result {
            Ok(rec) => {
                tracing::info!(id = %rec.id, "submission saved");
                self.notices.push(Notice::success(
                    "Thank you!",
                    "Your details are saved. We will be in touch soon.",
                ));
                self.reset();
                SubmitOutcome::Saved(rec)
            }
            Err(e) => {
                tracing::error!(error = %e, "submission insert failed");
                self.notices.push(Notice::error(
                    "Something went wrong",
                    "We could not save your details. Please try again.",
                ));
                SubmitOutcome::Failed
            }
        }
    }

    pub async fn submit(&mut self, store: &dyn SubmissionStore) -> SubmitOutcome {
        let new = match self.begin_submit() {
            Ok(new) => new,
            Err(outcome) => return outcome,
        };
        let result = {
            let _in_flight = InFlight::new(&mut self.submitting);
            store.insert(&new).await
        };
        self.finish_submit(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::Level;
    use crate::query::{FilterState, PageKey};
    use crate::store::tests::offset;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingStore {
        inserts: AtomicUsize,
    }

    #[async_trait]
    impl SubmissionStore for FailingStore {
        async fn insert(&self, _new: &NewSubmission) -> Result<Submission, StoreError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Status {
                status: 503,
                body: "unavailable".into(),
            })
        }
        async fn fetch_page(&self, _key: &PageKey) -> Result<Vec<Submission>, StoreError> {
            Ok(Vec::new())
        }
        async fn count(&self, _filter: &FilterState) -> Result<u64, StoreError> {
            Ok(0)
        }
        async fn fetch_all(&self, _filter: &FilterState) -> Result<Vec<Submission>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn filled() -> FormCapture {
        let mut form = FormCapture::new();
        form.set_field(Field::FirstName, "Anna");
        form.set_field(Field::LastName, "Petrova");
        form.set_field(Field::Email, "Anna@Example.com");
        form.set_field(Field::Telegram, "@anna");
        form.set_field(Field::Phone, "+7 900 000 00 00");
        form
    }

    #[tokio::test]
    async fn valid_submit_saves_and_clears_draft() {
        let store = MemoryStore::new(offset());
        let mut form = filled();

        let outcome = form.submit(&store).await;
        let SubmitOutcome::Saved(rec) = outcome else {
            panic!("expected saved, got {outcome:?}");
        };
        assert_eq!(rec.email, "anna@example.com");
        assert_eq!(form.draft(), &Draft::default());
        assert!(!form.is_submitting());

        let notices = form.drain_notices();
        assert_eq!(notices.last().map(|n| n.level), Some(Level::Success));
        assert_eq!(store.count(&FilterState::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_field_never_reaches_store() {
        let store = FailingStore {
            inserts: AtomicUsize::new(0),
        };
        for field in [
            Field::FirstName,
            Field::LastName,
            Field::Email,
            Field::Telegram,
            Field::Phone,
        ] {
            let mut form = filled();
            form.set_field(field, "   ");
            let before = form.draft().clone();
            let outcome = form.submit(&store).await;
            assert!(matches!(outcome, SubmitOutcome::Invalid(ValidationError::Missing(f)) if f == field));
            assert_eq!(form.draft(), &before);
            assert_eq!(form.error().map(|e| e.field()), Some(field));
        }
        assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_insert_keeps_draft() {
        let store = FailingStore {
            inserts: AtomicUsize::new(0),
        };
        let mut form = filled();
        let before = form.draft().clone();

        assert!(matches!(form.submit(&store).await, SubmitOutcome::Failed));
        assert_eq!(form.draft(), &before);
        assert!(!form.is_submitting());
        assert_eq!(store.inserts.load(Ordering::SeqCst), 1);

        let notices = form.drain_notices();
        assert_eq!(notices.last().map(|n| n.level), Some(Level::Error));
    }

    struct HangingStore;

    #[async_trait]
    impl SubmissionStore for HangingStore {
        async fn insert(&self, _new: &NewSubmission) -> Result<Submission, StoreError> {
            std::future::pending().await
        }
        async fn fetch_page(&self, _key: &PageKey) -> Result<Vec<Submission>, StoreError> {
            Ok(Vec::new())
        }
        async fn count(&self, _filter: &FilterState) -> Result<u64, StoreError> {
            Ok(0)
        }
        async fn fetch_all(&self, _filter: &FilterState) -> Result<Vec<Submission>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn cancelled_submit_clears_in_flight() {
        let mut form = filled();
        let before = form.draft().clone();
        {
            let fut = form.submit(&HangingStore);
            tokio::pin!(fut);
            tokio::select! {
                biased;
                _ = &mut fut => panic!("insert never completes"),
                _ = tokio::task::yield_now() => {}
            }
        }
        assert!(!form.is_submitting());
        assert_eq!(form.draft(), &before);
        assert!(form.begin_submit().is_ok());
    }

    #[test]
    fn second_submit_while_in_flight_is_busy() {
        let mut form = filled();
        assert!(form.begin_submit().is_ok());
        assert!(form.is_submitting());
        assert!(matches!(form.begin_submit(), Err(SubmitOutcome::Busy)));
    }
}
