use chrono::{FixedOffset, NaiveDate, Utc};

use crate::error::{ExportError, StoreError};
use crate::export::{self, ExportFile};
use crate::form::InFlight;
use crate::models::Submission;
use crate::notice::Notice;
use crate::query::{self, FilterState, PageKey};
use crate::store::SubmissionStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Loading,
    Error(String),
    Loaded(usize),
}

/// Page and count results for one key, held until both have arrived.
#[derive(Debug)]
struct Pending {
    key: PageKey,
    rows: Option<Result<Vec<Submission>, StoreError>>,
    total: Option<Result<u64, StoreError>>,
}

/// What an export needs once it leaves the view.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub filter: FilterState,
    pub offset: FixedOffset,
    pub today: NaiveDate,
}

/// State behind the admin submissions page.
///
/// Page and count responses are tagged with the key they answer and dropped if
/// the filter or page moved on in the meantime. Rows and total are replaced
/// together, only once both succeeded for the same key; any failure keeps the
/// last good rows and total on screen and flips the status to `Error`.
#[derive(Debug)]
pub struct AdminView {
    offset: FixedOffset,
    filter: FilterState,
    page: u32,
    rows: Vec<Submission>,
    total: u64,
    shown: Option<PageKey>,
    pending: Option<Pending>,
    status: Status,
    exporting: bool,
    notices: Vec<Notice>,
}

impl AdminView {
    pub fn new(offset: FixedOffset) -> Self {
        AdminView {
            offset,
            filter: FilterState::default(),
            page: 1,
            rows: Vec::new(),
            total: 0,
            shown: None,
            pending: None,
            status: Status::Loading,
            exporting: false,
            notices: Vec::new(),
        }
    }

    pub fn key(&self) -> PageKey {
        PageKey::new(self.filter.clone(), self.page)
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn rows(&self) -> &[Submission] {
        &self.rows
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// The key the rows and total on screen answer.
    pub fn shown_key(&self) -> Option<&PageKey> {
        self.shown.as_ref()
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    pub fn total_pages(&self) -> u32 {
        query::total_pages(self.total)
    }

    pub fn page_links(&self) -> Vec<u32> {
        query::page_links(self.page, self.total_pages())
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filter.search = search.into();
        self.page = 1;
    }

    pub fn set_date_from(&mut self, date: Option<NaiveDate>) {
        self.filter.date_from = date;
        self.page = 1;
    }

    pub fn set_date_to(&mut self, date: Option<NaiveDate>) {
        self.filter.date_to = date;
        self.page = 1;
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Marks a load as started and returns the key its responses must carry.
    /// Results still pending for an older key are abandoned.
    pub fn begin_load(&mut self) -> PageKey {
        let key = self.key();
        self.status = Status::Loading;
        self.pending = Some(Pending {
            key: key.clone(),
            rows: None,
            total: None,
        });
        key
    }

    fn pending_for(&mut self, key: &PageKey) -> Option<&mut Pending> {
        if *key != self.key() {
            return None;
        }
        self.pending.as_mut().filter(|p| p.key == *key)
    }

    /// Stages a page response. Returns false if `key` is stale and the response was dropped.
    pub fn apply_page(&mut self, key: &PageKey, result: Result<Vec<Submission>, StoreError>) -> bool {
        let Some(pending) = self.pending_for(key) else {
            tracing::warn!(page = key.page, "dropping stale page response");
            return false;
        };
        pending.rows = Some(result);
        self.try_commit();
        true
    }

    /// Stages a count response. Returns false if `key` is stale and the response was dropped.
    pub fn apply_count(&mut self, key: &PageKey, result: Result<u64, StoreError>) -> bool {
        let Some(pending) = self.pending_for(key) else {
            tracing::warn!(page = key.page, "dropping stale count response");
            return false;
        };
        pending.total = Some(result);
        self.try_commit();
        true
    }

    fn try_commit(&mut self) {
        let ready = self
            .pending
            .as_ref()
            .is_some_and(|p| p.rows.is_some() && p.total.is_some());
        if !ready {
            return;
        }
        let Some(Pending {
            key,
            rows: Some(rows),
            total: Some(total),
        }) = self.pending.take()
        else {
            return;
        };
        match (rows, total) {
            (Ok(rows), Ok(total)) => {
                tracing::info!(rows = rows.len(), total, page = key.page, "page loaded");
                self.status = Status::Loaded(rows.len());
                self.rows = rows;
                self.total = total;
                self.shown = Some(key);
            }
            (Err(e), _) | (_, Err(e)) => self.fail_load(e),
        }
    }

    fn fail_load(&mut self, e: StoreError) {
        tracing::error!(error = %e, "failed to load submissions");
        if !matches!(self.status, Status::Error(_)) {
            self.notices.push(Notice::error(
                "Loading failed",
                "Could not load submissions. Check your connection.",
            ));
        }
        self.status = Status::Error(e.to_string());
    }

    /// Runs the page and count queries for the current key concurrently.
    pub async fn load(&mut self, store: &dyn SubmissionStore) {
        let key = self.begin_load();
        let (page, count) = tokio::join!(store.fetch_page(&key), store.count(&key.filter));
        self.apply_page(&key, page);
        self.apply_count(&key, count);
    }

    pub async fn refresh(&mut self, store: &dyn SubmissionStore) {
        self.load(store).await;
        if !matches!(self.status, Status::Error(_)) {
            self.notices.push(Notice::info("Updated", "Submissions reloaded"));
        }
    }

    /// Marks an export as in flight. Returns `None` while another one is running;
    /// otherwise the caller owes one `finish_export`.
    pub fn begin_export(&mut self) -> Option<ExportRequest> {
        if self.exporting {
            return None;
        }
        self.exporting = true;
        self.notices
            .push(Notice::info("Preparing export…", "Loading all submissions"));
        Some(ExportRequest {
            filter: self.filter.clone(),
            offset: self.offset,
            today: Utc::now().with_timezone(&self.offset).date_naive(),
        })
    }

    pub fn finish_export(&mut self, result: Result<ExportFile, ExportError>) -> Option<ExportFile> {
        self.exporting = false;
        match result {
            Ok(file) => {
                tracing::info!(file = %file.file_name, rows = file.rows, "export finished");
                self.notices.push(Notice::success(
                    "Export finished",
                    format!("{} is ready", file.file_name),
                ));
                Some(file)
            }
            Err(e) => {
                tracing::error!(error = %e, "export failed");
                self.notices
                    .push(Notice::error("Export failed", "Could not export submissions"));
                None
            }
        }
    }

    /// Exports every row matching the current filter. Returns `None` when an
    /// export is already running or this one failed.
    pub async fn export(&mut self, store: &dyn SubmissionStore) -> Option<ExportFile> {
        let req = self.begin_export()?;
        let result = {
            let _in_flight = InFlight::new(&mut self.exporting);
            export::export(store, &req.filter, req.offset, req.today).await
        };
        self.finish_export(result)
    }
}
