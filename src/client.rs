use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::error::StoreError;
use crate::models::{Draft, NewSubmission, Submission};
use crate::query::{FilterState, PageKey};
use crate::routes::{CountResponse, ListParams, PageResponse};
use crate::store::SubmissionStore;

/// A `SubmissionStore` that talks to a running site over its JSON API.
pub struct HttpStore {
    client: Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpStore {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &ListParams) -> Result<T, StoreError> {
        let res = self.client.get(self.url(path)).query(params).send().await?;
        decode(res).await
    }
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, StoreError> {
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(StoreError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(res.json::<T>().await?)
}

#[async_trait]
impl SubmissionStore for HttpStore {
    async fn insert(&self, new: &NewSubmission) -> Result<Submission, StoreError> {
        let res = self
            .client
            .post(self.url("/api/submissions"))
            .json(&Draft::from(new))
            .send()
            .await?;
        decode(res).await
    }

    async fn fetch_page(&self, key: &PageKey) -> Result<Vec<Submission>, StoreError> {
        let params = ListParams::from_key(key);
        let page: PageResponse = self.get("/api/submissions", &params).await?;
        Ok(page.rows)
    }

    async fn count(&self, filter: &FilterState) -> Result<u64, StoreError> {
        let params = ListParams::from_filter(filter);
        let res: CountResponse = self.get("/api/submissions/count", &params).await?;
        Ok(res.count)
    }

    async fn fetch_all(&self, filter: &FilterState) -> Result<Vec<Submission>, StoreError> {
        self.get("/api/submissions/all", &ListParams::from_filter(filter))
            .await
    }
}
