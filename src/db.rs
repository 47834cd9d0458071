use async_trait::async_trait;
use chrono::FixedOffset;
use sqlx::{Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{NewSubmission, Submission};
use crate::query::{Bounds, FilterState, PageKey};
use crate::store::SubmissionStore;

pub type Db = Pool<Postgres>;

const SELECT_ROWS: &str = "SELECT id, first_name, last_name, email, telegram, phone, feedback, submitted_at FROM contact_submissions";

pub async fn connect(url: &str) -> anyhow::Result<Db> {
    let pool = Pool::<Postgres>::connect(url).await?;
    // crate-relative path for sqlx migrations
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

pub struct PgStore {
    db: Db,
    offset: FixedOffset,
}

impl PgStore {
    pub fn new(db: Db, offset: FixedOffset) -> Self {
        PgStore { db, offset }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, bounds: &Bounds) {
    qb.push(" WHERE TRUE");
    if let Some(pattern) = bounds.like_pattern() {
        qb.push(" AND (first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(from) = bounds.from {
        qb.push(" AND submitted_at >= ").push_bind(from);
    }
    if let Some(to) = bounds.to {
        qb.push(" AND submitted_at <= ").push_bind(to);
    }
}

fn select(bounds: &Bounds) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(SELECT_ROWS);
    push_filters(&mut qb, bounds);
    qb.push(" ORDER BY submitted_at DESC, id DESC");
    qb
}

#[async_trait]
impl SubmissionStore for PgStore {
    async fn insert(&self, new: &NewSubmission) -> Result<Submission, StoreError> {
        let rec = sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO contact_submissions (id, first_name, last_name, email, telegram, phone, feedback)
            VALUES ($1,$2,$3,$4,$5,$6,$7)
            RETURNING id, first_name, last_name, email, telegram, phone, feedback, submitted_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.telegram)
        .bind(&new.phone)
        .bind(&new.feedback)
        .fetch_one(&self.db)
        .await?;
        Ok(rec)
    }

    async fn fetch_page(&self, key: &PageKey) -> Result<Vec<Submission>, StoreError> {
        let window = key.window();
        let mut qb = select(&key.filter.bounds(self.offset));
        qb.push(" LIMIT ")
            .push_bind(window.limit)
            .push(" OFFSET ")
            .push_bind(window.offset);
        Ok(qb.build_query_as::<Submission>().fetch_all(&self.db).await?)
    }

    async fn count(&self, filter: &FilterState) -> Result<u64, StoreError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM contact_submissions");
        push_filters(&mut qb, &filter.bounds(self.offset));
        let n: i64 = qb.build_query_scalar().fetch_one(&self.db).await?;
        Ok(u64::try_from(n).unwrap_or_default())
    }

    async fn fetch_all(&self, filter: &FilterState) -> Result<Vec<Submission>, StoreError> {
        let mut qb = select(&filter.bounds(self.offset));
        Ok(qb.build_query_as::<Submission>().fetch_all(&self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn filters_render_in_order() {
        let bounds = Bounds {
            search: Some("anna".into()),
            from: Some(Utc.with_ymd_and_hms(2026, 3, 1, 21, 0, 0).unwrap()),
            to: None,
        };
        let qb = select(&bounds);
        assert_eq!(
            qb.sql(),
            format!(
                "{SELECT_ROWS} WHERE TRUE AND (first_name ILIKE $1 OR last_name ILIKE $2 OR email ILIKE $3) AND submitted_at >= $4 ORDER BY submitted_at DESC, id DESC"
            )
        );
    }

    #[test]
    fn no_filters_is_plain_select() {
        let qb = select(&Bounds::default());
        assert_eq!(
            qb.sql(),
            format!("{SELECT_ROWS} WHERE TRUE ORDER BY submitted_at DESC, id DESC")
        );
    }
}
