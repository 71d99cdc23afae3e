use crate::models::WebsiteEvent;
use crate::query::types::{
    AggregateRow, DateRange, Dimension, EventDataSummary, MetricRow, QueryFilters, TimePoint,
    TimeUnit,
};
use crate::query::{StatsRepo, StoreError, StoreResult};
use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub async fn new(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

fn numeric_row(pairs: &[(&str, Option<i64>)]) -> AggregateRow {
    let mut row = AggregateRow::new();
    for (key, value) in pairs {
        let json = match value {
            Some(n) => serde_json::Value::from(*n),
            None => serde_json::Value::Null,
        };
        row.insert((*key).to_string(), json);
    }
    row
}

/// Reject unknown zone names before they reach `AT TIME ZONE`.
fn validate_timezone(timezone: &str) -> StoreResult<()> {
    timezone
        .parse::<chrono_tz::Tz>()
        .map(|_| ())
        .map_err(|_| StoreError::Other(anyhow!("unknown timezone: {timezone}")))
}

fn push_scope(
    qb: &mut QueryBuilder<'_, Postgres>,
    website_id: &str,
    filters: &QueryFilters,
    range: &DateRange,
) {
    qb.push("website_id = ");
    qb.push_bind(website_id.to_string());
    qb.push(" AND created_at >= ");
    qb.push_bind(range.start_at.timestamp());
    qb.push(" AND created_at < ");
    qb.push_bind(range.end_at.timestamp());
    for (column, value) in filters.entries() {
        qb.push(format!(" AND {column} = "));
        qb.push_bind(value.to_string());
    }
}

#[async_trait]
impl StatsRepo for PostgresStore {
    async fn init(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS website_event (
                id BIGSERIAL PRIMARY KEY,
                website_id TEXT NOT NULL,
                session_id TEXT NOT NULL,
                visit_id TEXT NOT NULL,
                created_at BIGINT NOT NULL,
                event_type INTEGER NOT NULL DEFAULT 1,
                event_name TEXT,
                url_path TEXT NOT NULL,
                url_query TEXT,
                page_title TEXT,
                hostname TEXT,
                referrer_domain TEXT,
                browser TEXT,
                os TEXT,
                device TEXT,
                country TEXT,
                region TEXT,
                city TEXT,
                language TEXT,
                screen TEXT
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_event_website_created
             ON website_event(website_id, created_at)",
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS event_data (
                id BIGSERIAL PRIMARY KEY,
                website_id TEXT NOT NULL,
                event_id BIGINT NOT NULL,
                data_key TEXT NOT NULL,
                data_type INTEGER NOT NULL,
                string_value TEXT,
                number_value DOUBLE PRECISION,
                created_at BIGINT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_event_data_website_created
             ON event_data(website_id, created_at)",
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn insert_event(&self, event: &WebsiteEvent) -> StoreResult<()> {
        let event_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO website_event (
                website_id, session_id, visit_id, created_at, event_type,
                event_name, url_path, url_query, page_title, hostname,
                referrer_domain, browser, os, device, country, region, city,
                language, screen
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING id
            "#,
        )
        .bind(&event.website_id)
        .bind(&event.session_id)
        .bind(&event.visit_id)
        .bind(event.created_at.timestamp())
        .bind(event.kind.as_i64() as i32)
        .bind(&event.event_name)
        .bind(&event.url_path)
        .bind(&event.url_query)
        .bind(&event.page_title)
        .bind(&event.hostname)
        .bind(&event.referrer_domain)
        .bind(&event.browser)
        .bind(&event.os)
        .bind(&event.device)
        .bind(&event.country)
        .bind(&event.region)
        .bind(&event.city)
        .bind(&event.language)
        .bind(&event.screen)
        .fetch_one(self.pool.as_ref())
        .await?;

        if let Some(data) = &event.data {
            for (key, value) in data {
                let (data_type, string_value, number_value) = match value {
                    serde_json::Value::String(s) => (1i32, Some(s.clone()), None),
                    serde_json::Value::Number(n) => (2, None, n.as_f64()),
                    serde_json::Value::Bool(b) => (3, None, Some(if *b { 1.0 } else { 0.0 })),
                    other => (4, Some(other.to_string()), None),
                };
                sqlx::query(
                    r#"
                    INSERT INTO event_data (
                        website_id, event_id, data_key, data_type,
                        string_value, number_value, created_at
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(&event.website_id)
                .bind(event_id)
                .bind(key)
                .bind(data_type)
                .bind(string_value)
                .bind(number_value)
                .bind(event.created_at.timestamp())
                .execute(self.pool.as_ref())
                .await?;
            }
        }

        Ok(())
    }

    async fn get_aggregate(
        &self,
        website_id: &str,
        filters: &QueryFilters,
        range: &DateRange,
    ) -> StoreResult<AggregateRow> {
        #[derive(sqlx::FromRow)]
        struct Row {
            pageviews: Option<i64>,
            visitors: Option<i64>,
            visits: Option<i64>,
            bounces: Option<i64>,
            totaltime: Option<i64>,
        }

        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            r#"
            SELECT SUM(t.c)::bigint AS pageviews,
                   COUNT(DISTINCT t.session_id) AS visitors,
                   COUNT(*) AS visits,
                   SUM(CASE WHEN t.c = 1 THEN 1 ELSE 0 END)::bigint AS bounces,
                   SUM(t.time)::bigint AS totaltime
            FROM (
                SELECT session_id,
                       COUNT(*) AS c,
                       MAX(created_at) - MIN(created_at) AS time
                FROM website_event
                WHERE event_type = 1 AND "#,
        );
        push_scope(&mut qb, website_id, filters, range);
        qb.push(" GROUP BY session_id, visit_id) AS t");

        let row: Row = qb.build_query_as().fetch_one(self.pool.as_ref()).await?;
        Ok(numeric_row(&[
            ("pageviews", row.pageviews),
            ("visitors", row.visitors),
            ("visits", row.visits),
            ("bounces", row.bounces),
            ("totaltime", row.totaltime),
        ]))
    }

    async fn get_session_aggregate(
        &self,
        website_id: &str,
        filters: &QueryFilters,
        range: &DateRange,
    ) -> StoreResult<AggregateRow> {
        #[derive(sqlx::FromRow)]
        struct Row {
            pageviews: Option<i64>,
            visitors: Option<i64>,
            visits: Option<i64>,
            countries: Option<i64>,
            events: Option<i64>,
        }

        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            r#"
            SELECT SUM(CASE WHEN event_type = 1 THEN 1 ELSE 0 END)::bigint AS pageviews,
                   COUNT(DISTINCT session_id) AS visitors,
                   COUNT(DISTINCT visit_id) AS visits,
                   COUNT(DISTINCT country) AS countries,
                   SUM(CASE WHEN event_type = 2 THEN 1 ELSE 0 END)::bigint AS events
            FROM website_event
            WHERE "#,
        );
        push_scope(&mut qb, website_id, filters, range);

        let row: Row = qb.build_query_as().fetch_one(self.pool.as_ref()).await?;
        Ok(numeric_row(&[
            ("pageviews", row.pageviews),
            ("visitors", row.visitors),
            ("visits", row.visits),
            ("countries", row.countries),
            ("events", row.events),
        ]))
    }

    async fn get_metric_rows(
        &self,
        website_id: &str,
        filters: &QueryFilters,
        range: &DateRange,
        dimension: Dimension,
        limit: i64,
    ) -> StoreResult<Vec<MetricRow>> {
        let column = dimension.column();
        let measure = if dimension.ranks_by_visitors() {
            "COUNT(DISTINCT session_id)"
        } else {
            "COUNT(*)"
        };

        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {column} AS x, {measure} AS y
             FROM website_event
             WHERE event_type = 1
               AND {column} IS NOT NULL AND {column} != ''
               AND "
        ));
        push_scope(&mut qb, website_id, filters, range);
        qb.push(format!(" GROUP BY {column} ORDER BY y DESC, x ASC LIMIT "));
        qb.push_bind(limit);

        let rows = qb.build_query_as().fetch_all(self.pool.as_ref()).await?;
        Ok(rows)
    }

    async fn get_pageview_series(
        &self,
        website_id: &str,
        filters: &QueryFilters,
        range: &DateRange,
        unit: TimeUnit,
        timezone: &str,
    ) -> StoreResult<Vec<TimePoint>> {
        validate_timezone(timezone)?;

        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT to_char(date_trunc('{unit}', to_timestamp(created_at) AT TIME ZONE ",
            unit = unit.pg_unit()
        ));
        qb.push_bind(timezone.to_string());
        qb.push(
            "), 'YYYY-MM-DD HH24:MI:SS') AS t, COUNT(*) AS y
             FROM website_event
             WHERE event_type = 1 AND ",
        );
        push_scope(&mut qb, website_id, filters, range);
        qb.push(" GROUP BY t ORDER BY t ASC");

        let rows = qb.build_query_as().fetch_all(self.pool.as_ref()).await?;
        Ok(rows)
    }

    async fn get_session_series(
        &self,
        website_id: &str,
        filters: &QueryFilters,
        range: &DateRange,
        unit: TimeUnit,
        timezone: &str,
    ) -> StoreResult<Vec<TimePoint>> {
        validate_timezone(timezone)?;

        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT to_char(date_trunc('{unit}', to_timestamp(created_at) AT TIME ZONE ",
            unit = unit.pg_unit()
        ));
        qb.push_bind(timezone.to_string());
        qb.push(
            "), 'YYYY-MM-DD HH24:MI:SS') AS t, COUNT(DISTINCT session_id) AS y
             FROM website_event
             WHERE ",
        );
        push_scope(&mut qb, website_id, filters, range);
        qb.push(" GROUP BY t ORDER BY t ASC");

        let rows = qb.build_query_as().fetch_all(self.pool.as_ref()).await?;
        Ok(rows)
    }

    async fn get_event_data_summary(
        &self,
        website_id: &str,
        range: &DateRange,
    ) -> StoreResult<EventDataSummary> {
        let summary = sqlx::query_as(
            r#"
            SELECT COUNT(DISTINCT event_id) AS events,
                   COUNT(DISTINCT data_key) AS properties,
                   COUNT(*) AS records
            FROM event_data
            WHERE website_id = $1 AND created_at >= $2 AND created_at < $3
            "#,
        )
        .bind(website_id)
        .bind(range.start_at.timestamp())
        .bind(range.end_at.timestamp())
        .fetch_one(self.pool.as_ref())
        .await?;
        Ok(summary)
    }
}
