use crate::models::{NewVisit, Visit};
use crate::storage::{Storage, VisitFilter};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

pub struct PostgresStorage {
    pub pool: Arc<PgPool>,
}

impl PostgresStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS visits (
                id BIGSERIAL PRIMARY KEY,
                initiator TEXT NOT NULL,
                service_tag TEXT,
                panel_clid TEXT,
                ip TEXT NOT NULL,
                city TEXT,
                user_agent_full TEXT NOT NULL,
                user_agent_short TEXT NOT NULL,
                os TEXT NOT NULL,
                os_version TEXT NOT NULL,
                browser TEXT NOT NULL,
                browser_version TEXT NOT NULL,
                device TEXT NOT NULL,
                device_brand TEXT NOT NULL,
                device_model TEXT NOT NULL,
                is_mobile BOOLEAN NOT NULL,
                fingerprint TEXT NOT NULL,
                created_at BIGINT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_visits_panel_clid ON visits(panel_clid)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_visits_ip ON visits(ip)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_visits_fingerprint ON visits(fingerprint)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_visits_created_at ON visits(created_at)")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn insert_visit(&self, visit: &NewVisit) -> Result<Visit> {
        let created_at = Utc::now().timestamp_millis();

        let stored = sqlx::query_as::<_, Visit>(
            r#"
            INSERT INTO visits (
                initiator, service_tag, panel_clid, ip, city,
                user_agent_full, user_agent_short,
                os, os_version, browser, browser_version,
                device, device_brand, device_model, is_mobile,
                fingerprint, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING id, initiator, service_tag, panel_clid, ip, city,
                      user_agent_full, user_agent_short,
                      os, os_version, browser, browser_version,
                      device, device_brand, device_model, is_mobile,
                      fingerprint, created_at
            "#,
        )
        .bind(&visit.initiator)
        .bind(&visit.service_tag)
        .bind(&visit.panel_clid)
        .bind(&visit.ip)
        .bind(&visit.city)
        .bind(&visit.user_agent_full)
        .bind(&visit.user_agent_short)
        .bind(&visit.os)
        .bind(&visit.os_version)
        .bind(&visit.browser)
        .bind(&visit.browser_version)
        .bind(&visit.device)
        .bind(&visit.device_brand)
        .bind(&visit.device_model)
        .bind(visit.is_mobile)
        .bind(&visit.fingerprint)
        .bind(created_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(stored)
    }

    async fn find_most_recent(&self, filter: &VisitFilter) -> Result<Option<Visit>> {
        let query = match filter {
            VisitFilter::PanelClid(clid) => sqlx::query_as::<_, Visit>(
                r#"
                SELECT id, initiator, service_tag, panel_clid, ip, city,
                       user_agent_full, user_agent_short,
                       os, os_version, browser, browser_version,
                       device, device_brand, device_model, is_mobile,
                       fingerprint, created_at
                FROM visits
                WHERE panel_clid = $1
                ORDER BY created_at DESC
                LIMIT 1
                "#,
            )
            .bind(clid),
            VisitFilter::Fingerprint(key) => sqlx::query_as::<_, Visit>(
                r#"
                SELECT id, initiator, service_tag, panel_clid, ip, city,
                       user_agent_full, user_agent_short,
                       os, os_version, browser, browser_version,
                       device, device_brand, device_model, is_mobile,
                       fingerprint, created_at
                FROM visits
                WHERE fingerprint = $1
                ORDER BY created_at DESC
                LIMIT 1
                "#,
            )
            .bind(key),
            VisitFilter::Ip(ip) => sqlx::query_as::<_, Visit>(
                r#"
                SELECT id, initiator, service_tag, panel_clid, ip, city,
                       user_agent_full, user_agent_short,
                       os, os_version, browser, browser_version,
                       device, device_brand, device_model, is_mobile,
                       fingerprint, created_at
                FROM visits
                WHERE ip = $1
                ORDER BY created_at DESC
                LIMIT 1
                "#,
            )
            .bind(ip),
            VisitFilter::CityAndShortUa {
                city,
                user_agent_short,
            } => sqlx::query_as::<_, Visit>(
                r#"
                SELECT id, initiator, service_tag, panel_clid, ip, city,
                       user_agent_full, user_agent_short,
                       os, os_version, browser, browser_version,
                       device, device_brand, device_model, is_mobile,
                       fingerprint, created_at
                FROM visits
                WHERE city = $1 AND user_agent_short = $2
                ORDER BY created_at DESC
                LIMIT 1
                "#,
            )
            .bind(city)
            .bind(user_agent_short),
        };

        let visit = query.fetch_optional(self.pool.as_ref()).await?;
        Ok(visit)
    }

    async fn list_visits(&self) -> Result<Vec<Visit>> {
        let visits = sqlx::query_as::<_, Visit>(
            r#"
            SELECT id, initiator, service_tag, panel_clid, ip, city,
                   user_agent_full, user_agent_short,
                   os, os_version, browser, browser_version,
                   device, device_brand, device_model, is_mobile,
                   fingerprint, created_at
            FROM visits
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(visits)
    }
}
