use crate::config::SyncConfig;
use tracing::{info, warn};
use upcraft_core::{UpcraftError, UpcraftResult};
use upcraft_skills::{ActionRegistry, RemoteSkill};

/// HTTP client for the skill sync service.
///
/// `GET /sync-skills` lists stored skill records, `POST /admin/ingest`
/// upserts one. Both speak [`RemoteSkill`].
#[derive(Debug, Clone)]
pub struct SyncClient {
    base_url: String,
    http: reqwest::Client,
}

impl SyncClient {
    pub fn new(config: &SyncConfig) -> UpcraftResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| UpcraftError::Http(e.to_string()))?;
        Ok(Self {
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches every skill record the service holds.
    pub async fn fetch_skills(&self) -> UpcraftResult<Vec<RemoteSkill>> {
        let url = format!("{}/sync-skills", self.base_url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| UpcraftError::Sync(format!("failed to sync skills: {e}")))?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(UpcraftError::Sync(format!(
                "backend returned status: {}",
                status.as_u16()
            )));
        }

        resp.json::<Vec<RemoteSkill>>()
            .await
            .map_err(|e| UpcraftError::Sync(format!("failed to decode skills: {e}")))
    }

    /// Upserts one skill record.
    pub async fn ingest_skill(&self, skill: &RemoteSkill) -> UpcraftResult<()> {
        if skill.name.trim().is_empty() {
            return Err(UpcraftError::Sync("field 'name' is required".into()));
        }

        let url = format!("{}/admin/ingest", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(skill)
            .send()
            .await
            .map_err(|e| UpcraftError::Sync(format!("failed to ingest {}: {e}", skill.name)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UpcraftError::Sync(format!(
                "ingest of {} failed with status {}: {}",
                skill.name,
                status.as_u16(),
                body.trim()
            )));
        }
        Ok(())
    }

    /// Ingests every skill exported by `registry`, in export order.
    /// Stops at the first failure.
    pub async fn publish_registry(&self, registry: &ActionRegistry) -> UpcraftResult<usize> {
        let definitions = registry.skill_definitions();
        for definition in &definitions {
            self.ingest_skill(&definition.to_remote()).await?;
        }
        info!(count = definitions.len(), url = %self.base_url, "Published skill definitions");
        Ok(definitions.len())
    }

    /// `true` when `GET /health` answers 200.
    pub async fn health(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.http.get(&url).send().await {
            Ok(resp) => resp.status() == reqwest::StatusCode::OK,
            Err(e) => {
                warn!(error = %e, url = %url, "Sync service health check failed");
                false
            }
        }
    }
}
