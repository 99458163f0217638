//! Backend client and the local-first settings mirror.

use reqwest::{Client, Response as HttpResponse};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::{
    AggregateStatsResponse, ErrorResponse, HealthResponse, RegisterRequest, RegisterResponse,
    ResetStatisticsRequest, SaveSettingsRequest, SettingsResponse, StatisticsResponse,
    UpdateStatisticsRequest,
};
use crate::error::{CoreError, Result};
use crate::installation::{generate_installation_id, DEFAULT_CLIENT_VERSION};
use crate::platform::PersistenceCapability;
use crate::settings::{Settings, SettingsPatch};
use crate::statistics::Statistics;
use crate::store::{SettingsStore, StatisticsCounter};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://youtubeshortsblockr.replit.app/api";

/// Remote client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root, without a trailing slash.
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Typed client for the REST API.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: Client,
    config: ClientConfig,
}

impl RemoteClient {
    /// Creates a client for `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("ShortsBlocker/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Registers (or touches) an installation.
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse> {
        self.post("/extension/register", request).await
    }

    pub async fn get_settings(&self, installation_id: &str) -> Result<SettingsResponse> {
        self.get(&format!("/extension/settings/{}", installation_id))
            .await
    }

    pub async fn save_settings(
        &self,
        installation_id: &str,
        patch: &SettingsPatch,
    ) -> Result<SettingsResponse> {
        let body = SaveSettingsRequest {
            installation_id: installation_id.to_string(),
            patch: patch.clone(),
        };
        self.post("/extension/settings", &body).await
    }

    pub async fn get_statistics(&self, installation_id: &str) -> Result<StatisticsResponse> {
        self.get(&format!("/extension/statistics/{}", installation_id))
            .await
    }

    /// Adds deltas to the remote counters.
    pub async fn update_statistics(
        &self,
        installation_id: &str,
        blocked_delta: u64,
        hidden_delta: u64,
    ) -> Result<StatisticsResponse> {
        let body = UpdateStatisticsRequest {
            installation_id: installation_id.to_string(),
            blocked_delta: i64::try_from(blocked_delta).unwrap_or(i64::MAX),
            hidden_delta: i64::try_from(hidden_delta).unwrap_or(i64::MAX),
        };
        self.post("/extension/statistics/update", &body).await
    }

    pub async fn reset_statistics(&self, installation_id: &str) -> Result<StatisticsResponse> {
        let body = ResetStatisticsRequest {
            installation_id: installation_id.to_string(),
        };
        self.post("/extension/statistics/reset", &body).await
    }

    /// Recomputes and fetches the aggregate snapshot.
    pub async fn aggregate(&self) -> Result<AggregateStatsResponse> {
        self.get("/admin/statistics/aggregate").await
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.get("/health").await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::decode(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|e| e.error)
            .unwrap_or(text);
        Err(CoreError::Remote {
            status: status.as_u16(),
            message,
        })
    }
}

/// Settings store with an optional remote mirror.
///
/// Local storage is authoritative: writes land locally first and remote
/// failures are logged, never surfaced.
pub struct SettingsSync<P> {
    store: SettingsStore<P>,
    remote: Option<RemoteClient>,
    version: String,
}

impl<P: PersistenceCapability> SettingsSync<P> {
    /// Local-only sync.
    pub fn local(store: SettingsStore<P>) -> Self {
        Self {
            store,
            remote: None,
            version: DEFAULT_CLIENT_VERSION.to_string(),
        }
    }

    /// Sync mirrored to `remote`.
    pub fn with_remote(store: SettingsStore<P>, remote: RemoteClient) -> Self {
        Self {
            remote: Some(remote),
            ..Self::local(store)
        }
    }

    /// Sets the client version reported at registration.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn store(&self) -> &SettingsStore<P> {
        &self.store
    }

    fn installation_id(&self) -> String {
        self.store.installation_id().unwrap_or_else(|e| {
            warn!("Installation id unavailable, using an ephemeral one: {}", e);
            generate_installation_id()
        })
    }

    /// Registers this installation, returning the id in effect.
    ///
    /// Falls back to the local id when the backend is unreachable.
    pub async fn register(&self, browser_info: &str) -> String {
        let local_id = self.installation_id();
        let Some(remote) = &self.remote else {
            return local_id;
        };

        let request = RegisterRequest {
            installation_id: Some(local_id.clone()),
            version: Some(self.version.clone()),
            browser_info: Some(browser_info.to_string()),
        };
        match remote.register(&request).await {
            Ok(resp) => {
                if resp.installation_id != local_id {
                    if let Err(e) = self.store.set_installation_id(&resp.installation_id) {
                        warn!("Failed to store assigned installation id: {}", e);
                    }
                }
                info!(installation_id = %resp.installation_id, "Registered installation");
                resp.installation_id
            }
            Err(e) => {
                warn!("Error registering installation: {}", e);
                local_id
            }
        }
    }

    /// Current settings from local storage.
    pub fn load(&self) -> Settings {
        self.store.get()
    }

    /// Writes locally, then mirrors the change to the backend.
    pub async fn save(&self, patch: SettingsPatch) -> Result<Settings> {
        let settings = self.store.set(patch.clone())?;

        if let Some(remote) = &self.remote {
            let id = self.installation_id();
            match remote.save_settings(&id, &patch).await {
                Ok(_) => debug!("Settings mirrored to backend"),
                Err(e) => warn!("Error saving settings remotely: {}", e),
            }
        }
        Ok(settings)
    }

    /// Replaces local settings with the backend copy when one is stored.
    ///
    /// Returns the local settings unchanged if the backend has none or is
    /// unreachable.
    pub async fn pull(&self) -> Settings {
        let Some(remote) = &self.remote else {
            return self.store.get();
        };

        let id = self.installation_id();
        match remote.get_settings(&id).await {
            Ok(resp) if resp.last_updated.is_some() => {
                if let Err(e) = self.store.replace(&resp.settings) {
                    warn!("Failed to store pulled settings: {}", e);
                }
                resp.settings
            }
            Ok(_) => self.store.get(),
            Err(e) => {
                warn!("Error getting settings: {}", e);
                self.store.get()
            }
        }
    }

    /// Mirrors counter deltas. Returns false if they did not reach the backend.
    pub async fn push_statistics(&self, blocked_delta: u64, hidden_delta: u64) -> bool {
        let Some(remote) = &self.remote else {
            return false;
        };
        if !self.store.get().use_statistics {
            return false;
        }

        let id = self.installation_id();
        match remote
            .update_statistics(&id, blocked_delta, hidden_delta)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!("Error updating statistics: {}", e);
                false
            }
        }
    }

    /// Zeroes `counter` locally, then asks the backend to do the same.
    pub async fn reset_statistics<Q: PersistenceCapability>(
        &self,
        counter: &StatisticsCounter<Q>,
    ) -> Result<Statistics> {
        let stats = counter.reset()?;

        if let Some(remote) = &self.remote {
            let id = self.installation_id();
            match remote.reset_statistics(&id).await {
                Ok(_) => debug!("Statistics reset mirrored to backend"),
                Err(e) => warn!("Error resetting statistics remotely: {}", e),
            }
        }
        Ok(stats)
    }
}
