// src/repository/directory.rs
//! Read-only view of alert, provider and secret configuration.
//!
//! The router never writes configuration; it takes a snapshot per event.
//! `InMemoryDirectory` backs the binary and the tests. It can be seeded from a
//! JSON or YAML manifest:
//!
//! ```yaml
//! alerts:
//!   - name: on-call
//!     namespace: flux-system
//!     spec:
//!       providerRef: { name: gitlab }
//!       eventSources: [{ kind: Kustomization, name: "*" }]
//!     status:
//!       conditions: [{ type: Ready, status: "True" }]
//! providers:
//!   - name: gitlab
//!     namespace: flux-system
//!     spec: { type: gitlab, address: "https://gitlab.com/org/app", secretRef: { name: gl } }
//! secrets:
//!   - name: gl
//!     namespace: flux-system
//!     data: { token: "dG9rZW4=" }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::error::DirectoryError;
use crate::domain::model::alert::AlertRule;
use crate::domain::model::provider::{Provider, Secret};

/// Configuration lookups used by the dispatch path.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Every alert rule, in a stable order.
    async fn list_alert_rules(&self) -> Result<Vec<AlertRule>, DirectoryError>;

    async fn get_provider(&self, namespace: &str, name: &str)
        -> Result<Option<Provider>, DirectoryError>;

    async fn get_secret(&self, namespace: &str, name: &str)
        -> Result<Option<Secret>, DirectoryError>;
}

/// Supported manifest encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Json,
    Yaml,
}

impl ManifestFormat {
    /// Picks the format from the file extension; anything that is not
    /// `.json` is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => ManifestFormat::Json,
            _ => ManifestFormat::Yaml,
        }
    }
}

/// Serialized directory contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryManifest {
    #[serde(default)]
    pub alerts: Vec<AlertRule>,
    #[serde(default)]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub secrets: Vec<Secret>,
}

impl DirectoryManifest {
    pub fn parse(raw: &str, format: ManifestFormat) -> Result<Self, String> {
        match format {
            ManifestFormat::Json => {
                serde_json::from_str(raw).map_err(|e| format!("JSON parse error: {e}"))
            }
            ManifestFormat::Yaml => {
                serde_yaml::from_str(raw).map_err(|e| format!("YAML parse error: {e}"))
            }
        }
    }

    fn validate(&self) -> Result<(), String> {
        for alert in &self.alerts {
            if alert.name.trim().is_empty() || alert.namespace.trim().is_empty() {
                return Err("alert name and namespace must not be empty".into());
            }
            if alert.spec.provider_ref.name.trim().is_empty() {
                return Err(format!(
                    "alert {}/{} has no providerRef",
                    alert.namespace, alert.name
                ));
            }
        }
        for provider in &self.providers {
            if provider.name.trim().is_empty() || provider.namespace.trim().is_empty() {
                return Err("provider name and namespace must not be empty".into());
            }
        }
        for secret in &self.secrets {
            if secret.name.trim().is_empty() || secret.namespace.trim().is_empty() {
                return Err("secret name and namespace must not be empty".into());
            }
        }
        Ok(())
    }
}

type ObjectKey = (String, String);

fn key(namespace: &str, name: &str) -> ObjectKey {
    (namespace.to_string(), name.to_string())
}

#[derive(Default)]
struct Inner {
    // insertion order is the listing order
    alerts: Vec<AlertRule>,
    providers: HashMap<ObjectKey, Provider>,
    secrets: HashMap<ObjectKey, Secret>,
}

/// Directory kept in process memory.
#[derive(Clone, Default)]
pub struct InMemoryDirectory {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_manifest(manifest: DirectoryManifest) -> Result<Self, DirectoryError> {
        manifest.validate().map_err(|message| DirectoryError::Manifest {
            path: "<inline>".into(),
            message,
        })?;

        let mut inner = Inner::default();
        for alert in manifest.alerts {
            upsert_alert(&mut inner.alerts, alert);
        }
        for provider in manifest.providers {
            inner
                .providers
                .insert(key(&provider.namespace, &provider.name), provider);
        }
        for secret in manifest.secrets {
            inner
                .secrets
                .insert(key(&secret.namespace, &secret.name), secret);
        }

        Ok(Self {
            inner: Arc::new(RwLock::new(inner)),
        })
    }

    /// Loads a manifest file, JSON or YAML by extension.
    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let manifest_err = |message: String| DirectoryError::Manifest {
            path: path.display().to_string(),
            message,
        };

        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| manifest_err(e.to_string()))?;
        let manifest =
            DirectoryManifest::parse(&raw, ManifestFormat::from_path(path)).map_err(manifest_err)?;
        manifest.validate().map_err(manifest_err)?;

        info!(
            path = %path.display(),
            alerts = manifest.alerts.len(),
            providers = manifest.providers.len(),
            secrets = manifest.secrets.len(),
            "loaded directory manifest"
        );
        Self::from_manifest(manifest)
    }

    pub async fn upsert_alert(&self, alert: AlertRule) {
        let mut inner = self.inner.write().await;
        upsert_alert(&mut inner.alerts, alert);
    }

    pub async fn remove_alert(&self, namespace: &str, name: &str) -> bool {
        let mut inner = self.inner.write().await;
        let before = inner.alerts.len();
        inner
            .alerts
            .retain(|a| !(a.namespace == namespace && a.name == name));
        before != inner.alerts.len()
    }

    pub async fn upsert_provider(&self, provider: Provider) {
        let mut inner = self.inner.write().await;
        inner
            .providers
            .insert(key(&provider.namespace, &provider.name), provider);
    }

    pub async fn remove_provider(&self, namespace: &str, name: &str) -> bool {
        let mut inner = self.inner.write().await;
        inner.providers.remove(&key(namespace, name)).is_some()
    }

    pub async fn upsert_secret(&self, secret: Secret) {
        let mut inner = self.inner.write().await;
        inner
            .secrets
            .insert(key(&secret.namespace, &secret.name), secret);
    }

    pub async fn remove_secret(&self, namespace: &str, name: &str) -> bool {
        let mut inner = self.inner.write().await;
        inner.secrets.remove(&key(namespace, name)).is_some()
    }
}

fn upsert_alert(alerts: &mut Vec<AlertRule>, alert: AlertRule) {
    match alerts
        .iter_mut()
        .find(|a| a.namespace == alert.namespace && a.name == alert.name)
    {
        Some(existing) => *existing = alert,
        None => alerts.push(alert),
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn list_alert_rules(&self) -> Result<Vec<AlertRule>, DirectoryError> {
        Ok(self.inner.read().await.alerts.clone())
    }

    async fn get_provider(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Provider>, DirectoryError> {
        Ok(self.inner.read().await.providers.get(&key(namespace, name)).cloned())
    }

    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Secret>, DirectoryError> {
        Ok(self.inner.read().await.secrets.get(&key(namespace, name)).cloned())
    }
}
