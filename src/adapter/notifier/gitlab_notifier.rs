// adapter/notifier/gitlab_notifier.rs
//! Commit status notifier for GitLab (gitlab.com or self-hosted).
//!
//! The provider address is the project URL, e.g.
//! `https://gitlab.example.com/group/app.git`. The host becomes the API base
//! and the path becomes the project id.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::adapter::notifier::notifier_factory::Notifier;
use crate::domain::error::NotifierError;
use crate::domain::model::event::{Event, METADATA_REVISION};
use crate::domain::model::provider::ProviderType;
use crate::domain::model::severity::Severity;

/// Reason of in-flight events; those never produce a status.
pub const REASON_PROGRESSING: &str = "Progressing";

const MAX_DESCRIPTION_CHARS: usize = 255;

/// Commit status values accepted by the GitLab API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitState {
    Success,
    Failed,
}

impl TryFrom<&Severity> for CommitState {
    type Error = NotifierError;

    fn try_from(severity: &Severity) -> Result<Self, Self::Error> {
        match severity {
            Severity::Info => Ok(CommitState::Success),
            Severity::Error => Ok(CommitState::Failed),
            Severity::Custom(other) => Err(NotifierError::UnrecognizedSeverity(other.clone())),
        }
    }
}

#[derive(Debug, Serialize)]
struct SetCommitStatus<'a> {
    state: CommitState,
    name: &'a str,
    description: &'a str,
}

#[derive(Debug, Clone)]
pub struct GitLabNotifier {
    client: Client,
    base_url: String,
    project_id: String,
    token: String,
}

impl GitLabNotifier {
    pub fn new(address: &str, token: &str, client: Client) -> Result<Self, NotifierError> {
        if token.is_empty() {
            return Err(NotifierError::MissingToken { provider: "gitlab" });
        }
        let (base_url, project_id) = parse_git_address(address)?;

        Ok(Self {
            client,
            base_url,
            project_id,
            token: token.to_string(),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn status_url(&self, sha: &str) -> String {
        let project: String = url::form_urlencoded::byte_serialize(self.project_id.as_bytes()).collect();
        format!(
            "{}/api/v4/projects/{}/statuses/{}",
            self.base_url, project, sha
        )
    }
}

#[async_trait]
impl Notifier for GitLabNotifier {
    fn provider_type(&self) -> ProviderType {
        ProviderType::GitLab
    }

    async fn post(&self, notification: &Event) -> Result<(), NotifierError> {
        if notification.reason == REASON_PROGRESSING {
            return Ok(());
        }

        let revision = notification
            .metadata_value(METADATA_REVISION)
            .ok_or(NotifierError::MissingRevision)?;
        let sha = parse_revision(revision)?;
        let state = CommitState::try_from(&notification.severity)?;
        let (name, description) = format_name_and_description(notification);

        let body = SetCommitStatus {
            state,
            name: &name,
            description: &description,
        };

        debug!(project = %self.project_id, sha = %sha, ?state, "setting gitlab commit status");
        let resp = self
            .client
            .post(self.status_url(sha))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            Err(NotifierError::Api { status, body })
        }
    }
}

/// Splits a repository URL into API base (`scheme://host[:port]`) and
/// project path. `ssh` URLs are served over `https`.
pub fn parse_git_address(address: &str) -> Result<(String, String), NotifierError> {
    let invalid = |reason: &str| NotifierError::InvalidAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(address).map_err(|e| invalid(&e.to_string()))?;
    let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
    let scheme = match url.scheme() {
        "ssh" => "https",
        other => other,
    };
    let base_url = match url.port() {
        Some(port) => format!("{scheme}://{host}:{port}"),
        None => format!("{scheme}://{host}"),
    };

    let path = url.path().trim_matches('/');
    let id = path.strip_suffix(".git").unwrap_or(path);
    if id.is_empty() {
        return Err(invalid("no project path"));
    }

    Ok((base_url, id.to_string()))
}

/// Extracts the commit sha from a revision.
///
/// Accepts `<ref>/<sha>` and `<ref>@sha1:<sha>`.
pub fn parse_revision(revision: &str) -> Result<&str, NotifierError> {
    let sha = if let Some((_, sha)) = revision.rsplit_once("@sha1:") {
        sha
    } else {
        revision
            .rsplit_once('/')
            .map(|(_, sha)| sha)
            .ok_or_else(|| NotifierError::InvalidRevision(revision.to_string()))?
    };

    if sha.is_empty() {
        return Err(NotifierError::InvalidRevision(revision.to_string()));
    }
    Ok(sha)
}

/// Status name is the lowercase `kind/name` of the reconciled object; the
/// description is the first line of the message.
pub fn format_name_and_description(event: &Event) -> (String, String) {
    let object = &event.involved_object;
    let name = format!("{}/{}", object.kind, object.name).to_lowercase();
    let description: String = event
        .message
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .chars()
        .take(MAX_DESCRIPTION_CHARS)
        .collect();
    (name, description)
}
