// src/domain/model/provider.rs

use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::NotifierError;
use crate::domain::model::alert::LocalObjectReference;

/// Secret key whose value replaces the provider address.
pub const SECRET_ADDRESS_KEY: &str = "address";
/// Secret key whose value is used as the destination credential.
pub const SECRET_TOKEN_KEY: &str = "token";

/// Destination types this router knows how to build a notifier for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderType {
    /// JSON webhook receiving the whole notification.
    Generic,
    /// Commit status on a GitLab project.
    GitLab,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Generic => "generic",
            ProviderType::GitLab => "gitlab",
        }
    }
}

impl FromStr for ProviderType {
    type Err = NotifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generic" => Ok(ProviderType::Generic),
            "gitlab" => Ok(ProviderType::GitLab),
            other => Err(NotifierError::UnsupportedProvider(other.to_string())),
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSpec {
    /// Destination type tag, kept raw so unknown tags fail at build time.
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<LocalObjectReference>,
}

/// Destination configuration as read from the directory.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    pub namespace: String,
    pub spec: ProviderSpec,
}

impl Provider {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        type_: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            spec: ProviderSpec {
                type_: type_.into(),
                address: address.into(),
                ..Default::default()
            },
        }
    }
}

/// Credential object stored apart from the provider.
///
/// Values are raw bytes; on the wire they are base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Secret {
    pub name: String,
    pub namespace: String,
    #[serde(
        default,
        serialize_with = "encode_secret_data",
        deserialize_with = "decode_secret_data"
    )]
    pub data: BTreeMap<String, Vec<u8>>,
}

impl Secret {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl AsRef<[u8]>) -> Self {
        self.data.insert(key.into(), value.as_ref().to_vec());
        self
    }

    /// Value for `key` as a lossy UTF-8 string, when present.
    pub fn string_value(&self, key: &str) -> Option<String> {
        self.data
            .get(key)
            .map(|raw| String::from_utf8_lossy(raw).into_owned())
    }
}

fn encode_secret_data<S>(data: &BTreeMap<String, Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let encoded: BTreeMap<&String, String> = data
        .iter()
        .map(|(k, v)| (k, base64::engine::general_purpose::STANDARD.encode(v)))
        .collect();
    encoded.serialize(serializer)
}

fn decode_secret_data<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<u8>>, D::Error>
where
    D: Deserializer<'de>,
{
    let encoded = BTreeMap::<String, String>::deserialize(deserializer)?;
    encoded
        .into_iter()
        .map(|(k, v)| {
            base64::engine::general_purpose::STANDARD
                .decode(v.trim())
                .map(|bytes| (k.clone(), bytes))
                .map_err(|e| serde::de::Error::custom(format!("secret key '{k}': {e}")))
        })
        .collect()
}

/// Address, credential and transport options resolved for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedDestination {
    pub address: String,
    pub token: String,
    pub proxy: Option<String>,
    pub username: Option<String>,
    pub channel: Option<String>,
}

impl ResolvedDestination {
    pub fn from_provider(provider: &Provider) -> Self {
        Self {
            address: provider.spec.address.clone(),
            token: String::new(),
            proxy: provider.spec.proxy.clone().filter(|p| !p.is_empty()),
            username: provider.spec.username.clone(),
            channel: provider.spec.channel.clone(),
        }
    }

    /// Applies secret values; keys missing from the secret keep the
    /// provider's own settings.
    pub fn apply_secret(&mut self, secret: &Secret) {
        if let Some(address) = secret.string_value(SECRET_ADDRESS_KEY) {
            self.address = address;
        }
        if let Some(token) = secret.string_value(SECRET_TOKEN_KEY) {
            self.token = token;
        }
    }
}
