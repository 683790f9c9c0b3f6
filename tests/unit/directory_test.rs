// tests/unit/directory_test.rs

use std::io::Write;

use notification_router::domain::error::DirectoryError;
use notification_router::domain::model::provider::{SECRET_ADDRESS_KEY, SECRET_TOKEN_KEY};
use notification_router::domain::model::severity::Severity;
use notification_router::repository::directory::{Directory, InMemoryDirectory};

const YAML_MANIFEST: &str = r#"
alerts:
  - name: on-call
    namespace: flux-system
    spec:
      providerRef: { name: gitlab }
      eventSeverity: error
      eventSources:
        - kind: Kustomization
          name: "*"
        - kind: HelmRelease
          name: podinfo
          namespace: apps
      exclusionList: ["^no changes"]
      summary: production cluster
    status:
      conditions:
        - type: Ready
          status: "True"
  - name: paused
    namespace: flux-system
    spec:
      providerRef: { name: hook }
      suspend: true
providers:
  - name: gitlab
    namespace: flux-system
    spec:
      type: gitlab
      address: https://gitlab.com/org/app
      secretRef: { name: gitlab-token }
  - name: hook
    namespace: flux-system
    spec: { type: generic, address: "https://hooks.example.com/flux" }
secrets:
  - name: gitlab-token
    namespace: flux-system
    data:
      token: czNjcjN0
      address: aHR0cHM6Ly9naXRsYWIuaW50ZXJuYWwvb3JnL2FwcA==
"#;

fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn loads_yaml_manifest() {
    let file = write_temp(".yaml", YAML_MANIFEST);
    let dir = InMemoryDirectory::load_from_file(file.path()).await.unwrap();

    let rules = dir.list_alert_rules().await.unwrap();
    assert_eq!(rules.len(), 2);

    let on_call = &rules[0];
    assert_eq!(on_call.name, "on-call");
    assert!(on_call.is_ready());
    assert_eq!(on_call.spec.event_severity, Severity::Error);
    assert_eq!(on_call.spec.event_sources.len(), 2);
    assert_eq!(on_call.spec.event_sources[0].namespace, "");
    assert_eq!(on_call.summary(), Some("production cluster"));

    let paused = &rules[1];
    assert!(paused.spec.suspend);
    assert!(!paused.is_ready());
    assert_eq!(paused.spec.event_severity, Severity::Info);

    let provider = dir.get_provider("flux-system", "gitlab").await.unwrap().unwrap();
    assert_eq!(provider.spec.type_, "gitlab");
    assert_eq!(provider.spec.secret_ref.as_ref().unwrap().name, "gitlab-token");

    let secret = dir.get_secret("flux-system", "gitlab-token").await.unwrap().unwrap();
    assert_eq!(secret.string_value(SECRET_TOKEN_KEY).as_deref(), Some("s3cr3t"));
    assert_eq!(
        secret.string_value(SECRET_ADDRESS_KEY).as_deref(),
        Some("https://gitlab.internal/org/app")
    );
}

#[tokio::test]
async fn loads_json_manifest() {
    let json = r#"{
        "alerts": [{
            "name": "builds",
            "namespace": "ci",
            "spec": {
                "providerRef": {"name": "hook"},
                "eventSources": [{"kind": "GitRepository", "name": "*"}]
            }
        }],
        "providers": [{
            "name": "hook",
            "namespace": "ci",
            "spec": {"type": "generic", "address": "http://127.0.0.1:8080/events"}
        }]
    }"#;
    let file = write_temp(".json", json);
    let dir = InMemoryDirectory::load_from_file(file.path()).await.unwrap();

    let rules = dir.list_alert_rules().await.unwrap();
    assert_eq!(rules.len(), 1);
    assert!(rules[0].status.conditions.is_empty());
    assert!(dir.get_provider("ci", "hook").await.unwrap().is_some());
    assert!(dir.get_secret("ci", "anything").await.unwrap().is_none());
}

#[tokio::test]
async fn bad_base64_secret_is_a_manifest_error() {
    let yaml = "secrets:\n  - name: s\n    namespace: ns\n    data:\n      token: \"!!not base64!!\"\n";
    let file = write_temp(".yaml", yaml);
    let err = InMemoryDirectory::load_from_file(file.path()).await.err().unwrap();
    match err {
        DirectoryError::Manifest { path, message } => {
            assert!(path.ends_with(".yaml"));
            assert!(message.contains("token"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn missing_file_is_a_manifest_error() {
    let err = InMemoryDirectory::load_from_file("/nonexistent/directory.yaml")
        .await
        .err()
        .unwrap();
    assert!(matches!(err, DirectoryError::Manifest { .. }));
}

#[tokio::test]
async fn removed_entries_disappear_from_lookups() {
    let file = write_temp(".yaml", YAML_MANIFEST);
    let dir = InMemoryDirectory::load_from_file(file.path()).await.unwrap();

    assert!(dir.remove_alert("flux-system", "paused").await);
    assert!(!dir.remove_alert("flux-system", "paused").await);
    let rules = dir.list_alert_rules().await.unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].name, "on-call");

    assert!(dir.remove_provider("flux-system", "hook").await);
    assert!(dir.get_provider("flux-system", "hook").await.unwrap().is_none());
    assert!(!dir.remove_provider("apps", "gitlab").await);
    assert!(dir.get_provider("flux-system", "gitlab").await.unwrap().is_some());
}
