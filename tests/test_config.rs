use std::fs;

use rawhttp::config::{Config, ConfigError};

const ENV_KEYS: [&str; 6] = [
    "RAWHTTP_RESOURCES",
    "RAWHTTP_NAME",
    "RAWHTTP_HOST",
    "RAWHTTP_PORT",
    "RAWHTTP_THREADS",
    "RAWHTTP_ROOT",
];

fn clean_env<R>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> R) -> R {
    let mut all: Vec<(&str, Option<&str>)> = ENV_KEYS
        .iter()
        .filter(|key| !vars.iter().any(|(set, _)| set == *key))
        .map(|key| (*key, None))
        .collect();
    all.extend_from_slice(vars);
    temp_env::with_vars(all, f)
}

#[test]
fn test_config_embedded_defaults() {
    let cfg = clean_env(&[], Config::load).unwrap();

    assert_eq!(cfg.server.name, "rawhttp/0.1");
    assert_eq!(cfg.address(), "0.0.0.0:9090");
    assert_eq!(cfg.server.thread_count, 0);
    assert_eq!(cfg.statuses.message(404), "Not Found");
    assert_eq!(cfg.mime_types.content_type("css"), "text/css");
    assert_eq!(cfg.expires_days("png"), Some(7));
    assert_eq!(cfg.expires_days("html"), None);
}

#[test]
fn test_config_env_overrides() {
    let cfg = clean_env(
        &[
            ("RAWHTTP_NAME", Some("custom")),
            ("RAWHTTP_HOST", Some("127.0.0.1")),
            ("RAWHTTP_PORT", Some("8000")),
            ("RAWHTTP_THREADS", Some("8")),
        ],
        Config::load,
    )
    .unwrap();

    assert_eq!(cfg.server.name, "custom");
    assert_eq!(cfg.address(), "127.0.0.1:8000");
    assert_eq!(cfg.server.thread_count, 8);
}

#[test]
fn test_config_invalid_port() {
    let err = clean_env(&[("RAWHTTP_PORT", Some("99999"))], Config::load).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_config_resources_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("server.yaml"),
        "server:\n  name: from-dir\n  host: 127.0.0.1\n  port: 1234\n  thread_count: 2\nstatic:\n  root: /srv/www\n",
    )
    .unwrap();
    fs::write(dir.path().join("statuses.yaml"), "200: Fine\n500: Broken\n").unwrap();
    fs::write(dir.path().join("mime-types.yaml"), "txt: text/plain\n").unwrap();

    let path = dir.path().to_string_lossy().into_owned();
    let cfg = clean_env(&[("RAWHTTP_RESOURCES", Some(path.as_str()))], Config::load).unwrap();

    assert_eq!(cfg.server.name, "from-dir");
    assert_eq!(cfg.address(), "127.0.0.1:1234");
    assert_eq!(cfg.statuses.message(200), "Fine");
    assert_eq!(cfg.statuses.message(404), "Broken");
    assert_eq!(cfg.static_files.root.to_str(), Some("/srv/www"));
}

#[test]
fn test_config_missing_resource() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_string_lossy().into_owned();

    let err = clean_env(&[("RAWHTTP_RESOURCES", Some(path.as_str()))], Config::load).unwrap_err();
    assert!(matches!(err, ConfigError::ResourceNotFound(ref name) if name == "server.yaml"));
}

#[test]
fn test_config_clone() {
    let cfg1 = clean_env(&[], Config::load).unwrap();
    let cfg2 = cfg1.clone();

    assert_eq!(cfg1.server, cfg2.server);
    assert_eq!(cfg1.static_files, cfg2.static_files);
}
