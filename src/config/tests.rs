use super::*;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_parrot_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    unsafe {
        env::remove_var("PARROT_EVAL_SERVICE_URL");
        env::remove_var("PARROT_EVAL_STORE_DOMAIN");
        env::remove_var("PARROT_EVAL_DATA_DIR");
        env::remove_var("PARROT_EVAL_OUTPUT_DIR");
        env::remove_var("PARROT_EVAL_KNOWLEDGE_SOURCE");
        env::remove_var("PARROT_EVAL_SCORER_URL");
        env::remove_var("PARROT_EVAL_RETRY_ATTEMPTS");
        env::remove_var("PARROT_EVAL_RETRY_INTERVAL_SECS");
        env::remove_var("PARROT_EVAL_REQUEST_TIMEOUT_SECS");
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.service_url, "http://127.0.0.1:8999");
    assert_eq!(config.store_domain, "127.0.0.1");
    assert_eq!(config.data_dir, PathBuf::from("./datasets/kilt_data"));
    assert_eq!(config.output_root, PathBuf::from("./outputs/kilt"));
    assert!(config.knowledge_source_path.is_none());
    assert_eq!(config.scorer_url, "http://127.0.0.1:8800");
    assert_eq!(config.retry_attempts, 3);
    assert_eq!(config.retry_interval, Duration::from_secs(120));
    assert_eq!(config.request_timeout, Duration::from_secs(300));
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_parrot_env();

    let config = Config::from_env().expect("should parse with defaults");
    assert_eq!(config, Config::default());
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_parrot_env();

    let config = with_env_vars(
        &[
            ("PARROT_EVAL_SERVICE_URL", "http://search.internal:9000"),
            ("PARROT_EVAL_STORE_DOMAIN", "milvus.internal"),
            ("PARROT_EVAL_DATA_DIR", "/data/kilt"),
            ("PARROT_EVAL_OUTPUT_DIR", "/tmp/out"),
            ("PARROT_EVAL_KNOWLEDGE_SOURCE", "  /data/ks.json  "),
            ("PARROT_EVAL_RETRY_ATTEMPTS", "5"),
            ("PARROT_EVAL_RETRY_INTERVAL_SECS", "1"),
            ("PARROT_EVAL_REQUEST_TIMEOUT_SECS", "30"),
        ],
        Config::from_env,
    )
    .expect("overrides should parse");

    assert_eq!(config.service_url, "http://search.internal:9000");
    assert_eq!(config.store_domain, "milvus.internal");
    assert_eq!(config.data_dir, PathBuf::from("/data/kilt"));
    assert_eq!(config.output_root, PathBuf::from("/tmp/out"));
    assert_eq!(config.knowledge_source_path, Some(PathBuf::from("/data/ks.json")));
    assert_eq!(config.retry_attempts, 5);
    assert_eq!(config.retry_interval, Duration::from_secs(1));
    assert_eq!(config.request_timeout, Duration::from_secs(30));
}

#[test]
#[serial]
fn test_from_env_empty_knowledge_source_is_none() {
    clear_parrot_env();

    let config = with_env_vars(&[("PARROT_EVAL_KNOWLEDGE_SOURCE", "   ")], Config::from_env)
        .expect("should parse");
    assert!(config.knowledge_source_path.is_none());
}

#[test]
#[serial]
fn test_from_env_invalid_number() {
    clear_parrot_env();

    let err = with_env_vars(&[("PARROT_EVAL_RETRY_ATTEMPTS", "three")], Config::from_env)
        .unwrap_err();

    assert!(matches!(
        err,
        ConfigError::InvalidNumber {
            name: "PARROT_EVAL_RETRY_ATTEMPTS",
            ..
        }
    ));
    assert!(err.to_string().contains("three"));
}

#[test]
#[serial]
fn test_from_env_negative_interval_rejected() {
    clear_parrot_env();

    let result = with_env_vars(&[("PARROT_EVAL_RETRY_INTERVAL_SECS", "-1")], Config::from_env);
    assert!(matches!(result, Err(ConfigError::InvalidNumber { .. })));
}

#[test]
fn test_validate_defaults() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_validate_zero_retries() {
    let config = Config {
        retry_attempts: 0,
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::ZeroRetryAttempts)));
}

#[test]
fn test_validate_bad_urls() {
    for bad in ["", "127.0.0.1:8999", "ftp://host", "http://"] {
        let config = Config {
            service_url: bad.to_string(),
            ..Default::default()
        };
        assert!(
            matches!(config.validate(), Err(ConfigError::InvalidUrl { .. })),
            "{bad:?} should be rejected"
        );
    }

    let config = Config {
        scorer_url: "localhost".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidUrl {
            name: "PARROT_EVAL_SCORER_URL",
            ..
        })
    ));
}

#[test]
fn test_validate_store_domain() {
    let config = Config {
        store_domain: "http://milvus".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidStoreDomain { .. })
    ));
}

#[test]
fn test_validate_output_root_is_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("not_a_dir");
    std::fs::write(&file, "x").unwrap();

    let config = Config {
        output_root: file.clone(),
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::NotADirectory { path }) if path == file
    ));
}

#[test]
fn test_validate_knowledge_source() {
    let dir = TempDir::new().unwrap();

    let missing = Config {
        knowledge_source_path: Some(dir.path().join("missing.json")),
        ..Default::default()
    };
    assert!(matches!(missing.validate(), Err(ConfigError::PathNotFound { .. })));

    let is_dir = Config {
        knowledge_source_path: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    assert!(matches!(is_dir.validate(), Err(ConfigError::NotAFile { .. })));

    let file = dir.path().join("ks.json");
    std::fs::write(&file, "").unwrap();
    let ok = Config {
        knowledge_source_path: Some(file),
        ..Default::default()
    };
    assert!(ok.validate().is_ok());
}

#[test]
fn test_require_knowledge_source() {
    let err = Config::default().require_knowledge_source().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::MissingEnvVar {
            name: "PARROT_EVAL_KNOWLEDGE_SOURCE"
        }
    ));

    let config = Config {
        knowledge_source_path: Some(PathBuf::from("/data/ks.json")),
        ..Default::default()
    };
    assert_eq!(
        config.require_knowledge_source().unwrap(),
        std::path::Path::new("/data/ks.json")
    );
}

#[test]
fn test_derived_settings() {
    let config = Config {
        retry_attempts: 4,
        retry_interval: Duration::from_secs(9),
        ..Default::default()
    };

    let policy = config.retry_policy();
    assert_eq!(policy.max_attempts(), 4);
    assert_eq!(policy.interval(), Duration::from_secs(9));

    let settings = config.service_settings(Some(true));
    assert_eq!(settings.service_url, "http://127.0.0.1:8999");
    assert_eq!(settings.rerank, Some(true));
    assert_eq!(settings.timeout, Duration::from_secs(300));
}
