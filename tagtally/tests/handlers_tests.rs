use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tagtally::handlers::*;
use tempfile::NamedTempFile;

#[test]
fn test_parse_url_line_with_scheme() {
    let result = parse_url_line("https://example.com");
    assert_eq!(result, Some("https://example.com".to_string()));
}

#[test]
fn test_parse_url_line_without_scheme() {
    let result = parse_url_line("example.com");
    assert_eq!(result, Some("http://example.com".to_string()));
}

#[test]
fn test_parse_url_line_host_and_port() {
    let result = parse_url_line("localhost:8080");
    assert_eq!(result, Some("http://localhost:8080".to_string()));
}

#[test]
fn test_parse_url_line_invalid() {
    let result = parse_url_line("not a valid url!!!");
    assert_eq!(result, None);
}

#[test]
fn test_load_urls_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "# targets")?;
    writeln!(temp_file, "https://example.com")?;
    writeln!(temp_file, "  httpbin.org  ")?;
    writeln!(temp_file)?; // Empty line
    writeln!(temp_file, "https://api.example.com")?;
    writeln!(temp_file, "https://example.com")?;

    let path = PathBuf::from(temp_file.path());
    let urls = load_urls_from_file(&path)?;

    // Duplicates survive loading; the batch removes them
    assert_eq!(urls.len(), 4);
    assert_eq!(urls[0], "https://example.com");
    assert_eq!(urls[1], "http://httpbin.org");
    assert_eq!(urls[2], "https://api.example.com");
    assert_eq!(urls[3], "https://example.com");

    Ok(())
}

#[test]
fn test_load_urls_from_file_keeps_unparseable_lines() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "not a valid url!!!").unwrap();

    let urls = load_urls_from_file(temp_file.path()).unwrap();
    assert_eq!(urls, vec!["not a valid url!!!".to_string()]);
}

#[test]
fn test_load_urls_from_file_empty() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file).unwrap();
    writeln!(temp_file, "   ").unwrap();
    writeln!(temp_file, "# only a comment").unwrap();

    let result = load_urls_from_file(temp_file.path());

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("No URLs found"));
}

#[test]
fn test_load_urls_from_file_missing() {
    let result = load_urls_from_file(&PathBuf::from("/nonexistent/hosts.txt"));
    assert!(result.is_err());
}

#[test]
fn test_load_urls_from_source_urls() {
    let urls = vec!["https://example.com".to_string(), "example.org".to_string()];
    let result = load_urls_from_source(Some(urls), None).unwrap();

    assert_eq!(result, vec!["https://example.com", "http://example.org"]);
}

#[test]
fn test_load_urls_from_source_no_input() {
    let result = load_urls_from_source(None, None);
    assert!(result.is_err());
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("Either --url or --hosts-file")
    );
}

#[test]
fn test_load_urls_from_source_prefers_hosts_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "https://from-file.example").unwrap();
    let path = PathBuf::from(temp_file.path());

    let result = load_urls_from_source(None, Some(&path)).unwrap();
    assert_eq!(result, vec!["https://from-file.example"]);
}

// ============================================================================
// Settings resolution
// ============================================================================

#[test]
fn test_resolve_settings_defaults() {
    let settings = resolve_settings(&SettingsOverrides::default()).unwrap();
    assert_eq!(settings.concurrency, 20);
    assert_eq!(settings.deadline(), Some(Duration::from_secs(60)));
}

#[test]
fn test_resolve_settings_flags_override_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"{{"concurrency": 4, "request_timeout_secs": 3, "user_agent": "probe/1"}}"#
    )
    .unwrap();

    let overrides = SettingsOverrides {
        config: Some(PathBuf::from(temp_file.path())),
        concurrency: Some(8),
        timeout_secs: None,
        deadline_secs: Some(0),
    };
    let settings = resolve_settings(&overrides).unwrap();

    assert_eq!(settings.concurrency, 8);
    assert_eq!(settings.request_timeout_secs, 3);
    assert_eq!(settings.user_agent, "probe/1");
    assert_eq!(settings.deadline(), None);
}

#[test]
fn test_resolve_settings_rejects_zero_concurrency() {
    let overrides = SettingsOverrides {
        concurrency: Some(0),
        ..Default::default()
    };
    assert!(resolve_settings(&overrides).is_err());
}

#[test]
fn test_resolve_settings_bad_config_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "not json").unwrap();

    let overrides = SettingsOverrides {
        config: Some(PathBuf::from(temp_file.path())),
        ..Default::default()
    };
    assert!(resolve_settings(&overrides).is_err());
}
