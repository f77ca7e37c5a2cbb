// Tests for report generation

use tagtally_core::report::{
    ReportFormat, generate_json_report, generate_markdown_report, generate_report,
    generate_text_report,
};
use tagtally_core::{Batch, BatchRunner, BatchSettings, ConcurrencyLimiter};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

async fn sample_batch(mock_server: &MockServer) -> Batch {
    Mock::given(method("GET"))
        .and(path("/home"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_bytes(b"<html><body><p>a</p><p>b</p></body></html>".to_vec()),
        )
        .mount(mock_server)
        .await;

    let limiter = ConcurrencyLimiter::new(2).unwrap();
    let runner = BatchRunner::new(&BatchSettings::default(), limiter).unwrap();
    runner
        .run([format!("{}/home", mock_server.uri()), "not a url".to_string()])
        .await
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert_eq!(ReportFormat::from_str("text"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("json"), Some(ReportFormat::Json));
    assert_eq!(ReportFormat::from_str("markdown"), Some(ReportFormat::Markdown));
    assert_eq!(ReportFormat::from_str("md"), Some(ReportFormat::Markdown));
    assert_eq!(ReportFormat::from_str("JSON"), Some(ReportFormat::Json));
    assert_eq!(ReportFormat::from_str("csv"), None);
}

// ============================================================================
// Rendering Tests
// ============================================================================

#[tokio::test]
async fn test_text_report() {
    let mock_server = MockServer::start().await;
    let batch = sample_batch(&mock_server).await;

    let report = generate_text_report(&batch);

    assert!(report.contains("TAGTALLY BATCH REPORT"));
    assert!(report.contains("URLs:         2"));
    assert!(report.contains("Succeeded:    1"));
    assert!(report.contains("Failed:       1"));
    assert!(report.contains("p=2"));
    assert!(report.contains("[invalid_url]"));
}

#[tokio::test]
async fn test_json_report() {
    let mock_server = MockServer::start().await;
    let batch = sample_batch(&mock_server).await;

    let report = generate_json_report(&batch).unwrap();
    let value: serde_json::Value = serde_json::from_str(&report).unwrap();

    assert_eq!(value["generator"], "tagtally");
    assert_eq!(value["summary"]["total"], 2);
    assert_eq!(value["summary"]["tags"]["p"], 2);

    let documents = value["documents"].as_array().unwrap();
    assert_eq!(documents.len(), 2);
    // URL order: "http://..." sorts before "not a url"
    assert_eq!(documents[0]["meta"]["status"], 200);
    assert_eq!(documents[0]["elements"][0]["tag-name"], "p");
    assert_eq!(documents[1]["error"]["kind"], "invalid_url");
}

#[tokio::test]
async fn test_markdown_report() {
    let mock_server = MockServer::start().await;
    let batch = sample_batch(&mock_server).await;

    let report = generate_markdown_report(&batch);

    assert!(report.starts_with("# tagtally batch report"));
    assert!(report.contains("| URL | Status |"));
    assert!(report.contains("| not a url | 0 |"));
    assert!(report.contains("invalid_url"));
}

#[tokio::test]
async fn test_generate_report_dispatches_on_format() {
    let mock_server = MockServer::start().await;
    let batch = sample_batch(&mock_server).await;

    let json = generate_report(&batch, ReportFormat::Json).unwrap();
    assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());

    let text = generate_report(&batch, ReportFormat::Text).unwrap();
    assert_eq!(text, generate_text_report(&batch));
}

#[test]
fn test_empty_batch_report() {
    let report = generate_text_report(&Batch::default());
    assert!(report.contains("URLs:         0"));
}
