// Report generation for a finished batch

use crate::batch::Batch;
use tagtally_scanner::FetchResult;

const RULE: &str =
    "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// How many tags each page lists in text and markdown output.
const TOP_TAGS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

pub fn generate_report(batch: &Batch, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(batch)),
        ReportFormat::Json => generate_json_report(batch),
        ReportFormat::Markdown => Ok(generate_markdown_report(batch)),
    }
}

/// Results in URL order so reports are stable between runs.
fn sorted_results(batch: &Batch) -> Vec<&FetchResult> {
    let mut results: Vec<&FetchResult> = batch.iter().collect();
    results.sort_by(|a, b| a.url.cmp(&b.url));
    results
}

fn format_top_tags(result: &FetchResult) -> String {
    let sorted = result.tag_counts.sorted();
    let mut parts: Vec<String> = sorted
        .iter()
        .take(TOP_TAGS)
        .map(|(name, count)| format!("{}={}", name, count))
        .collect();
    if sorted.len() > TOP_TAGS {
        parts.push(format!("(+{} more)", sorted.len() - TOP_TAGS));
    }
    parts.join(" ")
}

pub fn generate_text_report(batch: &Batch) -> String {
    let summary = batch.summary();
    let mut report = String::new();

    report.push_str(RULE);
    report.push('\n');
    report.push_str("                          TAGTALLY BATCH REPORT\n");
    report.push_str(RULE);
    report.push_str("\n\n");

    report.push_str(&format!("URLs:         {}\n", summary.total));
    report.push_str(&format!("Succeeded:    {}\n", summary.succeeded));
    report.push_str(&format!("Failed:       {}\n", summary.failed));
    if summary.timed_out > 0 {
        report.push_str(&format!("Timed out:    {}\n", summary.timed_out));
    }
    if summary.cancelled > 0 {
        report.push_str(&format!("Cancelled:    {}\n", summary.cancelled));
    }
    report.push_str(&format!("Bytes read:   {}\n", summary.bytes_read));
    report.push_str(&format!(
        "Tags counted: {} ({} distinct)\n\n",
        summary.tags.total(),
        summary.tags.len()
    ));

    for result in sorted_results(batch) {
        report.push_str(RULE);
        report.push('\n');
        report.push_str(&format!("{}\n", result.url));

        let status = if result.status_code == 0 {
            "-".to_string()
        } else {
            result.status_code.to_string()
        };
        report.push_str(&format!("  Status:       {}\n", status));
        if let Some(ref content_type) = result.content_type {
            report.push_str(&format!("  Content-Type: {}\n", content_type));
        }
        report.push_str(&format!("  Length:       {} bytes\n", result.content_length));
        if let Some(ref error) = result.error {
            report.push_str(&format!("  Error:        [{}] {}\n", error.kind(), error));
        }
        if !result.tag_counts.is_empty() {
            report.push_str(&format!("  Tags:         {}\n", format_top_tags(result)));
        }
        report.push('\n');
    }

    report
}

pub fn generate_json_report(batch: &Batch) -> Result<String, serde_json::Error> {
    let results = sorted_results(batch);
    serde_json::to_string_pretty(&serde_json::json!({
        "generator": "tagtally",
        "version": env!("CARGO_PKG_VERSION"),
        "summary": batch.summary(),
        "documents": results,
    }))
}

pub fn generate_markdown_report(batch: &Batch) -> String {
    let summary = batch.summary();
    let mut report = String::new();

    report.push_str("# tagtally batch report\n\n");
    report.push_str(&format!(
        "{} URLs, {} succeeded, {} failed, {} timed out, {} cancelled.\n\n",
        summary.total, summary.succeeded, summary.failed, summary.timed_out, summary.cancelled
    ));

    report.push_str("| URL | Status | Content-Type | Bytes | Top tags | Error |\n");
    report.push_str("|-----|--------|--------------|-------|----------|-------|\n");

    for result in sorted_results(batch) {
        let error = result
            .error
            .as_ref()
            .map(|e| e.kind().to_string())
            .unwrap_or_default();
        report.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            result.url.replace('|', "\\|"),
            result.status_code,
            result.content_type.as_deref().unwrap_or(""),
            result.content_length,
            format_top_tags(result),
            error
        ));
    }

    report
}
