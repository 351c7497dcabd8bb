//! Report renderers
//!
//! One `generate_*` function per [`OutputFormat`].

use html_escape::encode_text;

use super::types::{BatchReport, OutputFormat, ReportResult};
use crate::document::{ProcessingResult, ProcessingStatus};

const REPORT_TITLE: &str = "Document Processing Report";
const UNKNOWN: &str = "Unknown";

/// Render a report in the requested format
pub fn generate_report(report: &BatchReport<'_>, format: OutputFormat) -> ReportResult<String> {
    match format {
        OutputFormat::Json => generate_json(report),
        OutputFormat::Markdown => Ok(generate_markdown(report)),
        OutputFormat::Txt => Ok(generate_text(report)),
        OutputFormat::Html => Ok(generate_html(report)),
    }
}

/// Human-readable size with one decimal place
///
/// ```text
/// 0        -> "0 B"
/// 1536     -> "1.5 KB"
/// 2097152  -> "2.0 MB"
/// ```
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", size, UNITS[unit])
}

pub fn generate_json(report: &BatchReport<'_>) -> ReportResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn language(result: &ProcessingResult) -> &str {
    result.metadata.language.as_deref().unwrap_or(UNKNOWN)
}

fn processing_time(result: &ProcessingResult) -> f64 {
    result.metadata.processing_time.unwrap_or(0.0)
}

pub fn generate_markdown(report: &BatchReport<'_>) -> String {
    let mut lines = vec![
        format!("# {}", REPORT_TITLE),
        format!("**Generated:** {}", report.timestamp.to_rfc3339()),
        format!("**Total Files:** {}", report.total_files),
        format!("**Successful:** {}", report.successful),
        format!("**Failed:** {}", report.failed),
        format!("**Cached:** {}", report.cached),
        String::new(),
        "---".to_string(),
        String::new(),
    ];

    for (i, result) in report.results.iter().enumerate() {
        lines.push(format!("## Document {}: {}", i + 1, result.metadata.file_name));
        lines.push(format!("**Status:** {}", result.status));
        lines.push(format!(
            "**File Size:** {}",
            format_file_size(result.metadata.file_size)
        ));
        lines.push(format!("**Language:** {}", language(result)));
        lines.push(format!("**Processing Time:** {:.2}s", processing_time(result)));
        if let Some(pages) = result.metadata.page_count {
            lines.push(format!("**Pages:** {}", pages));
        }
        lines.push(String::new());

        if result.is_success() {
            lines.push("### Extracted Content".to_string());
            lines.push(String::new());
            lines.push(result.ocr_result.text.clone());
            lines.push(String::new());
        } else if let Some(error) = &result.error_message {
            lines.push(format!("**Error:** {}", error));
            lines.push(String::new());
        }

        lines.push("---".to_string());
        lines.push(String::new());
    }

    lines.join("\n")
}

pub fn generate_text(report: &BatchReport<'_>) -> String {
    let rule = "-".repeat(40);
    let mut lines = vec![
        REPORT_TITLE.to_string(),
        "=".repeat(40),
        format!("Generated: {}", report.timestamp.to_rfc3339()),
        format!("Total Files: {}", report.total_files),
        format!("Successful: {}", report.successful),
        format!("Failed: {}", report.failed),
        format!("Cached: {}", report.cached),
        String::new(),
        rule.clone(),
        String::new(),
    ];

    for (i, result) in report.results.iter().enumerate() {
        lines.push(format!("Document {}: {}", i + 1, result.metadata.file_name));
        lines.push(format!("Status: {}", result.status));
        lines.push(format!(
            "File Size: {}",
            format_file_size(result.metadata.file_size)
        ));
        lines.push(format!("Language: {}", language(result)));
        lines.push(format!("Processing Time: {:.2}s", processing_time(result)));
        lines.push(String::new());

        if result.is_success() {
            lines.push("Extracted Content:".to_string());
            lines.push("-".repeat(20));
            lines.push(result.ocr_result.text.clone());
            lines.push(String::new());
        } else if let Some(error) = &result.error_message {
            lines.push(format!("Error: {}", error));
            lines.push(String::new());
        }

        lines.push(rule.clone());
        lines.push(String::new());
    }

    lines.join("\n")
}

const HTML_STYLE: &str = r#"
        body { font-family: 'Segoe UI', Arial, sans-serif; margin: 20px; background: #f5f5f5; }
        .container { max-width: 1200px; margin: 0 auto; background: white; padding: 30px; border-radius: 10px; }
        .header { text-align: center; border-bottom: 2px solid #667eea; padding-bottom: 20px; margin-bottom: 30px; }
        .stats { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 20px; margin-bottom: 30px; }
        .stat-card { background: #667eea; color: white; padding: 20px; border-radius: 10px; text-align: center; }
        .document { border: 1px solid #ddd; border-radius: 8px; margin-bottom: 20px; overflow: hidden; }
        .doc-header { background: #f8f9fa; padding: 15px; border-bottom: 1px solid #ddd; }
        .doc-content { padding: 20px; }
        .status-completed { color: #28a745; font-weight: bold; }
        .status-failed { color: #dc3545; font-weight: bold; }
        .status-cached { color: #17a2b8; font-weight: bold; }
        .extracted-text { background: #f8f9fa; padding: 15px; border-radius: 5px; white-space: pre-wrap; max-height: 300px; overflow-y: auto; }
        .metadata { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 10px; margin-bottom: 15px; }
        .meta-item { background: #e9ecef; padding: 10px; border-radius: 5px; }
        .error { color: #dc3545; }
"#;

fn stat_card(label: &str, value: impl std::fmt::Display) -> String {
    format!(
        "            <div class=\"stat-card\"><h3>{}</h3><h2>{}</h2></div>\n",
        label, value
    )
}

fn status_label(status: ProcessingStatus) -> String {
    let s = status.as_str();
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn generate_html(report: &BatchReport<'_>) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("    <meta charset=\"UTF-8\">\n");
    html.push_str(
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    html.push_str(&format!("    <title>{}</title>\n", REPORT_TITLE));
    html.push_str(&format!("    <style>{}    </style>\n", HTML_STYLE));
    html.push_str("</head>\n<body>\n    <div class=\"container\">\n");

    html.push_str(&format!(
        "        <div class=\"header\">\n            <h1>{}</h1>\n            <p>Generated: {}</p>\n        </div>\n",
        REPORT_TITLE,
        report.timestamp.to_rfc3339()
    ));

    html.push_str("        <div class=\"stats\">\n");
    html.push_str(&stat_card("Total Files", report.total_files));
    html.push_str(&stat_card("Successful", report.successful));
    html.push_str(&stat_card("Failed", report.failed));
    html.push_str(&stat_card(
        "Success Rate",
        format!("{:.1}%", report.success_rate()),
    ));
    html.push_str("        </div>\n");

    html.push_str("        <div class=\"documents\">\n");
    for (i, result) in report.results.iter().enumerate() {
        html.push_str("            <div class=\"document\">\n");
        html.push_str("                <div class=\"doc-header\">\n");
        html.push_str(&format!(
            "                    <h3>Document {}: {}</h3>\n",
            i + 1,
            encode_text(&result.metadata.file_name)
        ));
        html.push_str("                    <div class=\"metadata\">\n");
        html.push_str(&format!(
            "                        <div class=\"meta-item\"><strong>Status:</strong> <span class=\"status-{}\">{}</span></div>\n",
            result.status.as_str(),
            status_label(result.status)
        ));
        html.push_str(&format!(
            "                        <div class=\"meta-item\"><strong>File Size:</strong> {}</div>\n",
            format_file_size(result.metadata.file_size)
        ));
        html.push_str(&format!(
            "                        <div class=\"meta-item\"><strong>Language:</strong> {}</div>\n",
            encode_text(language(result))
        ));
        html.push_str(&format!(
            "                        <div class=\"meta-item\"><strong>Processing Time:</strong> {:.2}s</div>\n",
            processing_time(result)
        ));
        html.push_str("                    </div>\n                </div>\n");

        html.push_str("                <div class=\"doc-content\">\n");
        if result.is_success() {
            html.push_str("                    <h4>Extracted Content:</h4>\n");
            html.push_str(&format!(
                "                    <div class=\"extracted-text\">{}</div>\n",
                encode_text(&result.ocr_result.text)
            ));
        } else if let Some(error) = &result.error_message {
            html.push_str(&format!(
                "                    <div class=\"error\"><strong>Error:</strong> {}</div>\n",
                encode_text(error)
            ));
        }
        html.push_str("                </div>\n            </div>\n");
    }
    html.push_str("        </div>\n    </div>\n</body>\n</html>\n");

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentMetadata, ExtractionResult, ProcessingOptions};

    fn sample_results() -> Vec<ProcessingResult> {
        let options = ProcessingOptions::default();
        let mut metadata = DocumentMetadata::new("scan.png", 1536, "image/png", "abc");
        metadata.language = Some("en".to_string());
        metadata.processing_time = Some(1.234);

        vec![
            ProcessingResult::completed(
                metadata,
                ExtractionResult {
                    text: "Total <b>due</b> & payable".to_string(),
                    ..Default::default()
                },
                options,
            ),
            ProcessingResult::failed(
                DocumentMetadata::unknown("notes.docx"),
                "validation failed: unsupported format",
                options,
            ),
        ]
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512.0 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2 * 1024 * 1024), "2.0 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3.0 GB");
        assert_eq!(format_file_size(5000 * 1024 * 1024 * 1024), "5000.0 GB");
    }

    #[test]
    fn test_json_report() {
        let results = sample_results();
        let json = generate_json(&BatchReport::new(&results)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["total_files"], 2);
        assert_eq!(value["successful"], 1);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["results"][0]["status"], "completed");
        assert_eq!(value["results"][1]["metadata"]["file_type"], "unknown");
    }

    #[test]
    fn test_markdown_report() {
        let results = sample_results();
        let md = generate_markdown(&BatchReport::new(&results));

        assert!(md.starts_with("# Document Processing Report"));
        assert!(md.contains("## Document 1: scan.png"));
        assert!(md.contains("**File Size:** 1.5 KB"));
        assert!(md.contains("**Processing Time:** 1.23s"));
        assert!(md.contains("Total <b>due</b> & payable"));
        assert!(md.contains("**Language:** Unknown"));
        assert!(md.contains("**Error:** validation failed: unsupported format"));
    }

    #[test]
    fn test_text_report() {
        let results = sample_results();
        let text = generate_text(&BatchReport::new(&results));

        assert!(text.contains("Document 2: notes.docx"));
        assert!(text.contains("Status: failed"));
        assert!(text.contains("Extracted Content:"));
        assert!(text.contains("Processing Time: 0.00s"));
    }

    #[test]
    fn test_html_report_escapes_content() {
        let results = sample_results();
        let html = generate_html(&BatchReport::new(&results));

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Total &lt;b&gt;due&lt;/b&gt; &amp; payable"));
        assert!(!html.contains("<b>due</b>"));
        assert!(html.contains("<span class=\"status-completed\">Completed</span>"));
        assert!(html.contains("50.0%"));
    }

    #[test]
    fn test_html_report_for_empty_batch() {
        let html = generate_html(&BatchReport::new(&[]));
        assert!(html.contains("0.0%"));
        assert!(html.trim_end().ends_with("</html>"));
    }
}
