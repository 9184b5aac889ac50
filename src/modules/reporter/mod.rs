//! 报告汇总与保存

pub mod aggregate;
pub mod html;
pub mod models;

use std::path::{Path, PathBuf};

use crate::modules::common::error::SweepError;
use models::ReportDocument;

pub use aggregate::aggregate;

/// 已保存的报告文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReport {
    pub json: PathBuf,
    pub html: PathBuf,
}

/// 默认报告路径（不含扩展名）
pub fn default_report_base(reports_dir: &Path, document: &ReportDocument) -> PathBuf {
    reports_dir.join(format!(
        "clean-{}",
        document.generated_at.format("%Y%m%d-%H%M%S")
    ))
}

/// 保存 JSON 与 HTML 两份报告，扩展名由 base 替换
pub fn save_report(document: &ReportDocument, base: &Path) -> Result<SavedReport, SweepError> {
    if let Some(parent) = base.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let json = base.with_extension("json");
    let html = base.with_extension("html");

    std::fs::write(&json, serde_json::to_string_pretty(document)?)?;
    std::fs::write(&html, html::generate_html_report(document))?;

    tracing::info!("报告已保存: {}", json.display());
    Ok(SavedReport { json, html })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::cleaner::models::CleanReport;
    use models::CleanSummary;

    #[test]
    fn saves_json_and_html_side_by_side() {
        let dir = std::env::temp_dir().join(format!("winsweep-report-{}", uuid::Uuid::new_v4()));
        let document = ReportDocument::new(CleanReport {
            items: Vec::new(),
            summary: CleanSummary::default(),
        });

        let base = default_report_base(&dir.join("reports"), &document);
        let saved = save_report(&document, &base).expect("save report");

        let json = std::fs::read_to_string(&saved.json).expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value["id"], document.id.as_str());
        assert_eq!(value["report"]["summary"]["total_bytes"], 0);
        assert!(saved.html.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
