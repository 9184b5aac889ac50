use super::models::{ReportDocument, SummaryBucket};
use crate::modules::cleaner::models::{CleanItemResult, CleanStatus};
use crate::modules::common::utils;

/// 生成 HTML 报告
pub fn generate_html_report(document: &ReportDocument) -> String {
    let report = &document.report;
    let count = |name: &str| report.items.iter().filter(|i| i.status.name() == name).count();

    format!(r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>清理报告 - {}</title>
    <style>
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{
            font-family: "Segoe UI", "Microsoft YaHei", sans-serif;
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            min-height: 100vh;
            padding: 20px;
        }}
        .container {{
            max-width: 900px;
            margin: 0 auto;
            background: white;
            border-radius: 16px;
            box-shadow: 0 20px 60px rgba(0,0,0,0.3);
            overflow: hidden;
        }}
        .header {{
            background: linear-gradient(135deg, #2c3e50 0%, #34495e 100%);
            color: white;
            padding: 30px;
        }}
        .header h1 {{
            font-size: 28px;
            margin-bottom: 10px;
        }}
        .header .meta {{
            opacity: 0.8;
            font-size: 14px;
        }}
        .summary {{
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
            gap: 20px;
            padding: 30px;
            background: #f8f9fa;
        }}
        .stat {{
            background: white;
            padding: 20px;
            border-radius: 12px;
            text-align: center;
            box-shadow: 0 2px 8px rgba(0,0,0,0.1);
        }}
        .stat .value {{
            font-size: 32px;
            font-weight: bold;
            color: #667eea;
        }}
        .stat .label {{
            color: #666;
            margin-top: 8px;
            font-size: 14px;
        }}
        .success .value {{ color: #27ae60; }}
        .failed .value {{ color: #e74c3c; }}
        .content {{
            padding: 30px;
        }}
        .section-title {{
            font-size: 18px;
            color: #2c3e50;
            margin-bottom: 20px;
            padding-bottom: 10px;
            border-bottom: 2px solid #667eea;
        }}
        table {{
            width: 100%;
            border-collapse: collapse;
            margin-bottom: 20px;
        }}
        th, td {{
            padding: 12px 15px;
            text-align: left;
            border-bottom: 1px solid #eee;
        }}
        th {{
            background: #f8f9fa;
            color: #2c3e50;
            font-weight: 600;
        }}
        tr:hover {{
            background: #f8f9fa;
        }}
        .status {{
            display: inline-block;
            padding: 4px 12px;
            border-radius: 20px;
            font-size: 12px;
            font-weight: 600;
        }}
        .status.success {{
            background: #d4edda;
            color: #155724;
        }}
        .status.failed {{
            background: #f8d7da;
            color: #721c24;
        }}
        .status.partial {{
            background: #fff3cd;
            color: #856404;
        }}
        .status.muted {{
            background: #e9ecef;
            color: #495057;
        }}
        .message {{
            font-family: "Consolas", monospace;
            font-size: 13px;
            color: #666;
            word-break: break-all;
        }}
        .footer {{
            background: #f8f9fa;
            padding: 20px 30px;
            text-align: center;
            color: #666;
            font-size: 13px;
        }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>清理报告</h1>
            <div class="meta">
                <p>生成时间: {}</p>
                <p>报告ID: {}</p>
            </div>
        </div>

        <div class="summary">
            <div class="stat">
                <div class="value">{}</div>
                <div class="label">释放空间</div>
            </div>
            <div class="stat">
                <div class="value">{}</div>
                <div class="label">删除文件</div>
            </div>
            <div class="stat success">
                <div class="value">{}</div>
                <div class="label">完成规则</div>
            </div>
            <div class="stat failed">
                <div class="value">{}</div>
                <div class="label">失败或跳过</div>
            </div>
        </div>

        <div class="content">
            {}
            {}
            {}
        </div>

        <div class="footer">
            <p>由 winsweep 生成</p>
        </div>
    </div>
</body>
</html>"#,
        document.generated_at.format("%Y-%m-%d %H:%M:%S"),
        document.generated_at.format("%Y-%m-%d %H:%M:%S"),
        document.id,
        utils::format_size(report.summary.total_bytes),
        report.summary.total_files,
        count("ok") + count("partial"),
        count("error") + count("blocked") + count("incomplete"),
        generate_items_table(&report.items),
        generate_bucket_table("按分类", "分类", &report.summary.by_category),
        generate_bucket_table("按磁盘", "磁盘", &report.summary.by_drive),
    )
}

fn generate_items_table(items: &[CleanItemResult]) -> String {
    if items.is_empty() {
        return "<p>暂无清理记录</p>".to_string();
    }

    let mut html = String::from(r#"
        <h2 class="section-title">清理详情</h2>
        <table>
            <thead>
                <tr>
                    <th>状态</th>
                    <th>规则</th>
                    <th>分类</th>
                    <th>释放空间</th>
                    <th>文件数</th>
                    <th>说明</th>
                </tr>
            </thead>
            <tbody>
    "#);

    for item in items {
        let status_html = match item.status {
            CleanStatus::Ok => r#"<span class="status success">完成</span>"#,
            CleanStatus::Partial { .. } => r#"<span class="status partial">部分完成</span>"#,
            CleanStatus::Error { .. } => r#"<span class="status failed">失败</span>"#,
            CleanStatus::Blocked { .. } => r#"<span class="status muted">已阻止</span>"#,
            CleanStatus::Incomplete => r#"<span class="status muted">未完成</span>"#,
        };

        let size_html = if item.total_bytes > 0 {
            utils::format_size(item.total_bytes)
        } else {
            "-".to_string()
        };

        html.push_str(&format!(r#"
                <tr>
                    <td>{}</td>
                    <td>{}</td>
                    <td>{}</td>
                    <td>{}</td>
                    <td>{}</td>
                    <td class="message">{}</td>
                </tr>
        "#,
            status_html,
            escape_html(&item.title),
            item.category,
            size_html,
            item.total_files,
            escape_html(&item.status.message().unwrap_or_default()),
        ));
    }

    html.push_str("</tbody></table>");

    html
}

fn generate_bucket_table(title: &str, key_label: &str, buckets: &[SummaryBucket]) -> String {
    if buckets.is_empty() {
        return String::new();
    }

    let mut html = format!(r#"
        <h2 class="section-title">{}</h2>
        <table>
            <thead>
                <tr>
                    <th>{}</th>
                    <th>释放空间</th>
                    <th>文件数</th>
                    <th>占比</th>
                </tr>
            </thead>
            <tbody>
    "#, title, key_label);

    for bucket in buckets {
        html.push_str(&format!(r#"
                <tr>
                    <td>{}</td>
                    <td>{}</td>
                    <td>{}</td>
                    <td>{:.1}%</td>
                </tr>
        "#,
            escape_html(&bucket.key),
            utils::format_size(bucket.bytes),
            bucket.files,
            bucket.percent,
        ));
    }

    html.push_str("</tbody></table>");

    html
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::catalog::models::{Category, Risk};
    use crate::modules::cleaner::models::CleanReport;
    use crate::modules::reporter::aggregate::aggregate;
    use std::collections::BTreeMap;

    #[test]
    fn report_lists_items_and_buckets() {
        let items = vec![CleanItemResult {
            id: "user_temp".to_string(),
            title: "<Temp>".to_string(),
            category: Category::Temp,
            risk: Risk::Low,
            status: CleanStatus::Partial {
                message: "a.tmp: 拒绝访问".to_string(),
            },
            total_bytes: 2048,
            total_files: 2,
            freed_by_drive: BTreeMap::new(),
        }];
        let summary = aggregate(&items);
        let document = ReportDocument::new(CleanReport { items, summary });

        let html = generate_html_report(&document);
        assert!(html.contains(&document.id));
        assert!(html.contains("&lt;Temp&gt;"));
        assert!(html.contains("部分完成"));
        assert!(html.contains("按分类"));
        assert!(html.contains("100.0%"));
        assert!(!html.contains("按磁盘"));
    }
}
