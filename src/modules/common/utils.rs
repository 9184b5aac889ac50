use std::path::Path;

/// 规范化为正斜杠路径，用于模式匹配
pub fn normalize_separators(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// 规范化匹配模式
pub fn normalize_pattern(pattern: &str) -> String {
    pattern.replace('\\', "/")
}

/// 展开 %VAR% 形式的环境变量
///
/// 未定义的变量保留原样，`%%` 输出单个 `%`。
pub fn expand_percent_env<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }

        let mut var = String::new();
        let mut closed = false;
        while let Some(&next) = chars.peek() {
            chars.next();
            if next == '%' {
                closed = true;
                break;
            }
            var.push(next);
        }

        if var.is_empty() {
            out.push('%');
            continue;
        }

        match lookup(&var) {
            Some(value) if closed => out.push_str(&value),
            _ => {
                out.push('%');
                out.push_str(&var);
                if closed {
                    out.push('%');
                }
            }
        }
    }

    out
}

/// 是否包含通配符
pub fn has_wildcard(text: &str) -> bool {
    text.contains(['*', '?', '['])
}

/// 提取 Windows 盘符 (如 `C:`)
pub fn drive_letter(path: &Path) -> Option<String> {
    let text = path.to_string_lossy();
    let mut chars = text.chars();
    let letter = chars.next()?;
    if letter.is_ascii_alphabetic() && chars.next() == Some(':') {
        Some(format!("{}:", letter.to_ascii_uppercase()))
    } else {
        None
    }
}

/// 格式化文件大小
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// 按字符截断（兼容中文）
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let chars: String = s.chars().take(max_len.saturating_sub(2)).collect();
        format!("{}..", chars)
    } else {
        s.to_string()
    }
}
