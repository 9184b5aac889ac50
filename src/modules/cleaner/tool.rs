use std::path::Path;
use std::process::Command;

use super::models::Removal;

/// 运行外部清理工具，非零退出码视为失败
pub fn run_tool(program: &Path, args: &[String]) -> Removal {
    let shown = format!("{} {}", program.display(), args.join(" "));
    tracing::info!("运行外部工具: {}", shown);

    match Command::new(program).args(args).output() {
        Ok(output) if output.status.success() => Removal::default(),
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.trim();
            tracing::warn!("外部工具失败 {}: {} {}", shown, output.status, detail);
            Removal::failed(format!("{}: {} {}", shown, output.status, detail))
        }
        Err(e) => {
            tracing::error!("无法启动外部工具 {}: {}", shown, e);
            Removal::failed(format!("{}: {}", shown, e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::cleaner::models::RemovalOutcome;

    #[test]
    fn missing_program_is_a_failure() {
        let removal = run_tool(Path::new("winsweep-no-such-tool"), &["/x".to_string()]);
        assert_eq!(removal.outcome(), RemovalOutcome::Failed);
        assert!(removal.failures[0].contains("winsweep-no-such-tool"));
    }
}
