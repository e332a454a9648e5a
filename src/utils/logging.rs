/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化全局日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug 或 info。
/// 重复调用不会报错，测试中可以随意调用。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录生成器启动信息
///
/// # 参数
/// - `config`: 当前配置
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 阅读辅助生成器启动");
    info!("📊 扇出并发上限: {}", config.max_in_flight_units);
    info!("🔊 音频目录: {} (保留 {} 个)", config.narration.audio_dir, config.narration.retention);
    info!("{}", "=".repeat(60));
}

/// 记录扇出结果
///
/// # 参数
/// - `prefix`: 日志前缀（请求上下文）
/// - `success`: 成功单元数
/// - `total`: 单元总数
pub fn log_fan_out_complete(prefix: &str, success: usize, total: usize) {
    if success == total {
        info!("{} ✓ 全部 {} 个单元完成", prefix, total);
    } else {
        info!("{} ⚠️ 完成 {}/{} 个单元，其余已跳过", prefix, success, total);
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 5), "hello...");
        assert_eq!(truncate_text("朗读音频文件", 2), "朗读...");
    }

    #[test]
    fn test_init_is_idempotent() {
        init(false);
        init(true);
    }
}
