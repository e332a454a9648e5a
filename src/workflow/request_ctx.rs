//! 请求上下文
//!
//! 封装"这是第几次 generate 调用、要生成什么"这一信息

use std::fmt::Display;

use crate::models::FeatureId;

/// 请求上下文
///
/// 只用于日志前缀，同一次请求的所有日志行都带上它
#[derive(Debug, Clone, Copy)]
pub struct RequestCtx {
    /// 生成器内递增的请求编号（从1开始）
    pub request_id: u64,

    /// 请求的功能
    pub feature: FeatureId,
}

impl RequestCtx {
    /// 创建新的请求上下文
    pub fn new(request_id: u64, feature: FeatureId) -> Self {
        Self {
            request_id,
            feature,
        }
    }
}

impl Display for RequestCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[请求 #{} {}]", self.request_id, self.feature)
    }
}
