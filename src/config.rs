use crate::errors::{PipelineError, Result};

/// 下载数量限制策略
///
/// 两种语义刻意分开：`MaxAttempts` 限制尝试的标的数量，
/// `TargetSuccesses` 持续尝试直到拿到指定数量的有效数据。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitPolicy {
    /// 从偏移位置开始处理剩余全部标的
    All,
    /// 最多尝试 n 个标的
    MaxAttempts(usize),
    /// 持续尝试直到成功 n 个标的（或列表耗尽）
    TargetSuccesses(usize),
}

// 数据源接受的历史区间标记
const VALID_PERIODS: &[&str] = &[
    "1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: String,
    pub offset: usize,
    pub limit: LimitPolicy,
    pub period: String,
}

impl Config {
    pub fn new() -> Self {
        Self {
            data_dir: "data".to_string(),
            offset: 0,
            limit: LimitPolicy::All,
            period: "10y".to_string(),
        }
    }

    pub fn with_data_dir(mut self, dir: &str) -> Self {
        self.data_dir = dir.to_string();
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_limit(mut self, limit: LimitPolicy) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_period(mut self, period: &str) -> Self {
        self.period = period.to_string();
        self
    }

    /// 校验历史区间标记是否被数据源接受
    pub fn validate(&self) -> Result<()> {
        if !VALID_PERIODS.contains(&self.period.as_str()) {
            return Err(PipelineError::ConfigError(format!(
                "Invalid period '{}', expected one of: {}",
                self.period,
                VALID_PERIODS.join(",")
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.period, "10y");
        assert_eq!(config.limit, LimitPolicy::All);
    }

    #[test]
    fn rejects_unknown_period_token() {
        let config = Config::new().with_period("7w");
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_methods_chain() {
        let config = Config::new()
            .with_data_dir("out")
            .with_offset(100)
            .with_limit(LimitPolicy::TargetSuccesses(30))
            .with_period("1y");
        assert_eq!(config.data_dir, "out");
        assert_eq!(config.offset, 100);
        assert_eq!(config.limit, LimitPolicy::TargetSuccesses(30));
        assert!(config.validate().is_ok());
    }
}
