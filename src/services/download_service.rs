use crate::config::{Config, LimitPolicy};
use crate::errors::{PipelineError, Result};
use crate::models::symbol::SymbolRecord;
use crate::scrapers::base::{CatalogSource, PriceSource};
use crate::util;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// 单次运行的下载结果集：标的 → 是否成功
///
/// 仅在运行期间存在，其过滤效果通过后续的元数据落盘体现。
#[derive(Debug, Default)]
pub struct RunOutcome {
    results: HashMap<String, bool>,
}

impl RunOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn mark(&mut self, symbol: &str, success: bool) {
        self.results.insert(symbol.to_string(), success);
    }

    pub fn is_success(&self, symbol: &str) -> bool {
        self.results.get(symbol).copied().unwrap_or(false)
    }

    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> usize {
        self.results.values().filter(|&&ok| ok).count()
    }
}

/// 下载服务，处理标的目录获取与历史数据批量下载
pub struct DownloadService {
    config: Config,
    catalog_source: Arc<dyn CatalogSource + Send + Sync>,
    price_source: Arc<dyn PriceSource + Send + Sync>,
}

impl DownloadService {
    /// 创建新的下载服务实例
    pub fn new(
        config: Config,
        catalog_source: Arc<dyn CatalogSource + Send + Sync>,
        price_source: Arc<dyn PriceSource + Send + Sync>,
    ) -> Self {
        Self {
            config,
            catalog_source,
            price_source,
        }
    }

    /// 单个标的的暂存文件路径
    pub fn staging_path(&self, symbol: &str) -> PathBuf {
        PathBuf::from(&self.config.data_dir).join(format!("{}.csv", symbol))
    }

    /// 获取并过滤标的目录
    ///
    /// 目录源不可用是致命错误，直接终止本次运行；
    /// 测试标的在此处被过滤，输出保持源内顺序。
    pub async fn load_catalog(&self) -> Result<Vec<SymbolRecord>> {
        info!("Loading symbol catalog from {}", self.catalog_source.source_name());

        let catalog = self
            .catalog_source
            .fetch_catalog()
            .await
            .map_err(|e| PipelineError::SourceUnavailable(e.to_string()))?;

        let total = catalog.len();
        let tradable: Vec<SymbolRecord> =
            catalog.into_iter().filter(|r| !r.test_issue).collect();

        info!(
            "Catalog loaded: {} symbols, {} tradable after dropping test issues",
            total,
            tradable.len()
        );
        Ok(tradable)
    }

    /// 按配置的偏移和限制策略顺序下载历史数据
    ///
    /// 单个标的的失败（请求错误或空数据）只记录为失败并继续，
    /// 不中断整个批次；成功的序列写入暂存目录。
    pub async fn download_all(&self, symbols: &[SymbolRecord]) -> Result<RunOutcome> {
        let mut outcome = RunOutcome::new();

        if self.config.offset >= symbols.len() {
            warn!(
                "Offset {} is beyond the symbol list ({} symbols), nothing to download",
                self.config.offset,
                symbols.len()
            );
            return Ok(outcome);
        }

        info!(
            "Starting batch download from {} (offset {}, {:?}, period {})",
            self.price_source.source_name(),
            self.config.offset,
            self.config.limit,
            self.config.period
        );

        for record in &symbols[self.config.offset..] {
            match self.config.limit {
                LimitPolicy::All => {}
                LimitPolicy::MaxAttempts(n) => {
                    if outcome.attempted() >= n {
                        break;
                    }
                }
                LimitPolicy::TargetSuccesses(n) => {
                    if outcome.succeeded() >= n {
                        break;
                    }
                }
            }

            match self
                .price_source
                .fetch_history(&record.symbol, &self.config.period)
                .await
            {
                Ok(bars) if bars.is_empty() => {
                    debug!("No data returned for {}, skipping", record.symbol);
                    outcome.mark(&record.symbol, false);
                }
                Ok(bars) => {
                    let path = self.staging_path(&record.symbol);
                    match util::csv_utils::write_series(&path, &bars) {
                        Ok(()) => {
                            info!("Downloaded {} ({} bars)", record.symbol, bars.len());
                            outcome.mark(&record.symbol, true);
                        }
                        Err(e) => {
                            warn!(
                                "{}",
                                PipelineError::SymbolDownloadFailed {
                                    symbol: record.symbol.clone(),
                                    reason: e.to_string(),
                                }
                            );
                            outcome.mark(&record.symbol, false);
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        "{}",
                        PipelineError::SymbolDownloadFailed {
                            symbol: record.symbol.clone(),
                            reason: e.to_string(),
                        }
                    );
                    outcome.mark(&record.symbol, false);
                }
            }
        }

        info!(
            "Batch download finished: {} attempted, {} succeeded",
            outcome.attempted(),
            outcome.succeeded()
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_counts_attempts_and_successes() {
        let mut outcome = RunOutcome::new();
        outcome.mark("A", true);
        outcome.mark("B", false);
        outcome.mark("C", true);

        assert_eq!(outcome.attempted(), 3);
        assert_eq!(outcome.succeeded(), 2);
        assert!(outcome.is_success("A"));
        assert!(!outcome.is_success("B"));
        assert!(!outcome.is_success("UNKNOWN"));
    }
}
