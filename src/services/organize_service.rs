use crate::config::Config;
use crate::errors::Result;
use crate::models::symbol::{InstrumentKind, SymbolRecord};
use crate::services::download_service::RunOutcome;
use crate::util;
use log::{debug, info};
use std::fs;
use std::path::PathBuf;

/// 分类整理结果统计
#[derive(Debug, Default)]
pub struct OrganizeSummary {
    pub valid: usize,
    pub moved_etfs: usize,
    pub moved_stocks: usize,
    pub skipped: usize,
}

/// 分类整理服务，负责元数据落盘和按类别归档序列文件
pub struct OrganizeService {
    config: Config,
}

impl OrganizeService {
    /// 创建新的分类整理服务实例
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// 有效标的元数据文件路径
    pub fn metadata_path(&self) -> PathBuf {
        PathBuf::from(&self.config.data_dir).join("symbols_valid_meta.csv")
    }

    fn category_dir(&self, kind: InstrumentKind) -> PathBuf {
        PathBuf::from(&self.config.data_dir).join(kind.dir_name())
    }

    /// 计算下载成功的标的子集，落盘元数据，并把暂存的序列
    /// 文件按类别移动到对应子目录
    ///
    /// 移动操作幂等：源文件不存在时静默跳过。
    pub fn organize(
        &self,
        catalog: &[SymbolRecord],
        outcome: &RunOutcome,
    ) -> Result<OrganizeSummary> {
        // 保持目录顺序筛选有效子集
        let valid: Vec<SymbolRecord> = catalog
            .iter()
            .filter(|r| outcome.is_success(&r.symbol))
            .cloned()
            .collect();

        let metadata_path = self.metadata_path();
        util::csv_utils::write_metadata(&metadata_path, &valid)?;
        info!(
            "Persisted metadata for {} valid symbols to {}",
            valid.len(),
            metadata_path.display()
        );

        let mut summary = OrganizeSummary {
            valid: valid.len(),
            ..OrganizeSummary::default()
        };

        for record in &valid {
            let kind = record.kind();
            if self.relocate(&record.symbol, kind)? {
                match kind {
                    InstrumentKind::Etf => summary.moved_etfs += 1,
                    InstrumentKind::Stock => summary.moved_stocks += 1,
                }
            } else {
                summary.skipped += 1;
            }
        }

        info!(
            "Organized {} symbols: {} etfs, {} stocks, {} skipped",
            summary.valid, summary.moved_etfs, summary.moved_stocks, summary.skipped
        );
        Ok(summary)
    }

    // 把单个标的的序列文件从暂存区移动到类别目录
    fn relocate(&self, symbol: &str, kind: InstrumentKind) -> Result<bool> {
        let filename = format!("{}.csv", symbol);
        let src = PathBuf::from(&self.config.data_dir).join(&filename);

        if !src.exists() {
            // 已经移动过或从未创建
            debug!("Source file for {} not found, skipping relocation", symbol);
            return Ok(false);
        }

        let dest_dir = self.category_dir(kind);
        if !dest_dir.exists() {
            fs::create_dir_all(&dest_dir)?;
        }

        fs::rename(&src, dest_dir.join(&filename))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(symbol: &str, is_etf: bool) -> SymbolRecord {
        SymbolRecord {
            symbol: symbol.to_string(),
            name: format!("{} Test Security", symbol),
            is_etf,
            test_issue: false,
        }
    }

    fn touch_staged(dir: &std::path::Path, symbol: &str) {
        fs::write(
            dir.join(format!("{}.csv", symbol)),
            "Date,Open,High,Low,Close,Volume\n2024-03-01,1.0,1.0,1.0,1.0,10\n",
        )
        .unwrap();
    }

    #[test]
    fn moves_each_valid_symbol_into_exactly_one_category() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new().with_data_dir(dir.path().to_str().unwrap());
        let service = OrganizeService::new(config);

        let catalog = vec![record("SPY", true), record("AAPL", false)];
        touch_staged(dir.path(), "SPY");
        touch_staged(dir.path(), "AAPL");

        let mut outcome = RunOutcome::new();
        outcome.mark("SPY", true);
        outcome.mark("AAPL", true);

        let summary = service.organize(&catalog, &outcome).unwrap();
        assert_eq!(summary.moved_etfs, 1);
        assert_eq!(summary.moved_stocks, 1);
        assert_eq!(summary.skipped, 0);

        assert!(dir.path().join("etfs/SPY.csv").exists());
        assert!(dir.path().join("stocks/AAPL.csv").exists());
        // 暂存区不再保留
        assert!(!dir.path().join("SPY.csv").exists());
        assert!(!dir.path().join("AAPL.csv").exists());
        // 类别互斥
        assert!(!dir.path().join("stocks/SPY.csv").exists());
        assert!(!dir.path().join("etfs/AAPL.csv").exists());
    }

    #[test]
    fn metadata_contains_exactly_the_successful_symbols() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new().with_data_dir(dir.path().to_str().unwrap());
        let service = OrganizeService::new(config);

        let catalog = vec![record("A", true), record("B", false), record("C", false)];
        touch_staged(dir.path(), "A");

        let mut outcome = RunOutcome::new();
        outcome.mark("A", true);
        outcome.mark("B", false);

        service.organize(&catalog, &outcome).unwrap();

        let meta = util::csv_utils::read_metadata(&service.metadata_path()).unwrap();
        let symbols: Vec<&str> = meta.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["A"]);
    }

    #[test]
    fn relocating_a_missing_source_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new().with_data_dir(dir.path().to_str().unwrap());
        let service = OrganizeService::new(config);

        let catalog = vec![record("GHOST", false)];
        let mut outcome = RunOutcome::new();
        outcome.mark("GHOST", true);

        // 源文件不存在，不应报错
        let summary = service.organize(&catalog, &outcome).unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.moved_stocks, 0);

        // 再次整理同样幂等
        let summary = service.organize(&catalog, &outcome).unwrap();
        assert_eq!(summary.skipped, 1);
    }
}
