use crate::errors::{PipelineError, Result};
use crate::models::price::EnrichedBar;
use crate::models::symbol::{InstrumentKind, SymbolRecord};
use crate::util;
use chrono::Datelike;
use log::info;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 行情数据提供者，用于只读访问整理后的存储布局
///
/// 供下游消费方（如看板）使用：按类别列出标的、加载富化后的
/// 序列、按年份区间过滤。
pub struct PriceDataProvider {
    data_dir: PathBuf,
    // 索引用于快速查找
    symbol_index: HashMap<String, (InstrumentKind, PathBuf)>,
    kind_index: HashMap<InstrumentKind, Vec<String>>,
}

impl PriceDataProvider {
    /// 扫描存储目录并建立索引
    pub fn open(data_dir: &Path) -> Result<Self> {
        let mut provider = Self {
            data_dir: data_dir.to_path_buf(),
            symbol_index: HashMap::new(),
            kind_index: HashMap::new(),
        };

        for kind in [InstrumentKind::Etf, InstrumentKind::Stock] {
            let dir = data_dir.join(kind.dir_name());
            if !dir.exists() {
                continue;
            }

            let mut symbols = Vec::new();
            for entry in std::fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                    continue;
                }
                if let Some(symbol) = path.file_stem().and_then(|s| s.to_str()) {
                    symbols.push(symbol.to_string());
                    provider
                        .symbol_index
                        .insert(symbol.to_string(), (kind, path.clone()));
                }
            }

            symbols.sort();
            provider.kind_index.insert(kind, symbols);
        }

        info!(
            "Indexed {} symbols under {}",
            provider.symbol_index.len(),
            data_dir.display()
        );
        Ok(provider)
    }

    /// 获取指定类别的全部标的（按字母序）
    pub fn symbols(&self, kind: InstrumentKind) -> &[String] {
        self.kind_index
            .get(&kind)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// 查询标的所属类别
    pub fn kind_of(&self, symbol: &str) -> Option<InstrumentKind> {
        self.symbol_index.get(symbol).map(|(kind, _)| *kind)
    }

    /// 加载单个标的的富化序列
    pub fn load_series(&self, symbol: &str) -> Result<Vec<EnrichedBar>> {
        let (_, path) = self
            .symbol_index
            .get(symbol)
            .ok_or_else(|| PipelineError::DataError(format!("Unknown symbol: {}", symbol)))?;
        util::csv_utils::read_enriched_series(path)
    }

    /// 加载单个标的的富化序列，按年份区间（闭区间）过滤
    pub fn load_series_between(
        &self,
        symbol: &str,
        from_year: i32,
        to_year: i32,
    ) -> Result<Vec<EnrichedBar>> {
        let bars = self.load_series(symbol)?;
        Ok(bars
            .into_iter()
            .filter(|bar| bar.date.year() >= from_year && bar.date.year() <= to_year)
            .collect())
    }

    /// 加载有效标的元数据
    pub fn load_valid_metadata(&self) -> Result<Vec<SymbolRecord>> {
        util::csv_utils::read_metadata(&self.data_dir.join("symbols_valid_meta.csv"))
    }
}
