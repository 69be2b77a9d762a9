use crate::config::Config;
use crate::errors::{PipelineError, Result};
use crate::models::price::{DailyBar, EnrichedBar};
use crate::models::symbol::InstrumentKind;
use crate::util;
use log::{info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 统计富化结果
#[derive(Debug, Default)]
pub struct EnrichStats {
    pub processed: usize,
    pub failed: usize,
}

/// 统计服务，为每个序列文件追加日收益和月度统计列
pub struct StatsService {
    config: Config,
}

impl StatsService {
    /// 创建新的统计服务实例
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// 处理两个类别目录下的全部序列文件
    pub fn enrich_all(&self) -> Result<EnrichStats> {
        let mut stats = EnrichStats::default();

        for kind in [InstrumentKind::Etf, InstrumentKind::Stock] {
            let dir = PathBuf::from(&self.config.data_dir).join(kind.dir_name());
            if !dir.exists() {
                continue;
            }
            let dir_stats = self.enrich_dir(&dir)?;
            stats.processed += dir_stats.processed;
            stats.failed += dir_stats.failed;
        }

        Ok(stats)
    }

    /// 处理单个目录下的全部CSV文件
    ///
    /// 每个文件独立处理，单个文件的解析或计算错误只记录日志并
    /// 跳过，不影响其余文件。与文件所属类别无关。
    pub fn enrich_dir(&self, dir: &Path) -> Result<EnrichStats> {
        let mut stats = EnrichStats::default();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }

            match self.enrich_file(&path) {
                Ok(count) => {
                    info!("Successfully processed {} ({} records)", path.display(), count);
                    stats.processed += 1;
                }
                Err(e) => {
                    warn!(
                        "{}",
                        PipelineError::FileProcessingFailed {
                            path: path.display().to_string(),
                            reason: e.to_string(),
                        }
                    );
                    stats.failed += 1;
                }
            }
        }

        info!(
            "Enrichment finished for {}: {} processed, {} failed",
            dir.display(),
            stats.processed,
            stats.failed
        );
        Ok(stats)
    }

    /// 读取、富化并原地覆盖单个序列文件
    pub fn enrich_file(&self, path: &Path) -> Result<usize> {
        let bars = util::csv_utils::read_series(path)?;
        let enriched = enrich_series(&bars);
        util::csv_utils::write_enriched_series(path, &enriched)?;
        Ok(enriched.len())
    }
}

/// 计算日收益并广播月度统计
///
/// 日收益为收盘价相对前一交易日的百分比变化，首行为空。
/// 三项月度统计按自然月计算后广播到该月每一行。
pub fn enrich_series(bars: &[DailyBar]) -> Vec<EnrichedBar> {
    let mut enriched: Vec<EnrichedBar> =
        bars.iter().cloned().map(EnrichedBar::from_bar).collect();

    for i in 1..enriched.len() {
        let prev_close = bars[i - 1].close;
        // 零收盘价无法计算百分比收益
        if prev_close != 0.0 {
            enriched[i].daily_return = Some((bars[i].close / prev_close - 1.0) * 100.0);
        }
    }

    // 按自然月收集收益和成交量
    let mut groups: HashMap<(i32, u32), (Vec<f64>, Vec<f64>)> = HashMap::new();
    for bar in &enriched {
        let group = groups.entry(util::month_key(bar.date)).or_default();
        if let Some(r) = bar.daily_return {
            group.0.push(r);
        }
        group.1.push(bar.volume as f64);
    }

    for bar in &mut enriched {
        if let Some((returns, volumes)) = groups.get(&util::month_key(bar.date)) {
            bar.monthly_mean_return = util::mean(returns);
            bar.monthly_volatility = util::sample_std(returns);
            bar.monthly_avg_volume = util::mean(volumes);
        }
    }

    enriched
}
