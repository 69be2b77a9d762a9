use chrono::{Datelike, NaiveDate};
use crate::errors::Result;

// 自然月分组键
pub fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

// 均值，空集返回 None
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

// 样本标准差（n-1 分母），样本数不足两个返回 None
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

// CSV存储工具
pub mod csv_utils {
    use super::*;
    use crate::models::price::{DailyBar, EnrichedBar};
    use crate::models::symbol::SymbolRecord;
    use std::fs;
    use std::path::Path;

    // 确保父目录存在
    fn ensure_parent_dir(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    /// 写入单个标的的原始日线序列
    pub fn write_series(path: &Path, bars: &[DailyBar]) -> Result<()> {
        ensure_parent_dir(path)?;
        let mut writer = csv::Writer::from_path(path)?;
        for bar in bars {
            writer.serialize(bar)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// 读取日线序列
    ///
    /// 统计列在反序列化时被忽略，原始文件和已富化文件都能读取。
    pub fn read_series(path: &Path) -> Result<Vec<DailyBar>> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut bars = Vec::new();
        for record in reader.deserialize() {
            bars.push(record?);
        }
        Ok(bars)
    }

    /// 写入富化后的日线序列（原地覆盖）
    pub fn write_enriched_series(path: &Path, bars: &[EnrichedBar]) -> Result<()> {
        ensure_parent_dir(path)?;
        let mut writer = csv::Writer::from_path(path)?;
        for bar in bars {
            writer.serialize(bar)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// 读取富化后的日线序列
    pub fn read_enriched_series(path: &Path) -> Result<Vec<EnrichedBar>> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut bars = Vec::new();
        for record in reader.deserialize() {
            bars.push(record?);
        }
        Ok(bars)
    }

    /// 写入有效标的元数据
    pub fn write_metadata(path: &Path, records: &[SymbolRecord]) -> Result<()> {
        ensure_parent_dir(path)?;
        let mut writer = csv::Writer::from_path(path)?;
        if records.is_empty() {
            // serialize 只在有记录时写表头，空集需要手动补上
            writer.write_record(["NASDAQ Symbol", "Security Name", "ETF", "Test Issue"])?;
        }
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// 读取有效标的元数据
    pub fn read_metadata(path: &Path) -> Result<Vec<SymbolRecord>> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut records = Vec::new();
        for record in reader.deserialize() {
            records.push(record?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::price::DailyBar;

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[10.0, -10.0]), Some(0.0));
    }

    #[test]
    fn sample_std_needs_two_observations() {
        assert_eq!(sample_std(&[]), None);
        assert_eq!(sample_std(&[5.0]), None);
        // [10, -10]: 方差 = (100 + 100) / 1 = 200
        let std = sample_std(&[10.0, -10.0]).unwrap();
        assert!((std - 200.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn month_key_groups_by_calendar_month() {
        let jan31 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let jan01 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let feb01 = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(month_key(jan31), month_key(jan01));
        assert_ne!(month_key(jan31), month_key(feb01));
    }

    #[test]
    fn series_round_trips_through_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("TEST.csv");
        let bars = vec![DailyBar {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            open: 100.0,
            high: 102.0,
            low: 99.0,
            close: 101.0,
            volume: 1500,
        }];

        csv_utils::write_series(&path, &bars).unwrap();
        let loaded = csv_utils::read_series(&path).unwrap();
        assert_eq!(loaded, bars);
    }
}
