use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 日线数据结构
///
/// 序列不变量：按日期严格递增，无重复日期。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    #[serde(rename = "Date", with = "iso_date")]
    pub date: NaiveDate,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Volume")]
    pub volume: i64,
}

/// Daily bar plus derived return/volatility columns
///
/// 同一自然月内的三项月度统计列在所有行上取相同值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBar {
    #[serde(rename = "Date", with = "iso_date")]
    pub date: NaiveDate,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Volume")]
    pub volume: i64,
    // 首行无前一收盘价，日收益为空
    #[serde(rename = "daily_return")]
    pub daily_return: Option<f64>,
    #[serde(rename = "monthly_mean_return")]
    pub monthly_mean_return: Option<f64>,
    #[serde(rename = "monthly_volatility")]
    pub monthly_volatility: Option<f64>,
    #[serde(rename = "monthly_avg_volume")]
    pub monthly_avg_volume: Option<f64>,
}

impl EnrichedBar {
    /// 从原始日线数据构造，统计列留空
    pub fn from_bar(bar: DailyBar) -> Self {
        Self {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            daily_return: None,
            monthly_mean_return: None,
            monthly_volatility: None,
            monthly_avg_volume: None,
        }
    }
}

/// 日期列使用 ISO 格式（YYYY-MM-DD）
pub mod iso_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(raw.trim(), FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: &str, close: f64) -> DailyBar {
        DailyBar {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn daily_bar_serializes_iso_dates() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(bar("2024-03-01", 101.5)).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert!(text.starts_with("Date,Open,High,Low,Close,Volume"));
        assert!(text.contains("2024-03-01"));
    }

    #[test]
    fn enriched_bar_writes_empty_fields_for_missing_stats() {
        let enriched = EnrichedBar::from_bar(bar("2024-03-01", 100.0));
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(&enriched).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let data_row = text.lines().nth(1).unwrap();
        assert!(data_row.ends_with(",,,,"));

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let parsed: EnrichedBar = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(parsed.daily_return, None);
        assert_eq!(parsed, enriched);
    }
}
