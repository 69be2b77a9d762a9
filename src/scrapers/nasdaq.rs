use crate::errors::{PipelineError, Result};
use crate::models::symbol::SymbolRecord;
use crate::scrapers::base::CatalogSource;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use std::time::Duration;

const DEFAULT_CATALOG_URL: &str =
    "http://www.nasdaqtrader.com/dynamic/SymDir/nasdaqtraded.txt";

/// 纳斯达克标的目录抓取器
///
/// 目录为竖线分隔的表格文本，最后一行为文件生成时间戳。
pub struct NasdaqCatalogScraper {
    client: Client,
    url: String,
}

impl NasdaqCatalogScraper {
    /// 创建新的目录抓取器
    pub fn new() -> Result<Self> {
        Self::with_url(DEFAULT_CATALOG_URL)
    }

    /// 使用自定义目录地址创建抓取器
    pub fn with_url(url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(PipelineError::RequestError)?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl CatalogSource for NasdaqCatalogScraper {
    fn source_name(&self) -> &'static str {
        "NASDAQ"
    }

    async fn fetch_catalog(&self) -> Result<Vec<SymbolRecord>> {
        info!("开始获取标的目录: {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(PipelineError::RequestError)?;

        let text = response.text().await?;
        debug!("成功获取响应，共 {} 字节", text.len());

        let records = parse_catalog(&text)?;
        info!("成功解析 {} 条标的记录", records.len());
        Ok(records)
    }
}

/// 解析竖线分隔的目录文本
///
/// 表头行决定各列位置；字段数不足的行（含末尾的
/// `File Creation Time` 行）直接跳过。
pub fn parse_catalog(text: &str) -> Result<Vec<SymbolRecord>> {
    let mut lines = text.lines();

    let header = lines
        .next()
        .ok_or_else(|| PipelineError::DataError("Empty catalog response".to_string()))?;
    let columns: Vec<&str> = header.split('|').map(|c| c.trim()).collect();

    let col_index = |name: &str| -> Result<usize> {
        columns
            .iter()
            .position(|c| *c == name)
            .ok_or_else(|| PipelineError::DataError(format!("Missing catalog column: {}", name)))
    };

    let symbol_idx = col_index("NASDAQ Symbol")?;
    let name_idx = col_index("Security Name")?;
    let etf_idx = col_index("ETF")?;
    let test_idx = col_index("Test Issue")?;

    let mut records = Vec::new();
    for line in lines {
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() != columns.len() {
            // 末尾时间戳行或残缺行
            continue;
        }

        let symbol = fields[symbol_idx].trim();
        if symbol.is_empty() {
            continue;
        }

        records.push(SymbolRecord {
            symbol: symbol.to_string(),
            name: fields[name_idx].trim().to_string(),
            is_etf: fields[etf_idx].trim() == "Y",
            test_issue: fields[test_idx].trim() == "Y",
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Nasdaq Traded|Symbol|Security Name|Listing Exchange|Market Category|ETF|Round Lot Size|Test Issue|Financial Status|CUSIP|NASDAQ Symbol|NextShares
Y|AAPL|Apple Inc. - Common Stock|Q|Q|N|100.0|N|N|037833100|AAPL|N
Y|SPY|SPDR S&P 500 ETF Trust|P| |Y|100.0|N||78462F103|SPY|N
Y|ZXYZ.A|Nasdaq Symbology Test Common Stock|Q|Q|N|100.0|Y|N|15101T102|ZXYZ.A|N
File Creation Time: 0318202522:01|||||||||||";

    #[test]
    fn parses_rows_and_skips_trailer() {
        let records = parse_catalog(SAMPLE).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].symbol, "AAPL");
        assert!(!records[0].is_etf);
        assert!(records[1].is_etf);
        assert!(records[2].test_issue);
    }

    #[test]
    fn preserves_source_order() {
        let records = parse_catalog(SAMPLE).unwrap();
        let symbols: Vec<&str> = records.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "SPY", "ZXYZ.A"]);
    }

    #[test]
    fn missing_column_is_an_error() {
        let text = "Symbol|Security Name\nAAPL|Apple Inc.";
        assert!(parse_catalog(text).is_err());
    }

    #[test]
    fn empty_response_is_an_error() {
        assert!(parse_catalog("").is_err());
    }
}
