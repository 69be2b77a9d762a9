use crate::errors::{PipelineError, Result};
use crate::models::price::DailyBar;
use crate::scrapers::base::PriceSource;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// 雅虎财经历史行情抓取器
pub struct YahooPriceScraper {
    client: Client,
    base_url: String,
    request_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl YahooPriceScraper {
    pub fn new() -> Result<Self> {
        Self::with_base_url(CHART_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(PipelineError::RequestError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_interval: Duration::from_millis(500),
            last_request: Mutex::new(None),
        })
    }

    // 请求限速机制，对外部数据源保持友好
    async fn wait_for_rate_limit(&self) {
        let now = Instant::now();
        let mut last = self.last_request.lock().await;

        if let Some(time) = *last {
            let elapsed = time.elapsed();
            if elapsed < self.request_interval {
                tokio::time::sleep(self.request_interval - elapsed).await;
            }
        }

        *last = Some(now);
    }
}

#[async_trait]
impl PriceSource for YahooPriceScraper {
    fn source_name(&self) -> &'static str {
        "YahooFinance"
    }

    async fn fetch_history(&self, symbol: &str, period: &str) -> Result<Vec<DailyBar>> {
        debug!("获取标的 {} 的历史日线数据，区间 {}", symbol, period);

        // 限制请求频率
        self.wait_for_rate_limit().await;

        let response = self
            .client
            .get(format!("{}/{}", self.base_url, symbol))
            .query(&[("range", period), ("interval", "1d")])
            .send()
            .await
            .map_err(PipelineError::RequestError)?;

        let text = response.text().await?;
        let parsed: ChartResponse = serde_json::from_str(&text)?;

        let bars = extract_bars(parsed);
        debug!("获取到 {} 条日线记录", bars.len());
        Ok(bars)
    }
}

/// 将接口响应转换为日线序列
///
/// 停牌日的报价字段为 null，整行跳过；输出按日期升序去重，
/// 保证序列严格递增。
fn extract_bars(response: ChartResponse) -> Vec<DailyBar> {
    let data = match response.chart.result.and_then(|mut r| {
        if r.is_empty() {
            None
        } else {
            Some(r.remove(0))
        }
    }) {
        Some(data) => data,
        None => return Vec::new(),
    };

    let quote = match data.indicators.quote.into_iter().next() {
        Some(quote) => quote,
        None => return Vec::new(),
    };

    let mut bars: Vec<DailyBar> = data
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let date = timestamp_to_date(ts)?;
            Some(DailyBar {
                date,
                open: *quote.open.get(i)?.as_ref()?,
                high: *quote.high.get(i)?.as_ref()?,
                low: *quote.low.get(i)?.as_ref()?,
                close: *quote.close.get(i)?.as_ref()?,
                volume: *quote.volume.get(i)?.as_ref()?,
            })
        })
        .collect();

    // 按日期升序排序并去重
    bars.sort_by(|a, b| a.date.cmp(&b.date));
    bars.dedup_by(|a, b| a.date == b.date);
    bars
}

fn timestamp_to_date(ts: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}

// 图表接口响应结构
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartData>>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}
