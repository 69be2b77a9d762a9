use serde::{Deserialize, Serialize};

/// 标的类别：基金（ETF）或股票
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentKind {
    Etf,
    Stock,
}

impl InstrumentKind {
    /// 对应的存储子目录名
    pub fn dir_name(&self) -> &'static str {
        match self {
            InstrumentKind::Etf => "etfs",
            InstrumentKind::Stock => "stocks",
        }
    }
}

/// Symbol catalog record with instrument metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRecord {
    #[serde(rename = "NASDAQ Symbol")]
    pub symbol: String,
    #[serde(rename = "Security Name")]
    pub name: String,
    #[serde(rename = "ETF", with = "yn_flag")]
    pub is_etf: bool,
    #[serde(rename = "Test Issue", with = "yn_flag")]
    pub test_issue: bool,
}

impl SymbolRecord {
    pub fn kind(&self) -> InstrumentKind {
        if self.is_etf {
            InstrumentKind::Etf
        } else {
            InstrumentKind::Stock
        }
    }
}

/// 目录源使用 Y/N 标记布尔列
pub mod yn_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(if *value { "Y" } else { "N" })
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        match raw.trim() {
            "Y" | "y" => Ok(true),
            "N" | "n" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "invalid Y/N flag: {}",
                other
            ))),
        }
    }
}
