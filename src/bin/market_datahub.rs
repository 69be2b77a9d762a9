use market_datahub::config::{Config, LimitPolicy};
use market_datahub::data_provider::PriceDataProvider;
use market_datahub::models::symbol::InstrumentKind;
use market_datahub::scrapers::nasdaq::NasdaqCatalogScraper;
use market_datahub::scrapers::yahoo::YahooPriceScraper;
use market_datahub::services::download_service::DownloadService;
use market_datahub::services::organize_service::OrganizeService;
use market_datahub::services::stats_service::StatsService;

use anyhow::{bail, Result};
use clap::{App, Arg, SubCommand};
use log::info;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    // 创建基本的命令行应用
    let app = App::new("MarketDataHub")
        .version("0.3.2")
        .author("MarketDataHub Team")
        .about("Market historical data pipeline: download, organize and enrich");

    // 添加子命令
    let app = app
        .subcommand(
            SubCommand::with_name("download")
                .about("Fetch the symbol catalog and download historical series")
                .arg(
                    Arg::with_name("data-dir")
                        .long("data-dir")
                        .value_name("DIR")
                        .help("Base storage directory")
                        .takes_value(true)
                        .default_value("data"),
                )
                .arg(
                    Arg::with_name("offset")
                        .short('o')
                        .long("offset")
                        .value_name("OFFSET")
                        .help("Start index into the symbol list")
                        .takes_value(true)
                        .default_value("0"),
                )
                .arg(
                    Arg::with_name("limit")
                        .short('l')
                        .long("limit")
                        .value_name("LIMIT")
                        .help("Maximum number of symbols to attempt")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("target")
                        .short('t')
                        .long("target")
                        .value_name("TARGET")
                        .help("Keep attempting until this many symbols succeed")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("period")
                        .short('p')
                        .long("period")
                        .value_name("PERIOD")
                        .help("History period token (1d,5d,1mo,3mo,6mo,1y,2y,5y,10y,ytd,max)")
                        .takes_value(true)
                        .default_value("10y"),
                )
                .arg(
                    Arg::with_name("catalog-url")
                        .long("catalog-url")
                        .value_name("URL")
                        .help("Override the symbol catalog endpoint")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("enrich")
                .about("Compute daily returns and monthly aggregates for stored series")
                .arg(
                    Arg::with_name("data-dir")
                        .long("data-dir")
                        .value_name("DIR")
                        .help("Base storage directory")
                        .takes_value(true)
                        .default_value("data"),
                )
                .arg(
                    Arg::with_name("dir")
                        .short('d')
                        .long("dir")
                        .value_name("DIR")
                        .help("Process a single directory instead of both categories")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("explore")
                .about("Explore the organized storage layout")
                .arg(
                    Arg::with_name("data-dir")
                        .long("data-dir")
                        .value_name("DIR")
                        .help("Base storage directory")
                        .takes_value(true)
                        .default_value("data"),
                )
                .arg(
                    Arg::with_name("symbol")
                        .short('s')
                        .long("symbol")
                        .value_name("SYMBOL")
                        .help("Symbol to display enriched records for")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("from-year")
                        .long("from-year")
                        .value_name("YEAR")
                        .help("First year to include")
                        .takes_value(true)
                        .default_value("2013"),
                )
                .arg(
                    Arg::with_name("to-year")
                        .long("to-year")
                        .value_name("YEAR")
                        .help("Last year to include")
                        .takes_value(true)
                        .default_value("2100"),
                )
                .arg(
                    Arg::with_name("limit")
                        .short('l')
                        .long("limit")
                        .value_name("LIMIT")
                        .help("Limit the number of records to display")
                        .takes_value(true)
                        .default_value("10"),
                ),
        );

    let matches = app.get_matches();

    if let Some(matches) = matches.subcommand_matches("download") {
        let data_dir = matches.value_of("data-dir").unwrap();
        let offset = matches.value_of("offset").unwrap().parse::<usize>()?;
        let period = matches.value_of("period").unwrap();

        // 两种限制语义互斥，由调用方显式选择
        let limit = match (matches.value_of("limit"), matches.value_of("target")) {
            (Some(_), Some(_)) => {
                bail!("--limit and --target are mutually exclusive");
            }
            (Some(n), None) => LimitPolicy::MaxAttempts(n.parse()?),
            (None, Some(n)) => LimitPolicy::TargetSuccesses(n.parse()?),
            (None, None) => LimitPolicy::All,
        };

        // 创建配置
        let config = Config::new()
            .with_data_dir(data_dir)
            .with_offset(offset)
            .with_limit(limit)
            .with_period(period);
        config.validate()?;

        // Create scrapers
        let catalog_source = match matches.value_of("catalog-url") {
            Some(url) => NasdaqCatalogScraper::with_url(url)?,
            None => NasdaqCatalogScraper::new()?,
        };
        let price_source = YahooPriceScraper::new()?;

        // 创建下载与整理服务
        let download_service = DownloadService::new(
            config.clone(),
            Arc::new(catalog_source),
            Arc::new(price_source),
        );
        let organize_service = OrganizeService::new(config);

        let catalog = download_service.load_catalog().await?;
        info!("Total number of tradable symbols = {}", catalog.len());

        let outcome = download_service.download_all(&catalog).await?;
        info!(
            "Total number of valid symbols downloaded = {}",
            outcome.succeeded()
        );

        organize_service.organize(&catalog, &outcome)?;
    } else if let Some(matches) = matches.subcommand_matches("enrich") {
        let data_dir = matches.value_of("data-dir").unwrap();
        let config = Config::new().with_data_dir(data_dir);
        let stats_service = StatsService::new(config);

        let stats = match matches.value_of("dir") {
            Some(dir) => stats_service.enrich_dir(Path::new(dir))?,
            None => stats_service.enrich_all()?,
        };

        info!(
            "Enrichment complete: {} files processed, {} failed",
            stats.processed, stats.failed
        );
    } else if let Some(matches) = matches.subcommand_matches("explore") {
        let data_dir = matches.value_of("data-dir").unwrap();
        let from_year = matches.value_of("from-year").unwrap().parse::<i32>()?;
        let to_year = matches.value_of("to-year").unwrap().parse::<i32>()?;
        let limit = matches.value_of("limit").unwrap().parse::<usize>()?;

        let provider = PriceDataProvider::open(Path::new(data_dir))?;

        if let Some(symbol) = matches.value_of("symbol") {
            let bars = provider.load_series_between(symbol, from_year, to_year)?;

            info!("Symbol: {} ({} records)", symbol, bars.len());
            info!("{:-<100}", "");
            info!(
                "{:<12} {:<10} {:<10} {:<10} {:<10} {:<12} {:<12} {:<12} {:<12}",
                "Date", "Open", "High", "Low", "Close", "Volume", "Return%", "MonthMean", "MonthVol"
            );
            info!("{:-<100}", "");

            for bar in bars.iter().take(limit) {
                info!(
                    "{:<12} {:<10.2} {:<10.2} {:<10.2} {:<10.2} {:<12} {:<12} {:<12} {:<12}",
                    bar.date.to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume,
                    fmt_opt(bar.daily_return),
                    fmt_opt(bar.monthly_mean_return),
                    fmt_opt(bar.monthly_volatility)
                );
            }

            if bars.len() > limit {
                info!("... and {} more records", bars.len() - limit);
            } else if bars.is_empty() {
                info!("No records available in the selected year range");
            }
        } else {
            // 未指定标的时显示存储布局概览
            for kind in [InstrumentKind::Etf, InstrumentKind::Stock] {
                let symbols = provider.symbols(kind);
                info!("{}: {} symbols", kind.dir_name(), symbols.len());
                for symbol in symbols.iter().take(limit) {
                    info!("  {}", symbol);
                }
                if symbols.len() > limit {
                    info!("  ... and {} more", symbols.len() - limit);
                }
            }
        }
    } else {
        info!("No command specified. Use --help for usage information.");
    }

    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => "-".to_string(),
    }
}
