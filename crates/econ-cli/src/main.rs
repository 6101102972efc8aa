//! 경제 지표 대시보드 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 지표 목록 보기
//! econ catalog
//! econ catalog --category interest_rate
//!
//! # 실질 GDP 최근 5년 (레벨 + YoY)
//! econ query real_gdp --window 5y
//!
//! # 주간 해상도로 VIX 조회, JSON 출력
//! econ query vix --window 1y --resolution weekly --format json
//!
//! # 소비 지표 요약
//! econ dashboard --category consumption --window 2y
//! ```
//!
//! FRED 지표는 `FRED_API_KEY` 환경 변수(또는 `.env`)가 필요합니다.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use econ_cli::commands::{catalog, dashboard, query, OutputFormat};
use econ_core::{
    init_logging, AppConfig, Category, Credentials, Frequency, LogConfig, MetricCatalog, TimeWindow,
};
use econ_data::Dashboard;

#[derive(Parser)]
#[command(name = "econ")]
#[command(about = "Economic metrics dashboard CLI - FRED / Yahoo Finance 경제 지표 조회", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 경로 (TOML, 선택)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// 로그 레벨 (설정 파일보다 우선)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 지표 카탈로그 보기
    Catalog {
        /// 분류 필터 (consumption, supply, interest_rate, market)
        #[arg(long)]
        category: Option<String>,

        /// 출력 형식 (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// 단일 지표 조회 (레벨 + YoY 증감률)
    Query {
        /// 지표 ID (예: real_gdp, vix)
        metric: String,

        /// 조회 기간 (1y, 2y, 5y)
        #[arg(short, long, default_value = "1y")]
        window: String,

        /// 표시 주기 (daily, weekly, monthly, quarterly). 기본: 설정 또는 원본 주기
        #[arg(short, long)]
        resolution: Option<String>,

        /// 출력 형식 (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// 여러 지표 요약 (지표별 실패는 개별 보고)
    Dashboard {
        /// 분류 필터 (없으면 전체)
        #[arg(long)]
        category: Option<String>,

        /// 조회 기간 (1y, 2y, 5y)
        #[arg(short, long, default_value = "1y")]
        window: String,

        /// 출력 형식 (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env의 ECON__* 설정도 반영되도록 설정 로드 전에 읽음
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load(path).with_context(|| format!("Failed to load config: {}", path))?,
        None => AppConfig::from_env().context("Failed to load config from environment")?,
    };

    let mut log_config = LogConfig::from_settings(&config.logging);
    if let Some(level) = &cli.log_level {
        log_config.level = level.clone();
    }
    init_logging(log_config).map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    match cli.command {
        Commands::Catalog { category, format } => {
            let category = parse_category(category.as_deref())?;
            let format = OutputFormat::parse(&format)?;

            let metrics = MetricCatalog::standard();
            println!("{}", catalog::render_catalog(&metrics, category, format)?);
        }

        Commands::Query {
            metric,
            window,
            resolution,
            format,
        } => {
            let window = parse_window(&window)?;
            let resolution = resolution
                .map(|r| r.parse::<Frequency>().map_err(anyhow::Error::msg))
                .transpose()?;
            let format = OutputFormat::parse(&format)?;

            let board = build_dashboard(&config)?;
            match board.query_at(&metric, window, resolution).await {
                Ok(view) => println!("{}", query::render_view(&view, format)?),
                Err(e) => {
                    error!(metric = %metric, error = %e, "Query failed");
                    return Err(e.into());
                }
            }
        }

        Commands::Dashboard {
            category,
            window,
            format,
        } => {
            let category = parse_category(category.as_deref())?;
            let window = parse_window(&window)?;
            let format = OutputFormat::parse(&format)?;

            let board = build_dashboard(&config)?;
            let outcomes = match category {
                Some(category) => board.query_category(category, window).await,
                None => board.query_all(window).await,
            };

            println!("{}", dashboard::render_summary(&outcomes, format)?);
            info!(stats = ?board.cache_stats().await, "Cache statistics");
        }
    }

    Ok(())
}

fn build_dashboard(config: &AppConfig) -> Result<Dashboard> {
    let credentials = Credentials::from_env();
    Dashboard::from_config(config, &credentials).context("Failed to initialize dashboard")
}

fn parse_window(s: &str) -> Result<TimeWindow> {
    s.parse::<TimeWindow>().map_err(anyhow::Error::msg)
}

fn parse_category(s: Option<&str>) -> Result<Option<Category>> {
    s.map(|c| c.parse::<Category>().map_err(anyhow::Error::msg))
        .transpose()
}
