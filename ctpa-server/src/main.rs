//! CTPA报告分析主程序

mod pipeline;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ctpa_core::AppConfig;
use ctpa_web::{markup_to_dot, MarkupViewer, WebServer};
use tracing::{error, info};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "ctpa-server")]
#[command(about = "胸部CT放射报告筛选、上下文分析与标注浏览")]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 日志级别
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// 离线报告文件（JSON），覆盖配置中的数据库来源
    #[arg(short, long, global = true)]
    reports_file: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 读取并筛选报告，输出JSON
    Filter {
        /// 输出文件，缺省为标准输出
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// 筛选后分析印象段，输出分析结果JSON
    Analyze {
        /// 输出文件，缺省为标准输出
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 把每份报告的标注图写为 <序号>.dot
        #[arg(long)]
        dot_dir: Option<PathBuf>,
    },
    /// 筛选、分析后启动标注查看器
    Serve {
        /// 监听地址，覆盖配置
        #[arg(long)]
        host: Option<String>,

        /// 监听端口，覆盖配置
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志，输出到标准错误，标准输出留给结果JSON
    tracing_subscriber::fmt()
        .with_env_filter(&args.log_level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args).await {
        error!("运行失败: {:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(path) = args.reports_file {
        config.report.reports_file = Some(path);
    }

    let source = pipeline::report_source(&config);
    let filtered = pipeline::fetch_filtered(source.as_ref(), &config).await?;

    match args.command {
        Command::Filter { output } => {
            write_json(&filtered, output.as_ref()).await?;
        }
        Command::Analyze { output, dot_dir } => {
            let results = pipeline::analyze_filtered(&config, &filtered).await?;
            if let Some(dir) = dot_dir {
                tokio::fs::create_dir_all(&dir)
                    .await
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
                for (index, result) in results.iter().enumerate() {
                    let path = dir.join(format!("{}.dot", index));
                    tokio::fs::write(&path, markup_to_dot(&result.markup, &config.colors))
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                }
                info!("标注图已写入 {}", dir.display());
            }
            write_json(&results, output.as_ref()).await?;
        }
        Command::Serve { host, port } => {
            let results = pipeline::analyze_filtered(&config, &filtered).await?;
            let host = host.unwrap_or(config.web.host);
            let port = port.unwrap_or(config.web.port);
            let addr: SocketAddr = format!("{}:{}", host, port)
                .parse()
                .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

            info!("查看器配置:");
            info!("  报告数量: {}", results.len());
            info!("  监听地址: {}", addr);

            let viewer = MarkupViewer::new(results, config.colors);
            WebServer::new(addr, viewer).run().await?;
        }
    }

    Ok(())
}

async fn write_json<T: serde::Serialize + ?Sized>(value: &T, output: Option<&PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("结果已写入 {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
