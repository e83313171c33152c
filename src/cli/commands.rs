//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::cli::args::{Args, OutputFormat};
use crate::config::{parse_listen, resolve_config_path, Config, ConfigLoader, TomlConfigLoader};
use crate::error::{HealthposeError, Result};
use crate::health::{OverallStatus, Registry, ServiceReport};
use crate::logging::LoggingSystem;
use crate::web::WebServer;
use async_trait::async_trait;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令，返回进程退出码
    async fn execute(&self, args: &Args) -> Result<ExitCode>;
}

/// 查找并加载配置文件
pub async fn load_config(args: &Args) -> Result<Config> {
    let path = resolve_config_path(args.config.as_deref())?;
    info!("使用配置文件: {}", path.display());

    let loader = TomlConfigLoader::new(true);
    loader.load_from_file(&path).await
}

/// 服务命令
pub struct ServeCommand {
    /// 命令行指定的监听地址
    pub listen: Option<String>,
}

#[async_trait]
impl Command for ServeCommand {
    async fn execute(&self, args: &Args) -> Result<ExitCode> {
        let mut config = load_config(args).await?;
        if let Some(listen) = &self.listen {
            config.http.listen = listen.clone();
        }
        let addr = parse_listen(&config.http.listen)?;

        let registry = Arc::new(Registry::from_config(&config)?);
        info!(
            "已注册 {} 个服务: {}",
            registry.len(),
            registry.keys().collect::<Vec<_>>().join(", ")
        );

        WebServer::new(addr, registry)
            .run(shutdown_signal())
            .await?;

        Ok(ExitCode::SUCCESS)
    }
}

/// 等待 Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("监听退出信号失败: {}", e);
        return;
    }
    info!("收到退出信号，开始优雅关闭");
}

/// 单次检查命令
pub struct CheckCommand {
    /// 服务标识
    pub service: String,
    /// 输出格式
    pub format: OutputFormat,
}

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self, args: &Args) -> Result<ExitCode> {
        let config = load_config(args).await?;
        let registry = Registry::from_config(&config)?;

        let engine = registry.get(&self.service).ok_or_else(|| {
            HealthposeError::Other(anyhow::anyhow!(
                "未找到服务 \"{}\"，可用的服务: {}",
                self.service,
                registry.keys().collect::<Vec<_>>().join(", ")
            ))
        })?;

        let report = engine.run().await;
        LoggingSystem::report_log(&report);

        match self.format {
            OutputFormat::Json => println!("{}", report.to_json()?),
            OutputFormat::Text => print!("{}", render_text(&report)),
        }

        Ok(exit_code_for(report.status))
    }
}

/// 不可用时退出码为1
pub fn exit_code_for(status: OverallStatus) -> ExitCode {
    if status.is_available() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// 文本格式的检查报告
pub fn render_text(report: &ServiceReport) -> String {
    let mut out = format!(
        "服务: {} {}\n状态: {}\n",
        report.service, report.version, report.status
    );

    for outcome in &report.outcomes {
        let mark = if outcome.failed() { "✗" } else { "✓" };
        let optional = if outcome.skip_on_error { " [可跳过]" } else { "" };
        out.push_str(&format!(
            "  {} {} ({}ms){}",
            mark,
            outcome.name,
            outcome.duration.as_millis(),
            optional
        ));
        if let Some(error) = &outcome.error {
            out.push_str(&format!(": {error}"));
        }
        out.push('\n');
    }

    out
}

/// 验证命令
pub struct ValidateCommand {
    /// 是否显示详细信息
    pub verbose: bool,
}

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, args: &Args) -> Result<ExitCode> {
        let config = load_config(args).await?;
        parse_listen(&config.http.listen)?;
        let registry = Registry::from_config(&config)?;

        println!("✓ 配置文件验证通过");
        println!("✓ 监听地址: {}", config.http.listen);
        println!("✓ 找到 {} 个服务配置", registry.len());

        if self.verbose {
            for (key, engine) in registry.iter() {
                println!("  {} => {} {}", key, engine.name(), engine.version());
                for reg in engine.registrations() {
                    println!(
                        "     - {} [{}] 超时 {:?}{}",
                        reg.name,
                        reg.probe.kind(),
                        reg.timeout,
                        if reg.skip_on_error { " 可跳过" } else { "" }
                    );
                }
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}
