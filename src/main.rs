//! Healthpose 主程序入口

use anyhow::{Context, Result};
use clap::Parser;
use healthpose::cli::{Args, CheckCommand, Command, Commands, ServeCommand, ValidateCommand};
use healthpose::logging::{LogConfig, LoggingSystem};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let log_config = LogConfig {
        level: args.log_level.clone().into(),
        console: args.log_file.is_none(),
        file_path: args.log_file.clone(),
        json_format: args.json_logs,
        ..Default::default()
    };
    let _logging_system = LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    info!("{} v{} 启动", healthpose::APP_NAME, healthpose::VERSION);

    match execute_command(&args).await {
        Ok(code) => Ok(code),
        Err(e) => {
            error!("命令执行失败: {:#}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// 执行CLI命令
async fn execute_command(args: &Args) -> Result<ExitCode> {
    let command: Box<dyn Command> = match args.command() {
        Commands::Serve { listen } => Box::new(ServeCommand { listen }),
        Commands::Check { service, format } => Box::new(CheckCommand { service, format }),
        Commands::Validate { verbose } => Box::new(ValidateCommand { verbose }),
    };

    let code = command.execute(args).await?;
    Ok(code)
}
