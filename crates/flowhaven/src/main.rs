mod commands;
mod steps;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "haven")]
#[command(about = "据えて、任せる。n8nサーバー構築は、一度のコマンドで。", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// ホストをプロビジョニングしてスタックを起動
    Up {
        /// 環境ファイルのパス（省略時は .env → .env.example の順で探索）
        #[arg(env = "HAVEN_ENV_FILE")]
        env_file: Option<PathBuf>,
        /// スキップするステップID（カンマ区切り。例: firewall,tls）
        #[arg(long)]
        skip: Option<String>,
    },
    /// スタックを停止（データボリュームは保持）
    Down,
    /// スタックの稼働状態を表示
    Status,
    /// 環境を解決して計画を表示（ホストには触れない）
    Validate {
        /// 環境ファイルのパス（省略時は .env → .env.example の順で探索）
        #[arg(env = "HAVEN_ENV_FILE")]
        env_file: Option<PathBuf>,
        /// JSON形式で出力
        #[arg(long)]
        json: bool,
    },
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログはstderrへ（進捗表示はstdout）
    tracing_subscriber::fmt::init();

    match cli.command {
        Commands::Up { env_file, skip } => {
            commands::up::handle(env_file, skip).await?;
        }
        Commands::Down => {
            commands::down::handle().await?;
        }
        Commands::Status => {
            commands::status::handle().await?;
        }
        Commands::Validate { env_file, json } => {
            commands::validate::handle(env_file, json).await?;
        }
        Commands::Version => {
            println!("flowhaven {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
