//! status コマンド: スタックの稼働状態を表示

use colored::Colorize;
use flowhaven_host::compose::Compose;
use flowhaven_host::paths::{HostPaths, UNIT_NAME};
use flowhaven_host::runner::SystemRunner;
use flowhaven_host::systemd::Systemctl;

pub async fn handle() -> anyhow::Result<()> {
    let paths = HostPaths::system();
    if !paths.compose_file().is_file() {
        anyhow::bail!(
            "デプロイディレクトリが初期化されていません: {}\nヒント: まず haven up を実行してください",
            paths.deploy_dir.display()
        );
    }

    let runner = SystemRunner;
    let services = Compose::new(&runner, &paths.deploy_dir).ps().await?;

    println!("{}", "n8n スタックの状態:".bold());
    if services.is_empty() {
        println!("  {}", "コンテナがありません".dimmed());
    } else {
        for service in &services {
            let state = service.state.as_deref().unwrap_or("unknown");
            let marker = if service.is_running() {
                "●".green()
            } else {
                "●".yellow()
            };
            let status = service.status.as_deref().unwrap_or("");
            println!(
                "  {} {} {} {}",
                marker,
                service.name.cyan(),
                state,
                status.dimmed()
            );
        }
    }

    let enabled = Systemctl::new(&runner).is_enabled(UNIT_NAME).await?;
    println!();
    if enabled {
        println!("  自動起動: {}", "有効".green());
    } else {
        println!("  自動起動: {}", "無効".yellow());
    }

    Ok(())
}
