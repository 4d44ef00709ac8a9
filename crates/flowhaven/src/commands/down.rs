//! down コマンド: スタックを停止する
//!
//! ブートユニットの ExecStop と同じ `docker compose down` を実行する。
//! データボリュームには触れない。

use colored::Colorize;
use flowhaven_host::compose::Compose;
use flowhaven_host::paths::HostPaths;
use flowhaven_host::runner::SystemRunner;

pub async fn handle() -> anyhow::Result<()> {
    super::ensure_root()?;

    let paths = HostPaths::system();
    if !paths.compose_file().is_file() {
        anyhow::bail!(
            "デプロイディレクトリが初期化されていません: {}\nヒント: まず haven up を実行してください",
            paths.deploy_dir.display()
        );
    }

    println!("{}", "n8n スタックを停止中...".yellow().bold());

    let runner = SystemRunner;
    Compose::new(&runner, &paths.deploy_dir).down().await?;

    println!("{}", "✓ スタックを停止しました".green().bold());
    println!(
        "{}",
        "  データボリュームは保持されています。haven up で再開できます".dimmed()
    );

    Ok(())
}
