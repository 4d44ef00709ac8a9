//! validate コマンド: 環境を解決して計画を表示する（ドライラン）
//!
//! ホストには一切触れない。環境ファイルの解決・デフォルト適用・
//! サイト設定の生成までを検証して結果を表示する。

use colored::Colorize;
use flowhaven_core::assets::NGINX_SITE_TEMPLATE;
use flowhaven_core::config::{ProvisionConfig, TlsPlan};
use flowhaven_core::template::render_site;
use std::path::PathBuf;

pub async fn handle(env_file: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let base_dir = std::env::current_dir()?;
    let config = ProvisionConfig::load(env_file.as_deref(), &base_dir)?;
    let tls_plan = config.tls_plan();

    // サイト設定が実際に生成できることを確認
    let rendered = render_site(NGINX_SITE_TEMPLATE, config.domain.as_deref(), config.port)?;

    if json {
        let report = serde_json::json!({
            "config": &config,
            "tls": &tls_plan,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "設定の検証結果:".bold());
    println!(
        "  環境ファイル: {}",
        config.source.display().to_string().cyan()
    );
    println!("  ポート: {}", config.port.to_string().cyan());
    println!("  イメージタグ: {}", config.image_tag.cyan());
    match &config.domain {
        Some(domain) => println!("  ドメイン: {}", domain.cyan()),
        None => println!("  ドメイン: {}", "未設定（キャッチオール配信）".dimmed()),
    }
    println!("  Webhook URL: {}", config.webhook_url.cyan());
    if config.queue_mode {
        println!("  プロファイル: {}", "queue（Redis バックエンド付き）".cyan());
    } else {
        println!("  プロファイル: {}", "single".cyan());
    }

    match &tls_plan {
        TlsPlan::Enabled { domain, email } => {
            println!("  TLS: {} ({} / {})", "有効".green(), domain, email);
        }
        TlsPlan::Disabled => println!("  TLS: {}", "無効".dimmed()),
        TlsPlan::Downgraded { reason } => {
            println!(
                "  TLS: {}",
                format!("スキップ（{}）。HTTP で配信されます", reason).yellow()
            );
        }
    }

    if config.redis_password_is_insecure() {
        println!(
            "{}",
            "  ⚠ REDIS_PASSWORD がプレースホルダのままです。必ず変更してください"
                .yellow()
                .bold()
        );
    }

    let server_name_line = rendered
        .lines()
        .find(|line| line.trim_start().starts_with("server_name"))
        .unwrap_or_default()
        .trim();
    println!();
    println!(
        "{}",
        format!("✓ プロキシ設定の生成に成功 ({})", server_name_line).green()
    );

    Ok(())
}
