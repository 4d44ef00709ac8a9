//! up コマンド: ホストを収束させる直列パイプライン
//!
//! Resolver → Preparer → Firewall → Stager → Deployer → Configurator
//! → Registrar → Summary の順で実行する。致命的エラーは即中断し、
//! 縮退可能なエラーは警告を出して該当機能だけを諦める。
//! 途中で失敗しても再実行すれば収束する。

use crate::steps::{ProvisionStep, StepLogger, parse_skip_steps};
use colored::Colorize;
use flowhaven_core::config::{ProvisionConfig, TlsPlan};
use flowhaven_host::certbot::Certbot;
use flowhaven_host::compose::{Compose, deploy_stack};
use flowhaven_host::firewall::{FirewallOutcome, adjust_firewall};
use flowhaven_host::paths::HostPaths;
use flowhaven_host::prepare::{Ensure, Preparer};
use flowhaven_host::proxy::configure_proxy;
use flowhaven_host::runner::{CommandRunner, SystemRunner};
use flowhaven_host::stage::stage_stack;
use flowhaven_host::systemd::register_boot_unit;
use std::path::PathBuf;

pub async fn handle(env_file: Option<PathBuf>, skip: Option<String>) -> anyhow::Result<()> {
    super::ensure_root()?;

    let base_dir = std::env::current_dir()?;
    let config = ProvisionConfig::load(env_file.as_deref(), &base_dir)?;
    tracing::debug!(source = %config.source.display(), "environment resolved");

    let paths = HostPaths::system();
    let runner = SystemRunner;

    run(&config, &runner, &paths, skip.as_deref()).await
}

/// パイプライン本体。runner と paths を差し替えられるよう分離してある
pub async fn run(
    config: &ProvisionConfig,
    runner: &dyn CommandRunner,
    paths: &HostPaths,
    skip: Option<&str>,
) -> anyhow::Result<()> {
    println!(
        "{}",
        "n8n スタックのプロビジョニングを開始します...".blue().bold()
    );
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
    if config.queue_mode {
        println!("  プロファイル: {}", "queue（Redis バックエンド付き）".cyan());
    }

    let tls_plan = config.tls_plan();
    if let TlsPlan::Downgraded { reason } = &tls_plan {
        println!(
            "{}",
            format!(
                "⚠ TLS が要求されましたが {} のため無効化し、HTTP で継続します",
                reason
            )
            .yellow()
        );
    }
    if config.redis_password_is_insecure() {
        println!(
            "{}",
            "⚠ REDIS_PASSWORD がプレースホルダのままです。必ず変更してください"
                .yellow()
                .bold()
        );
    }
    println!();

    let skip_steps = parse_skip_steps(skip);
    let mut logger = StepLogger::new();
    let preparer = Preparer::new(runner);

    for step in ProvisionStep::all_steps() {
        logger.start_step(step);

        if skip_steps.contains(&step) {
            logger.step_skipped("--skip 指定");
            continue;
        }

        match step {
            ProvisionStep::PreparePackages => {
                if let Err(e) = preparer.prepare_packages().await {
                    return fail(&mut logger, e);
                }
                logger.step_success(None);
            }
            ProvisionStep::InstallRuntime => match preparer.ensure_docker().await {
                Ok(Ensure::AlreadyPresent) => logger.step_skipped("Docker は既にインストール済み"),
                Ok(Ensure::Installed) => {
                    logger.step_success(Some("Docker をインストールしました"))
                }
                Err(e) => return fail(&mut logger, e),
            },
            ProvisionStep::InstallProxy => {
                let outcome = match preparer.ensure_nginx().await {
                    Ok(outcome) => outcome,
                    Err(e) => return fail(&mut logger, e),
                };
                if matches!(tls_plan, TlsPlan::Enabled { .. }) {
                    if let Err(e) = preparer.install_certbot().await {
                        return fail(&mut logger, e);
                    }
                    logger.log_detail("certbot と nginx プラグインを導入");
                }
                match outcome {
                    Ensure::AlreadyPresent => logger.step_skipped("nginx は既にインストール済み"),
                    Ensure::Installed => logger.step_success(Some("nginx をインストールしました")),
                }
            }
            ProvisionStep::AdjustFirewall => match adjust_firewall(runner).await {
                FirewallOutcome::RuleAdded => {
                    logger.step_success(Some("80/443 を許可しました"))
                }
                FirewallOutcome::NotPresent => logger.step_skipped("ufw が見つかりません"),
                FirewallOutcome::Inactive => {
                    logger.step_skipped("ファイアウォールは無効のまま（有効化はしない）")
                }
                FirewallOutcome::Failed(e) => {
                    logger.step_warned(&format!("ルール追加に失敗: {}", e))
                }
            },
            ProvisionStep::StageStack => match stage_stack(paths, config) {
                Ok(report) => {
                    for key in &report.env_keys_added {
                        logger.log_detail(&format!("{} を補完", key));
                    }
                    logger.step_success(None);
                }
                Err(e) => return fail(&mut logger, e),
            },
            ProvisionStep::DeployStack => {
                let compose = Compose::new(runner, &paths.deploy_dir);
                if let Err(e) = deploy_stack(&compose).await {
                    return fail(&mut logger, e);
                }
                logger.step_success(Some("スタックを起動しました"));
            }
            ProvisionStep::ConfigureProxy => {
                match configure_proxy(runner, paths, config).await {
                    Ok(report) => {
                        if report.removed_default_site {
                            logger.log_detail("デフォルトサイトを無効化");
                        }
                        logger.step_success(Some(&format!(
                            "server_name: {}",
                            report.server_name
                        )));
                    }
                    Err(e) => return fail(&mut logger, e),
                }
            }
            ProvisionStep::IssueCertificate => match &tls_plan {
                TlsPlan::Disabled => logger.step_skipped("ENABLE_TLS=false"),
                TlsPlan::Downgraded { reason } => {
                    logger.step_skipped(&format!("{}（HTTP で継続）", reason))
                }
                TlsPlan::Enabled { domain, email } => {
                    match Certbot::new(runner).issue_nginx(domain, email).await {
                        Ok(()) => logger.step_success(Some(
                            "証明書を取得し HTTPS リダイレクトを設定しました",
                        )),
                        Err(e) => logger.step_warned(&format!(
                            "証明書取得に失敗、HTTP のまま継続: {}",
                            e
                        )),
                    }
                }
            },
            ProvisionStep::RegisterBootUnit => match register_boot_unit(runner, paths).await {
                Ok(report) if report.started => {
                    logger.step_success(Some("ブートユニットを登録・起動しました"))
                }
                Ok(report) => logger.step_warned(&format!(
                    "即時起動に失敗（スタックは起動済み）: {}",
                    report.start_error.unwrap_or_default()
                )),
                Err(e) => return fail(&mut logger, e),
            },
        }
    }

    logger.print_summary();
    // 致命的エラーは途中で中断しているため、ここでは失敗ステップは無い
    debug_assert!(logger.all_success());

    let url = match (&tls_plan, &config.domain) {
        (TlsPlan::Enabled { domain, .. }, _) => format!("https://{}/", domain),
        (_, Some(domain)) => format!("http://{}/", domain),
        (_, None) => "http://<サーバーIP>/".to_string(),
    };
    println!();
    if logger.has_warnings() {
        println!(
            "{}",
            format!("✓ プロビジョニング完了（警告あり）: {}", url)
                .yellow()
                .bold()
        );
    } else {
        println!(
            "{}",
            format!("✓ プロビジョニング完了: {}", url).green().bold()
        );
    }

    Ok(())
}

/// 致命的エラー: 記録してサマリーを出し、即中断する
fn fail(logger: &mut StepLogger, error: impl std::fmt::Display) -> anyhow::Result<()> {
    let message = error.to_string();
    logger.step_failed(&message);
    logger.print_summary();
    Err(anyhow::anyhow!(message))
}
