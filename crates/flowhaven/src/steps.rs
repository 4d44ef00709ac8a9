//! プロビジョニングステップの定義とログ出力
//!
//! ホストを収束させる各ステップを冪等に実行する。
//! 各ステップの進捗・所要時間を記録し、最後にサマリーを出す。

use chrono::Local;
use colored::Colorize;
use std::time::{Duration, Instant};

/// プロビジョニングの各ステップ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
    /// パッケージインデックス更新と基本ツール導入
    PreparePackages,
    /// コンテナランタイム（Docker + compose plugin）導入
    InstallRuntime,
    /// リバースプロキシ（nginx）導入
    InstallProxy,
    /// ファイアウォール調整
    AdjustFirewall,
    /// デプロイディレクトリ準備
    StageStack,
    /// コンテナスタック起動
    DeployStack,
    /// プロキシサイト設定
    ConfigureProxy,
    /// TLS証明書取得
    IssueCertificate,
    /// 再起動時の自動起動登録
    RegisterBootUnit,
}

impl ProvisionStep {
    /// ステップの表示名
    pub fn name(&self) -> &'static str {
        match self {
            Self::PreparePackages => "パッケージ準備",
            Self::InstallRuntime => "コンテナランタイム導入",
            Self::InstallProxy => "リバースプロキシ導入",
            Self::AdjustFirewall => "ファイアウォール調整",
            Self::StageStack => "デプロイディレクトリ準備",
            Self::DeployStack => "スタック起動",
            Self::ConfigureProxy => "プロキシ設定",
            Self::IssueCertificate => "TLS証明書取得",
            Self::RegisterBootUnit => "自動起動登録",
        }
    }

    /// ステップのID（--skipで使用）
    pub fn id(&self) -> &'static str {
        match self {
            Self::PreparePackages => "packages",
            Self::InstallRuntime => "docker",
            Self::InstallProxy => "nginx",
            Self::AdjustFirewall => "firewall",
            Self::StageStack => "stage",
            Self::DeployStack => "deploy",
            Self::ConfigureProxy => "proxy",
            Self::IssueCertificate => "tls",
            Self::RegisterBootUnit => "persist",
        }
    }

    /// 実行順の全ステップ
    pub fn all_steps() -> Vec<Self> {
        vec![
            Self::PreparePackages,
            Self::InstallRuntime,
            Self::InstallProxy,
            Self::AdjustFirewall,
            Self::StageStack,
            Self::DeployStack,
            Self::ConfigureProxy,
            Self::IssueCertificate,
            Self::RegisterBootUnit,
        ]
    }
}

/// ステップの実行結果
#[derive(Debug, Clone)]
pub enum StepResult {
    /// 成功
    Success {
        duration: Duration,
        message: Option<String>,
    },
    /// スキップ（既に完了済み、または対象外）
    Skipped { reason: String },
    /// 警告付きで継続（機能は縮退、実行は継続）
    Warned { warning: String, duration: Duration },
    /// 失敗
    Failed { error: String, duration: Duration },
}

impl StepResult {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::Success { .. } | Self::Skipped { .. } | Self::Warned { .. }
        )
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::Success { duration, .. } => Some(*duration),
            Self::Warned { duration, .. } => Some(*duration),
            Self::Failed { duration, .. } => Some(*duration),
            Self::Skipped { .. } => None,
        }
    }
}

/// ステップログ出力器
pub struct StepLogger {
    start_time: Instant,
    step_results: Vec<(ProvisionStep, StepResult)>,
    current_step: Option<(ProvisionStep, Instant)>,
}

impl StepLogger {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            step_results: Vec::new(),
            current_step: None,
        }
    }

    /// ステップ開始をログ出力
    pub fn start_step(&mut self, step: ProvisionStep) {
        let timestamp = Local::now().format("%H:%M:%S").to_string();
        println!("[{}] {} {}", timestamp.dimmed(), "▶".cyan(), step.name());
        self.current_step = Some((step, Instant::now()));
    }

    /// ステップ成功をログ出力
    pub fn step_success(&mut self, message: Option<&str>) {
        if let Some((step, start)) = self.current_step.take() {
            let duration = start.elapsed();
            let timestamp = Local::now().format("%H:%M:%S").to_string();
            let duration_str = format_duration(duration);

            if let Some(msg) = message {
                println!(
                    "[{}] {} {} ({})",
                    timestamp.dimmed(),
                    "✓".green().bold(),
                    msg,
                    duration_str.dimmed()
                );
            } else {
                println!(
                    "[{}] {} {} 完了 ({})",
                    timestamp.dimmed(),
                    "✓".green().bold(),
                    step.name(),
                    duration_str.dimmed()
                );
            }

            self.step_results.push((
                step,
                StepResult::Success {
                    duration,
                    message: message.map(String::from),
                },
            ));
        }
    }

    /// ステップスキップをログ出力
    pub fn step_skipped(&mut self, reason: &str) {
        if let Some((step, _)) = self.current_step.take() {
            let timestamp = Local::now().format("%H:%M:%S").to_string();
            println!(
                "[{}] {} {} ({})",
                timestamp.dimmed(),
                "⏭".yellow(),
                step.name(),
                reason.dimmed()
            );

            self.step_results.push((
                step,
                StepResult::Skipped {
                    reason: reason.to_string(),
                },
            ));
        }
    }

    /// 警告付き継続をログ出力（機能縮退）
    pub fn step_warned(&mut self, warning: &str) {
        if let Some((step, start)) = self.current_step.take() {
            let duration = start.elapsed();
            let timestamp = Local::now().format("%H:%M:%S").to_string();
            println!(
                "[{}] {} {}: {}",
                timestamp.dimmed(),
                "⚠".yellow().bold(),
                step.name(),
                warning.yellow()
            );

            self.step_results.push((
                step,
                StepResult::Warned {
                    warning: warning.to_string(),
                    duration,
                },
            ));
        }
    }

    /// ステップ失敗をログ出力
    pub fn step_failed(&mut self, error: &str) {
        if let Some((step, start)) = self.current_step.take() {
            let duration = start.elapsed();
            let timestamp = Local::now().format("%H:%M:%S").to_string();

            println!(
                "[{}] {} {}: {}",
                timestamp.dimmed(),
                "✗".red().bold(),
                step.name(),
                error.red()
            );

            self.step_results.push((
                step,
                StepResult::Failed {
                    error: error.to_string(),
                    duration,
                },
            ));
        }
    }

    /// 詳細メッセージをログ出力
    pub fn log_detail(&self, message: &str) {
        let timestamp = Local::now().format("%H:%M:%S").to_string();
        println!("[{}]   → {}", timestamp.dimmed(), message.cyan());
    }

    /// サマリーを出力
    pub fn print_summary(&self) {
        let total_duration = self.start_time.elapsed();

        let warning_count = self
            .step_results
            .iter()
            .filter(|(_, result)| matches!(result, StepResult::Warned { .. }))
            .count();

        let error_count = self
            .step_results
            .iter()
            .filter(|(_, result)| matches!(result, StepResult::Failed { .. }))
            .count();

        let slowest_step = self
            .step_results
            .iter()
            .filter_map(|(step, result)| result.duration().map(|d| (step, d)))
            .max_by_key(|(_, d)| *d);

        println!();
        println!("{}", "═".repeat(44));
        println!("Provision Summary");
        println!("{}", "─".repeat(44));
        println!("Total time:    {}", format_duration(total_duration).green());

        if let Some((step, duration)) = slowest_step {
            println!(
                "Slowest step:  {} ({})",
                step.name(),
                format_duration(duration)
            );
        }

        if warning_count > 0 {
            println!("Warnings:      {}", warning_count.to_string().yellow());
        } else {
            println!("Warnings:      0");
        }

        if error_count > 0 {
            println!("Errors:        {}", error_count.to_string().red().bold());
        } else {
            println!("Errors:        {}", "0".green());
        }

        // 縮退・失敗したステップの内訳
        for (step, result) in &self.step_results {
            match result {
                StepResult::Warned { warning, .. } => {
                    println!("  {} {}: {}", "⚠".yellow(), step.name(), warning);
                }
                StepResult::Failed { error, .. } => {
                    println!("  {} {}: {}", "✗".red(), step.name(), error);
                }
                _ => {}
            }
        }
        println!("{}", "═".repeat(44));
    }

    /// 全ステップが成功したか（警告・スキップは成功扱い）
    pub fn all_success(&self) -> bool {
        self.step_results
            .iter()
            .all(|(_, result)| result.is_success())
    }

    /// 警告付きで完了したステップがあるか
    pub fn has_warnings(&self) -> bool {
        self.step_results
            .iter()
            .any(|(_, result)| matches!(result, StepResult::Warned { .. }))
    }
}

impl Default for StepLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Duration を読みやすい形式にフォーマット
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        let minutes = total_secs / 60;
        let secs = total_secs % 60;
        format!("{}m {}s", minutes, secs)
    } else if total_secs >= 1 {
        format!("{}.{}s", total_secs, millis / 100)
    } else {
        format!("{}ms", millis)
    }
}

/// スキップするステップを解析
pub fn parse_skip_steps(skip_arg: Option<&str>) -> Vec<ProvisionStep> {
    let Some(skip_str) = skip_arg else {
        return Vec::new();
    };

    skip_str
        .split(',')
        .filter_map(|s| {
            let s = s.trim();
            ProvisionStep::all_steps()
                .into_iter()
                .find(|step| step.id() == s)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
    }

    #[test]
    fn test_parse_skip_steps() {
        let steps = parse_skip_steps(Some("firewall,tls"));
        assert_eq!(steps.len(), 2);
        assert!(steps.contains(&ProvisionStep::AdjustFirewall));
        assert!(steps.contains(&ProvisionStep::IssueCertificate));
    }

    #[test]
    fn test_parse_skip_unknown_ids_ignored() {
        let steps = parse_skip_steps(Some("nonsense,docker"));
        assert_eq!(steps, vec![ProvisionStep::InstallRuntime]);
    }

    #[test]
    fn test_step_ids_are_unique() {
        let steps = ProvisionStep::all_steps();
        let mut ids: Vec<&str> = steps.iter().map(|s| s.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), steps.len());
    }

    #[test]
    fn test_warned_counts_as_success() {
        let result = StepResult::Warned {
            warning: "証明書取得に失敗".to_string(),
            duration: Duration::from_secs(1),
        };
        assert!(result.is_success());
    }

    #[test]
    fn test_logger_tracks_warnings() {
        let mut logger = StepLogger::new();
        logger.start_step(ProvisionStep::IssueCertificate);
        logger.step_warned("証明書取得に失敗");
        assert!(logger.has_warnings());
        assert!(logger.all_success());
    }
}
