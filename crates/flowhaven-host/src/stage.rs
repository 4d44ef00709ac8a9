//! Stack staging
//!
//! Materializes the deployment directory: compose definition (always
//! rewritten to the versioned copy), merged environment file, and data
//! volume directories (created once, never recreated).

use crate::error::Result;
use crate::paths::HostPaths;
use flowhaven_core::assets;
use flowhaven_core::config::ProvisionConfig;
use flowhaven_core::envfile::EnvRecord;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What the staging pass actually changed
#[derive(Debug, Clone, Default)]
pub struct StageReport {
    /// Keys appended to the merged environment file
    pub env_keys_added: Vec<&'static str>,
    /// Data directories created this run
    pub data_dirs_created: Vec<PathBuf>,
    /// Whether the environment source was copied into the deployment dir
    pub env_copied: bool,
}

/// Stack Stager: converge the deployment directory onto the current
/// compose definition and a merged environment file with every required
/// key defined exactly once. User-supplied values always win.
pub fn stage_stack(paths: &HostPaths, config: &ProvisionConfig) -> Result<StageReport> {
    let mut report = StageReport::default();

    std::fs::create_dir_all(&paths.deploy_dir)?;

    // compose 定義は常に同梱の最新版で上書き
    std::fs::write(
        paths.compose_file(),
        assets::compose_definition(config.queue_mode),
    )?;

    // 解決済みの環境ファイルを配置（既にそのファイル自身なら何もしない）
    let env_dest = paths.env_file();
    if !is_same_file(&config.source, &env_dest) {
        std::fs::copy(&config.source, &env_dest)?;
        report.env_copied = true;
    }

    // データディレクトリ。既存ボリュームには触れない
    for dir in paths.data_dirs(config.queue_mode) {
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
            report.data_dirs_created.push(dir);
        }
    }

    // 必須キーの構造化マージ（不足分のみ追記）
    let mut record = EnvRecord::load(&env_dest)?;
    for (key, value) in config.required_env_keys() {
        if record.set_if_absent(key, &value) {
            debug!(key, %value, "merged missing environment key");
            report.env_keys_added.push(key);
        }
    }
    if !report.env_keys_added.is_empty() {
        record.write(&env_dest)?;
    }

    Ok(report)
}

/// 同一ファイル判定（コピー元 == コピー先の自己コピー防止）
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
