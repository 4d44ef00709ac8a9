//! 環境ファイルの解決と ProvisionConfig の構築
//!
//! 環境ファイルは以下の優先順位で検索される:
//! 1. 明示的に指定されたパス
//! 2. カレントディレクトリの .env
//! 3. カレントディレクトリの .env.example
//!
//! 読み込んだ値にデフォルトを適用し、以降のステップへは不変の
//! ProvisionConfig として引き渡す。プロセス環境変数は変更しない。

use crate::envfile::EnvRecord;
use crate::error::{CoreError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// デフォルトの環境ファイル名
pub const DEFAULT_ENV_FILE: &str = ".env";
/// サンプル環境ファイル名（.env が無い場合のフォールバック)
pub const EXAMPLE_ENV_FILE: &str = ".env.example";

/// n8n のデフォルトポート
pub const DEFAULT_PORT: u16 = 5678;
/// デフォルトのイメージタグ
pub const DEFAULT_IMAGE_TAG: &str = "latest";
/// Redis パスワードのプレースホルダ（変更されていなければ警告を出す）
pub const INSECURE_REDIS_PASSWORD: &str = "changeme-flowhaven-insecure";

/// 環境ファイルを優先順位に従って解決する
///
/// 候補のうち最初に存在したパスを返す。どれも存在しなければエラー。
/// ファイルシステムに対しては読み取りのみ。
pub fn resolve_env_source(explicit: Option<&Path>, base_dir: &Path) -> Result<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    if let Some(path) = explicit {
        candidates.push(path.to_path_buf());
    }
    candidates.push(base_dir.join(DEFAULT_ENV_FILE));
    candidates.push(base_dir.join(EXAMPLE_ENV_FILE));

    for candidate in &candidates {
        if candidate.is_file() {
            debug!(source = %candidate.display(), "環境ファイルを解決");
            return Ok(candidate.clone());
        }
    }

    Err(CoreError::EnvSourceNotFound {
        candidates: candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// TLS の実行計画
///
/// ENABLE_TLS が指定されていても DOMAIN / SSL_EMAIL が不足していれば
/// Downgraded に落とし、実行全体は継続させる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TlsPlan {
    /// 証明書を取得する
    Enabled { domain: String, email: String },
    /// フラグが無効
    Disabled,
    /// 要求されたが設定不足のためスキップ
    Downgraded { reason: String },
}

/// 解決済みのプロビジョニング設定
///
/// デフォルトは構築時に一度だけ適用され、以降は不変。
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionConfig {
    /// 解決された環境ファイルのパス
    pub source: PathBuf,
    /// サービスポート (N8N_PORT)
    pub port: u16,
    /// イメージタグ (N8N_IMAGE_TAG)
    pub image_tag: String,
    /// 公開ドメイン (DOMAIN)。未設定なら None
    pub domain: Option<String>,
    /// TLS 有効化フラグ (ENABLE_TLS)
    pub enable_tls: bool,
    /// 証明書通知用メールアドレス (SSL_EMAIL)
    pub ssl_email: Option<String>,
    /// Webhook ベースURL (WEBHOOK_URL)
    pub webhook_url: String,
    /// キュー構成 (QUEUE_MODE)。Redis バックエンドを追加する
    pub queue_mode: bool,
    /// Redis パスワード (REDIS_PASSWORD)。queue_mode のときのみ使用
    pub redis_password: Option<String>,
}

impl ProvisionConfig {
    /// 環境ファイルを解決して設定を構築する
    pub fn load(explicit: Option<&Path>, base_dir: &Path) -> Result<Self> {
        let source = resolve_env_source(explicit, base_dir)?;
        let record = EnvRecord::load(&source)?;
        Self::from_record(&record, source)
    }

    /// パース済みレコードから設定を構築する
    pub fn from_record(record: &EnvRecord, source: PathBuf) -> Result<Self> {
        let port = match record.get("N8N_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| {
                CoreError::InvalidConfig(format!("N8N_PORT が不正です: {}", raw))
            })?,
            None => DEFAULT_PORT,
        };

        let image_tag = record
            .get("N8N_IMAGE_TAG")
            .filter(|tag| !tag.is_empty())
            .unwrap_or(DEFAULT_IMAGE_TAG)
            .to_string();

        let domain = record
            .get("DOMAIN")
            .filter(|d| !d.is_empty())
            .map(String::from);

        let enable_tls = parse_bool("ENABLE_TLS", record.get("ENABLE_TLS"))?;
        let queue_mode = parse_bool("QUEUE_MODE", record.get("QUEUE_MODE"))?;

        let ssl_email = record
            .get("SSL_EMAIL")
            .filter(|e| !e.is_empty())
            .map(String::from);

        let webhook_url = record
            .get("WEBHOOK_URL")
            .filter(|u| !u.is_empty())
            .map(String::from)
            .unwrap_or_else(|| format!("http://localhost:{}/", port));

        let redis_password = queue_mode.then(|| {
            record
                .get("REDIS_PASSWORD")
                .filter(|p| !p.is_empty())
                .unwrap_or(INSECURE_REDIS_PASSWORD)
                .to_string()
        });

        Ok(Self {
            source,
            port,
            image_tag,
            domain,
            enable_tls,
            ssl_email,
            webhook_url,
            queue_mode,
            redis_password,
        })
    }

    /// TLS の実行計画を判定する
    pub fn tls_plan(&self) -> TlsPlan {
        if !self.enable_tls {
            return TlsPlan::Disabled;
        }
        match (&self.domain, &self.ssl_email) {
            (Some(domain), Some(email)) => TlsPlan::Enabled {
                domain: domain.clone(),
                email: email.clone(),
            },
            (None, _) => TlsPlan::Downgraded {
                reason: "DOMAIN が未設定".to_string(),
            },
            (_, None) => TlsPlan::Downgraded {
                reason: "SSL_EMAIL が未設定".to_string(),
            },
        }
    }

    /// マージ時に必ず存在させるキーとその解決値
    pub fn required_env_keys(&self) -> Vec<(&'static str, String)> {
        let mut keys = vec![
            ("N8N_PORT", self.port.to_string()),
            ("N8N_IMAGE_TAG", self.image_tag.clone()),
            ("WEBHOOK_URL", self.webhook_url.clone()),
        ];
        if let Some(ref password) = self.redis_password {
            keys.push(("REDIS_PASSWORD", password.clone()));
        }
        keys
    }

    /// Redis パスワードがプレースホルダのままか
    pub fn redis_password_is_insecure(&self) -> bool {
        self.redis_password.as_deref() == Some(INSECURE_REDIS_PASSWORD)
    }
}

/// 真偽値のパース（未設定は false）
fn parse_bool(key: &str, raw: Option<&str>) -> Result<bool> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(CoreError::InvalidConfig(format!(
            "{} は true/false で指定してください: {}",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config_from(content: &str) -> ProvisionConfig {
        let record = EnvRecord::parse(content);
        ProvisionConfig::from_record(&record, PathBuf::from(".env")).unwrap()
    }

    #[test]
    fn test_resolve_explicit_path_first() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("custom.env");
        fs::write(&explicit, "N8N_PORT=5678").unwrap();
        fs::write(dir.path().join(".env"), "N8N_PORT=9999").unwrap();

        let resolved = resolve_env_source(Some(&explicit), dir.path()).unwrap();
        assert_eq!(resolved, explicit);
    }

    #[test]
    fn test_resolve_falls_back_to_example() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(EXAMPLE_ENV_FILE), "").unwrap();

        let resolved = resolve_env_source(None, dir.path()).unwrap();
        assert_eq!(resolved, dir.path().join(EXAMPLE_ENV_FILE));
    }

    #[test]
    fn test_resolve_prefers_env_over_example() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DEFAULT_ENV_FILE), "").unwrap();
        fs::write(dir.path().join(EXAMPLE_ENV_FILE), "").unwrap();

        let resolved = resolve_env_source(None, dir.path()).unwrap();
        assert_eq!(resolved, dir.path().join(DEFAULT_ENV_FILE));
    }

    #[test]
    fn test_resolve_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = resolve_env_source(None, dir.path());
        assert!(matches!(result, Err(CoreError::EnvSourceNotFound { .. })));
    }

    #[test]
    fn test_defaults_applied() {
        let config = config_from("");
        assert_eq!(config.port, 5678);
        assert_eq!(config.image_tag, "latest");
        assert_eq!(config.domain, None);
        assert!(!config.enable_tls);
        assert!(!config.queue_mode);
        assert_eq!(config.webhook_url, "http://localhost:5678/");
        assert_eq!(config.redis_password, None);
    }

    #[test]
    fn test_user_values_win() {
        let config = config_from(
            "N8N_PORT=8080\nN8N_IMAGE_TAG=1.64.0\nDOMAIN=n8n.example.com\nWEBHOOK_URL=https://n8n.example.com/\n",
        );
        assert_eq!(config.port, 8080);
        assert_eq!(config.image_tag, "1.64.0");
        assert_eq!(config.domain.as_deref(), Some("n8n.example.com"));
        assert_eq!(config.webhook_url, "https://n8n.example.com/");
    }

    #[test]
    fn test_webhook_default_follows_port() {
        let config = config_from("N8N_PORT=8080");
        assert_eq!(config.webhook_url, "http://localhost:8080/");
    }

    #[test]
    fn test_invalid_port_is_error() {
        let record = EnvRecord::parse("N8N_PORT=http");
        let result = ProvisionConfig::from_record(&record, PathBuf::from(".env"));
        assert!(matches!(result, Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_bool_is_error() {
        let record = EnvRecord::parse("ENABLE_TLS=maybe");
        let result = ProvisionConfig::from_record(&record, PathBuf::from(".env"));
        assert!(matches!(result, Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn test_tls_plan_disabled() {
        let config = config_from("DOMAIN=n8n.example.com\nSSL_EMAIL=ops@example.com\n");
        assert_eq!(config.tls_plan(), TlsPlan::Disabled);
    }

    #[test]
    fn test_tls_plan_enabled() {
        let config =
            config_from("ENABLE_TLS=true\nDOMAIN=n8n.example.com\nSSL_EMAIL=ops@example.com\n");
        assert_eq!(
            config.tls_plan(),
            TlsPlan::Enabled {
                domain: "n8n.example.com".to_string(),
                email: "ops@example.com".to_string(),
            }
        );
    }

    #[test]
    fn test_tls_plan_downgraded_without_domain() {
        let config = config_from("ENABLE_TLS=true\nSSL_EMAIL=ops@example.com\n");
        assert!(matches!(config.tls_plan(), TlsPlan::Downgraded { .. }));
    }

    #[test]
    fn test_tls_plan_downgraded_without_email() {
        let config = config_from("ENABLE_TLS=true\nDOMAIN=n8n.example.com\n");
        assert!(matches!(config.tls_plan(), TlsPlan::Downgraded { .. }));
    }

    #[test]
    fn test_queue_mode_brings_redis_password_default() {
        let config = config_from("QUEUE_MODE=true");
        assert_eq!(
            config.redis_password.as_deref(),
            Some(INSECURE_REDIS_PASSWORD)
        );
        assert!(config.redis_password_is_insecure());

        let keys = config.required_env_keys();
        assert!(keys.iter().any(|(k, _)| *k == "REDIS_PASSWORD"));
    }

    #[test]
    fn test_user_redis_password_not_flagged() {
        let config = config_from("QUEUE_MODE=true\nREDIS_PASSWORD=s3cret-enough\n");
        assert!(!config.redis_password_is_insecure());
    }

    #[test]
    fn test_required_keys_without_queue_mode() {
        let config = config_from("");
        let keys: Vec<&str> = config.required_env_keys().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["N8N_PORT", "N8N_IMAGE_TAG", "WEBHOOK_URL"]);
    }
}
