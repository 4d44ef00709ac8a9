//! 環境ファイル（KEY=value 形式）の読み書き
//!
//! 行単位の KEY=value をパースし、コメント・空行・ユーザー定義を
//! 元の表記のまま保持する。不足しているキーだけを補う構造化マージを
//! 提供し、同じキーが重複して定義されることを防ぐ。

use crate::error::{CoreError, Result};
use std::fmt;
use std::path::Path;

/// パース済みの環境ファイル
///
/// 各行は元の表記（クォートや空白を含む）のまま再シリアライズされる。
/// 同名キーが複数行ある場合、値の参照は最後の定義が勝つ
/// （シェルの source と同じ挙動）。
#[derive(Debug, Clone, Default)]
pub struct EnvRecord {
    lines: Vec<EnvLine>,
}

#[derive(Debug, Clone)]
enum EnvLine {
    /// KEY=value 行。raw は元の行表記
    Pair {
        key: String,
        value: String,
        raw: String,
    },
    /// コメント・空行など、そのまま保持する行
    Other(String),
}

impl EnvRecord {
    /// 文字列からパース
    pub fn parse(content: &str) -> Self {
        let mut lines = Vec::new();

        for raw in content.lines() {
            let trimmed = raw.trim();

            // 空行とコメント行はそのまま保持
            if trimmed.is_empty() || trimmed.starts_with('#') {
                lines.push(EnvLine::Other(raw.to_string()));
                continue;
            }

            if let Some((key, value)) = trimmed.split_once('=') {
                let key = key.trim();
                let value = strip_quotes(value.trim());
                lines.push(EnvLine::Pair {
                    key: key.to_string(),
                    value: value.to_string(),
                    raw: raw.to_string(),
                });
            } else {
                // KEY=VALUE 形式でない行も失わない
                lines.push(EnvLine::Other(raw.to_string()));
            }
        }

        Self { lines }
    }

    /// ファイルから読み込み
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self::parse(&content))
    }

    /// キーの値を取得（最後の定義が勝つ）
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().rev().find_map(|line| match line {
            EnvLine::Pair { key: k, value, .. } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// キーが定義済みか
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// キーが未定義の場合のみ追記する
    ///
    /// 既に定義があればユーザーの値を尊重して何もしない。
    /// 追記した場合は true を返す。
    pub fn set_if_absent(&mut self, key: &str, value: &str) -> bool {
        if self.contains_key(key) {
            return false;
        }
        self.lines.push(EnvLine::Pair {
            key: key.to_string(),
            value: value.to_string(),
            raw: format!("{}={}", key, value),
        });
        true
    }

    /// 定義済みの (キー, 値) を定義順に列挙
    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            EnvLine::Pair { key, value, .. } => Some((key.as_str(), value.as_str())),
            EnvLine::Other(_) => None,
        })
    }

    /// キーの定義行数（重複検出用）
    pub fn definition_count(&self, key: &str) -> usize {
        self.lines
            .iter()
            .filter(|line| matches!(line, EnvLine::Pair { key: k, .. } if k == key))
            .count()
    }

    /// ファイルへ書き出し
    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_string()).map_err(|e| CoreError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

impl fmt::Display for EnvRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            match line {
                EnvLine::Pair { raw, .. } => writeln!(f, "{}", raw)?,
                EnvLine::Other(raw) => writeln!(f, "{}", raw)?,
            }
        }
        Ok(())
    }
}

/// クォートを除去（"value" や 'value' の場合）
fn strip_quotes(s: &str) -> &str {
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
