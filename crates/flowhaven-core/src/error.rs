use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },

    #[error(
        "環境ファイルが見つかりません\n探索した候補: {candidates}\nヒント: .env または .env.example を配置するか、パスを引数で指定してください"
    )]
    EnvSourceNotFound { candidates: String },

    #[error("無効な設定: {0}")]
    InvalidConfig(String),

    #[error("テンプレート展開エラー: 未解決のプレースホルダ {0} が残っています")]
    UnresolvedPlaceholder(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
