pub mod down;
pub mod status;
pub mod up;
pub mod validate;

/// root 権限を要求する（パッケージ導入・サービス操作のため）
pub fn ensure_root() -> anyhow::Result<()> {
    if !nix::unistd::Uid::effective().is_root() {
        anyhow::bail!("root 権限が必要です。sudo で再実行してください");
    }
    Ok(())
}
