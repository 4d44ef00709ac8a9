//! プロキシ設定テンプレートの展開
//!
//! プレースホルダは {{DOMAIN}} と {{N8N_PORT}} の2つだけ。
//! それ以上のテンプレート機能は持たない（逐語置換のみ）。

use crate::error::{CoreError, Result};
use std::path::Path;

/// DOMAIN 未設定時に server_name へ入れるキャッチオールトークン
pub const CATCH_ALL_SERVER_NAME: &str = "_";

/// ドメインのプレースホルダ
pub const DOMAIN_PLACEHOLDER: &str = "{{DOMAIN}}";
/// アップストリームポートのプレースホルダ
pub const PORT_PLACEHOLDER: &str = "{{N8N_PORT}}";

/// サイト設定テンプレートを展開する
///
/// domain が None の場合は server_name にキャッチオール `_` を入れる。
/// 展開後にプレースホルダが残っていたらエラー（壊れた設定を
/// nginx に渡さないための保険はリロード前の `nginx -t` と二段構え）。
pub fn render_site(template: &str, domain: Option<&str>, port: u16) -> Result<String> {
    let server_name = domain.unwrap_or(CATCH_ALL_SERVER_NAME);

    let rendered = template
        .replace(DOMAIN_PLACEHOLDER, server_name)
        .replace(PORT_PLACEHOLDER, &port.to_string());

    if let Some(leftover) = find_placeholder(&rendered) {
        return Err(CoreError::UnresolvedPlaceholder(leftover.to_string()));
    }

    Ok(rendered)
}

/// ブート用ユニットのテンプレートを展開する
pub fn render_boot_unit(template: &str, deploy_dir: &Path) -> String {
    template.replace("{{DEPLOY_DIR}}", &deploy_dir.display().to_string())
}

/// 残存プレースホルダ（{{...}}）を検出する
fn find_placeholder(content: &str) -> Option<&str> {
    let start = content.find("{{")?;
    let rest = &content[start..];
    let end = rest.find("}}")?;
    Some(&rest[..end + 2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets;
    use std::path::PathBuf;

    #[test]
    fn test_render_site_substitutes_verbatim() {
        let rendered =
            render_site(assets::NGINX_SITE_TEMPLATE, Some("example.com"), 8080).unwrap();
        assert!(rendered.contains("example.com"));
        assert!(rendered.contains("8080"));
        assert!(!rendered.contains("{{DOMAIN}}"));
        assert!(!rendered.contains("{{N8N_PORT}}"));
    }

    #[test]
    fn test_render_site_catch_all_without_domain() {
        let rendered = render_site(assets::NGINX_SITE_TEMPLATE, None, 5678).unwrap();
        assert!(rendered.contains("server_name _;"));
        // 空の server_name にはならない
        assert!(!rendered.contains("server_name ;"));
    }

    #[test]
    fn test_render_site_rejects_unknown_placeholder() {
        let result = render_site("server_name {{UNKNOWN}};", Some("example.com"), 5678);
        assert!(matches!(result, Err(CoreError::UnresolvedPlaceholder(_))));
    }

    #[test]
    fn test_render_boot_unit() {
        let unit = render_boot_unit(assets::BOOT_UNIT_TEMPLATE, &PathBuf::from("/opt/n8n"));
        assert!(unit.contains("WorkingDirectory=/opt/n8n"));
        assert!(unit.contains("RemainAfterExit=yes"));
        assert!(!unit.contains("{{DEPLOY_DIR}}"));
    }
}
