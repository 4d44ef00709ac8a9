//! Built-in deployment assets for flowhaven
//!
//! These are materialized into the deployment directory (or the nginx /
//! systemd configuration locations) during provisioning. The compose
//! definitions are versioned alongside the workflow and always written
//! as-is; user-tunable values flow in through the merged `.env` file.

/// Compose definition, single-process profile
pub const COMPOSE_SINGLE: &str = r#"services:
  n8n:
    image: docker.n8n.io/n8nio/n8n:${N8N_IMAGE_TAG}
    restart: unless-stopped
    ports:
      - "127.0.0.1:${N8N_PORT}:5678"
    environment:
      - N8N_PORT=5678
      - N8N_PROXY_HOPS=1
      - WEBHOOK_URL=${WEBHOOK_URL}
    volumes:
      - ./n8n_data:/home/node/.n8n
"#;

/// Compose definition, queue profile (adds a Redis backend)
pub const COMPOSE_QUEUE: &str = r#"services:
  n8n:
    image: docker.n8n.io/n8nio/n8n:${N8N_IMAGE_TAG}
    restart: unless-stopped
    ports:
      - "127.0.0.1:${N8N_PORT}:5678"
    environment:
      - N8N_PORT=5678
      - N8N_PROXY_HOPS=1
      - WEBHOOK_URL=${WEBHOOK_URL}
      - EXECUTIONS_MODE=queue
      - QUEUE_BULL_REDIS_HOST=redis
      - QUEUE_BULL_REDIS_PASSWORD=${REDIS_PASSWORD}
    volumes:
      - ./n8n_data:/home/node/.n8n
    depends_on:
      - redis

  redis:
    image: redis:7-alpine
    restart: unless-stopped
    command: ["redis-server", "--requirepass", "${REDIS_PASSWORD}"]
    volumes:
      - ./redis_data:/data
"#;

/// nginx site template
///
/// Exactly two placeholders: {{DOMAIN}} and {{N8N_PORT}}. WebSocket
/// upgrade headers are required for the n8n editor UI.
pub const NGINX_SITE_TEMPLATE: &str = r#"server {
    listen 80;
    listen [::]:80;
    server_name {{DOMAIN}};

    location / {
        proxy_pass http://127.0.0.1:{{N8N_PORT}};
        proxy_http_version 1.1;
        proxy_set_header Upgrade $http_upgrade;
        proxy_set_header Connection "upgrade";
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;
        proxy_read_timeout 86400;
    }
}
"#;

/// systemd unit template
///
/// oneshot + RemainAfterExit: `docker compose up -d` は起動後すぐ
/// 終了するが、ユニットは active のまま維持される。
/// TimeoutStartSec=0 で初回の遅いイメージ取得にも耐える。
pub const BOOT_UNIT_TEMPLATE: &str = r#"[Unit]
Description=n8n workflow automation stack
Requires=docker.service
After=docker.service network-online.target
Wants=network-online.target

[Service]
Type=oneshot
RemainAfterExit=yes
TimeoutStartSec=0
WorkingDirectory={{DEPLOY_DIR}}
ExecStart=/usr/bin/docker compose up -d
ExecStop=/usr/bin/docker compose down

[Install]
WantedBy=multi-user.target
"#;

/// Sample environment file (the `.env.example` fallback source)
pub const ENV_EXAMPLE: &str = r#"# flowhaven 環境設定
# .env にコピーして値を調整してください

# サービスポート
N8N_PORT=5678

# n8n イメージタグ
N8N_IMAGE_TAG=latest

# 公開ドメイン（空なら未設定 = キャッチオール配信）
DOMAIN=

# TLS を有効化するか（DOMAIN と SSL_EMAIL が必要）
ENABLE_TLS=false

# Let's Encrypt 通知用メールアドレス
SSL_EMAIL=

# Webhook ベースURL（空なら http://localhost:<N8N_PORT>/）
WEBHOOK_URL=

# キュー構成（Redis バックエンドを追加）
QUEUE_MODE=false

# Redis パスワード。必ず変更すること
REDIS_PASSWORD=changeme-flowhaven-insecure
"#;

/// Select the compose definition for the deployment profile
pub fn compose_definition(queue_mode: bool) -> &'static str {
    if queue_mode { COMPOSE_QUEUE } else { COMPOSE_SINGLE }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_definition_selection() {
        assert!(compose_definition(false).contains("n8n:"));
        assert!(!compose_definition(false).contains("redis"));
        assert!(compose_definition(true).contains("redis:"));
        assert!(compose_definition(true).contains("EXECUTIONS_MODE=queue"));
    }

    #[test]
    fn test_site_template_has_exactly_two_placeholders() {
        let template = NGINX_SITE_TEMPLATE;
        assert_eq!(template.matches("{{DOMAIN}}").count(), 1);
        assert_eq!(template.matches("{{N8N_PORT}}").count(), 1);
        assert_eq!(template.matches("{{").count(), 2);
    }
}
