/// 服务器配置 - 所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/hall | 工作目录（数据库、日志） |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | LOG_LEVEL | info | 日志级别 |
/// | ENVIRONMENT | development | 运行环境 |
/// | AUTH_TOKENS | (empty) | `token:uid` 对，逗号分隔 |
/// | BOOTSTRAP_ADMIN_UID | (none) | 启动时授予 ADMIN 的 uid |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/hall HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库和日志文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 日志级别
    pub log_level: String,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 静态 bearer token -> uid 映射
    pub auth_tokens: Vec<(String, String)>,
    /// 启动时授予 ADMIN 角色的 uid（首次部署引导用）
    pub bootstrap_admin_uid: Option<String>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/hall".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            auth_tokens: std::env::var("AUTH_TOKENS")
                .map(|raw| parse_token_pairs(&raw))
                .unwrap_or_default(),
            bootstrap_admin_uid: std::env::var("BOOTSTRAP_ADMIN_UID").ok(),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Database file path under the work dir
    pub fn db_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.work_dir).join("hall.redb")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Parse `token:uid` pairs separated by commas; malformed entries are skipped
fn parse_token_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|pair| {
            let (token, uid) = pair.split_once(':')?;
            let (token, uid) = (token.trim(), uid.trim());
            if token.is_empty() || uid.is_empty() {
                return None;
            }
            Some((token.to_string(), uid.to_string()))
        })
        .collect()
}
