// ==========================================
// 公寓运营后台 - 配置管理器
// ==========================================
// 职责: 导入配置的加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// 口径: 值无法解析时记录 warn 并回退默认值
// ==========================================

use crate::config::import_config_trait::{ConfigResult, ImportConfigReader};
use crate::db::open_and_migrate;
use crate::importer::file_parser::Delimiter;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

/// 支持的界面语言
pub const SUPPORTED_LOCALES: &[&str] = &["en", "zh-CN"];

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_and_migrate(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;

        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 解析非负整数配置，失败时回退默认值
    fn get_usize_or_default(&self, key: &str, default: usize) -> ConfigResult<usize> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        Ok(value.trim().parse::<usize>().unwrap_or_else(|_| {
            tracing::warn!(config_key = key, raw_value = %value, "配置格式错误，使用默认值");
            default
        }))
    }
}

// ==========================================
// ImportConfigReader 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_delimiter(&self) -> ConfigResult<Delimiter> {
        let value = self.get_config_or_default(config_keys::DELIMITER, ",")?;
        Ok(Delimiter::parse(&value).unwrap_or_else(|| {
            tracing::warn!(
                config_key = config_keys::DELIMITER,
                raw_value = %value,
                "分隔符配置无法识别，使用逗号"
            );
            Delimiter::default()
        }))
    }

    async fn get_max_rows(&self) -> ConfigResult<usize> {
        let rows = self.get_usize_or_default(config_keys::MAX_ROWS, 5000)?;
        // 0 行上限没有意义，视为未配置
        Ok(if rows == 0 { 5000 } else { rows })
    }

    async fn get_allowed_extensions(&self) -> ConfigResult<Vec<String>> {
        let value = self.get_config_or_default(config_keys::ALLOWED_EXTENSIONS, "csv")?;
        let extensions: Vec<String> = value
            .split(',')
            .map(|e| e.trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        if extensions.is_empty() {
            tracing::warn!(
                config_key = config_keys::ALLOWED_EXTENSIONS,
                raw_value = %value,
                "扩展名配置为空，使用 csv"
            );
            return Ok(vec!["csv".to_string()]);
        }
        Ok(extensions)
    }

    async fn get_progress_log_interval(&self) -> ConfigResult<usize> {
        self.get_usize_or_default(config_keys::PROGRESS_LOG_INTERVAL, 25)
    }

    async fn get_locale(&self) -> ConfigResult<String> {
        let value = self.get_config_or_default(config_keys::LOCALE, "en")?;
        let locale = value.trim();
        match SUPPORTED_LOCALES.iter().find(|l| l.eq_ignore_ascii_case(locale)) {
            Some(l) => Ok(l.to_string()),
            None => {
                tracing::warn!(
                    config_key = config_keys::LOCALE,
                    raw_value = %value,
                    "不支持的语言，使用 en"
                );
                Ok("en".to_string())
            }
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 解码
    pub const DELIMITER: &str = "import_delimiter";
    pub const MAX_ROWS: &str = "import_max_rows";
    pub const ALLOWED_EXTENSIONS: &str = "import_allowed_extensions"; // 逗号分隔

    // 执行
    pub const PROGRESS_LOG_INTERVAL: &str = "import_progress_log_interval";

    // 界面
    pub const LOCALE: &str = "ui_locale";
}
