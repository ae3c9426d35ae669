// ==========================================
// 公寓运营后台 - 导入配置快照
// ==========================================
// 职责: 会话开始时读取一次配置，之后只读
// ==========================================

use crate::config::config_keys;
use crate::config::import_config_trait::ImportConfigReader;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::Delimiter;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSettings {
    #[serde(serialize_with = "serialize_delimiter")]
    pub delimiter: Delimiter,
    pub max_rows: usize,
    pub allowed_extensions: Vec<String>,
    pub progress_log_interval: usize,
    pub locale: String,
}

fn serialize_delimiter<S: serde::Serializer>(d: &Delimiter, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(d)
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::default(),
            max_rows: 5000,
            allowed_extensions: vec!["csv".to_string()],
            progress_log_interval: 25,
            locale: "en".to_string(),
        }
    }
}

fn config_error(key: &str, err: Box<dyn std::error::Error + Send + Sync>) -> ImportError {
    ImportError::ConfigReadError {
        key: key.to_string(),
        message: err.to_string(),
    }
}

impl ImportSettings {
    /// 从配置读取器加载完整快照
    pub async fn load(reader: &dyn ImportConfigReader) -> ImportResult<Self> {
        Ok(Self {
            delimiter: reader
                .get_delimiter()
                .await
                .map_err(|e| config_error(config_keys::DELIMITER, e))?,
            max_rows: reader
                .get_max_rows()
                .await
                .map_err(|e| config_error(config_keys::MAX_ROWS, e))?,
            allowed_extensions: reader
                .get_allowed_extensions()
                .await
                .map_err(|e| config_error(config_keys::ALLOWED_EXTENSIONS, e))?,
            progress_log_interval: reader
                .get_progress_log_interval()
                .await
                .map_err(|e| config_error(config_keys::PROGRESS_LOG_INTERVAL, e))?,
            locale: reader
                .get_locale()
                .await
                .map_err(|e| config_error(config_keys::LOCALE, e))?,
        })
    }
}
