// ==========================================
// 公寓运营后台 - 批量导入 API
// ==========================================
// 职责: 封装导入会话的完整流程，供 CLI / 宿主应用调用
// - preview: 解码 + 校验（不写入）
// - import_file: 解码 + 校验 + 闸门 + 逐行导入
// - template: 导出模板
// - 目录维护: add_catalog_entry / list_catalog
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportSettings};
use crate::domain::{CatalogEntry, ImportOutcome, RowValidation, ValidationSummary};
use crate::importer::{
    generate_template, CancelFlag, Delimiter, ImportProfile, ImportSession, ProgressSink,
};
use crate::repository::SqliteEntityStore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// 校验预览响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResponse {
    /// 会话ID（仅用于日志追溯）
    pub session_id: String,
    /// 实体类型
    pub entity: String,
    /// 汇总统计
    pub summary: ValidationSummary,
    /// 含错误或警告的行（按行序）
    pub issues: Vec<RowValidation>,
    /// 是否允许导入
    pub importable: bool,
}

/// 导入响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportFileResponse {
    pub session_id: String,
    pub entity: String,
    pub summary: ValidationSummary,
    pub outcome: ImportOutcome,
}

/// 导入API
pub struct ImportApi {
    db_path: String,
    // 优先于 config_kv 中的 ui_locale（进程级生效）
    locale_override: Option<String>,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(db_path: String) -> Self {
        Self {
            db_path,
            locale_override: None,
        }
    }

    pub fn with_locale(mut self, locale: Option<String>) -> Self {
        self.locale_override = locale;
        self
    }

    /// 读取导入配置并应用界面语言
    ///
    /// 注意: rust-i18n 的语言为进程级全局状态。同一进程内多个 ImportApi
    /// 使用不同语言并发调用时，消息语言以最后一次切换为准；
    /// 需要多语言并存的宿主应固定一种语言（with_locale）。
    pub async fn load_settings(&self) -> ApiResult<ImportSettings> {
        let manager = ConfigManager::new(&self.db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        let mut settings = ImportSettings::load(&manager).await?;
        if let Some(locale) = &self.locale_override {
            settings.locale = locale.clone();
        }
        if crate::i18n::current_locale() != settings.locale {
            debug!(locale = %settings.locale, "切换进程级界面语言");
            crate::i18n::set_locale(&settings.locale);
        }
        Ok(settings)
    }

    fn profile(entity: &str) -> ApiResult<ImportProfile> {
        ImportProfile::by_name(entity).ok_or_else(|| {
            ApiError::InvalidInput(format!(
                "未知的导入类型: {}（可选: {}）",
                entity,
                ImportProfile::names().join(", ")
            ))
        })
    }

    fn open_store(&self, profile: &ImportProfile) -> ApiResult<SqliteEntityStore> {
        Ok(SqliteEntityStore::new(&self.db_path)?.with_profile(profile))
    }

    /// 解码并校验，返回已校验的会话
    async fn validated_session(
        &self,
        entity: &str,
        file_path: &str,
    ) -> ApiResult<(ImportSession, SqliteEntityStore)> {
        let profile = Self::profile(entity)?;
        let store = self.open_store(&profile)?;
        let settings = self.load_settings().await?;

        let mut session = ImportSession::new(profile, settings);
        session.load_file(Path::new(file_path))?;
        session.validate(&store).await?;
        Ok((session, store))
    }

    /// 校验预览（不写入任何实体）
    ///
    /// # 返回
    /// - Ok(PreviewResponse): 汇总统计 + 问题行
    /// - Err(ApiError): 文件/解码/目录加载失败
    pub async fn preview(&self, entity: &str, file_path: &str) -> ApiResult<PreviewResponse> {
        let (session, _store) = self.validated_session(entity, file_path).await?;

        Ok(PreviewResponse {
            session_id: session.id().to_string(),
            entity: session.profile().entity.clone(),
            summary: session.summary(),
            issues: session
                .validation_results()
                .iter()
                .filter(|r| !r.errors.is_empty() || !r.warnings.is_empty())
                .cloned()
                .collect(),
            importable: session.can_import(),
        })
    }

    /// 导入文件
    ///
    /// # 参数
    /// - sink: 每行处理后的进度通知
    /// - cancel: 可选的协作式取消标志
    ///
    /// # 返回
    /// - Err(ApiError::ImportBlocked): 存在校验错误，未写入任何实体
    pub async fn import_file(
        &self,
        entity: &str,
        file_path: &str,
        sink: &dyn ProgressSink,
        cancel: Option<CancelFlag>,
    ) -> ApiResult<ImportFileResponse> {
        let (mut session, store) = self.validated_session(entity, file_path).await?;
        let summary = session.summary();

        let outcome = session.import(&store, sink, cancel).await?;
        info!(
            session_id = %session.id(),
            file_path = file_path,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "文件导入完成"
        );

        Ok(ImportFileResponse {
            session_id: session.id().to_string(),
            entity: session.profile().entity.clone(),
            summary,
            outcome,
        })
    }

    /// 导出模板文本
    ///
    /// delimiter 为 None 或 Auto 时使用逗号
    pub fn template(&self, entity: &str, delimiter: Option<Delimiter>) -> ApiResult<String> {
        let profile = Self::profile(entity)?;
        let delimiter = match delimiter {
            Some(Delimiter::Fixed(d)) => d,
            _ => b',',
        };
        Ok(generate_template(&profile, delimiter)?)
    }

    /// 新增引用目录条目
    pub fn add_catalog_entry(&self, kind: &str, name: &str) -> ApiResult<CatalogEntry> {
        let store = SqliteEntityStore::new(&self.db_path)?;
        Ok(store.add_reference_entity(kind, name)?)
    }

    /// 查询引用目录
    pub fn list_catalog(&self, kind: &str) -> ApiResult<Vec<CatalogEntry>> {
        let store = SqliteEntityStore::new(&self.db_path)?;
        Ok(store.list_reference_entities(kind)?)
    }
}
