// ==========================================
// 公寓运营后台 - 导入会话状态机
// ==========================================
// 职责: 持有一次导入尝试的全部工作数据，并强制合法的状态转换
// 流程: Idle → Parsed → Validated → Importing → Completed
// 红线: 只能前进；唯一回退是 reset → Idle；Completed 后不可再导入
// ==========================================

use crate::config::ImportSettings;
use crate::domain::{
    CatalogSet, ImportOutcome, ProgressSnapshot, RawRow, RowImportError, RowValidation,
    SessionState, ValidationSummary,
};
use crate::importer::dq_validator::DqValidator;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{read_source_file, CsvDecoder};
use crate::importer::import_executor::{CancelFlag, ImportExecutor};
use crate::importer::import_trait::{
    CatalogSource, ProgressSink, RowCreator, RowValidator, TabularDecoder,
};
use crate::importer::profiles::ImportProfile;
use crate::importer::reference_resolver::ReferenceResolver;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ImportSession - 导入会话（聚合根）
// ==========================================
// 不变量: validation_results 为空，或与 rows 等长且按下标对齐
pub struct ImportSession {
    id: String,
    profile: ImportProfile,
    settings: ImportSettings,
    state: SessionState,
    rows: Vec<RawRow>,
    validation_results: Vec<RowValidation>,
    catalogs: Option<CatalogSet>,
    progress: ProgressSnapshot,
    import_errors: Vec<RowImportError>,
    outcome: Option<ImportOutcome>,
}

impl ImportSession {
    pub fn new(profile: ImportProfile, settings: ImportSettings) -> Self {
        let id = Uuid::new_v4().to_string();
        debug!(session_id = %id, entity = %profile.entity, "创建导入会话");
        Self {
            id,
            profile,
            settings,
            state: SessionState::Idle,
            rows: Vec::new(),
            validation_results: Vec::new(),
            catalogs: None,
            progress: ProgressSnapshot::default(),
            import_errors: Vec::new(),
            outcome: None,
        }
    }

    // ===== 状态转换 =====

    fn ensure_can_advance(&self, next: SessionState) -> ImportResult<()> {
        if self.state.can_advance_to(next) {
            Ok(())
        } else {
            Err(ImportError::InvalidStateTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            })
        }
    }

    fn advance(&mut self, next: SessionState) -> ImportResult<()> {
        self.ensure_can_advance(next)?;
        debug!(session_id = %self.id, from = %self.state, to = %next, "会话状态转换");
        self.state = next;
        Ok(())
    }

    /// 丢弃全部工作数据，回到 Idle（任何状态均可）
    pub fn reset(&mut self) {
        info!(session_id = %self.id, from = %self.state, "会话已重置");
        self.state = SessionState::Idle;
        self.rows.clear();
        self.validation_results.clear();
        self.catalogs = None;
        self.progress = ProgressSnapshot::default();
        self.import_errors.clear();
        self.outcome = None;
    }

    // ===== Idle → Parsed =====

    /// 解码原始文本
    ///
    /// # 返回
    /// - Ok(usize): 数据行数
    /// - Err: 解码失败或超过行数上限（会话保持 Idle）
    pub fn load_text(&mut self, raw_text: &str) -> ImportResult<usize> {
        self.ensure_can_advance(SessionState::Parsed)?;

        let rows = CsvDecoder::new(self.settings.delimiter)
            .decode(raw_text)
            .map_err(|e| {
                error!(session_id = %self.id, error = %e, "文件解码失败");
                ImportError::Decode(e)
            })?;

        if rows.len() > self.settings.max_rows {
            error!(
                session_id = %self.id,
                rows = rows.len(),
                limit = self.settings.max_rows,
                "数据行数超过上限"
            );
            return Err(ImportError::TooManyRows {
                limit: self.settings.max_rows,
                actual: rows.len(),
            });
        }

        self.rows = rows;
        self.advance(SessionState::Parsed)?;
        info!(session_id = %self.id, rows = self.rows.len(), "文件已解析");
        Ok(self.rows.len())
    }

    /// 读取并解码文件（扩展名守卫在解码前执行）
    pub fn load_file(&mut self, path: &Path) -> ImportResult<usize> {
        self.ensure_can_advance(SessionState::Parsed)?;
        let text = read_source_file(path, &self.settings.allowed_extensions)?;
        self.load_text(&text)
    }

    // ===== Parsed → Validated =====

    /// 加载引用目录后逐行校验
    ///
    /// 目录加载失败时会话保持 Parsed，错误直接返回调用方
    #[instrument(skip(self, source), fields(session_id = %self.id, entity = %self.profile.entity))]
    pub async fn validate(&mut self, source: &dyn CatalogSource) -> ImportResult<ValidationSummary> {
        self.ensure_can_advance(SessionState::Validated)?;
        let catalogs = ReferenceResolver::new(source)
            .load_for(&self.profile.rules)
            .await?;
        self.validate_with_catalogs(catalogs)
    }

    /// 使用已加载的目录快照校验
    pub fn validate_with_catalogs(&mut self, catalogs: CatalogSet) -> ImportResult<ValidationSummary> {
        self.ensure_can_advance(SessionState::Validated)?;

        let results = DqValidator.validate(&self.rows, &catalogs, &self.profile.rules);
        if results.len() != self.rows.len() {
            return Err(ImportError::InternalError(format!(
                "校验结果数量 {} 与行数 {} 不一致",
                results.len(),
                self.rows.len()
            )));
        }

        self.validation_results = results;
        self.catalogs = Some(catalogs);
        self.advance(SessionState::Validated)?;

        let summary = self.summary();
        info!(
            session_id = %self.id,
            total = summary.total_rows,
            importable = summary.importable_rows,
            error_rows = summary.error_rows,
            warnings = summary.warning_count,
            "校验完成"
        );
        Ok(summary)
    }

    // ===== Validated → Importing → Completed =====

    /// 导入闸门: 已校验且没有任何行含错误
    pub fn can_import(&self) -> bool {
        self.state == SessionState::Validated
            && self.validation_results.iter().all(RowValidation::is_importable)
    }

    /// 顺序导入全部行
    ///
    /// # 参数
    /// - creator: 行创建边界
    /// - sink: 每行处理后同步调用
    /// - cancel: 可选的协作式取消标志
    #[instrument(skip_all, fields(session_id = %self.id, entity = %self.profile.entity))]
    pub async fn import(
        &mut self,
        creator: &dyn RowCreator,
        sink: &dyn ProgressSink,
        cancel: Option<CancelFlag>,
    ) -> ImportResult<ImportOutcome> {
        self.ensure_can_advance(SessionState::Importing)?;

        let error_rows = self
            .validation_results
            .iter()
            .filter(|r| !r.is_importable())
            .count();
        if error_rows > 0 {
            warn!(session_id = %self.id, error_rows = error_rows, "存在校验错误，拒绝导入");
            return Err(ImportError::ImportBlocked { error_rows });
        }

        self.advance(SessionState::Importing)?;

        let mut executor =
            ImportExecutor::new(creator).with_log_interval(self.settings.progress_log_interval);
        if let Some(cancel) = cancel {
            executor = executor.with_cancel(cancel);
        }

        let empty = CatalogSet::new();
        let catalogs = self.catalogs.as_ref().unwrap_or(&empty);
        let outcome = executor
            .run(
                &self.rows,
                &self.validation_results,
                catalogs,
                &self.profile,
                sink,
            )
            .await;

        self.progress = ProgressSnapshot {
            processed: outcome.attempted(),
            succeeded: outcome.succeeded,
            failed: outcome.failed,
            total: self.rows.len() - outcome.skipped,
        };
        self.import_errors = outcome.errors.clone();
        self.outcome = Some(outcome.clone());
        self.advance(SessionState::Completed)?;

        Ok(outcome)
    }

    // ===== 查询 =====

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn profile(&self) -> &ImportProfile {
        &self.profile
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn validation_results(&self) -> &[RowValidation] {
        &self.validation_results
    }

    pub fn catalogs(&self) -> Option<&CatalogSet> {
        self.catalogs.as_ref()
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.progress
    }

    pub fn import_errors(&self) -> &[RowImportError] {
        &self.import_errors
    }

    pub fn outcome(&self) -> Option<&ImportOutcome> {
        self.outcome.as_ref()
    }

    pub fn summary(&self) -> ValidationSummary {
        ValidationSummary::from_results(&self.validation_results)
    }
}
