// ==========================================
// 公寓运营后台 - 导入执行器
// ==========================================
// 职责: 逐行调用 RowCreator，失败隔离，每行后推送进度
// 流程: 复核校验结果 → 映射载荷 → create → 记录成功/失败 → 进度通知
// 红线: 严格顺序执行；单行失败永不中断批次；不自动重试
// ==========================================

use crate::domain::{
    CatalogSet, CreatedEntity, ImportOutcome, ProgressSnapshot, RawRow, RowImportError,
    RowValidation,
};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::import_trait::{ProgressSink, RowCreator};
use crate::importer::profiles::ImportProfile;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// 默认每处理多少行输出一次进度日志
pub const DEFAULT_LOG_INTERVAL: usize = 25;

// ==========================================
// CancelFlag - 协作式取消标志
// ==========================================
// 仅在行与行之间检查；已发出的 create 调用不会被中止
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ==========================================
// ImportExecutor
// ==========================================
pub struct ImportExecutor<'a> {
    creator: &'a dyn RowCreator,
    mapper: FieldMapper,
    cancel: Option<CancelFlag>,
    log_interval: usize,
}

impl<'a> ImportExecutor<'a> {
    pub fn new(creator: &'a dyn RowCreator) -> Self {
        Self {
            creator,
            mapper: FieldMapper,
            cancel: None,
            log_interval: DEFAULT_LOG_INTERVAL,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// 0 表示关闭周期性进度日志
    pub fn with_log_interval(mut self, interval: usize) -> Self {
        self.log_interval = interval;
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }

    /// 执行导入
    ///
    /// # 参数
    /// - rows / validations: 按下标对齐
    /// - catalogs: 会话级目录快照（引用名称 → ID）
    /// - profile: 实体配置档（决定载荷结构与 entity 名称）
    /// - sink: 每行处理后同步调用
    ///
    /// # 返回
    /// - ImportOutcome: succeeded + failed == 实际尝试的行数
    pub async fn run(
        &self,
        rows: &[RawRow],
        validations: &[RowValidation],
        catalogs: &CatalogSet,
        profile: &ImportProfile,
        sink: &dyn ProgressSink,
    ) -> ImportOutcome {
        let started = Instant::now();
        let mut outcome = ImportOutcome::default();

        // 复核: 含错误或缺少校验结果的行一律跳过
        let importable: Vec<(&RawRow, &RowValidation)> = rows
            .iter()
            .enumerate()
            .filter_map(|(idx, row)| {
                validations
                    .get(idx)
                    .filter(|v| v.is_importable())
                    .map(|v| (row, v))
            })
            .collect();

        outcome.skipped = rows.len() - importable.len();
        if outcome.skipped > 0 {
            warn!(skipped = outcome.skipped, "存在未通过校验的行，执行器已跳过");
        }

        let mut progress = ProgressSnapshot::new(importable.len());
        info!(
            entity = %profile.entity,
            total = progress.total,
            "开始逐行导入"
        );

        for (row, validation) in importable {
            if self.is_cancelled() {
                outcome.cancelled = true;
                warn!(
                    processed = progress.processed,
                    total = progress.total,
                    "导入已被取消"
                );
                break;
            }

            let result = match self.mapper.to_payload(row, Some(validation), profile, catalogs) {
                Ok(payload) => self
                    .creator
                    .create(&profile.entity, &payload)
                    .await
                    .map_err(|e| e.message),
                Err(message) => Err(message),
            };

            match result {
                Ok(entity_id) => {
                    progress.record_success();
                    debug!(row_number = row.row_number, entity_id = %entity_id, "行导入成功");
                    outcome.created.push(CreatedEntity {
                        row_number: row.row_number,
                        entity_id,
                    });
                }
                Err(message) => {
                    progress.record_failure();
                    warn!(row_number = row.row_number, error = %message, "行导入失败");
                    outcome.errors.push(RowImportError {
                        row_number: row.row_number,
                        message,
                    });
                }
            }

            sink.on_progress(&progress);

            if self.log_interval > 0 && progress.processed % self.log_interval == 0 {
                info!(
                    processed = progress.processed,
                    total = progress.total,
                    failed = progress.failed,
                    "导入进度"
                );
            }
        }

        outcome.succeeded = progress.succeeded;
        outcome.failed = progress.failed;
        outcome.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            skipped = outcome.skipped,
            cancelled = outcome.cancelled,
            elapsed_ms = outcome.elapsed_ms,
            "导入执行完成"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IssueLevel, ValidationIssue};
    use crate::importer::error::CreateError;
    use crate::importer::import_trait::{NoopProgress, Payload};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// 按姓名决定成功或失败的创建器
    struct NameCreator {
        fail_names: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl NameCreator {
        fn failing(fail_names: Vec<&'static str>) -> Self {
            Self {
                fail_names,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RowCreator for NameCreator {
        async fn create(&self, _entity: &str, payload: &Payload) -> Result<String, CreateError> {
            let name = payload
                .get("full_name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            self.calls.lock().unwrap().push(name.clone());
            if self.fail_names.contains(&name.as_str()) {
                return Err(CreateError::new(format!("rejected {}", name)));
            }
            Ok(format!("lead-{}", name.to_lowercase()))
        }
    }

    fn lead_rows(names: &[&str]) -> (Vec<RawRow>, Vec<RowValidation>) {
        let rows: Vec<RawRow> = names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let mut fields = HashMap::new();
                fields.insert("name".to_string(), name.to_string());
                fields.insert("status".to_string(), "new".to_string());
                RawRow::new(idx + 2, fields)
            })
            .collect();
        let validations = rows.iter().map(|r| RowValidation::new(r.row_number)).collect();
        (rows, validations)
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let creator = NameCreator::failing(vec!["Luca"]);
        let (rows, validations) = lead_rows(&["Ana", "Luca", "Bea"]);

        let outcome = ImportExecutor::new(&creator)
            .run(&rows, &validations, &CatalogSet::new(), &ImportProfile::lead(), &NoopProgress)
            .await;

        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].row_number, 3);
        assert_eq!(outcome.errors[0].message, "rejected Luca");
        assert_eq!(creator.calls.lock().unwrap().len(), 3);
        assert_eq!(outcome.created[1].entity_id, "lead-bea");
    }

    #[tokio::test]
    async fn test_progress_after_every_row() {
        let creator = NameCreator::failing(vec!["Ana"]);
        let (rows, validations) = lead_rows(&["Ana", "Luca", "Bea"]);
        let snapshots = Mutex::new(Vec::new());
        let sink = |p: &ProgressSnapshot| snapshots.lock().unwrap().push(*p);

        ImportExecutor::new(&creator)
            .run(&rows, &validations, &CatalogSet::new(), &ImportProfile::lead(), &sink)
            .await;

        let snapshots = snapshots.into_inner().unwrap();
        let processed: Vec<usize> = snapshots.iter().map(|p| p.processed).collect();
        assert_eq!(processed, vec![1, 2, 3]);
        assert!(snapshots.iter().all(|p| p.succeeded + p.failed == p.processed));
        assert_eq!(snapshots.iter().filter(|p| p.is_finished()).count(), 1);
    }

    #[tokio::test]
    async fn test_rows_with_errors_are_skipped() {
        let creator = NameCreator::failing(vec![]);
        let (rows, mut validations) = lead_rows(&["Ana", "Luca"]);
        validations[0].push(IssueLevel::Error, ValidationIssue::new("name", "bad"));
        validations[1].push(IssueLevel::Warning, ValidationIssue::new("email", "meh"));

        let outcome = ImportExecutor::new(&creator)
            .run(&rows, &validations, &CatalogSet::new(), &ImportProfile::lead(), &NoopProgress)
            .await;

        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(*creator.calls.lock().unwrap(), vec!["Luca".to_string()]);
    }

    #[tokio::test]
    async fn test_cancel_between_rows() {
        let creator = NameCreator::failing(vec![]);
        let (rows, validations) = lead_rows(&["Ana", "Luca", "Bea"]);
        let cancel = CancelFlag::new();
        let trigger = cancel.clone();
        let sink = move |p: &ProgressSnapshot| {
            if p.processed == 1 {
                trigger.cancel();
            }
        };

        let outcome = ImportExecutor::new(&creator)
            .with_cancel(cancel)
            .run(&rows, &validations, &CatalogSet::new(), &ImportProfile::lead(), &sink)
            .await;

        assert!(outcome.cancelled);
        assert_eq!(outcome.attempted(), 1);
        assert_eq!(creator.calls.lock().unwrap().len(), 1);
    }
}
