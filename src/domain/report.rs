// ==========================================
// 公寓运营后台 - 导入进度与结果报告
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ProgressSnapshot - 进度快照
// ==========================================
// 不变量: succeeded + failed == processed, processed <= total
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
}

impl ProgressSnapshot {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record_success(&mut self) {
        self.processed += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self) {
        self.processed += 1;
        self.failed += 1;
    }

    pub fn is_finished(&self) -> bool {
        self.processed == self.total
    }
}

// ==========================================
// RowImportError - 单行导入失败
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowImportError {
    pub row_number: usize,
    pub message: String,
}

// ==========================================
// CreatedEntity - 成功创建的实体
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedEntity {
    pub row_number: usize,
    pub entity_id: String,
}

// ==========================================
// ImportOutcome - 最终导入报告
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,   // 执行器复核时跳过的含错误行
    pub cancelled: bool,  // 是否被协作式取消
    pub errors: Vec<RowImportError>,
    pub created: Vec<CreatedEntity>,
    pub elapsed_ms: u64,
}

impl ImportOutcome {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_invariant() {
        let mut p = ProgressSnapshot::new(3);
        p.record_success();
        p.record_failure();
        assert_eq!(p.processed, 2);
        assert_eq!(p.succeeded + p.failed, p.processed);
        assert!(!p.is_finished());
        p.record_success();
        assert!(p.is_finished());
    }
}
