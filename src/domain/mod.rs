// ==========================================
// 公寓运营后台 - 领域模型层
// ==========================================
// 职责: 导入会话涉及的纯数据类型
// 红线: 不含数据访问逻辑，不含导入流程逻辑
// ==========================================

pub mod catalog;
pub mod report;
pub mod row;
pub mod types;

// 重导出核心类型
pub use catalog::{CatalogEntry, CatalogSet, ReferenceCatalog};
pub use report::{CreatedEntity, ImportOutcome, ProgressSnapshot, RowImportError};
pub use row::{RawRow, RowValidation, ValidationIssue, ValidationSummary};
pub use types::{IssueLevel, SessionState};
