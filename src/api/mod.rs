// ==========================================
// 公寓运营后台 - API 层
// ==========================================
// 职责: 提供无界面的导入 API，供 CLI 与宿主应用调用
// ==========================================

pub mod error;
pub mod import_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportFileResponse, PreviewResponse};
