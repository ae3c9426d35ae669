// ==========================================
// 公寓运营后台 - API层错误类型
// ==========================================
// 职责: 将导入层/仓储层错误转换为面向调用方的错误
// 口径: 所有错误信息必须包含显式原因
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 导入流程错误
    // ==========================================
    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("引用目录不可用: {0}")]
    CatalogUnavailable(String),

    #[error("存在 {error_rows} 行校验错误，未执行导入")]
    ImportBlocked { error_rows: usize },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FileNotFound(path) => ApiError::NotFound(format!("文件 {}", path)),
            e @ (ImportError::UnsupportedFormat { .. }
            | ImportError::FileReadError(_)
            | ImportError::Decode(_)
            | ImportError::TooManyRows { .. }) => ApiError::InvalidInput(e.to_string()),
            ImportError::Fetch(e) => ApiError::CatalogUnavailable(e.to_string()),
            ImportError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            ImportError::ImportBlocked { error_rows } => ApiError::ImportBlocked { error_rows },
            e @ ImportError::ConfigReadError { .. } => ApiError::ConfigError(e.to_string()),
            ImportError::StorageError(msg) => ApiError::DatabaseError(msg),
            ImportError::InternalError(msg) => ApiError::InternalError(msg),
            ImportError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::error::{DecodeError, FetchError};

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "studio".to_string(),
            id: "S001".to_string(),
        };
        match ApiError::from(repo_err) {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("studio"));
                assert!(msg.contains("S001"));
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_import_error_conversion() {
        let api_err: ApiError = ImportError::Decode(DecodeError::at_line("引号字段未闭合", 3)).into();
        assert!(matches!(api_err, ApiError::InvalidInput(ref m) if m.contains("第 3 行")));

        let api_err: ApiError = ImportError::Fetch(FetchError::new("category", "timeout")).into();
        assert!(matches!(api_err, ApiError::CatalogUnavailable(ref m) if m.contains("category")));

        let api_err: ApiError = ImportError::ImportBlocked { error_rows: 2 }.into();
        assert!(matches!(api_err, ApiError::ImportBlocked { error_rows: 2 }));
    }
}
