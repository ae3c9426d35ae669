// ==========================================
// 公寓运营后台 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 解码错误 / 目录加载错误 / 行创建错误 / 会话级错误
// ==========================================

use thiserror::Error;

// ===== 解码错误（会话级，致命）=====
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("文件解析失败{}: {message}", line_suffix(.line))]
pub struct DecodeError {
    pub message: String,
    pub line: Option<u64>,
}

fn line_suffix(line: &Option<u64>) -> String {
    line.map(|l| format!(" (第 {} 行)", l)).unwrap_or_default()
}

impl DecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
        }
    }

    pub fn at_line(message: impl Into<String>, line: u64) -> Self {
        Self {
            message: message.into(),
            line: Some(line),
        }
    }
}

// ===== 目录加载错误（会话级，校验前致命）=====
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("引用目录加载失败 (kind: {kind}): {message}")]
pub struct FetchError {
    pub kind: String,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

// ===== 行创建错误（行级，隔离记录）=====
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CreateError {
    pub message: String,
}

impl CreateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: .{extension}（允许: {allowed}）")]
    UnsupportedFormat { extension: String, allowed: String },

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("数据行过多: {actual} 行，上限 {limit} 行")]
    TooManyRows { limit: usize, actual: usize },

    // ===== 引用目录错误 =====
    #[error(transparent)]
    Fetch(#[from] FetchError),

    // ===== 会话状态错误 =====
    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("存在 {error_rows} 行校验错误，禁止导入")]
    ImportBlocked { error_rows: usize },

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    // ===== 存储错误 =====
    #[error("数据存储失败: {0}")]
    StorageError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>（保留出错位置的行号）
impl From<csv::Error> for DecodeError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line());
        DecodeError {
            message: err.to_string(),
            line,
        }
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::Decode(err.into())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::StorageError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display_with_line() {
        let err = DecodeError::at_line("引号未闭合", 4);
        assert!(err.to_string().contains("第 4 行"));
        assert!(err.to_string().contains("引号未闭合"));
    }

    #[test]
    fn test_fetch_error_converts() {
        let err: ImportError = FetchError::new("category", "timeout").into();
        assert!(matches!(err, ImportError::Fetch(ref f) if f.kind == "category"));
    }
}
