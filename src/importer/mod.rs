// ==========================================
// 公寓运营后台 - 导入层
// ==========================================
// 职责: 批量表格导入（解码 → 目录加载 → 校验 → 闸门 → 逐行导入）
// 支持: 分隔文本（CSV / 分号 / 制表符 / 竖线）
// ==========================================

// 模块声明
pub mod conflict_handler;
pub mod dq_validator;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod import_executor;
pub mod import_trait;
pub mod profiles;
pub mod reference_resolver;
pub mod rules;
pub mod session;
pub mod template;

// 重导出核心类型
pub use conflict_handler::{ConflictHandler, Duplicate};
pub use dq_validator::DqValidator;
pub use error::{CreateError, DecodeError, FetchError, ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{check_file_extension, read_source_file, CsvDecoder, Delimiter};
pub use import_executor::{CancelFlag, ImportExecutor};
pub use profiles::{ColumnSpec, ImportProfile, ValueType};
pub use reference_resolver::ReferenceResolver;
pub use rules::{FieldFormat, FieldRule, RuleKind, RuleSet};
pub use session::ImportSession;
pub use template::generate_template;

// 重导出 Trait 接口
pub use import_trait::{
    CatalogSource, NoopProgress, Payload, ProgressSink, RowCreator, RowValidator, TabularDecoder,
};
