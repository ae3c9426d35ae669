// ==========================================
// 公寓运营后台 - 批量导入核心库
// ==========================================
// 技术栈: Rust + SQLite
// 定位: 无界面的导入管道（解码 → 校验 → 闸门 → 逐行导入）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 数据类型
pub mod domain;

// 导入层 - 导入管道
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 数据仓储层 - 数据访问
pub mod repository;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// API 层 - 业务接口
pub mod api;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    CatalogEntry, CatalogSet, ImportOutcome, IssueLevel, ProgressSnapshot, RawRow,
    ReferenceCatalog, RowImportError, RowValidation, SessionState, ValidationIssue,
    ValidationSummary,
};

// 导入管道
pub use importer::{
    CancelFlag, CatalogSource, CsvDecoder, DqValidator, ImportError, ImportExecutor,
    ImportProfile, ImportResult, ImportSession, ProgressSink, RowCreator, RuleSet,
};

// API
pub use api::{ApiError, ImportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "公寓运营后台 - 批量导入";
