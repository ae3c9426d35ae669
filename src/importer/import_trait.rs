// ==========================================
// 公寓运营后台 - 导入管道 Trait
// ==========================================
// 职责: 定义导入管道各阶段及外部协作方接口（不包含实现）
// 外部边界: CatalogSource（只读）/ RowCreator（唯一写入边界）/ ProgressSink（通知）
// ==========================================

use crate::domain::{CatalogEntry, CatalogSet, ProgressSnapshot, RawRow, RowValidation};
use crate::importer::error::{CreateError, DecodeError, FetchError};
use crate::importer::rules::RuleSet;
use async_trait::async_trait;

/// 创建请求载荷（字段名 → JSON 值）
pub type Payload = serde_json::Map<String, serde_json::Value>;

// ==========================================
// TabularDecoder Trait
// ==========================================
// 用途: 原始分隔文本 → 有序行记录
// 实现者: CsvDecoder
pub trait TabularDecoder: Send + Sync {
    /// 解析原始文本（首行为表头）
    ///
    /// # 返回
    /// - Ok(Vec<RawRow>): 行记录列表，行号从 2 开始
    /// - Err(DecodeError): 输入格式错误（如引号未闭合）
    fn decode(&self, raw_text: &str) -> Result<Vec<RawRow>, DecodeError>;
}

// ==========================================
// RowValidator Trait
// ==========================================
// 用途: 按规则集逐行校验（纯函数，不访问外部）
// 实现者: DqValidator
pub trait RowValidator: Send + Sync {
    /// 校验全部行
    ///
    /// # 返回
    /// - 与 rows 等长、同序的校验结果
    fn validate(&self, rows: &[RawRow], catalogs: &CatalogSet, rules: &RuleSet)
        -> Vec<RowValidation>;
}

// ==========================================
// CatalogSource Trait
// ==========================================
// 用途: 引用目录读取边界
// 实现者: SqliteEntityStore / 宿主应用提供的远程实现
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// 读取指定类型的目录条目
    ///
    /// # 参数
    /// - kind: 目录类型（如 "category"）
    async fn fetch_catalog(&self, kind: &str) -> Result<Vec<CatalogEntry>, FetchError>;
}

// ==========================================
// RowCreator Trait
// ==========================================
// 用途: 单行实体创建（写入边界）
// 超时由实现方自行负责
#[async_trait]
pub trait RowCreator: Send + Sync {
    /// 创建一个实体
    ///
    /// # 返回
    /// - Ok(String): 新实体 ID
    /// - Err(CreateError): 创建失败（仅影响该行）
    async fn create(&self, entity: &str, payload: &Payload) -> Result<String, CreateError>;
}

// ==========================================
// ProgressSink Trait
// ==========================================
// 用途: 每行处理后的进度通知，返回值不被使用
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, snapshot: &ProgressSnapshot);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressSnapshot) + Send + Sync,
{
    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        self(snapshot)
    }
}

/// 忽略所有进度通知
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn on_progress(&self, _snapshot: &ProgressSnapshot) {}
}
