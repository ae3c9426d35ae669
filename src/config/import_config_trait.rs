// ==========================================
// 公寓运营后台 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::importer::file_parser::Delimiter;
use async_trait::async_trait;
use std::error::Error;

/// 配置读取结果（错误可跨线程传递）
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入会话开始时读取一次配置快照
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    // ===== 解码配置 =====

    /// 获取分隔符
    ///
    /// # 默认值
    /// - ","（可配置为 "auto" 按表头自动识别）
    async fn get_delimiter(&self) -> ConfigResult<Delimiter>;

    /// 获取单个文件允许的最大数据行数
    ///
    /// # 默认值
    /// - 5000
    async fn get_max_rows(&self) -> ConfigResult<usize>;

    /// 获取允许的文件扩展名
    ///
    /// # 默认值
    /// - ["csv"]
    ///
    /// # 用途
    /// - 解码前的文件入口守卫
    async fn get_allowed_extensions(&self) -> ConfigResult<Vec<String>>;

    // ===== 执行配置 =====

    /// 获取进度日志间隔（行数，0 表示关闭）
    ///
    /// # 默认值
    /// - 25
    async fn get_progress_log_interval(&self) -> ConfigResult<usize>;

    // ===== 界面配置 =====

    /// 获取校验/导入消息语言
    ///
    /// # 默认值
    /// - "en"
    async fn get_locale(&self) -> ConfigResult<String>;
}
