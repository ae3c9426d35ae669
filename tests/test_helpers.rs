// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、临时 CSV 文件、外部协作方的 Mock 实现
// ==========================================

#![allow(dead_code)]

use async_trait::async_trait;
use housing_import::db::{ensure_schema, open_sqlite_connection};
use housing_import::domain::{CatalogEntry, ProgressSnapshot};
use housing_import::importer::{
    CatalogSource, CreateError, FetchError, Payload, ProgressSink, RowCreator,
};
use std::collections::HashMap;
use std::error::Error;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 写入临时源文件（扩展名可控）
pub fn write_source_file(contents: &str, extension: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("housing_import_")
        .suffix(&format!(".{}", extension))
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub fn write_csv(contents: &str) -> NamedTempFile {
    write_source_file(contents, "csv")
}

pub fn path_of(file: &NamedTempFile) -> String {
    file.path().to_str().unwrap().to_string()
}

// ==========================================
// 目录 Mock
// ==========================================

/// 内存目录（未登记的类型返回空列表）
#[derive(Default)]
pub struct StaticCatalog {
    entries: HashMap<String, Vec<CatalogEntry>>,
    pub fetched: Mutex<Vec<String>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: &str, names: &[(&str, &str)]) -> Self {
        self.entries.insert(
            kind.to_string(),
            names
                .iter()
                .map(|(id, name)| CatalogEntry::new(*id, *name))
                .collect(),
        );
        self
    }

    /// 分类目录: Gold / Silver
    pub fn categories() -> Self {
        Self::new().with("category", &[("cat-gold", "Gold"), ("cat-silver", "Silver")])
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn fetch_catalog(&self, kind: &str) -> Result<Vec<CatalogEntry>, FetchError> {
        self.fetched.lock().unwrap().push(kind.to_string());
        Ok(self.entries.get(kind).cloned().unwrap_or_default())
    }
}

/// 总是失败的目录
pub struct FailingCatalog;

#[async_trait]
impl CatalogSource for FailingCatalog {
    async fn fetch_catalog(&self, kind: &str) -> Result<Vec<CatalogEntry>, FetchError> {
        Err(FetchError::new(kind, "connection refused"))
    }
}

// ==========================================
// 创建器 Mock
// ==========================================

/// 记录每次调用；载荷中 `key` 字段等于 fail_values 之一时失败
pub struct RecordingCreator {
    key: String,
    fail_values: Vec<String>,
    pub calls: Mutex<Vec<Payload>>,
}

impl RecordingCreator {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            fail_values: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, values: &[&str]) -> Self {
        self.fail_values = values.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RowCreator for RecordingCreator {
    async fn create(&self, _entity: &str, payload: &Payload) -> Result<String, CreateError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(payload.clone());
        let n = calls.len();

        let value = payload
            .get(&self.key)
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        if self.fail_values.iter().any(|f| f == value) {
            return Err(CreateError::new(format!("remote rejected {}", value)));
        }
        Ok(format!("id-{}", n))
    }
}

// ==========================================
// 进度 Mock
// ==========================================

#[derive(Default)]
pub struct RecordingProgress {
    pub snapshots: Mutex<Vec<ProgressSnapshot>>,
}

impl RecordingProgress {
    pub fn snapshots(&self) -> Vec<ProgressSnapshot> {
        self.snapshots.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        self.snapshots.lock().unwrap().push(*snapshot);
    }
}
