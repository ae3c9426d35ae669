// ==========================================
// 公寓运营后台 - 实体存储（SQLite）
// ==========================================
// 职责: 远程数据服务的本地替身
// - reference_entity: 引用目录（CatalogSource 读取边界）
// - imported_entity: 导入创建的实体（RowCreator 写入边界）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::open_and_migrate;
use crate::domain::CatalogEntry;
use crate::importer::error::{CreateError, FetchError};
use crate::importer::import_trait::{CatalogSource, Payload, RowCreator};
use crate::importer::profiles::ImportProfile;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

// ==========================================
// ImportedEntity - 已导入实体记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportedEntity {
    pub entity_id: String,
    pub entity_type: String,
    pub natural_key: Option<String>,
    pub payload: Payload,
    pub created_at: String,
}

// ==========================================
// SqliteEntityStore
// ==========================================
pub struct SqliteEntityStore {
    conn: Arc<Mutex<Connection>>,
    // entity_type → 自然键所在的载荷键
    natural_keys: HashMap<String, String>,
}

impl SqliteEntityStore {
    /// 打开数据库（自动建表）
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_and_migrate(db_path)?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 从已有连接创建（调用方负责建表）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            natural_keys: HashMap::new(),
        }
    }

    /// 声明实体的自然键；同一实体类型下自然键重复的创建会失败
    pub fn with_natural_key(mut self, entity_type: &str, payload_key: &str) -> Self {
        self.natural_keys
            .insert(entity_type.to_string(), payload_key.to_string());
        self
    }

    /// 按配置档声明自然键
    pub fn with_profile(self, profile: &ImportProfile) -> Self {
        match &profile.natural_key {
            Some(key) => {
                let entity = profile.entity.clone();
                self.with_natural_key(&entity, key)
            }
            None => self,
        }
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 引用目录 =====

    /// 新增目录条目
    pub fn add_reference_entity(&self, kind: &str, name: &str) -> RepositoryResult<CatalogEntry> {
        let (kind, name) = (kind.trim(), name.trim());
        if kind.is_empty() || name.is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: if kind.is_empty() { "kind" } else { "name" }.to_string(),
                message: "不能为空".to_string(),
            });
        }

        let entry = CatalogEntry::new(Uuid::new_v4().to_string(), name);
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO reference_entity (kind, id, name) VALUES (?1, ?2, ?3)",
            params![kind, entry.id, entry.name],
        )?;

        tracing::info!(kind = kind, id = %entry.id, name = %entry.name, "新增目录条目");
        Ok(entry)
    }

    /// 查询目录条目（按名称排序）
    pub fn list_reference_entities(&self, kind: &str) -> RepositoryResult<Vec<CatalogEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name FROM reference_entity WHERE kind = ?1 ORDER BY name, created_at",
        )?;
        let rows = stmt.query_map(params![kind], |row| {
            Ok(CatalogEntry::new(
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    // ===== 导入实体 =====

    /// 写入一个实体，返回新 ID
    pub fn insert_entity(&self, entity_type: &str, payload: &Payload) -> RepositoryResult<String> {
        let natural_key = self
            .natural_keys
            .get(entity_type)
            .and_then(|key| payload.get(key))
            .and_then(natural_key_text);
        let entity_id = Uuid::new_v4().to_string();
        let payload_json = serde_json::to_string(payload)?;

        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO imported_entity (entity_id, entity_type, natural_key, payload_json)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![entity_id, entity_type, natural_key, payload_json],
        )?;
        Ok(entity_id)
    }

    pub fn count_imported(&self, entity_type: &str) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM imported_entity WHERE entity_type = ?1",
            params![entity_type],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn get_imported(&self, entity_id: &str) -> RepositoryResult<Option<ImportedEntity>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                r#"
                SELECT entity_id, entity_type, natural_key, payload_json, created_at
                FROM imported_entity WHERE entity_id = ?1
                "#,
                params![entity_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((entity_id, entity_type, natural_key, payload_json, created_at)) => {
                Ok(Some(ImportedEntity {
                    entity_id,
                    entity_type,
                    natural_key,
                    payload: serde_json::from_str(&payload_json)?,
                    created_at,
                }))
            }
            None => Ok(None),
        }
    }
}

fn natural_key_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_lowercase()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ==========================================
// CatalogSource 实现
// ==========================================
#[async_trait]
impl CatalogSource for SqliteEntityStore {
    async fn fetch_catalog(&self, kind: &str) -> Result<Vec<CatalogEntry>, FetchError> {
        self.list_reference_entities(kind)
            .map_err(|e| FetchError::new(kind, e.to_string()))
    }
}

// ==========================================
// RowCreator 实现
// ==========================================
#[async_trait]
impl RowCreator for SqliteEntityStore {
    async fn create(&self, entity: &str, payload: &Payload) -> Result<String, CreateError> {
        self.insert_entity(entity, payload).map_err(|e| match e {
            RepositoryError::UniqueConstraintViolation(_) => {
                let key = self.natural_keys.get(entity).map(String::as_str).unwrap_or("id");
                let value = payload
                    .get(key)
                    .and_then(natural_key_text)
                    .unwrap_or_default();
                CreateError::new(format!("{} {}={} 已存在", entity, key, value))
            }
            other => CreateError::new(other.to_string()),
        })
    }
}
