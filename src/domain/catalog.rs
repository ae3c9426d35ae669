// ==========================================
// 公寓运营后台 - 引用目录快照
// ==========================================
// 职责: 会话级只读目录（id + 规范名称），大小写不敏感的名称匹配
// 红线: 加载后不可变；校验与导入只读访问
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// CatalogEntry - 目录条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// 名称匹配键: TRIM + 小写
fn match_key(name: &str) -> String {
    name.trim().to_lowercase()
}

// ==========================================
// ReferenceCatalog - 单一类型的目录快照
// ==========================================
#[derive(Debug, Clone)]
pub struct ReferenceCatalog {
    kind: String,
    entries: Vec<CatalogEntry>,
    by_name: HashMap<String, usize>,
}

impl ReferenceCatalog {
    /// 从条目列表构建快照
    ///
    /// 名称重复（大小写不敏感）时保留第一次出现的条目
    pub fn from_entries(kind: impl Into<String>, entries: Vec<CatalogEntry>) -> Self {
        let kind = kind.into();
        let mut by_name = HashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            let key = match_key(&entry.name);
            if by_name.contains_key(&key) {
                tracing::warn!(kind = %kind, name = %entry.name, "目录中存在重复名称，忽略后续条目");
                continue;
            }
            by_name.insert(key, idx);
        }
        Self {
            kind,
            entries,
            by_name,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// 大小写不敏感的精确名称匹配
    pub fn resolve(&self, name: &str) -> Option<&CatalogEntry> {
        self.by_name
            .get(&match_key(name))
            .map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ==========================================
// CatalogSet - 会话内所有已加载目录
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CatalogSet {
    catalogs: HashMap<String, ReferenceCatalog>,
}

impl CatalogSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, catalog: ReferenceCatalog) {
        self.catalogs.insert(catalog.kind().to_string(), catalog);
    }

    pub fn with(mut self, catalog: ReferenceCatalog) -> Self {
        self.insert(catalog);
        self
    }

    /// None 表示该类型目录不可用（未加载或加载失败）
    pub fn get(&self, kind: &str) -> Option<&ReferenceCatalog> {
        self.catalogs.get(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.catalogs.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }
}
