// ==========================================
// 公寓运营后台 - 引用目录加载器
// ==========================================
// 职责: 每个会话在校验前加载一次规则集引用的全部目录
// 红线: 任一目录加载失败即整体失败，不返回残缺的目录集合
// ==========================================

use crate::domain::{CatalogSet, ReferenceCatalog};
use crate::importer::error::FetchError;
use crate::importer::import_trait::CatalogSource;
use crate::importer::rules::RuleSet;
use tracing::{error, info};

pub struct ReferenceResolver<'a> {
    source: &'a dyn CatalogSource,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(source: &'a dyn CatalogSource) -> Self {
        Self { source }
    }

    /// 加载单一类型目录快照
    pub async fn load_catalog(&self, kind: &str) -> Result<ReferenceCatalog, FetchError> {
        match self.source.fetch_catalog(kind).await {
            Ok(entries) => {
                info!(kind = kind, entries = entries.len(), "引用目录加载完成");
                Ok(ReferenceCatalog::from_entries(kind, entries))
            }
            Err(e) => {
                error!(kind = kind, error = %e, "引用目录加载失败");
                Err(e)
            }
        }
    }

    /// 按规则集加载所需目录（无引用规则时不发起任何读取）
    pub async fn load_for(&self, rules: &RuleSet) -> Result<CatalogSet, FetchError> {
        let mut catalogs = CatalogSet::new();
        for kind in rules.catalog_kinds() {
            catalogs.insert(self.load_catalog(&kind).await?);
        }
        Ok(catalogs)
    }
}
