// ==========================================
// 公寓运营后台 - 导入配置档（实体类型）
// ==========================================
// 职责: 每种可导入实体的列定义（表头/载荷键/值类型/示例）+ 规则集
// 内置: lead（线索）/ studio（房源）
// ==========================================

use crate::importer::rules::{FieldFormat, RuleSet};

/// 线索状态词表
pub const LEAD_STATUSES: &[&str] = &["new", "contacted", "qualified", "converted", "lost"];

/// 房源状态词表
pub const STUDIO_STATUSES: &[&str] = &["available", "occupied", "reserved", "maintenance"];

/// 房源分类目录类型
pub const CATEGORY_CATALOG: &str = "category";

// ==========================================
// ValueType - 载荷值类型
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Integer,
    Decimal,
    Date,
    Code,                          // 词表值，统一小写
    Reference { catalog: String }, // 名称 → 目录 ID
}

// ==========================================
// ColumnSpec - 列定义
// ==========================================
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub header: String,      // 文件表头
    pub payload_key: String, // 创建载荷中的键
    pub value_type: ValueType,
    pub examples: Vec<String>, // 模板示例值（1~2 个）
}

impl ColumnSpec {
    pub fn new(header: &str, payload_key: &str, value_type: ValueType) -> Self {
        Self {
            header: header.to_string(),
            payload_key: payload_key.to_string(),
            value_type,
            examples: Vec::new(),
        }
    }

    pub fn examples(mut self, values: &[&str]) -> Self {
        self.examples = values.iter().map(|v| v.to_string()).collect();
        self
    }
}

// ==========================================
// ImportProfile - 导入配置档
// ==========================================
#[derive(Debug, Clone)]
pub struct ImportProfile {
    pub entity: String,
    /// 实体自然键（载荷键），存储层据此判定重复
    pub natural_key: Option<String>,
    pub columns: Vec<ColumnSpec>,
    pub rules: RuleSet,
}

impl ImportProfile {
    /// 线索导入
    pub fn lead() -> Self {
        let columns = vec![
            ColumnSpec::new("name", "full_name", ValueType::Text)
                .examples(&["Ana García", "Luca Bianchi"]),
            ColumnSpec::new("email", "email", ValueType::Text)
                .examples(&["ana.garcia@example.com", "luca@example.org"]),
            ColumnSpec::new("phone", "phone", ValueType::Text)
                .examples(&["+34 600 123 456", ""]),
            ColumnSpec::new("status", "status", ValueType::Code).examples(&["new", "contacted"]),
            ColumnSpec::new("source", "source", ValueType::Text)
                .examples(&["website", "university fair"]),
            ColumnSpec::new("move_in_date", "move_in_date", ValueType::Date)
                .examples(&["2025-09-01", "2026-01-15"]),
            ColumnSpec::new("budget", "monthly_budget", ValueType::Decimal)
                .examples(&["650", "800.50"]),
            ColumnSpec::new("notes", "notes", ValueType::Text)
                .examples(&["Erasmus student", ""]),
        ];

        let rules = RuleSet::new()
            .required("name")
            .pattern("email", FieldFormat::Email)
            .pattern("phone", FieldFormat::Phone)
            .required("status")
            .one_of("status", LEAD_STATUSES)
            .pattern("move_in_date", FieldFormat::IsoDate)
            .number("budget", 0.0, None);

        Self {
            entity: "lead".to_string(),
            natural_key: None,
            columns,
            rules,
        }
    }

    /// 房源导入（分类需引用现有目录）
    pub fn studio() -> Self {
        let columns = vec![
            ColumnSpec::new("code", "code", ValueType::Text).examples(&["ST-101", "ST-102"]),
            ColumnSpec::new("name", "name", ValueType::Text)
                .examples(&["Studio Sol", "Studio Mar"]),
            ColumnSpec::new(
                "category",
                "category_id",
                ValueType::Reference {
                    catalog: CATEGORY_CATALOG.to_string(),
                },
            )
            .examples(&["Gold", "Silver"]),
            ColumnSpec::new("floor", "floor", ValueType::Integer).examples(&["1", "3"]),
            ColumnSpec::new("size_m2", "size_m2", ValueType::Decimal).examples(&["22.5", "30"]),
            ColumnSpec::new("monthly_price", "monthly_price", ValueType::Decimal)
                .examples(&["720", "850"]),
            ColumnSpec::new("status", "status", ValueType::Code)
                .examples(&["available", "maintenance"]),
        ];

        let rules = RuleSet::new()
            .required("code")
            .pattern("code", FieldFormat::Identifier)
            .unique("code")
            .required("name")
            .required("category")
            .references("category", CATEGORY_CATALOG)
            .integer("floor", -2.0, Some(60.0))
            .required("size_m2")
            .number("size_m2", 1.0, Some(500.0))
            .required("monthly_price")
            .number("monthly_price", 0.0, None)
            .one_of("status", STUDIO_STATUSES);

        Self {
            entity: "studio".to_string(),
            natural_key: Some("code".to_string()),
            columns,
            rules,
        }
    }

    /// 按名称查找内置配置档
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "lead" | "leads" => Some(Self::lead()),
            "studio" | "studios" => Some(Self::studio()),
            _ => None,
        }
    }

    /// 内置配置档名称
    pub fn names() -> &'static [&'static str] {
        &["lead", "studio"]
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_profile_needs_no_catalog() {
        let profile = ImportProfile::lead();
        assert!(profile.rules.catalog_kinds().is_empty());
        assert!(profile.rules.is_required("name"));
        assert!(!profile.rules.is_required("email"));
    }

    #[test]
    fn test_studio_profile_references_categories() {
        let profile = ImportProfile::studio();
        assert_eq!(profile.rules.catalog_kinds(), vec![CATEGORY_CATALOG]);
        assert_eq!(profile.natural_key.as_deref(), Some("code"));
        assert!(!profile.rules.is_required("floor"));
    }

    #[test]
    fn test_by_name() {
        assert_eq!(ImportProfile::by_name("Studios").map(|p| p.entity), Some("studio".to_string()));
        assert!(ImportProfile::by_name("invoice").is_none());
    }

    #[test]
    fn test_every_rule_targets_a_column() {
        for name in ImportProfile::names() {
            let profile = ImportProfile::by_name(name).unwrap();
            let headers = profile.headers();
            for rule in profile.rules.rules() {
                assert!(headers.contains(&rule.field.as_str()), "{} 未定义列 {}", name, rule.field);
            }
        }
    }
}
