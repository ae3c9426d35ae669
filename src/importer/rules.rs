// ==========================================
// 公寓运营后台 - 字段校验规则
// ==========================================
// 职责: 规则集模型（有序字段规则）+ 格式判定
// 规则种类: Required / Pattern / Enumeration / CrossReference / NumericBounds / Unique
// ==========================================

use crate::domain::IssueLevel;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

// ==========================================
// FieldFormat - 字段格式
// ==========================================
#[derive(Debug, Clone)]
pub enum FieldFormat {
    Identifier, // 字母数字开头，允许 - _
    Email,
    IsoDate, // 严格 YYYY-MM-DD
    Phone,
    Custom { label: String, regex: Regex },
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("identifier regex"))
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"))
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?[0-9][0-9 ()-]{5,19}$").expect("phone regex"))
}

fn iso_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date regex"))
}

/// 严格解析 YYYY-MM-DD（位数固定 + 日历合法）
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    if !iso_date_re().is_match(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

impl FieldFormat {
    /// 自定义正则格式
    pub fn custom(label: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(FieldFormat::Custom {
            label: label.into(),
            regex: Regex::new(pattern)?,
        })
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            FieldFormat::Identifier => identifier_re().is_match(value),
            FieldFormat::Email => email_re().is_match(value),
            FieldFormat::IsoDate => parse_iso_date(value).is_some(),
            FieldFormat::Phone => phone_re().is_match(value),
            FieldFormat::Custom { regex, .. } => regex.is_match(value),
        }
    }

    /// i18n 格式名称键
    pub fn label_key(&self) -> &str {
        match self {
            FieldFormat::Identifier => "format.identifier",
            FieldFormat::Email => "format.email",
            FieldFormat::IsoDate => "format.iso_date",
            FieldFormat::Phone => "format.phone",
            FieldFormat::Custom { label, .. } => label,
        }
    }
}

// ==========================================
// RuleKind - 规则种类
// ==========================================
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// TRIM 后非空；违反即错误
    Required,
    /// 有值时须符合格式；级别取决于字段是否必填
    Pattern(FieldFormat),
    /// 有值时须属于封闭词表（大小写不敏感）；违反即错误
    Enumeration(Vec<String>),
    /// 有值时须匹配目录中的名称；违反即错误
    CrossReference { catalog: String },
    /// 有值时须为数值且在 [min, max] 内；级别取决于字段是否必填
    NumericBounds {
        min: f64,
        max: Option<f64>,
        integer: bool,
    },
    /// 同一文件内不得重复；第二次及以后出现为错误
    Unique,
}

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: String,
    pub kind: RuleKind,
}

// ==========================================
// RuleSet - 有序规则集
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<FieldRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, kind: RuleKind) {
        self.rules.push(FieldRule {
            field: field.into(),
            kind,
        });
    }

    fn with(mut self, field: &str, kind: RuleKind) -> Self {
        self.push(field, kind);
        self
    }

    pub fn required(self, field: &str) -> Self {
        self.with(field, RuleKind::Required)
    }

    pub fn pattern(self, field: &str, format: FieldFormat) -> Self {
        self.with(field, RuleKind::Pattern(format))
    }

    pub fn one_of(self, field: &str, allowed: &[&str]) -> Self {
        let allowed = allowed.iter().map(|s| s.to_string()).collect();
        self.with(field, RuleKind::Enumeration(allowed))
    }

    pub fn references(self, field: &str, catalog: &str) -> Self {
        self.with(
            field,
            RuleKind::CrossReference {
                catalog: catalog.to_string(),
            },
        )
    }

    pub fn number(self, field: &str, min: f64, max: Option<f64>) -> Self {
        self.with(
            field,
            RuleKind::NumericBounds {
                min,
                max,
                integer: false,
            },
        )
    }

    pub fn integer(self, field: &str, min: f64, max: Option<f64>) -> Self {
        self.with(
            field,
            RuleKind::NumericBounds {
                min,
                max,
                integer: true,
            },
        )
    }

    pub fn unique(self, field: &str) -> Self {
        self.with(field, RuleKind::Unique)
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 字段是否有 Required 规则
    pub fn is_required(&self, field: &str) -> bool {
        self.rules
            .iter()
            .any(|r| r.field == field && matches!(r.kind, RuleKind::Required))
    }

    /// 格式/数值类违规的级别: 必填字段 → 错误，可选字段 → 警告
    pub fn level_for(&self, field: &str) -> IssueLevel {
        if self.is_required(field) {
            IssueLevel::Error
        } else {
            IssueLevel::Warning
        }
    }

    /// 规则集引用的目录类型（按首次出现顺序去重）
    pub fn catalog_kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = Vec::new();
        for rule in &self.rules {
            if let RuleKind::CrossReference { catalog } = &rule.kind {
                if !kinds.contains(catalog) {
                    kinds.push(catalog.clone());
                }
            }
        }
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_date_is_strict() {
        assert!(FieldFormat::IsoDate.matches("2025-09-01"));
        assert!(!FieldFormat::IsoDate.matches("2025-9-1"));
        assert!(!FieldFormat::IsoDate.matches("2025-02-30"));
        assert!(!FieldFormat::IsoDate.matches("01/09/2025"));
    }

    #[test]
    fn test_formats() {
        assert!(FieldFormat::Email.matches("ana@example.com"));
        assert!(!FieldFormat::Email.matches("ana@example"));
        assert!(FieldFormat::Identifier.matches("ST-101"));
        assert!(!FieldFormat::Identifier.matches("-ST"));
        assert!(FieldFormat::Phone.matches("+34 600 123 456"));
        assert!(!FieldFormat::Phone.matches("call me"));

        let zip = FieldFormat::custom("postal code", r"^\d{5}$").unwrap();
        assert!(zip.matches("08001"));
        assert_eq!(zip.label_key(), "postal code");
    }

    #[test]
    fn test_level_follows_required() {
        let rules = RuleSet::new()
            .required("name")
            .pattern("name", FieldFormat::Identifier)
            .pattern("email", FieldFormat::Email);
        assert_eq!(rules.level_for("name"), IssueLevel::Error);
        assert_eq!(rules.level_for("email"), IssueLevel::Warning);
    }

    #[test]
    fn test_catalog_kinds_dedup() {
        let rules = RuleSet::new()
            .references("category", "category")
            .references("alt_category", "category")
            .references("building", "building");
        assert_eq!(rules.catalog_kinds(), vec!["category", "building"]);
    }
}
