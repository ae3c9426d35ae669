// ==========================================
// 公寓运营后台 - 数据质量校验器实现
// ==========================================
// 职责: 按有序规则集逐行校验，输出错误/警告
// 红线: 纯函数，不修改目录，不发起任何远程调用
// ==========================================

use crate::domain::{CatalogSet, IssueLevel, RawRow, RowValidation, ValidationIssue};
use crate::i18n::{t, t_with_args};
use crate::importer::conflict_handler::{ConflictHandler, Duplicate};
use crate::importer::import_trait::RowValidator;
use crate::importer::rules::{FieldFormat, FieldRule, RuleKind, RuleSet};
use std::collections::HashMap;
use tracing::debug;

pub struct DqValidator;

impl RowValidator for DqValidator {
    fn validate(
        &self,
        rows: &[RawRow],
        catalogs: &CatalogSet,
        rules: &RuleSet,
    ) -> Vec<RowValidation> {
        // 唯一性需要整列视角，预先建立索引
        let duplicates: HashMap<&str, HashMap<usize, Duplicate>> = rules
            .rules()
            .iter()
            .filter(|r| matches!(r.kind, RuleKind::Unique))
            .map(|r| {
                (
                    r.field.as_str(),
                    ConflictHandler::duplicate_index(rows, &r.field),
                )
            })
            .collect();

        let results: Vec<RowValidation> = rows
            .iter()
            .map(|row| {
                let mut result = RowValidation::new(row.row_number);
                for rule in rules.rules() {
                    if let Some((level, issue)) =
                        self.check_rule(row, rule, rules, catalogs, &duplicates)
                    {
                        result.push(level, issue);
                    }
                }
                result
            })
            .collect();

        debug!(
            rows = rows.len(),
            rules = rules.rules().len(),
            "逐行校验完成"
        );
        results
    }
}

impl DqValidator {
    /// 单条规则判定，返回 None 表示通过
    fn check_rule(
        &self,
        row: &RawRow,
        rule: &FieldRule,
        rules: &RuleSet,
        catalogs: &CatalogSet,
        duplicates: &HashMap<&str, HashMap<usize, Duplicate>>,
    ) -> Option<(IssueLevel, ValidationIssue)> {
        let field = rule.field.as_str();
        let value = row.value(field);

        match &rule.kind {
            RuleKind::Required => match value {
                Some(_) => None,
                None => Some((
                    IssueLevel::Error,
                    issue(field, "validation.required", &[]),
                )),
            },

            RuleKind::Pattern(format) => {
                let v = value?;
                if format.matches(v) {
                    return None;
                }
                Some((
                    rules.level_for(field),
                    issue(
                        field,
                        "validation.invalid_format",
                        &[("value", v), ("format", &format_label(format))],
                    ),
                ))
            }

            RuleKind::Enumeration(allowed) => {
                let v = value?;
                if allowed.iter().any(|a| a.eq_ignore_ascii_case(v)) {
                    return None;
                }
                Some((
                    IssueLevel::Error,
                    issue(
                        field,
                        "validation.not_in_vocabulary",
                        &[("value", v), ("allowed", &allowed.join(", "))],
                    ),
                ))
            }

            RuleKind::CrossReference { catalog } => {
                let v = value?;
                match catalogs.get(catalog) {
                    // 目录不可用时显式失败，不视为通过
                    None => Some((
                        IssueLevel::Error,
                        issue(
                            field,
                            "validation.catalog_unavailable",
                            &[("catalog", catalog)],
                        ),
                    )),
                    Some(c) if c.contains(v) => None,
                    Some(_) => Some((
                        IssueLevel::Error,
                        issue(
                            field,
                            "validation.unknown_reference",
                            &[("value", v), ("catalog", catalog)],
                        ),
                    )),
                }
            }

            RuleKind::NumericBounds { min, max, integer } => {
                let v = value?;
                let level = rules.level_for(field);
                let Ok(number) = v.parse::<f64>() else {
                    return Some((
                        level,
                        issue(field, "validation.not_a_number", &[("value", v)]),
                    ));
                };
                if !number.is_finite() {
                    return Some((
                        level,
                        issue(field, "validation.not_a_number", &[("value", v)]),
                    ));
                }
                if *integer && number.fract() != 0.0 {
                    return Some((
                        level,
                        issue(field, "validation.not_an_integer", &[("value", v)]),
                    ));
                }
                if number < *min {
                    return Some((
                        level,
                        issue(
                            field,
                            "validation.below_min",
                            &[("value", v), ("min", &min.to_string())],
                        ),
                    ));
                }
                match max {
                    Some(max) if number > *max => Some((
                        level,
                        issue(
                            field,
                            "validation.above_max",
                            &[("value", v), ("max", &max.to_string())],
                        ),
                    )),
                    _ => None,
                }
            }

            RuleKind::Unique => {
                let dup = duplicates.get(field)?.get(&row.row_number)?;
                Some((
                    IssueLevel::Error,
                    issue(
                        field,
                        "validation.duplicate",
                        &[("value", &dup.value), ("first_row", &dup.first_row.to_string())],
                    ),
                ))
            }
        }
    }
}

fn issue(field: &str, key: &str, args: &[(&str, &str)]) -> ValidationIssue {
    let mut all_args = Vec::with_capacity(args.len() + 1);
    all_args.push(("field", field));
    all_args.extend_from_slice(args);
    ValidationIssue::new(field, t_with_args(key, &all_args))
}

fn format_label(format: &FieldFormat) -> String {
    match format {
        FieldFormat::Custom { label, .. } => label.clone(),
        other => t(other.label_key()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CatalogEntry, ReferenceCatalog};

    fn create_test_row(row_number: usize, pairs: &[(&str, &str)]) -> RawRow {
        let fields = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RawRow::new(row_number, fields)
    }

    fn categories() -> CatalogSet {
        CatalogSet::new().with(ReferenceCatalog::from_entries(
            "category",
            vec![
                CatalogEntry::new("c1", "Gold"),
                CatalogEntry::new("c2", "Silver"),
            ],
        ))
    }

    #[test]
    fn test_required_is_error() {
        let rules = RuleSet::new().required("name");
        let rows = vec![
            create_test_row(2, &[("name", "Ana")]),
            create_test_row(3, &[("name", "   ")]),
        ];

        let results = DqValidator.validate(&rows, &CatalogSet::new(), &rules);

        assert_eq!(results.len(), 2);
        assert!(results[0].is_importable());
        assert_eq!(results[1].row_number, 3);
        assert_eq!(results[1].errors.len(), 1);
        assert_eq!(results[1].errors[0].field, "name");
        assert!(results[1].errors[0].message.contains("name"));
    }

    #[test]
    fn test_optional_pattern_is_warning() {
        let rules = RuleSet::new()
            .pattern("email", FieldFormat::Email)
            .required("code")
            .pattern("code", FieldFormat::Identifier);
        let rows = vec![create_test_row(2, &[("email", "nope"), ("code", "bad code")])];

        let results = DqValidator.validate(&rows, &CatalogSet::new(), &rules);

        assert_eq!(results[0].warnings.len(), 1);
        assert_eq!(results[0].warnings[0].field, "email");
        assert_eq!(results[0].errors.len(), 1);
        assert_eq!(results[0].errors[0].field, "code");
    }

    #[test]
    fn test_absent_optional_fields_pass() {
        let rules = RuleSet::new()
            .pattern("email", FieldFormat::Email)
            .one_of("status", &["new"])
            .number("budget", 0.0, None)
            .references("category", "category");
        let rows = vec![create_test_row(2, &[("email", "")])];

        let results = DqValidator.validate(&rows, &CatalogSet::new(), &rules);

        assert!(results[0].errors.is_empty());
        assert!(results[0].warnings.is_empty());
    }

    #[test]
    fn test_enumeration_case_insensitive() {
        let rules = RuleSet::new().one_of("status", &["available", "occupied"]);
        let rows = vec![
            create_test_row(2, &[("status", "Available")]),
            create_test_row(3, &[("status", "sold")]),
        ];

        let results = DqValidator.validate(&rows, &CatalogSet::new(), &rules);

        assert!(results[0].is_importable());
        assert_eq!(results[1].errors[0].field, "status");
    }

    #[test]
    fn test_cross_reference_requires_exact_name() {
        let rules = RuleSet::new().references("category", "category");
        let rows = vec![
            create_test_row(2, &[("category", "gold")]),
            create_test_row(3, &[("category", "Gol")]),
        ];

        let results = DqValidator.validate(&rows, &categories(), &rules);

        assert!(results[0].is_importable());
        assert_eq!(results[1].errors.len(), 1);
        assert_eq!(results[1].errors[0].field, "category");
    }

    #[test]
    fn test_missing_catalog_fails_explicitly() {
        let rules = RuleSet::new().references("category", "category");
        let rows = vec![create_test_row(2, &[("category", "Gold")])];

        let results = DqValidator.validate(&rows, &CatalogSet::new(), &rules);

        assert_eq!(results[0].errors.len(), 1);
        assert!(results[0].errors[0].message.contains("category"));
    }

    #[test]
    fn test_numeric_bounds_levels() {
        let rules = RuleSet::new()
            .integer("floor", -2.0, Some(60.0))
            .required("price")
            .number("price", 0.0, None);
        let rows = vec![
            create_test_row(2, &[("floor", "2.5"), ("price", "-1")]),
            create_test_row(3, &[("floor", "ninety"), ("price", "abc")]),
            create_test_row(4, &[("floor", "61"), ("price", "700")]),
            create_test_row(5, &[("floor", "-2"), ("price", "0")]),
        ];

        let results = DqValidator.validate(&rows, &CatalogSet::new(), &rules);

        // 信息性字段 → 警告，必填数值 → 错误
        assert_eq!(results[0].warnings.len(), 1);
        assert_eq!(results[0].errors.len(), 1);
        assert_eq!(results[1].warnings[0].field, "floor");
        assert_eq!(results[1].errors[0].field, "price");
        assert_eq!(results[2].warnings.len(), 1);
        assert!(results[2].is_importable());
        assert!(results[3].warnings.is_empty() && results[3].errors.is_empty());
    }

    #[test]
    fn test_unique_flags_later_rows() {
        let rules = RuleSet::new().unique("code");
        let rows = vec![
            create_test_row(2, &[("code", "ST-1")]),
            create_test_row(3, &[("code", "ST-1")]),
        ];

        let results = DqValidator.validate(&rows, &CatalogSet::new(), &rules);

        assert!(results[0].is_importable());
        assert_eq!(results[1].errors.len(), 1);
        assert!(results[1].errors[0].message.contains('2'));
    }

    #[test]
    fn test_issue_order_follows_rules() {
        let rules = RuleSet::new().required("name").required("code");
        let rows = vec![create_test_row(2, &[])];

        let results = DqValidator.validate(&rows, &CatalogSet::new(), &rules);

        let fields: Vec<&str> = results[0].errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "code"]);
    }
}
