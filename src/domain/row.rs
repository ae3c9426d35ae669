// ==========================================
// 公寓运营后台 - 行记录与校验结果
// ==========================================
// 职责: RawRow / ValidationIssue / RowValidation / ValidationSummary
// ==========================================

use crate::domain::types::IssueLevel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// RawRow - 原始行记录
// ==========================================
// 由解码器创建，之后不可变
// row_number 计入表头: 第 1 条数据行的行号为 2
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub row_number: usize,
    pub fields: HashMap<String, String>,
}

impl RawRow {
    pub fn new(row_number: usize, fields: HashMap<String, String>) -> Self {
        Self { row_number, fields }
    }

    /// 读取字段（TRIM 后为空视为缺失）
    pub fn value(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// 读取原始字段值（不做任何处理）
    pub fn raw(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

// ==========================================
// ValidationIssue - 字段级问题
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ==========================================
// RowValidation - 单行校验结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowValidation {
    pub row_number: usize,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl RowValidation {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn push(&mut self, level: IssueLevel, issue: ValidationIssue) {
        match level {
            IssueLevel::Error => self.errors.push(issue),
            IssueLevel::Warning => self.warnings.push(issue),
        }
    }

    /// 无错误即可导入（警告不阻断）
    pub fn is_importable(&self) -> bool {
        self.errors.is_empty()
    }
}

// ==========================================
// ValidationSummary - 提交前的汇总统计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_rows: usize,      // 总行数
    pub importable_rows: usize, // 可导入行数
    pub error_rows: usize,      // 含错误的行数
    pub warning_rows: usize,    // 含警告的行数
    pub error_count: usize,     // 错误总数
    pub warning_count: usize,   // 警告总数
}

impl ValidationSummary {
    pub fn from_results(results: &[RowValidation]) -> Self {
        results.iter().fold(
            Self {
                total_rows: results.len(),
                ..Self::default()
            },
            |mut acc, r| {
                if r.is_importable() {
                    acc.importable_rows += 1;
                } else {
                    acc.error_rows += 1;
                }
                if !r.warnings.is_empty() {
                    acc.warning_rows += 1;
                }
                acc.error_count += r.errors.len();
                acc.warning_count += r.warnings.len();
                acc
            },
        )
    }

    pub fn is_clean(&self) -> bool {
        self.error_rows == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        let fields = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RawRow::new(2, fields)
    }

    #[test]
    fn test_value_trims_and_hides_blank() {
        let r = row(&[("name", "  Ana  "), ("email", "   ")]);
        assert_eq!(r.value("name"), Some("Ana"));
        assert_eq!(r.value("email"), None);
        assert_eq!(r.raw("email"), Some("   "));
        assert_eq!(r.value("missing"), None);
    }

    #[test]
    fn test_summary_counts() {
        let mut ok = RowValidation::new(2);
        ok.push(IssueLevel::Warning, ValidationIssue::new("floor", "w"));
        let mut bad = RowValidation::new(3);
        bad.push(IssueLevel::Error, ValidationIssue::new("name", "e1"));
        bad.push(IssueLevel::Error, ValidationIssue::new("code", "e2"));

        let summary = ValidationSummary::from_results(&[ok, bad]);
        assert_eq!(summary.total_rows, 2);
        assert_eq!(summary.importable_rows, 1);
        assert_eq!(summary.error_rows, 1);
        assert_eq!(summary.warning_rows, 1);
        assert_eq!(summary.error_count, 2);
        assert_eq!(summary.warning_count, 1);
        assert!(!summary.is_clean());
    }
}
