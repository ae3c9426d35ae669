// ==========================================
// 公寓运营后台 - 文件内重复检测
// ==========================================
// 职责: 检测同一文件内唯一字段的重复值
// 口径: TRIM + 小写比较，首次出现的行不计为重复
// ==========================================

use crate::domain::RawRow;
use std::collections::HashMap;

// ==========================================
// Duplicate - 重复记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    pub row_number: usize,
    pub first_row: usize,
    pub value: String,
}

pub struct ConflictHandler;

impl ConflictHandler {
    /// 检测指定字段的重复值
    ///
    /// # 返回
    /// - Vec<Duplicate>: 重复记录列表（不包括第一次出现），按行序
    pub fn detect_duplicates(rows: &[RawRow], field: &str) -> Vec<Duplicate> {
        let mut first_occurrence: HashMap<String, usize> = HashMap::new();
        let mut duplicates = Vec::new();

        for row in rows {
            let Some(value) = row.value(field) else {
                continue;
            };
            let key = value.to_lowercase();
            match first_occurrence.get(&key) {
                Some(&first_row) => duplicates.push(Duplicate {
                    row_number: row.row_number,
                    first_row,
                    value: value.to_string(),
                }),
                None => {
                    first_occurrence.insert(key, row.row_number);
                }
            }
        }

        duplicates
    }

    /// 以行号为键的重复索引
    pub fn duplicate_index(rows: &[RawRow], field: &str) -> HashMap<usize, Duplicate> {
        Self::detect_duplicates(rows, field)
            .into_iter()
            .map(|d| (d.row_number, d))
            .collect()
    }
}
