// ==========================================
// 公寓运营后台 - 字段映射器实现
// ==========================================
// 职责: RawRow → 创建载荷（表头 → 载荷键 + 类型转换 + 引用名称替换为 ID）
// 口径: 空值省略；警告级无效值省略；引用无法解析则该行映射失败
// ==========================================

use crate::domain::{CatalogSet, RawRow, RowValidation};
use crate::i18n::t_with_args;
use crate::importer::import_trait::Payload;
use crate::importer::profiles::{ColumnSpec, ImportProfile, ValueType};
use crate::importer::rules::{parse_iso_date, RuleKind};
use serde_json::{Number, Value};
use std::collections::HashSet;
use tracing::debug;

pub struct FieldMapper;

impl FieldMapper {
    /// 构建单行创建载荷
    ///
    /// # 参数
    /// - validation: 该行的校验结果；含警告的字段不进入载荷
    ///
    /// # 返回
    /// - Ok(Payload): 可直接交给 RowCreator 的载荷
    /// - Err(String): 引用名称无法解析（消息含字段名）
    pub fn to_payload(
        &self,
        row: &RawRow,
        validation: Option<&RowValidation>,
        profile: &ImportProfile,
        catalogs: &CatalogSet,
    ) -> Result<Payload, String> {
        let mut payload = Payload::new();
        let flagged: HashSet<&str> = validation
            .map(|v| v.warnings.iter().map(|w| w.field.as_str()).collect())
            .unwrap_or_default();

        for column in &profile.columns {
            let Some(raw) = row.value(&column.header) else {
                continue;
            };
            if flagged.contains(column.header.as_str()) {
                debug!(
                    row_number = row.row_number,
                    field = %column.header,
                    value = raw,
                    "字段存在校验警告，已从载荷中省略"
                );
                continue;
            }

            match self.convert(raw, column, profile, catalogs)? {
                Some(value) => {
                    payload.insert(column.payload_key.clone(), value);
                }
                None => debug!(
                    row_number = row.row_number,
                    field = %column.header,
                    value = raw,
                    "值无法转换，已从载荷中省略"
                ),
            }
        }

        Ok(payload)
    }

    fn convert(
        &self,
        raw: &str,
        column: &ColumnSpec,
        profile: &ImportProfile,
        catalogs: &CatalogSet,
    ) -> Result<Option<Value>, String> {
        let value = match &column.value_type {
            ValueType::Text => Some(Value::String(raw.to_string())),
            ValueType::Integer => self.parse_integer(raw).map(Value::from),
            ValueType::Decimal => raw
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            ValueType::Date => {
                parse_iso_date(raw).map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            }
            ValueType::Code => Some(Value::String(self.canonical_code(raw, column, profile))),
            ValueType::Reference { catalog } => {
                let entry = catalogs
                    .get(catalog)
                    .and_then(|c| c.resolve(raw))
                    .ok_or_else(|| {
                        t_with_args(
                            "import.unresolved_reference",
                            &[
                                ("field", column.header.as_str()),
                                ("catalog", catalog.as_str()),
                                ("value", raw),
                            ],
                        )
                    })?;
                Some(Value::String(entry.id.clone()))
            }
        };
        Ok(value)
    }

    /// 整数: 接受 "3" 与 "3.0"；超出 i64 范围视为无法转换
    fn parse_integer(&self, raw: &str) -> Option<i64> {
        if let Ok(v) = raw.parse::<i64>() {
            return Some(v);
        }
        // i64::MAX as f64 == 2^63，本身已越界，上界取开区间
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .filter(|v| *v >= i64::MIN as f64 && *v < i64::MAX as f64)
            .map(|v| v as i64)
    }

    /// 词表值: 取规则中的规范写法，未声明词表时统一小写
    fn canonical_code(&self, raw: &str, column: &ColumnSpec, profile: &ImportProfile) -> String {
        profile
            .rules
            .rules()
            .iter()
            .filter(|r| r.field == column.header)
            .find_map(|r| match &r.kind {
                RuleKind::Enumeration(allowed) => {
                    allowed.iter().find(|a| a.eq_ignore_ascii_case(raw)).cloned()
                }
                _ => None,
            })
            .unwrap_or_else(|| raw.to_lowercase())
    }
}
