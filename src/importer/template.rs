// ==========================================
// 公寓运营后台 - 导入模板生成
// ==========================================
// 职责: 按配置档输出表头 + 1~2 行示例数据
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::profiles::ImportProfile;
use csv::WriterBuilder;

/// 生成模板文本
pub fn generate_template(profile: &ImportProfile, delimiter: u8) -> ImportResult<String> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    writer.write_record(profile.headers())?;

    let example_rows = profile
        .columns
        .iter()
        .map(|c| c.examples.len())
        .max()
        .unwrap_or(0)
        .clamp(1, 2);

    for idx in 0..example_rows {
        let record: Vec<&str> = profile
            .columns
            .iter()
            .map(|c| c.examples.get(idx).map(String::as_str).unwrap_or(""))
            .collect();
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ImportError::InternalError(format!("模板写入失败: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| ImportError::InternalError(e.to_string()))
}
