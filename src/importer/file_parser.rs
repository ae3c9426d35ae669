// ==========================================
// 公寓运营后台 - 分隔文本解码器实现
// ==========================================
// 职责: 原始分隔文本 → RawRow 序列（阶段 0: 文件读取与解析）
// 支持: 逗号 / 分号 / 制表符 / 竖线，或按表头自动识别
// 红线: 纯转换，不访问任何外部状态
// ==========================================

use crate::domain::RawRow;
use crate::importer::error::{DecodeError, ImportError, ImportResult};
use crate::importer::import_trait::TabularDecoder;
use csv::ReaderBuilder;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// 自动识别时的候选分隔符（按优先级）
const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

// ==========================================
// Delimiter - 分隔符设置
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Fixed(u8),
    Auto, // 统计表头行中各候选出现次数
}

impl Delimiter {
    /// 从配置值解析（"auto" / "," / ";" / "\t" / "tab" / "|"）
    pub fn parse(value: &str) -> Option<Self> {
        if value == "\t" {
            return Some(Delimiter::Fixed(b'\t'));
        }
        match value.trim().to_lowercase().as_str() {
            "auto" => Some(Delimiter::Auto),
            "," | "comma" => Some(Delimiter::Fixed(b',')),
            ";" | "semicolon" => Some(Delimiter::Fixed(b';')),
            "\\t" | "tab" => Some(Delimiter::Fixed(b'\t')),
            "|" | "pipe" => Some(Delimiter::Fixed(b'|')),
            _ => None,
        }
    }

    /// 确定实际使用的分隔符
    pub fn resolve(self, header_line: &str) -> u8 {
        match self {
            Delimiter::Fixed(d) => d,
            Delimiter::Auto => detect_delimiter(header_line),
        }
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Delimiter::Fixed(b',')
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Auto => write!(f, "auto"),
            Delimiter::Fixed(b'\t') => write!(f, "tab"),
            Delimiter::Fixed(d) => write!(f, "{}", *d as char),
        }
    }
}

/// 出现次数最多的候选分隔符；并列时取优先级靠前者
fn detect_delimiter(header_line: &str) -> u8 {
    let mut best = DELIMITER_CANDIDATES[0];
    let mut best_count = 0usize;
    for candidate in DELIMITER_CANDIDATES {
        let count = header_line.bytes().filter(|b| *b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

// ==========================================
// 引号预扫描
// ==========================================
// csv 库对未闭合引号是宽容的（吞掉剩余内容），
// 因此解码前先用状态机确认所有引号字段均已闭合。
#[derive(Clone, Copy)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

fn check_quotes(text: &str, delimiter: u8) -> Result<(), DecodeError> {
    let mut state = QuoteState::FieldStart;
    let mut line: u64 = 1;
    let mut opened_at: u64 = 1;

    for byte in text.bytes() {
        state = match (state, byte) {
            (QuoteState::Quoted, b'"') => QuoteState::QuoteInQuoted,
            (QuoteState::Quoted, b'\n') => {
                line += 1;
                QuoteState::Quoted
            }
            (QuoteState::Quoted, _) => QuoteState::Quoted,

            (_, b'\n') => {
                line += 1;
                QuoteState::FieldStart
            }
            (_, b) if b == delimiter => QuoteState::FieldStart,

            (QuoteState::FieldStart, b'"') => {
                opened_at = line;
                QuoteState::Quoted
            }
            (QuoteState::FieldStart, b'\r') => QuoteState::FieldStart,
            (QuoteState::QuoteInQuoted, b'"') => QuoteState::Quoted,
            (QuoteState::QuoteInQuoted, b'\r') => QuoteState::QuoteInQuoted,
            _ => QuoteState::Unquoted,
        };
    }

    match state {
        QuoteState::Quoted => Err(DecodeError::at_line("引号字段未闭合", opened_at)),
        _ => Ok(()),
    }
}

// ==========================================
// CSV Decoder 实现
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CsvDecoder {
    delimiter: Delimiter,
}

impl CsvDecoder {
    pub fn new(delimiter: Delimiter) -> Self {
        Self { delimiter }
    }
}

impl TabularDecoder for CsvDecoder {
    fn decode(&self, raw_text: &str) -> Result<Vec<RawRow>, DecodeError> {
        let text = raw_text.strip_prefix('\u{feff}').unwrap_or(raw_text);
        if text.trim().is_empty() {
            return Err(DecodeError::new("文件为空，缺少表头行"));
        }

        let header_line = text.lines().next().unwrap_or_default();
        let delimiter = self.delimiter.resolve(header_line);
        check_quotes(text, delimiter)?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .delimiter(delimiter)
            .from_reader(text.as_bytes());

        // 读取表头（无名列不参与映射）
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut seen = HashSet::new();
        for header in headers.iter().filter(|h| !h.is_empty()) {
            if !seen.insert(header.as_str()) {
                return Err(DecodeError::at_line(format!("表头重复: {}", header), 1));
            }
        }
        if seen.is_empty() {
            return Err(DecodeError::at_line("表头行没有任何列名", 1));
        }

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut fields = HashMap::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx).filter(|h| !h.is_empty()) {
                    fields.insert(header.clone(), value.trim().to_string());
                }
            }

            // 跳过完全空白的行
            if fields.values().all(|v| v.is_empty()) {
                debug!(line = ?record.position().map(|p| p.line()), "跳过空白行");
                continue;
            }

            rows.push(RawRow::new(rows.len() + 2, fields));
        }

        info!(
            rows = rows.len(),
            columns = seen.len(),
            delimiter = %Delimiter::Fixed(delimiter),
            "文件解码完成"
        );
        Ok(rows)
    }
}

// ==========================================
// 文件入口守卫
// ==========================================

/// 检查扩展名是否在允许列表内（大小写不敏感，可带前导点）
pub fn check_file_extension(path: &Path, allowed: &[String]) -> ImportResult<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let accepted = allowed
        .iter()
        .any(|a| a.trim().trim_start_matches('.').eq_ignore_ascii_case(&extension));

    if accepted && !extension.is_empty() {
        Ok(())
    } else {
        Err(ImportError::UnsupportedFormat {
            extension,
            allowed: allowed.join(", "),
        })
    }
}

/// 读取源文件文本（先过扩展名守卫，再按 UTF-8 读取）
pub fn read_source_file(path: &Path, allowed: &[String]) -> ImportResult<String> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    check_file_extension(path, allowed)?;

    let bytes = std::fs::read(path)?;
    String::from_utf8(bytes).map_err(|e| {
        ImportError::FileReadError(format!(
            "{} 不是有效的 UTF-8 文本 (偏移 {})",
            path.display(),
            e.utf8_error().valid_up_to()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn decode(text: &str) -> Result<Vec<RawRow>, DecodeError> {
        CsvDecoder::default().decode(text)
    }

    #[test]
    fn test_rows_numbered_from_two() {
        let rows = decode("name,email\nAna,ana@example.com\nLuca,luca@example.org\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[1].row_number, 3);
        assert_eq!(rows[1].value("name"), Some("Luca"));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let rows = decode("name,email\r\nAna,a@x.io\r\n\r\n , \r\nLuca,l@x.io\r\n\r\n").unwrap();
        let numbers: Vec<usize> = rows.iter().map(|r| r.row_number).collect();
        assert_eq!(numbers, vec![2, 3]);
    }

    #[test]
    fn test_columns_matched_by_header() {
        let rows = decode("email,extra,name\na@x.io,keep me,Ana\n").unwrap();
        assert_eq!(rows[0].value("name"), Some("Ana"));
        assert_eq!(rows[0].value("extra"), Some("keep me"));
    }

    #[test]
    fn test_short_rows_tolerated() {
        let rows = decode("name,email,phone\nAna\n").unwrap();
        assert_eq!(rows[0].value("name"), Some("Ana"));
        assert_eq!(rows[0].value("phone"), None);
    }

    #[test]
    fn test_quoted_fields() {
        let rows = decode("name,notes\n\"García, Ana\",\"said \"\"hi\"\"\nthen left\"\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value("name"), Some("García, Ana"));
        assert_eq!(rows[0].value("notes"), Some("said \"hi\"\nthen left"));
    }

    #[test]
    fn test_unterminated_quote_fails() {
        let err = decode("name,notes\nAna,ok\nLuca,\"never closed\nBea,x\n").unwrap_err();
        assert_eq!(err.line, Some(3));
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(decode("").is_err());
        assert!(decode("\u{feff}\n\n").is_err());
    }

    #[test]
    fn test_header_only_yields_no_rows() {
        assert!(decode("name,email\n").unwrap().is_empty());
    }

    #[test]
    fn test_bom_stripped() {
        let rows = decode("\u{feff}name\nAna\n").unwrap();
        assert_eq!(rows[0].value("name"), Some("Ana"));
    }

    #[test]
    fn test_duplicate_headers_rejected() {
        let err = decode("name, name \nAna,Bea\n").unwrap_err();
        assert!(err.message.contains("name"));
    }

    #[test]
    fn test_auto_delimiter() {
        let decoder = CsvDecoder::new(Delimiter::Auto);
        let rows = decoder.decode("code;name;floor\nST-1;Studio Sol;2\n").unwrap();
        assert_eq!(rows[0].value("floor"), Some("2"));

        let rows = decoder.decode("code\tname\nST-1\tSol, Mar\n").unwrap();
        assert_eq!(rows[0].value("name"), Some("Sol, Mar"));
    }

    #[test]
    fn test_delimiter_parse() {
        assert_eq!(Delimiter::parse("auto"), Some(Delimiter::Auto));
        assert_eq!(Delimiter::parse("tab"), Some(Delimiter::Fixed(b'\t')));
        assert_eq!(Delimiter::parse("\t"), Some(Delimiter::Fixed(b'\t')));
        assert_eq!(Delimiter::parse(";"), Some(Delimiter::Fixed(b';')));
        assert_eq!(Delimiter::parse("#"), None);
        assert_eq!(detect_delimiter("a,b;c"), b',');
    }

    #[test]
    fn test_extension_guard() {
        let allowed = vec!["csv".to_string(), ".tsv".to_string()];
        assert!(check_file_extension(Path::new("leads.CSV"), &allowed).is_ok());
        assert!(check_file_extension(Path::new("leads.tsv"), &allowed).is_ok());
        assert!(matches!(
            check_file_extension(Path::new("leads.xlsx"), &allowed),
            Err(ImportError::UnsupportedFormat { .. })
        ));
        assert!(check_file_extension(Path::new("leads"), &allowed).is_err());
    }

    #[test]
    fn test_read_source_file() {
        let allowed = vec!["csv".to_string()];
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "name\nAna").unwrap();

        let text = read_source_file(file.path(), &allowed).unwrap();
        assert!(text.starts_with("name"));

        let missing = read_source_file(Path::new("/nonexistent/leads.csv"), &allowed);
        assert!(matches!(missing, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_read_rejects_non_utf8() {
        let allowed = vec!["csv".to_string()];
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(&[b'n', b'a', 0xff, 0xfe]).unwrap();

        let result = read_source_file(file.path(), &allowed);
        assert!(matches!(result, Err(ImportError::FileReadError(_))));
    }
}
