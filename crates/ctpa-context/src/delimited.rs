//! 分隔符文本读取
//!
//! 知识库词典（制表符）、分类规则和模式文件（逗号）共用同一套读取方式：
//! 支持引号字段，`#` 开头的行为注释，空行跳过，每行列数可以不同。

use csv::{Position, ReaderBuilder, StringRecord, Trim};
use ctpa_core::{CtpaError, Result};

/// 一行记录及其在资源中的行号（从1开始）
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Row {
    pub line: usize,
    pub cells: Vec<String>,
}

pub(crate) fn read_rows(resource: &str, content: &str, delimiter: u8) -> Result<Vec<Row>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    loop {
        match reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                let line = e.position().map(|p| line_of(content, p)).unwrap_or(0);
                return Err(CtpaError::parse(resource, line, e.to_string()));
            }
        }

        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(Row {
            line: record.position().map(|p| line_of(content, p)).unwrap_or(0),
            cells: record.iter().map(str::to_string).collect(),
        });
    }
    Ok(rows)
}

/// 记录起始行号
///
/// 读取器给出的位置停在上一条记录的结束处，其后被跳过的空行和注释行要补上。
fn line_of(content: &str, position: &Position) -> usize {
    let start = (position.byte() as usize).min(content.len());
    let mut line = 1 + content.as_bytes()[..start].iter().filter(|&&b| b == b'\n').count();
    for skipped in content[start..].split_inclusive('\n') {
        let trimmed = skipped.trim();
        if !(trimmed.is_empty() || skipped.starts_with('#')) {
            break;
        }
        line += 1;
    }
    line
}
