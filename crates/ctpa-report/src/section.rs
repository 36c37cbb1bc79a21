//! 印象段提取

use ctpa_core::SectionMarkers;

/// 提取报告印象段
///
/// 按标记列表顺序查找，第一个出现在文本中的标记生效，返回该标记首次出现位置之后的全部文本。
/// 没有任何标记出现时返回 `None`。
pub fn find_impression<'a>(text: &'a str, markers: &SectionMarkers) -> Option<&'a str> {
    markers
        .iter()
        .filter(|marker| !marker.is_empty())
        .find_map(|marker| text.find(marker).map(|start| &text[start + marker.len()..]))
}
