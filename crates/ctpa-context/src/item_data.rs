//! 词典条目
//!
//! 修饰词词典和目标词词典共用同一种TSV格式：表头行 `Lex  Type  Regex  Direction`，
//! 多余的列忽略，`#` 开头的行为注释。

use std::fmt;

use ctpa_core::{CtpaError, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::delimited::read_rows;

/// 修饰方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemRule {
    Forward,       // 修饰其后的目标
    Backward,      // 修饰其前的目标
    Bidirectional, // 双向
    Terminate,     // 截断同类修饰范围
    Pseudo,        // 伪修饰，只占位不修饰
}

impl ItemRule {
    /// 解析方向列，空值视为双向，未知值返回 `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "bidirectional" => Some(ItemRule::Bidirectional),
            "forward" => Some(ItemRule::Forward),
            "backward" => Some(ItemRule::Backward),
            "terminate" => Some(ItemRule::Terminate),
            "pseudo" => Some(ItemRule::Pseudo),
            _ => None,
        }
    }

    /// 是否具有修饰范围
    pub fn has_scope(&self) -> bool {
        matches!(self, ItemRule::Forward | ItemRule::Backward | ItemRule::Bidirectional)
    }
}

impl fmt::Display for ItemRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRule::Forward => write!(f, "forward"),
            ItemRule::Backward => write!(f, "backward"),
            ItemRule::Bidirectional => write!(f, "bidirectional"),
            ItemRule::Terminate => write!(f, "terminate"),
            ItemRule::Pseudo => write!(f, "pseudo"),
        }
    }
}

/// 单个词典条目
#[derive(Debug, Clone)]
pub struct ContextItem {
    pub literal: String,
    pub categories: Vec<String>, // 已转为小写
    pub rule: ItemRule,
    regex: Regex,
}

impl ContextItem {
    /// 创建条目，`pattern` 为空时按字面量整词匹配
    pub fn new(literal: &str, category: &str, pattern: &str, rule: ItemRule) -> Result<Self> {
        let categories: Vec<String> = category
            .split(',')
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        if literal.trim().is_empty() {
            return Err(CtpaError::KnowledgeBase("词条字面量为空".to_string()));
        }
        if categories.is_empty() {
            return Err(CtpaError::KnowledgeBase(format!("词条 '{}' 缺少类别", literal)));
        }

        let regex = match compile_pattern(pattern) {
            Some(Ok(regex)) => regex,
            Some(Err(e)) => {
                warn!("词条 '{}' 的正则无法编译，改用字面量匹配: {}", literal, e);
                literal_regex(literal)?
            }
            None => literal_regex(literal)?,
        };

        Ok(Self {
            literal: literal.trim().to_string(),
            categories,
            rule,
            regex,
        })
    }

    /// 是否属于给定类别（大小写不敏感）
    pub fn is_a(&self, category: &str) -> bool {
        let category = category.to_lowercase();
        self.categories.iter().any(|c| *c == category)
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

fn compile_pattern(pattern: &str) -> Option<std::result::Result<Regex, regex::Error>> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return None;
    }
    Some(RegexBuilder::new(pattern).case_insensitive(true).build())
}

fn literal_regex(literal: &str) -> Result<Regex> {
    let literal = literal.trim();
    let leading = if starts_with_word_char(literal) { r"\b" } else { "" };
    let trailing = if ends_with_word_char(literal) { r"\b" } else { "" };
    let pattern = format!("{}{}{}", leading, regex::escape(literal), trailing);
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| CtpaError::KnowledgeBase(format!("无法编译词条 '{}': {}", literal, e)))
}

fn starts_with_word_char(text: &str) -> bool {
    text.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_')
}

fn ends_with_word_char(text: &str) -> bool {
    text.chars().last().is_some_and(|c| c.is_alphanumeric() || c == '_')
}

/// 词典：条目的有序集合
#[derive(Debug, Clone, Default)]
pub struct ItemData {
    items: Vec<ContextItem>,
}

impl ItemData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: ContextItem) {
        self.items.push(item);
    }

    pub fn extend(&mut self, other: ItemData) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContextItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 解析TSV词典
    pub fn from_tsv(resource: &str, content: &str) -> Result<Self> {
        let mut data = ItemData::new();
        let mut columns = Columns::default();
        let mut header_seen = false;

        for row in read_rows(resource, content, b'\t')? {
            let line_no = row.line;
            let cells: Vec<&str> = row.cells.iter().map(String::as_str).collect();

            if !header_seen {
                header_seen = true;
                if let Some(header) = Columns::from_header(&cells) {
                    columns = header;
                    continue;
                }
            }

            let literal = cells.get(columns.literal).copied().unwrap_or_default();
            let category = cells.get(columns.category).copied().unwrap_or_default();
            if literal.is_empty() || category.is_empty() {
                return Err(CtpaError::parse(resource, line_no, "缺少词条或类别列"));
            }
            let pattern = cells.get(columns.regex).copied().unwrap_or_default();
            let direction = cells.get(columns.direction).copied().unwrap_or_default();
            let rule = ItemRule::parse(direction).unwrap_or_else(|| {
                warn!("{} 第{}行: 未知方向 '{}'，按双向处理", resource, line_no, direction);
                ItemRule::Bidirectional
            });

            let item = ContextItem::new(literal, category, pattern, rule)
                .map_err(|e| CtpaError::parse(resource, line_no, e.to_string()))?;
            data.push(item);
        }

        debug!("Loaded {} items from {}", data.len(), resource);
        Ok(data)
    }
}

/// TSV列位置
#[derive(Debug, Clone, Copy)]
struct Columns {
    literal: usize,
    category: usize,
    regex: usize,
    direction: usize,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            literal: 0,
            category: 1,
            regex: 2,
            direction: 3,
        }
    }
}

impl Columns {
    fn from_header(cells: &[&str]) -> Option<Self> {
        let position = |names: &[&str]| {
            cells
                .iter()
                .position(|cell| names.iter().any(|name| cell.eq_ignore_ascii_case(name)))
        };
        let literal = position(&["Lex", "Literal"])?;
        let category = position(&["Type", "Category"])?;
        let defaults = Columns::default();
        Some(Self {
            literal,
            category,
            regex: position(&["Regex"]).unwrap_or(defaults.regex),
            direction: position(&["Direction", "Rule"]).unwrap_or(defaults.direction),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEXICAL: &str = "Lex\tType\tRegex\tDirection\tCodes\n\
# 注释行\n\
no\tDEFINITE_NEGATED_EXISTENCE\t\tforward\t\n\
are ruled out\tDEFINITE_NEGATED_EXISTENCE\t\tbackward\n\
but\tCONJ\t\tterminate\n\
history of\tHISTORICAL\t\\bhistory\\s+of\\b\tforward\n";

    #[test]
    fn test_parse_lexical_kb() {
        let data = ItemData::from_tsv("lexical.tsv", LEXICAL).unwrap();
        assert_eq!(data.len(), 4);

        let items: Vec<&ContextItem> = data.iter().collect();
        assert_eq!(items[0].literal, "no");
        assert!(items[0].is_a("DEFINITE_NEGATED_EXISTENCE"));
        assert_eq!(items[0].rule, ItemRule::Forward);
        assert_eq!(items[1].rule, ItemRule::Backward);
        assert_eq!(items[2].rule, ItemRule::Terminate);
        assert!(items[3].regex().is_match("History  of PE"));
    }

    #[test]
    fn test_literal_matches_whole_words_only() {
        let item = ContextItem::new("no", "definite_negated_existence", "", ItemRule::Forward).unwrap();
        assert!(item.regex().is_match("No evidence"));
        assert!(!item.regex().is_match("nodule"));
    }

    #[test]
    fn test_multiple_categories() {
        let item = ContextItem::new("rule out", "INDICATION, PROBABLE_EXISTENCE", "", ItemRule::Forward).unwrap();
        assert!(item.is_a("indication"));
        assert!(item.is_a("probable_existence"));
    }

    #[test]
    fn test_invalid_regex_falls_back_to_literal() {
        let item = ContextItem::new("clot", "pe", "(?<=a)clot", ItemRule::Bidirectional).unwrap();
        assert!(item.regex().is_match("a large clot"));
    }

    #[test]
    fn test_headerless_positional_columns() {
        let data = ItemData::from_tsv("targets.tsv", "pulmonary embolism\tPULMONARY_EMBOLISM\t\t\n").unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data.iter().next().unwrap().rule, ItemRule::Bidirectional);
    }

    #[test]
    fn test_quoted_cells_are_unquoted() {
        let data = ItemData::from_tsv(
            "lexical.tsv",
            "Lex\tType\tRegex\tDirection\n\"no\"\tDEFINITE_NEGATED_EXISTENCE\t\"\"\tforward\n",
        )
        .unwrap();
        let item = data.iter().next().unwrap();
        assert_eq!(item.literal, "no");
        assert!(item.regex().is_match("No embolus"));
    }

    #[test]
    fn test_missing_category_is_parse_error() {
        let err = ItemData::from_tsv("bad.tsv", "Lex\tType\nembolus\t\n").unwrap_err();
        assert!(matches!(err, CtpaError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_unknown_direction_defaults_to_bidirectional() {
        let data = ItemData::from_tsv("kb.tsv", "Lex\tType\tRegex\tDirection\nmaybe\tPROBABLE_EXISTENCE\t\tsideways\n").unwrap();
        assert_eq!(data.iter().next().unwrap().rule, ItemRule::Bidirectional);
    }
}
