//! 分类规则
//!
//! 规则文件为逗号分隔的文本，每行以规则类型开头：
//!
//! ```text
//! @CLASSIFICATION_RULE,DISEASE_STATE_RULE,0,DEFINITE_NEGATED_EXISTENCE,PROBABLE_NEGATED_EXISTENCE
//! @CATEGORY_RULE,PULMONARY_EMBOLISM,PE,SADDLE_EMBOLUS
//! @SEVERITY_RULE,PULMONARY_EMBOLISM,LARGE,MASSIVE
//! ```

use std::collections::BTreeMap;

use ctpa_core::{CtpaError, Result};
use tracing::{debug, warn};

use crate::delimited::read_rows;
use crate::schema::StateVariable;

/// 单条状态规则：命中任一修饰类别时状态取 `value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRule {
    pub value: i64,
    pub modifier_categories: Vec<String>,
}

/// 分类规则集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationRules {
    state_rules: BTreeMap<StateVariable, Vec<StateRule>>,
    category_aliases: BTreeMap<String, String>, // 目标类别 → 归并后的类别
    severity_rules: BTreeMap<String, Vec<String>>,
}

impl ClassificationRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// 某个状态变量的规则，按文件顺序
    pub fn state_rules(&self, variable: StateVariable) -> &[StateRule] {
        self.state_rules.get(&variable).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 目标类别归并；没有归并规则时返回原类别
    pub fn resolve_category<'a>(&'a self, category: &'a str) -> &'a str {
        self.category_aliases
            .get(category)
            .map(String::as_str)
            .unwrap_or(category)
    }

    /// 某个目标类别关注的严重程度修饰类别
    pub fn severity_categories(&self, target_category: &str) -> &[String] {
        self.severity_rules
            .get(target_category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.state_rules.is_empty() && self.category_aliases.is_empty() && self.severity_rules.is_empty()
    }

    /// 解析规则文件
    pub fn from_csv(resource: &str, content: &str) -> Result<Self> {
        let mut rules = ClassificationRules::new();

        for row in read_rows(resource, content, b',')? {
            let line_no = row.line;
            let cells: Vec<String> = row.cells.into_iter().filter(|c| !c.is_empty()).collect();

            let Some(kind) = cells.first() else {
                continue;
            };

            match kind.to_uppercase().as_str() {
                "@CLASSIFICATION_RULE" => {
                    let [_, state, value, categories @ ..] = cells.as_slice() else {
                        return Err(CtpaError::parse(resource, line_no, "分类规则至少需要状态名和取值"));
                    };
                    let variable = StateVariable::from_rule_name(state).ok_or_else(|| {
                        CtpaError::parse(resource, line_no, format!("未知状态规则 '{}'", state))
                    })?;
                    let value: i64 = value.parse().map_err(|_| {
                        CtpaError::parse(resource, line_no, format!("状态值 '{}' 不是整数", value))
                    })?;
                    rules.state_rules.entry(variable).or_default().push(StateRule {
                        value,
                        modifier_categories: lowercase_all(categories),
                    });
                }
                "@CATEGORY_RULE" => {
                    let [_, alias, members @ ..] = cells.as_slice() else {
                        return Err(CtpaError::parse(resource, line_no, "类别规则缺少类别名"));
                    };
                    let alias = alias.to_lowercase();
                    for member in lowercase_all(members) {
                        rules.category_aliases.insert(member, alias.clone());
                    }
                }
                "@SEVERITY_RULE" => {
                    let [_, target, categories @ ..] = cells.as_slice() else {
                        return Err(CtpaError::parse(resource, line_no, "严重程度规则缺少目标类别"));
                    };
                    rules
                        .severity_rules
                        .entry(target.to_lowercase())
                        .or_default()
                        .extend(lowercase_all(categories));
                }
                other => {
                    warn!("{} 第{}行: 忽略未知规则类型 '{}'", resource, line_no, other);
                }
            }
        }

        debug!(
            "Loaded classification rules from {}: {} state variables, {} category aliases",
            resource,
            rules.state_rules.len(),
            rules.category_aliases.len()
        );
        Ok(rules)
    }
}

fn lowercase_all(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}
