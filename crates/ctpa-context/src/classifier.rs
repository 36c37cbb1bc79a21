//! 文档分类
//!
//! 对每个目标计算三个状态（默认都为1），再用分类模式得到分类值；
//! 同一目标类别取分类值最大的目标作为证据。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::markup::{ContextDocument, Tag, TaggedSentence};
use crate::rules::ClassificationRules;
use crate::schema::{Schema, StateVariable};

/// 单个目标的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetStates {
    pub disease: i64,
    pub certainty: i64,
    pub acute: i64,
}

impl Default for TargetStates {
    fn default() -> Self {
        Self {
            disease: 1,
            certainty: 1,
            acute: 1,
        }
    }
}

impl TargetStates {
    pub fn get(&self, variable: StateVariable) -> i64 {
        match variable {
            StateVariable::Disease => self.disease,
            StateVariable::Certainty => self.certainty,
            StateVariable::Acute => self.acute,
        }
    }

    fn set(&mut self, variable: StateVariable, value: i64) {
        match variable {
            StateVariable::Disease => self.disease = value,
            StateVariable::Certainty => self.certainty = value,
            StateVariable::Acute => self.acute = value,
        }
    }
}

/// 某个目标类别的分类结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetClassification {
    pub category: String,
    pub schema_value: i64,
    pub label: String,
    pub states: TargetStates,
    pub evidence: String,         // 证据目标的原文片段
    pub sentence: usize,          // 证据所在句子
    pub modifiers: Vec<String>,   // 证据目标上的修饰类别
    pub severity: Vec<String>,    // 严重程度修饰片段
}

/// 文档分类：目标类别 → 分类结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentClassification(BTreeMap<String, TargetClassification>);

impl DocumentClassification {
    pub fn get(&self, category: &str) -> Option<&TargetClassification> {
        self.0.get(&category.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetClassification> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 计算目标状态
pub fn target_states(sentence: &TaggedSentence, target: &Tag, rules: &ClassificationRules) -> TargetStates {
    let modifiers: Vec<&Tag> = sentence.modifiers_of(target.id).collect();
    let mut states = TargetStates::default();

    for variable in StateVariable::ALL {
        let matched = rules.state_rules(variable).iter().find(|rule| {
            modifiers
                .iter()
                .any(|m| rule.modifier_categories.iter().any(|c| m.is_a(c)))
        });
        if let Some(rule) = matched {
            states.set(variable, rule.value);
        }
    }
    states
}

/// 对标注结果做文档级分类
pub fn classify_document_targets(
    document: &ContextDocument,
    rules: &ClassificationRules,
    schema: &Schema,
) -> DocumentClassification {
    let mut results: BTreeMap<String, TargetClassification> = BTreeMap::new();

    for sentence in &document.sentences {
        for target in sentence.targets() {
            let states = target_states(sentence, target, rules);
            let Some(entry) = schema.assign(&|var| states.get(var)) else {
                debug!("目标 '{}' 不匹配任何模式行", target.phrase);
                continue;
            };

            for raw_category in &target.categories {
                let category = rules.resolve_category(raw_category).to_string();
                let replace = results
                    .get(&category)
                    .map_or(true, |current| entry.value > current.schema_value);
                if !replace {
                    continue;
                }

                let modifiers: Vec<&Tag> = sentence.modifiers_of(target.id).collect();
                let severity_categories = rules.severity_categories(&category);
                let severity = modifiers
                    .iter()
                    .filter(|m| severity_categories.iter().any(|c| m.is_a(c)))
                    .map(|m| m.phrase.clone())
                    .collect();
                let mut modifier_categories: Vec<String> =
                    modifiers.iter().flat_map(|m| m.categories.iter().cloned()).collect();
                modifier_categories.sort();
                modifier_categories.dedup();

                trace!("{} <- '{}' ({})", category, target.phrase, entry.value);
                results.insert(
                    category.clone(),
                    TargetClassification {
                        category,
                        schema_value: entry.value,
                        label: entry.label.clone(),
                        states,
                        evidence: target.phrase.clone(),
                        sentence: sentence.index,
                        modifiers: modifier_categories,
                        severity,
                    },
                );
            }
        }
    }

    DocumentClassification(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item_data::ItemData;
    use crate::markup::mark_report;

    fn fixtures() -> (ItemData, ItemData, ClassificationRules, Schema) {
        let modifiers = ItemData::from_tsv(
            "lexical.tsv",
            "Lex\tType\tRegex\tDirection\n\
no\tDEFINITE_NEGATED_EXISTENCE\t\tforward\n\
possible\tPROBABLE_EXISTENCE\t\tforward\n\
old\tHISTORICAL\t\tforward\n\
large\tLARGE\t\tforward\n",
        )
        .unwrap();
        let targets = ItemData::from_tsv(
            "targets.tsv",
            "Lex\tType\tRegex\tDirection\n\
pulmonary embolism\tPULMONARY_EMBOLISM\t\t\n\
saddle embolus\tSADDLE_EMBOLUS\t\t\n\
pneumonia\tPNEUMONIA\t\t\n",
        )
        .unwrap();
        let rules = ClassificationRules::from_csv(
            "rules.csv",
            "@CLASSIFICATION_RULE,DISEASE_STATE_RULE,0,DEFINITE_NEGATED_EXISTENCE\n\
@CLASSIFICATION_RULE,CERTAINTY_STATE_RULE,0,PROBABLE_EXISTENCE\n\
@CLASSIFICATION_RULE,ACUTE_STATE_RULE,0,HISTORICAL\n\
@CATEGORY_RULE,PULMONARY_EMBOLISM,SADDLE_EMBOLUS\n\
@SEVERITY_RULE,PULMONARY_EMBOLISM,LARGE\n",
        )
        .unwrap();
        let schema = Schema::from_csv(
            "schema.csv",
            "1,Negative,DISEASE_STATE == 0\n\
2,Positive/Uncertain,DISEASE_STATE == 1 and CERTAINTY_STATE == 0\n\
3,Positive/Chronic,DISEASE_STATE == 1 and ACUTE_STATE == 0\n\
4,Positive/Acute,DISEASE_STATE == 1 and CERTAINTY_STATE == 1 and ACUTE_STATE == 1\n",
        )
        .unwrap();
        (modifiers, targets, rules, schema)
    }

    fn classify(text: &str) -> DocumentClassification {
        let (modifiers, targets, rules, schema) = fixtures();
        let document = mark_report(text, &modifiers, &targets);
        classify_document_targets(&document, &rules, &schema)
    }

    #[test]
    fn test_negated_target() {
        let result = classify("No pulmonary embolism.");
        let pe = result.get("pulmonary_embolism").unwrap();
        assert_eq!(pe.schema_value, 1);
        assert_eq!(pe.states.disease, 0);
        assert_eq!(pe.modifiers, vec!["definite_negated_existence"]);
    }

    #[test]
    fn test_unmodified_target_is_positive_acute() {
        let result = classify("Pneumonia in the left lower lobe.");
        assert_eq!(result.get("pneumonia").unwrap().label, "Positive/Acute");
    }

    #[test]
    fn test_max_value_wins_across_sentences() {
        let result = classify("No pulmonary embolism in the right. Pulmonary embolism in the left.");
        let pe = result.get("pulmonary_embolism").unwrap();
        assert_eq!(pe.schema_value, 4);
        assert_eq!(pe.sentence, 1);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_category_alias_and_severity() {
        let result = classify("Large saddle embolus.");
        let pe = result.get("PULMONARY_EMBOLISM").unwrap();
        assert_eq!(pe.evidence, "saddle embolus");
        assert_eq!(pe.severity, vec!["Large"]);
        assert!(result.get("saddle_embolus").is_none());
    }

    #[test]
    fn test_historical_and_uncertain_states() {
        let result = classify("Old pulmonary embolism. Possible pneumonia.");
        assert_eq!(result.get("pulmonary_embolism").unwrap().schema_value, 3);
        assert_eq!(result.get("pneumonia").unwrap().schema_value, 2);
    }

    #[test]
    fn test_no_targets_gives_empty_classification() {
        assert!(classify("Lungs are clear.").is_empty());
    }
}
