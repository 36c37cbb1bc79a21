//! 上下文标注
//!
//! 逐句标记目标词与修饰词，根据修饰方向和截断词计算修饰范围，
//! 范围内的目标与修饰词之间建立一条边。

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::item_data::{ContextItem, ItemData, ItemRule};
use crate::sentence::split_sentences;

/// 标记类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Target,
    Modifier,
}

/// 句子中的一个标记
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: usize,               // 文档内唯一
    pub kind: TagKind,
    pub categories: Vec<String>,
    pub literal: String,         // 命中的词条
    pub phrase: String,          // 原文中的命中片段
    pub start: usize,            // 句内字节偏移
    pub end: usize,
    pub rule: ItemRule,
}

impl Tag {
    pub fn is_a(&self, category: &str) -> bool {
        let category = category.to_lowercase();
        self.categories.iter().any(|c| *c == category)
    }

    fn len(&self) -> usize {
        self.end - self.start
    }

    fn covers(&self, other: &Tag) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    fn overlaps(&self, other: &Tag) -> bool {
        self.start < other.end && other.start < self.end
    }

    fn shares_category(&self, other: &Tag) -> bool {
        self.categories.iter().any(|c| other.is_a(c))
    }
}

/// 修饰边：修饰词 → 目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub modifier: usize,
    pub target: usize,
}

/// 标注后的句子
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedSentence {
    pub index: usize,
    pub offset: usize, // 在报告中的字节偏移
    pub text: String,
    pub tags: Vec<Tag>,
    pub edges: Vec<Edge>,
}

impl TaggedSentence {
    pub fn targets(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(|t| t.kind == TagKind::Target)
    }

    pub fn modifiers(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(|t| t.kind == TagKind::Modifier)
    }

    pub fn tag(&self, id: usize) -> Option<&Tag> {
        self.tags.iter().find(|t| t.id == id)
    }

    /// 修饰某个目标的全部修饰词
    pub fn modifiers_of(&self, target_id: usize) -> impl Iterator<Item = &Tag> + '_ {
        self.edges
            .iter()
            .filter(move |edge| edge.target == target_id)
            .filter_map(|edge| self.tag(edge.modifier))
    }
}

/// 整份报告的标注结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextDocument {
    pub sentences: Vec<TaggedSentence>,
}

impl ContextDocument {
    pub fn target_count(&self) -> usize {
        self.sentences.iter().map(|s| s.targets().count()).sum()
    }

    pub fn edge_count(&self) -> usize {
        self.sentences.iter().map(|s| s.edges.len()).sum()
    }
}

/// 对报告做上下文标注
pub fn mark_report(text: &str, modifiers: &ItemData, targets: &ItemData) -> ContextDocument {
    let mut next_id = 0;
    let sentences: Vec<TaggedSentence> = split_sentences(text)
        .into_iter()
        .enumerate()
        .map(|(index, (offset, sentence))| {
            mark_sentence(index, offset, sentence, modifiers, targets, &mut next_id)
        })
        .collect();

    let document = ContextDocument { sentences };
    debug!(
        "Marked {} sentences, {} targets, {} edges",
        document.sentences.len(),
        document.target_count(),
        document.edge_count()
    );
    document
}

fn mark_sentence(
    index: usize,
    offset: usize,
    sentence: &str,
    modifiers: &ItemData,
    targets: &ItemData,
    next_id: &mut usize,
) -> TaggedSentence {
    let found_targets = prune_covered(find_tags(sentence, targets, TagKind::Target));
    // 与目标有任何重叠的修饰词都丢弃，部分重叠也一样
    let found_modifiers: Vec<Tag> = prune_covered(find_tags(sentence, modifiers, TagKind::Modifier))
        .into_iter()
        .filter(|m| !found_targets.iter().any(|t| t.overlaps(m)))
        .collect();

    let mut tags: Vec<Tag> = found_targets.into_iter().chain(found_modifiers).collect();
    tags.sort_by_key(|t| (t.start, t.end));
    for tag in &mut tags {
        tag.id = *next_id;
        *next_id += 1;
    }

    let edges = build_edges(&tags, sentence.len());
    TaggedSentence {
        index,
        offset,
        text: sentence.to_string(),
        tags,
        edges,
    }
}

fn find_tags(sentence: &str, items: &ItemData, kind: TagKind) -> Vec<Tag> {
    items
        .iter()
        .flat_map(|item| item_matches(sentence, item, kind))
        .collect()
}

fn item_matches(sentence: &str, item: &ContextItem, kind: TagKind) -> Vec<Tag> {
    item.regex()
        .find_iter(sentence)
        .filter(|m| !m.as_str().is_empty())
        .map(|m| Tag {
            id: 0,
            kind,
            categories: item.categories.clone(),
            literal: item.literal.clone(),
            phrase: m.as_str().to_string(),
            start: m.start(),
            end: m.end(),
            rule: item.rule,
        })
        .collect()
}

/// 去掉被更长标记覆盖的标记；同一范围只保留先出现的词条
fn prune_covered(tags: Vec<Tag>) -> Vec<Tag> {
    let mut kept: Vec<Tag> = Vec::with_capacity(tags.len());
    let mut ordered = tags;
    ordered.sort_by(|a, b| b.len().cmp(&a.len()).then(a.start.cmp(&b.start)));
    for tag in ordered {
        if !kept.iter().any(|k| k.covers(&tag)) {
            kept.push(tag);
        }
    }
    kept
}

/// 计算修饰范围并连边
fn build_edges(tags: &[Tag], sentence_len: usize) -> Vec<Edge> {
    let mut edges = Vec::new();
    for modifier in tags.iter().filter(|t| t.kind == TagKind::Modifier && t.rule.has_scope()) {
        let (scope_start, scope_end) = scope_of(modifier, tags, sentence_len);
        for target in tags.iter().filter(|t| t.kind == TagKind::Target) {
            if target.start >= scope_start && target.end <= scope_end {
                edges.push(Edge {
                    modifier: modifier.id,
                    target: target.id,
                });
            }
        }
    }
    edges
}

fn scope_of(modifier: &Tag, tags: &[Tag], sentence_len: usize) -> (usize, usize) {
    let terminators: Vec<&Tag> = tags
        .iter()
        .filter(|t| {
            t.kind == TagKind::Modifier
                && t.rule == ItemRule::Terminate
                && (t.shares_category(modifier) || t.is_a("conj"))
        })
        .collect();

    let forward_end = terminators
        .iter()
        .filter(|t| t.start >= modifier.end)
        .map(|t| t.start)
        .min()
        .unwrap_or(sentence_len);
    let backward_start = terminators
        .iter()
        .filter(|t| t.end <= modifier.start)
        .map(|t| t.end)
        .max()
        .unwrap_or(0);

    match modifier.rule {
        ItemRule::Forward => (modifier.end, forward_end),
        ItemRule::Backward => (backward_start, modifier.start),
        _ => (backward_start, forward_end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modifiers() -> ItemData {
        ItemData::from_tsv(
            "lexical.tsv",
            "Lex\tType\tRegex\tDirection\n\
no\tDEFINITE_NEGATED_EXISTENCE\t\tforward\n\
is ruled out\tDEFINITE_NEGATED_EXISTENCE\t\tbackward\n\
possible\tPROBABLE_EXISTENCE\t\tbidirectional\n\
but\tCONJ\t\tterminate\n\
no change\tPSEUDONEG\t\tpseudo\n",
        )
        .unwrap()
    }

    fn targets() -> ItemData {
        ItemData::from_tsv(
            "targets.tsv",
            "Lex\tType\tRegex\tDirection\n\
pulmonary embolism\tPULMONARY_EMBOLISM\tpulmonary\\s+(embolism|embolus|emboli)\t\n\
embolus\tPULMONARY_EMBOLISM\t\t\n\
pneumonia\tPNEUMONIA\t\t\n",
        )
        .unwrap()
    }

    #[test]
    fn test_forward_negation() {
        let doc = mark_report("No pulmonary embolism.", &modifiers(), &targets());
        assert_eq!(doc.sentences.len(), 1);

        let sentence = &doc.sentences[0];
        let target = sentence.targets().next().unwrap();
        assert_eq!(target.phrase, "pulmonary embolism");
        let mods: Vec<&Tag> = sentence.modifiers_of(target.id).collect();
        assert_eq!(mods.len(), 1);
        assert!(mods[0].is_a("definite_negated_existence"));
    }

    #[test]
    fn test_longer_target_covers_shorter() {
        let doc = mark_report("Large pulmonary embolus in the right lobe.", &modifiers(), &targets());
        let targets: Vec<&Tag> = doc.sentences[0].targets().collect();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].phrase, "pulmonary embolus");
    }

    #[test]
    fn test_backward_negation() {
        let doc = mark_report("Pulmonary embolism is ruled out.", &modifiers(), &targets());
        let sentence = &doc.sentences[0];
        let target = sentence.targets().next().unwrap();
        assert_eq!(sentence.modifiers_of(target.id).count(), 1);
    }

    #[test]
    fn test_terminate_limits_scope() {
        let doc = mark_report("No pneumonia but pulmonary embolism present.", &modifiers(), &targets());
        let sentence = &doc.sentences[0];
        let modified: Vec<&str> = sentence
            .targets()
            .filter(|t| sentence.modifiers_of(t.id).count() > 0)
            .map(|t| t.phrase.as_str())
            .collect();
        assert_eq!(modified, vec!["pneumonia"]);
    }

    fn lexicon(rows: &str) -> ItemData {
        ItemData::from_tsv("lexical.tsv", &format!("Lex\tType\tRegex\tDirection\n{}", rows)).unwrap()
    }

    fn modified_targets(sentence: &TaggedSentence) -> Vec<&str> {
        sentence
            .targets()
            .filter(|t| sentence.modifiers_of(t.id).count() > 0)
            .map(|t| t.phrase.as_str())
            .collect()
    }

    #[test]
    fn test_same_category_terminate_limits_scope() {
        let modifiers = lexicon(
            "no\tDEFINITE_NEGATED_EXISTENCE\t\tforward\n\
except\tDEFINITE_NEGATED_EXISTENCE\t\tterminate\n",
        );
        let doc = mark_report("No pneumonia except pulmonary embolism.", &modifiers, &targets());
        assert_eq!(modified_targets(&doc.sentences[0]), vec!["pneumonia"]);
    }

    #[test]
    fn test_other_category_terminate_does_not_limit_scope() {
        let modifiers = lexicon(
            "no\tDEFINITE_NEGATED_EXISTENCE\t\tforward\n\
aside from\tHISTORICAL\t\tterminate\n",
        );
        let doc = mark_report("No pneumonia aside from pulmonary embolism.", &modifiers, &targets());
        assert_eq!(
            modified_targets(&doc.sentences[0]),
            vec!["pneumonia", "pulmonary embolism"]
        );
    }

    #[test]
    fn test_conj_terminate_limits_every_scope() {
        let modifiers = lexicon(
            "possible\tPROBABLE_EXISTENCE\t\tbackward\n\
but\tCONJ\t\tterminate\n",
        );
        let doc = mark_report("Pneumonia but pulmonary embolism possible.", &modifiers, &targets());
        assert_eq!(modified_targets(&doc.sentences[0]), vec!["pulmonary embolism"]);
    }

    #[test]
    fn test_modifier_partly_overlapping_target_is_dropped() {
        let modifiers = lexicon("acute pulmonary\tACUTE\t\tforward\n");
        let doc = mark_report("Acute pulmonary embolism.", &modifiers, &targets());
        let sentence = &doc.sentences[0];
        assert_eq!(sentence.targets().count(), 1);
        assert_eq!(sentence.modifiers().count(), 0);
        assert!(sentence.edges.is_empty());
    }

    #[test]
    fn test_scope_does_not_cross_sentences() {
        let doc = mark_report("No pneumonia. Pulmonary embolism in left artery.", &modifiers(), &targets());
        assert_eq!(doc.sentences.len(), 2);
        assert_eq!(doc.sentences[1].edges.len(), 0);
        assert_eq!(doc.edge_count(), 1);
    }

    #[test]
    fn test_pseudo_modifier_has_no_scope() {
        let doc = mark_report("No change in pneumonia.", &modifiers(), &targets());
        let sentence = &doc.sentences[0];
        // "no change" 覆盖 "no"，且伪修饰不产生边
        assert_eq!(sentence.modifiers().count(), 1);
        assert_eq!(sentence.edges.len(), 0);
    }

    #[test]
    fn test_bidirectional_modifier() {
        let doc = mark_report("Pneumonia possible.", &modifiers(), &targets());
        assert_eq!(doc.edge_count(), 1);
    }

    #[test]
    fn test_tag_ids_unique_across_document() {
        let doc = mark_report("No pneumonia. No embolus.", &modifiers(), &targets());
        let mut ids: Vec<usize> = doc
            .sentences
            .iter()
            .flat_map(|s| s.tags.iter().map(|t| t.id))
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
        assert_eq!(total, 4);
    }
}
