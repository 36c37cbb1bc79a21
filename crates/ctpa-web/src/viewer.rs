//! 标注渲染
//!
//! `render(index)` 是纯函数：只依赖分析结果和颜色映射，交互控件由调用方负责。

use ctpa_context::{AnalysisResult, ContextDocument, Tag, TagKind};
use ctpa_core::utils::escape_html;
use ctpa_core::{ColorMap, CtpaError, Result};
use serde::Serialize;

/// 一份报告的渲染产物
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedMarkup {
    pub graph: String, // Graphviz DOT
    pub html: String,  // 着色标注
}

/// 标注查看器
#[derive(Debug, Clone)]
pub struct MarkupViewer {
    results: Vec<AnalysisResult>,
    colors: ColorMap,
}

impl MarkupViewer {
    pub fn new(results: Vec<AnalysisResult>, colors: ColorMap) -> Self {
        Self { results, colors }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[AnalysisResult] {
        &self.results
    }

    pub fn result(&self, index: usize) -> Result<&AnalysisResult> {
        self.results.get(index).ok_or_else(|| {
            CtpaError::NotFound(format!("报告序号 {} 超出范围 [0, {})", index, self.results.len()))
        })
    }

    /// 渲染第 `index` 份报告
    pub fn render(&self, index: usize) -> Result<RenderedMarkup> {
        let result = self.result(index)?;
        Ok(RenderedMarkup {
            graph: markup_to_dot(&result.markup, &self.colors),
            html: markup_to_html(&result.markup, &self.colors),
        })
    }
}

fn tag_color<'a>(tag: &Tag, colors: &'a ColorMap) -> Option<&'a str> {
    tag.categories.iter().find_map(|c| colors.color_for(c))
}

fn dot_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// 标注图：节点为标记，边为 修饰词 → 目标
pub fn markup_to_dot(document: &ContextDocument, colors: &ColorMap) -> String {
    let mut dot = String::from("digraph markup {\n    rankdir=LR;\n    node [shape=box, fontname=\"Helvetica\"];\n");

    for sentence in &document.sentences {
        if sentence.tags.is_empty() {
            continue;
        }
        dot.push_str(&format!("    subgraph cluster_{} {{\n", sentence.index));
        dot.push_str(&format!("        label=\"sentence {}\";\n", sentence.index));
        for tag in &sentence.tags {
            let prefix = match tag.kind {
                TagKind::Target => 't',
                TagKind::Modifier => 'm',
            };
            let shape = match tag.kind {
                TagKind::Target => "ellipse",
                TagKind::Modifier => "box",
            };
            let label = format!("{}\\n[{}]", dot_escape(&tag.phrase), dot_escape(&tag.categories.join(", ")));
            let color = tag_color(tag, colors).unwrap_or("black");
            dot.push_str(&format!(
                "        {}{} [label=\"{}\", shape={}, color=\"{}\"];\n",
                prefix,
                tag.id,
                label,
                shape,
                dot_escape(color)
            ));
        }
        dot.push_str("    }\n");
        for edge in &sentence.edges {
            dot.push_str(&format!("    m{} -> t{};\n", edge.modifier, edge.target));
        }
    }

    dot.push_str("}\n");
    dot
}

/// 着色HTML：每个标记包成带类别和颜色的 `<span>`
pub fn markup_to_html(document: &ContextDocument, colors: &ColorMap) -> String {
    let mut html = String::from("<div class=\"markup\">\n");

    for sentence in &document.sentences {
        let mut tags: Vec<&Tag> = sentence.tags.iter().collect();
        tags.sort_by_key(|t| (t.start, t.end));

        let mut cursor = 0;
        let mut body = String::new();
        for tag in tags {
            if tag.start < cursor {
                continue;
            }
            body.push_str(&escape_html(&sentence.text[cursor..tag.start]));
            let class = tag.categories.join(" ");
            let style = tag_color(tag, colors)
                .map(|color| format!(" style=\"color:{}\"", escape_html(color)))
                .unwrap_or_default();
            body.push_str(&format!(
                "<span class=\"{}\"{}>{}</span>",
                escape_html(&class),
                style,
                escape_html(&sentence.text[tag.start..tag.end])
            ));
            cursor = tag.end;
        }
        body.push_str(&escape_html(&sentence.text[cursor..]));
        html.push_str(&format!("<p class=\"sentence\">{}</p>\n", body));
    }

    html.push_str("</div>\n");
    html
}
