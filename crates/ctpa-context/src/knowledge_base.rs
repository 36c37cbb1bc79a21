//! 知识库：修饰词、目标词、分类规则、分类模式

use ctpa_core::{AnalysisOptions, CtpaError, Result};
use tracing::info;

use crate::item_data::ItemData;
use crate::resource::fetch_resource;
use crate::rules::ClassificationRules;
use crate::schema::Schema;

/// 分析一份报告所需的全部知识
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    pub modifiers: ItemData,
    pub targets: ItemData,
    pub rules: ClassificationRules,
    pub schema: Schema,
}

impl KnowledgeBase {
    /// 按配置读取全部资源
    pub async fn load(options: &AnalysisOptions) -> Result<Self> {
        if options.lexical_kb.is_empty() || options.domain_kb.is_empty() {
            return Err(CtpaError::Config("至少需要一个修饰词词典和一个目标词词典".to_string()));
        }

        let rules = ClassificationRules::from_csv(&options.rules, &fetch_resource(&options.rules).await?)?;
        let schema = Schema::from_csv(&options.schema, &fetch_resource(&options.schema).await?)?;

        let mut modifiers = ItemData::new();
        for location in &options.lexical_kb {
            modifiers.extend(ItemData::from_tsv(location, &fetch_resource(location).await?)?);
        }
        let mut targets = ItemData::new();
        for location in &options.domain_kb {
            targets.extend(ItemData::from_tsv(location, &fetch_resource(location).await?)?);
        }

        let kb = Self {
            modifiers,
            targets,
            rules,
            schema,
        };
        info!(
            "知识库加载完成: {} 个修饰词, {} 个目标词, {} 条模式",
            kb.modifiers.len(),
            kb.targets.len(),
            kb.schema.len()
        );
        Ok(kb)
    }

    /// 由已读入的文本直接构造
    pub fn from_sources(lexical_tsv: &str, domain_tsv: &str, rules_csv: &str, schema_csv: &str) -> Result<Self> {
        Ok(Self {
            modifiers: ItemData::from_tsv("lexical_kb", lexical_tsv)?,
            targets: ItemData::from_tsv("domain_kb", domain_tsv)?,
            rules: ClassificationRules::from_csv("rules", rules_csv)?,
            schema: Schema::from_csv("schema", schema_csv)?,
        })
    }
}
