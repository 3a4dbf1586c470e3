use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use crate::error::Result;
use crate::render::dom::escape_text;

/// Vocabulary definition shown in a tooltip
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TooltipEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Older data files use `definition` instead of `description`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(rename = "Image Description", default, skip_serializing_if = "Option::is_none")]
    pub image_description: Option<String>,
}

impl TooltipEntry {
    pub fn with_description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    /// Description, falling back to the legacy definition field
    pub fn text(&self) -> Option<&str> {
        self.description.as_deref().or(self.definition.as_deref())
    }

    /// Popover body markup
    pub fn to_html(&self, id: &str) -> String {
        let mut html = String::from("<div class=\"tooltip-content\">");

        let title = self.title.as_deref().unwrap_or(id);
        html.push_str(&format!("<strong class=\"tooltip-title\">{}</strong>", escape_text(title)));
        if let Some(pos) = &self.part_of_speech {
            html.push_str(&format!(" <em class=\"tooltip-pos\">{}</em>", escape_text(pos)));
        }
        if let Some(text) = self.text() {
            html.push_str(&format!("<p class=\"tooltip-description\">{}</p>", escape_text(text)));
        }
        if let Some(example) = &self.example {
            html.push_str(&format!("<p class=\"tooltip-example\">{}</p>", escape_text(example)));
        }
        if let Some(category) = &self.category {
            html.push_str(&format!("<span class=\"tooltip-category\">{}</span>", escape_text(category)));
        }
        if let Some(image) = &self.image_description {
            html.push_str(&format!("<p class=\"tooltip-image\">{}</p>", escape_text(image)));
        }

        html.push_str("</div>");
        html
    }
}

/// Tooltip entries keyed by lowercase id
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TooltipTable {
    entries: HashMap<String, TooltipEntry>,
}

impl TooltipTable {
    /// Parse a tooltip JSON object, lowercasing every id
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, TooltipEntry> = serde_json::from_str(json)?;
        let table = raw.into_iter().collect::<Self>();
        info!("📚 Loaded {} tooltip entries", table.len());
        Ok(table)
    }

    pub fn insert(&mut self, id: &str, entry: TooltipEntry) {
        self.entries.insert(id.to_lowercase(), entry);
    }

    pub fn get(&self, id: &str) -> Option<&TooltipEntry> {
        self.entries
            .get(id)
            .or_else(|| self.entries.get(&id.to_lowercase()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TooltipEntry)> {
        self.entries.iter()
    }

    /// Entries that a piece of rendered HTML references via `data-tooltip-id`
    pub fn subset<'a, I>(&self, ids: I) -> TooltipTable
    where
        I: IntoIterator<Item = &'a str>,
    {
        ids.into_iter()
            .filter_map(|id| self.get(id).map(|entry| (id.to_lowercase(), entry.clone())))
            .collect()
    }
}

impl FromIterator<(String, TooltipEntry)> for TooltipTable {
    fn from_iter<T: IntoIterator<Item = (String, TooltipEntry)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(id, entry)| (id.to_lowercase(), entry)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "Fox": {"title": "fox", "partOfSpeech": "noun", "description": "A small wild canine", "example": "The fox ran."},
        "hen": {"definition": "A female chicken", "category": "animals", "Image Description": "A brown hen"}
    }"#;

    #[test]
    fn test_from_json_lowercases_ids() {
        let table = TooltipTable::from_json(SAMPLE).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.contains("fox"));
        assert!(table.contains("FOX"));
        assert_eq!(table.get("fox").unwrap().part_of_speech.as_deref(), Some("noun"));
    }

    #[test]
    fn test_definition_fallback_and_image_field() {
        let table = TooltipTable::from_json(SAMPLE).unwrap();
        let hen = table.get("hen").unwrap();
        assert_eq!(hen.text(), Some("A female chicken"));
        assert_eq!(hen.image_description.as_deref(), Some("A brown hen"));
    }

    #[test]
    fn test_popover_html() {
        let table = TooltipTable::from_json(SAMPLE).unwrap();
        let html = table.get("fox").unwrap().to_html("fox");
        assert_eq!(
            html,
            "<div class=\"tooltip-content\"><strong class=\"tooltip-title\">fox</strong> \
             <em class=\"tooltip-pos\">noun</em><p class=\"tooltip-description\">A small wild canine</p>\
             <p class=\"tooltip-example\">The fox ran.</p></div>"
        );
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(TooltipTable::from_json("[1, 2").is_err());
    }

    #[test]
    fn test_subset() {
        let table = TooltipTable::from_json(SAMPLE).unwrap();
        let subset = table.subset(["hen", "missing"]);
        assert_eq!(subset.len(), 1);
        assert!(subset.contains("hen"));
    }
}
