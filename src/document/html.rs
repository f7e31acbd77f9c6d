use std::path::Path;

use scraper::{ElementRef, Html, Selector};

use super::Snapshot;
use crate::error::DocumentError;

/// Snapshot backed by a serialized DOM, parsed with `scraper`.
#[derive(Debug)]
pub struct HtmlSnapshot {
    html: Html,
}

impl HtmlSnapshot {
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, DocumentError> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::parse(&source))
    }
}

fn compile(selector: &str) -> Result<Selector, DocumentError> {
    Selector::parse(selector).map_err(|e| DocumentError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

impl Snapshot for HtmlSnapshot {
    type Node<'a> = ElementRef<'a>;

    fn query(&self, selector: &str) -> Result<Vec<ElementRef<'_>>, DocumentError> {
        let selector = compile(selector)?;
        Ok(self.html.select(&selector).collect())
    }

    fn query_in<'a>(
        &'a self,
        scope: ElementRef<'a>,
        selector: &str,
    ) -> Result<Vec<ElementRef<'a>>, DocumentError> {
        let selector = compile(selector)?;
        Ok(scope
            .select(&selector)
            .filter(|el| el.id() != scope.id())
            .collect())
    }

    fn attribute<'a>(
        &'a self,
        node: ElementRef<'a>,
        name: &str,
    ) -> Result<Option<String>, DocumentError> {
        let element = node.value();
        if let Some(value) = element.attr(name) {
            return Ok(Some(value.to_string()));
        }
        // Foreign attributes such as `xlink:href` are stored by namespace +
        // local name, so a prefixed lookup falls back to the local part.
        let found = name.split_once(':').and_then(|(_, local)| {
            element
                .attrs()
                .find(|(key, _)| *key == local)
                .map(|(_, value)| value.to_string())
        });
        Ok(found)
    }

    fn text<'a>(&'a self, node: ElementRef<'a>) -> Result<String, DocumentError> {
        Ok(node
            .text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" "))
    }
}
