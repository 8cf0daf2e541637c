//! Template catalog.
//!
//! Templates are named rule snapshots partitioned by [`RuleKind`].  The
//! catalog assigns template ids and only ever appends through
//! [`TemplateCatalog::save_as_template`]; seeded templates can be loaded
//! from a directory of JSON files with [`load_templates_from_dir`].

use crate::catalog::RuleKind;
use crate::models::{Rule, Template};
use anyhow::Result;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template name is required")]
    EmptyName,
}

/// The saved templates available to the rule builder.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from already-identified templates, e.g. seeds.
    /// Later entries replace earlier ones with the same id.
    pub fn from_templates(templates: impl IntoIterator<Item = Template>) -> Self {
        let mut catalog = Self::new();
        for template in templates {
            match catalog.templates.iter_mut().find(|t| t.id == template.id) {
                Some(existing) => {
                    warn!(template = %template.id, "duplicate template id, keeping the last one");
                    *existing = template;
                }
                None => catalog.templates.push(template),
            }
        }
        catalog
    }

    /// Snapshot `rule` as a new template of `kind` and append it.
    ///
    /// An empty (or whitespace-only) name is rejected and the catalog is
    /// left unchanged.
    pub fn save_as_template(
        &mut self,
        rule: &Rule,
        name: &str,
        kind: RuleKind,
    ) -> Result<Template, TemplateError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TemplateError::EmptyName);
        }
        let template = Template {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            kind,
            rule: rule.clone(),
        };
        info!(template = %template.id, name, %kind, "saved rule template");
        self.templates.push(template.clone());
        Ok(template)
    }

    /// Templates of one kind, oldest first.
    pub fn for_kind(&self, kind: RuleKind) -> impl Iterator<Item = &Template> {
        self.templates.iter().filter(move |t| t.kind == kind)
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Template> {
        let index = self.templates.iter().position(|t| t.id == id)?;
        Some(self.templates.remove(index))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Load all template definitions from a directory.
///
/// Every `.json` file is parsed as a [`Template`].  Files that fail to
/// parse are logged and skipped; a missing directory yields no
/// templates.
pub fn load_templates_from_dir(path: &Path) -> Result<Vec<Template>> {
    let mut templates = Vec::new();
    if !path.is_dir() {
        warn!(path = %path.display(), "template directory not found");
        return Ok(templates);
    }
    let mut entries = std::fs::read_dir(path)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.path());
    for entry in entries {
        let file = entry.path();
        if !entry.file_type()?.is_file() || file.extension().map_or(true, |ext| ext != "json") {
            continue;
        }
        let data = std::fs::read_to_string(&file)?;
        match serde_json::from_str::<Template>(&data) {
            Ok(template) => templates.push(template),
            Err(err) => warn!(path = %file.display(), %err, "failed to parse template"),
        }
    }
    info!(count = templates.len(), path = %path.display(), "loaded rule templates");
    Ok(templates)
}
