//! Catalog entries and where their templates come from

use shelf_core::scene::Template;
use std::sync::Arc;

/// Named reference to a template that has to be downloaded before use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTemplate {
    pub name: String,
}

impl RemoteTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Either an embedded template (available immediately) or a remote one.
#[derive(Debug, Clone)]
pub enum TemplateSource {
    Local(Arc<Template>),
    Remote(RemoteTemplate),
}

impl TemplateSource {
    /// Name of the template or reference.
    pub fn name(&self) -> &str {
        match self {
            TemplateSource::Local(template) => &template.name,
            TemplateSource::Remote(reference) => &reference.name,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, TemplateSource::Remote(_))
    }
}

/// One spawnable definition shown in the browser.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub source: TemplateSource,
    /// Label attached to every item spawned from this entry.
    pub model_id: String,
}

impl CatalogEntry {
    /// Local entry tagged with the template's own name.
    pub fn local(template: impl Into<Arc<Template>>) -> Self {
        let template = template.into();
        Self {
            model_id: template.name.clone(),
            source: TemplateSource::Local(template),
        }
    }

    /// Remote entry tagged with the reference name.
    pub fn remote(name: impl Into<String>) -> Self {
        let reference = RemoteTemplate::new(name);
        Self {
            model_id: reference.name.clone(),
            source: TemplateSource::Remote(reference),
        }
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_id_defaults_to_source_name() {
        let local = CatalogEntry::local(Template::new("Gear"));
        assert_eq!(local.model_id, "Gear");
        assert!(!local.source.is_remote());

        let remote = CatalogEntry::remote("Turbine").with_model_id("turbine-v2");
        assert_eq!(remote.model_id, "turbine-v2");
        assert_eq!(remote.source.name(), "Turbine");
        assert!(remote.source.is_remote());
    }
}
