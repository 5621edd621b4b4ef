//! Variant resolution
//!
//! Merges the built-in definitions with user overrides and the disable list.
//! Overrides replace a default definition wholesale; disabling a template
//! always wins. Output order is the first time a template is seen, defaults
//! first, so that identical input yields identical rules.

use netobs_common::{HealthMode, HealthRuleDefinition, HealthRuleTemplate, HealthRuleVariant};
use std::collections::HashMap;

/// One variant to compile, with the definition-level mode it inherits
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVariant {
    pub template: HealthRuleTemplate,
    pub definition_mode: Option<HealthMode>,
    pub variant: HealthRuleVariant,
}

/// Ordered map keyed by template, remembering insertion order
#[derive(Debug, Default)]
struct DefinitionMap {
    order: Vec<HealthRuleTemplate>,
    by_template: HashMap<HealthRuleTemplate, HealthRuleDefinition>,
}

impl DefinitionMap {
    fn insert(&mut self, definition: HealthRuleDefinition) {
        if !self.by_template.contains_key(&definition.template) {
            self.order.push(definition.template);
        }
        self.by_template.insert(definition.template, definition);
    }

    fn into_ordered(mut self) -> Vec<HealthRuleDefinition> {
        self.order
            .iter()
            .filter_map(|t| self.by_template.remove(t))
            .collect()
    }
}

/// Defaults overridden template-for-template, minus disabled templates
pub fn effective_definitions(
    defaults: &[HealthRuleDefinition],
    overrides: Option<&[HealthRuleDefinition]>,
    disabled: &[HealthRuleTemplate],
) -> Vec<HealthRuleDefinition> {
    let mut map = DefinitionMap::default();
    let candidates = defaults.iter().chain(overrides.unwrap_or_default());
    for definition in candidates {
        if disabled.contains(&definition.template) {
            continue;
        }
        map.insert(definition.clone());
    }
    map.into_ordered()
}

/// Flattens definitions into (template, variant) pairs, keeping order
pub fn flatten(definitions: &[HealthRuleDefinition]) -> Vec<ResolvedVariant> {
    definitions
        .iter()
        .flat_map(|def| {
            def.variants.iter().map(move |variant| ResolvedVariant {
                template: def.template,
                definition_mode: def.mode,
                variant: variant.clone(),
            })
        })
        .collect()
}
