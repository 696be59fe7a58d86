//! Evaluation state for a single trade.
//!
//! A [`Scope`] carries the runtime context, the trade's own reference
//! bindings, memoized reference values, the loot tables, tags and predicates
//! currently being expanded, and any diagnostics raised by entries that were
//! resolved to empty.

use std::collections::BTreeMap;

use crate::context::{EXPANSION_LIMIT, RECURSION_LIMIT, RuntimeContext};
use crate::error::{ExpansionKind, GenerationError};
use crate::id::{ResourceLocation, TagMember};
use crate::number::NumberProvider;
use crate::source::DataSource;

/// Name under which anonymous inline loot tables are expanded.
pub(crate) const INLINE_NAME: &str = "<inline>";

pub struct Scope<'a> {
    context: &'a RuntimeContext<'a>,
    references: Option<&'a BTreeMap<String, NumberProvider>>,
    resolved: BTreeMap<String, f64>,
    resolving: Vec<String>,
    expanding: Vec<(ExpansionKind, String)>,
    expansions: usize,
    diagnostics: Vec<GenerationError>,
}

impl<'a> Scope<'a> {
    pub fn new(context: &'a RuntimeContext<'a>) -> Self {
        Self {
            context,
            references: None,
            resolved: BTreeMap::new(),
            resolving: Vec::new(),
            expanding: Vec::new(),
            expansions: 0,
            diagnostics: Vec::new(),
        }
    }

    /// A scope whose references are looked up in `references` before the
    /// context's global registry.
    pub fn with_references(
        context: &'a RuntimeContext<'a>,
        references: &'a BTreeMap<String, NumberProvider>,
    ) -> Self {
        Self {
            references: Some(references),
            ..Self::new(context)
        }
    }

    pub fn context(&self) -> &'a RuntimeContext<'a> {
        self.context
    }

    pub fn data(&self) -> Option<&'a dyn DataSource> {
        self.context.data
    }

    pub fn luck(&self) -> f64 {
        self.context.luck
    }

    pub fn depth(&self) -> usize {
        self.expanding.len()
    }

    pub fn diagnostics(&self) -> &[GenerationError] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<GenerationError> {
        std::mem::take(&mut self.diagnostics)
    }

    // -----------------------------------------------------------------------
    // Depth tracking
    // -----------------------------------------------------------------------

    /// Enter one level of nested expansion. Must be paired with [`exit`].
    ///
    /// Fails when `name` is already being expanded (a cycle), when nesting
    /// reaches [`RECURSION_LIMIT`], or when the trade has used up its
    /// [`EXPANSION_LIMIT`]. Anonymous inline tables are never cycles.
    ///
    /// [`exit`]: Scope::exit
    pub(crate) fn enter(&mut self, kind: ExpansionKind, name: &str) -> Result<(), GenerationError> {
        let cyclic = name != INLINE_NAME
            && self
                .expanding
                .iter()
                .any(|(k, n)| *k == kind && n == name);
        if cyclic || self.expanding.len() >= RECURSION_LIMIT {
            return Err(GenerationError::RecursionLimitExceeded {
                kind,
                name: name.to_string(),
                depth: self.expanding.len(),
            });
        }
        if self.expansions >= EXPANSION_LIMIT {
            return Err(GenerationError::ExpansionLimitExceeded {
                kind,
                name: name.to_string(),
                limit: EXPANSION_LIMIT,
            });
        }
        self.expansions += 1;
        self.expanding.push((kind, name.to_string()));
        Ok(())
    }

    pub(crate) fn exit(&mut self) {
        self.expanding.pop();
    }

    /// Record a non-fatal error. The caller resolves the offending entry to
    /// empty and carries on.
    pub(crate) fn record(&mut self, error: GenerationError) {
        tracing::warn!(%error, "loot expansion resolved to empty");
        self.diagnostics.push(error);
    }

    // -----------------------------------------------------------------------
    // References
    // -----------------------------------------------------------------------

    pub(crate) fn lookup_reference(&self, id: &str) -> Option<&'a NumberProvider> {
        self.references
            .and_then(|local| local.get(id))
            .or_else(|| self.context.references.get(id))
    }

    pub(crate) fn resolved_reference(&self, id: &str) -> Option<f64> {
        self.resolved.get(id).copied()
    }

    pub(crate) fn begin_reference(&mut self, id: &str) -> Result<(), GenerationError> {
        if self.resolving.iter().any(|r| r == id) || self.resolving.len() >= RECURSION_LIMIT {
            return Err(GenerationError::RecursionLimitExceeded {
                kind: ExpansionKind::Reference,
                name: id.to_string(),
                depth: self.resolving.len(),
            });
        }
        self.resolving.push(id.to_string());
        Ok(())
    }

    pub(crate) fn end_reference(&mut self, id: &str, value: Option<f64>) {
        self.resolving.pop();
        if let Some(value) = value {
            self.resolved.insert(id.to_string(), value);
        }
    }

    // -----------------------------------------------------------------------
    // Tags
    // -----------------------------------------------------------------------

    /// Flatten a tag into its element ids, in declaration order without
    /// duplicates. A tag the data source does not know expands to nothing.
    pub(crate) fn expand_tag(
        &mut self,
        kind: ExpansionKind,
        id: &ResourceLocation,
    ) -> Vec<ResourceLocation> {
        let mut out = Vec::new();
        let mut visited = Vec::new();
        self.collect_tag(kind, id, &mut visited, &mut out);
        out
    }

    fn collect_tag(
        &mut self,
        kind: ExpansionKind,
        id: &ResourceLocation,
        visited: &mut Vec<ResourceLocation>,
        out: &mut Vec<ResourceLocation>,
    ) {
        // A tag already flattened contributes nothing new.
        if visited.contains(id) {
            return;
        }
        let Some(data) = self.data() else {
            return;
        };
        let members = match kind {
            ExpansionKind::EnchantmentTag => data.enchantment_tag(id),
            _ => data.item_tag(id),
        };
        let Some(members) = members else {
            tracing::debug!(%id, %kind, "tag not available");
            return;
        };
        if let Err(error) = self.enter(kind, id.as_str()) {
            self.record(error);
            return;
        }
        for member in members {
            match member {
                TagMember::Element(element) => {
                    if !out.contains(&element) {
                        out.push(element);
                    }
                }
                TagMember::Tag(nested) => self.collect_tag(kind, &nested, visited, out),
            }
        }
        self.exit();
        visited.push(id.clone());
    }
}
