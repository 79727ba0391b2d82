//! Static base-form remap table.

use rustc_hash::FxHashMap;

use crate::form::FormId;
use crate::host::DataSourceLookup;

/// Local id mask for light sources.
pub const LIGHT_ID_MASK: u32 = 0x0000_0FFF;
/// Local id mask for normal sources.
pub const NORMAL_ID_MASK: u32 = 0x00FF_FFFF;

/// Mask a raw id down to its source-local namespace.
pub fn normalize_raw_id(raw_id: u32, light: bool) -> u32 {
    if light {
        raw_id & LIGHT_ID_MASK
    } else {
        raw_id & NORMAL_ID_MASK
    }
}

/// Outcome of a single [`IdentityTable::register`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registration {
    Inserted,
    /// The base already had a target; the first one is kept.
    Duplicate,
    UnknownSource,
    /// One of the ids does not name a live form.
    Unresolved,
}

/// Base form → replacement form, keyed by full ids.
///
/// Filled through `&mut self` while configuration loads, then only read.
#[derive(Debug, Default, Clone)]
pub struct IdentityTable {
    entries: FxHashMap<FormId, FormId>,
}

impl IdentityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that forms based on `base_raw` in `base_source` display as
    /// `target_raw` in `target_source`.
    ///
    /// Both raw ids are masked with the base source's namespace width. The
    /// target source's own width is not consulted.
    pub fn register(
        &mut self,
        forms: &dyn DataSourceLookup,
        base_source: &str,
        base_raw: u32,
        target_source: &str,
        target_raw: u32,
    ) -> Registration {
        if !forms.source_loaded(base_source) || !forms.source_loaded(target_source) {
            tracing::trace!(base_source, target_source, "remap source not loaded");
            return Registration::UnknownSource;
        }

        let base_light = forms.is_light_source(base_source);
        let base_raw = normalize_raw_id(base_raw, base_light);
        let target_raw = normalize_raw_id(target_raw, base_light);

        let Some(base) = forms.lookup_object(base_raw, base_source) else {
            tracing::trace!(base_source, base_raw, "remap base form not found");
            return Registration::Unresolved;
        };
        let Some(target) = forms.lookup_object(target_raw, target_source) else {
            tracing::trace!(target_source, target_raw, "remap target form not found");
            return Registration::Unresolved;
        };

        if self.entries.contains_key(&base) {
            return Registration::Duplicate;
        }
        self.entries.insert(base, target);
        tracing::trace!(base = %base, target = %target, "remap registered");
        Registration::Inserted
    }

    pub fn resolve(&self, base: FormId) -> Option<FormId> {
        self.entries.get(&base).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
