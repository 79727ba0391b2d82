//! In-memory data source registry.
//!
//! Mirrors how a load order assigns full ids: normal sources take a compile
//! index in the top byte, light sources share the `0xFE` prefix and take a
//! 12-bit index below it.

use rustc_hash::FxHashMap;

use crate::form::{Form, FormId, Reference};
use crate::host::DataSourceLookup;
use crate::identity::normalize_raw_id;

const LIGHT_PREFIX: u32 = 0xFE00_0000;
const MAX_NORMAL_SOURCES: u32 = 0xFE;
const MAX_LIGHT_SOURCES: u32 = 0x1000;

/// A plugin file in the load order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataSource {
    pub name: String,
    pub light: bool,
}

impl DataSource {
    pub fn normal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            light: false,
        }
    }

    pub fn light(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            light: true,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct LoadSlot {
    light: bool,
    index: u32,
}

impl LoadSlot {
    fn full_id(&self, raw_id: u32) -> FormId {
        let local = normalize_raw_id(raw_id, self.light);
        if self.light {
            FormId(LIGHT_PREFIX | (self.index << 12) | local)
        } else {
            FormId((self.index << 24) | local)
        }
    }
}

/// Loaded sources, forms and placed references.
#[derive(Debug, Default)]
pub struct FormCatalog {
    sources: FxHashMap<String, LoadSlot>,
    order: Vec<DataSource>,
    normal_count: u32,
    light_count: u32,
    forms: FxHashMap<FormId, Form>,
    references: FxHashMap<FormId, Reference>,
}

impl FormCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source to the load order. Returns `false` if the name is
    /// already loaded or its index space is exhausted.
    pub fn add_source(&mut self, source: DataSource) -> bool {
        if self.sources.contains_key(&source.name) {
            return false;
        }
        let slot = if source.light {
            if self.light_count >= MAX_LIGHT_SOURCES {
                return false;
            }
            self.light_count += 1;
            LoadSlot {
                light: true,
                index: self.light_count - 1,
            }
        } else {
            if self.normal_count >= MAX_NORMAL_SOURCES {
                return false;
            }
            self.normal_count += 1;
            LoadSlot {
                light: false,
                index: self.normal_count - 1,
            }
        };
        self.sources.insert(source.name.clone(), slot);
        self.order.push(source);
        true
    }

    /// Full id a source-local id would have, whether or not a form exists there.
    pub fn full_id(&self, raw_id: u32, source: &str) -> Option<FormId> {
        self.sources.get(source).map(|slot| slot.full_id(raw_id))
    }

    pub fn insert_form(&mut self, form: Form) {
        self.forms.insert(form.id, form);
    }

    pub fn insert_reference(&mut self, reference: Reference) {
        self.references.insert(reference.id, reference);
    }

    pub fn reference(&self, id: FormId) -> Option<&Reference> {
        self.references.get(&id)
    }

    pub fn sources(&self) -> &[DataSource] {
        &self.order
    }

    pub fn form_count(&self) -> usize {
        self.forms.len()
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }
}

impl DataSourceLookup for FormCatalog {
    fn source_loaded(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    fn is_light_source(&self, name: &str) -> bool {
        self.sources.get(name).is_some_and(|slot| slot.light)
    }

    fn lookup_object(&self, raw_id: u32, source: &str) -> Option<FormId> {
        let id = self.full_id(raw_id, source)?;
        self.forms.contains_key(&id).then_some(id)
    }

    fn form(&self, id: FormId) -> Option<&Form> {
        self.forms.get(&id)
    }
}
