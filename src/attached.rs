//! Forms attached to activators through script variables.

use indexmap::IndexSet;

use crate::form::{Form, FormType, Reference};
use crate::host::DataSourceLookup;
use crate::inspector::VariableInspector;

/// Base category whose references may carry an attached form.
pub const UNWRAP_CATEGORY: FormType = FormType::Activator;

/// Variable names checked for an attached form, in priority order.
#[derive(Clone, Debug, Default)]
pub struct CandidateVariables {
    names: IndexSet<String>,
}

impl CandidateVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `name` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for CandidateVariables {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut vars = Self::new();
        for name in iter {
            vars.insert(name);
        }
        vars
    }
}

/// Finds the form an activator reference's scripts point at.
pub struct AttachedFormResolver<'a> {
    candidates: &'a CandidateVariables,
    inspector: VariableInspector<'a>,
    forms: &'a dyn DataSourceLookup,
}

impl<'a> AttachedFormResolver<'a> {
    pub fn new(
        candidates: &'a CandidateVariables,
        inspector: VariableInspector<'a>,
        forms: &'a dyn DataSourceLookup,
    ) -> Self {
        Self {
            candidates,
            inspector,
            forms,
        }
    }

    /// First candidate variable on `reference` holding a loaded form.
    ///
    /// References whose base is not an activator are rejected up front.
    pub fn resolve(&self, reference: &Reference) -> Option<&'a Form> {
        self.attached_forms(reference).next()
    }

    /// Loaded forms held by the candidate variables of `reference`, in
    /// priority order. Variables are only read as the iterator advances.
    pub fn attached_forms<'r>(&'r self, reference: &'r Reference) -> impl Iterator<Item = &'a Form> + 'r {
        let eligible = reference
            .base
            .and_then(|id| self.forms.form(id))
            .is_some_and(|base| base.form_type() == UNWRAP_CATEGORY);

        self.candidates
            .iter()
            .take_while(move |_| eligible)
            .filter_map(move |name| {
                let id = self.inspector.find_variable(reference.id, name).as_object()?;
                let form = self.forms.form(id);
                if form.is_none() {
                    tracing::debug!(variable = name, form = %id, "attached form is not loaded");
                }
                form
            })
    }
}
