//! Effective-form resolution.
//!
//! A reference resolves through, in order: the remap table, the attached form
//! of an activator, the source ammunition of a projectile, and finally itself.

use crate::attached::{AttachedFormResolver, CandidateVariables};
use crate::config::ResolverConfig;
use crate::form::{Form, FormId, FormKind, FormType, Reference};
use crate::host::{DataSourceLookup, ScriptRuntime};
use crate::identity::{IdentityTable, Registration};
use crate::inspector::VariableInspector;

/// Counts from applying a [`ResolverConfig`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub registered: usize,
    pub duplicates: usize,
    pub unknown_sources: usize,
    pub unresolved: usize,
    pub variables_added: usize,
}

impl LoadReport {
    fn record(&mut self, outcome: Registration) {
        match outcome {
            Registration::Inserted => self.registered += 1,
            Registration::Duplicate => self.duplicates += 1,
            Registration::UnknownSource => self.unknown_sources += 1,
            Registration::Unresolved => self.unresolved += 1,
        }
    }

    pub fn dropped(&self) -> usize {
        self.unknown_sources + self.unresolved
    }
}

/// Configured lookup state: the remap table and candidate variable names.
///
/// Built with `&mut` during configuration, then shared read-only.
#[derive(Clone, Debug, Default)]
pub struct FormLookup {
    table: IdentityTable,
    variables: CandidateVariables,
}

impl FormLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_script_variable(&mut self, name: impl Into<String>) -> bool {
        self.variables.insert(name)
    }

    pub fn add_remap(
        &mut self,
        forms: &dyn DataSourceLookup,
        base_source: &str,
        base_raw: u32,
        target_source: &str,
        target_raw: u32,
    ) -> Registration {
        self.table
            .register(forms, base_source, base_raw, target_source, target_raw)
    }

    /// Apply a parsed configuration: variables first, then remaps in order.
    pub fn load_config(&mut self, config: &ResolverConfig, forms: &dyn DataSourceLookup) -> LoadReport {
        let mut report = LoadReport::default();

        for name in &config.script_variables {
            if self.add_script_variable(name.as_str()) {
                report.variables_added += 1;
            }
        }
        for remap in &config.remaps {
            let outcome = self.add_remap(
                forms,
                &remap.base.source,
                remap.base.id.get(),
                &remap.target.source,
                remap.target.id.get(),
            );
            report.record(outcome);
        }

        tracing::debug!(
            registered = report.registered,
            duplicates = report.duplicates,
            dropped = report.dropped(),
            variables = self.variables.len(),
            "form lookup configured"
        );
        report
    }

    pub fn table(&self) -> &IdentityTable {
        &self.table
    }

    pub fn variables(&self) -> &CandidateVariables {
        &self.variables
    }

    /// Bind the configured state to a host for resolving.
    pub fn resolver<'a>(
        &'a self,
        forms: &'a dyn DataSourceLookup,
        runtime: &'a dyn ScriptRuntime,
    ) -> FormResolver<'a> {
        FormResolver {
            table: &self.table,
            attached: AttachedFormResolver::new(&self.variables, VariableInspector::new(runtime), forms),
            forms,
        }
    }
}

/// Resolution pipeline over one host.
pub struct FormResolver<'a> {
    table: &'a IdentityTable,
    attached: AttachedFormResolver<'a>,
    forms: &'a dyn DataSourceLookup,
}

impl<'a> FormResolver<'a> {
    /// The form `reference` should be presented as. Never fails: every miss
    /// falls back to the reference itself.
    pub fn resolve(&self, reference: &Reference) -> FormId {
        if let Some(target) = reference.base.and_then(|base| self.table.resolve(base)) {
            tracing::trace!(reference = %reference.id, target = %target, "remapped");
            return target;
        }

        match self.base_type(reference) {
            Some(FormType::Activator) => {
                match self.attached.attached_forms(reference).find_map(unwrap_first) {
                    Some(id) => {
                        tracing::trace!(reference = %reference.id, attached = %id, "attached form");
                        id
                    }
                    None => reference.id,
                }
            }
            Some(FormType::Projectile) => reference
                .as_projectile()
                .and_then(|projectile| projectile.source_ammo)
                .unwrap_or(reference.id),
            _ => reference.id,
        }
    }

    fn base_type(&self, reference: &Reference) -> Option<FormType> {
        reference
            .base
            .and_then(|id| self.forms.form(id))
            .map(Form::form_type)
    }
}

/// First entry of a leveled list or form list, or the form itself. Empty
/// lists yield nothing, so the next candidate variable gets its turn.
fn unwrap_first(form: &Form) -> Option<FormId> {
    match &form.kind {
        FormKind::LeveledItem { entries } => entries.first().map(|entry| entry.form),
        FormKind::FormList { forms } => forms.first().copied(),
        FormKind::Plain(_) => Some(form.id),
    }
}
