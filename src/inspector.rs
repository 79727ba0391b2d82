//! Script variable lookup.
//!
//! Script-exposed variables are stored by the runtime under a decorated
//! backing-field name; the undecorated name belongs to the property.

use crate::form::FormId;
use crate::host::{ResolvedValue, ScriptInstance, ScriptRuntime};

const VARIABLE_PREFIX: &str = "::";
const VARIABLE_SUFFIX: &str = "_var";

/// Backing-field name for a script variable.
pub fn decorate_variable_name(name: &str) -> String {
    let mut decorated = String::with_capacity(VARIABLE_PREFIX.len() + name.len() + VARIABLE_SUFFIX.len());
    decorated.push_str(VARIABLE_PREFIX);
    decorated.push_str(name);
    decorated.push_str(VARIABLE_SUFFIX);
    decorated
}

/// Reads variables off bound script instances.
#[derive(Clone, Copy)]
pub struct VariableInspector<'a> {
    runtime: &'a dyn ScriptRuntime,
}

impl<'a> VariableInspector<'a> {
    pub fn new(runtime: &'a dyn ScriptRuntime) -> Self {
        Self { runtime }
    }

    /// Value of `variable` on the `class_name` instance bound to `object`.
    pub fn get_variable(&self, object: FormId, class_name: &str, variable: &str) -> ResolvedValue {
        let decorated = decorate_variable_name(variable);

        let Some(instance) = self.runtime.find_bound_instance(object, class_name) else {
            return ResolvedValue::None;
        };

        self.runtime
            .variable_descriptors(class_name)
            .iter()
            .find(|desc| desc.name == decorated)
            .and_then(|desc| self.runtime.variable_value(&instance, desc.slot))
            .unwrap_or_default()
    }

    /// Search every instance bound to `object` for `variable`, stopping at the
    /// first instance that yields a value.
    pub fn find_variable(&self, object: FormId, variable: &str) -> ResolvedValue {
        let decorated = decorate_variable_name(variable);
        let mut result = ResolvedValue::None;

        self.runtime.for_each_bound_instance(object, &mut |instance| {
            match self.read_decorated(instance, &decorated) {
                Some(value) => {
                    tracing::trace!(
                        variable = %decorated,
                        class = %instance.class_name,
                        "found script variable"
                    );
                    result = value;
                    false
                }
                None => true,
            }
        });

        result
    }

    fn read_decorated(&self, instance: &ScriptInstance, decorated: &str) -> Option<ResolvedValue> {
        let descriptors = self.runtime.variable_descriptors(&instance.class_name);
        if descriptors.is_empty() {
            return None;
        }
        let desc = descriptors.iter().find(|desc| desc.name == decorated)?;
        self.runtime.variable_value(instance, desc.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockRuntime;
    use crate::host::Primitive;

    const FLORA: FormId = FormId(0xFF00_0800);
    const NECTAR: FormId = FormId(0x0004_DA24);

    #[test]
    fn test_decorate_variable_name() {
        assert_eq!(decorate_variable_name("lootable"), "::lootable_var");
        assert_eq!(decorate_variable_name(""), "::_var");
    }

    #[test]
    fn test_get_variable_reads_backing_field() {
        let runtime = MockRuntime::new()
            .class("CritterScript", &["Lootable", "::lootable_var"])
            .bind(
                FLORA,
                "CritterScript",
                &[
                    ("Lootable", ResolvedValue::Primitive(Primitive::Bool(true))),
                    ("::lootable_var", ResolvedValue::Object(NECTAR)),
                ],
            );
        let inspector = VariableInspector::new(&runtime);

        assert_eq!(
            inspector.get_variable(FLORA, "CritterScript", "lootable"),
            ResolvedValue::Object(NECTAR)
        );
    }

    #[test]
    fn test_get_variable_ignores_property_name() {
        let runtime = MockRuntime::new()
            .class("CritterScript", &["lootable"])
            .bind(FLORA, "CritterScript", &[("lootable", ResolvedValue::Object(NECTAR))]);
        let inspector = VariableInspector::new(&runtime);

        assert!(inspector.get_variable(FLORA, "CritterScript", "lootable").is_none());
    }

    #[test]
    fn test_get_variable_without_binding() {
        let runtime = MockRuntime::new()
            .class("CritterScript", &["::lootable_var"])
            .bind(FLORA, "OtherScript", &[]);
        let inspector = VariableInspector::new(&runtime);

        assert!(inspector.get_variable(FLORA, "CritterScript", "lootable").is_none());
        assert!(inspector.get_variable(FormId(1), "CritterScript", "lootable").is_none());
    }

    #[test]
    fn test_find_variable_stops_at_first_match() {
        let other = FormId(0x0001_0001);
        let runtime = MockRuntime::new()
            .class("Empty", &[])
            .class("First", &["::lootable_var"])
            .class("Second", &["::lootable_var"])
            .bind(FLORA, "Empty", &[])
            .bind(FLORA, "First", &[("::lootable_var", ResolvedValue::Object(NECTAR))])
            .bind(FLORA, "Second", &[("::lootable_var", ResolvedValue::Object(other))]);
        let inspector = VariableInspector::new(&runtime);

        assert_eq!(inspector.find_variable(FLORA, "lootable"), ResolvedValue::Object(NECTAR));
        assert_eq!(runtime.visited.get(), 2);
    }

    #[test]
    fn test_find_variable_stops_at_declared_but_unset() {
        let runtime = MockRuntime::new()
            .class("Declares", &["::lootable_var"])
            .class("Holds", &["::lootable_var"])
            .bind(FLORA, "Declares", &[])
            .bind(FLORA, "Holds", &[("::lootable_var", ResolvedValue::Object(NECTAR))]);
        let inspector = VariableInspector::new(&runtime);

        assert!(inspector.find_variable(FLORA, "lootable").is_none());
        assert_eq!(runtime.visited.get(), 1);
    }

    #[test]
    fn test_find_variable_skips_classes_without_it() {
        let runtime = MockRuntime::new()
            .class("Unrelated", &["::count_var"])
            .class("Critter", &["::lootable_var"])
            .bind(FLORA, "Unrelated", &[("::count_var", ResolvedValue::Primitive(Primitive::Int(3)))])
            .bind(FLORA, "Critter", &[("::lootable_var", ResolvedValue::Object(NECTAR))]);
        let inspector = VariableInspector::new(&runtime);

        assert_eq!(inspector.find_variable(FLORA, "lootable"), ResolvedValue::Object(NECTAR));
    }

    #[test]
    fn test_find_variable_miss_is_none() {
        let runtime = MockRuntime::new()
            .class("Critter", &["::count_var"])
            .bind(FLORA, "Critter", &[]);
        let inspector = VariableInspector::new(&runtime);

        assert!(inspector.find_variable(FLORA, "lootable").is_none());
        assert!(inspector.find_variable(FormId(2), "lootable").is_none());
    }
}
