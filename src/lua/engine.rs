//! Script runtime backed by a Lua state.
//!
//! A scene declares script classes and the instances bound to each object:
//!
//! ```lua
//! classes = {
//!   CritterScript = { variables = { vm.var("nectar"), vm.var("lootable") } },
//! },
//! bindings = {
//!   [0xFF000800] = {
//!     { class = "CritterScript", vars = { [vm.var("nectar")] = vm.form(0x0004DA24) } },
//!   },
//! },
//! ```
//!
//! A class's `variables` list is its descriptor table; slot `n` is entry `n + 1`.

use std::fmt;

use mlua::{Lua, Table, Value};

use super::api::to_resolved;
use crate::form::FormId;
use crate::host::{ResolvedValue, ScriptInstance, ScriptRuntime, VariableDescriptor};

pub struct LuaScriptRuntime {
    classes: Table,
    bindings: Table,
    lua: Lua,
}

impl LuaScriptRuntime {
    /// Wrap `classes` and `bindings` tables living in `lua`.
    pub fn new(lua: Lua, classes: Table, bindings: Table) -> Self {
        Self {
            classes,
            bindings,
            lua,
        }
    }

    /// Number of objects with at least one binding entry.
    pub fn bound_object_count(&self) -> usize {
        self.bindings
            .clone()
            .pairs::<Value, Value>()
            .filter(|pair| pair.is_ok())
            .count()
    }

    pub fn class_count(&self) -> usize {
        self.classes
            .clone()
            .pairs::<Value, Value>()
            .filter(|pair| pair.is_ok())
            .count()
    }

    fn bound(&self, object: FormId) -> Vec<Table> {
        let list = match self.bindings.get::<Option<Table>>(object.raw()) {
            Ok(Some(list)) => list,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(object = %object, error = %err, "malformed script bindings");
                return Vec::new();
            }
        };
        let entries = list
            .sequence_values::<Table>()
            .filter_map(|entry| entry.ok())
            .collect();
        entries
    }

    fn class_of(entry: &Table) -> Option<String> {
        entry.get::<Option<String>>("class").ok().flatten()
    }

    fn instance(object: FormId, index: usize, entry: &Table) -> Option<ScriptInstance> {
        Some(ScriptInstance {
            object,
            class_name: Self::class_of(entry)?,
            index,
        })
    }

    fn variable_names(&self, class_name: &str) -> Vec<String> {
        let Ok(Some(class)) = self.classes.get::<Option<Table>>(class_name) else {
            return Vec::new();
        };
        let Ok(Some(variables)) = class.get::<Option<Table>>("variables") else {
            return Vec::new();
        };
        let names = variables
            .sequence_values::<String>()
            .filter_map(|name| name.ok())
            .collect();
        names
    }
}

impl fmt::Debug for LuaScriptRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LuaScriptRuntime")
            .field("classes", &self.class_count())
            .field("bound_objects", &self.bound_object_count())
            .finish_non_exhaustive()
    }
}

impl ScriptRuntime for LuaScriptRuntime {
    fn find_bound_instance(&self, object: FormId, class_name: &str) -> Option<ScriptInstance> {
        self.bound(object)
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| Self::instance(object, index, entry))
            .find(|instance| instance.class_name == class_name)
    }

    fn variable_descriptors(&self, class_name: &str) -> Vec<VariableDescriptor> {
        self.variable_names(class_name)
            .into_iter()
            .enumerate()
            .map(|(slot, name)| VariableDescriptor { name, slot })
            .collect()
    }

    fn variable_value(&self, instance: &ScriptInstance, slot: usize) -> Option<ResolvedValue> {
        let name = self.variable_names(&instance.class_name).into_iter().nth(slot)?;
        let bound = self.bound(instance.object);
        let entry = bound.get(instance.index)?;
        if Self::class_of(entry).as_deref() != Some(instance.class_name.as_str()) {
            return None;
        }

        let value = match entry.get::<Option<Table>>("vars") {
            Ok(Some(vars)) => vars.get::<Value>(name).ok()?,
            Ok(None) => Value::Nil,
            Err(_) => return None,
        };
        Some(to_resolved(&value))
    }

    fn for_each_bound_instance(
        &self,
        object: FormId,
        visitor: &mut dyn FnMut(&ScriptInstance) -> bool,
    ) {
        for (index, entry) in self.bound(object).iter().enumerate() {
            let Some(instance) = Self::instance(object, index, entry) else {
                continue;
            };
            if !visitor(&instance) {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lua::api::register_api;

    const SCRIPTS: &str = r#"
        return {
            classes = {
                CritterScript = { variables = { vm.var("nectar"), vm.var("count") } },
                Marker = { variables = {} },
            },
            bindings = {
                [0xFF000800] = {
                    { class = "Marker" },
                    { class = "CritterScript", vars = {
                        [vm.var("nectar")] = vm.form(0x0004DA24),
                        [vm.var("count")] = 3,
                    } },
                },
            },
        }
    "#;

    fn runtime() -> LuaScriptRuntime {
        let lua = Lua::new();
        register_api(&lua).unwrap();
        let exports: Table = lua.load(SCRIPTS).eval().unwrap();
        let classes: Table = exports.get("classes").unwrap();
        let bindings: Table = exports.get("bindings").unwrap();
        LuaScriptRuntime::new(lua, classes, bindings)
    }

    #[test]
    fn test_descriptors_in_slot_order() {
        let runtime = runtime();
        let descriptors = runtime.variable_descriptors("CritterScript");

        assert_eq!(
            descriptors,
            vec![
                VariableDescriptor { name: "::nectar_var".into(), slot: 0 },
                VariableDescriptor { name: "::count_var".into(), slot: 1 },
            ]
        );
        assert!(runtime.variable_descriptors("Marker").is_empty());
        assert!(runtime.variable_descriptors("Unknown").is_empty());
    }

    #[test]
    fn test_find_bound_instance() {
        let runtime = runtime();
        let object = FormId(0xFF00_0800);

        let instance = runtime.find_bound_instance(object, "CritterScript").unwrap();
        assert_eq!(instance.index, 1);
        assert!(runtime.find_bound_instance(object, "Other").is_none());
        assert!(runtime.find_bound_instance(FormId(1), "CritterScript").is_none());
    }

    #[test]
    fn test_variable_value() {
        let runtime = runtime();
        let instance = runtime
            .find_bound_instance(FormId(0xFF00_0800), "CritterScript")
            .unwrap();

        assert_eq!(
            runtime.variable_value(&instance, 0),
            Some(ResolvedValue::Object(FormId(0x0004_DA24)))
        );
        assert_eq!(
            runtime.variable_value(&instance, 1),
            Some(ResolvedValue::Primitive(crate::host::Primitive::Int(3)))
        );
        assert_eq!(runtime.variable_value(&instance, 2), None);
    }

    #[test]
    fn test_visitor_sees_bindings_in_order_and_stops() {
        let runtime = runtime();
        let mut seen = Vec::new();

        runtime.for_each_bound_instance(FormId(0xFF00_0800), &mut |instance| {
            seen.push(instance.class_name.clone());
            false
        });
        assert_eq!(seen, vec!["Marker"]);

        seen.clear();
        runtime.for_each_bound_instance(FormId(0xFF00_0800), &mut |instance| {
            seen.push(instance.class_name.clone());
            true
        });
        assert_eq!(seen, vec!["Marker", "CritterScript"]);
    }

    #[test]
    fn test_counts_and_empty_runtime() {
        let runtime = runtime();
        assert_eq!(runtime.class_count(), 2);
        assert_eq!(runtime.bound_object_count(), 1);

        let lua = Lua::new();
        let classes = lua.create_table().unwrap();
        let bindings = lua.create_table().unwrap();
        let empty = LuaScriptRuntime::new(lua, classes, bindings);
        assert_eq!(empty.class_count(), 0);
        assert_eq!(empty.bound_object_count(), 0);
        assert!(empty.find_bound_instance(FormId(1), "Any").is_none());
        assert!(empty.variable_descriptors("Any").is_empty());
    }

    #[test]
    fn test_debug_summarizes_tables() {
        let text = format!("{:?}", runtime());
        assert!(text.starts_with("LuaScriptRuntime"));
        assert!(text.contains("classes: 2"));
        assert!(text.contains("bound_objects: 1"));
    }
}
