//! Capability traits the resolver consumes from its host.
//!
//! The host owns form loading and the script virtual machine; the resolver only
//! asks narrow, synchronous questions through these traits.

use crate::form::{Form, FormId};

/// Read access to loaded data sources and their forms.
pub trait DataSourceLookup {
    /// Whether `name` is a loaded data source at all.
    fn source_loaded(&self, name: &str) -> bool;

    /// Whether `name` is loaded as a light (12-bit namespace) source.
    fn is_light_source(&self, name: &str) -> bool;

    /// Resolve a source-local id to the full id of a live form.
    fn lookup_object(&self, raw_id: u32, source: &str) -> Option<FormId>;

    /// Fetch a definition by full id.
    fn form(&self, id: FormId) -> Option<&Form>;
}

/// A script object bound to a game object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptInstance {
    pub object: FormId,
    pub class_name: String,
    /// Position among the object's bindings.
    pub index: usize,
}

/// Entry of a class's variable table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableDescriptor {
    pub name: String,
    pub slot: usize,
}

/// Scalar script values.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// A value read out of the script runtime.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum ResolvedValue {
    #[default]
    None,
    Object(FormId),
    Array(Vec<ResolvedValue>),
    Primitive(Primitive),
}

impl ResolvedValue {
    pub fn is_none(&self) -> bool {
        matches!(self, ResolvedValue::None)
    }

    pub fn as_object(&self) -> Option<FormId> {
        match self {
            ResolvedValue::Object(id) => Some(*id),
            _ => None,
        }
    }
}

/// Read-only view of the script virtual machine.
pub trait ScriptRuntime {
    fn find_bound_instance(&self, object: FormId, class_name: &str) -> Option<ScriptInstance>;

    /// Variable table of `class_name` in slot order. Unknown classes have none.
    fn variable_descriptors(&self, class_name: &str) -> Vec<VariableDescriptor>;

    /// `None` when the slot cannot be read from this instance.
    fn variable_value(&self, instance: &ScriptInstance, slot: usize) -> Option<ResolvedValue>;

    /// Visit every instance bound to `object` until `visitor` returns `false`.
    fn for_each_bound_instance(
        &self,
        object: FormId,
        visitor: &mut dyn FnMut(&ScriptInstance) -> bool,
    );
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_objects_are_usable() {
        assert_eq!(ResolvedValue::Object(FormId(7)).as_object(), Some(FormId(7)));
        assert_eq!(ResolvedValue::None.as_object(), None);
        assert_eq!(
            ResolvedValue::Array(vec![ResolvedValue::Object(FormId(7))]).as_object(),
            None
        );
        assert_eq!(
            ResolvedValue::Primitive(Primitive::Int(7)).as_object(),
            None
        );
        assert!(ResolvedValue::default().is_none());
    }
}
