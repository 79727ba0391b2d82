//! The `vm` table exposed to scene scripts.
//!
//! - `vm.form(id)` wraps a full form id as an object value.
//! - `vm.var(name)` returns the decorated backing-field name of a variable.
//! - `vm.log(level, message)` forwards to `tracing`.

use anyhow::Result;
use mlua::{Lua, MetaMethod, UserData, UserDataFields, UserDataMethods, Value};

use crate::form::FormId;
use crate::host::{Primitive, ResolvedValue};
use crate::inspector::decorate_variable_name;

/// Object value held by a script variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormHandle(pub FormId);

impl UserData for FormHandle {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("id", |_, this| Ok(this.0.raw()));
    }

    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| Ok(this.0.to_string()));
    }
}

/// Register the `vm` table in the Lua global namespace.
pub fn register_api(lua: &Lua) -> Result<()> {
    let vm = lua.create_table()?;

    vm.set(
        "form",
        lua.create_function(|_, id: u32| Ok(FormHandle(FormId(id))))?,
    )?;
    vm.set(
        "var",
        lua.create_function(|_, name: String| Ok(decorate_variable_name(&name)))?,
    )?;
    vm.set(
        "log",
        lua.create_function(|_, (level, message): (String, String)| {
            log_message(&level, &message);
            Ok(())
        })?,
    )?;

    lua.globals().set("vm", vm)?;
    Ok(())
}

fn log_message(level: &str, message: &str) {
    match level.to_ascii_lowercase().as_str() {
        "trace" => tracing::trace!(target: "formlens::scene", "{}", message),
        "debug" => tracing::debug!(target: "formlens::scene", "{}", message),
        "warn" | "warning" => tracing::warn!(target: "formlens::scene", "{}", message),
        "error" => tracing::error!(target: "formlens::scene", "{}", message),
        _ => tracing::info!(target: "formlens::scene", "{}", message),
    }
}

/// Read a form id written either as an integer or as `vm.form(id)`.
pub fn form_id_from_value(value: &Value) -> Option<FormId> {
    match value {
        Value::Integer(i) => u32::try_from(*i).ok().map(FormId),
        Value::UserData(ud) => ud.borrow::<FormHandle>().ok().map(|handle| handle.0),
        _ => None,
    }
}

/// Convert a script variable's Lua value into a runtime value.
pub fn to_resolved(value: &Value) -> ResolvedValue {
    match value {
        Value::Nil => ResolvedValue::None,
        Value::UserData(ud) => match ud.borrow::<FormHandle>() {
            Ok(handle) => ResolvedValue::Object(handle.0),
            Err(_) => ResolvedValue::None,
        },
        Value::Table(table) => ResolvedValue::Array(
            table
                .clone()
                .sequence_values::<Value>()
                .filter_map(|item| item.ok())
                .map(|item| to_resolved(&item))
                .collect(),
        ),
        Value::Boolean(b) => ResolvedValue::Primitive(Primitive::Bool(*b)),
        Value::Integer(i) => ResolvedValue::Primitive(Primitive::Int(*i)),
        Value::Number(n) => ResolvedValue::Primitive(Primitive::Float(*n)),
        Value::String(s) => ResolvedValue::Primitive(Primitive::Str(
            s.to_str().map(|s| s.to_string()).unwrap_or_default(),
        )),
        _ => ResolvedValue::None,
    }
}
