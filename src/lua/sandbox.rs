//! Sandbox for scene scripts.
//!
//! Scene scripts only describe data; anything that reaches the filesystem,
//! loads code or bypasses metatables is removed.

use anyhow::Result;
use mlua::{Lua, Value};

const BLOCKED_GLOBALS: &[&str] = &[
    "os",
    "io",
    "debug",
    "package",
    "loadfile",
    "dofile",
    "load",
    "loadstring",
    "rawget",
    "rawset",
    "rawequal",
    "collectgarbage",
    "getmetatable",
    "setmetatable",
];

/// Strip blocked globals and make `require` fail.
pub fn apply_sandbox(lua: &Lua) -> Result<()> {
    let globals = lua.globals();

    for name in BLOCKED_GLOBALS {
        globals.set(*name, Value::Nil)?;
    }

    let require = lua.create_function(|_lua, module: String| -> mlua::Result<Value> {
        Err(mlua::Error::runtime(format!(
            "require '{}' is not available in scene scripts",
            module
        )))
    })?;
    globals.set("require", require)?;

    Ok(())
}

pub fn is_sandboxed(lua: &Lua) -> bool {
    let globals = lua.globals();
    BLOCKED_GLOBALS
        .iter()
        .all(|name| matches!(globals.get::<Value>(*name), Ok(Value::Nil)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sandbox_removes_blocked_globals() {
        let lua = Lua::new();
        apply_sandbox(&lua).unwrap();

        for name in ["os", "io", "load", "setmetatable"] {
            let value: Value = lua.globals().get(name).unwrap();
            assert!(matches!(value, Value::Nil), "{name} should be removed");
        }
    }

    #[test]
    fn test_sandbox_keeps_data_libraries() {
        let lua = Lua::new();
        apply_sandbox(&lua).unwrap();

        let result: String = lua.load("return string.format('%X', 0x801)").eval().unwrap();
        assert_eq!(result, "801");

        let count: i64 = lua
            .load("local t = {}; table.insert(t, 1); return #t")
            .eval()
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_require_is_rejected() {
        let lua = Lua::new();
        apply_sandbox(&lua).unwrap();

        let err = lua.load("require('socket')").exec().unwrap_err();
        assert!(err.to_string().contains("not available"));
    }

    #[test]
    fn test_is_sandboxed() {
        let lua = Lua::new();
        assert!(!is_sandboxed(&lua));

        apply_sandbox(&lua).unwrap();
        assert!(is_sandboxed(&lua));
    }
}
