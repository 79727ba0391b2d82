//! Lua scene host.
//!
//! Provides a sandboxed Lua state that describes the load order, forms,
//! references and script bindings the resolver runs against.

pub mod api;
pub mod engine;
pub mod sandbox;
pub mod scene;

pub use api::{register_api, FormHandle};
pub use engine::LuaScriptRuntime;
pub use scene::Scene;
