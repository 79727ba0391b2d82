//! formlens - effective-form resolution for placed references.
//!
//! Given a placed reference, works out which form should be shown for it:
//! a configured remap of its base object, the form an activator's scripts
//! point at, the ammunition a projectile was fired from, or the reference
//! itself.

pub mod attached;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod form;
pub mod host;
pub mod identity;
pub mod inspector;
pub mod lua;
pub mod pipeline;

pub use attached::{AttachedFormResolver, CandidateVariables};
pub use catalog::{DataSource, FormCatalog};
pub use config::ResolverConfig;
pub use error::ConfigError;
pub use form::{Form, FormId, FormKind, FormType, Reference};
pub use host::{DataSourceLookup, ResolvedValue, ScriptRuntime};
pub use identity::IdentityTable;
pub use inspector::VariableInspector;
pub use pipeline::{FormLookup, FormResolver, LoadReport};
