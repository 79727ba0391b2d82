//! Scene loading.
//!
//! A scene is a Lua script returning the host state the resolver runs
//! against: the load order, form definitions, placed references and the
//! script bindings.
//!
//! ```lua
//! return {
//!   sources = { "Skyrim.esm", { name = "Critters.esl", light = true } },
//!   forms = {
//!     { id = 0x00012345, type = "activator" },
//!     { id = 0x0004DA24, type = "ingredient" },
//!     { id = 0x00020000, type = "leveled_item", entries = { { form = 0x0004DA24, level = 1, count = 1 } } },
//!     { id = 0x00020100, type = "form_list", forms = { 0x0004DA24 } },
//!   },
//!   references = {
//!     { id = 0xFF000800, base = 0x00012345 },
//!     { id = 0xFF000900, base = 0x00030000, projectile = { source_ammo = 0x0001397D } },
//!   },
//!   classes = { ... },
//!   bindings = { ... },
//! }
//! ```

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use mlua::{Lua, Table, Value};

use super::api::{form_id_from_value, register_api};
use super::engine::LuaScriptRuntime;
use super::sandbox::{apply_sandbox, is_sandboxed};
use crate::catalog::{DataSource, FormCatalog};
use crate::form::{Form, FormId, FormKind, FormType, LeveledEntry, ProjectileState, Reference};

/// Tables every scene must export.
const REQUIRED_TABLES: &[&str] = &["sources", "forms"];

/// Host state loaded from a scene script.
#[derive(Debug)]
pub struct Scene {
    pub catalog: FormCatalog,
    pub runtime: LuaScriptRuntime,
}

impl Scene {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("Invalid scene path: {}", path.display()))?
            .to_string();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene: {}", path.display()))?;

        Self::from_source(&name, &source)
    }

    /// Evaluate `source` in a fresh sandboxed state and build the scene.
    pub fn from_source(name: &str, source: &str) -> Result<Self> {
        let lua = Lua::new();
        apply_sandbox(&lua)?;
        if !is_sandboxed(&lua) {
            bail!("Scene '{}' could not be sandboxed", name);
        }
        register_api(&lua)?;

        let exports: Table = lua
            .load(source)
            .set_name(name)
            .eval()
            .with_context(|| format!("Failed to evaluate scene '{}'", name))?;

        for table in REQUIRED_TABLES {
            expect_table(&exports, table, name)?;
        }

        let mut catalog = FormCatalog::new();
        load_sources(&mut catalog, &expect_table(&exports, "sources", name)?)?;
        load_forms(&mut catalog, &expect_table(&exports, "forms", name)?)?;
        if let Some(references) = optional_table(&exports, "references", name)? {
            load_references(&mut catalog, &references)?;
        }

        let classes = optional_table(&exports, "classes", name)?.unwrap_or(lua.create_table()?);
        let bindings = optional_table(&exports, "bindings", name)?.unwrap_or(lua.create_table()?);
        let runtime = LuaScriptRuntime::new(lua, classes, bindings);

        tracing::debug!(
            scene = name,
            sources = catalog.sources().len(),
            forms = catalog.form_count(),
            references = catalog.reference_count(),
            "scene loaded"
        );
        Ok(Self { catalog, runtime })
    }

    pub fn reference(&self, id: FormId) -> Option<&Reference> {
        self.catalog.reference(id)
    }
}

fn expect_table(exports: &Table, key: &str, scene: &str) -> Result<Table> {
    match optional_table(exports, key, scene)? {
        Some(table) => Ok(table),
        None => bail!("Scene '{}' missing required table '{}'", scene, key),
    }
}

fn optional_table(exports: &Table, key: &str, scene: &str) -> Result<Option<Table>> {
    match exports.get::<Value>(key)? {
        Value::Table(table) => Ok(Some(table)),
        Value::Nil => Ok(None),
        other => bail!(
            "Scene '{}' exports '{}' as {} instead of table",
            scene,
            key,
            other.type_name()
        ),
    }
}

fn load_sources(catalog: &mut FormCatalog, sources: &Table) -> Result<()> {
    for entry in sources.clone().sequence_values::<Value>() {
        let source = match entry? {
            Value::String(name) => DataSource::normal(name.to_str()?.to_string()),
            Value::Table(table) => {
                let name: String = table.get("name").context("source entry needs a name")?;
                let light: Option<bool> = table.get("light")?;
                DataSource {
                    name,
                    light: light.unwrap_or(false),
                }
            }
            other => bail!("source entry must be a string or table, got {}", other.type_name()),
        };
        let name = source.name.clone();
        if !catalog.add_source(source) {
            bail!("data source '{}' listed twice or load order is full", name);
        }
    }
    Ok(())
}

fn load_forms(catalog: &mut FormCatalog, forms: &Table) -> Result<()> {
    for entry in forms.clone().sequence_values::<Table>() {
        let entry = entry.context("form entries must be tables")?;
        let id = required_id(&entry, "id")?;
        let tag: String = entry
            .get("type")
            .with_context(|| format!("form {} needs a type", id))?;
        let ty = FormType::parse(&tag).ok_or_else(|| anyhow!("form {} has unknown type '{}'", id, tag))?;

        let kind = match ty {
            FormType::LeveledItem => FormKind::LeveledItem {
                entries: leveled_entries(&entry, id)?,
            },
            FormType::FormList => FormKind::FormList {
                forms: id_list(&entry, "forms", id)?,
            },
            other => FormKind::Plain(other),
        };
        catalog.insert_form(Form::new(id, kind));
    }
    Ok(())
}

fn leveled_entries(entry: &Table, owner: FormId) -> Result<Vec<LeveledEntry>> {
    let Some(rows) = entry.get::<Option<Table>>("entries")? else {
        return Ok(Vec::new());
    };
    let mut entries = Vec::new();
    for row in rows.sequence_values::<Table>() {
        let row = row.with_context(|| format!("leveled list {} entries must be tables", owner))?;
        entries.push(LeveledEntry {
            form: required_id(&row, "form")?,
            level: row.get::<Option<u16>>("level")?.unwrap_or(1),
            count: row.get::<Option<u16>>("count")?.unwrap_or(1),
        });
    }
    Ok(entries)
}

fn id_list(entry: &Table, key: &str, owner: FormId) -> Result<Vec<FormId>> {
    let Some(items) = entry.get::<Option<Table>>(key)? else {
        return Ok(Vec::new());
    };
    let ids = items
        .sequence_values::<Value>()
        .map(|item| {
            let item = item?;
            form_id_from_value(&item).ok_or_else(|| anyhow!("{} of {} must hold form ids", key, owner))
        })
        .collect::<Result<Vec<_>>>();
    ids
}

fn load_references(catalog: &mut FormCatalog, references: &Table) -> Result<()> {
    for entry in references.clone().sequence_values::<Table>() {
        let entry = entry.context("reference entries must be tables")?;
        let id = required_id(&entry, "id")?;
        let base = optional_id(&entry, "base")?;

        let mut reference = Reference::new(id, base);
        if let Some(projectile) = entry.get::<Option<Table>>("projectile")? {
            reference = reference.with_projectile(ProjectileState {
                source_ammo: optional_id(&projectile, "source_ammo")?,
            });
        }
        catalog.insert_reference(reference);
    }
    Ok(())
}

fn required_id(table: &Table, key: &str) -> Result<FormId> {
    optional_id(table, key)?.ok_or_else(|| anyhow!("missing form id field '{}'", key))
}

fn optional_id(table: &Table, key: &str) -> Result<Option<FormId>> {
    match table.get::<Value>(key)? {
        Value::Nil => Ok(None),
        value => form_id_from_value(&value)
            .map(Some)
            .ok_or_else(|| anyhow!("field '{}' is not a form id", key)),
    }
}
