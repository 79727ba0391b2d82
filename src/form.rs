//! Form data model.
//!
//! Definitions ("forms") carry a closed category tag. The categories the
//! resolver has to look inside declare their shape directly on the variant,
//! so unwrapping is a `match` rather than a downcast.

use std::fmt;

/// Full 32-bit identifier of a loaded form, valid for one load session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormId(pub u32);

impl FormId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for FormId {
    fn from(raw: u32) -> Self {
        FormId(raw)
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// Classification tag attached to every definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormType {
    Activator,
    Ammo,
    Flora,
    FormList,
    Ingredient,
    LeveledItem,
    Misc,
    Projectile,
    Tree,
    Weapon,
    Other,
}

impl FormType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormType::Activator => "activator",
            FormType::Ammo => "ammo",
            FormType::Flora => "flora",
            FormType::FormList => "form_list",
            FormType::Ingredient => "ingredient",
            FormType::LeveledItem => "leveled_item",
            FormType::Misc => "misc",
            FormType::Projectile => "projectile",
            FormType::Tree => "tree",
            FormType::Weapon => "weapon",
            FormType::Other => "other",
        }
    }

    /// Parse the snake_case tag used in scene scripts.
    pub fn parse(tag: &str) -> Option<Self> {
        let ty = match tag {
            "activator" => FormType::Activator,
            "ammo" => FormType::Ammo,
            "flora" => FormType::Flora,
            "form_list" => FormType::FormList,
            "ingredient" => FormType::Ingredient,
            "leveled_item" => FormType::LeveledItem,
            "misc" => FormType::Misc,
            "projectile" => FormType::Projectile,
            "tree" => FormType::Tree,
            "weapon" => FormType::Weapon,
            "other" => FormType::Other,
            _ => return None,
        };
        Some(ty)
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a leveled item list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeveledEntry {
    pub form: FormId,
    pub level: u16,
    pub count: u16,
}

/// Category plus the shape the resolver can look into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormKind {
    LeveledItem { entries: Vec<LeveledEntry> },
    FormList { forms: Vec<FormId> },
    /// Any category without an inspectable shape.
    Plain(FormType),
}

impl FormKind {
    pub fn form_type(&self) -> FormType {
        match self {
            FormKind::LeveledItem { .. } => FormType::LeveledItem,
            FormKind::FormList { .. } => FormType::FormList,
            FormKind::Plain(ty) => *ty,
        }
    }
}

/// A loaded definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Form {
    pub id: FormId,
    pub kind: FormKind,
}

impl Form {
    pub fn new(id: FormId, kind: FormKind) -> Self {
        Self { id, kind }
    }

    pub fn plain(id: FormId, ty: FormType) -> Self {
        Self::new(id, FormKind::Plain(ty))
    }

    pub fn form_type(&self) -> FormType {
        self.kind.form_type()
    }
}

/// State recorded on a fired projectile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProjectileState {
    /// Ammunition the projectile was fired from, when the engine recorded it.
    pub source_ammo: Option<FormId>,
}

/// A placed instance of a base object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reference {
    pub id: FormId,
    pub base: Option<FormId>,
    projectile: Option<ProjectileState>,
}

impl Reference {
    pub fn new(id: FormId, base: Option<FormId>) -> Self {
        Self {
            id,
            base,
            projectile: None,
        }
    }

    pub fn with_projectile(mut self, state: ProjectileState) -> Self {
        self.projectile = Some(state);
        self
    }

    /// Narrow to the projectile representation, if this reference is one.
    pub fn as_projectile(&self) -> Option<&ProjectileState> {
        self.projectile.as_ref()
    }
}
