use serde_derive::{Deserialize, Serialize};

/* Primitive storage types a packed field can hold */
pub const PRIMITIVE_TYPES: [&str; 4] = ["uint", "int", "address", "bool"];

/* A field as written in a schema: the width is in bits and the type is a
   primitive name or the name of a user-defined value type */
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct FieldDef {
    pub name: String,
    pub bits: u32,
    #[serde(rename = "type")]
    pub type_name: String,
    /* Required when `type` is not a primitive */
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, bits: u32, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bits,
            type_name: type_name.into(),
            underlying_type: None,
            comment: None,
        }
    }

    /* Builder for user-defined value types */
    pub fn with_underlying(mut self, underlying: impl Into<String>) -> Self {
        self.underlying_type = Some(underlying.into());
        self
    }

    pub fn is_primitive(&self) -> bool {
        PRIMITIVE_TYPES.contains(&self.type_name.as_str())
    }
}

/* A reusable field shape declared once at the top of a schema file.
   Structs pull it in with `ref`, optionally renaming it. */
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct SharedFieldDef {
    pub bits: u32,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl SharedFieldDef {
    /* Materialize the shared shape under a concrete field name */
    pub fn instantiate(&self, name: &str) -> FieldDef {
        FieldDef {
            name: name.to_string(),
            bits: self.bits,
            type_name: self.type_name.clone(),
            underlying_type: self.underlying_type.clone(),
            comment: self.comment.clone(),
        }
    }
}

/* Reference to a shared field */
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(deny_unknown_fields)]
pub struct FieldRef {
    #[serde(rename = "ref")]
    pub target: String,
    /* Defaults to the shared field's own name */
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl FieldRef {
    pub fn field_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.target)
    }
}

/* One entry of a struct's field list */
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(untagged)]
pub enum FieldEntry {
    Ref(FieldRef),
    Def(FieldDef),
}

/* A struct as written in a schema file; field order is layout order */
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct StructDef {
    pub fields: Vec<FieldEntry>,
    /* Opaque text copied verbatim into the generated library file */
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_definitions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/* A struct after shared-field expansion: every entry is a concrete field.
   This is the input of the layout compiler. */
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<FieldDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_definitions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl StructDecl {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            fields,
            additional_definitions: None,
            comment: None,
        }
    }

    pub fn total_bits(&self) -> u64 {
        self.fields.iter().map(|f| u64::from(f.bits)).sum()
    }
}
