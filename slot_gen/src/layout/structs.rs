use std::collections::HashSet;

use serde_derive::{Deserialize, Serialize};
use slot_types::{FieldDef, StructDecl};
use tracing::debug;

use super::conventions::{Conventions, WORD_BITS};
use super::errors::{SchemaError, SchemaResult};
use super::field::{Field, is_identifier};

/// Names derived from a struct's schema name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructNames {
    /// Schema name, e.g. `offerDetail`
    pub name: String,
    /// Packed word type, e.g. `OfferDetail`
    pub packed: String,
    /// Accessor library, e.g. `OfferDetailLib`
    pub library: String,
    /// In-memory record, e.g. `OfferDetailUnpacked`
    pub unpacked: String,
    /// Round-trip test contract, e.g. `OfferDetailTest`
    pub test: String,
}

impl StructNames {
    fn derive(name: &str) -> Self {
        let packed = capitalize(name);
        Self {
            name: name.to_string(),
            library: format!("{packed}Lib"),
            unpacked: format!("{packed}Unpacked"),
            test: format!("{packed}Test"),
            packed,
        }
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A validated packed struct. Only `Struct::new` builds one, so every
/// `Struct` in existence fits the word and satisfies its generation's rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Struct {
    names: StructNames,
    fields: Vec<Field>,
    additional_definitions: Option<String>,
    conventions: Conventions,
}

impl Struct {
    pub fn new(decl: &StructDecl, conventions: Conventions) -> SchemaResult<Self> {
        let strukt = decl.name.as_str();
        if !is_identifier(strukt) {
            return Err(SchemaError::InvalidStructName {
                name: strukt.to_string(),
            });
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut fields = Vec::with_capacity(decl.fields.len());
        let mut total: u64 = 0;

        for def in &decl.fields {
            let field = Field::new(def, &conventions).map_err(|e| e.in_struct(strukt))?;

            if conventions.nibble_aligned && field.bits() % 4 != 0 {
                return Err(SchemaError::Misaligned {
                    strukt: strukt.to_string(),
                    field: field.name().to_string(),
                    bits: field.bits(),
                });
            }
            if !seen.insert(def.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    strukt: strukt.to_string(),
                    field: def.name.clone(),
                });
            }

            /* Offsets past the word are only reachable when the struct is too wide */
            let before = u32::try_from(total).unwrap_or(u32::MAX);
            total += u64::from(field.bits());
            if total > u64::from(WORD_BITS) {
                continue;
            }
            fields.push(field.placed_at(before));
        }

        if total > u64::from(WORD_BITS) {
            return Err(SchemaError::TooWide {
                strukt: strukt.to_string(),
                total,
                overflow: total - u64::from(WORD_BITS),
            });
        }

        debug!(
            name = strukt,
            fields = fields.len(),
            bits = total,
            generation = conventions.generation,
            "validated struct layout"
        );

        Ok(Self {
            names: StructNames::derive(strukt),
            fields,
            additional_definitions: decl.additional_definitions.clone(),
            conventions,
        })
    }

    /// Build from a name and a field list.
    pub fn from_fields(
        name: &str,
        fields: Vec<FieldDef>,
        conventions: Conventions,
    ) -> SchemaResult<Self> {
        Self::new(&StructDecl::new(name, fields), conventions)
    }

    pub fn name(&self) -> &str {
        &self.names.name
    }

    pub fn names(&self) -> &StructNames {
        &self.names
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn additional_definitions(&self) -> Option<&str> {
        self.additional_definitions.as_deref()
    }

    pub fn conventions(&self) -> &Conventions {
        &self.conventions
    }

    pub fn total_bits(&self) -> u32 {
        self.fields.iter().map(Field::bits).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer_fields() -> Vec<FieldDef> {
        vec![
            FieldDef::new("prev", 32, "uint"),
            FieldDef::new("next", 32, "uint"),
            FieldDef::new("logPrice", 24, "int"),
            FieldDef::new("gives", 96, "uint"),
        ]
    }

    #[test]
    fn offsets_are_running_totals() {
        let s = Struct::from_fields("offer", offer_fields(), Conventions::GENERATION_1).unwrap();
        let before: Vec<u32> = s.fields().iter().map(Field::before).collect();
        assert_eq!(before, vec![0, 32, 64, 88]);
        assert_eq!(s.total_bits(), 184);
        assert_eq!(s.field("gives").unwrap().after(), 72);
    }

    #[test]
    fn names_derive_from_schema_name() {
        let s = Struct::from_fields("offerDetail", vec![FieldDef::new("gasreq", 24, "uint")], Conventions::default()).unwrap();
        let names = s.names();
        assert_eq!(names.packed, "OfferDetail");
        assert_eq!(names.library, "OfferDetailLib");
        assert_eq!(names.unpacked, "OfferDetailUnpacked");
        assert_eq!(names.test, "OfferDetailTest");
    }

    #[test]
    fn too_wide_reports_total_and_overflow() {
        let mut fields = offer_fields();
        fields.push(FieldDef::new("extra", 76, "uint"));
        let err = Struct::from_fields("offer", fields, Conventions::GENERATION_1).unwrap_err();
        assert_eq!(
            err,
            SchemaError::TooWide {
                strukt: "offer".into(),
                total: 260,
                overflow: 4
            }
        );
    }

    #[test]
    fn exactly_256_bits_is_accepted() {
        let fields = vec![FieldDef::new("a", 160, "address"), FieldDef::new("b", 96, "uint")];
        let s = Struct::from_fields("full", fields, Conventions::GENERATION_1).unwrap();
        assert_eq!(s.field("b").unwrap().after(), 0);
    }

    #[test]
    fn nibble_alignment_only_in_generation_1() {
        let fields = vec![FieldDef::new("odd", 13, "uint")];
        assert_eq!(
            Struct::from_fields("s", fields.clone(), Conventions::GENERATION_1),
            Err(SchemaError::Misaligned {
                strukt: "s".into(),
                field: "odd".into(),
                bits: 13
            })
        );
        assert!(Struct::from_fields("s", fields, Conventions::GENERATION_2).is_ok());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let fields = vec![FieldDef::new("a", 8, "uint"), FieldDef::new("a", 8, "int")];
        assert_eq!(
            Struct::from_fields("s", fields, Conventions::default()),
            Err(SchemaError::DuplicateField {
                strukt: "s".into(),
                field: "a".into()
            })
        );
    }

    #[test]
    fn field_errors_carry_struct_context() {
        let fields = vec![FieldDef::new("maker", 128, "address")];
        let err = Struct::from_fields("offerDetail", fields, Conventions::default()).unwrap_err();
        assert!(err.to_string().starts_with("struct 'offerDetail': field 'maker'"));
        assert!(matches!(err.root(), SchemaError::AddressWidth { bits: 128, .. }));
    }

    #[test]
    fn struct_name_must_be_an_identifier() {
        assert!(matches!(
            Struct::from_fields("offer detail", vec![], Conventions::default()),
            Err(SchemaError::InvalidStructName { .. })
        ));
    }

    #[test]
    fn empty_struct_is_legal() {
        let s = Struct::from_fields("empty", vec![], Conventions::default()).unwrap();
        assert!(s.fields().is_empty());
        assert_eq!(s.total_bits(), 0);
    }
}
