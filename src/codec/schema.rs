//! Named, versioned field layouts, registered globally so a reader can
//! validate an object's shape without the caller hand-checking each field.
//!
//! This sits above [`super::writer`]/[`super::reader`]'s raw begin_object
//! schema-name check: it additionally tracks per-field tags and whether a
//! field is required, and lets version skew between writer and reader be
//! resolved by name rather than by position.

use std::collections::HashMap;
use std::sync::Mutex;

use lazy_static::lazy_static;

use super::tag::Tag;
use super::writer::Version;
use crate::error::{CoreError, Result};

#[derive(Clone, Debug)]
pub struct FieldSchema {
    pub name: String,
    pub tag: Tag,
    pub required: bool,
    /// For `Tag::Array` fields, the element type; for `Tag::Object` fields,
    /// the referenced schema's type name.
    pub element: Option<String>,
}

impl FieldSchema {
    pub fn required(name: impl Into<String>, tag: Tag) -> Self {
        Self {
            name: name.into(),
            tag,
            required: true,
            element: None,
        }
    }

    pub fn optional(name: impl Into<String>, tag: Tag) -> Self {
        Self {
            name: name.into(),
            tag,
            required: false,
            element: None,
        }
    }

    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct Schema {
    pub type_name: String,
    pub version: Version,
    pub fields: Vec<FieldSchema>,
}

impl Schema {
    pub fn new(type_name: impl Into<String>, version: Version, fields: Vec<FieldSchema>) -> Self {
        Self {
            type_name: type_name.into(),
            version,
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Schema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, schema: Schema) {
        self.schemas.insert(schema.type_name.clone(), schema);
    }

    pub fn get(&self, type_name: &str) -> Option<&Schema> {
        self.schemas.get(type_name)
    }

    /// Checks that `type_name` is known and that `found_version` can be read
    /// by a reader built against the registered (current) schema version.
    pub fn validate(&self, type_name: &str, found_version: Version) -> Result<()> {
        let schema = self
            .get(type_name)
            .ok_or_else(|| CoreError::unknown_resource("schema", type_name))?;
        if !found_version.is_compatible_with(schema.version) {
            return Err(CoreError::format(format!(
                "`{type_name}` version mismatch: stream has {}.{}.{}, registry expects {}.{}.{}",
                found_version.major,
                found_version.minor,
                found_version.patch,
                schema.version.major,
                schema.version.minor,
                schema.version.patch,
            )));
        }
        Ok(())
    }
}

lazy_static! {
    static ref REGISTRY: Mutex<SchemaRegistry> = Mutex::new(SchemaRegistry::new());
}

/// Registers (or replaces) a schema in the process-wide registry.
pub fn register_schema(schema: Schema) {
    REGISTRY.lock().unwrap().register(schema);
}

pub fn validate_schema(type_name: &str, found_version: Version) -> Result<()> {
    REGISTRY.lock().unwrap().validate(type_name, found_version)
}

pub fn lookup_schema(type_name: &str) -> Option<Schema> {
    REGISTRY.lock().unwrap().get(type_name).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_lookup_round_trips() {
        register_schema(Schema::new(
            "schema::test::Widget",
            Version::CURRENT,
            vec![FieldSchema::required("count", Tag::U32)],
        ));
        let found = lookup_schema("schema::test::Widget").unwrap();
        assert_eq!(found.fields.len(), 1);
        assert_eq!(found.field("count").unwrap().tag, Tag::U32);
    }

    #[test]
    fn incompatible_major_version_rejected() {
        register_schema(Schema::new(
            "schema::test::Gadget",
            Version {
                major: 2,
                minor: 0,
                patch: 0,
            },
            vec![],
        ));
        let result = validate_schema(
            "schema::test::Gadget",
            Version {
                major: 1,
                minor: 0,
                patch: 0,
            },
        );
        assert!(result.is_err());
    }
}
