//! Field selection (`select=name,description`).

use serde_json::{Map, Value};

use crate::{Document, FieldPath, ID_FIELD, Schema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<FieldPath>,
}

impl Projection {
    pub fn new(fields: Vec<FieldPath>) -> Self {
        Self { fields }
    }

    /// Trusted, comma-free list of field names.
    pub fn of(fields: &[&str]) -> Self {
        Self::new(fields.iter().map(|f| FieldPath::new(f)).collect())
    }

    pub fn fields(&self) -> &[FieldPath] {
        &self.fields
    }

    /// Keep exactly the selected fields plus the identity field.
    pub fn apply(&self, doc: &Document) -> Document {
        let mut out = Map::new();
        if let Some(id) = doc.get(ID_FIELD) {
            out.insert(ID_FIELD.to_string(), id.clone());
        }
        for path in &self.fields {
            if let Some(value) = path.lookup(doc) {
                insert_path(&mut out, path.segments(), value.clone());
            }
        }
        out
    }
}

fn insert_path(target: &mut Document, segments: &[String], value: Value) {
    match segments {
        [] => {}
        [last] => {
            target.insert(last.clone(), value);
        }
        [head, rest @ ..] => {
            let entry = target
                .entry(head.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(inner) = entry {
                insert_path(inner, rest, value);
            }
        }
    }
}

/// Remove the schema's hidden fields from a document.
pub fn strip_hidden(mut doc: Document, schema: &Schema) -> Document {
    for field in schema.hidden {
        doc.remove(*field);
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_only_selected_fields_and_id() {
        let doc = json!({
            "id": "1",
            "name": "Devworks",
            "description": "Bootcamp",
            "housing": true,
            "location": {"city": "Boston", "state": "MA"},
        });
        let projected = Projection::of(&["name", "description"]).apply(doc.as_object().unwrap());
        assert_eq!(
            Value::Object(projected),
            json!({"id": "1", "name": "Devworks", "description": "Bootcamp"})
        );
    }

    #[test]
    fn nested_selection_rebuilds_objects() {
        let doc = json!({"id": "1", "location": {"city": "Boston", "state": "MA"}});
        let projected = Projection::of(&["location.city"]).apply(doc.as_object().unwrap());
        assert_eq!(Value::Object(projected), json!({"id": "1", "location": {"city": "Boston"}}));
    }

    #[test]
    fn strips_hidden_fields() {
        let schema = Schema {
            collection: "users",
            fields: &["name"],
            hidden: &["password"],
            unique: &[],
        };
        let doc = json!({"id": "1", "name": "A", "password": "x"});
        let out = strip_hidden(doc.as_object().cloned().unwrap(), &schema);
        assert!(!out.contains_key("password"));
        assert!(out.contains_key("name"));
    }
}
