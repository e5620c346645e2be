//! Request-body schemas for the books API.
//!
//! A schema is an ordered list of typed fields. Validation walks the fields in
//! declaration order and reports at most one violation per field, using the
//! message wording existing clients already match on:
//!
//! - `instance requires property "title"`
//! - `instance.pages is not of a type(s) integer`
//! - `instance is not of a type(s) object`

use serde_json::{Map, Value};

/// JSON type a field must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
}

impl FieldKind {
    fn name(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Integer => value.is_i64(),
        }
    }
}

/// A property every instance must carry, with its JSON type
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn required(name: &'static str, kind: FieldKind) -> Field {
    Field { name, kind }
}

/// An ordered set of field constraints for one request body
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [Field],
}

/// Body of `POST /books`
pub const NEW_BOOK: Schema = Schema {
    name: "newBook",
    fields: &[
        required("isbn", FieldKind::String),
        required("amazon_url", FieldKind::String),
        required("author", FieldKind::String),
        required("language", FieldKind::String),
        required("pages", FieldKind::Integer),
        required("publisher", FieldKind::String),
        required("title", FieldKind::String),
        required("year", FieldKind::Integer),
    ],
};

/// Body of `PUT /books/{isbn}`; identical to [`NEW_BOOK`] without the key
pub const UPDATE_BOOK: Schema = Schema {
    name: "updateBook",
    fields: &[
        required("amazon_url", FieldKind::String),
        required("author", FieldKind::String),
        required("language", FieldKind::String),
        required("pages", FieldKind::Integer),
        required("publisher", FieldKind::String),
        required("title", FieldKind::String),
        required("year", FieldKind::Integer),
    ],
};

impl Schema {
    /// Check `instance` against this schema.
    ///
    /// Returns every violation, in field declaration order.
    pub fn validate(&self, instance: &Value) -> Result<(), Vec<String>> {
        let Some(object) = instance.as_object() else {
            return Err(vec!["instance is not of a type(s) object".to_string()]);
        };

        let errors: Vec<String> = self
            .fields
            .iter()
            .filter_map(|field| check_field(field, object))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_field(field: &Field, object: &Map<String, Value>) -> Option<String> {
    match object.get(field.name) {
        None => Some(format!("instance requires property \"{}\"", field.name)),
        Some(value) if !field.kind.accepts(value) => Some(format!(
            "instance.{} is not of a type(s) {}",
            field.name,
            field.kind.name()
        )),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_book() -> Value {
        json!({
            "isbn": "9780805390216",
            "amazon_url": "https://www.amazon.com/Calculus-Manifolds",
            "author": "Michael Spivak",
            "language": "english",
            "pages": 114,
            "publisher": "W.A Benjamin, inc.",
            "title": "Calculus On Manifolds",
            "year": 1965
        })
    }

    #[test]
    fn test_complete_book_passes_new_book_schema() {
        assert_eq!(NEW_BOOK.validate(&full_book()), Ok(()));
    }

    #[test]
    fn test_missing_fields_reported_in_declaration_order() {
        let errors = NEW_BOOK.validate(&json!({ "year": 2000 })).unwrap_err();

        assert_eq!(
            errors,
            vec![
                "instance requires property \"isbn\"",
                "instance requires property \"amazon_url\"",
                "instance requires property \"author\"",
                "instance requires property \"language\"",
                "instance requires property \"pages\"",
                "instance requires property \"publisher\"",
                "instance requires property \"title\"",
            ]
        );
    }

    #[test]
    fn test_wrong_types_are_reported_per_field() {
        let mut book = full_book();
        book["pages"] = json!("114");
        book["title"] = Value::Null;
        book["year"] = json!(1965.5);

        let errors = NEW_BOOK.validate(&book).unwrap_err();

        assert_eq!(
            errors,
            vec![
                "instance.pages is not of a type(s) integer",
                "instance.title is not of a type(s) string",
                "instance.year is not of a type(s) integer",
            ]
        );
    }

    #[test]
    fn test_non_object_body_is_rejected() {
        let errors = UPDATE_BOOK.validate(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(errors, vec!["instance is not of a type(s) object"]);
    }

    #[test]
    fn test_update_schema_does_not_require_isbn() {
        let mut book = full_book();
        book.as_object_mut().unwrap().remove("isbn");
        assert_eq!(UPDATE_BOOK.validate(&book), Ok(()));
    }

    #[test]
    fn test_update_schema_lists_missing_fields() {
        let errors = UPDATE_BOOK
            .validate(&json!({
                "author": "Rutherford Aris",
                "language": "english",
                "pages": 143,
                "publisher": "Dover Publications, inc.",
                "year": 1967
            }))
            .unwrap_err();

        assert_eq!(
            errors,
            vec![
                "instance requires property \"amazon_url\"",
                "instance requires property \"title\"",
            ]
        );
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let mut book = full_book();
        book["edition"] = json!("2nd");
        assert_eq!(NEW_BOOK.validate(&book), Ok(()));
    }
}
