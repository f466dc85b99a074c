//! Name resolution for exposed fields and methods

use tether_types::{Method, StructField, TypeContext, TypeId};

/// Tag key consulted by default field naming
pub const DEFAULT_TAG_KEY: &str = "tether";

/// Tag value hiding a field from scripts
pub const HIDDEN_TAG: &str = "-";

/// Field naming override: `(types, owning type, field) -> names`
pub type FieldNamesFn = Box<dyn Fn(&TypeContext, TypeId, &StructField) -> Vec<String>>;

/// Method naming override: `(types, receiver type, method) -> names`
pub type MethodNamesFn = Box<dyn Fn(&TypeContext, TypeId, &Method) -> Vec<String>>;

/// Names a field is exposed under when no override is installed
///
/// A `-` tag hides the field, any other non-empty tag value is its only
/// name, and otherwise the field is reachable by its declared name and the
/// same name with a lowercase first letter.
pub fn default_field_names(tag_key: &str, field: &StructField) -> Vec<String> {
    match field.tag(tag_key) {
        Some(HIDDEN_TAG) => Vec::new(),
        Some(alias) if !alias.is_empty() => vec![alias.to_string()],
        _ => with_lower_alias(&field.name),
    }
}

/// Names a method is exposed under when no override is installed
pub fn default_method_names(method: &Method) -> Vec<String> {
    with_lower_alias(method.name())
}

/// `name` with its first character lowercased
pub fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn with_lower_alias(name: &str) -> Vec<String> {
    let lower = lower_first(name);
    if lower == name {
        vec![lower]
    } else {
        vec![name.to_string(), lower]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_types::{MethodDef, PrimitiveType};

    fn field(name: &str) -> StructField {
        let mut types = TypeContext::new();
        StructField::new(name, types.primitive(PrimitiveType::Int))
    }

    #[test]
    fn test_lower_first() {
        assert_eq!(lower_first("Name"), "name");
        assert_eq!(lower_first("URL"), "uRL");
        assert_eq!(lower_first("Ärger"), "ärger");
        assert_eq!(lower_first(""), "");
    }

    #[test]
    fn test_default_field_names() {
        assert_eq!(default_field_names("tether", &field("Name")), vec!["Name", "name"]);
        assert_eq!(
            default_field_names("tether", &field("Name").with_tag("tether", "title")),
            vec!["title"]
        );
        assert!(default_field_names("tether", &field("Name").with_tag("tether", "-")).is_empty());
    }

    #[test]
    fn test_empty_tag_falls_back() {
        let tagged = field("Name").with_tag("tether", "");
        assert_eq!(default_field_names("tether", &tagged), vec!["Name", "name"]);
    }

    #[test]
    fn test_other_tag_key_ignored() {
        let tagged = field("Name").with_tag("json", "-");
        assert_eq!(default_field_names("tether", &tagged), vec!["Name", "name"]);
        assert!(default_field_names("json", &tagged).is_empty());
    }

    #[test]
    fn test_default_method_names() {
        let mut types = TypeContext::new();
        let count = types
            .named("Count", tether_types::Type::Primitive(PrimitiveType::Int))
            .unwrap();
        types.add_method(count, MethodDef::new("Value", 0)).unwrap();
        let method = types.method_set(count).remove(0);
        assert_eq!(default_method_names(&method), vec!["Value", "value"]);
    }
}
