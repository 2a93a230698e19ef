use std::collections::BTreeMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::ValidationErrors;

use crate::core::error::{AppError, Result};

lazy_static! {
    /// Plain SQL identifier used for configurable table names
    /// - Valid: "countries", "geo_area_relations", "_tmp1"
    /// - Invalid: "1table", "public.countries", "x; DROP TABLE y"
    pub static ref SQL_IDENTIFIER_REGEX: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").unwrap();

    /// International dialling prefix without the leading plus, e.g. "98", "1", "44"
    pub static ref MOBILE_PREFIX_REGEX: Regex = Regex::new(r"^[0-9]{1,4}$").unwrap();

    /// Locale key of a translated field, e.g. "en", "fa", "pt_BR", "zh-Hant"
    pub static ref LOCALE_REGEX: Regex = Regex::new(r"^[a-z]{2,3}(?:[_-][A-Za-z]{2,4})?$").unwrap();

    /// Owner type of a polymorphic attachment, e.g. "user", "App\Models\Shop", "billing.invoice"
    pub static ref OWNER_TYPE_REGEX: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9_.\\:-]{0,190}$").unwrap();
}

/// Validation errors collected per field.
///
/// Rules add to this instead of returning early, so a client gets every
/// problem with a payload in one response.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Flattened `field: message` lines for the response envelope
    pub fn messages(&self) -> Vec<String> {
        self.0
            .iter()
            .flat_map(|(field, messages)| {
                messages
                    .iter()
                    .map(move |message| format!("{}: {}", field, message))
            })
            .collect()
    }

    /// `Ok(())` when nothing was collected, otherwise a field validation error
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::FieldValidation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages().join("; "))
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::default();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("The {} field is invalid ({}).", field, error.code));
                out.add(field.to_string(), message);
            }
        }
        out
    }
}

/// Keys of `object` that are not in `allowed`, in document order
pub fn disallowed_keys<'a>(object: &'a Map<String, Value>, allowed: &[&str]) -> Vec<&'a str> {
    object
        .keys()
        .map(String::as_str)
        .filter(|key| !allowed.contains(key))
        .collect()
}

/// Checks a structured object against a key allow-list. Values must be
/// scalars (string, number or null).
pub fn check_object_keys(
    errors: &mut FieldErrors,
    field: &str,
    object: &Map<String, Value>,
    allowed: &[&str],
) {
    let rejected = disallowed_keys(object, allowed);
    if !rejected.is_empty() {
        errors.add(
            field,
            format!(
                "The {} field contains unsupported keys: {}.",
                field,
                rejected.join(", ")
            ),
        );
    }

    for (key, value) in object {
        if matches!(value, Value::Array(_) | Value::Object(_)) {
            errors.add(
                format!("{}.{}", field, key),
                format!("The {}.{} field must be a string or number.", field, key),
            );
        }
    }
}

/// Checks that every element of a list is a string, reporting `field.<index>`
pub fn check_string_list(errors: &mut FieldErrors, field: &str, items: &[Value]) {
    for (index, item) in items.iter().enumerate() {
        if !item.is_string() {
            errors.add(
                format!("{}.{}", field, index),
                format!("The {}.{} field must be a string.", field, index),
            );
        }
    }
}

/// Checks a locale → text map used for translated fields
pub fn check_translations(
    errors: &mut FieldErrors,
    field: &str,
    translations: &BTreeMap<String, String>,
    required: bool,
) {
    if required && translations.values().all(|text| text.trim().is_empty()) {
        errors.add(field, format!("The {} field is required.", field));
    }

    for (locale, text) in translations {
        if !LOCALE_REGEX.is_match(locale) {
            errors.add(
                format!("{}.{}", field, locale),
                format!("'{}' is not a valid locale.", locale),
            );
        } else if text.chars().count() > 255 {
            errors.add(
                format!("{}.{}", field, locale),
                format!("The {}.{} field may not be greater than 255 characters.", field, locale),
            );
        }
    }
}

/// The full candidate record a single field is validated within.
///
/// Rules that depend on sibling fields (a name scoped by `country_id`, say)
/// read them from here instead of from ambient request state.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    data: Map<String, Value>,
}

impl ValidationContext {
    /// Builds a context from any serializable payload. Non-object payloads
    /// yield an empty context.
    pub fn from_payload<T: Serialize>(payload: &T) -> Self {
        let data = match serde_json::to_value(payload) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self { data }
    }

    /// Fills `key` when the payload left it absent or null, e.g. with the
    /// stored parent id of a record being partially updated.
    pub fn or_insert(mut self, key: &str, value: impl Serialize) -> Self {
        let missing = self.data.get(key).map_or(true, Value::is_null);
        if missing {
            if let Ok(value) = serde_json::to_value(value) {
                self.data.insert(key.to_string(), value);
            }
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key).filter(|v| !v.is_null())
    }

    pub fn uuid(&self, key: &str) -> Option<Uuid> {
        self.get(key)
            .and_then(Value::as_str)
            .and_then(|raw| Uuid::parse_str(raw).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::shared::constants::{ADDRESS_INFO_KEYS, ADDRESS_LINE_KEYS};

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_sql_identifier_regex() {
        assert!(SQL_IDENTIFIER_REGEX.is_match("countries"));
        assert!(SQL_IDENTIFIER_REGEX.is_match("geo_area_relations"));
        assert!(SQL_IDENTIFIER_REGEX.is_match("_tmp1"));
        assert!(!SQL_IDENTIFIER_REGEX.is_match("1table"));
        assert!(!SQL_IDENTIFIER_REGEX.is_match("public.countries"));
        assert!(!SQL_IDENTIFIER_REGEX.is_match("x; DROP TABLE y"));
        assert!(!SQL_IDENTIFIER_REGEX.is_match(""));
    }

    #[test]
    fn test_mobile_prefix_regex() {
        assert!(MOBILE_PREFIX_REGEX.is_match("98"));
        assert!(MOBILE_PREFIX_REGEX.is_match("1"));
        assert!(!MOBILE_PREFIX_REGEX.is_match("+98"));
        assert!(!MOBILE_PREFIX_REGEX.is_match("98765"));
    }

    #[test]
    fn test_address_keys_outside_allow_list_are_reported() {
        let mut errors = FieldErrors::default();
        let payload = object(json!({"street": "Valiasr", "city": "Tehran", "zip": "1234"}));

        check_object_keys(&mut errors, "address", &payload, ADDRESS_LINE_KEYS);

        let messages = errors.get("address").unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("city"));
        assert!(messages[0].contains("zip"));
        assert!(!messages[0].contains("street"));
    }

    #[test]
    fn test_address_with_allowed_or_no_keys_passes() {
        let mut errors = FieldErrors::default();
        let full = object(json!({
            "blvd": "Keshavarz", "street": "Valiasr", "alley": "Third",
            "number": 12, "floor": "2", "unit": null
        }));
        check_object_keys(&mut errors, "address", &full, ADDRESS_LINE_KEYS);
        check_object_keys(&mut errors, "address", &Map::new(), ADDRESS_LINE_KEYS);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_info_keys() {
        let mut errors = FieldErrors::default();
        check_object_keys(&mut errors, "info", &Map::new(), ADDRESS_INFO_KEYS);
        assert!(errors.is_empty());

        let payload = object(json!({"mobile": "9121234567", "email": "a@b.c"}));
        check_object_keys(&mut errors, "info", &payload, ADDRESS_INFO_KEYS);
        assert!(errors.get("info").unwrap()[0].contains("email"));
    }

    #[test]
    fn test_nested_values_rejected() {
        let mut errors = FieldErrors::default();
        let payload = object(json!({"street": {"name": "x"}}));
        check_object_keys(&mut errors, "address", &payload, ADDRESS_LINE_KEYS);
        assert!(errors.has("address.street"));
        assert!(!errors.has("address"));
    }

    #[test]
    fn test_string_list_reports_offending_index() {
        let mut errors = FieldErrors::default();
        check_string_list(&mut errors, "keywords", &[json!(123)]);
        assert!(errors.has("keywords.0"));

        let mut errors = FieldErrors::default();
        check_string_list(&mut errors, "keywords", &[json!("north"), json!(false)]);
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["keywords.1"]);
    }

    #[test]
    fn test_translations() {
        let mut errors = FieldErrors::default();
        let names = BTreeMap::from([("en".to_string(), "Gulf coast".to_string())]);
        check_translations(&mut errors, "name", &names, true);
        assert!(errors.is_empty());

        check_translations(&mut errors, "name", &BTreeMap::new(), true);
        assert!(errors.has("name"));

        let mut errors = FieldErrors::default();
        let bad = BTreeMap::from([("English".to_string(), "x".to_string())]);
        check_translations(&mut errors, "name", &bad, false);
        assert!(errors.has("name.English"));
    }

    #[test]
    fn test_field_errors_merge_and_messages() {
        let mut errors = FieldErrors::single("name", "taken");
        errors.merge(FieldErrors::single("name", "too long"));
        errors.merge(FieldErrors::single("city_id", "missing"));

        assert_eq!(errors.get("name").unwrap().len(), 2);
        assert_eq!(
            errors.messages(),
            vec!["city_id: missing", "name: taken", "name: too long"]
        );
        assert!(errors.into_result().is_err());
        assert!(FieldErrors::default().into_result().is_ok());
    }

    #[test]
    fn test_validation_context_reads_siblings() {
        let country_id = Uuid::now_v7();
        let ctx =
            ValidationContext::from_payload(&json!({"name": "Fars", "country_id": country_id}));
        assert_eq!(ctx.uuid("country_id"), Some(country_id));
        assert_eq!(ctx.uuid("name"), None);
        assert!(ctx.get("missing").is_none());
    }

    #[test]
    fn test_validation_context_or_insert_keeps_payload_value() {
        let from_payload = Uuid::now_v7();
        let stored = Uuid::now_v7();

        let ctx = ValidationContext::from_payload(&json!({"city_id": from_payload}))
            .or_insert("city_id", stored);
        assert_eq!(ctx.uuid("city_id"), Some(from_payload));

        let ctx = ValidationContext::from_payload(&json!({"city_id": null}))
            .or_insert("city_id", stored);
        assert_eq!(ctx.uuid("city_id"), Some(stored));
    }
}
