use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Uniform outcome envelope returned by every endpoint.
///
/// Store/update/delete operations report `success`, a human `message` and the
/// resulting entity in `data`; failures carry per-field `errors`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub meta: Option<Meta>,
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
}

impl Meta {
    pub fn paginated(total: i64, page: i64, page_size: i64) -> Self {
        Self {
            total,
            page: Some(page),
            page_size: Some(page_size),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            data,
            message,
            meta,
            errors: None,
        }
    }

    /// Successful outcome carrying an entity and a message
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::success(Some(data), Some(message.into()), None)
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            meta: None,
            errors,
        }
    }
}

/// Reads an update field where `null` means "clear the column".
///
/// Pair with `#[serde(default)]`: an absent key stays `None`, an explicit
/// `null` becomes `Some(None)` and a value becomes `Some(Some(v))`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        note: Option<Option<String>>,
    }

    #[test]
    fn nullable_tells_absent_from_null() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let cleared: Patch = serde_json::from_str(r#"{"note": null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"note": "x"}"#).unwrap();

        assert_eq!(absent.note, None);
        assert_eq!(cleared.note, Some(None));
        assert_eq!(set.note, Some(Some("x".to_string())));
    }

    #[test]
    fn paginated_meta_carries_page_fields() {
        let meta = Meta::paginated(42, 2, 10);
        assert_eq!(meta.page, Some(2));
        assert_eq!(meta.page_size, Some(10));
    }
}
