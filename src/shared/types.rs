use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of every non-validation error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Field-level validation errors, keyed by form field name
pub type FieldErrors = BTreeMap<String, Vec<String>>;
