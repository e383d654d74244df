//! Category administration payloads.

use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePatternRequest {
    #[validate(length(min = 1, max = 255, message = "pattern is required"))]
    pub pattern: String,
}
