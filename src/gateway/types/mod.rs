//! Gateway types module
//!
//! ## Input Types
//! - [`StrictDecimal`]: Format-validated amount for API input
//! - [`ValidatedJson`] / [`ValidatedQuery`]: Extractors that run `validator` rules
//! - [`dto`]: Request bodies and their conversion into service commands
//!
//! ## Output Types
//! - [`ApiResponse<T>`]: Unified API response wrapper
//! - [`ApiError`]: Domain error rendered in the same envelope

pub mod dto;
pub mod error;
pub mod extract;
pub mod money;
pub mod response;

pub use error::{ApiError, ApiResult, created, ok};
pub use extract::{ValidatedJson, ValidatedQuery};
pub use money::StrictDecimal;
pub use response::{ApiResponse, error_codes};
