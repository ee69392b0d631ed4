//! JSON Patch (RFC 6902) application.
//!
//! The patch language doubles as the optimistic-concurrency mechanism: a
//! client embeds a `test` operation asserting the expected `version` before
//! its mutations, and a mismatch surfaces as `PatchTestFailed` — distinct
//! from every other patch failure, which is `BadPatch`. Application is
//! atomic; on any failure the document is left untouched.

use json_patch::{Patch, PatchErrorKind};
use serde_json::Value;

use crate::error::AppError;

/// Parses a raw JSON value as a patch operation list. Fails `BadPatch` on
/// anything that is not a well-formed operation sequence.
pub fn parse(raw: Value) -> Result<Patch, AppError> {
    serde_json::from_value(raw).map_err(|_| AppError::BadPatch)
}

/// Applies `patch` to `doc` in place. A failed `test` operation is the sole
/// signal of a lost-update race and maps to `PatchTestFailed`; bad paths,
/// type mismatches, and everything else map to `BadPatch`.
pub fn apply(doc: &mut Value, patch: &Patch) -> Result<(), AppError> {
    json_patch::patch(doc, patch).map_err(|e| match e.kind {
        PatchErrorKind::TestFailed => AppError::PatchTestFailed,
        _ => AppError::BadPatch,
    })
}
