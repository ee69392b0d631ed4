//! Pure helpers with no storage access: the deck code translator and the
//! JSON Patch application wrapper.

pub mod code;
pub mod patch;
