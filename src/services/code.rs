//! Deck code translation.
//!
//! Decks are keyed by sequential integers internally, but callers only ever
//! see a short opaque code. The mapping is a salted, length-padded hashids
//! bijection: deterministic and reversible by anyone holding the salt, not a
//! secret. Its purpose is to avoid exposing raw sequential identifiers and to
//! give codes a fixed minimum length.
//!
//! Decoding a malformed code fails `DeckNotFound`, never a parse error, so a
//! caller cannot distinguish "syntactically invalid" from "does not exist".

use std::sync::OnceLock;

use harsh::Harsh;

use crate::error::AppError;

const SALT: &str = "cardstock";
const MIN_LENGTH: usize = 5;
const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn codec() -> &'static Harsh {
    static CODEC: OnceLock<Harsh> = OnceLock::new();
    CODEC.get_or_init(|| {
        Harsh::builder()
            .salt(SALT)
            .length(MIN_LENGTH)
            .alphabet(ALPHABET)
            .build()
            .expect("hashids alphabet and salt are valid")
    })
}

pub fn encode(id: i64) -> String {
    codec().encode(&[id as u64])
}

pub fn decode(code: &str) -> Result<i64, AppError> {
    let ids = codec().decode(code).map_err(|_| AppError::DeckNotFound)?;
    match ids.as_slice() {
        [id] => Ok(*id as i64),
        _ => Err(AppError::DeckNotFound),
    }
}
