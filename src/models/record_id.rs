use std::fmt;

use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Length of the external identifier token (hex digits of a 128-bit id).
pub const RECORD_ID_LEN: usize = 32;

/// Store-assigned document identifier.
///
/// Externally a 32-digit hex token (encoded lowercase). Hyphenated or braced
/// UUID spellings do not decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn decode(raw: &str) -> AppResult<Self> {
        if raw.len() != RECORD_ID_LEN || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AppError::MalformedIdentifier(raw.to_string()));
        }
        Uuid::try_parse(raw)
            .map(Self)
            .map_err(|_| AppError::MalformedIdentifier(raw.to_string()))
    }

    pub fn encode(&self) -> String {
        self.0.simple().to_string()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_fixed_length_lowercase_hex() {
        let id = RecordId::new_random();
        let token = id.encode();
        assert_eq!(token.len(), RECORD_ID_LEN);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_eq!(token, id.to_string());
    }

    #[test]
    fn test_decode_accepts_encoded_token() {
        let id = RecordId::new_random();
        assert_eq!(RecordId::decode(&id.encode()).unwrap(), id);
        assert!(RecordId::decode("0123456789ABCDEF0123456789abcdef").is_ok());
    }

    #[test]
    fn test_decode_rejects_malformed_tokens() {
        for raw in [
            "",
            "not-an-id",
            "0123456789abcdef",
            "0123456789abcdef0123456789abcdef00",
            "0123456789abcdef0123456789abcdeg",
            "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "{67e5504410b1426f9247bb680e5fe0c}",
        ] {
            match RecordId::decode(raw) {
                Err(AppError::MalformedIdentifier(s)) => assert_eq!(s, raw),
                other => panic!("expected MalformedIdentifier for {:?}, got {:?}", raw, other),
            }
        }
    }
}
