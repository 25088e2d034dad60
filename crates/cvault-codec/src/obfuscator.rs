use std::borrow::Cow;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CodecError, CodecResult};

/// Key compiled into every build. Shared by all sessions and all users.
pub const DEFAULT_OBFUSCATION_KEY: &str = "TalentSphere_CV_Secure_Key_2024";

/// Static-key XOR + base64 transform.
///
/// Provides casual concealment only. See the crate docs for why this must not
/// be mistaken for encryption.
#[derive(Clone)]
pub struct Obfuscator {
    key: Box<[u8]>,
}

impl Obfuscator {
    /// Build an obfuscator from a key made of characters in `U+0001..=U+00FF`.
    pub fn new(key: &str) -> CodecResult<Self> {
        if key.is_empty() {
            return Err(CodecError::InvalidKey("key must not be empty".into()));
        }
        let mut bytes = Vec::with_capacity(key.len());
        for ch in key.chars() {
            let unit = u32::from(ch);
            if unit == 0 || unit > 0xFF {
                return Err(CodecError::InvalidKey(format!(
                    "character {ch:?} is outside U+0001..=U+00FF"
                )));
            }
            bytes.push(unit as u8);
        }
        Ok(Self {
            key: bytes.into_boxed_slice(),
        })
    }

    /// XOR every character of `text` against the key and base64 the result.
    ///
    /// Fails if `text` holds a character above U+00FF, which the single-byte
    /// format cannot carry.
    pub fn obfuscate(&self, text: &str) -> CodecResult<String> {
        let mut bytes = Vec::with_capacity(text.len());
        for (position, ch) in text.chars().enumerate() {
            let unit = u32::from(ch);
            if unit > 0xFF {
                return Err(CodecError::UnrepresentableChar { ch, position });
            }
            bytes.push(unit as u8 ^ self.key_byte(position));
        }
        Ok(BASE64_STANDARD.encode(bytes))
    }

    /// Inverse of [`Obfuscator::obfuscate`].
    pub fn reveal(&self, encoded: &str) -> CodecResult<String> {
        let bytes = BASE64_STANDARD.decode(encoded.trim())?;
        Ok(bytes
            .iter()
            .enumerate()
            .map(|(position, byte)| char::from(byte ^ self.key_byte(position)))
            .collect())
    }

    /// Serialize `value` to JSON and obfuscate it.
    ///
    /// Characters above U+00FF are written as `\uXXXX` escapes first so any
    /// JSON document fits the single-byte format.
    pub fn encode_json<T: Serialize + ?Sized>(&self, value: &T) -> CodecResult<String> {
        let json = serde_json::to_string(value)?;
        self.obfuscate(&escape_non_latin1(&json))
    }

    /// Reveal and parse a value written by [`Obfuscator::encode_json`].
    pub fn decode_json<T: DeserializeOwned>(&self, encoded: &str) -> CodecResult<T> {
        let json = self.reveal(encoded)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn key_byte(&self, position: usize) -> u8 {
        self.key[position % self.key.len()]
    }
}

impl Default for Obfuscator {
    fn default() -> Self {
        Self {
            key: DEFAULT_OBFUSCATION_KEY.as_bytes().into(),
        }
    }
}

impl std::fmt::Debug for Obfuscator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Obfuscator")
            .field("key_len", &self.key.len())
            .finish()
    }
}

/// Rewrite every character above U+00FF in a JSON text as `\uXXXX` escapes
/// (a surrogate pair for characters outside the BMP).
///
/// Only valid on JSON text: such characters can only occur inside string
/// literals, where the escape is equivalent.
pub fn escape_non_latin1(json: &str) -> Cow<'_, str> {
    if json.chars().all(|ch| u32::from(ch) <= 0xFF) {
        return Cow::Borrowed(json);
    }
    let mut out = String::with_capacity(json.len() + 16);
    let mut units = [0u16; 2];
    for ch in json.chars() {
        if u32::from(ch) <= 0xFF {
            out.push(ch);
            continue;
        }
        for unit in ch.encode_utf16(&mut units) {
            out.push_str(&format!("\\u{unit:04x}"));
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    // -----------------------------------------------------------------------
    // Known vectors
    // -----------------------------------------------------------------------

    #[test]
    fn single_char_vector() {
        // 'A' (0x41) ^ 'K' (0x4B) = 0x0A
        let codec = Obfuscator::new("K").unwrap();
        assert_eq!(codec.obfuscate("A").unwrap(), "Cg==");
        assert_eq!(codec.reveal("Cg==").unwrap(), "A");
    }

    #[test]
    fn default_key_matches_browser_encoding() {
        // btoa of JSON.stringify({name: "José", years: 3}) XOR-ed with the default key.
        const BLOB: &str = "L0MCBAMRcUpKLx0WtmF6fSoAAgcBR2V4GA==";
        let codec = Obfuscator::default();
        let value = json!({"name": "José", "years": 3});

        assert_eq!(codec.encode_json(&value).unwrap(), BLOB);
        assert_eq!(codec.decode_json::<Value>(BLOB).unwrap(), value);
    }

    #[test]
    fn key_repeats_cyclically() {
        let codec = Obfuscator::new("ab").unwrap();
        let encoded = codec.obfuscate("abab").unwrap();
        // Each character XORs with itself.
        assert_eq!(BASE64_STANDARD.decode(encoded).unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn empty_text_encodes_to_empty() {
        let codec = Obfuscator::default();
        assert_eq!(codec.obfuscate("").unwrap(), "");
        assert_eq!(codec.reveal("").unwrap(), "");
    }

    // -----------------------------------------------------------------------
    // Keys
    // -----------------------------------------------------------------------

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(Obfuscator::new(""), Err(CodecError::InvalidKey(_))));
    }

    #[test]
    fn wide_key_is_rejected() {
        assert!(matches!(Obfuscator::new("ключ"), Err(CodecError::InvalidKey(_))));
    }

    #[test]
    fn default_key_is_valid() {
        assert!(Obfuscator::new(DEFAULT_OBFUSCATION_KEY).is_ok());
    }

    #[test]
    fn different_keys_disagree() {
        let a = Obfuscator::new("first-key").unwrap();
        let b = Obfuscator::new("second-key").unwrap();
        let encoded = a.encode_json(&json!({"name": "Jane"})).unwrap();
        assert!(b.decode_json::<Value>(&encoded).is_err());
    }

    #[test]
    fn debug_hides_key() {
        let debug = format!("{:?}", Obfuscator::default());
        assert!(!debug.contains(DEFAULT_OBFUSCATION_KEY));
        assert!(debug.contains("key_len"));
    }

    // -----------------------------------------------------------------------
    // Wide characters
    // -----------------------------------------------------------------------

    #[test]
    fn raw_wide_text_is_rejected() {
        let err = Obfuscator::default().obfuscate("Łukasz").unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnrepresentableChar { ch: 'Ł', position: 0 }
        ));
    }

    #[test]
    fn latin1_text_passes_through() {
        let codec = Obfuscator::default();
        let encoded = codec.obfuscate("José Müller").unwrap();
        assert_eq!(codec.reveal(&encoded).unwrap(), "José Müller");
    }

    #[test]
    fn escape_leaves_latin1_borrowed() {
        assert!(matches!(escape_non_latin1(r#"{"a":"é"}"#), Cow::Borrowed(_)));
    }

    #[test]
    fn escape_writes_surrogate_pairs() {
        assert_eq!(escape_non_latin1("\"Ł😀\""), "\"\\u0141\\ud83d\\ude00\"");
    }

    #[test]
    fn json_with_wide_characters_roundtrips() {
        let codec = Obfuscator::default();
        let doc = json!({"name": "Łukasz Żółw", "summary": "東京 🚀"});
        let encoded = codec.encode_json(&doc).unwrap();
        let decoded: Value = codec.decode_json(&encoded).unwrap();
        assert_eq!(decoded, doc);
    }

    // -----------------------------------------------------------------------
    // Corrupt input
    // -----------------------------------------------------------------------

    #[test]
    fn malformed_base64_is_an_error() {
        let err = Obfuscator::default().reveal("not base64 at all!").unwrap_err();
        assert!(matches!(err, CodecError::Base64(_)));
    }

    #[test]
    fn non_json_payload_is_an_error() {
        let codec = Obfuscator::default();
        let encoded = codec.obfuscate("definitely not json").unwrap();
        let err = codec.decode_json::<Value>(&encoded).unwrap_err();
        assert!(matches!(err, CodecError::Json(_)));
    }

    proptest! {
        #[test]
        fn any_json_string_roundtrips(text in any::<String>()) {
            let codec = Obfuscator::default();
            let encoded = codec.encode_json(&text).unwrap();
            let decoded: String = codec.decode_json(&encoded).unwrap();
            prop_assert_eq!(decoded, text);
        }

        #[test]
        fn latin1_text_roundtrips(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let text: String = bytes.iter().map(|b| char::from(*b)).collect();
            let codec = Obfuscator::new("k3y").unwrap();
            let encoded = codec.obfuscate(&text).unwrap();
            prop_assert_eq!(codec.reveal(&encoded).unwrap(), text);
        }
    }
}
