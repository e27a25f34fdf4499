use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cipher::Cipher;
use crate::error::{CodecError, CodecResult};
use crate::mode::CompressionMode;

/// A compression strategy composed with an optional encryption layer.
///
/// `serialize` renders with the mode and then encrypts; `deserialize`
/// decrypts and then parses. For every mode and every JSON-representable
/// value, `deserialize(serialize(v)) == v`.
#[derive(Clone, Debug, Default)]
pub struct Codec {
    mode: CompressionMode,
    cipher: Option<Cipher>,
}

impl Codec {
    pub fn new(mode: CompressionMode, cipher: Option<Cipher>) -> Self {
        Self { mode, cipher }
    }

    /// A codec without encryption.
    pub fn plain(mode: CompressionMode) -> Self {
        Self::new(mode, None)
    }

    pub fn mode(&self) -> CompressionMode {
        self.mode
    }

    pub fn cipher(&self) -> Option<&Cipher> {
        self.cipher.as_ref()
    }

    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    pub fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> CodecResult<String> {
        let json = serde_json::to_value(value).map_err(|e| CodecError::Encode(e.to_string()))?;
        let text = self.mode.encode(&json)?;
        match &self.cipher {
            Some(cipher) => cipher.encrypt(&text),
            None => Ok(text),
        }
    }

    pub fn deserialize<T: DeserializeOwned>(&self, text: &str) -> CodecResult<T> {
        let json = match &self.cipher {
            Some(cipher) => self.mode.decode(&cipher.decrypt(text)?)?,
            None => self.mode.decode(text)?,
        };
        serde_json::from_value(json).map_err(|e| CodecError::Decode(e.to_string()))
    }

    /// Apply only the encryption layer (used for raw attachment contents).
    pub fn seal(&self, text: &str) -> CodecResult<String> {
        match &self.cipher {
            Some(cipher) => cipher.encrypt(text),
            None => Ok(text.to_string()),
        }
    }

    /// Inverse of [`Codec::seal`].
    pub fn open(&self, text: &str) -> CodecResult<String> {
        match &self.cipher {
            Some(cipher) => cipher.decrypt(text),
            None => Ok(text.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn codecs() -> Vec<Codec> {
        let cipher = Cipher::from_passphrase("test-key").unwrap();
        CompressionMode::ALL
            .iter()
            .flat_map(|mode| {
                [
                    Codec::plain(*mode),
                    Codec::new(*mode, Some(cipher.clone())),
                ]
            })
            .collect()
    }

    fn sample() -> Value {
        json!({
            "name": "test_one",
            "nested": {"list": [1, 2, 3], "flag": true, "none": null},
            "unicode": "héllo wörld ✓",
            "big": u64::MAX,
            "neg": -42
        })
    }

    #[test]
    fn roundtrip_every_codec() {
        for codec in codecs() {
            let text = codec.serialize(&sample()).unwrap();
            let back: Value = codec.deserialize(&text).unwrap();
            assert_eq!(back, sample(), "mode {}", codec.mode());
        }
    }

    #[test]
    fn encrypted_output_hides_plaintext() {
        let codec = Codec::new(
            CompressionMode::None,
            Some(Cipher::from_passphrase("k").unwrap()),
        );
        let text = codec.serialize(&sample()).unwrap();
        assert!(!text.contains("test_one"));
        assert!(codec.is_encrypted());
    }

    #[test]
    fn wrong_key_is_a_decode_failure() {
        let writer = Codec::new(
            CompressionMode::Binary,
            Some(Cipher::from_passphrase("one").unwrap()),
        );
        let reader = Codec::new(
            CompressionMode::Binary,
            Some(Cipher::from_passphrase("two").unwrap()),
        );
        let text = writer.serialize(&sample()).unwrap();
        assert!(reader.deserialize::<Value>(&text).is_err());
    }

    #[test]
    fn plain_reader_cannot_read_encrypted_text() {
        let writer = Codec::new(
            CompressionMode::None,
            Some(Cipher::from_passphrase("one").unwrap()),
        );
        let text = writer.serialize(&sample()).unwrap();
        assert!(Codec::plain(CompressionMode::None)
            .deserialize::<Value>(&text)
            .is_err());
    }

    #[test]
    fn typed_deserialize_mismatch() {
        let codec = Codec::plain(CompressionMode::None);
        let text = codec.serialize(&json!({"a": 1})).unwrap();
        assert!(matches!(
            codec.deserialize::<Vec<u8>>(&text),
            Err(CodecError::Decode(_))
        ));
    }

    #[test]
    fn seal_and_open() {
        let plain = Codec::plain(CompressionMode::Pretty);
        assert_eq!(plain.seal("file body").unwrap(), "file body");

        let sealed = Codec::new(
            CompressionMode::Pretty,
            Some(Cipher::from_passphrase("k").unwrap()),
        );
        let ct = sealed.seal("file body").unwrap();
        assert_ne!(ct, "file body");
        assert_eq!(sealed.open(&ct).unwrap(), "file body");
    }

    #[test]
    fn floats_survive_every_mode() {
        let floats = [
            1.0715660391465826e-75,
            -1.81996730402717e-179,
            0.1 + 0.2,
            f64::MIN_POSITIVE,
            f64::MAX,
            -2.5e-308,
        ];
        for mode in CompressionMode::ALL {
            let codec = Codec::plain(mode);
            for f in floats {
                let value = json!({"f": f});
                let text = codec.serialize(&value).unwrap();
                let back: Value = codec.deserialize(&text).unwrap();
                assert_eq!(back["f"].as_f64(), Some(f), "mode {mode}");
            }
        }
    }

    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            any::<f64>()
                .prop_filter("finite", |f| f.is_finite())
                .prop_map(|f| json!(f)),
            "[a-zA-Z0-9 _.-]{0,16}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,8}", inner, 0..8)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_roundtrip(value in json_value(), mode_idx in 0usize..3, encrypted in any::<bool>()) {
            let mode = CompressionMode::ALL[mode_idx];
            let cipher = encrypted.then(|| Cipher::from_key([9u8; 32]));
            let codec = Codec::new(mode, cipher);
            let text = codec.serialize(&value).unwrap();
            let back: Value = codec.deserialize(&text).unwrap();
            prop_assert_eq!(back, value);
        }
    }
}
