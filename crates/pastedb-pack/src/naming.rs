//! Chunk part naming: `<key>_<index>.json`.

use pastedb_types::Key;

const CHUNK_SUFFIX: &str = ".json";

/// Name of chunk `index` of the document stored under `key`.
pub fn chunk_name(key: &Key, index: usize) -> String {
    format!("{}_{index}{CHUNK_SUFFIX}", key.as_str())
}

/// The chunk index encoded in `name`, or `None` if `name` is not a chunk.
///
/// Anything that does not end in `_<digits>.json` (for instance the
/// root index part `database.json`) is not a chunk.
pub fn chunk_index(name: &str) -> Option<usize> {
    let stem = name.strip_suffix(CHUNK_SUFFIX)?;
    let (prefix, digits) = stem.rsplit_once('_')?;
    if prefix.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

pub fn is_chunk_name(name: &str) -> bool {
    chunk_index(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_convention() {
        let key = Key::from(["users", "42"]);
        assert_eq!(chunk_name(&key, 0), "users.42_0.json");
        assert_eq!(chunk_name(&key, 7), "users.42_7.json");
    }

    #[test]
    fn parse_back_index() {
        let key = Key::from("my_key");
        for i in [0, 1, 9, 123] {
            assert_eq!(chunk_index(&chunk_name(&key, i)), Some(i));
        }
    }

    #[test]
    fn unrelated_parts_are_not_chunks() {
        for name in [
            "database.json",
            "ttl.json",
            "_1.json",
            "key_.json",
            "key_1a.json",
            "key_1.txt",
            "key_-1.json",
            "notes.md",
        ] {
            assert!(!is_chunk_name(name), "{name} should not be a chunk");
        }
    }
}
