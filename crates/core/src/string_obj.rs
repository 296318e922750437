use std::fmt;
use std::rc::Rc;

/// An immutable byte string.
///
/// Scripting strings are byte sequences, not necessarily valid UTF-8 (a
/// string literal may contain a `\xHH` escape for any byte value), so this
/// wraps `Rc<[u8]>` rather than `Rc<str>`. Cloning is an `Rc` bump, matching
/// the refcount-clone contract of `SPEC_FULL.md` §3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptString(Rc<[u8]>);

impl ScriptString {
    pub fn new(bytes: Vec<u8>) -> Self {
        ScriptString(Rc::from(bytes))
    }

    pub fn from_str(s: &str) -> Self {
        ScriptString(Rc::from(s.as_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// One-character (one-byte) substring at a possibly-negative index.
    /// `None` signals out of bounds, matching `index_string`'s `NULL` return.
    pub fn index(&self, idx: i64) -> Option<ScriptString> {
        let resolved = resolve_index(idx, self.0.len())?;
        Some(ScriptString::new(vec![self.0[resolved]]))
    }

    pub fn concat(&self, other: &ScriptString) -> ScriptString {
        if self.0.is_empty() {
            return other.clone();
        }
        if other.0.is_empty() {
            return self.clone();
        }
        let mut bytes = Vec::with_capacity(self.0.len() + other.0.len());
        bytes.extend_from_slice(&self.0);
        bytes.extend_from_slice(&other.0);
        ScriptString::new(bytes)
    }

    pub fn compare(&self, other: &ScriptString) -> std::cmp::Ordering {
        self.0.as_ref().cmp(other.0.as_ref())
    }

    /// Replicate `amnt` times; `amnt == 1` returns a clone, matching the
    /// original's `replicate_string` short-circuit.
    pub fn replicate(&self, amnt: u64) -> ScriptString {
        if amnt == 1 {
            return self.clone();
        }
        let mut bytes = Vec::with_capacity(self.0.len() * amnt as usize);
        for _ in 0..amnt {
            bytes.extend_from_slice(&self.0);
        }
        ScriptString::new(bytes)
    }

    /// Render a debug-quoted form, escaping control characters and
    /// non-printable bytes as `\xHH` (two correct hex nibbles — the
    /// original's `inspect_string` miscomputes the nibble for values above
    /// 9, a bug that is not reproduced here).
    pub fn inspect(&self) -> String {
        let mut out = String::with_capacity(self.0.len() + 2);
        out.push('"');
        for &byte in self.0.iter() {
            match byte {
                b'\n' => out.push_str("\\n"),
                b'\t' => out.push_str("\\t"),
                b'\r' => out.push_str("\\r"),
                0 => out.push_str("\\0"),
                0x0c => out.push_str("\\f"),
                b'\\' => out.push_str("\\\\"),
                b'\"' => out.push_str("\\\""),
                b'\'' => out.push_str("\\'"),
                b if b.is_ascii_graphic() || b == b' ' => out.push(b as char),
                b => out.push_str(&format!("\\x{:02x}", b)),
            }
        }
        out.push('"');
        out
    }
}

/// Shared negative-index resolution for strings and arrays: `i < 0` means
/// `length + i`; still negative, or `>= length`, is out of bounds.
pub fn resolve_index(idx: i64, length: usize) -> Option<usize> {
    let resolved = if idx < 0 { idx + length as i64 } else { idx };
    if resolved < 0 || resolved as usize >= length {
        None
    } else {
        Some(resolved as usize)
    }
}

impl fmt::Display for ScriptString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl From<&str> for ScriptString {
    fn from(s: &str) -> Self {
        ScriptString::from_str(s)
    }
}

impl From<String> for ScriptString {
    fn from(s: String) -> Self {
        ScriptString::new(s.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_empty_sides() {
        let a = ScriptString::from_str("");
        let b = ScriptString::from_str("hi");
        assert_eq!(a.concat(&b), ScriptString::from_str("hi"));
        assert_eq!(b.concat(&a), ScriptString::from_str("hi"));
    }

    #[test]
    fn negative_index() {
        let s = ScriptString::from_str("hello");
        assert_eq!(s.index(-1), Some(ScriptString::from_str("o")));
        assert_eq!(s.index(0), Some(ScriptString::from_str("h")));
        assert_eq!(s.index(5), None);
        assert_eq!(s.index(-6), None);
    }

    #[test]
    fn replicate_by_one_is_clone() {
        let s = ScriptString::from_str("ab");
        assert_eq!(s.replicate(1), s);
        assert_eq!(s.replicate(3), ScriptString::from_str("ababab"));
    }

    #[test]
    fn inspect_escapes_control_bytes() {
        let s = ScriptString::new(vec![b'a', b'\n', 0x01]);
        assert_eq!(s.inspect(), "\"a\\n\\x01\"");
    }

    #[test]
    fn compare_is_lexicographic() {
        assert!(ScriptString::from_str("abc").compare(&ScriptString::from_str("abd")).is_lt());
        assert!(ScriptString::from_str("ab").compare(&ScriptString::from_str("abc")).is_lt());
    }
}
