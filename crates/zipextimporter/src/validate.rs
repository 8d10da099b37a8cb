//! Binary signature validation.
//!
//! Entries matched under a secondary binary suffix (a generic shared
//! library, or a bare filename) are only accepted when their bytes
//! contain the expected initialization entry-point symbol. This is a
//! substring heuristic, not a symbol-table parse: it exists to skip
//! look-alike files that share a module's name, and it can be fooled by
//! obfuscated binaries. Canonical-suffix entries bypass it entirely.

use memchr::memmem;

pub fn is_genuine_extension(data: &[u8], init_symbol: &str) -> bool {
    memmem::find(data, init_symbol.as_bytes()).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_embedded_symbol() {
        let mut data = vec![0u8; 64];
        data.extend_from_slice(b"\0PyInit_spam\0");
        data.extend_from_slice(&[0u8; 32]);
        assert!(is_genuine_extension(&data, "PyInit_spam"));
    }

    #[test]
    fn rejects_bytes_without_symbol() {
        let data = b"MZ\x90\x00just some resource data".to_vec();
        assert!(!is_genuine_extension(&data, "PyInit_spam"));
    }
}
