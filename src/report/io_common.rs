use log::warn;
use std::path::Path;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Decodes the bytes of an export as UTF-8, or as Windows-1252 when they are
/// not valid UTF-8. A leading byte order mark is dropped.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.strip_prefix('\u{feff}').unwrap_or(s).to_string(),
        Err(e) => {
            warn!(
                "decode_text: the content is not valid UTF-8 ({}), reading it as Windows-1252",
                e
            );
            let (decoded, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
            decoded.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("/tmp/exports/forum.csv"), "forum.csv");
        assert_eq!(simplify_file_name("forum.csv"), "forum.csv");
    }

    #[test]
    fn utf8_with_bom() {
        assert_eq!(decode_text("\u{feff}Accueil.Très".as_bytes()), "Accueil.Très");
    }

    #[test]
    fn latin1_fallback() {
        // "Très satisfait" in Latin-1
        let bytes = b"Tr\xe8s satisfait";
        assert_eq!(decode_text(bytes), "Très satisfait");
    }
}
