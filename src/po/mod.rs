pub(crate) mod lines;
pub mod scanner;

pub use scanner::{LineScanner, ScanItem, ScanMode, SearchMode};

pub(crate) const HEADER_ID_PREFIX: &str = "msgid \"\"";
pub(crate) const ID_PREFIX: &str = "msgid ";
pub(crate) const STR_PREFIX: &str = "msgstr ";
pub const EMPTY_TRANSLATION: &str = "msgstr \"\"";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `msgid ""`, opens the header block.
    HeaderId,
    MsgId,
    MsgStr,
    Other,
}

pub fn classify(line: &str) -> LineKind {
    if line.starts_with(HEADER_ID_PREFIX) {
        LineKind::HeaderId
    } else if line.starts_with(ID_PREFIX) {
        LineKind::MsgId
    } else if line.starts_with(STR_PREFIX) {
        LineKind::MsgStr
    } else {
        LineKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_subset_lines() {
        assert_eq!(classify("msgid \"\""), LineKind::HeaderId);
        assert_eq!(classify("msgid \"hello\""), LineKind::MsgId);
        assert_eq!(classify("msgstr \"\""), LineKind::MsgStr);
        assert_eq!(classify("msgstr[0] \"x\""), LineKind::Other);
        assert_eq!(classify("msgid_plural \"x\""), LineKind::Other);
        assert_eq!(classify("#, fuzzy"), LineKind::Other);
        assert_eq!(classify("\"continued\""), LineKind::Other);
    }
}
