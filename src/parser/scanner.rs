/// Raw text of one node, as cut out of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeToken<'a> {
    /// Node text with surrounding whitespace trimmed.
    pub text: &'a str,
    /// Byte index where scanning stopped: the terminating `;`, `(` or `)`,
    /// or the input length.
    pub end: usize,
}

/// True if the byte at `idx` is preceded by a backslash.
pub(crate) fn is_escaped(bytes: &[u8], idx: usize) -> bool {
    idx > 0 && bytes[idx - 1] == b'\\'
}

/// Cuts out the node starting after the `;` at `start`.
///
/// Scanning stops at the next unescaped `;`, `(` or `)`. A `C[` comment is
/// opaque to those delimiters until its closing unescaped `]`. Unterminated
/// comments and nodes run to end of input.
pub(crate) fn scan_node(input: &str, start: usize) -> NodeToken<'_> {
    let bytes = input.as_bytes();
    let from = start + 1;
    let mut in_comment = false;
    let mut end = bytes.len();

    let mut j = from;
    while j < bytes.len() {
        let b = bytes[j];
        if in_comment {
            if b == b']' && !is_escaped(bytes, j) {
                in_comment = false;
            }
        } else if b == b'C' && bytes.get(j + 1) == Some(&b'[') {
            in_comment = true;
        } else if matches!(b, b';' | b'(' | b')') && !is_escaped(bytes, j) {
            end = j;
            break;
        }
        j += 1;
    }

    // Delimiters are ASCII, so `from..end` always falls on char boundaries.
    NodeToken {
        text: input[from.min(end)..end].trim(),
        end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_stops_at_next_semicolon() {
        let input = ";B[aa];W[bb]";
        let token = scan_node(input, 0);
        assert_eq!(token.text, "B[aa]");
        assert_eq!(token.end, 6);
    }

    #[test]
    fn test_scan_stops_at_parentheses() {
        assert_eq!(scan_node(";B[aa](;W[bb])", 0).text, "B[aa]");
        assert_eq!(scan_node(";W[bb])", 0).text, "W[bb]");
    }

    #[test]
    fn test_scan_trims_whitespace_but_reports_untrimmed_end() {
        let input = ";  B[aa] \n;W[bb]";
        let token = scan_node(input, 0);
        assert_eq!(token.text, "B[aa]");
        assert_eq!(token.end, 10);
        assert_eq!(&input[token.end..token.end + 1], ";");
    }

    #[test]
    fn test_scan_comment_is_opaque_to_delimiters() {
        let input = ";C[has ; and ) inside]B[aa])";
        let token = scan_node(input, 0);
        assert_eq!(token.text, "C[has ; and ) inside]B[aa]");
        assert_eq!(&input[token.end..], ")");
    }

    #[test]
    fn test_scan_escaped_bracket_does_not_close_comment() {
        let input = r";C[a \] (b) ; c]B[aa];";
        let token = scan_node(input, 0);
        assert_eq!(token.text, r"C[a \] (b) ; c]B[aa]");
    }

    #[test]
    fn test_scan_escaped_delimiter_does_not_terminate() {
        let input = r";LB[aa:x\;y];W[bb]";
        let token = scan_node(input, 0);
        assert_eq!(token.text, r"LB[aa:x\;y]");
    }

    #[test]
    fn test_scan_unterminated_comment_runs_to_end() {
        let input = ";C[never closed ; (";
        let token = scan_node(input, 0);
        assert_eq!(token.text, "C[never closed ; (");
        assert_eq!(token.end, input.len());
    }

    #[test]
    fn test_scan_trailing_c_at_end_of_input() {
        let token = scan_node(";GC", 0);
        assert_eq!(token.text, "GC");
    }

    #[test]
    fn test_scan_semicolon_at_end_of_input() {
        let token = scan_node("(;", 1);
        assert_eq!(token.text, "");
        assert_eq!(token.end, 2);
    }

    #[test]
    fn test_scan_multibyte_text_in_comment() {
        let input = ";C[黒番 ; 勝ち]B[aa]";
        let token = scan_node(input, 0);
        assert_eq!(token.text, "C[黒番 ; 勝ち]B[aa]");
    }

    #[test]
    fn test_is_escaped() {
        let bytes = br"a\;;";
        assert!(!is_escaped(bytes, 0));
        assert!(is_escaped(bytes, 2));
        assert!(!is_escaped(bytes, 3));
    }
}
