//! Splicing printer
//!
//! A pruned module is its original text with a set of byte ranges cut
//! out. A cut may leave a short replacement behind. Printing merges the
//! cuts and copies everything else.

use std::ops::Range;

/// One cut in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub range: Range<usize>,
    /// Text written in place of the range
    pub replacement: &'static str,
}

impl Splice {
    pub fn delete(range: Range<usize>) -> Self {
        Self {
            range,
            replacement: "",
        }
    }

    pub fn replace(range: Range<usize>, replacement: &'static str) -> Self {
        Self { range, replacement }
    }
}

/// Regenerate source text with `splices` applied.
///
/// Ranges may overlap or nest and come in any order. A splice covered
/// by an earlier, wider one is dropped along with its replacement.
pub fn print(source: &str, splices: &[Splice]) -> String {
    let mut splices: Vec<Splice> = splices
        .iter()
        .filter(|s| s.range.start < s.range.end)
        .map(|s| Splice {
            range: s.range.start.min(source.len())..s.range.end.min(source.len()),
            replacement: s.replacement,
        })
        .collect();
    splices.sort_by_key(|s| (s.range.start, std::cmp::Reverse(s.range.end)));

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for splice in splices {
        if splice.range.end <= cursor {
            continue;
        }
        let start = splice.range.start.max(cursor);
        out.push_str(&source[cursor..start]);
        out.push_str(splice.replacement);
        cursor = splice.range.end;
    }
    out.push_str(&source[cursor..]);
    out
}

/// Widen the range of a whole statement so deleting it leaves no debris.
///
/// A statement alone on its line(s) takes the line with it, indentation
/// and line break included. Otherwise trailing spaces are consumed.
pub fn statement_span(source: &str, range: Range<usize>) -> Range<usize> {
    let bytes = source.as_bytes();

    let mut start = range.start;
    while start > 0 && matches!(bytes[start - 1], b' ' | b'\t') {
        start -= 1;
    }
    let starts_line = start == 0 || bytes[start - 1] == b'\n';

    let mut end = range.end;
    while end < bytes.len() && matches!(bytes[end], b' ' | b'\t') {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'\r' {
        end += 1;
    }
    let ends_line = end == bytes.len() || bytes[end] == b'\n';

    if starts_line && ends_line {
        if end < bytes.len() {
            end += 1;
        }
        start..end
    } else {
        range.start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deletes(ranges: &[Range<usize>]) -> Vec<Splice> {
        ranges.iter().cloned().map(Splice::delete).collect()
    }

    #[test]
    fn test_print_without_removals() {
        assert_eq!(print("let a = 1;", &[]), "let a = 1;");
    }

    #[test]
    fn test_print_merges_overlaps() {
        let source = "0123456789";
        assert_eq!(print(source, &deletes(&[5..8, 1..3, 2..4, 6..7])), "0489");
    }

    #[test]
    fn test_print_replacement() {
        let source = "a()\nfunction f() {}\n[1].map(g)\n";
        let start = source.find("function").unwrap();
        let span = statement_span(source, start..start + "function f() {}".len());
        assert_eq!(print(source, &[Splice::replace(span, ";")]), "a()\n;[1].map(g)\n");
    }

    #[test]
    fn test_nested_replacement_is_dropped() {
        let source = "0123456789";
        let splices = [Splice::replace(2..4, ";"), Splice::delete(1..6)];
        assert_eq!(print(source, &splices), "06789");
    }

    #[test]
    fn test_statement_span_inline() {
        let source = "function used(){} function unused(){} used();";
        let start = source.find("function unused").unwrap();
        let end = start + "function unused(){}".len();
        let span = statement_span(source, start..end);
        assert_eq!(print(source, &[Splice::delete(span)]), "function used(){} used();");
    }

    #[test]
    fn test_statement_span_whole_line() {
        let source = "let a = 1;\n    let b = 2;\nuse(a);\n";
        let start = source.find("let b").unwrap();
        let span = statement_span(source, start..start + "let b = 2;".len());
        assert_eq!(print(source, &[Splice::delete(span)]), "let a = 1;\nuse(a);\n");
    }
}
