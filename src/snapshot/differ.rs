//! Pluggable diff rendering (§6.4 "Differ (external)").
//!
//! The store never inspects a differ's internals — it hands over two byte
//! sequences and a content-type hint and treats the rendered string as
//! opaque. [`LineDiffer`] is the default, in-crate implementation; it is
//! intentionally simple since the differ itself is explicitly out of scope
//! for correctness (spec.md's §1 non-goals list "diff renderer").

use super::ContentType;

/// Renders a human-readable diff between an expected and an actual byte
/// sequence, given a content-type hint.
#[cfg_attr(test, mockall::automock)]
pub trait Differ: Send + Sync {
    fn render_diff(&self, expected: &[u8], actual: &[u8], content_type: ContentType) -> String;
}

/// Line-oriented differ for text/structured content; falls back to a
/// hex-offset summary for binary content, where line boundaries are
/// meaningless.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineDiffer;

impl Differ for LineDiffer {
    fn render_diff(&self, expected: &[u8], actual: &[u8], content_type: ContentType) -> String {
        match content_type {
            ContentType::Binary => render_binary_diff(expected, actual),
            ContentType::Text | ContentType::Structured => render_line_diff(expected, actual),
        }
    }
}

fn render_line_diff(expected: &[u8], actual: &[u8]) -> String {
    let expected_text = String::from_utf8_lossy(expected);
    let actual_text = String::from_utf8_lossy(actual);
    let expected_lines: Vec<&str> = expected_text.lines().collect();
    let actual_lines: Vec<&str> = actual_text.lines().collect();

    let mut out = String::new();
    let max_lines = expected_lines.len().max(actual_lines.len());
    for i in 0..max_lines {
        let e = expected_lines.get(i).copied();
        let a = actual_lines.get(i).copied();
        if e == a {
            continue;
        }
        if let Some(e) = e {
            out.push_str(&format!("-{e}\n"));
        }
        if let Some(a) = a {
            out.push_str(&format!("+{a}\n"));
        }
    }
    if out.is_empty() {
        out.push_str("(byte-identical under UTF-8 lossy decoding, but raw bytes differ)\n");
    }
    out
}

/// Offsets where the two buffers diverge, in `offset: expected actual` form,
/// capped to avoid producing an unbounded report for large binaries.
fn render_binary_diff(expected: &[u8], actual: &[u8]) -> String {
    const MAX_REPORTED: usize = 32;
    let mut out = format!(
        "binary mismatch: expected {} bytes, actual {} bytes\n",
        expected.len(),
        actual.len()
    );
    let common = expected.len().min(actual.len());
    let mut reported = 0;
    for i in 0..common {
        if expected[i] != actual[i] {
            out.push_str(&format!("  offset {i:#x}: expected {:#04x} actual {:#04x}\n", expected[i], actual[i]));
            reported += 1;
            if reported >= MAX_REPORTED {
                out.push_str("  ...\n");
                break;
            }
        }
    }
    out
}
