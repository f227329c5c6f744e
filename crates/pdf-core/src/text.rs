//! Text rendering utilities

use crate::document::Color;

/// Context for rendering text
pub struct TextRenderContext {
    /// PDF font resource name (e.g., "F1")
    pub font_name: String,
    /// Font size in points
    pub font_size: f32,
    /// Text color (RGB)
    pub color: Color,
}

/// Text encoded for a simple font with WinAnsiEncoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinAnsiText {
    /// PDF literal string including the enclosing parentheses
    pub literal: String,
    /// Number of characters that had no WinAnsi code and were replaced by '?'
    pub replaced: usize,
}

/// Map a character to its WinAnsiEncoding code
///
/// Latin-1 characters map to themselves; the 0x80-0x9F block holds the
/// typographic characters that Windows-1252 places there.
fn win_ansi_code(c: char) -> Option<u8> {
    match c {
        ' '..='~' => Some(c as u8),
        '\u{00A0}'..='\u{00FF}' => Some(c as u32 as u8),
        '€' => Some(0x80),
        '‚' => Some(0x82),
        '„' => Some(0x84),
        '…' => Some(0x85),
        '†' => Some(0x86),
        '‡' => Some(0x87),
        '‰' => Some(0x89),
        '‹' => Some(0x8B),
        'Œ' => Some(0x8C),
        '‘' => Some(0x91),
        '’' => Some(0x92),
        '“' => Some(0x93),
        '”' => Some(0x94),
        '•' => Some(0x95),
        '–' => Some(0x96),
        '—' => Some(0x97),
        '™' => Some(0x99),
        '›' => Some(0x9B),
        'œ' => Some(0x9C),
        '\t' => Some(b' '),
        _ => None,
    }
}

/// Encode text as a PDF literal string for a WinAnsi-encoded simple font
///
/// Parentheses and backslashes are escaped, bytes outside printable ASCII
/// are written as octal escapes.
///
/// # Example
/// ```
/// use pdf_core::encode_win_ansi;
/// assert_eq!(encode_win_ansi("Claim (A)").literal, "(Claim \\(A\\))");
/// assert_eq!(encode_win_ansi("Café").literal, "(Caf\\351)");
/// ```
pub fn encode_win_ansi(text: &str) -> WinAnsiText {
    let mut literal = String::with_capacity(text.len() + 2);
    let mut replaced = 0;

    literal.push('(');
    for c in text.chars() {
        let code = match win_ansi_code(c) {
            Some(code) => code,
            None => {
                replaced += 1;
                b'?'
            }
        };

        match code {
            b'(' | b')' | b'\\' => {
                literal.push('\\');
                literal.push(code as char);
            }
            0x20..=0x7E => literal.push(code as char),
            _ => literal.push_str(&format!("\\{code:03o}")),
        }
    }
    literal.push(')');

    WinAnsiText { literal, replaced }
}

/// Generate PDF operators for text insertion
///
/// Creates the PDF text operators (BT, rg, Tf, Td, Tj, ET) to render an
/// already-encoded literal string with its baseline starting at `(x, y)`.
///
/// # Arguments
/// * `literal` - Encoded PDF literal string (e.g., "(Hello)")
/// * `x` - X coordinate in points
/// * `y` - Y coordinate in points (from bottom)
/// * `ctx` - Text rendering context
pub fn generate_text_operators(literal: &str, x: f64, y: f64, ctx: &TextRenderContext) -> Vec<u8> {
    let mut ops = String::new();

    ops.push_str("BT\n");

    // Set text color (rg operator for non-stroking color)
    ops.push_str(&format!(
        "{} {} {} rg\n",
        ctx.color.r, ctx.color.g, ctx.color.b
    ));

    ops.push_str(&format!("/{} {} Tf\n", ctx.font_name, ctx.font_size));
    ops.push_str(&format!("{x} {y} Td\n"));
    ops.push_str(&format!("{literal} Tj\n"));
    ops.push_str("ET\n");

    ops.into_bytes()
}

/// Split text into lines based on maximum width
///
/// This is a simple implementation that splits on whitespace. Explicit
/// line breaks in the input are kept.
///
/// # Arguments
/// * `text` - Text to split
/// * `max_chars` - Maximum characters per line
pub fn simple_word_wrap(text: &str, max_chars: usize) -> Vec<String> {
    if max_chars == 0 {
        return at_least_one_line(text.lines().map(str::to_string).collect());
    }

    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current_line = String::new();

        for word in paragraph.split_whitespace() {
            if current_line.is_empty() {
                current_line = word.to_string();
            } else if current_line.chars().count() + 1 + word.chars().count() <= max_chars {
                current_line.push(' ');
                current_line.push_str(word);
            } else {
                lines.push(current_line);
                current_line = word.to_string();
            }
        }

        lines.push(current_line);
    }

    at_least_one_line(lines)
}

/// Empty input still renders as one (empty) line
fn at_least_one_line(mut lines: Vec<String>) -> Vec<String> {
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
