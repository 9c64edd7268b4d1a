//! Text and hex program formats.
//!
//! Text format, one instruction per line:
//! - Only `0` and `1` characters are collected; everything else is ignored
//! - A `#` ends the line (comment)
//! - The line is an instruction only if exactly 13 bits were collected;
//!   any other line is skipped
//!
//! Hex format, one instruction per line:
//! - The first 4 characters, with surrounding whitespace and an optional
//!   `0x` prefix removed, are a hexadecimal number
//! - The value keeps its low 13 bits
//! - Lines whose first 4 characters hold no hex number are skipped

use crate::asm::disasm::disassemble_instruction;
use crate::bits::InstructionWord;

/// A source line that was not an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line: usize,
    pub reason: SkipReason,
}

/// Why a line was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Collected this many bits instead of 13.
    BitCount(usize),
    /// The first 4 characters held no hexadecimal number.
    NotHex,
}

/// Result of parsing a program source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedProgram {
    pub words: Vec<InstructionWord>,
    pub skipped: Vec<SkippedLine>,
}

/// Parse the binary text format.
pub fn parse_text(source: &str) -> ParsedProgram {
    let mut program = ParsedProgram::default();

    for (line_num, line) in source.lines().enumerate() {
        let code = line.split('#').next().unwrap_or("");
        let mut raw = 0u16;
        let mut count = 0usize;
        for c in code.chars() {
            let bit = match c {
                '0' => 0,
                '1' => 1,
                _ => continue,
            };
            // Over-long lines are masked here and rejected by the count below
            raw = (raw << 1 | bit) & InstructionWord::MASK;
            count += 1;
        }

        if count == InstructionWord::WIDTH {
            program.words.push(InstructionWord::from_raw(raw));
        } else {
            if count > 0 {
                log::debug!("line {}: {} bits, skipped", line_num + 1, count);
            }
            program.skipped.push(SkippedLine {
                line: line_num + 1,
                reason: SkipReason::BitCount(count),
            });
        }
    }

    program
}

/// Parse the hex format.
pub fn parse_hex(source: &str) -> ParsedProgram {
    let mut program = ParsedProgram::default();

    for (line_num, line) in source.lines().enumerate() {
        let field: String = line.chars().take(4).collect();
        match hex_field(&field) {
            Some(value) => {
                program.words.push(InstructionWord::from_raw(value));
            }
            None => {
                if !line.trim().is_empty() {
                    log::warn!("line {}: '{}' is not a hex instruction, skipped", line_num + 1, line.trim());
                }
                program.skipped.push(SkippedLine {
                    line: line_num + 1,
                    reason: SkipReason::NotHex,
                });
            }
        }
    }

    program
}

/// Value of a hex field such as `0E05`, `E05 ` or ` 1F`.
fn hex_field(field: &str) -> Option<u16> {
    let field = field.trim();
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}

/// Render words in the text format, one per line with a comment.
pub fn render_text(words: &[InstructionWord]) -> String {
    let mut output = String::new();
    for (addr, word) in words.iter().enumerate() {
        output.push_str(&format!(
            "{} # {:02}: {}\n",
            word,
            addr,
            disassemble_instruction(*word)
        ));
    }
    output
}

/// Render words in the hex format.
pub fn render_hex(words: &[InstructionWord]) -> String {
    words.iter().map(|w| format!("{:04X}\n", w.raw())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_accepts_13_bit_lines() {
        let source = "0111000000101 # LD r0, 5\n0100 0 00000011\n";
        let program = parse_text(source);
        assert_eq!(program.words.len(), 2);
        assert_eq!(program.words[0].raw(), 0b0111_0_0000_0101);
        assert_eq!(program.words[1].raw(), 0b0100_0_0000_0011);
        assert!(program.skipped.is_empty());
    }

    #[test]
    fn test_text_comment_truncates() {
        // Bits after '#' do not count
        let program = parse_text("011100000 # 0101\n");
        assert!(program.words.is_empty());
        assert_eq!(program.skipped[0].reason, SkipReason::BitCount(9));
    }

    #[test]
    fn test_text_skips_wrong_lengths() {
        let source = "\n# header\n01110000001010\n011100000010\nLD: 0111000000101\n";
        let program = parse_text(source);
        assert_eq!(program.words.len(), 1);
        assert_eq!(program.words[0].raw(), 0b0111_0_0000_0101);
        let reasons: Vec<_> = program.skipped.iter().map(|s| s.reason).collect();
        assert_eq!(
            reasons,
            vec![
                SkipReason::BitCount(0),
                SkipReason::BitCount(0),
                SkipReason::BitCount(14),
                SkipReason::BitCount(12),
            ]
        );
    }

    #[test]
    fn test_hex_parsing() {
        let program = parse_hex("0E05\n1fff trailing\nFFFF\n");
        let raw: Vec<u16> = program.words.iter().map(|w| w.raw()).collect();
        assert_eq!(raw, vec![0x0E05, 0x1FFF, 0x1FFF]);
    }

    #[test]
    fn test_hex_skips_malformed() {
        let program = parse_hex("zz00\n12\n\n0001\n-1\n1 2\n");
        let raw: Vec<u16> = program.words.iter().map(|w| w.raw()).collect();
        assert_eq!(raw, vec![0x12, 0x0001]);
        let lines: Vec<usize> = program.skipped.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![1, 3, 5, 6]);
        assert!(program.skipped.iter().all(|s| s.reason == SkipReason::NotHex));
    }

    #[test]
    fn test_hex_short_fields_keep_addresses() {
        // Short or padded fields still occupy their own address
        let program = parse_hex("E05\n0E05\n 1F\nE05 # LD r0, 5\n0x1F\n");
        let raw: Vec<u16> = program.words.iter().map(|w| w.raw()).collect();
        assert_eq!(raw, vec![0x0E05, 0x0E05, 0x001F, 0x0E05, 0x001F]);
        assert!(program.skipped.is_empty());
    }

    #[test]
    fn test_rendered_text_parses_back() {
        let words = vec![InstructionWord::from_raw(0x0E05), InstructionWord::from_raw(0x0800)];
        let program = parse_text(&render_text(&words));
        assert_eq!(program.words, words);

        let program = parse_hex(&render_hex(&words));
        assert_eq!(program.words, words);
    }
}
