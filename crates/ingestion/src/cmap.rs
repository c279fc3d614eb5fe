//! ToUnicode CMap parsing
//!
//! Reads the `bfchar` and `bfrange` sections of a font's ToUnicode stream
//! into a code-to-text table. The code width comes from the first
//! `codespacerange` entry.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    Word(String),
    ArrayStart,
    ArrayEnd,
}

/// Code-to-text table of one font
#[derive(Debug, Clone, Default)]
pub struct ToUnicodeMap {
    width: usize,
    entries: HashMap<u32, String>,
}

impl ToUnicodeMap {
    /// Parse a CMap program; `default_width` applies when it declares no
    /// codespace range
    pub fn parse(program: &[u8], default_width: usize) -> Self {
        let tokens = tokenize(program);
        let mut map = ToUnicodeMap {
            width: 0,
            entries: HashMap::new(),
        };

        let mut i = 0;
        while i < tokens.len() {
            match &tokens[i] {
                Token::Word(w) if w == "begincodespacerange" => {
                    if let Some(Token::Hex(low)) = tokens.get(i + 1) {
                        if map.width == 0 && !low.is_empty() {
                            map.width = low.len();
                        }
                    }
                    i = skip_to(&tokens, i, "endcodespacerange");
                }
                Token::Word(w) if w == "beginbfchar" => {
                    i += 1;
                    while let (Some(Token::Hex(src)), Some(Token::Hex(dst))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        map.entries.insert(code(src), utf16be(dst));
                        i += 2;
                    }
                }
                Token::Word(w) if w == "beginbfrange" => {
                    i += 1;
                    while let (Some(Token::Hex(low)), Some(Token::Hex(high))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        let (low, high) = (code(low), code(high));
                        match tokens.get(i + 2) {
                            Some(Token::Hex(dst)) => {
                                map.insert_range(low, high, dst);
                                i += 3;
                            }
                            Some(Token::ArrayStart) => {
                                i += 3;
                                let mut offset = 0;
                                while let Some(Token::Hex(dst)) = tokens.get(i) {
                                    map.entries.insert(low + offset, utf16be(dst));
                                    offset += 1;
                                    i += 1;
                                }
                                if tokens.get(i) == Some(&Token::ArrayEnd) {
                                    i += 1;
                                }
                            }
                            _ => break,
                        }
                    }
                }
                _ => i += 1,
            }
        }

        if map.width == 0 {
            map.width = default_width.max(1);
        }
        map
    }

    fn insert_range(&mut self, low: u32, high: u32, dst: &[u8]) {
        let mut units: Vec<u16> = dst
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        let Some(last) = units.last().copied() else {
            return;
        };

        for (offset, source) in (low..=high).enumerate().take(u16::MAX as usize) {
            if let Some(slot) = units.last_mut() {
                *slot = last.wrapping_add(offset as u16);
            }
            self.entries.insert(source, String::from_utf16_lossy(&units));
        }
    }

    /// Decode a shown string; codes missing from the table are dropped
    pub fn decode(&self, bytes: &[u8]) -> String {
        bytes
            .chunks(self.width)
            .filter_map(|chunk| self.entries.get(&code(chunk)))
            .map(String::as_str)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn code(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn utf16be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [lo] => *lo as u16,
            _ => 0,
        })
        .collect();
    String::from_utf16_lossy(&units)
}

fn skip_to(tokens: &[Token], from: usize, end: &str) -> usize {
    tokens[from..]
        .iter()
        .position(|t| matches!(t, Token::Word(w) if w == end))
        .map(|p| from + p + 1)
        .unwrap_or(tokens.len())
}

fn tokenize(program: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < program.len() {
        match program[i] {
            b'%' => {
                while i < program.len() && program[i] != b'\n' && program[i] != b'\r' {
                    i += 1;
                }
            }
            b'<' if program.get(i + 1) == Some(&b'<') => i += 2,
            b'>' if program.get(i + 1) == Some(&b'>') => i += 2,
            b'<' => {
                let start = i + 1;
                let end = program[start..]
                    .iter()
                    .position(|&b| b == b'>')
                    .map_or(program.len(), |p| start + p);
                tokens.push(Token::Hex(hex_bytes(&program[start..end])));
                i = end + 1;
            }
            b'[' => {
                tokens.push(Token::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(Token::ArrayEnd);
                i += 1;
            }
            b if b.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < program.len()
                    && !program[i].is_ascii_whitespace()
                    && !matches!(program[i], b'<' | b'>' | b'[' | b']' | b'%')
                {
                    i += 1;
                }
                tokens.push(Token::Word(
                    String::from_utf8_lossy(&program[start..i]).into_owned(),
                ));
            }
        }
    }

    tokens
}

fn hex_bytes(digits: &[u8]) -> Vec<u8> {
    let nibbles: Vec<u8> = digits
        .iter()
        .filter_map(|&d| (d as char).to_digit(16).map(|n| n as u8))
        .collect();

    nibbles
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => (hi << 4) | lo,
            [hi] => hi << 4,
            _ => 0,
        })
        .collect()
}
