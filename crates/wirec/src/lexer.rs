//! Splits schema text into declaration blocks.
//!
//! A block is a run of non-blank lines; blank or whitespace-only lines separate blocks. Lines
//! whose first non-blank character is `#` are dropped without ending the block they sit in.

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::language::{keywords, limits};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based line number in the schema text.
    pub number: u32,
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub lines: Vec<Line>,
}

impl Block {
    pub fn header(&self) -> &Line {
        &self.lines[0]
    }

    pub fn body(&self) -> &[Line] {
        &self.lines[1..]
    }
}

pub fn split_blocks(src: &str) -> Result<Vec<Block>, Diagnostic> {
    let max = limits::max_schema_bytes();
    if src.len() > max {
        return Err(Diagnostic::error(
            DiagnosticCode::WC0001MalformedSchema,
            format!("schema is {} bytes; the limit is {max}", src.len()),
        ));
    }

    let mut blocks = Vec::new();
    let mut current: Vec<Line> = Vec::new();
    for (idx, raw) in src.split('\n').enumerate() {
        let number = u32::try_from(idx + 1).unwrap_or(u32::MAX);
        let text = raw.strip_suffix('\r').unwrap_or(raw).trim();
        if text.is_empty() {
            if !current.is_empty() {
                blocks.push(Block {
                    lines: std::mem::take(&mut current),
                });
            }
            continue;
        }
        if text.starts_with(keywords::COMMENT_PREFIX) {
            continue;
        }
        current.push(Line {
            number,
            tokens: text.split_whitespace().map(str::to_string).collect(),
        });
    }
    if !current.is_empty() {
        blocks.push(Block { lines: current });
    }

    if blocks.is_empty() {
        return Err(Diagnostic::error(
            DiagnosticCode::WC0001MalformedSchema,
            "schema contains no declarations",
        ));
    }
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(block: &Block) -> Vec<Vec<&str>> {
        block
            .lines
            .iter()
            .map(|l| l.tokens.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn blank_and_whitespace_lines_separate_blocks() {
        let src = "message A\nint x\n   \t\nmessage B\n\n\nserver Get A B\n";
        let blocks = split_blocks(src).expect("split");
        assert_eq!(blocks.len(), 3);
        assert_eq!(tokens(&blocks[0]), vec![vec!["message", "A"], vec!["int", "x"]]);
        assert_eq!(blocks[1].header().number, 4);
        assert_eq!(blocks[2].header().number, 7);
    }

    #[test]
    fn crlf_and_comments_are_ignored() {
        let src = "# header comment\r\nmessage A\r\n  # inline note\r\nstring 32 name\r\n";
        let blocks = split_blocks(src).expect("split");
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            tokens(&blocks[0]),
            vec![vec!["message", "A"], vec!["string", "32", "name"]]
        );
        assert_eq!(blocks[0].body()[0].number, 4);
    }

    #[test]
    fn empty_or_comment_only_schema_is_malformed() {
        for src in ["", "\n\n  \n", "# nothing here\n"] {
            let err = split_blocks(src).expect_err("must fail");
            assert_eq!(err.code, DiagnosticCode::WC0001MalformedSchema);
        }
    }
}
