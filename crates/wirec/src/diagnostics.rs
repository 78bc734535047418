use std::fmt;

use serde::{Serialize, Serializer};
use wirec_contracts::WIREC_DIAG_SCHEMA_VERSION;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Phase {
    Lex,
    Parse,
    Resolve,
    Assign,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticCode {
    WC0001MalformedSchema,
    WC0002UnknownDeclarationKeyword,
    WC0003MissingProcedureName,
    WC0100InvalidTypeExpression,
    WC0101InvalidIdentifier,
    WC0200UnresolvedMessageReference,
    WC0201DuplicateDeclarationName,
    WC0202DuplicateFieldName,
    WC0203RecursiveMessage,
    WC0204NonEmptyCanonicalMessage,
    WC0300OpcodeSpaceExhausted,
    WC0901InternalBug,
}

impl DiagnosticCode {
    pub fn code_str(self) -> &'static str {
        match self {
            DiagnosticCode::WC0001MalformedSchema => "WC0001",
            DiagnosticCode::WC0002UnknownDeclarationKeyword => "WC0002",
            DiagnosticCode::WC0003MissingProcedureName => "WC0003",
            DiagnosticCode::WC0100InvalidTypeExpression => "WC0100",
            DiagnosticCode::WC0101InvalidIdentifier => "WC0101",
            DiagnosticCode::WC0200UnresolvedMessageReference => "WC0200",
            DiagnosticCode::WC0201DuplicateDeclarationName => "WC0201",
            DiagnosticCode::WC0202DuplicateFieldName => "WC0202",
            DiagnosticCode::WC0203RecursiveMessage => "WC0203",
            DiagnosticCode::WC0204NonEmptyCanonicalMessage => "WC0204",
            DiagnosticCode::WC0300OpcodeSpaceExhausted => "WC0300",
            DiagnosticCode::WC0901InternalBug => "WC0901",
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            DiagnosticCode::WC0001MalformedSchema => "schema text is malformed",
            DiagnosticCode::WC0002UnknownDeclarationKeyword => "unknown declaration keyword",
            DiagnosticCode::WC0003MissingProcedureName => "procedure declaration has no name",
            DiagnosticCode::WC0100InvalidTypeExpression => "invalid field type expression",
            DiagnosticCode::WC0101InvalidIdentifier => "invalid identifier",
            DiagnosticCode::WC0200UnresolvedMessageReference => {
                "reference to an undeclared message"
            }
            DiagnosticCode::WC0201DuplicateDeclarationName => "duplicate declaration name",
            DiagnosticCode::WC0202DuplicateFieldName => "duplicate field name",
            DiagnosticCode::WC0203RecursiveMessage => "message contains itself by value",
            DiagnosticCode::WC0204NonEmptyCanonicalMessage => "canonical empty message has fields",
            DiagnosticCode::WC0300OpcodeSpaceExhausted => {
                "too many declarations for the opcode space"
            }
            DiagnosticCode::WC0901InternalBug => "internal wirec bug",
        }
    }

    pub fn default_help(self) -> Option<&'static str> {
        match self {
            DiagnosticCode::WC0001MalformedSchema => Some(
                "Separate declarations with a blank line; \
                 comments start with `#` at the beginning of a line.",
            ),
            DiagnosticCode::WC0002UnknownDeclarationKeyword => {
                Some("A declaration starts with `message`, `server` or `client`.")
            }
            DiagnosticCode::WC0100InvalidTypeExpression => Some(
                "Field types are `int`, `uint`, `bool`, `string [capacity]`, \
                 `list <type>` or a message name.",
            ),
            DiagnosticCode::WC0203RecursiveMessage => {
                Some("Wrap the self-referencing field in `list` to break the cycle.")
            }
            DiagnosticCode::WC0204NonEmptyCanonicalMessage => {
                Some("`Empty` is the implicit request/response type; declare it without fields.")
            }
            DiagnosticCode::WC0300OpcodeSpaceExhausted => Some(
                "At most 255 messages and 127 procedures per direction fit in one opcode byte.",
            ),
            DiagnosticCode::WC0901InternalBug => {
                Some("This is a bug in wirec. Please report it with the input schema.")
            }
            _ => None,
        }
    }

    pub fn phase(self) -> Phase {
        match self {
            DiagnosticCode::WC0001MalformedSchema => Phase::Lex,
            DiagnosticCode::WC0002UnknownDeclarationKeyword
            | DiagnosticCode::WC0003MissingProcedureName
            | DiagnosticCode::WC0100InvalidTypeExpression
            | DiagnosticCode::WC0101InvalidIdentifier => Phase::Parse,
            DiagnosticCode::WC0200UnresolvedMessageReference
            | DiagnosticCode::WC0201DuplicateDeclarationName
            | DiagnosticCode::WC0202DuplicateFieldName
            | DiagnosticCode::WC0203RecursiveMessage
            | DiagnosticCode::WC0204NonEmptyCanonicalMessage => Phase::Resolve,
            DiagnosticCode::WC0300OpcodeSpaceExhausted => Phase::Assign,
            DiagnosticCode::WC0901InternalBug => Phase::Internal,
        }
    }
}

impl Serialize for DiagnosticCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub phase: Phase,
    pub severity: Severity,
    pub message: String,
    pub help: Option<String>,
    /// 1-based schema line the problem was found on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl Diagnostic {
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Diagnostic {
            code,
            phase: code.phase(),
            severity: Severity::Error,
            message: message.into(),
            help: code.default_help().map(|s| s.to_string()),
            line: None,
        }
    }

    pub fn at_line(mut self, line: u32) -> Self {
        if line > 0 {
            self.line = Some(line);
        }
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?} {:?}: {}",
            self.code.code_str(),
            self.phase,
            self.severity,
            self.message
        )?;
        if let Some(line) = self.line {
            write!(f, " (line {line})")?;
        }
        if let Some(help) = &self.help {
            write!(f, "\n  help: {help}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

pub fn render_diagnostics_md() -> String {
    let mut out = String::new();
    out.push_str("# wirec diagnostics catalog\n\n");
    out.push_str("This document is generated from `crates/wirec/src/diagnostics.rs`.\n\n");
    out.push_str(&format!("Catalog version: `{WIREC_DIAG_SCHEMA_VERSION}`.\n\n"));
    out.push_str("| Code | Phase | Severity | Message | Help |\n");
    out.push_str("| ---- | ----- | -------- | ------- | ---- |\n");
    for code in all_codes() {
        out.push_str(&format!(
            "| {} | {:?} | {:?} | {} | {} |\n",
            code.code_str(),
            code.phase(),
            Severity::Error,
            code.default_message(),
            code.default_help().unwrap_or("")
        ));
    }
    out
}

pub fn all_codes() -> &'static [DiagnosticCode] {
    &[
        DiagnosticCode::WC0001MalformedSchema,
        DiagnosticCode::WC0002UnknownDeclarationKeyword,
        DiagnosticCode::WC0003MissingProcedureName,
        DiagnosticCode::WC0100InvalidTypeExpression,
        DiagnosticCode::WC0101InvalidIdentifier,
        DiagnosticCode::WC0200UnresolvedMessageReference,
        DiagnosticCode::WC0201DuplicateDeclarationName,
        DiagnosticCode::WC0202DuplicateFieldName,
        DiagnosticCode::WC0203RecursiveMessage,
        DiagnosticCode::WC0204NonEmptyCanonicalMessage,
        DiagnosticCode::WC0300OpcodeSpaceExhausted,
        DiagnosticCode::WC0901InternalBug,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unique_and_sorted() {
        let codes: Vec<&str> = all_codes().iter().map(|c| c.code_str()).collect();
        let mut sorted = codes.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(codes, sorted);
    }

    #[test]
    fn display_includes_line_and_help() {
        let d = Diagnostic::error(DiagnosticCode::WC0203RecursiveMessage, "Node contains Node")
            .at_line(4);
        let s = d.to_string();
        assert!(s.starts_with("WC0203 Resolve Error: Node contains Node (line 4)"));
        assert!(s.contains("help: Wrap"));
    }

    #[test]
    fn serializes_code_as_string() {
        let d = Diagnostic::error(DiagnosticCode::WC0001MalformedSchema, "empty");
        let v = serde_json::to_value(&d).expect("serialize");
        assert_eq!(v["code"], "WC0001");
        assert_eq!(v["phase"], "Lex");
        assert!(v.get("line").is_none());
    }

    #[test]
    fn catalog_lists_every_code() {
        let md = render_diagnostics_md();
        for code in all_codes() {
            assert!(md.contains(code.code_str()));
        }
    }
}
