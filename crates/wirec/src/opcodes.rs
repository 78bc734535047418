//! Opcode assignment.
//!
//! Each category is numbered independently, densely from 1 in declaration order; 0 is never
//! assigned. Server and client procedures share the frame's leading byte, so a client
//! procedure's wire byte carries [`CLIENT_PROCEDURE_WIRE_TAG`] in its high bit.

use serde::Serialize;
use wirec_contracts::{
    CLIENT_PROCEDURE_WIRE_TAG, MAX_MESSAGE_OPCODE, MAX_PROCEDURE_OPCODE,
    WIREC_OPCODE_MAP_SCHEMA_VERSION,
};

use crate::ast::{Category, Schema};
use crate::diagnostics::{Diagnostic, DiagnosticCode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpcodeEntry {
    pub name: String,
    pub opcode: u8,
    /// Leading frame byte; procedures only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wire: Option<u8>,
    #[serde(skip)]
    pub category: Category,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpcodeTable {
    entries: Vec<OpcodeEntry>,
}

pub fn max_opcode(category: Category) -> u8 {
    match category {
        Category::Message => MAX_MESSAGE_OPCODE,
        Category::ServerProcedure | Category::ClientProcedure => MAX_PROCEDURE_OPCODE,
    }
}

pub fn wire_byte(category: Category, opcode: u8) -> Option<u8> {
    match category {
        Category::Message => None,
        Category::ServerProcedure => Some(opcode),
        Category::ClientProcedure => Some(CLIENT_PROCEDURE_WIRE_TAG | opcode),
    }
}

pub fn assign(schema: &Schema) -> Result<OpcodeTable, Diagnostic> {
    let mut next = [0u16; 3];
    let mut entries = Vec::with_capacity(schema.declarations().len());
    for decl in schema.declarations() {
        let category = decl.category();
        let slot = &mut next[category as usize];
        *slot += 1;
        let limit = max_opcode(category);
        let opcode = match u8::try_from(*slot) {
            Ok(op) if op <= limit => op,
            _ => {
                return Err(Diagnostic::error(
                    DiagnosticCode::WC0300OpcodeSpaceExhausted,
                    format!(
                        "{} `{}` would be number {}; at most {limit} fit",
                        category.as_str(),
                        decl.name(),
                        slot
                    ),
                )
                .at_line(decl.line()))
            }
        };
        entries.push(OpcodeEntry {
            name: decl.name().to_string(),
            opcode,
            wire: wire_byte(category, opcode),
            category,
        });
    }
    Ok(OpcodeTable { entries })
}

impl OpcodeTable {
    pub fn entries(&self) -> &[OpcodeEntry] {
        &self.entries
    }

    pub fn category(&self, category: Category) -> impl Iterator<Item = &OpcodeEntry> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    pub fn get(&self, category: Category, name: &str) -> Option<&OpcodeEntry> {
        self.category(category).find(|e| e.name == name)
    }

    pub fn opcode(&self, category: Category, name: &str) -> Option<u8> {
        self.get(category, name).map(|e| e.opcode)
    }

    /// The opcode map document; keys sort deterministically once rendered through
    /// `serde_json::Value`.
    pub fn to_json(&self, source_sha256: &str) -> serde_json::Value {
        let section = |c: Category| -> Vec<&OpcodeEntry> { self.category(c).collect() };
        serde_json::json!({
            "schema_version": WIREC_OPCODE_MAP_SCHEMA_VERSION,
            "source_sha256": source_sha256,
            "messages": section(Category::Message),
            "server_procedures": section(Category::ServerProcedure),
            "client_procedures": section(Category::ClientProcedure),
        })
    }
}
