//! Rust source generation.
//!
//! Every artifact is a plain item list with no inner attributes, so it can be pulled into a
//! module with `include!`. Runtime items are referenced through absolute `::<runtime_crate>::`
//! paths so schema names can never shadow them.

pub mod client;
pub mod messages;
pub mod server;
mod writer;

use crate::ast::Schema;
use crate::opcodes::OpcodeTable;

pub(crate) use writer::SourceWriter;

#[derive(Debug, Clone, Copy)]
pub struct EmitContext<'a> {
    pub schema: &'a Schema,
    pub opcodes: &'a OpcodeTable,
    pub runtime_crate: &'a str,
    /// Path from the server/client modules to the generated messages module.
    pub messages_module: &'a str,
    pub source_name: &'a str,
    pub source_sha256: &'a str,
}

impl EmitContext<'_> {
    /// Absolute path to a runtime item.
    pub(crate) fn rt(&self, item: &str) -> String {
        format!("::{}::{item}", self.runtime_crate)
    }

    pub(crate) fn banner(&self, w: &mut SourceWriter, what: &str) {
        w.line("// @generated by wirec. Do not edit.");
        w.line(&format!("// {what} for {}.", self.source_name));
        w.line(&format!("// schema sha256: {}", self.source_sha256));
        w.blank();
    }

    pub(crate) fn import_messages(&self, w: &mut SourceWriter) {
        w.line("#[allow(unused_imports)]");
        w.line(&format!("use {}::*;", self.messages_module));
        w.blank();
    }
}

/// Renders a frame byte the way generated match arms spell it.
pub(crate) fn hex_byte(b: u8) -> String {
    format!("0x{b:02x}")
}
