//! `generated_messages.rs`: opcode enumerations plus one record per message.

use wirec_contracts::CANONICAL_EMPTY_MESSAGE;

use crate::ast::{Category, MessageDecl, ProcedureDecl};
use crate::emit::{hex_byte, EmitContext, SourceWriter};
use crate::naming::rust_ident;
use crate::opcodes::OpcodeEntry;

pub fn emit(ctx: &EmitContext<'_>) -> String {
    let mut w = SourceWriter::new();
    ctx.banner(&mut w, "Message records and opcode enumerations");
    emit_message_ids(&mut w, ctx);
    emit_procedure_enum(
        &mut w,
        ctx,
        Category::ServerProcedure,
        "ServerProc",
        "Procedures a client invokes and the server answers.",
    );
    emit_procedure_enum(
        &mut w,
        ctx,
        Category::ClientProcedure,
        "ClientProc",
        "Procedures the server invokes and a client answers.",
    );
    for m in ctx.schema.messages() {
        emit_record(&mut w, ctx, m);
    }
    w.finish()
}

fn emit_enum_decl(w: &mut SourceWriter, name: &str, doc: &str, entries: &[&OpcodeEntry]) {
    w.doc(doc);
    w.line("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]");
    if entries.is_empty() {
        w.line(&format!("pub enum {name} {{}}"));
    } else {
        w.open_block(&format!("pub enum {name}"));
        for e in entries {
            w.line(&format!("{} = {},", e.name, e.opcode));
        }
        w.close_block();
    }
    w.blank();
}

fn emit_all_const(w: &mut SourceWriter, name: &str, entries: &[&OpcodeEntry]) {
    if entries.is_empty() {
        w.line(&format!("pub const ALL: [{name}; 0] = [];"));
        return;
    }
    w.line(&format!("pub const ALL: [{name}; {}] = [", entries.len()));
    for e in entries {
        w.line(&format!("    {name}::{},", e.name));
    }
    w.line("];");
}

/// `fn <fn_name>(self) -> <ret>` with one arm per entry.
fn emit_self_match(
    w: &mut SourceWriter,
    name: &str,
    fn_name: &str,
    ret: &str,
    entries: &[&OpcodeEntry],
    value: impl Fn(&OpcodeEntry) -> String,
) {
    w.blank();
    w.open_block(&format!("pub fn {fn_name}(self) -> {ret}"));
    w.open_block("match self");
    for e in entries {
        w.line(&format!("{name}::{} => {},", e.name, value(e)));
    }
    w.close_block();
    w.close_block();
}

/// `fn <fn_name>(byte: u8) -> Option<Self>` keyed by `key`.
fn emit_from_byte(
    w: &mut SourceWriter,
    name: &str,
    fn_name: &str,
    entries: &[&OpcodeEntry],
    key: impl Fn(&OpcodeEntry) -> String,
) {
    w.blank();
    w.open_block(&format!("pub fn {fn_name}(byte: u8) -> Option<Self>"));
    if entries.is_empty() {
        w.line("let _ = byte;");
        w.line("None");
    } else {
        w.open_block("match byte");
        for e in entries {
            w.line(&format!("{} => Some({name}::{}),", key(e), e.name));
        }
        w.line("_ => None,");
        w.close_block();
    }
    w.close_block();
}

fn emit_message_ids(w: &mut SourceWriter, ctx: &EmitContext<'_>) {
    let entries: Vec<&OpcodeEntry> = ctx.opcodes.category(Category::Message).collect();
    emit_enum_decl(
        w,
        "MessageId",
        "Message type identifiers, numbered from 1 in declaration order.",
        &entries,
    );
    w.open_block("impl MessageId");
    emit_all_const(w, "MessageId", &entries);
    emit_self_match(w, "MessageId", "opcode", "u8", &entries, |e| e.opcode.to_string());
    emit_from_byte(w, "MessageId", "from_opcode", &entries, |e| e.opcode.to_string());
    emit_self_match(w, "MessageId", "name", "&'static str", &entries, |e| {
        format!("{:?}", e.name)
    });
    w.close_block();
    w.blank();
}

fn emit_procedure_enum(
    w: &mut SourceWriter,
    ctx: &EmitContext<'_>,
    category: Category,
    name: &str,
    doc: &str,
) {
    let entries: Vec<&OpcodeEntry> = ctx.opcodes.category(category).collect();
    emit_enum_decl(w, name, doc, &entries);

    let procs: Vec<_> = ctx.schema.procedures(category).collect();
    w.open_block(&format!("impl {name}"));
    emit_all_const(w, name, &entries);
    emit_self_match(w, name, "opcode", "u8", &entries, |e| e.opcode.to_string());
    w.blank();
    w.doc("Leading byte of frames carrying this procedure.");
    w.open_block("pub fn wire_byte(self) -> u8");
    w.open_block("match self");
    for e in &entries {
        w.line(&format!(
            "{name}::{} => {},",
            e.name,
            hex_byte(e.wire.unwrap_or(e.opcode))
        ));
    }
    w.close_block();
    w.close_block();
    emit_from_byte(w, name, "from_wire", &entries, |e| {
        hex_byte(e.wire.unwrap_or(e.opcode))
    });
    emit_self_match(w, name, "name", "&'static str", &entries, |e| {
        format!("{:?}", e.name)
    });
    emit_self_match(w, name, "request_id", "MessageId", &entries, |e| {
        message_id_for(&procs, e, |p| &p.request)
    });
    emit_self_match(w, name, "response_id", "MessageId", &entries, |e| {
        message_id_for(&procs, e, |p| &p.response)
    });
    w.close_block();
    w.blank();
}

fn message_id_for(
    procs: &[&ProcedureDecl],
    entry: &OpcodeEntry,
    pick: impl Fn(&ProcedureDecl) -> &String,
) -> String {
    let msg = procs
        .iter()
        .find(|p| p.name == entry.name)
        .map_or(CANONICAL_EMPTY_MESSAGE, |p| pick(p).as_str());
    format!("MessageId::{msg}")
}

fn emit_record(w: &mut SourceWriter, ctx: &EmitContext<'_>, m: &MessageDecl) {
    let wire = ctx.rt("Wire");
    let builder = ctx.rt("MessageBuilder");
    let reader = ctx.rt("MessageReader");
    let error = ctx.rt("WireError");
    let opcode = ctx
        .opcodes
        .opcode(Category::Message, &m.name)
        .unwrap_or_default();

    w.doc(&format!("Message `{}` (opcode {opcode}).", m.name));
    w.line("#[derive(Debug, Clone, Default, PartialEq, Eq)]");
    if m.fields.is_empty() {
        w.line(&format!("pub struct {} {{}}", m.name));
    } else {
        w.open_block(&format!("pub struct {}", m.name));
        for f in &m.fields {
            w.line(&format!(
                "pub {}: {},",
                rust_ident(&f.name),
                f.ty.rust_type(ctx.runtime_crate)
            ));
        }
        w.close_block();
    }
    w.blank();

    w.open_block(&format!("impl {}", m.name));
    w.line(&format!("pub const ID: MessageId = MessageId::{};", m.name));
    w.close_block();
    w.blank();

    let (out, input) = if m.fields.is_empty() {
        ("_out", "_input")
    } else {
        ("out", "input")
    };
    w.open_block(&format!("impl {wire} for {}", m.name));
    w.open_block(&format!(
        "fn append(&self, {out}: &mut {builder}) -> Result<(), {error}>"
    ));
    for f in &m.fields {
        w.line(&format!("{wire}::append(&self.{}, out)?;", rust_ident(&f.name)));
    }
    w.line("Ok(())");
    w.close_block();
    w.blank();
    w.open_block(&format!(
        "fn read(&mut self, {input}: &mut {reader}<'_>) -> Result<usize, {error}>"
    ));
    if m.fields.is_empty() {
        w.line("Ok(0)");
    } else {
        w.line("let mut consumed = 0;");
        for f in &m.fields {
            w.line(&format!(
                "consumed += {wire}::read(&mut self.{}, input)?;",
                rust_ident(&f.name)
            ));
        }
        w.line("Ok(consumed)");
    }
    w.close_block();
    w.close_block();
    w.blank();
}
