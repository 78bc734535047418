//! `generated_rpc_server.rs`: the handler trait, the frame dispatcher and send stubs for
//! server-initiated procedures.

use crate::ast::{Category, ProcedureDecl};
use crate::emit::{hex_byte, EmitContext, SourceWriter};
use crate::naming::ProcedureNames;

pub fn emit(ctx: &EmitContext<'_>) -> String {
    let mut w = SourceWriter::new();
    ctx.banner(&mut w, "Server-side dispatch");
    ctx.import_messages(&mut w);
    emit_handlers_trait(&mut w, ctx);
    emit_dispatch(&mut w, ctx);
    for p in ctx.schema.client_procedures() {
        emit_send_stub(&mut w, ctx, p);
        emit_broadcast_stub(&mut w, ctx, p);
    }
    emit_serve_pending(&mut w, ctx);
    w.finish()
}

fn wire_byte(ctx: &EmitContext<'_>, category: Category, p: &ProcedureDecl) -> u8 {
    ctx.opcodes
        .get(category, &p.name)
        .and_then(|e| e.wire)
        .unwrap_or_default()
}

fn emit_handlers_trait(w: &mut SourceWriter, ctx: &EmitContext<'_>) {
    let client_id = ctx.rt("ClientId");
    w.doc("Application logic behind each procedure a client may invoke.");
    w.doc("");
    w.doc("Handlers run on the thread that calls [`dispatch`]; a returned response is sent back");
    w.doc("to the calling client under the same opcode.");
    w.open_block("pub trait ServerHandlers");
    let mut first = true;
    for p in ctx.schema.server_procedures() {
        if !std::mem::take(&mut first) {
            w.blank();
        }
        let names = ProcedureNames::new(&p.name);
        if p.is_oneway() {
            w.doc(&format!("`{}`: notification carrying `{}`.", p.name, p.request));
            w.line(&format!(
                "fn {}(&mut self, client: {client_id}, request: {});",
                names.handler, p.request
            ));
        } else {
            w.doc(&format!(
                "`{}`: answers `{}` with `{}`.",
                p.name, p.request, p.response
            ));
            w.line(&format!(
                "fn {}(&mut self, client: {client_id}, request: {}) -> {};",
                names.handler, p.request, p.response
            ));
        }
    }
    for p in ctx.schema.client_procedures().filter(|p| !p.is_oneway()) {
        if !std::mem::take(&mut first) {
            w.blank();
        }
        let names = ProcedureNames::new(&p.name);
        w.doc(&format!(
            "A client's `{}` reply to the server-initiated `{}`.",
            p.response, p.name
        ));
        w.line(&format!(
            "fn {}(&mut self, client: {client_id}, response: {});",
            names.reply_handler, p.response
        ));
    }
    if !first {
        w.blank();
    }
    w.doc("Called once a peer's transport has failed; its frames will no longer arrive.");
    w.line(&format!("fn on_disconnect(&mut self, _client: {client_id}) {{}}"));
    w.close_block();
    w.blank();
}

fn emit_dispatch(w: &mut SourceWriter, ctx: &EmitContext<'_>) {
    let transport = ctx.rt("Transport");
    let read_payload = ctx.rt("read_payload");
    let send_frame = ctx.rt("send_frame");
    let dispatch_error = ctx.rt("DispatchError");

    w.doc("Handles one inbound frame: an opcode byte followed by the payload.");
    w.doc("");
    w.doc("Unknown opcodes and malformed payloads are reported without touching `handlers`.");
    w.line("pub fn dispatch<H, T>(");
    w.line("    handlers: &mut H,");
    w.line(&format!("    client: {},", ctx.rt("ClientId")));
    w.line("    peer: &mut T,");
    w.line("    frame: &[u8],");
    w.line(&format!(") -> Result<(), {dispatch_error}>"));
    w.line("where");
    w.line("    H: ServerHandlers + ?Sized,");
    w.line(&format!("    T: {transport} + ?Sized,"));
    w.open_block("");
    w.line(&format!(
        "let (opcode, payload) = {}(frame)?;",
        ctx.rt("split_frame")
    ));

    let server: Vec<&ProcedureDecl> = ctx.schema.server_procedures().collect();
    let replies: Vec<&ProcedureDecl> = ctx
        .schema
        .client_procedures()
        .filter(|p| !p.is_oneway())
        .collect();
    if server.is_empty() && replies.is_empty() {
        w.line("let _ = (handlers, client, peer, payload);");
        w.line(&format!("Err({dispatch_error}::UnknownOpcode(opcode))"));
        w.close_block();
        w.blank();
        return;
    }

    w.open_block("match opcode");
    for p in server {
        let names = ProcedureNames::new(&p.name);
        w.line(&format!("// ServerProc::{}", p.name));
        w.open_block(&format!(
            "{} =>",
            hex_byte(wire_byte(ctx, Category::ServerProcedure, p))
        ));
        w.line(&format!(
            "let request: {} = {read_payload}(opcode, payload)?;",
            p.request
        ));
        if p.is_oneway() {
            w.line(&format!("handlers.{}(client, request);", names.handler));
            w.line("let _ = peer;");
            w.line("Ok(())");
        } else {
            w.line(&format!(
                "let response = handlers.{}(client, request);",
                names.handler
            ));
            w.line(&format!(
                "{send_frame}(peer, ServerProc::{}.wire_byte(), &response)",
                p.name
            ));
        }
        w.close_block();
    }
    for p in replies {
        let names = ProcedureNames::new(&p.name);
        w.line(&format!("// ClientProc::{} reply", p.name));
        w.open_block(&format!(
            "{} =>",
            hex_byte(wire_byte(ctx, Category::ClientProcedure, p))
        ));
        w.line(&format!(
            "let response: {} = {read_payload}(opcode, payload)?;",
            p.response
        ));
        w.line(&format!("handlers.{}(client, response);", names.reply_handler));
        w.line("Ok(())");
        w.close_block();
    }
    w.line(&format!("other => Err({dispatch_error}::UnknownOpcode(other)),"));
    w.close_block();
    w.close_block();
    w.blank();
}

fn emit_send_stub(w: &mut SourceWriter, ctx: &EmitContext<'_>, p: &ProcedureDecl) {
    let names = ProcedureNames::new(&p.name);
    if p.is_oneway() {
        w.doc(&format!("Pushes `{}` to one client; no reply is expected.", p.name));
    } else {
        w.doc(&format!(
            "Sends `{}` to one client without waiting; its reply reaches [`ServerHandlers::{}`].",
            p.name, names.reply_handler
        ));
    }
    w.line(&format!(
        "pub fn {}<T>(peer: &mut T, request: &{}) -> Result<(), {}>",
        names.send,
        p.request,
        ctx.rt("DispatchError")
    ));
    w.line("where");
    w.line(&format!("    T: {} + ?Sized,", ctx.rt("Transport")));
    w.open_block("");
    w.line(&format!(
        "{}(peer, ClientProc::{}.wire_byte(), request)",
        ctx.rt("send_frame"),
        p.name
    ));
    w.close_block();
    w.blank();
}

fn emit_broadcast_stub(w: &mut SourceWriter, ctx: &EmitContext<'_>, p: &ProcedureDecl) {
    let names = ProcedureNames::new(&p.name);
    w.doc(&format!(
        "Sends `{}` to every peer in `peers`, skipping peers whose transport fails.",
        p.name
    ));
    w.doc("Returns how many peers accepted the frame.");
    w.line(&format!(
        "pub fn {}<'a, T, I>(peers: I, request: &{}) -> Result<usize, {}>",
        names.broadcast,
        p.request,
        ctx.rt("WireError")
    ));
    w.line("where");
    w.line(&format!("    T: {} + ?Sized + 'a,", ctx.rt("Transport")));
    w.line("    I: IntoIterator<Item = &'a mut T>,");
    w.open_block("");
    w.line(&format!(
        "{}(peers, ClientProc::{}.wire_byte(), request)",
        ctx.rt("broadcast_frame"),
        p.name
    ));
    w.close_block();
    w.blank();
}

fn emit_serve_pending(w: &mut SourceWriter, ctx: &EmitContext<'_>) {
    w.doc("Dispatches every frame currently queued on `peer`, dropping (and logging) frames");
    w.doc("that fail to decode. Returns how many frames were handled.");
    w.doc("");
    w.doc("A transport failure ends the peer: [`ServerHandlers::on_disconnect`] runs and the");
    w.doc("error is returned.");
    w.line("pub fn serve_pending<H, T>(");
    w.line("    handlers: &mut H,");
    w.line(&format!("    client: {},", ctx.rt("ClientId")));
    w.line("    peer: &mut T,");
    w.line(&format!(") -> Result<usize, {}>", ctx.rt("DispatchError")));
    w.line("where");
    w.line("    H: ServerHandlers + ?Sized,");
    w.line(&format!("    T: {} + ?Sized,", ctx.rt("Transport")));
    w.open_block("");
    w.line(&format!(
        "let result = {}(peer, |peer, frame| dispatch(handlers, client, peer, frame));",
        ctx.rt("serve")
    ));
    w.open_block("if let Err(err) = &result");
    w.open_block("if !err.is_recoverable()");
    w.line("handlers.on_disconnect(client);");
    w.close_block();
    w.close_block();
    w.line("result");
    w.close_block();
}
