//! `generated_rpc_client.rs`: send stubs plus one mailbox per inbound procedure.

use crate::ast::{Category, ProcedureDecl};
use crate::emit::{hex_byte, EmitContext, SourceWriter};
use crate::naming::{InboxNames, ProcedureNames};

/// One mailbox field of the generated client, shared by every procedure delivering `ty`.
struct Slot<'a> {
    names: InboxNames,
    ty: &'a str,
}

/// One `handle_rpc` match arm.
struct Arm {
    wire: u8,
    field: String,
    origin: String,
}

/// Received message types in order of first appearance, plus the opcode arms feeding them.
fn inbound<'a>(ctx: &EmitContext<'a>) -> (Vec<Slot<'a>>, Vec<Arm>) {
    let wire = |category: Category, p: &ProcedureDecl| {
        ctx.opcodes
            .get(category, &p.name)
            .and_then(|e| e.wire)
            .unwrap_or_default()
    };
    let received = ctx
        .schema
        .server_procedures()
        .filter(|p| !p.is_oneway())
        .map(|p| (Category::ServerProcedure, p, p.response.as_str(), "response"))
        .chain(
            ctx.schema
                .client_procedures()
                .map(|p| (Category::ClientProcedure, p, p.request.as_str(), "request")),
        );

    let mut slots: Vec<Slot<'a>> = Vec::new();
    let mut arms = Vec::new();
    for (category, p, ty, what) in received {
        if !slots.iter().any(|s| s.ty == ty) {
            slots.push(Slot {
                names: InboxNames::new(ty),
                ty,
            });
        }
        let prefix = match category {
            Category::ClientProcedure => "ClientProc",
            _ => "ServerProc",
        };
        arms.push(Arm {
            wire: wire(category, p),
            field: InboxNames::new(ty).field,
            origin: format!("{prefix}::{} {what}", p.name),
        });
    }
    (slots, arms)
}

pub fn emit(ctx: &EmitContext<'_>) -> String {
    let mut w = SourceWriter::new();
    ctx.banner(&mut w, "Client-side stubs and mailboxes");
    ctx.import_messages(&mut w);

    let (slots, arms) = inbound(ctx);
    let mailbox = ctx.rt("Mailbox");
    let dispatch_error = ctx.rt("DispatchError");

    w.doc("Client end of the protocol.");
    w.doc("");
    w.doc("Sends never wait for an answer. Inbound frames are decoded by");
    w.doc("[`RpcClient::handle_rpc`] (or [`RpcClient::poll`]) into one mailbox per received");
    w.doc("message type; a mailbox keeps only the most recent value until it is taken,");
    w.doc("whichever procedure delivered it.");
    w.line("#[derive(Debug)]");
    w.open_block("pub struct RpcClient<T>");
    w.line("transport: T,");
    for s in &slots {
        w.line(&format!("{}: {mailbox}<{}>,", s.names.field, s.ty));
    }
    w.close_block();
    w.blank();

    w.open_block(&format!("impl<T: {}> RpcClient<T>", ctx.rt("Transport")));
    w.open_block("pub fn new(transport: T) -> Self");
    w.open_block("Self");
    w.line("transport,");
    for s in &slots {
        w.line(&format!("{}: {mailbox}::new(),", s.names.field));
    }
    w.close_block();
    w.close_block();
    w.blank();
    w.open_block("pub fn transport(&self) -> &T");
    w.line("&self.transport");
    w.close_block();
    w.blank();
    w.open_block("pub fn transport_mut(&mut self) -> &mut T");
    w.line("&mut self.transport");
    w.close_block();
    w.blank();
    w.open_block("pub fn into_transport(self) -> T");
    w.line("self.transport");
    w.close_block();

    for p in ctx.schema.server_procedures() {
        let names = ProcedureNames::new(&p.name);
        w.blank();
        if p.is_oneway() {
            w.doc(&format!("Sends `{}`; the server does not answer.", p.name));
        } else {
            w.doc(&format!(
                "Sends `{}`; the `{}` answer lands in [`Self::{}`].",
                p.name,
                p.response,
                InboxNames::new(&p.response).take
            ));
        }
        w.open_block(&format!(
            "pub fn {}(&mut self, request: &{}) -> Result<(), {dispatch_error}>",
            names.send, p.request
        ));
        w.line(&format!(
            "{}(&mut self.transport, ServerProc::{}.wire_byte(), request)",
            ctx.rt("send_frame"),
            p.name
        ));
        w.close_block();
    }
    for p in ctx.schema.client_procedures().filter(|p| !p.is_oneway()) {
        let names = ProcedureNames::new(&p.name);
        w.blank();
        w.doc(&format!("Answers the server's `{}`.", p.name));
        w.open_block(&format!(
            "pub fn {}(&mut self, response: &{}) -> Result<(), {dispatch_error}>",
            names.reply, p.response
        ));
        w.line(&format!(
            "{}(&mut self.transport, ClientProc::{}.wire_byte(), response)",
            ctx.rt("send_frame"),
            p.name
        ));
        w.close_block();
    }

    w.blank();
    w.doc("Decodes one inbound frame into its mailbox.");
    w.doc("");
    w.doc("Returns `Ok(false)` for an opcode this client has no mailbox for.");
    w.open_block(&format!(
        "pub fn handle_rpc(&mut self, frame: &[u8]) -> Result<bool, {dispatch_error}>"
    ));
    w.line(&format!(
        "let (opcode, payload) = {}(frame)?;",
        ctx.rt("split_frame")
    ));
    if arms.is_empty() {
        w.line("let _ = (opcode, payload);");
        w.line("Ok(false)");
    } else {
        w.open_block("match opcode");
        for a in &arms {
            w.line(&format!("// {}", a.origin));
            w.line(&format!(
                "{} => self.{}.deliver({}(opcode, payload)?),",
                hex_byte(a.wire),
                a.field,
                ctx.rt("read_payload")
            ));
        }
        w.line("_ => return Ok(false),");
        w.close_block();
        w.line("Ok(true)");
    }
    w.close_block();
    w.blank();

    w.doc("Drains every frame the transport has ready. Returns how many were delivered.");
    w.open_block(&format!(
        "pub fn poll(&mut self) -> Result<usize, {dispatch_error}>"
    ));
    w.line("let mut delivered = 0;");
    w.open_block("while let Some(frame) = self.transport.receive()?");
    w.open_block("if self.handle_rpc(&frame)?");
    w.line("delivered += 1;");
    w.close_block();
    w.close_block();
    w.line("Ok(delivered)");
    w.close_block();

    for s in &slots {
        w.blank();
        w.open_block(&format!(
            "pub fn {}(&mut self) -> Option<{}>",
            s.names.take, s.ty
        ));
        w.line(&format!("self.{}.take()", s.names.field));
        w.close_block();
        w.blank();
        w.open_block(&format!(
            "pub fn {}(&self) -> Option<&{}>",
            s.names.peek, s.ty
        ));
        w.line(&format!("self.{}.peek()", s.names.field));
        w.close_block();
    }

    w.blank();
    w.doc("True while any mailbox holds a value that has not been taken.");
    w.open_block("pub fn has_pending(&self) -> bool");
    match slots.split_first() {
        None => w.line("false"),
        Some((first, rest)) => {
            w.line(&format!("self.{}.is_pending()", first.names.field));
            w.indent();
            for s in rest {
                w.line(&format!("|| self.{}.is_pending()", s.names.field));
            }
            w.dedent();
        }
    }
    w.close_block();
    w.blank();
    w.open_block("pub fn clear_all(&mut self)");
    for s in &slots {
        w.line(&format!("self.{}.clear();", s.names.field));
    }
    w.close_block();
    w.close_block();
    w.finish()
}

#[cfg(test)]
mod tests {
    use crate::compile::{compile_schema, ArtifactKind, CompileOptions};

    fn client(src: &str) -> String {
        let out = compile_schema(src, &CompileOptions::default()).expect("compile");
        out.artifact(ArtifactKind::Client).source.clone()
    }

    #[test]
    fn one_mailbox_per_received_message_type() {
        let src = client(
            "message Ping\n\nmessage Pong\n\nserver Echo Ping Pong\n\n\
             client Alert Ping\n\nserver Bye\n",
        );
        assert!(src.contains("    pong_inbox: ::wirec_runtime::Mailbox<Pong>,\n"));
        assert!(src.contains("    ping_inbox: ::wirec_runtime::Mailbox<Ping>,\n"));
        assert!(!src.contains("empty_inbox"));
        assert!(src.contains("pub fn send_echo(&mut self, request: &Ping)"));
        assert!(src.contains("pub fn send_bye(&mut self, request: &Empty)"));
        assert!(src.contains(
            "0x01 => self.pong_inbox.deliver(::wirec_runtime::read_payload(opcode, payload)?),"
        ));
        assert!(src.contains("0x81 => self.ping_inbox.deliver("));
        assert!(src.contains("pub fn take_pong(&mut self) -> Option<Pong>"));
        assert!(src.contains("pub fn peek_ping(&self) -> Option<&Ping>"));
        assert!(!src.contains("reply_alert"));
    }

    #[test]
    fn procedures_sharing_a_response_share_its_mailbox() {
        let src = client(
            "message Req\n\nmessage Resp\n\nserver Get Req Resp\n\nserver Other Req Resp\n",
        );
        assert_eq!(src.matches("resp_inbox: ::wirec_runtime::Mailbox<Resp>,").count(), 1);
        assert_eq!(src.matches("pub fn take_resp(").count(), 1);
        assert!(src.contains("// ServerProc::Get response\n        0x01 => self.resp_inbox"));
        assert!(src.contains("// ServerProc::Other response\n        0x02 => self.resp_inbox"));
    }

    #[test]
    fn has_pending_checks_every_mailbox() {
        let src = client("message A\n\nmessage B\n\nclient PushA A\n\nclient PushB B\n");
        assert!(src.contains(
            "        self.a_inbox.is_pending()\n            || self.b_inbox.is_pending()\n    }"
        ));
    }

    #[test]
    fn reply_stub_for_answered_client_procedure() {
        let src = client("message Q\n\nmessage A\n\nclient AskName Q A\n");
        assert!(src.contains("pub fn reply_ask_name(&mut self, response: &A)"));
        assert!(src.contains("ClientProc::AskName.wire_byte(), response)"));
    }

    #[test]
    fn no_mailboxes() {
        let src = client("message Only\n");
        assert!(src.contains("let _ = (opcode, payload);"));
        assert!(src.contains("pub fn has_pending(&self) -> bool {\n        false\n    }"));
    }
}
