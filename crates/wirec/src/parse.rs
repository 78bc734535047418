use log::debug;
use wirec_contracts::CANONICAL_EMPTY_MESSAGE;

use crate::ast::{Declaration, Field, MessageDecl, ProcedureDecl};
use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::language::keywords;
use crate::lexer::{Block, Line};
use crate::types::TypeDescriptor;
use crate::validate;

/// Turns lexed blocks into declarations, one per block, in source order.
///
/// Names are not resolved here; see [`crate::resolve`].
pub fn parse_blocks(blocks: &[Block]) -> Result<Vec<Declaration>, Diagnostic> {
    let decls = blocks
        .iter()
        .map(parse_block)
        .collect::<Result<Vec<_>, _>>()?;
    debug!("parsed {} declarations", decls.len());
    Ok(decls)
}

fn parse_block(block: &Block) -> Result<Declaration, Diagnostic> {
    let header = block.header();
    match header.tokens[0].as_str() {
        keywords::MESSAGE => parse_message(block).map(Declaration::Message),
        keywords::SERVER | keywords::LEGACY_RPC => {
            parse_procedure(block).map(Declaration::ServerProcedure)
        }
        keywords::CLIENT => parse_procedure(block).map(Declaration::ClientProcedure),
        other => Err(Diagnostic::error(
            DiagnosticCode::WC0002UnknownDeclarationKeyword,
            format!("unknown declaration keyword {other:?} (expected message, server or client)"),
        )
        .at_line(header.number)),
    }
}

fn parse_message(block: &Block) -> Result<MessageDecl, Diagnostic> {
    let header = block.header();
    let name = match header.tokens.as_slice() {
        [_, name] => name,
        [_] => {
            return Err(Diagnostic::error(
                DiagnosticCode::WC0001MalformedSchema,
                "message declaration is missing a name",
            )
            .at_line(header.number))
        }
        [_, name, rest @ ..] => {
            return Err(Diagnostic::error(
                DiagnosticCode::WC0001MalformedSchema,
                format!(
                    "unexpected tokens after message name {name:?}: {}",
                    rest.join(" ")
                ),
            )
            .at_line(header.number))
        }
        [] => return Err(internal_empty_line(header)),
    };
    validate::validate_type_name(name).map_err(|e| {
        Diagnostic::error(DiagnosticCode::WC0101InvalidIdentifier, e).at_line(header.number)
    })?;

    let fields = block
        .body()
        .iter()
        .map(parse_field)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(MessageDecl {
        name: name.clone(),
        fields,
        line: header.number,
    })
}

fn parse_field(line: &Line) -> Result<Field, Diagnostic> {
    let Some((name, type_tokens)) = line.tokens.split_last() else {
        return Err(internal_empty_line(line));
    };
    if type_tokens.is_empty() {
        return Err(Diagnostic::error(
            DiagnosticCode::WC0100InvalidTypeExpression,
            format!("field line needs `<type> <name>`, got {name:?}"),
        )
        .at_line(line.number));
    }
    validate::validate_field_name(name).map_err(|e| {
        Diagnostic::error(DiagnosticCode::WC0101InvalidIdentifier, e).at_line(line.number)
    })?;
    let ty = TypeDescriptor::parse_tokens(type_tokens).map_err(|e| {
        Diagnostic::error(
            DiagnosticCode::WC0100InvalidTypeExpression,
            format!("field {name:?}: {e}"),
        )
        .at_line(line.number)
    })?;
    Ok(Field {
        name: name.clone(),
        ty,
        line: line.number,
    })
}

/// `<kw> Name [Req [Resp]]`, or the request and response on their own lines below the header.
fn parse_procedure(block: &Block) -> Result<ProcedureDecl, Diagnostic> {
    let header = block.header();
    let Some(name) = header.tokens.get(1) else {
        return Err(Diagnostic::error(
            DiagnosticCode::WC0003MissingProcedureName,
            format!("`{}` declaration has no procedure name", header.tokens[0]),
        )
        .at_line(header.number));
    };
    validate::validate_type_name(name).map_err(|e| {
        Diagnostic::error(DiagnosticCode::WC0101InvalidIdentifier, e).at_line(header.number)
    })?;

    let mut types: Vec<(&String, u32)> = header.tokens[2..]
        .iter()
        .map(|t| (t, header.number))
        .collect();
    if !types.is_empty() && !block.body().is_empty() {
        return Err(Diagnostic::error(
            DiagnosticCode::WC0001MalformedSchema,
            format!("procedure {name:?} names its types on the header and on following lines"),
        )
        .at_line(block.body()[0].number));
    }
    for line in block.body() {
        match line.tokens.as_slice() {
            [ty] => types.push((ty, line.number)),
            _ => {
                return Err(Diagnostic::error(
                    DiagnosticCode::WC0001MalformedSchema,
                    format!(
                        "procedure {name:?}: expected one message name per line, got {:?}",
                        line.tokens.join(" ")
                    ),
                )
                .at_line(line.number))
            }
        }
    }
    if types.len() > 2 {
        return Err(Diagnostic::error(
            DiagnosticCode::WC0001MalformedSchema,
            format!(
                "procedure {name:?} takes at most a request and a response, got {} types",
                types.len()
            ),
        )
        .at_line(types[2].1));
    }
    for (ty, line) in &types {
        check_procedure_type(name, ty, *line)?;
    }

    let mut types = types.into_iter().map(|(t, _)| t.clone());
    Ok(ProcedureDecl {
        name: name.clone(),
        request: types
            .next()
            .unwrap_or_else(|| CANONICAL_EMPTY_MESSAGE.to_string()),
        response: types
            .next()
            .unwrap_or_else(|| CANONICAL_EMPTY_MESSAGE.to_string()),
        line: header.number,
    })
}

fn check_procedure_type(proc_name: &str, ty: &str, line: u32) -> Result<(), Diagnostic> {
    if keywords::BUILTIN_TYPES.contains(&ty) {
        return Err(Diagnostic::error(
            DiagnosticCode::WC0100InvalidTypeExpression,
            format!("procedure {proc_name:?} must name a message, got builtin `{ty}`"),
        )
        .at_line(line));
    }
    validate::validate_type_name(ty).map_err(|e| {
        Diagnostic::error(DiagnosticCode::WC0101InvalidIdentifier, e).at_line(line)
    })
}

fn internal_empty_line(line: &Line) -> Diagnostic {
    Diagnostic::error(DiagnosticCode::WC0901InternalBug, "lexer produced an empty line")
        .at_line(line.number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::split_blocks;

    fn parse(src: &str) -> Result<Vec<Declaration>, Diagnostic> {
        parse_blocks(&split_blocks(src)?)
    }

    fn proc(decl: &Declaration) -> &ProcedureDecl {
        match decl {
            Declaration::ServerProcedure(p) | Declaration::ClientProcedure(p) => p,
            Declaration::Message(m) => panic!("expected procedure, got message {}", m.name),
        }
    }

    #[test]
    fn message_with_fields() {
        let decls = parse("message Player\nint id\nstring 32 name\nlist uint scores\n")
            .expect("parse");
        let Declaration::Message(m) = &decls[0] else {
            panic!("expected message");
        };
        assert_eq!(m.name, "Player");
        let names: Vec<&str> = m.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["id", "name", "scores"]);
        assert_eq!(m.fields[1].ty, TypeDescriptor::BoundedString { capacity: 32 });
        assert_eq!(m.fields[2].line, 4);
    }

    #[test]
    fn procedure_forms() {
        let decls = parse(
            "server Echo Ping Pong\n\nclient Notify\nAlert\n\nrpc Legacy\n\nserver Two\nA\nB\n",
        )
        .expect("parse");
        assert_eq!(decls[0].category(), crate::ast::Category::ServerProcedure);
        assert_eq!(proc(&decls[0]).request, "Ping");
        assert_eq!(proc(&decls[0]).response, "Pong");
        assert_eq!(decls[1].category(), crate::ast::Category::ClientProcedure);
        assert_eq!(proc(&decls[1]).request, "Alert");
        assert!(proc(&decls[1]).is_oneway());
        assert_eq!(decls[2].category(), crate::ast::Category::ServerProcedure);
        assert_eq!(proc(&decls[2]).request, "Empty");
        assert_eq!(proc(&decls[3]).request, "A");
        assert_eq!(proc(&decls[3]).response, "B");
    }

    #[test]
    fn errors_carry_codes_and_lines() {
        let cases = [
            ("widget Foo\n", DiagnosticCode::WC0002UnknownDeclarationKeyword, 1),
            ("server\n", DiagnosticCode::WC0003MissingProcedureName, 1),
            ("message A\nint\n", DiagnosticCode::WC0100InvalidTypeExpression, 2),
            ("message A\nlist x\n", DiagnosticCode::WC0100InvalidTypeExpression, 2),
            ("message A\nint 9x\n", DiagnosticCode::WC0101InvalidIdentifier, 2),
            ("message 1A\n", DiagnosticCode::WC0101InvalidIdentifier, 1),
            ("message\n", DiagnosticCode::WC0001MalformedSchema, 1),
            ("server P A B C\n", DiagnosticCode::WC0001MalformedSchema, 1),
            ("server P A\nB\n", DiagnosticCode::WC0001MalformedSchema, 2),
            ("server P int\n", DiagnosticCode::WC0100InvalidTypeExpression, 1),
        ];
        for (src, code, line) in cases {
            let err = parse(src).expect_err(src);
            assert_eq!(err.code, code, "{src:?}: {err}");
            assert_eq!(err.line, Some(line), "{src:?}");
        }
    }
}
