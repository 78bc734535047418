//! Name resolution and whole-schema checks.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use wirec_contracts::CANONICAL_EMPTY_MESSAGE;

use crate::ast::{Category, Declaration, MessageDecl, ProcedureDecl, Schema};
use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::naming::{InboxNames, ProcedureNames};

/// Checks the parsed declarations and produces a [`Schema`].
///
/// References are collected during the walk and checked once every declaration is known, so a
/// message may be used before it is declared. `Empty` is appended as the last message when it is
/// referenced but not declared.
pub fn resolve(mut decls: Vec<Declaration>) -> Result<Schema, Diagnostic> {
    check_unique_names(&decls)?;
    check_fields(&decls)?;

    let declared: BTreeMap<&str, &MessageDecl> = decls
        .iter()
        .filter_map(|d| match d {
            Declaration::Message(m) => Some((m.name.as_str(), m)),
            _ => None,
        })
        .collect();

    if let Some(empty) = declared.get(CANONICAL_EMPTY_MESSAGE) {
        if let Some(field) = empty.fields.first() {
            return Err(Diagnostic::error(
                DiagnosticCode::WC0204NonEmptyCanonicalMessage,
                format!(
                    "message `{CANONICAL_EMPTY_MESSAGE}` must have no fields, found {:?}",
                    field.name
                ),
            )
            .at_line(field.line));
        }
    }

    let mut synthesize_empty = false;
    for site in reference_sites(&decls) {
        if declared.contains_key(site.name) {
            continue;
        }
        if site.name == CANONICAL_EMPTY_MESSAGE {
            synthesize_empty = true;
            continue;
        }
        return Err(Diagnostic::error(
            DiagnosticCode::WC0200UnresolvedMessageReference,
            format!(
                "{} refers to undeclared message `{}`",
                site.context, site.name
            ),
        )
        .at_line(site.line));
    }

    check_recursion(&declared)?;
    drop(declared);

    if synthesize_empty {
        debug!("synthesizing canonical `{CANONICAL_EMPTY_MESSAGE}` message");
        decls.push(Declaration::Message(MessageDecl {
            name: CANONICAL_EMPTY_MESSAGE.to_string(),
            fields: Vec::new(),
            line: 0,
        }));
    }

    check_generated_names(&decls)?;
    check_inbox_names(&decls)?;
    Ok(Schema::new(decls))
}

fn check_unique_names(decls: &[Declaration]) -> Result<(), Diagnostic> {
    let mut seen: BTreeMap<(Category, &str), u32> = BTreeMap::new();
    for d in decls {
        if let Some(first) = seen.insert((d.category(), d.name()), d.line()) {
            return Err(Diagnostic::error(
                DiagnosticCode::WC0201DuplicateDeclarationName,
                format!(
                    "{} `{}` is already declared on line {first}",
                    d.category().as_str(),
                    d.name()
                ),
            )
            .at_line(d.line()));
        }
    }
    Ok(())
}

fn check_fields(decls: &[Declaration]) -> Result<(), Diagnostic> {
    for d in decls {
        let Declaration::Message(m) = d else {
            continue;
        };
        let mut seen = BTreeSet::new();
        for f in &m.fields {
            if !seen.insert(f.name.as_str()) {
                return Err(Diagnostic::error(
                    DiagnosticCode::WC0202DuplicateFieldName,
                    format!("message `{}` has two fields named {:?}", m.name, f.name),
                )
                .at_line(f.line));
            }
        }
    }
    Ok(())
}

struct ReferenceSite<'a> {
    name: &'a str,
    line: u32,
    context: String,
}

fn reference_sites(decls: &[Declaration]) -> Vec<ReferenceSite<'_>> {
    let mut sites = Vec::new();
    for d in decls {
        match d {
            Declaration::Message(m) => {
                for f in &m.fields {
                    if let Some(name) = f.ty.referenced_message() {
                        sites.push(ReferenceSite {
                            name,
                            line: f.line,
                            context: format!("field `{}.{}`", m.name, f.name),
                        });
                    }
                }
            }
            Declaration::ServerProcedure(p) | Declaration::ClientProcedure(p) => {
                for (role, name) in [("request", &p.request), ("response", &p.response)] {
                    sites.push(ReferenceSite {
                        name,
                        line: p.line,
                        context: format!("{} `{}` {role}", d.category().as_str(), p.name),
                    });
                }
            }
        }
    }
    sites
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// A message may contain itself only through a `list`.
fn check_recursion(declared: &BTreeMap<&str, &MessageDecl>) -> Result<(), Diagnostic> {
    let mut marks: BTreeMap<&str, Mark> = BTreeMap::new();
    let mut path: Vec<&str> = Vec::new();
    for name in declared.keys().copied() {
        visit(name, declared, &mut marks, &mut path)?;
    }
    Ok(())
}

fn visit<'a>(
    name: &'a str,
    declared: &BTreeMap<&'a str, &'a MessageDecl>,
    marks: &mut BTreeMap<&'a str, Mark>,
    path: &mut Vec<&'a str>,
) -> Result<(), Diagnostic> {
    match marks.get(name) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = path.iter().position(|n| *n == name).unwrap_or(0);
            let mut cycle: Vec<&str> = path[start..].to_vec();
            cycle.push(name);
            let line = declared.get(name).map_or(0, |m| m.line);
            return Err(Diagnostic::error(
                DiagnosticCode::WC0203RecursiveMessage,
                format!(
                    "message `{name}` contains itself by value: {}",
                    cycle.join(" -> ")
                ),
            )
            .at_line(line));
        }
        None => {}
    }
    let Some(msg) = declared.get(name) else {
        return Ok(());
    };
    marks.insert(name, Mark::Visiting);
    path.push(name);
    for f in &msg.fields {
        if let Some(inner) = f.ty.embedded_message() {
            visit(inner, declared, marks, path)?;
        }
    }
    path.pop();
    marks.insert(name, Mark::Done);
    Ok(())
}

#[derive(Clone, Copy)]
enum Surface {
    Handlers,
    Client,
    ServerFns,
}

/// Provided `ServerHandlers` method every server gets.
const DISCONNECT_HANDLER: &str = "on_disconnect";

/// Distinct procedures must not map onto the same generated method name.
fn check_generated_names(decls: &[Declaration]) -> Result<(), Diagnostic> {
    let mut tables: [BTreeMap<String, &ProcedureDecl>; 3] = Default::default();
    for d in decls {
        let (p, claims) = match d {
            Declaration::Message(_) => continue,
            Declaration::ServerProcedure(p) => {
                let names = ProcedureNames::new(&p.name);
                let claims = vec![
                    (Surface::Handlers, names.handler),
                    (Surface::Client, names.send),
                ];
                (p, claims)
            }
            Declaration::ClientProcedure(p) => {
                let names = ProcedureNames::new(&p.name);
                let mut claims = vec![
                    (Surface::ServerFns, names.send),
                    (Surface::ServerFns, names.broadcast),
                ];
                if !p.is_oneway() {
                    claims.push((Surface::Handlers, names.reply_handler));
                    claims.push((Surface::Client, names.reply));
                }
                (p, claims)
            }
        };
        for (surface, ident) in claims {
            if matches!(surface, Surface::Handlers) && ident == DISCONNECT_HANDLER {
                return Err(Diagnostic::error(
                    DiagnosticCode::WC0201DuplicateDeclarationName,
                    format!("procedure `{}` collides with `ServerHandlers::{ident}`", p.name),
                )
                .at_line(p.line));
            }
            if let Some(other) = tables[surface as usize].insert(ident.clone(), p) {
                return Err(Diagnostic::error(
                    DiagnosticCode::WC0201DuplicateDeclarationName,
                    format!(
                        "procedures `{}` and `{}` both generate `{ident}`",
                        other.name, p.name
                    ),
                )
                .at_line(p.line));
            }
        }
    }
    Ok(())
}

/// Received message types whose names fold to the same snake_case would share client accessors.
fn check_inbox_names(decls: &[Declaration]) -> Result<(), Diagnostic> {
    let mut owners: BTreeMap<String, &str> = BTreeMap::new();
    for d in decls {
        let (received, line) = match d {
            Declaration::ServerProcedure(p) if !p.is_oneway() => (p.response.as_str(), p.line),
            Declaration::ClientProcedure(p) => (p.request.as_str(), p.line),
            _ => continue,
        };
        let take = InboxNames::new(received).take;
        match owners.get(&take) {
            Some(other) if *other != received => {
                return Err(Diagnostic::error(
                    DiagnosticCode::WC0201DuplicateDeclarationName,
                    format!("messages `{other}` and `{received}` both generate `{take}`"),
                )
                .at_line(line));
            }
            Some(_) => {}
            None => {
                owners.insert(take, received);
            }
        }
    }
    Ok(())
}
