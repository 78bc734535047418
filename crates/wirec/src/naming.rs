//! Rust identifiers derived from schema names.

use crate::language;

/// `GetGameInfo` -> `get_game_info`, `HTTPStatus` -> `http_status`.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = i.checked_sub(1).map(|j| chars[j]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Spells `name` as a usable Rust identifier, escaping keywords.
pub fn rust_ident(name: &str) -> String {
    if language::is_non_raw_keyword(name) {
        format!("{name}_")
    } else if language::is_rust_keyword(name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

/// Every identifier generated for one procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureNames {
    pub snake: String,
    /// `ServerHandlers` method for a server procedure.
    pub handler: String,
    /// `ServerHandlers` method receiving a client procedure's reply.
    pub reply_handler: String,
    /// Send stub (client-side for server procedures, server-side for client procedures).
    pub send: String,
    /// Server-side fan-out of a client procedure.
    pub broadcast: String,
    /// Client method answering a client procedure.
    pub reply: String,
}

impl ProcedureNames {
    pub fn new(procedure: &str) -> Self {
        let snake = snake_case(procedure);
        ProcedureNames {
            handler: rust_ident(&snake),
            reply_handler: format!("on_{snake}_reply"),
            send: format!("send_{snake}"),
            broadcast: format!("broadcast_{snake}"),
            reply: format!("reply_{snake}"),
            snake,
        }
    }
}

/// Client mailbox identifiers for one received message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxNames {
    pub field: String,
    pub take: String,
    pub peek: String,
}

impl InboxNames {
    pub fn new(message: &str) -> Self {
        let snake = snake_case(message);
        InboxNames {
            field: format!("{snake}_inbox"),
            take: format!("take_{snake}"),
            peek: format!("peek_{snake}"),
        }
    }
}
