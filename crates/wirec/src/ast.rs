use serde::Serialize;

use crate::types::TypeDescriptor;

/// The three independent opcode spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Message,
    ServerProcedure,
    ClientProcedure,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Message,
        Category::ServerProcedure,
        Category::ClientProcedure,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Message => "message",
            Category::ServerProcedure => "server procedure",
            Category::ClientProcedure => "client procedure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: TypeDescriptor,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDecl {
    pub name: String,
    pub fields: Vec<Field>,
    /// Zero for the synthesized `Empty` message.
    pub line: u32,
}

/// A procedure names its request and response messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureDecl {
    pub name: String,
    pub request: String,
    pub response: String,
    pub line: u32,
}

impl ProcedureDecl {
    /// No reply is sent for a procedure whose response is the canonical empty message.
    pub fn is_oneway(&self) -> bool {
        self.response == wirec_contracts::CANONICAL_EMPTY_MESSAGE
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Message(MessageDecl),
    ServerProcedure(ProcedureDecl),
    ClientProcedure(ProcedureDecl),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Message(m) => &m.name,
            Declaration::ServerProcedure(p) | Declaration::ClientProcedure(p) => &p.name,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Declaration::Message(_) => Category::Message,
            Declaration::ServerProcedure(_) => Category::ServerProcedure,
            Declaration::ClientProcedure(_) => Category::ClientProcedure,
        }
    }

    pub fn line(&self) -> u32 {
        match self {
            Declaration::Message(m) => m.line,
            Declaration::ServerProcedure(p) | Declaration::ClientProcedure(p) => p.line,
        }
    }
}

/// A resolved schema: every reference names a declared message, names are unique per category
/// and declaration order is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    declarations: Vec<Declaration>,
}

impl Schema {
    pub(crate) fn new(declarations: Vec<Declaration>) -> Self {
        Schema { declarations }
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn messages(&self) -> impl Iterator<Item = &MessageDecl> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Message(m) => Some(m),
            _ => None,
        })
    }

    pub fn server_procedures(&self) -> impl Iterator<Item = &ProcedureDecl> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::ServerProcedure(p) => Some(p),
            _ => None,
        })
    }

    pub fn client_procedures(&self) -> impl Iterator<Item = &ProcedureDecl> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::ClientProcedure(p) => Some(p),
            _ => None,
        })
    }

    pub fn procedures(&self, category: Category) -> Box<dyn Iterator<Item = &ProcedureDecl> + '_> {
        match category {
            Category::ServerProcedure => Box::new(self.server_procedures()),
            Category::ClientProcedure => Box::new(self.client_procedures()),
            Category::Message => Box::new(std::iter::empty()),
        }
    }

    pub fn message(&self, name: &str) -> Option<&MessageDecl> {
        self.messages().find(|m| m.name == name)
    }
}
