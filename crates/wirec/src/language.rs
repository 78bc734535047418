pub const LANG_ID: &str = "wirec-idl@0.1.0";

pub mod limits {
    pub const MAX_SCHEMA_BYTES: usize = 1024 * 1024;

    pub fn max_schema_bytes() -> usize {
        match std::env::var("WIREC_MAX_SCHEMA_BYTES") {
            Ok(v) => v
                .parse::<usize>()
                .ok()
                .filter(|v| *v > 0)
                .unwrap_or(MAX_SCHEMA_BYTES),
            Err(_) => MAX_SCHEMA_BYTES,
        }
    }
}

pub mod keywords {
    pub const MESSAGE: &str = "message";
    pub const SERVER: &str = "server";
    pub const CLIENT: &str = "client";
    /// Older schema files declared server procedures with `rpc`.
    pub const LEGACY_RPC: &str = "rpc";

    pub const INT: &str = "int";
    pub const UINT: &str = "uint";
    pub const BOOL: &str = "bool";
    pub const STRING: &str = "string";
    pub const LIST: &str = "list";

    pub const BUILTIN_TYPES: &[&str] = &[INT, UINT, BOOL, STRING, LIST];

    pub const COMMENT_PREFIX: char = '#';

    pub const DEFAULT_STRING_CAPACITY: u16 = 64;
}

/// Type names the generated modules rely on; a message or procedure may not shadow them.
pub const RESERVED_TYPE_NAMES: &[&str] = &[
    "Vec",
    "String",
    "Option",
    "Result",
    "Box",
    "Some",
    "None",
    "Ok",
    "Err",
    "Default",
    "MessageId",
    "ServerProc",
    "ClientProc",
    "ServerHandlers",
    "RpcClient",
    "Sized",
    "IntoIterator",
    // Generic parameters of the generated dispatch, send and broadcast functions.
    "H",
    "I",
    "T",
    // Primitive types; a struct of the same name would shadow them.
    "char",
    "str",
    "i8",
    "i16",
    "i32",
    "i64",
    "i128",
    "isize",
    "u8",
    "u16",
    "u32",
    "u64",
    "u128",
    "usize",
    "f32",
    "f64",
];

const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "Self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be written as raw identifiers either.
const NON_RAW_KEYWORDS: &[&str] = &["crate", "self", "Self", "super"];

pub fn is_rust_keyword(s: &str) -> bool {
    RUST_KEYWORDS.contains(&s)
}

pub fn is_non_raw_keyword(s: &str) -> bool {
    NON_RAW_KEYWORDS.contains(&s)
}
