//! Shared, version-pinned identifiers.
//!
//! These constants are the single source of truth for schema/version strings that appear in
//! machine-readable wirec output, and for the names both peers agree on without coordination.

pub const WIREC_REPORT_SCHEMA_VERSION: &str = "wirec.report@0.1.0";
pub const WIREC_DIAG_SCHEMA_VERSION: &str = "wirec.diag@0.1.0";
pub const WIREC_OPCODE_MAP_SCHEMA_VERSION: &str = "wirec.opcode-map@0.1.0";

pub const GENERATED_MESSAGES_FILE: &str = "generated_messages.rs";
pub const GENERATED_SERVER_FILE: &str = "generated_rpc_server.rs";
pub const GENERATED_CLIENT_FILE: &str = "generated_rpc_client.rs";

/// Name of the zero-field message used when a procedure omits its request or response.
pub const CANONICAL_EMPTY_MESSAGE: &str = "Empty";

/// High bit set on the frame byte of client-owned procedures.
pub const CLIENT_PROCEDURE_WIRE_TAG: u8 = 0x80;

/// Largest opcode a procedure category may use once the wire tag is reserved.
pub const MAX_PROCEDURE_OPCODE: u8 = 0x7f;

pub const MAX_MESSAGE_OPCODE: u8 = u8::MAX;
