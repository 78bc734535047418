use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;
use wirec_contracts::{GENERATED_CLIENT_FILE, GENERATED_MESSAGES_FILE, GENERATED_SERVER_FILE};

use crate::ast::Schema;
use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::emit::{self, EmitContext};
use crate::lexer;
use crate::opcodes::{self, OpcodeTable};
use crate::parse;
use crate::resolve;
use crate::util::sha256_hex;
use crate::validate;

#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Path from the generated server/client modules to the messages module.
    pub messages_module: String,
    /// Crate name generated code uses to reach the runtime.
    pub runtime_crate: String,
    /// Name recorded in artifact headers; keep it stable for reproducible output.
    pub source_name: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            messages_module: "super::messages".to_string(),
            runtime_crate: "wirec_runtime".to_string(),
            source_name: "schema.wirec".to_string(),
        }
    }
}

impl CompileOptions {
    fn validate(&self) -> Result<(), Diagnostic> {
        validate::validate_module_path(&self.messages_module)
            .and_then(|()| validate::validate_crate_name(&self.runtime_crate))
            .map_err(|e| Diagnostic::error(DiagnosticCode::WC0101InvalidIdentifier, e))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Messages,
    Server,
    Client,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Messages,
        ArtifactKind::Server,
        ArtifactKind::Client,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ArtifactKind::Messages => GENERATED_MESSAGES_FILE,
            ArtifactKind::Server => GENERATED_SERVER_FILE,
            ArtifactKind::Client => GENERATED_CLIENT_FILE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub kind: ArtifactKind,
    pub source: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompileStats {
    pub messages: usize,
    pub server_procedures: usize,
    pub client_procedures: usize,
}

#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub schema: Schema,
    pub opcodes: OpcodeTable,
    pub source_sha256: String,
    pub stats: CompileStats,
    /// Always in [`ArtifactKind::ALL`] order.
    pub artifacts: Vec<GeneratedArtifact>,
}

impl CompileOutput {
    pub fn artifact(&self, kind: ArtifactKind) -> &GeneratedArtifact {
        &self.artifacts[kind as usize]
    }
}

/// Lexes, parses and resolves schema text.
pub fn load_schema(src: &str) -> Result<Schema, Diagnostic> {
    let blocks = lexer::split_blocks(src)?;
    debug!("lexed {} blocks", blocks.len());
    let decls = parse::parse_blocks(&blocks)?;
    resolve::resolve(decls)
}

/// Runs the whole pipeline in memory. Nothing is written; see [`write_artifacts`].
pub fn compile_schema(src: &str, options: &CompileOptions) -> Result<CompileOutput, Diagnostic> {
    options.validate()?;
    let schema = load_schema(src)?;
    let opcodes = opcodes::assign(&schema)?;
    let source_sha256 = sha256_hex(src.as_bytes());

    let ctx = EmitContext {
        schema: &schema,
        opcodes: &opcodes,
        runtime_crate: &options.runtime_crate,
        messages_module: &options.messages_module,
        source_name: &options.source_name,
        source_sha256: &source_sha256,
    };
    let artifacts = ArtifactKind::ALL
        .iter()
        .map(|&kind| GeneratedArtifact {
            kind,
            source: match kind {
                ArtifactKind::Messages => emit::messages::emit(&ctx),
                ArtifactKind::Server => emit::server::emit(&ctx),
                ArtifactKind::Client => emit::client::emit(&ctx),
            },
        })
        .collect();

    let stats = CompileStats {
        messages: schema.messages().count(),
        server_procedures: schema.server_procedures().count(),
        client_procedures: schema.client_procedures().count(),
    };
    info!(
        "compiled {}: {} messages, {} server procedures, {} client procedures",
        options.source_name, stats.messages, stats.server_procedures, stats.client_procedures
    );
    Ok(CompileOutput {
        schema,
        opcodes,
        source_sha256,
        stats,
        artifacts,
    })
}

fn temp_path(out_dir: &Path, kind: ArtifactKind) -> PathBuf {
    out_dir.join(format!(".{}.tmp", kind.file_name()))
}

/// Writes every artifact into `out_dir`.
///
/// All files are staged next to their targets first and only renamed into place once every
/// one of them was written, so a failure leaves earlier outputs untouched.
pub fn write_artifacts(out_dir: &Path, artifacts: &[GeneratedArtifact]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create output dir: {}", out_dir.display()))?;

    let mut staged = Vec::with_capacity(artifacts.len());
    for a in artifacts {
        let tmp = temp_path(out_dir, a.kind);
        if let Err(err) = std::fs::write(&tmp, a.source.as_bytes()) {
            for (path, _) in &staged {
                let _ = std::fs::remove_file(path);
            }
            let _ = std::fs::remove_file(&tmp);
            return Err(err).with_context(|| format!("write output: {}", tmp.display()));
        }
        staged.push((tmp, out_dir.join(a.kind.file_name())));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (tmp, dst) in staged {
        std::fs::rename(&tmp, &dst)
            .with_context(|| format!("rename {} -> {}", tmp.display(), dst.display()))?;
        debug!("wrote {}", dst.display());
        written.push(dst);
    }
    Ok(written)
}

/// Returns the artifact paths whose on-disk content differs from `artifacts` (missing files
/// included). Nothing is written.
pub fn check_artifacts(out_dir: &Path, artifacts: &[GeneratedArtifact]) -> Result<Vec<PathBuf>> {
    let mut stale = Vec::new();
    for a in artifacts {
        let path = out_dir.join(a.kind.file_name());
        match std::fs::read_to_string(&path) {
            Ok(cur) if cur == a.source => {}
            Ok(_) => stale.push(path),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => stale.push(path),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("read existing output: {}", path.display()))
            }
        }
    }
    Ok(stale)
}
