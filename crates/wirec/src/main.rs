use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use wirec::ast::Category;
use wirec::compile::{self, CompileOptions, CompileOutput};
use wirec::diagnostics::{self, Diagnostic};
use wirec::language;
use wirec_contracts::WIREC_REPORT_SCHEMA_VERSION;

#[derive(Parser)]
#[command(name = "wirec")]
#[command(about = "Message/RPC schema compiler (schema -> Rust).", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the schema language id.
    LangId,
    /// Generate the messages, server and client modules.
    Compile {
        #[arg(long)]
        schema: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
        /// Path from the server/client modules to the messages module.
        #[arg(long, default_value = "super::messages")]
        messages_module: String,
        #[arg(long, default_value = "wirec_runtime")]
        runtime_crate: String,
        /// If set, fail if outputs differ; do not write.
        #[arg(long)]
        check: bool,
        #[arg(long, value_name = "PATH")]
        emit_opcode_map: Option<PathBuf>,
        #[arg(long)]
        report_json: bool,
    },
    /// Validate a schema and print its opcode table.
    Check {
        #[arg(long)]
        schema: PathBuf,
        #[arg(long)]
        report_json: bool,
    },
    /// Print the opcode map as canonical JSON.
    Opcodes {
        #[arg(long)]
        schema: PathBuf,
    },
    /// Print the diagnostics catalog (Markdown).
    Diagnostics,
}

#[derive(Debug, Serialize)]
struct WirecToolReport {
    schema_version: &'static str,
    command: &'static str,
    ok: bool,
    r#in: String,
    diagnostics_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    outputs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<compile::CompileStats>,
    exit_code: u8,
}

impl WirecToolReport {
    fn new(command: &'static str, input: &Path) -> Self {
        WirecToolReport {
            schema_version: WIREC_REPORT_SCHEMA_VERSION,
            command,
            ok: true,
            r#in: input.display().to_string(),
            diagnostics_count: 0,
            diagnostics: Vec::new(),
            outputs: Vec::new(),
            stats: None,
            exit_code: 0,
        }
    }

    fn failed(mut self, diagnostics: Vec<Diagnostic>, exit_code: u8) -> Self {
        self.ok = false;
        self.diagnostics_count = diagnostics.len();
        self.diagnostics = diagnostics;
        self.exit_code = exit_code;
        self
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::LangId => {
            println!("{}", language::LANG_ID);
            Ok(ExitCode::SUCCESS)
        }
        Cmd::Diagnostics => {
            print!("{}", diagnostics::render_diagnostics_md());
            Ok(ExitCode::SUCCESS)
        }
        Cmd::Compile {
            schema,
            out_dir,
            messages_module,
            runtime_crate,
            check,
            emit_opcode_map,
            report_json,
        } => {
            let options = CompileOptions {
                messages_module,
                runtime_crate,
                source_name: source_name(&schema),
            };
            let out = match compile_file(&schema, &options)? {
                Ok(out) => out,
                Err(diag) => return fail_schema("compile", &schema, diag, report_json),
            };

            let mut report = WirecToolReport::new("compile", &schema);
            report.stats = Some(out.stats);
            if check {
                let stale = compile::check_artifacts(&out_dir, &out.artifacts)?;
                if !stale.is_empty() {
                    let listed: Vec<String> =
                        stale.iter().map(|p| p.display().to_string()).collect();
                    if report_json {
                        report.outputs = listed;
                        report.ok = false;
                        report.exit_code = 1;
                        print_json(&report)?;
                        return Ok(ExitCode::from(1));
                    }
                    eprintln!("generated output differs: {}", listed.join(", "));
                    return Ok(ExitCode::from(1));
                }
            } else {
                let written = compile::write_artifacts(&out_dir, &out.artifacts)?;
                report.outputs = written.iter().map(|p| p.display().to_string()).collect();
            }

            if let Some(path) = emit_opcode_map {
                let text = opcode_map_text(&out)?;
                if check {
                    let cur = std::fs::read_to_string(&path)
                        .with_context(|| format!("read existing opcode map: {}", path.display()))?;
                    if cur != text {
                        eprintln!("opcode map differs: {}", path.display());
                        return Ok(ExitCode::from(1));
                    }
                } else {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("create dir: {}", parent.display()))?;
                    }
                    std::fs::write(&path, text.as_bytes())
                        .with_context(|| format!("write opcode map: {}", path.display()))?;
                    report.outputs.push(path.display().to_string());
                }
            }

            if report_json {
                print_json(&report)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Cmd::Check {
            schema,
            report_json,
        } => {
            let options = CompileOptions {
                source_name: source_name(&schema),
                ..CompileOptions::default()
            };
            let out = match compile_file(&schema, &options)? {
                Ok(out) => out,
                Err(diag) => return fail_schema("check", &schema, diag, report_json),
            };
            if report_json {
                let mut report = WirecToolReport::new("check", &schema);
                report.stats = Some(out.stats);
                print_json(&report)?;
            } else {
                print!("{}", opcode_table_text(&out));
            }
            Ok(ExitCode::SUCCESS)
        }
        Cmd::Opcodes { schema } => {
            let out = match compile_file(&schema, &CompileOptions::default())? {
                Ok(out) => out,
                Err(diag) => return fail_schema("opcodes", &schema, diag, false),
            };
            print!("{}", opcode_map_text(&out)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn source_name(schema: &Path) -> String {
    schema
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| schema.display().to_string())
}

/// I/O failures are `Err`; schema diagnostics come back as `Ok(Err(_))`.
fn compile_file(
    schema: &Path,
    options: &CompileOptions,
) -> Result<std::result::Result<CompileOutput, Diagnostic>> {
    let src = std::fs::read_to_string(schema)
        .with_context(|| format!("read schema: {}", schema.display()))?;
    Ok(compile::compile_schema(&src, options))
}

fn fail_schema(
    command: &'static str,
    schema: &Path,
    diag: Diagnostic,
    report_json: bool,
) -> Result<ExitCode> {
    if report_json {
        print_json(&WirecToolReport::new(command, schema).failed(vec![diag], 1))?;
    } else {
        eprintln!("{}: {diag}", schema.display());
    }
    Ok(ExitCode::from(1))
}

fn opcode_map_text(out: &CompileOutput) -> Result<String> {
    Ok(serde_json::to_string_pretty(&out.opcodes.to_json(&out.source_sha256))? + "\n")
}

fn opcode_table_text(out: &CompileOutput) -> String {
    let mut text = String::new();
    for category in Category::ALL {
        for e in out.opcodes.category(category) {
            let wire = e.wire.map(|b| format!("  wire=0x{b:02x}")).unwrap_or_default();
            text.push_str(&format!(
                "{:<16} {:>3}  {}{wire}\n",
                category.as_str(),
                e.opcode,
                e.name
            ));
        }
    }
    text
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
