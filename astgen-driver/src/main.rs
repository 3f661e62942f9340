//! AST Generator Driver
//!
//! Command-line entry point. Builds the schema registry (built-in tables or
//! a schema file) and regenerates the interpreter's `ast.c` / `ast.h`.

use anyhow::{Context, Result};
use astgen_common::GenError;
use astgen_codegen::{declarations_unit, generate, EmitOptions, LayoutEngine, TargetModel};
use astgen_schema::{builtin_registry, load_schema, Registry};
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "astgen")]
#[command(about = "Generates C AST declarations and container operations")]
#[command(version = "0.1.0")]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Regenerate the operations and declarations units
    Generate {
        /// Schema file (.json or text); the built-in schema when omitted
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Directory receiving both units
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// File name of the declarations unit
        #[arg(long, default_value = "ast.h")]
        header: String,

        /// File name of the operations unit
        #[arg(long, default_value = "ast.c")]
        source: String,

        /// Include guard of the declarations unit
        #[arg(long, default_value = "saffron_AST_H")]
        guard: String,
    },

    /// Validate a schema and print a summary
    Check {
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Also print LP64 record sizes
        #[arg(long)]
        layout: bool,
    },

    /// Print the registry as JSON
    Dump {
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::init();
    }

    if let Err(e) = run(cli.command) {
        eprintln!("{}: {:#}", error_label(&e), e);
        std::process::exit(1);
    }
}

/// Schema problems are reported as such; everything else is a plain error
fn error_label(error: &anyhow::Error) -> &'static str {
    match error.downcast_ref::<GenError>() {
        Some(gen_error) if gen_error.is_schema_error() => "Schema error",
        _ => "Error",
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Generate {
            schema,
            out_dir,
            header,
            source,
            guard,
        } => {
            let options = EmitOptions {
                header_name: header,
                source_name: source,
                guard,
                ..EmitOptions::default()
            };
            for path in generate_command(schema.as_deref(), &out_dir, &options)? {
                println!("Wrote {}", path.display());
            }
        }
        Commands::Check { schema, layout } => {
            let registry = load_registry(schema.as_deref())?;
            print!("{}", summary(&registry));
            if layout {
                print!("{}", layout_report(&registry)?);
            }
        }
        Commands::Dump { schema } => {
            let registry = load_registry(schema.as_deref())?;
            let json =
                serde_json::to_string_pretty(&registry).context("Failed to serialize registry")?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn load_registry(schema: Option<&Path>) -> Result<Registry> {
    match schema {
        Some(path) => {
            info!("Loading schema from {}", path.display());
            load_schema(path).with_context(|| format!("Invalid schema {}", path.display()))
        }
        None => builtin_registry().context("Invalid built-in schema"),
    }
}

fn generate_command(
    schema: Option<&Path>,
    out_dir: &Path,
    options: &EmitOptions,
) -> Result<Vec<PathBuf>> {
    let registry = load_registry(schema)?;
    let artifacts = generate(&registry, options);
    artifacts
        .write_to(out_dir, options)
        .with_context(|| format!("Failed to write artifacts to {}", out_dir.display()))
}

fn summary(registry: &Registry) -> String {
    let mut out = format!(
        "{} families, {} variants, {} prelude enums\n",
        registry.families().len(),
        registry.variant_count(),
        registry.enums().len()
    );
    for family in registry.families() {
        let names: Vec<&str> = family.variants.iter().map(|v| v.name.as_str()).collect();
        out.push_str(&format!(
            "  {} ({} / {}): {}\n",
            family.group,
            family.base_name(),
            family.container_type(),
            names.join(", ")
        ));
    }
    out
}

fn layout_report(registry: &Registry) -> Result<String> {
    let unit = declarations_unit(registry, &EmitOptions::default());
    let model = TargetModel::lp64();
    let mut engine = LayoutEngine::new(&unit, &model);

    let mut out = String::new();
    for family in registry.families() {
        let names = std::iter::once(family.base_name())
            .chain(family.variants.iter().map(|v| v.name.as_str()));
        for name in names {
            let layout = engine.record_layout(name)?;
            out.push_str(&format!(
                "  {:<20} size {:>3} align {}\n",
                name, layout.size, layout.align
            ));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_generate_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let written = generate_command(None, dir.path(), &EmitOptions::default()).unwrap();

        assert_eq!(written.len(), 2);
        let header = fs::read_to_string(dir.path().join("ast.h")).unwrap();
        assert!(header.starts_with("#ifndef saffron_AST_H\n"));
        assert!(header.trim_end().ends_with("#endif // saffron_AST_H"));
        let source = fs::read_to_string(dir.path().join("ast.c")).unwrap();
        assert!(source.starts_with("#include \"ast.h\""));
    }

    #[test]
    fn test_generate_from_text_schema() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("small.schema");
        fs::write(&schema, "[stmt]\nStmt : Node self\nBreak : Token keyword\n").unwrap();

        let options = EmitOptions {
            header_name: "nodes.h".to_string(),
            ..EmitOptions::default()
        };
        let out = dir.path().join("out");
        generate_command(Some(&schema), &out, &options).unwrap();

        let source = fs::read_to_string(out.join("ast.c")).unwrap();
        assert!(source.starts_with("#include \"nodes.h\""));
        assert!(out.join("nodes.h").exists());
    }

    #[test]
    fn test_invalid_schema_is_reported_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("bad.schema");
        fs::write(&schema, "[stmt]\nStmt : Node self\nBreak Token keyword\n").unwrap();

        let out = dir.path().join("out");
        let err = generate_command(Some(&schema), &out, &EmitOptions::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("missing ':'"));
        assert_eq!(error_label(&err), "Schema error");
        assert!(!out.exists());
    }

    #[test]
    fn test_write_failure_is_not_a_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the output directory should go
        let blocker = dir.path().join("taken");
        fs::write(&blocker, "").unwrap();

        let err = generate_command(None, &blocker, &EmitOptions::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GenError>(),
            Some(GenError::IoError { .. })
        ));
        assert_eq!(error_label(&err), "Error");
    }

    #[test]
    fn test_summary_and_layout() {
        let registry = builtin_registry().unwrap();
        let text = summary(&registry);
        assert!(text.starts_with("4 families, 40 variants, 2 prelude enums\n"));
        assert!(text.contains("  stmt (Stmt / StmtArray): Expression, Var, Block"));

        let report = layout_report(&registry).unwrap();
        assert!(report.contains("Keyword"));
    }

    #[test]
    fn test_cli_parses_global_verbose() {
        let cli = Cli::parse_from(["astgen", "check", "-v", "--layout"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Check { layout: true, .. }));
    }
}
