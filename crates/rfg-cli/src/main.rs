use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use rfg_core::config::{self, CONFIG_FILE_NAME, Facet, RfgConfig};
use rfg_core::ir::{IrSpec, IrTypeKind};
use rfg_core::parse::include::IncludeResolver;
use rfg_core::transform;
use rfg_core::GeneratedFile;
use rfg_engine::{GenerationOutput, Orchestrator};

#[derive(Parser)]
#[command(name = "rfg", about = "RAML 1.0 to Flask and Python client generator", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a Flask project and/or client from a RAML spec
    Generate {
        /// Path to the RAML spec
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Facets to generate (repeatable); defaults to the config file's
        #[arg(long = "facet", value_enum)]
        facets: Vec<FacetArg>,

        /// Write files even when validation reports fatal findings
        #[arg(long)]
        force: bool,
    },

    /// Validate a RAML spec
    Validate {
        /// Path to the RAML spec
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Inspect the parsed IR of a RAML spec
    Inspect {
        /// Path to the RAML spec
        #[arg(short, long)]
        input: PathBuf,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: InspectFormat,
    },

    /// Initialize a new rfg configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FacetArg {
    FlaskApp,
    Client,
    Tests,
    Auth,
    Cors,
}

impl From<FacetArg> for Facet {
    fn from(arg: FacetArg) -> Self {
        match arg {
            FacetArg::FlaskApp => Facet::FlaskApp,
            FacetArg::Client => Facet::Client,
            FacetArg::Tests => Facet::Tests,
            FacetArg::Auth => Facet::Auth,
            FacetArg::Cors => Facet::Cors,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum InspectFormat {
    Yaml,
    Json,
}

/// Reads `!include` fragments from the spec's directory.
struct IncludeDir {
    root: PathBuf,
}

impl IncludeDir {
    fn for_spec(spec: &Path) -> Self {
        let root = spec
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self { root }
    }
}

impl IncludeResolver for IncludeDir {
    fn resolve(&self, fragment: &str) -> Option<String> {
        let path = self.root.join(fragment);
        if !path.is_file() {
            return None;
        }
        log::debug!("including {}", path.display());
        fs::read_to_string(path).ok()
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            input,
            output,
            facets,
            force,
        } => {
            let cfg = try_load_config()?.unwrap_or_default();
            cmd_generate(cfg, input, output, facets, force)
        }

        Commands::Validate { input } => cmd_validate(&input),

        Commands::Inspect { input, format } => cmd_inspect(&input, format),

        Commands::Init { force } => cmd_init(Path::new(CONFIG_FILE_NAME), force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "rfg", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Try to load the project config file from the current directory.
fn try_load_config() -> Result<Option<RfgConfig>> {
    config::load_config(Path::new(CONFIG_FILE_NAME)).map_err(|e| anyhow::anyhow!(e))
}

fn read_spec(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_spec(path: &Path) -> Result<IrSpec> {
    let bytes = read_spec(path)?;
    let ir = transform::load_bytes(&bytes, &IncludeDir::for_spec(path))?;
    Ok(ir)
}

/// Write generated files to disk under the given base directory.
fn write_files(base: &Path, files: &[GeneratedFile]) -> Result<()> {
    for file in files {
        let path = base.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        fs::write(&path, &file.content).with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("  wrote {}", path.display());
    }
    Ok(())
}

fn print_report(output: &GenerationOutput) {
    for finding in &output.report.findings {
        eprintln!("  {finding}");
    }
}

fn cmd_generate(
    mut cfg: RfgConfig,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    facets: Vec<FacetArg>,
    force: bool,
) -> Result<()> {
    let input = input.unwrap_or_else(|| PathBuf::from(&cfg.input));
    let output_dir = output.unwrap_or_else(|| PathBuf::from(&cfg.output));
    if !facets.is_empty() {
        cfg.generation.facets = facets.into_iter().map(Facet::from).collect();
    }

    let bytes = read_spec(&input)?;
    let result = Orchestrator::new()
        .run_with_includes(&bytes, &IncludeDir::for_spec(&input), &cfg.generation)
        .with_context(|| format!("failed to load {}", input.display()))?;

    print_report(&result);
    if !result.is_releasable() {
        if !force {
            anyhow::bail!(
                "{} fatal finding(s); nothing written. Use --force to write anyway.",
                result.report.fatals().count()
            );
        }
        eprintln!("Writing despite fatal findings (--force).");
    }

    fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create output directory {}", output_dir.display()))?;
    write_files(&output_dir, &result.artifacts)?;

    eprintln!(
        "Generated {} files in {}",
        result.artifacts.len(),
        output_dir.display()
    );
    Ok(())
}

fn cmd_validate(input: &Path) -> Result<()> {
    let ir = load_spec(input)?;

    eprintln!("Valid RAML spec: {}", ir.info.title);
    eprintln!("  Version: {}", ir.info.version);
    eprintln!("  Resources: {}", ir.all_resources().len());
    eprintln!("  Methods: {}", ir.all_methods().len());
    eprintln!("  Types: {}", ir.types.len());
    eprintln!("  Security schemes: {}", ir.security_schemes.len());
    for warning in &ir.warnings {
        eprintln!("  warning: {warning}");
    }

    eprintln!("Validation successful.");
    Ok(())
}

fn cmd_inspect(input: &Path, format: InspectFormat) -> Result<()> {
    let ir = load_spec(input)?;
    let summary = build_inspect_summary(&ir);

    match format {
        InspectFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&summary)?;
            print!("{}", yaml);
        }
        InspectFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn build_inspect_summary(ir: &IrSpec) -> serde_json::Value {
    let types: Vec<serde_json::Value> = ir
        .types
        .values()
        .map(|t| {
            serde_json::json!({
                "name": t.name.pascal_case,
                "kind": match &t.kind {
                    IrTypeKind::Primitive(_) => "primitive",
                    IrTypeKind::Object(_) => "object",
                    IrTypeKind::Array(_) => "array",
                    IrTypeKind::Union(_) => "union",
                    IrTypeKind::Alias(_) => "alias",
                },
                "synthesized": t.synthesized,
            })
        })
        .collect();

    let methods: Vec<serde_json::Value> = ir
        .all_methods()
        .iter()
        .map(|m| {
            serde_json::json!({
                "name": m.method.name.snake_case,
                "method": m.method.verb.as_str(),
                "path": m.method.path,
                "secured_by": m.method.secured_by,
            })
        })
        .collect();

    serde_json::json!({
        "info": {
            "title": ir.info.title,
            "version": ir.info.version,
            "base_uri": ir.info.base_uri,
        },
        "types": types,
        "methods": methods,
        "security_schemes": ir.security_schemes.keys().collect::<Vec<_>>(),
        "warnings": ir.warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
    })
}

fn cmd_init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &str = "\
#%RAML 1.0
title: Pets
types:
  Pet: !include pet.raml
/pets:
  get:
    responses:
      200:
        body:
          application/json: Pet[]
";

    fn project() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let spec = dir.path().join("api.raml");
        fs::write(&spec, SPEC).unwrap();
        fs::write(dir.path().join("pet.raml"), "properties:\n  name: string\n").unwrap();
        (dir, spec)
    }

    #[test]
    fn test_generate_writes_files() {
        let (dir, spec) = project();
        let out = dir.path().join("out");
        cmd_generate(
            RfgConfig::default(),
            Some(spec),
            Some(out.clone()),
            vec![FacetArg::FlaskApp, FacetArg::Client],
            false,
        )
        .unwrap();

        assert!(out.join("app/models/pet.py").is_file());
        assert!(out.join("app/api/v1/routes.py").is_file());
        assert!(out.join("client/api_client.py").is_file());
        assert!(!out.join("tests").exists());
    }

    #[test]
    fn test_include_resolves_from_spec_dir() {
        let (_dir, spec) = project();
        let ir = load_spec(&spec).unwrap();
        assert!(ir.types.contains_key("Pet"));
    }

    #[test]
    fn test_missing_include_fails() {
        let dir = tempfile::tempdir().unwrap();
        let spec = dir.path().join("api.raml");
        fs::write(&spec, SPEC).unwrap();
        assert!(load_spec(&spec).is_err());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        cmd_init(&path, false).unwrap();
        assert!(cmd_init(&path, false).is_err());
        cmd_init(&path, true).unwrap();

        let loaded = config::load_config(&path).unwrap().unwrap();
        assert_eq!(loaded.generation, rfg_core::config::GenerationConfig::default());
    }

    #[test]
    fn test_inspect_summary() {
        let (_dir, spec) = project();
        let summary = build_inspect_summary(&load_spec(&spec).unwrap());
        assert_eq!(summary["info"]["title"], "Pets");
        assert_eq!(summary["methods"][0]["name"], "list_pets");
        assert_eq!(summary["types"][0]["kind"], "object");
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["rfg", "generate", "-i", "api.raml", "--facet", "flask-app", "--facet", "client"]).unwrap();
        assert!(matches!(cli.command, Commands::Generate { ref facets, .. } if facets.len() == 2));
    }
}
