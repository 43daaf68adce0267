//! docql: inspect a schema and render document queries from the shell.
//!
//! # Usage
//!
//! ```bash
//! # List collections and fields
//! docql --schema schema.toml schema
//!
//! # Render a find query for CouchDB
//! docql find users --filter status:eq:status --sort -createdAt --limit 10 --dialect couch
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use docql::prelude::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docql")]
#[command(version)]
#[command(about = "Schema-validated queries for document databases", long_about = None)]
#[command(after_help = "EXAMPLES:
    docql schema
    docql check users address.city
    docql caps firestore
    docql find users --filter status:eq:status --filter age:gte:min_age --sort -createdAt --limit 10")]
struct Cli {
    /// Schema file (TOML)
    #[arg(short, long, env = "DOCQL_SCHEMA", global = true)]
    schema: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List collections and their field paths
    Schema,
    /// Check that a collection (and optionally a field) exists
    Check {
        collection: String,
        field: Option<String>,
    },
    /// Check a parameter name
    Param { name: String },
    /// Show what a dialect can render
    Caps { dialect: Option<Dialect> },
    /// Build and render a find query
    Find {
        collection: String,

        /// Condition as path:op:param, e.g. age:gte:min_age
        #[arg(short, long)]
        filter: Vec<String>,

        /// Sort field; prefix with '-' for descending
        #[arg(long, allow_hyphen_values = true)]
        sort: Vec<String>,

        #[arg(short, long)]
        limit: Option<usize>,

        #[arg(long)]
        skip: Option<usize>,

        #[arg(short, long, default_value = "mongo")]
        dialect: Dialect,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Schema => show_schema(&load_docql(cli)?),
        Commands::Check { collection, field } => {
            check(&load_docql(cli)?, collection, field.as_deref())
        }
        Commands::Param { name } => {
            let param = Param::try_new(name.as_str())?;
            println!("{} {}", "✓".green(), param.placeholder().cyan());
            Ok(())
        }
        Commands::Caps { dialect } => {
            match dialect {
                Some(d) => show_caps(*d),
                None => Dialect::ALL.iter().for_each(|d| show_caps(*d)),
            }
            Ok(())
        }
        Commands::Find {
            collection,
            filter,
            sort,
            limit,
            skip,
            dialect,
        } => {
            let db = load_docql(cli)?;
            let builder = build_find(&db, collection, filter, sort, *limit, *skip)?;
            let result = builder.render(dialect.renderer().as_ref())?;
            print_result(*dialect, &result)
        }
    }
}

fn schema_path(cli: &Cli) -> Result<PathBuf> {
    if let Some(path) = &cli.schema {
        return Ok(path.clone());
    }
    match dirs::config_dir() {
        Some(dir) => Ok(dir.join("docql").join("schema.toml")),
        None => bail!("no schema given; use --schema or set DOCQL_SCHEMA"),
    }
}

fn load_docql(cli: &Cli) -> Result<DocQl<SchemaIndex>> {
    let path = schema_path(cli)?;
    tracing::debug!(path = %path.display(), "loading schema");
    let schema = Schema::load(&path)
        .with_context(|| format!("failed to load schema from {}", path.display()))?;
    Ok(DocQl::from_schema(&schema)?)
}

fn show_schema(db: &DocQl<SchemaIndex>) -> Result<()> {
    let collections = db.collections();
    if collections.is_empty() {
        println!("{}", "(no collections)".dimmed());
        return Ok(());
    }
    for name in collections {
        println!("{}", name.cyan().bold());
        for path in db.fields(&name) {
            let ty = db
                .field_type(&name, &path)
                .map(|t| t.to_string())
                .unwrap_or_default();
            let required = if db.is_field_required(&name, &path) {
                "required".yellow().to_string()
            } else {
                String::new()
            };
            println!("  {:30} {:10} {}", path.white(), ty.dimmed(), required);
        }
    }
    Ok(())
}

fn check(db: &DocQl<SchemaIndex>, collection: &str, field: Option<&str>) -> Result<()> {
    match field {
        Some(path) => {
            let field = db.try_f(collection, path)?;
            let ty = db.field_type(collection, path).map(|t| t.to_string()).unwrap_or_default();
            println!("{} {} {}", "✓".green(), field.to_string().cyan(), ty.dimmed());
        }
        None => {
            let coll = db.try_c(collection)?;
            println!("{} {}", "✓".green(), coll.to_string().cyan());
        }
    }
    Ok(())
}

fn show_caps(dialect: Dialect) {
    let r = dialect.renderer();
    let mark = |yes: bool| if yes { "yes".green() } else { "no".red() };

    println!("{}", dialect.as_str().cyan().bold());
    for op in Operation::ALL {
        println!("  {:16} {}", op.as_str().white(), mark(r.supports_operation(*op)));
    }
    let list = |names: Vec<&str>| if names.is_empty() { "-".to_string() } else { names.join(" ") };
    let filters: Vec<_> = FilterOperator::ALL
        .iter()
        .filter(|op| r.supports_filter(**op))
        .map(|op| op.as_str())
        .collect();
    let logic: Vec<_> = LogicOperator::ALL
        .iter()
        .filter(|l| r.supports_logic(**l))
        .map(|l| l.as_str())
        .collect();
    let updates: Vec<_> = UpdateOperator::ALL
        .iter()
        .filter(|op| r.supports_update(**op))
        .map(|op| op.as_str())
        .collect();
    let stages: Vec<_> = StageKind::ALL
        .iter()
        .filter(|s| r.supports_pipeline_stage(**s))
        .map(|s| s.as_str())
        .collect();
    println!("  {:16} {}", "filters".dimmed(), list(filters));
    println!("  {:16} {}", "logic".dimmed(), list(logic));
    println!("  {:16} {}", "updates".dimmed(), list(updates));
    println!("  {:16} {}", "stages".dimmed(), list(stages));
    println!();
}

fn build_find(
    db: &DocQl<SchemaIndex>,
    collection: &str,
    filters: &[String],
    sorts: &[String],
    limit: Option<usize>,
    skip: Option<usize>,
) -> Result<Builder> {
    let mut builder = find(db.try_c(collection)?);

    for raw in filters {
        builder = builder.filter(parse_condition(db, collection, raw)?);
    }
    for raw in sorts {
        builder = match raw.strip_prefix('-') {
            Some(path) => builder.sort_desc(db.try_f(collection, path)?),
            None => builder.sort_asc(db.try_f(collection, raw)?),
        };
    }
    if let Some(n) = limit {
        builder = builder.limit(n);
    }
    if let Some(n) = skip {
        builder = builder.skip(n);
    }
    Ok(builder)
}

/// `path:op:param`, where `op` is an operator token with or without `$`.
fn parse_condition(db: &DocQl<SchemaIndex>, collection: &str, raw: &str) -> Result<FilterItem> {
    let mut parts = raw.splitn(3, ':');
    let (Some(path), Some(op), Some(param)) = (parts.next(), parts.next(), parts.next()) else {
        bail!("invalid filter '{}': expected path:op:param", raw);
    };
    let token = if op.starts_with('$') {
        op.to_string()
    } else {
        format!("${}", op)
    };
    let operator: FilterOperator = token.parse()?;
    Ok(FilterItem::Condition(Condition {
        field: db.try_f(collection, path)?,
        operator,
        value: db.try_p(param)?,
    }))
}

fn print_result(dialect: Dialect, result: &QueryResult) -> Result<()> {
    let pretty = serde_json::to_string_pretty(&result.value()?)?;
    println!("{} {}", "Rendered for".green().bold(), dialect.as_str().cyan());
    println!("{}", pretty);
    if !result.required_params.is_empty() {
        println!();
        println!("{}", "Parameters:".cyan());
        for (i, name) in result.required_params.iter().enumerate() {
            println!("  {} :{}", i + 1, name.yellow());
        }
    }
    Ok(())
}
