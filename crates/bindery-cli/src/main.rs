// crates/bindery-cli/src/main.rs
// ============================================================================
// Module: Bindery CLI Entry Point
// Description: Command dispatcher for the bookstore server and document tools.
// Purpose: Provide serve, init, validate, seed, inspect, and audit workflows.
// Dependencies: bindery-api, bindery-config, bindery-core, bindery-store-sqlite,
//               bindery-xml, clap, serde_json, thiserror, tokio.
// ============================================================================

//! ## Overview
//! The `bindery` binary wraps the HTTP server plus the offline document
//! chores: workspace initialization, stored-document validation, demo catalog
//! seeding, JSON projection, and change-log inspection. Every command loads
//! the shared configuration first so the CLI and the server always agree on
//! file locations.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use bindery_api::ApiServer;
use bindery_config::Config;
use bindery_config::config_toml_example;
use bindery_core::Book;
use bindery_core::BookId;
use bindery_core::ModelError;
use bindery_core::Money;
use bindery_core::Order;
use bindery_core::Price;
use bindery_store_sqlite::SqliteStore;
use bindery_xml::CatalogStore;
use bindery_xml::DocError;
use bindery_xml::OrdersStore;
use bindery_xml::SchemaViolation;
use bindery_xml::XmlElement;
use bindery_xml::book_to_element;
use bindery_xml::document_to_value;
use bindery_xml::element_to_value;
use bindery_xml::order_to_element;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Config file written by `init` when no `--config` path is given.
const DEFAULT_CONFIG_FILE: &str = "bindery.toml";

/// File name for the catalog schema copy written beside the documents.
const CATALOG_SCHEMA_FILE: &str = "catalog.xsd";

/// File name for the orders schema copy written beside the documents.
const ORDERS_SCHEMA_FILE: &str = "orders.xsd";

/// Exit code reported when a stored document fails schema validation.
const INVALID_EXIT_CODE: u8 = 2;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "bindery", version, about = "XML-backed bookstore server and document tools")]
struct Cli {
    /// Optional config file path (defaults to bindery.toml or the `BINDERY_CONFIG` override).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the bookstore HTTP server.
    Serve,
    /// Create the data directories, empty documents, schemas, and database.
    Init,
    /// Validate the stored documents against their embedded schemas.
    Validate(ValidateCommand),
    /// Insert the demo catalog and demo client accounts.
    Seed,
    /// Print a stored document (or one entity) as its JSON projection.
    Inspect(InspectCommand),
    /// Print change-log entries as JSON lines, newest first.
    Audit(AuditCommand),
}

/// Arguments for the `validate` command.
#[derive(Args, Debug)]
struct ValidateCommand {
    /// Document to validate.
    #[arg(value_enum, default_value_t = ValidateTarget::All)]
    target: ValidateTarget,
}

/// Documents a validate run can cover.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum ValidateTarget {
    /// The catalog document only.
    Catalog,
    /// The orders document only.
    Orders,
    /// Both stored documents.
    All,
}

/// Arguments for the `inspect` command.
#[derive(Args, Debug)]
struct InspectCommand {
    /// Document to project.
    #[arg(value_enum)]
    target: InspectTarget,
    /// Restrict output to the entity with this identifier.
    #[arg(long, value_name = "ID")]
    id: Option<String>,
}

/// Documents the `inspect` command can project.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum InspectTarget {
    /// The catalog document.
    Catalog,
    /// The orders document.
    Orders,
}

/// Arguments for the `audit` command.
#[derive(Args, Debug)]
struct AuditCommand {
    /// Maximum number of entries to print.
    #[arg(long, value_name = "N")]
    limit: Option<usize>,
    /// Restrict output to one entity's full history.
    #[arg(long, value_name = "ID")]
    entity: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying one printable message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a printable message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Parses arguments and dispatches to the selected command.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve => command_serve(cli.config.as_deref()).await,
        Commands::Init => command_init(cli.config.as_deref()),
        Commands::Validate(command) => command_validate(cli.config.as_deref(), &command),
        Commands::Seed => command_seed(cli.config.as_deref()),
        Commands::Inspect(command) => command_inspect(cli.config.as_deref(), &command),
        Commands::Audit(command) => command_audit(cli.config.as_deref(), &command),
    }
}

/// Loads configuration with the shared fail-closed resolution rules.
fn load_config(path: Option<&Path>) -> CliResult<Config> {
    Config::load(path).map_err(|err| CliError::new(format!("config error: {err}")))
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let addr = config
        .server
        .socket_addr()
        .map_err(|err| CliError::new(err.to_string()))?;
    let server = tokio::task::spawn_blocking(move || ApiServer::from_config(&config))
        .await
        .map_err(|err| CliError::new(format!("server init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    server
        .serve(addr)
        .await
        .map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Init Command
// ============================================================================

/// Executes the `init` command.
fn command_init(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let created = init_workspace(config_path, &config)?;
    if created.is_empty() {
        print_line("Workspace already initialized")?;
    } else {
        for artifact in &created {
            print_line(&format!("created {artifact}"))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Prepares the workspace: directories, empty documents, schema copies, the
/// database, and a starter config file. Existing artifacts are left untouched.
fn init_workspace(config_path: Option<&Path>, config: &Config) -> CliResult<Vec<String>> {
    let mut created = Vec::new();
    let config_file =
        config_path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);
    if !config_file.exists() {
        fs::write(&config_file, config_toml_example())
            .map_err(|err| CliError::new(format!("write {}: {err}", config_file.display())))?;
        created.push(config_file.display().to_string());
    }
    let data_dir = config.data_dir();
    let xslt_dir = config.xslt_dir();
    for dir in [&data_dir, &xslt_dir] {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .map_err(|err| CliError::new(format!("create {}: {err}", dir.display())))?;
            created.push(dir.display().to_string());
        }
    }
    let catalog_existed = config.catalog_path().exists();
    let orders_existed = config.orders_path().exists();
    let catalog = CatalogStore::open(&data_dir)
        .map_err(|err| CliError::new(format!("open catalog: {err}")))?;
    let orders =
        OrdersStore::open(&data_dir).map_err(|err| CliError::new(format!("open orders: {err}")))?;
    if !catalog_existed {
        created.push(config.catalog_path().display().to_string());
    }
    if !orders_existed {
        created.push(config.orders_path().display().to_string());
    }
    for (file_name, source) in [
        (CATALOG_SCHEMA_FILE, catalog.schema_text()),
        (ORDERS_SCHEMA_FILE, orders.schema_text()),
    ] {
        let path = data_dir.join(file_name);
        if !path.exists() {
            fs::write(&path, source)
                .map_err(|err| CliError::new(format!("write {}: {err}", path.display())))?;
            created.push(path.display().to_string());
        }
    }
    let database_existed = config.database_path().exists();
    SqliteStore::open(&config.database_path())
        .map_err(|err| CliError::new(format!("open database: {err}")))?;
    if !database_existed {
        created.push(config.database_path().display().to_string());
    }
    Ok(created)
}

// ============================================================================
// SECTION: Validate Command
// ============================================================================

/// Executes the `validate` command.
fn command_validate(config_path: Option<&Path>, command: &ValidateCommand) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let reports = collect_violations(&config, command.target)?;
    let mut invalid = false;
    for (document, violations) in &reports {
        if violations.is_empty() {
            print_line(&format!("{document}: valid"))?;
        } else {
            invalid = true;
            for violation in violations {
                print_line(&format!("{document}: {}: {}", violation.path, violation.message))?;
            }
        }
    }
    if invalid {
        Ok(ExitCode::from(INVALID_EXIT_CODE))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Validates the selected stored documents and collects their violations.
fn collect_violations(
    config: &Config,
    target: ValidateTarget,
) -> CliResult<Vec<(&'static str, Vec<SchemaViolation>)>> {
    let data_dir = config.data_dir();
    let mut reports = Vec::new();
    if matches!(target, ValidateTarget::Catalog | ValidateTarget::All) {
        let catalog = CatalogStore::open(&data_dir)
            .map_err(|err| CliError::new(format!("open catalog: {err}")))?;
        let violations = catalog
            .validate_stored()
            .map_err(|err| CliError::new(format!("validate catalog: {err}")))?;
        reports.push(("catalog", violations));
    }
    if matches!(target, ValidateTarget::Orders | ValidateTarget::All) {
        let orders = OrdersStore::open(&data_dir)
            .map_err(|err| CliError::new(format!("open orders: {err}")))?;
        let violations = orders
            .validate_stored()
            .map_err(|err| CliError::new(format!("validate orders: {err}")))?;
        reports.push(("orders", violations));
    }
    Ok(reports)
}

// ============================================================================
// SECTION: Seed Command
// ============================================================================

/// Executes the `seed` command.
fn command_seed(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let catalog = CatalogStore::open(&config.data_dir())
        .map_err(|err| CliError::new(format!("open catalog: {err}")))?;
    let (added, skipped) =
        seed_catalog(&catalog).map_err(|err| CliError::new(format!("seed catalog: {err}")))?;
    // Opening the database runs the migration and inserts the demo accounts.
    SqliteStore::open(&config.database_path())
        .map_err(|err| CliError::new(format!("open database: {err}")))?;
    print_line(&format!("Seeded {added} books ({skipped} already present)"))?;
    Ok(ExitCode::SUCCESS)
}

/// Inserts the demo catalog, skipping identifiers that already exist.
fn seed_catalog(catalog: &CatalogStore) -> Result<(usize, usize), DocError> {
    let demo = demo_books().map_err(|err| DocError::Model(err.to_string()))?;
    catalog.mutate(|books| {
        let mut added = 0;
        let mut skipped = 0;
        for book in demo {
            if books.iter().any(|existing| existing.id == book.id) {
                skipped += 1;
            } else {
                books.push(book);
                added += 1;
            }
        }
        Ok((added, skipped))
    })
}

/// The demo catalog: two books in each of the four demo categories.
fn demo_books() -> Result<Vec<Book>, ModelError> {
    let entries: [(&str, &str, &str, &str, &str, &str, &str, i32, u32); 8] = [
        (
            "book_1700000000000_001",
            "Kobzar",
            "Taras Shevchenko",
            "fiction",
            "279.00",
            "Collected poems",
            "978-966-03-4683-1",
            2019,
            12,
        ),
        (
            "book_1700000000000_002",
            "The Forest Song",
            "Lesia Ukrainka",
            "fiction",
            "180.00",
            "Drama in verse",
            "978-617-12-4925-3",
            2021,
            4,
        ),
        (
            "book_1700000000000_003",
            "The Rust Programming Language",
            "Steve Klabnik",
            "technical",
            "1250.00",
            "Systems programming from first principles",
            "978-1-7185-0044-0",
            2023,
            7,
        ),
        (
            "book_1700000000000_004",
            "Clean Code",
            "Robert C. Martin",
            "technical",
            "980.00",
            "A handbook of agile software craftsmanship",
            "978-0-13-235088-4",
            2008,
            5,
        ),
        (
            "book_1700000000000_005",
            "A Brief History of Time",
            "Stephen Hawking",
            "science",
            "450.00",
            "From the big bang to black holes",
            "978-0-553-38016-3",
            1998,
            9,
        ),
        (
            "book_1700000000000_006",
            "Cosmos",
            "Carl Sagan",
            "science",
            "520.00",
            "A personal voyage through the universe",
            "978-0-345-53943-4",
            2013,
            6,
        ),
        (
            "book_1700000000000_007",
            "The Little Prince",
            "Antoine de Saint-Exupery",
            "children",
            "220.00",
            "Illustrated classic for young readers",
            "978-0-15-601219-5",
            2000,
            15,
        ),
        (
            "book_1700000000000_008",
            "Fairy Tales",
            "Ivan Franko",
            "children",
            "195.00",
            "Folk tales retold for children",
            "978-966-10-5613-7",
            2020,
            10,
        ),
    ];
    entries
        .iter()
        .map(
            |&(id, title, author, category, price, description, isbn, year, stock)| {
                Ok(Book {
                    id: BookId::new(id),
                    deleted: false,
                    title: title.to_string(),
                    author: author.to_string(),
                    category: category.to_string(),
                    price: Price::uah(Money::parse(price)?),
                    description: description.to_string(),
                    isbn: isbn.to_string(),
                    year,
                    stock,
                    image: None,
                })
            },
        )
        .collect()
}

// ============================================================================
// SECTION: Inspect Command
// ============================================================================

/// Executes the `inspect` command.
fn command_inspect(config_path: Option<&Path>, command: &InspectCommand) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let data_dir = config.data_dir();
    let projection = match command.target {
        InspectTarget::Catalog => {
            let catalog = CatalogStore::open(&data_dir)
                .map_err(|err| CliError::new(format!("open catalog: {err}")))?;
            let books = catalog
                .load()
                .map_err(|err| CliError::new(format!("load catalog: {err}")))?;
            project_catalog(&books, command.id.as_deref())?
        }
        InspectTarget::Orders => {
            let orders = OrdersStore::open(&data_dir)
                .map_err(|err| CliError::new(format!("open orders: {err}")))?;
            let orders_list = orders
                .load()
                .map_err(|err| CliError::new(format!("load orders: {err}")))?;
            project_orders(&orders_list, command.id.as_deref())?
        }
    };
    let rendered = serde_json::to_string_pretty(&projection)
        .map_err(|err| CliError::new(format!("render projection: {err}")))?;
    print_line(&rendered)?;
    Ok(ExitCode::SUCCESS)
}

/// Projects the catalog, or one book, as JSON.
fn project_catalog(books: &[Book], id: Option<&str>) -> CliResult<Value> {
    match id {
        Some(id) => books
            .iter()
            .find(|book| book.id.as_str() == id)
            .map(|book| element_to_value(&book_to_element(book)))
            .ok_or_else(|| CliError::new(format!("no book with id {id}"))),
        None => {
            let mut root = XmlElement::new("catalog");
            for book in books {
                root.push_child(book_to_element(book));
            }
            Ok(document_to_value(&root))
        }
    }
}

/// Projects the orders document, or one order, as JSON.
fn project_orders(orders: &[Order], id: Option<&str>) -> CliResult<Value> {
    match id {
        Some(id) => orders
            .iter()
            .find(|order| order.id.as_str() == id)
            .map(|order| element_to_value(&order_to_element(order)))
            .ok_or_else(|| CliError::new(format!("no order with id {id}"))),
        None => {
            let mut root = XmlElement::new("orders");
            for order in orders {
                root.push_child(order_to_element(order));
            }
            Ok(document_to_value(&root))
        }
    }
}

// ============================================================================
// SECTION: Audit Command
// ============================================================================

/// Executes the `audit` command.
fn command_audit(config_path: Option<&Path>, command: &AuditCommand) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let store = SqliteStore::open(&config.database_path())
        .map_err(|err| CliError::new(format!("open database: {err}")))?;
    let entries = match command.entity.as_deref() {
        Some(entity) => store.change_logs_for_entity(entity),
        None => store.change_logs(command.limit),
    }
    .map_err(|err| CliError::new(format!("read change log: {err}")))?;
    for entry in &entries {
        let line = serde_json::to_string(entry)
            .map_err(|err| CliError::new(format!("render change log: {err}")))?;
        print_line(&line)?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a stream write failure into a printable message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Prints one line to stdout, converting write failures into CLI errors.
fn print_line(message: &str) -> CliResult<()> {
    write_stdout_line(message).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
