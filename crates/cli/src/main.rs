//! MarketScope CLI: price bounds, scripted search sessions, and the HTTP API.
//!
//! Calls `marketscope-core` directly; `serve` hands off to `marketscope-http`.

use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use marketscope_core::catalog::{load_catalog, CatalogSnapshot};
use marketscope_core::coordinator::SearchCoordinator;
use marketscope_core::draft::{DraftCommand, DraftState};
use marketscope_core::labels::{KeyEcho, PanelView, TranslationTable, Translator};
use marketscope_core::load_marketscope_config;
use marketscope_core::state::SharedSearchState;
use marketscope_core::types::{CertStatus, ProductCategory, SearchConfig, SearchScope};
use marketscope_http::AppContext;

/// MarketScope CLI: compose marketplace searches from the terminal.
#[derive(Parser)]
#[command(name = "ms", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    /// Directory holding .marketscope.toml (default: current directory)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the price bounds derived from a catalog
    Bounds {
        /// Catalog JSON file (array of items with a `price` field)
        #[arg(long)]
        catalog: PathBuf,
    },
    /// Run one search session: open, type, wait for the debounce, commit
    Search {
        /// Query text
        query: String,

        /// Catalog JSON file used to seed the price range
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Search scope: all, products, certificates
        #[arg(long, default_value = "all")]
        scope: SearchScope,

        /// Product category: all, food, cosmetics, fashion, pharmaceuticals
        #[arg(long)]
        category: Option<ProductCategory>,

        /// Certification status: all, certified, expired, notCertified
        #[arg(long)]
        cert_status: Option<CertStatus>,

        /// Lower price bound (clamped to the catalog range)
        #[arg(long)]
        min_price: Option<f64>,

        /// Upper price bound (clamped to the catalog range)
        #[arg(long)]
        max_price: Option<f64>,
    },
    /// Print the labelled search panel for a scope
    Labels {
        /// Translation table JSON (flat key -> text object)
        #[arg(long)]
        translations: Option<PathBuf>,

        /// Scope whose filter sections to show
        #[arg(long, default_value = "all")]
        scope: SearchScope,

        /// Catalog JSON file used for the price range
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Serve the search overlay HTTP API
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8432")]
        port: u16,

        /// Catalog JSON file loaded at startup
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Translation table JSON for panel labels
        #[arg(long)]
        translations: Option<PathBuf>,

        /// Bind to 0.0.0.0 instead of 127.0.0.1 (localhost)
        #[arg(long)]
        bind_all: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {message}");
    std::process::exit(1);
}

fn read_catalog(path: Option<&Path>) -> CatalogSnapshot {
    match path {
        Some(p) => load_catalog(p).unwrap_or_else(|e| fail(e)),
        None => CatalogSnapshot::default(),
    }
}

fn read_translator(path: Option<&Path>) -> Arc<dyn Translator + Send + Sync> {
    match path {
        Some(p) => Arc::new(TranslationTable::load(p).unwrap_or_else(|e| fail(e))),
        None => Arc::new(KeyEcho),
    }
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => fail(e),
    }
}

fn load_config(dir: Option<PathBuf>) -> SearchConfig {
    let dir = dir.or_else(|| std::env::current_dir().ok()).unwrap_or_else(|| PathBuf::from("."));
    load_marketscope_config(&dir)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The server reports its address and routes at info level
    let directive = match cli.command {
        Commands::Serve { .. } => "marketscope=info",
        _ => "marketscope=warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(directive.parse().expect("static directive")),
        )
        .with_target(false)
        .init();

    let config = load_config(cli.config_dir);

    match cli.command {
        Commands::Bounds { catalog } => {
            let snapshot = read_catalog(Some(&catalog));
            let bounds = snapshot.bounds();
            if cli.json {
                print_json(&serde_json::json!({
                    "items": snapshot.len(),
                    "min": bounds.min,
                    "max": bounds.max,
                }));
            } else {
                println!("Items:  {}", snapshot.len());
                println!("Min:    {}", bounds.min);
                println!("Max:    {}", bounds.max);
            }
        }
        Commands::Search { query, catalog, scope, category, cert_status, min_price, max_price } => {
            let shared = Arc::new(SharedSearchState::new());
            let routed = Arc::new(Mutex::new(None));
            let route_slot = Arc::clone(&routed);
            let mut coordinator = SearchCoordinator::new(shared.clone(), &config)
                .with_router(move |scope| {
                    *route_slot.lock().unwrap_or_else(|p| p.into_inner()) = Some(scope)
                });

            coordinator.set_catalog(&read_catalog(catalog.as_deref()));
            coordinator.open();
            coordinator.input(DraftCommand::SetQuery(query));
            coordinator.input(DraftCommand::SetScope(scope));
            if let Some(category) = category {
                coordinator.input(DraftCommand::SetCategory(category));
            }
            if let Some(status) = cert_status {
                coordinator.input(DraftCommand::SetCertStatus(status));
            }
            if min_price.is_some() || max_price.is_some() {
                let bounds = coordinator.bounds();
                coordinator.input(DraftCommand::SetPriceRange {
                    min: min_price.unwrap_or(bounds.min),
                    max: max_price.unwrap_or(bounds.max),
                });
            }

            // Let the typed query settle before committing
            tokio::time::sleep(coordinator.debounce_delay() + std::time::Duration::from_millis(20)).await;

            let Some(effective) = coordinator.commit() else {
                fail("search panel closed before commit");
            };
            let Some(request) = shared.current() else {
                fail("no committed search");
            };
            let route = (*routed.lock().unwrap_or_else(|p| p.into_inner())).unwrap_or(effective);

            if cli.json {
                print_json(&serde_json::json!({
                    "request": request.as_ref(),
                    "effectiveScope": route,
                }));
            } else {
                let filters = request.relevant_filters();
                println!("Query:        {}", request.query);
                println!("Scope:        {}", request.scope);
                println!("Routed to:    {route}");
                if request.scope.shows_product_filters() {
                    println!("Category:     {}", filters.effective_category());
                    if let (Some(lo), Some(hi)) = (filters.min_price, filters.max_price) {
                        println!("Price:        {lo} - {hi}");
                    }
                }
                if request.scope.shows_certificate_filters() {
                    println!("Cert status:  {}", filters.effective_cert_status());
                }
            }
        }
        Commands::Labels { translations, scope, catalog } => {
            let translator = read_translator(translations.as_deref());
            let bounds = read_catalog(catalog.as_deref()).bounds();
            let mut draft = DraftState::seeded(bounds);
            draft.apply(DraftCommand::SetScope(scope), bounds);
            let view = PanelView::build(&draft, bounds, translator.as_ref());

            if cli.json {
                print_json(&view);
            } else {
                println!("{}", view.scopes_label);
                for option in &view.scopes {
                    let marker = if option.selected { "*" } else { " " };
                    println!("  {marker} {:<14} {}", option.value, option.label);
                }
                println!("\n{}", view.filters_label);
                for select in [&view.category, &view.cert_status].into_iter().flatten() {
                    println!("  {}", select.label);
                    for option in &select.options {
                        println!("    {:<16} {}", option.value, option.label);
                    }
                }
                if let Some(price) = &view.price {
                    println!("  {}: {} - {}", price.label, price.min, price.max);
                }
            }
        }
        Commands::Serve { port, catalog, translations, bind_all } => {
            let ctx = AppContext::new(&config, read_translator(translations.as_deref()));
            ctx.coordinator().set_catalog(&read_catalog(catalog.as_deref()));

            let bind_addr = if bind_all { "0.0.0.0" } else { "127.0.0.1" };
            if let Err(e) = marketscope_http::serve(ctx, bind_addr, port).await {
                fail(e);
            }
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "ms", &mut std::io::stdout());
        }
    }
}
