//! CLI subcommand handlers.

use crate::AuthAction;
use crate::CommentAction;
use crate::Commands;
use crate::ConfigAction;
use crate::FavoriteAction;
use crate::OutputFormat;
use crate::SelectAction;
use crate::render;
use anyhow::Context;
use prodcompare_core::config::{self, CompareConfig};
use prodcompare_core::persistence;
use prodcompare_core::export::Notifier;
use prodcompare_core::{
    Catalog, CommentStore, DirectorySink, ExportFormat, Exporter, FavoritesStore,
    FileUserRepository, JsonDirStore, ProductDraft, ProductFilter, SelectionStore, SessionService,
    SharedStore, TableBuilder, UserUpdate,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Handle a CLI subcommand against a loaded configuration.
pub fn handle_command(
    command: Commands,
    workspace: &Path,
    config: &CompareConfig,
) -> anyhow::Result<()> {
    match command {
        Commands::Compare {
            catalog,
            ids,
            hide_identical,
            format,
        } => handle_compare(&catalog, ids, hide_identical, format, workspace, config),
        Commands::Export {
            catalog,
            ids,
            format,
            out,
        } => handle_export(&catalog, ids, &format, out, workspace, config),
        Commands::List {
            catalog,
            query,
            category,
            brand,
            min,
            max,
        } => {
            let mut filter = ProductFilter::from_config(&config.catalog);
            filter.query = query.unwrap_or_default();
            filter.category = category;
            filter.brand = brand;
            if let Some(min) = min {
                filter.price_min = min;
            }
            if let Some(max) = max {
                filter.price_max = max;
            }
            handle_list(&catalog, &filter)
        }
        Commands::Select { action } => handle_select(action, workspace, config),
        Commands::Favorite { action } => handle_favorite(action, workspace, config),
        Commands::Comment { action } => handle_comment(action, workspace, config),
        Commands::Auth { action } => handle_auth(action, workspace, config),
        Commands::AddProduct {
            catalog,
            name,
            brand,
            category,
            price,
            description,
            specs,
        } => {
            let draft = ProductDraft {
                name,
                brand,
                category,
                price,
                description,
                specifications: parse_specs(&specs)?,
                ..Default::default()
            };
            handle_add_product(&catalog, draft, workspace, config)
        }
        Commands::Config { action } => handle_config(action, workspace, None),
    }
}

fn open_store(workspace: &Path, config: &CompareConfig) -> SharedStore {
    let dir = config.storage.resolve_data_dir(workspace);
    tracing::debug!(dir = %dir.display(), "using storage directory");
    Arc::new(JsonDirStore::new(dir))
}

fn open_selection(workspace: &Path, config: &CompareConfig) -> anyhow::Result<SelectionStore> {
    Ok(SelectionStore::with_capacity(
        open_store(workspace, config),
        config.selection.max_items,
    )?)
}

fn load_catalog(path: &Path) -> anyhow::Result<Catalog> {
    Catalog::from_json_file(path)
        .with_context(|| format!("Failed to load catalog from {}", path.display()))
}

/// Explicit ids win; otherwise the saved selection is used.
fn resolve_ids(
    ids: Vec<String>,
    workspace: &Path,
    config: &CompareConfig,
) -> anyhow::Result<Vec<String>> {
    if !ids.is_empty() {
        return Ok(ids);
    }
    let selection = open_selection(workspace, config)?;
    Ok(selection.items().to_vec())
}

fn handle_compare(
    catalog_path: &Path,
    ids: Vec<String>,
    hide_identical: bool,
    format: OutputFormat,
    workspace: &Path,
    config: &CompareConfig,
) -> anyhow::Result<()> {
    let catalog = load_catalog(catalog_path)?;
    let ids = resolve_ids(ids, workspace, config)?;
    let set = catalog.comparison_set(&ids)?;
    if set.is_empty() {
        println!("Nothing to compare. Pass --ids or add products with `prodcompare select add`.");
        return Ok(());
    }

    let rows = TableBuilder::new(&config.rules).build(&set, hide_identical);
    match format {
        OutputFormat::Table => print!("{}", render::comparison_table(&rows)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
    }
    Ok(())
}

/// Prints export outcomes to the terminal.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str) {
        println!("{message}");
    }

    fn error(&self, message: &str) {
        eprintln!("{message}");
    }
}

fn handle_export(
    catalog_path: &Path,
    ids: Vec<String>,
    format: &str,
    out: Option<PathBuf>,
    workspace: &Path,
    config: &CompareConfig,
) -> anyhow::Result<()> {
    let format: ExportFormat = format.parse()?;
    let catalog = load_catalog(catalog_path)?;
    let ids = resolve_ids(ids, workspace, config)?;
    let set = catalog.comparison_set(&ids)?;
    if set.is_empty() {
        anyhow::bail!("Nothing to export: the comparison is empty");
    }

    let dir = out.unwrap_or_else(|| workspace.to_path_buf());
    let exporter = Exporter::new(Arc::new(DirectorySink::new(dir)), Arc::new(ConsoleNotifier));
    let receipt = exporter.export(set.products(), format)?;
    tracing::info!(
        location = %receipt.location.display(),
        products = receipt.products,
        "export written"
    );
    Ok(())
}

fn handle_list(catalog_path: &Path, filter: &ProductFilter) -> anyhow::Result<()> {
    let catalog = load_catalog(catalog_path)?;
    let products = catalog.filter(filter);
    if products.is_empty() {
        println!("No products match the filter.");
        println!("Categories: {}", catalog.categories().join(", "));
        println!("Brands: {}", catalog.brands().join(", "));
        return Ok(());
    }
    print!("{}", render::product_list(&products));
    Ok(())
}

fn handle_select(
    action: SelectAction,
    workspace: &Path,
    config: &CompareConfig,
) -> anyhow::Result<()> {
    let mut selection = open_selection(workspace, config)?;
    match action {
        SelectAction::Add { ids, catalog } => {
            let catalog = catalog.as_deref().map(load_catalog).transpose()?;
            for id in &ids {
                if let Some(catalog) = &catalog {
                    if catalog.get(id).is_none() {
                        anyhow::bail!("Product not found: {id}");
                    }
                }
                if let Some(evicted) = selection.add(id)? {
                    println!("Selection full: removed {evicted}");
                }
                println!("Added {id} to comparison");
            }
        }
        SelectAction::Remove { id } => {
            if selection.remove(&id)? {
                println!("Removed {id} from comparison");
            } else {
                println!("{id} is not in the comparison");
            }
        }
        SelectAction::List => {
            if selection.is_empty() {
                println!("Comparison is empty.");
            } else {
                println!(
                    "Comparing ({}/{}):",
                    selection.len(),
                    config.selection.max_items
                );
                for id in selection.items() {
                    println!("  {id}");
                }
            }
        }
        SelectAction::Clear => {
            selection.clear()?;
            println!("Comparison cleared.");
        }
    }
    Ok(())
}

fn handle_favorite(
    action: FavoriteAction,
    workspace: &Path,
    config: &CompareConfig,
) -> anyhow::Result<()> {
    let mut favorites = FavoritesStore::open(open_store(workspace, config))?;
    match action {
        FavoriteAction::Toggle { id } => {
            if favorites.toggle(&id)? {
                println!("Added {id} to favorites");
            } else {
                println!("Removed {id} from favorites");
            }
        }
        FavoriteAction::List => {
            for id in favorites.ids() {
                println!("{id}");
            }
        }
    }
    Ok(())
}

fn handle_comment(
    action: CommentAction,
    workspace: &Path,
    config: &CompareConfig,
) -> anyhow::Result<()> {
    let mut comments = CommentStore::open(open_store(workspace, config))?;
    match action {
        CommentAction::Add {
            product_id,
            author,
            text,
            rating,
        } => {
            let comment = comments.add(&product_id, &author, &text, rating)?;
            println!("Comment {} added", comment.id);
        }
        CommentAction::List { product_id } => {
            let found = comments.for_product(&product_id);
            println!("{} comment(s) for {product_id}", found.len());
            print!("{}", render::comment_list(&found));
        }
        CommentAction::Delete { id } => {
            if comments.delete(&id)? {
                println!("Comment {id} deleted");
            } else {
                println!("No comment with id {id}");
            }
        }
    }
    Ok(())
}

fn open_session(workspace: &Path, config: &CompareConfig) -> anyhow::Result<SessionService> {
    let dir = config.storage.resolve_data_dir(workspace);
    let users = FileUserRepository::open(dir.join("users.json"))?;
    Ok(SessionService::new(
        Arc::new(users),
        Arc::new(JsonDirStore::new(dir)),
    )?)
}

fn handle_auth(action: AuthAction, workspace: &Path, config: &CompareConfig) -> anyhow::Result<()> {
    let mut session = open_session(workspace, config)?;
    match action {
        AuthAction::Login { email, password } => {
            let user = session.login(&email, &password)?;
            println!("Signed in as {} ({})", user.name, user.role);
        }
        AuthAction::Register {
            email,
            password,
            name,
            role,
        } => {
            let user = session.register(&email, &password, &name, Some(role.into()))?;
            println!("Registered and signed in as {} ({})", user.email, user.role);
        }
        AuthAction::Update { name, avatar } => {
            if name.is_none() && avatar.is_none() {
                anyhow::bail!("Nothing to update: pass --name and/or --avatar");
            }
            let user = session.update_user(UserUpdate { name, avatar })?;
            let avatar = user.avatar.as_deref().unwrap_or("-");
            println!("Updated {} <{}>, avatar: {avatar}", user.name, user.email);
        }
        AuthAction::Logout => {
            session.logout()?;
            println!("Signed out.");
        }
        AuthAction::Whoami => match session.current_user() {
            Some(user) => println!("{} <{}> ({})", user.name, user.email, user.role),
            None => println!("Not signed in."),
        },
    }
    Ok(())
}

fn parse_specs(specs: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    specs
        .iter()
        .map(|spec| -> anyhow::Result<(String, String)> {
            let (label, value) = spec
                .split_once('=')
                .with_context(|| format!("Invalid --spec '{spec}', expected label=value"))?;
            Ok((label.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn handle_add_product(
    catalog_path: &Path,
    draft: ProductDraft,
    workspace: &Path,
    config: &CompareConfig,
) -> anyhow::Result<()> {
    let session = open_session(workspace, config)?;
    let user = session.require_admin()?;
    let mut catalog = load_catalog(catalog_path)?;
    let product = catalog.add_product(user, draft, &config.catalog)?;
    println!("Added {} ({})", product.name, product.id);
    catalog.save_json_file(catalog_path)?;
    Ok(())
}

/// Handle `config` subcommands. These run before any configuration is
/// loaded, so a broken file can still be inspected or replaced.
pub fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init { force } => init_config(workspace, force),
        ConfigAction::Show => show_config(workspace, config_file),
    }
}

const CONFIG_HEADER: &str = "\
# ProductCompare workspace configuration.
# Any key can be overridden with PRODCOMPARE_<SECTION>__<KEY>, for example
# PRODCOMPARE_SELECTION__MAX_ITEMS=3.

";

fn init_config(workspace: &Path, force: bool) -> anyhow::Result<()> {
    let path = config::workspace_config_path(workspace);
    if path.exists() && !force {
        println!(
            "{} already exists (use --force to replace it)",
            path.display()
        );
        return Ok(());
    }
    let body = toml::to_string_pretty(&CompareConfig::default())?;
    persistence::atomic_write(&path, format!("{CONFIG_HEADER}{body}").as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), force, "wrote default configuration");
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn show_config(workspace: &Path, config_file: Option<&Path>) -> anyhow::Result<()> {
    let ws_path = config::workspace_config_path(workspace);
    let sources: Vec<String> = [Some(ws_path.as_path()), config_file]
        .into_iter()
        .flatten()
        .filter(|p| p.exists())
        .map(|p| p.display().to_string())
        .collect();
    let effective = prodcompare_core::load_config(Some(workspace), config_file, None)
        .context("Failed to load configuration")?;
    if sources.is_empty() {
        println!("# sources: built-in defaults");
    } else {
        println!("# sources: {}", sources.join(", "));
    }
    print!("{}", toml::to_string_pretty(&effective)?);
    Ok(())
}
