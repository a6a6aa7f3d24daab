use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;
use wine_cellar::{
    auth::{AuthService, FileSessionStore, MemorySessionStore, SessionHandle, SessionStore},
    client::{ApiClient, ExportFormat, ExportQuery},
    config::{self, ClientConfig},
    models::{
        DistributionDimension, InventoryTransaction, LogQuery, NewUser, OperationLog, Page,
        ProfileUpdate, SortOrder, StockStatus, TransactionDraft, TransactionQuery,
        TransactionType, TrendQuery, User, UserQuery, UserRole, UserUpdate, Wine, WineDraft,
        WinePatch, WineQuery,
    },
    services::{
        alerts::{classify_wine, AlertSummary, StockAlert},
        stock::StockProjection,
        InventoryService, StockMovement, WineService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;

    match cli.command {
        Commands::Auth(command) => handle_auth_command(&context, command, cli.json).await?,
        Commands::Wines(command) => handle_wines_command(&context, command, cli.json).await?,
        Commands::Stock(command) => handle_stock_command(&context, command, cli.json).await?,
        Commands::Alerts(args) => handle_alerts(&context, args, cli.json).await?,
        Commands::Dashboard(command) => {
            handle_dashboard_command(&context, command, cli.json).await?
        }
        Commands::Users(command) => handle_users_command(&context, command, cli.json).await?,
        Commands::Logs(command) => handle_logs_command(&context, command, cli.json).await?,
        Commands::Export(command) => handle_export_command(&context, command).await?,
        Commands::Import(command) => handle_import_command(&context, command, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "cellar", about = "Wine cellar inventory client", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(subcommand)]
    Auth(AuthCommands),
    #[command(subcommand)]
    Wines(WinesCommands),
    #[command(subcommand)]
    Stock(StockCommands),
    /// Classify the whole catalog and list wines that need attention
    Alerts(AlertsArgs),
    #[command(subcommand)]
    Dashboard(DashboardCommands),
    #[command(subcommand)]
    Users(UsersCommands),
    #[command(subcommand)]
    Logs(LogsCommands),
    #[command(subcommand)]
    Export(ExportCommands),
    #[command(subcommand)]
    Import(ImportCommands),
}

#[derive(Subcommand)]
enum AuthCommands {
    Login(AuthLoginArgs),
    Logout,
    /// Show the logged-in user (the session is confirmed at startup)
    Whoami,
    Refresh,
    Profile(AuthProfileArgs),
    Password(AuthPasswordArgs),
    Forgot(AuthForgotArgs),
    Reset(AuthResetArgs),
}

#[derive(Args)]
struct AuthLoginArgs {
    #[arg(long, help = "Email address for the account")]
    email: String,
    #[arg(long, help = "Password for the account")]
    password: String,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Ask the backend for a long-lived token"
    )]
    remember_me: bool,
}

#[derive(Args)]
struct AuthProfileArgs {
    #[arg(long, help = "New display name")]
    name: Option<String>,
    #[arg(long, help = "New email address")]
    email: Option<String>,
}

#[derive(Args)]
struct AuthPasswordArgs {
    #[arg(long, help = "Current password")]
    current: String,
    #[arg(long = "new", help = "New password (at least 8 characters)")]
    new_password: String,
}

#[derive(Args)]
struct AuthForgotArgs {
    #[arg(long, help = "Email address of the account")]
    email: String,
}

#[derive(Args)]
struct AuthResetArgs {
    #[arg(long, help = "Reset token received by email")]
    token: String,
    #[arg(long = "new", help = "New password (at least 8 characters)")]
    new_password: String,
}

#[derive(Subcommand)]
enum WinesCommands {
    List(ListWinesArgs),
    Get(IdArgs),
    Create(CreateWineArgs),
    Update(UpdateWineArgs),
    Delete(IdArgs),
    /// Wines the backend reports at or below their threshold
    LowStock,
    /// Distinct values used by catalog filters
    Lookups(LookupsArgs),
}

#[derive(Args)]
struct IdArgs {
    #[arg(long, help = "Record identifier")]
    id: i64,
}

#[derive(Args)]
struct ListWinesArgs {
    #[arg(long, value_parser = parse_positive_u32, help = "Page number (1-based)")]
    page: Option<u32>,
    #[arg(long, value_parser = parse_positive_u32, help = "Results per page (max 100)")]
    page_size: Option<u32>,
    #[arg(long, help = "Free-text search across name, region and variety")]
    search: Option<String>,
    #[arg(long)]
    region: Option<String>,
    #[arg(long)]
    variety: Option<String>,
    #[arg(long)]
    supplier: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    year: Option<i32>,
    #[arg(long, help = "Minimum list price")]
    min_price: Option<f64>,
    #[arg(long, help = "Maximum list price")]
    max_price: Option<f64>,
    #[arg(long, value_enum)]
    status: Option<StockStatusArg>,
    #[arg(long, help = "Field to sort by, e.g. name or current_stock")]
    sort_by: Option<String>,
    #[arg(long, value_enum)]
    order: Option<SortOrderArg>,
}

#[derive(Args)]
struct CreateWineArgs {
    #[arg(long)]
    name: String,
    #[arg(long, help = "Vintage year")]
    year: i32,
    #[arg(long)]
    region: String,
    #[arg(long)]
    variety: Option<String>,
    #[arg(long, value_parser = parse_decimal)]
    price: Option<Decimal>,
    #[arg(long)]
    supplier: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long, help = "Opening stock")]
    stock: Option<i32>,
    #[arg(long, help = "Low-stock threshold (backend default 10)")]
    threshold: Option<i32>,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long)]
    image_url: Option<String>,
}

#[derive(Args)]
struct UpdateWineArgs {
    #[arg(long, help = "Wine identifier")]
    id: i64,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    region: Option<String>,
    #[arg(long)]
    variety: Option<String>,
    #[arg(long, value_parser = parse_decimal)]
    price: Option<Decimal>,
    #[arg(long)]
    supplier: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    threshold: Option<i32>,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long)]
    image_url: Option<String>,
}

#[derive(Args)]
struct LookupsArgs {
    #[arg(long, value_enum, default_value_t = LookupArg::Regions)]
    kind: LookupArg,
}

#[derive(Subcommand)]
enum StockCommands {
    /// Record a stock-in movement
    In(MovementArgs),
    /// Record a stock-out movement
    Out(MovementArgs),
    /// Project a movement without recording it
    Preview(PreviewArgs),
    /// Movement history for one wine
    History(HistoryArgs),
    List(ListTransactionsArgs),
}

#[derive(Args)]
struct MovementArgs {
    #[arg(long)]
    wine_id: i64,
    #[arg(long)]
    quantity: i32,
    #[arg(long, help = "Why the stock moved (required unless disabled in config)")]
    reason: Option<String>,
}

#[derive(Args)]
struct PreviewArgs {
    #[arg(long)]
    wine_id: i64,
    #[arg(long, value_enum)]
    kind: KindArg,
    #[arg(long)]
    quantity: i32,
}

#[derive(Args)]
struct HistoryArgs {
    #[arg(long)]
    wine_id: i64,
}

#[derive(Args)]
struct ListTransactionsArgs {
    #[arg(long, value_parser = parse_positive_u32)]
    page: Option<u32>,
    #[arg(long, value_parser = parse_positive_u32)]
    page_size: Option<u32>,
    #[arg(long)]
    wine_id: Option<i64>,
    #[arg(long, value_enum)]
    kind: Option<KindArg>,
    #[arg(long, help = "Start date (YYYY-MM-DD)")]
    from: Option<String>,
    #[arg(long, help = "End date (YYYY-MM-DD)")]
    to: Option<String>,
    #[arg(long, help = "Only movements by this user id")]
    performed_by: Option<i64>,
}

#[derive(Args)]
struct AlertsArgs {
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Show the backend's alert counts instead of classifying locally"
    )]
    server: bool,
}

#[derive(Subcommand)]
enum DashboardCommands {
    Summary,
    Trends(TrendsArgs),
    Distribution(DistributionArgs),
}

#[derive(Args)]
struct TrendsArgs {
    #[arg(long, value_parser = parse_positive_u32, help = "Number of days to include (default 7)")]
    days: Option<u32>,
    #[arg(long)]
    from: Option<String>,
    #[arg(long)]
    to: Option<String>,
}

#[derive(Args)]
struct DistributionArgs {
    #[arg(long, value_enum, default_value_t = DimensionArg::Region)]
    by: DimensionArg,
}

#[derive(Subcommand)]
enum UsersCommands {
    List(ListUsersArgs),
    Get(IdArgs),
    Create(CreateUserArgs),
    Update(UpdateUserArgs),
    Delete(IdArgs),
    /// Activate or deactivate an account
    Toggle(IdArgs),
}

#[derive(Args)]
struct ListUsersArgs {
    #[arg(long, value_parser = parse_positive_u32)]
    page: Option<u32>,
    #[arg(long, value_parser = parse_positive_u32)]
    page_size: Option<u32>,
    #[arg(long)]
    search: Option<String>,
    #[arg(long, value_enum)]
    role: Option<RoleArg>,
    #[arg(long)]
    active: Option<bool>,
}

#[derive(Args)]
struct CreateUserArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    password: String,
    #[arg(long, value_enum, default_value_t = RoleArg::User)]
    role: RoleArg,
}

#[derive(Args)]
struct UpdateUserArgs {
    #[arg(long)]
    id: i64,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long, value_enum)]
    role: Option<RoleArg>,
    #[arg(long)]
    active: Option<bool>,
}

#[derive(Subcommand)]
enum LogsCommands {
    List(ListLogsArgs),
    Get(IdArgs),
}

#[derive(Args)]
struct ListLogsArgs {
    #[arg(long, value_parser = parse_positive_u32)]
    page: Option<u32>,
    #[arg(long, value_parser = parse_positive_u32)]
    page_size: Option<u32>,
    #[arg(long)]
    user_id: Option<i64>,
    #[arg(long, help = "Action type, e.g. login or stock_in")]
    action: Option<String>,
    #[arg(long, help = "Entity type, e.g. wine or user")]
    entity: Option<String>,
    #[arg(long)]
    from: Option<String>,
    #[arg(long)]
    to: Option<String>,
}

#[derive(Subcommand)]
enum ExportCommands {
    Wines(ExportArgs),
    Transactions(ExportTransactionsArgs),
}

#[derive(Args)]
struct ExportArgs {
    #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
    format: FormatArg,
    #[arg(long, help = "Output file; defaults to wines.<ext> in the current directory")]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ExportTransactionsArgs {
    #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
    format: FormatArg,
    #[arg(long)]
    from: Option<String>,
    #[arg(long)]
    to: Option<String>,
    #[arg(long, help = "Output file; defaults to transactions.<ext>")]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum ImportCommands {
    Wines(ImportArgs),
}

#[derive(Args)]
struct ImportArgs {
    #[arg(long, help = "CSV file to upload")]
    file: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum StockStatusArg {
    Normal,
    Low,
    Out,
}

impl From<StockStatusArg> for StockStatus {
    fn from(value: StockStatusArg) -> Self {
        match value {
            StockStatusArg::Normal => StockStatus::Normal,
            StockStatusArg::Low => StockStatus::Low,
            StockStatusArg::Out => StockStatus::Out,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SortOrderArg {
    Asc,
    Desc,
}

impl From<SortOrderArg> for SortOrder {
    fn from(value: SortOrderArg) -> Self {
        match value {
            SortOrderArg::Asc => SortOrder::Asc,
            SortOrderArg::Desc => SortOrder::Desc,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    In,
    Out,
}

impl From<KindArg> for TransactionType {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::In => TransactionType::In,
            KindArg::Out => TransactionType::Out,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DimensionArg {
    Region,
    Variety,
}

impl From<DimensionArg> for DistributionDimension {
    fn from(value: DimensionArg) -> Self {
        match value {
            DimensionArg::Region => DistributionDimension::Region,
            DimensionArg::Variety => DistributionDimension::Variety,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Admin,
    User,
}

impl From<RoleArg> for UserRole {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Admin => UserRole::Admin,
            RoleArg::User => UserRole::User,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Excel,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Excel => ExportFormat::Excel,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LookupArg {
    Regions,
    Varieties,
    Suppliers,
    Locations,
}

struct CliContext {
    config: ClientConfig,
    client: ApiClient,
    auth: AuthService,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load client config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let store: Arc<dyn SessionStore> = match config.session_path() {
            Some(path) => {
                debug!(path = %path.display(), "using session file");
                Arc::new(FileSessionStore::new(path))
            }
            None => {
                eprintln!("Skipping session persistence: no suitable directory found.");
                Arc::new(MemorySessionStore::new())
            }
        };
        let session = SessionHandle::new(store);
        let client = ApiClient::new(&config, session).context("failed to build API client")?;
        let auth = AuthService::new(client.clone());
        if let Err(err) = auth.resume_saved_session().await {
            eprintln!(
                "Saved session is no longer valid ({}); log in again.",
                err.user_message()
            );
        }

        Ok(Self {
            config,
            client,
            auth,
        })
    }

    async fn require_session(&self) -> Result<User> {
        self.client
            .session()
            .user()
            .await
            .ok_or_else(|| anyhow!("not logged in; run `cellar auth login` first"))
    }

    fn wine_service(&self) -> WineService {
        WineService::new(self.client.clone(), self.config.default_page_size)
    }

    fn inventory_service(&self) -> InventoryService {
        InventoryService::new(self.client.clone(), self.config.transaction_policy())
    }
}

async fn handle_auth_command(context: &CliContext, command: AuthCommands, json: bool) -> Result<()> {
    match command {
        AuthCommands::Login(args) => {
            let user = context
                .auth
                .login(&args.email, &args.password, args.remember_me)
                .await
                .map_err(|e| anyhow!(e.user_message()))
                .context("login failed")?;
            if json {
                print_json(&user)?;
            } else {
                println!("Logged in as {} <{}> ({})", user.name, user.email, user.role);
                if let Some(path) = context.config.session_path() {
                    println!("Session saved to: {}", path.display());
                }
            }
            Ok(())
        }
        AuthCommands::Logout => {
            context.auth.logout().await;
            if !json {
                println!("Logged out");
            }
            Ok(())
        }
        AuthCommands::Whoami => {
            let user = context.require_session().await?;
            if json {
                print_json(&user)?;
            } else {
                render_user(&user);
            }
            Ok(())
        }
        AuthCommands::Refresh => {
            context.require_session().await?;
            context
                .auth
                .refresh_token()
                .await
                .context("failed to refresh token")?;
            if !json {
                println!("Token refreshed");
            }
            Ok(())
        }
        AuthCommands::Profile(args) => {
            context.require_session().await?;
            let user = context
                .auth
                .update_profile(ProfileUpdate {
                    name: normalize_optional_string(args.name),
                    email: normalize_optional_string(args.email),
                })
                .await
                .context("failed to update profile")?;
            if json {
                print_json(&user)?;
            } else {
                render_user(&user);
            }
            Ok(())
        }
        AuthCommands::Password(args) => {
            context.require_session().await?;
            context
                .auth
                .change_password(&args.current, &args.new_password)
                .await
                .context("failed to change password")?;
            println!("Password changed");
            Ok(())
        }
        AuthCommands::Forgot(args) => {
            context
                .auth
                .forgot_password(&args.email)
                .await
                .context("failed to request password reset")?;
            println!("If the account exists, a reset link has been sent");
            Ok(())
        }
        AuthCommands::Reset(args) => {
            context
                .auth
                .reset_password(&args.token, &args.new_password)
                .await
                .context("failed to reset password")?;
            println!("Password reset; log in with the new password");
            Ok(())
        }
    }
}

async fn handle_wines_command(
    context: &CliContext,
    command: WinesCommands,
    json: bool,
) -> Result<()> {
    context.require_session().await?;
    let wines = context.client.wines();
    match command {
        WinesCommands::List(args) => {
            let query = WineQuery {
                page: args.page,
                page_size: args
                    .page_size
                    .or(Some(context.config.default_page_size)),
                search: normalize_optional_string(args.search),
                region: normalize_optional_string(args.region),
                grape_variety: normalize_optional_string(args.variety),
                supplier: normalize_optional_string(args.supplier),
                storage_location: normalize_optional_string(args.location),
                vintage_year: args.year,
                min_price: args.min_price,
                max_price: args.max_price,
                stock_status: args.status.map(Into::into),
                sort_by: normalize_optional_string(args.sort_by),
                sort_order: args.order.map(Into::into),
            };
            let page = wines.list(&query).await.context("failed to list wines")?;
            if json {
                print_json(&page)?;
            } else {
                render_page_header("Wines", &page);
                for wine in &page.items {
                    render_wine(wine);
                }
            }
            Ok(())
        }
        WinesCommands::Get(args) => {
            let wine = wines
                .get(args.id)
                .await
                .with_context(|| format!("failed to fetch wine {}", args.id))?;
            if json {
                print_json(&wine)?;
            } else {
                render_wine_detail(&wine);
            }
            Ok(())
        }
        WinesCommands::Create(args) => {
            let draft = WineDraft {
                name: args.name,
                vintage_year: Some(args.year),
                region: args.region,
                grape_variety: args.variety,
                price: args.price,
                supplier: args.supplier,
                storage_location: args.location,
                current_stock: args.stock,
                low_stock_threshold: args.threshold,
                notes: args.notes,
                image_url: args.image_url,
            };
            let wine = context
                .wine_service()
                .create(draft)
                .await
                .context("failed to create wine")?;
            if json {
                print_json(&wine)?;
            } else {
                println!("Created wine {}", wine.id);
                render_wine(&wine);
            }
            Ok(())
        }
        WinesCommands::Update(args) => {
            let patch = WinePatch {
                name: args.name.map(normalize_string),
                vintage_year: args.year,
                region: args.region.map(normalize_string),
                grape_variety: normalize_optional_string(args.variety),
                price: args.price,
                supplier: normalize_optional_string(args.supplier),
                storage_location: normalize_optional_string(args.location),
                current_stock: None,
                low_stock_threshold: args.threshold,
                notes: normalize_optional_string(args.notes),
                image_url: normalize_optional_string(args.image_url),
            };
            let wine = context
                .wine_service()
                .update(args.id, patch)
                .await
                .with_context(|| format!("failed to update wine {}", args.id))?;
            if json {
                print_json(&wine)?;
            } else {
                render_wine(&wine);
            }
            Ok(())
        }
        WinesCommands::Delete(args) => {
            context
                .wine_service()
                .delete(args.id)
                .await
                .with_context(|| format!("failed to delete wine {}", args.id))?;
            println!("Deleted wine {}", args.id);
            Ok(())
        }
        WinesCommands::LowStock => {
            let list = wines
                .low_stock()
                .await
                .context("failed to fetch low-stock wines")?;
            if json {
                print_json(&list)?;
            } else if list.is_empty() {
                println!("No wines at or below their threshold");
            } else {
                for wine in &list {
                    render_wine(wine);
                }
            }
            Ok(())
        }
        WinesCommands::Lookups(args) => {
            let values = match args.kind {
                LookupArg::Regions => wines.regions().await,
                LookupArg::Varieties => wines.varieties().await,
                LookupArg::Suppliers => wines.suppliers().await,
                LookupArg::Locations => wines.locations().await,
            }
            .context("failed to fetch lookup values")?;
            if json {
                print_json(&values)?;
            } else {
                for value in &values {
                    println!("{value}");
                }
            }
            Ok(())
        }
    }
}

async fn handle_stock_command(
    context: &CliContext,
    command: StockCommands,
    json: bool,
) -> Result<()> {
    context.require_session().await?;
    let service = context.inventory_service();
    match command {
        StockCommands::In(args) => record_movement(&service, TransactionType::In, args, json).await,
        StockCommands::Out(args) => {
            record_movement(&service, TransactionType::Out, args, json).await
        }
        StockCommands::Preview(args) => {
            let draft = TransactionDraft::new(args.wine_id, args.kind.into(), args.quantity);
            let (wine, projection) = service
                .preview(&draft)
                .await
                .with_context(|| format!("failed to preview movement for wine {}", args.wine_id))?;
            if json {
                print_json(&projection)?;
            } else {
                println!(
                    "{} ({}): {} -> {} bottles",
                    wine.name, wine.vintage_year, wine.current_stock, projection.projected_stock
                );
                render_projection(&projection);
            }
            Ok(())
        }
        StockCommands::History(args) => {
            let history = service
                .history(args.wine_id)
                .await
                .with_context(|| format!("failed to fetch history for wine {}", args.wine_id))?;
            if json {
                print_json(&history)?;
            } else if history.is_empty() {
                println!("No movements recorded for wine {}", args.wine_id);
            } else {
                for tx in &history {
                    render_transaction(tx);
                }
            }
            Ok(())
        }
        StockCommands::List(args) => {
            let query = TransactionQuery {
                page: args.page,
                page_size: args.page_size,
                wine_id: args.wine_id,
                transaction_type: args.kind.map(Into::into),
                start_date: normalize_optional_string(args.from),
                end_date: normalize_optional_string(args.to),
                performed_by: args.performed_by,
            };
            let page = context
                .client
                .inventory()
                .list(&query)
                .await
                .context("failed to list transactions")?;
            if json {
                print_json(&page)?;
            } else {
                render_page_header("Transactions", &page);
                for tx in &page.items {
                    render_transaction(tx);
                }
            }
            Ok(())
        }
    }
}

async fn record_movement(
    service: &InventoryService,
    kind: TransactionType,
    args: MovementArgs,
    json: bool,
) -> Result<()> {
    let mut draft = TransactionDraft::new(args.wine_id, kind, args.quantity);
    if let Some(reason) = args.reason {
        draft = draft.with_reason(normalize_string(reason));
    }
    let movement = service
        .record(&draft)
        .await
        .map_err(|e| anyhow!(e.user_message()))
        .with_context(|| format!("failed to record {} for wine {}", kind.label(), args.wine_id))?;
    if json {
        print_json(&movement)?;
    } else {
        render_movement(&movement);
    }
    Ok(())
}

async fn handle_alerts(context: &CliContext, args: AlertsArgs, json: bool) -> Result<()> {
    context.require_session().await?;
    if args.server {
        let counts = context
            .client
            .dashboard()
            .alerts()
            .await
            .context("failed to fetch alert counts")?;
        if json {
            print_json(&counts)?;
        } else {
            println!("Low stock: {}", counts.low_stock_count);
            if let Some(out) = counts.out_of_stock_count {
                println!("Out of stock: {out}");
            }
        }
        return Ok(());
    }

    let (summary, alerts) = context
        .wine_service()
        .low_stock_report()
        .await
        .context("failed to build low-stock report")?;
    if json {
        #[derive(Serialize)]
        struct Report<'a> {
            summary: &'a AlertSummary,
            alerts: &'a [StockAlert],
        }
        print_json(&Report {
            summary: &summary,
            alerts: &alerts,
        })?;
    } else {
        println!(
            "Out of stock {} • critical {} • low {}",
            summary.out_of_stock_count, summary.critical_count, summary.low_stock_count
        );
        for alert in &alerts {
            render_alert(alert);
        }
    }
    Ok(())
}

async fn handle_dashboard_command(
    context: &CliContext,
    command: DashboardCommands,
    json: bool,
) -> Result<()> {
    context.require_session().await?;
    let dashboard = context.client.dashboard();
    match command {
        DashboardCommands::Summary => {
            let summary = dashboard
                .summary()
                .await
                .context("failed to fetch dashboard summary")?;
            if json {
                print_json(&summary)?;
            } else {
                println!("Wines: {}", summary.total_wines);
                println!("Bottles in stock: {}", summary.total_stock);
                println!("Stock value: {:.2}", summary.total_value);
                println!("Low stock: {}", summary.low_stock_count);
                println!("Out of stock: {}", summary.out_of_stock_count);
            }
            Ok(())
        }
        DashboardCommands::Trends(args) => {
            let trends = dashboard
                .trends(&TrendQuery {
                    days: args.days,
                    start_date: normalize_optional_string(args.from),
                    end_date: normalize_optional_string(args.to),
                })
                .await
                .context("failed to fetch stock trends")?;
            if json {
                print_json(&trends)?;
            } else {
                for day in &trends {
                    println!(
                        "{} • in {} • out {} • net {:+}",
                        day.date,
                        day.stock_in,
                        day.stock_out,
                        day.net()
                    );
                }
            }
            Ok(())
        }
        DashboardCommands::Distribution(args) => {
            let buckets = dashboard
                .distribution(args.by.into())
                .await
                .context("failed to fetch stock distribution")?;
            if json {
                print_json(&buckets)?;
            } else {
                for bucket in &buckets {
                    println!("{:<30} {}", bucket.name, bucket.value);
                }
            }
            Ok(())
        }
    }
}

async fn handle_users_command(
    context: &CliContext,
    command: UsersCommands,
    json: bool,
) -> Result<()> {
    let me = context.require_session().await?;
    if !me.is_admin() {
        bail!("user management requires an admin account");
    }
    let users = context.client.users();
    let user = match command {
        UsersCommands::List(args) => {
            let page = users
                .list(&UserQuery {
                    page: args.page,
                    page_size: args.page_size,
                    search: normalize_optional_string(args.search),
                    role: args.role.map(Into::into),
                    is_active: args.active,
                })
                .await
                .context("failed to list users")?;
            if json {
                print_json(&page)?;
            } else {
                render_page_header("Users", &page);
                for user in &page.items {
                    render_user(user);
                }
            }
            return Ok(());
        }
        UsersCommands::Get(args) => users
            .get(args.id)
            .await
            .with_context(|| format!("failed to fetch user {}", args.id))?,
        UsersCommands::Create(args) => users
            .create(&NewUser {
                email: normalize_string(args.email),
                name: normalize_string(args.name),
                password: args.password,
                role: args.role.into(),
            })
            .await
            .context("failed to create user")?,
        UsersCommands::Update(args) => users
            .update(
                args.id,
                &UserUpdate {
                    email: normalize_optional_string(args.email),
                    name: normalize_optional_string(args.name),
                    role: args.role.map(Into::into),
                    is_active: args.active,
                },
            )
            .await
            .with_context(|| format!("failed to update user {}", args.id))?,
        UsersCommands::Delete(args) => {
            if args.id == me.id {
                bail!("refusing to delete the account you are logged in with");
            }
            users
                .delete(args.id)
                .await
                .with_context(|| format!("failed to delete user {}", args.id))?;
            println!("Deleted user {}", args.id);
            return Ok(());
        }
        UsersCommands::Toggle(args) => {
            let toggle = users
                .toggle_status(args.id)
                .await
                .with_context(|| format!("failed to toggle user {}", args.id))?;
            if json {
                print_json(&toggle)?;
            } else {
                println!(
                    "User {} is now {}",
                    args.id,
                    if toggle.is_active { "active" } else { "inactive" }
                );
            }
            return Ok(());
        }
    };

    if json {
        print_json(&user)?;
    } else {
        render_user(&user);
    }
    Ok(())
}

async fn handle_logs_command(
    context: &CliContext,
    command: LogsCommands,
    json: bool,
) -> Result<()> {
    context.require_session().await?;
    let logs = context.client.logs();
    match command {
        LogsCommands::List(args) => {
            let page = logs
                .list(&LogQuery {
                    page: args.page,
                    page_size: args.page_size,
                    user_id: args.user_id,
                    action_type: normalize_optional_string(args.action),
                    entity_type: normalize_optional_string(args.entity),
                    start_date: normalize_optional_string(args.from),
                    end_date: normalize_optional_string(args.to),
                })
                .await
                .context("failed to list operation logs")?;
            if json {
                print_json(&page)?;
            } else {
                render_page_header("Logs", &page);
                for entry in &page.items {
                    render_log(entry);
                }
            }
            Ok(())
        }
        LogsCommands::Get(args) => {
            let entry = logs
                .get(args.id)
                .await
                .with_context(|| format!("failed to fetch log {}", args.id))?;
            if json {
                print_json(&entry)?;
            } else {
                render_log(&entry);
                if let Some(details) = entry.details_json() {
                    println!("{}", serde_json::to_string_pretty(&details)?);
                }
            }
            Ok(())
        }
    }
}

async fn handle_export_command(context: &CliContext, command: ExportCommands) -> Result<()> {
    context.require_session().await?;
    let transfer = context.client.transfer();
    let (bytes, path) = match command {
        ExportCommands::Wines(args) => {
            let format: ExportFormat = args.format.into();
            let bytes = transfer
                .export_wines(format)
                .await
                .context("failed to export wines")?;
            let path = args
                .output
                .unwrap_or_else(|| PathBuf::from(format!("wines.{}", format.extension())));
            (bytes, path)
        }
        ExportCommands::Transactions(args) => {
            let format: ExportFormat = args.format.into();
            let bytes = transfer
                .export_transactions(&ExportQuery {
                    format,
                    start_date: normalize_optional_string(args.from),
                    end_date: normalize_optional_string(args.to),
                })
                .await
                .context("failed to export transactions")?;
            let path = args
                .output
                .unwrap_or_else(|| PathBuf::from(format!("transactions.{}", format.extension())));
            (bytes, path)
        }
    };
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("failed writing {}", path.display()))?;
    println!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

async fn handle_import_command(
    context: &CliContext,
    command: ImportCommands,
    json: bool,
) -> Result<()> {
    context.require_session().await?;
    match command {
        ImportCommands::Wines(args) => {
            let contents = tokio::fs::read(&args.file)
                .await
                .with_context(|| format!("failed to read {}", args.file.display()))?;
            let file_name = args
                .file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow!("invalid file name {}", args.file.display()))?;
            let report = context
                .client
                .transfer()
                .import_wines(file_name, contents)
                .await
                .context("failed to import wines")?;
            if json {
                print_json(&report)?;
            } else {
                println!("Imported {} wine(s)", report.imported);
                for error in &report.errors {
                    println!("  ! {error}");
                }
            }
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_page_header<T>(label: &str, page: &Page<T>) {
    println!(
        "{} page {}/{} ({} per page) total {}",
        label,
        page.page,
        page.total_pages.max(1),
        page.page_size,
        page.total
    );
}

fn render_wine(wine: &Wine) {
    let price = wine
        .price
        .map(|p| format!("{p:.2}"))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "- Wine {} • {} {} • {} • stock {} (threshold {}) [{}] • price {}",
        wine.id,
        wine.name,
        wine.vintage_year,
        wine.region,
        wine.current_stock,
        wine.low_stock_threshold,
        classify_wine(wine),
        price
    );
}

fn render_wine_detail(wine: &Wine) {
    render_wine(wine);
    let fields = [
        ("Variety", wine.grape_variety.as_deref()),
        ("Supplier", wine.supplier.as_deref()),
        ("Location", wine.storage_location.as_deref()),
        ("Notes", wine.notes.as_deref()),
    ];
    for (label, value) in fields {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            println!("  {label}: {value}");
        }
    }
    println!("  Stock value: {:.2}", wine.stock_value());
}

fn render_transaction(tx: &InventoryTransaction) {
    let wine = tx
        .wine_name
        .clone()
        .unwrap_or_else(|| format!("wine {}", tx.wine_id));
    println!(
        "- {} • {} {} x{} • by {} • {}",
        tx.created_at.format("%Y-%m-%d %H:%M"),
        tx.transaction_type.label(),
        wine,
        tx.quantity,
        tx.performer_name.as_deref().unwrap_or("unknown"),
        tx.reason.as_deref().unwrap_or("")
    );
}

fn render_projection(projection: &StockProjection) {
    if let Some(violation) = projection.violation {
        println!("  ✗ {violation}");
        return;
    }
    if projection.will_be_out_of_stock {
        println!("  ! this movement leaves the wine out of stock");
    } else if projection.will_be_below_threshold {
        println!("  ! stock will drop below the low-stock threshold");
    }
    println!("  level after movement: {}", projection.projected_level());
}

fn render_movement(movement: &StockMovement) {
    render_transaction(&movement.transaction);
    render_projection(&movement.projection);
    println!(
        "  stock now {} (threshold {})",
        movement.wine.current_stock, movement.wine.low_stock_threshold
    );
    if movement.diverged() {
        println!(
            "  note: expected {} from local projection; server value shown",
            movement.projection.projected_stock
        );
    }
}

fn render_alert(alert: &StockAlert) {
    println!(
        "- [{}] {} {} • stock {} / threshold {} • short {}",
        alert.level,
        alert.name,
        alert.vintage_year,
        alert.current_stock,
        alert.low_stock_threshold,
        alert.shortfall
    );
}

fn render_user(user: &User) {
    println!(
        "- User {} • {} <{}> • {} • {}",
        user.id,
        user.name,
        user.email,
        user.role,
        if user.is_active { "active" } else { "inactive" }
    );
}

fn render_log(entry: &OperationLog) {
    let entity = match (&entry.entity_type, entry.entity_id) {
        (Some(kind), Some(id)) => format!(" {kind}#{id}"),
        (Some(kind), None) => format!(" {kind}"),
        _ => String::new(),
    };
    println!(
        "- {} • {} • {}{} • {}",
        entry.created_at.format("%Y-%m-%d %H:%M:%S"),
        entry.user_name.as_deref().unwrap_or("system"),
        entry.action_type,
        entity,
        entry.ip_address.as_deref().unwrap_or("-")
    );
}

fn normalize_string(value: String) -> String {
    value.trim().to_string()
}

fn normalize_optional_string(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw).map_err(|_| format!("invalid decimal '{raw}'"))
}

fn parse_positive_u32(raw: &str) -> Result<u32, String> {
    let value: u32 = raw
        .parse()
        .map_err(|_| format!("invalid integer '{raw}'"))?;
    if value == 0 {
        Err("value must be greater than zero".to_string())
    } else {
        Ok(value)
    }
}
