use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use expense_client::api::{
    AuthApi, ExpenseApi, ExpenseQuery, ExpenseStatus, NewExpense, RequestDispatcher,
    RequestOptions,
};
use expense_client::auth::{FileStorage, GuardDecision, RouteGuard, SessionStore};
use expense_client::config::ClientConfig;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Command-line client for the expense management API.
#[derive(Parser, Debug)]
#[command(name = "expense-client", version, about)]
struct Cli {
    /// Path to a config.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base address, overrides config and EXPENSE_API_BASE
    #[arg(long, global = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "EXPENSE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "EXPENSE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Check that the backend is reachable
    Health,
    /// Work with expenses
    #[command(subcommand)]
    Expenses(ExpenseCommands),
    /// Send an arbitrary request and print the result
    Request {
        method: String,
        path: String,
        /// JSON request body
        #[arg(long)]
        body: Option<String>,
        /// Extra header as NAME:VALUE (repeatable)
        #[arg(long = "header", short = 'H')]
        headers: Vec<String>,
        /// Do not send the session token
        #[arg(long)]
        no_auth: bool,
        /// Print the whole response envelope instead of its data
        #[arg(long)]
        meta: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ExpenseCommands {
    List {
        #[arg(long)]
        status: Option<ExpenseStatus>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        size: u32,
    },
    Get {
        id: String,
    },
    Create {
        /// Amount in whole rupiah
        #[arg(long)]
        amount: i64,
        #[arg(long)]
        description: String,
        #[arg(long)]
        receipt_url: Option<String>,
    },
    Approve {
        id: String,
        #[arg(long)]
        notes: Option<String>,
    },
    Reject {
        id: String,
        #[arg(long)]
        notes: Option<String>,
    },
}

impl Commands {
    fn needs_session(&self) -> bool {
        match self {
            Self::Whoami | Self::Expenses(_) => true,
            Self::Request { no_auth, .. } => !no_auth,
            Self::Login { .. } | Self::Register { .. } | Self::Logout | Self::Health => false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::load(cli.config.as_deref())?.with_api_base(cli.api_base);
    tracing::debug!(api_base = %config.api_base, data_dir = %config.data_dir.display(), "Loaded config");

    let session = Arc::new(SessionStore::new(FileStorage::new(&config.data_dir)));
    if cli.command.needs_session() {
        if let GuardDecision::Redirect(destination) = RouteGuard::default().check(&session) {
            bail!("Not signed in ({destination}). Run `expense-client login` first.");
        }
    }

    let dispatcher = RequestDispatcher::new(config.api_base, session)?;
    run(cli.command, &dispatcher).await
}

async fn run(command: Commands, dispatcher: &RequestDispatcher) -> Result<()> {
    let auth = AuthApi::new(dispatcher);
    let expenses = ExpenseApi::new(dispatcher);

    match command {
        Commands::Login { email, password } => print_json(&auth.login(&email, &password).await?),
        Commands::Register {
            name,
            email,
            password,
        } => print_json(&auth.register(&name, &email, &password).await?),
        Commands::Logout => {
            auth.logout();
            Ok(())
        }
        Commands::Whoami => match auth.current_user() {
            Some(user) => print_json(&user),
            None => bail!("Not signed in"),
        },
        Commands::Health => print_json(&expenses.health().await?),
        Commands::Expenses(command) => run_expenses(command, &expenses).await,
        Commands::Request {
            method,
            path,
            body,
            headers,
            no_auth,
            meta,
        } => {
            let mut options = RequestOptions::default().method(method);
            if let Some(body) = body {
                let body: Value = serde_json::from_str(&body).context("--body is not valid JSON")?;
                options = options.body(body);
            }
            for header in headers {
                let (name, value) = header
                    .split_once(':')
                    .with_context(|| format!("Header '{header}' is not NAME:VALUE"))?;
                options = options.header(name.trim(), value.trim());
            }
            if no_auth {
                options = options.without_auth();
            }

            if meta {
                let envelope = dispatcher
                    .request_with_meta::<Value, Value>(&path, options)
                    .await?;
                print_json(&envelope)
            } else {
                print_json(&dispatcher.request::<Value>(&path, options).await?)
            }
        }
    }
}

async fn run_expenses(command: ExpenseCommands, api: &ExpenseApi<'_>) -> Result<()> {
    match command {
        ExpenseCommands::List { status, page, size } => {
            print_json(&api.list(&ExpenseQuery { status, page, size }).await?)
        }
        ExpenseCommands::Get { id } => print_json(&api.get(&id).await?),
        ExpenseCommands::Create {
            amount,
            description,
            receipt_url,
        } => {
            let expense = NewExpense {
                amount_idr: amount,
                description,
                receipt_url,
            };
            print_json(&api.create(&expense).await?)
        }
        ExpenseCommands::Approve { id, notes } => {
            print_json(&api.approve(&id, notes.as_deref()).await?)
        }
        ExpenseCommands::Reject { id, notes } => {
            print_json(&api.reject(&id, notes.as_deref()).await?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
