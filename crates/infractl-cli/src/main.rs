//! Infractl - workspace resource lifecycle
//!
//! Usage:
//!   infractl init               # Create the local config directory
//!   infractl auth               # Sign in through the browser
//!   infractl start [FILE]       # Deploy workspace resources
//!   infractl stop [FILE]        # Shut workspace resources down
//!   infractl patch [FILE]       # Update workspace resources in place
//!   infractl backend set ...    # Configure the hook for a backend

mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dialoguer::{Input, Password, theme::ColorfulTheme};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use infractl_core::backend::{AlwaysConfirm, Confirm};
use infractl_core::commands::{
    AuthCommand, LifecycleOptions, LifecycleReport, SignInReport, initialize,
    lifecycle::DEFAULT_WORKSPACE_FILE,
};
use infractl_core::config::HookConfig;
use infractl_core::context::AppContext;
use infractl_core::types::LifecycleOperation;
use infractl_core::workspace::BackendKind;

use crate::output::{
    ConsoleReporter, DialoguerConfirm, print_heading, print_info, print_lifecycle_result,
    print_subheading,
};

#[derive(Parser)]
#[command(name = "infractl")]
#[command(about = "Workspace resource lifecycle manager", long_about = None)]
struct Cli {
    /// Print debug logs
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the local config directory
    Init {
        /// Delete the existing configuration first
        #[arg(long, short)]
        reset: bool,

        /// Sign in after initializing
        #[arg(long, short)]
        login: bool,
    },

    /// Sign in through the browser
    Auth,

    /// Sign in with email and password
    Login {
        /// Account email (prompted when omitted)
        #[arg(long)]
        email: Option<String>,
    },

    /// Forget the signed-in user
    Logout,

    /// List workspaces known to the signed-in user
    Workspaces {
        /// Refresh the list from the API first
        #[arg(long)]
        sync: bool,
    },

    /// Deploy workspace resources
    #[command(alias = "up")]
    Start(LifecycleArgs),

    /// Shut workspace resources down
    #[command(alias = "down")]
    Stop(LifecycleArgs),

    /// Update workspace resources in place
    Patch(LifecycleArgs),

    /// Manage backend hook commands
    Backend(BackendArgs),
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable output
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[derive(Args)]
struct LifecycleArgs {
    /// Workspace file
    #[arg(default_value = DEFAULT_WORKSPACE_FILE)]
    file: PathBuf,

    /// Only configs for this environment
    #[arg(long, short)]
    env: Option<String>,

    /// Only the config with this name
    #[arg(long, short)]
    config: Option<String>,

    /// Only resources with this name
    #[arg(long, short)]
    name: Option<String>,

    /// Only resources of this type
    #[arg(long = "type", short = 't')]
    resource_type: Option<String>,

    /// Only resources in this group
    #[arg(long, short)]
    group: Option<String>,

    /// Show what would happen without changing anything
    #[arg(long, short = 'd')]
    dry_run: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y')]
    yes: bool,

    /// Output format
    #[arg(short, long, default_value = "table")]
    format: OutputFormat,
}

impl LifecycleArgs {
    fn into_options(self) -> (LifecycleOptions, OutputFormat) {
        let mut options = LifecycleOptions::new(self.file)
            .with_dry_run(self.dry_run)
            .with_auto_confirm(self.yes);
        if let Some(env) = self.env {
            options = options.with_env(env);
        }
        if let Some(config) = self.config {
            options = options.with_config(config);
        }
        if let Some(name) = self.name {
            options = options.with_name(name);
        }
        if let Some(resource_type) = self.resource_type {
            options = options.with_type(resource_type);
        }
        if let Some(group) = self.group {
            options = options.with_group(group);
        }
        (options, self.format)
    }
}

#[derive(Args)]
struct BackendArgs {
    #[command(subcommand)]
    command: BackendSubcommand,
}

#[derive(Subcommand)]
enum BackendSubcommand {
    /// Set the hook command for a backend
    Set {
        /// Backend (container, orchestrator, cloud)
        kind: BackendKind,

        /// Executable to run
        command: String,

        /// Arguments passed before the operation
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,

        /// The hook cannot handle --dry-run; infractl reports the plan itself
        #[arg(long)]
        no_dry_run: bool,
    },

    /// List configured backend hooks
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Remove the hook for a backend
    Remove {
        /// Backend (container, orchestrator, cloud)
        kind: BackendKind,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.debug {
        "infractl=debug"
    } else {
        "infractl=info,warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run_cli(cli.command) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_cli(command: Commands) -> Result<ExitCode> {
    let ctx = AppContext::from_env()?;

    match command {
        Commands::Init { reset, login } => run_init(&ctx, reset, login),
        Commands::Auth => run_auth(&ctx),
        Commands::Login { email } => run_login(&ctx, email),
        Commands::Logout => {
            if ctx.auth_command()?.sign_out()? {
                print_info("Signed out");
            } else {
                print_info("Not signed in");
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Workspaces { sync } => run_workspaces(&ctx, sync),
        Commands::Start(args) => run_lifecycle(&ctx, LifecycleOperation::Deploy, args),
        Commands::Stop(args) => run_lifecycle(&ctx, LifecycleOperation::Shutdown, args),
        Commands::Patch(args) => run_lifecycle(&ctx, LifecycleOperation::Patch, args),
        Commands::Backend(args) => run_backend(&ctx, args),
    }
}

fn run_init(ctx: &AppContext, reset: bool, login: bool) -> Result<ExitCode> {
    let report = initialize(&ctx.config_store(), reset)?;
    if report.created_dir || report.created_config {
        print_heading(&format!("Initialized {}", report.config_dir.display()));
    } else {
        print_info(&format!("Using {}", report.config_dir.display()));
    }

    if login {
        return run_auth(ctx);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_auth(ctx: &AppContext) -> Result<ExitCode> {
    let auth = ctx.auth_command()?;
    let report = auth.login_with_browser(|url| {
        if infractl_core::auth::open_in_browser(url) {
            print_subheading("Opened your browser to sign in. If it did not open, visit:");
        } else {
            print_subheading("Sign in through your browser:");
        }
        print_info(&format!("  {url}"));
        print_info("Waiting for the browser to finish...");
    })?;
    Ok(finish_sign_in(report))
}

fn run_login(ctx: &AppContext, email: Option<String>) -> Result<ExitCode> {
    let theme = ColorfulTheme::default();
    let email = match email {
        Some(email) => email,
        None => Input::<String>::with_theme(&theme)
            .with_prompt("Email")
            .interact_text()?,
    };
    let password = Password::with_theme(&theme)
        .with_prompt("Password")
        .interact()?;

    let auth: AuthCommand = ctx.auth_command()?;
    let report = auth.sign_in(&email, &password)?;
    Ok(finish_sign_in(report))
}

fn finish_sign_in(report: Option<SignInReport>) -> ExitCode {
    let Some(report) = report else {
        return ExitCode::FAILURE;
    };

    let who = report.user.username.as_deref().unwrap_or(&report.user.email);
    print_heading(&format!("Welcome {who}"));
    if report.synced {
        print_info(&format!("Workspaces: {}", report.workspaces));
    } else {
        print_info("Could not sync workspaces, run `infractl workspaces --sync` to retry");
    }
    ExitCode::SUCCESS
}

fn run_workspaces(ctx: &AppContext, sync: bool) -> Result<ExitCode> {
    if sync {
        let count = ctx.auth_command()?.sync_workspaces()?;
        tracing::info!("Synced {} workspaces", count);
    }

    let config = ctx.config_store().load_or_default()?;
    if config.workspaces.is_empty() {
        print_info("No workspaces found.");
        return Ok(ExitCode::SUCCESS);
    }

    println!("{:<30} {:<8} Git URL", "Name", "Id");
    println!("{}", "-".repeat(70));
    for ws in &config.workspaces {
        let id = ws.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<30} {:<8} {}",
            ws.name,
            id,
            ws.git_url.as_deref().unwrap_or("-")
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn run_lifecycle(
    ctx: &AppContext,
    operation: LifecycleOperation,
    args: LifecycleArgs,
) -> Result<ExitCode> {
    let (options, format) = args.into_options();

    let confirm: Arc<dyn Confirm> = if options.mode.auto_confirm {
        Arc::new(AlwaysConfirm)
    } else {
        Arc::new(DialoguerConfirm::new())
    };
    let command = ctx.resources_command(confirm)?;
    if command.registry().is_empty() {
        tracing::warn!("No backend hooks configured, add one with `infractl backend set`");
    }

    let report = match format {
        OutputFormat::Table => {
            let reporter = ConsoleReporter::new();
            command.execute(operation, &options, &reporter)?
        }
        OutputFormat::Json => {
            let reporter = infractl_core::dispatch::SilentReporter;
            command.execute(operation, &options, &reporter)?
        }
    };

    match format {
        OutputFormat::Table => print_lifecycle_result(&report.result),
        OutputFormat::Json => print_report_json(&report)?,
    }

    ctx.log_lifecycle_event(&report);

    Ok(if report.result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_report_json(report: &LifecycleReport) -> Result<()> {
    let output = serde_json::json!({
        "workspace": report.workspace,
        "result": report.result,
        "summary": report.result.summary_line(),
        "success": report.result.claims_mutation(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_backend(ctx: &AppContext, args: BackendArgs) -> Result<ExitCode> {
    let store = ctx.config_store();

    match args.command {
        BackendSubcommand::Set {
            kind,
            command,
            args,
            no_dry_run,
        } => {
            let mut hook = HookConfig::new(command).with_args(args);
            if no_dry_run {
                hook = hook.without_dry_run();
            }
            hook.validate()?;

            let mut config = store.load_or_default()?;
            let replaced = config.set_hook(kind, hook);
            store
                .save(&config)
                .with_context(|| format!("Failed to save hook for '{kind}'"))?;
            if replaced.is_some() {
                print_info(&format!("✓ Replaced hook for '{kind}'"));
            } else {
                print_info(&format!("✓ Added hook for '{kind}'"));
            }
        }
        BackendSubcommand::List { format } => {
            let config = store.load_or_default()?;
            match format {
                OutputFormat::Table => {
                    if config.backends.is_empty() {
                        println!("No backend hooks configured.");
                        println!("Add one with: infractl backend set <kind> <command> [args...]");
                        return Ok(ExitCode::SUCCESS);
                    }
                    println!("{:<14} {:<8} Command", "Backend", "Dry run");
                    println!("{}", "-".repeat(70));
                    for (kind, hook) in config.hooks() {
                        let mut command = hook.command.clone();
                        for arg in &hook.args {
                            command.push(' ');
                            command.push_str(arg);
                        }
                        let dry_run = if hook.supports_dry_run { "yes" } else { "no" };
                        println!("{:<14} {:<8} {}", kind, dry_run, command);
                    }
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&config.backends)?);
                }
            }
        }
        BackendSubcommand::Remove { kind } => {
            let mut config = store.load_or_default()?;
            if config.remove_hook(kind).is_none() {
                anyhow::bail!("No hook configured for '{kind}'");
            }
            store.save(&config)?;
            print_info(&format!("✓ Removed hook for '{kind}'"));
        }
    }

    Ok(ExitCode::SUCCESS)
}
