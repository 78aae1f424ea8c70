use anyhow::Result;
use clap::{Parser, Subcommand};
use nntp_postus::config::Config;
use nntp_postus::identity::memory::MemoryIdentity;
use nntp_postus::policy::default::DefaultPolicy;
use nntp_postus::server;
use nntp_postus::store::memory::MemoryStore;
use nntp_postus::store::{PostingMode, Store};
use nntp_postus::wire::NewsgroupName;
use std::sync::Arc;

#[derive(Parser)]
struct Args {
    /// Path to the configuration file
    #[arg(long, env = "NNTP_POSTUS_CONFIG", default_value = "/etc/nntp-postus.toml")]
    config: String,
    /// Validate the configuration file and exit without serving.
    #[arg(long)]
    init: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Administrative actions against a fresh in-memory store/identity,
    /// seeded and then immediately torn down. Intended for exercising
    /// the Store/Identity contracts from the command line, not for
    /// persisting state between invocations of this reference server.
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Subcommand)]
enum AdminCommand {
    /// Add a newsgroup.
    AddGroup {
        group: String,
        #[arg(long, value_enum, default_value = "allowed")]
        posting_mode: PostingModeArg,
    },
    /// Mark a newsgroup as ignored, hiding it from LIST/GROUP.
    RemoveGroup { group: String },
    /// Register a user, optionally with a password.
    AddUser {
        user: String,
        #[arg(long)]
        password: Option<String>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum PostingModeArg {
    Allowed,
    Moderated,
    Prohibited,
}

impl From<PostingModeArg> for PostingMode {
    fn from(arg: PostingModeArg) -> Self {
        match arg {
            PostingModeArg::Allowed => PostingMode::Allowed,
            PostingModeArg::Moderated => PostingMode::Moderated,
            PostingModeArg::Prohibited => PostingMode::Prohibited,
        }
    }
}

async fn run_admin(cmd: AdminCommand, cfg: &Config) -> Result<()> {
    let store = MemoryStore::new();
    let identity = MemoryIdentity::new(cfg.server_name.clone());
    store.init().await?;

    match cmd {
        AdminCommand::AddGroup { group, posting_mode } => {
            let name = NewsgroupName::parse(&group)?;
            store
                .add_group(
                    name,
                    String::new(),
                    posting_mode.into(),
                    chrono::Utc::now(),
                    cfg.server_name.clone(),
                    false,
                )
                .await?;
            println!("added group {group}");
        }
        AdminCommand::RemoveGroup { group } => {
            let name = NewsgroupName::parse(&group)?;
            if let Some(existing) = store.get_group(&name).await? {
                store
                    .add_group(
                        name,
                        existing.description,
                        existing.posting_mode,
                        existing.created_at,
                        existing.created_by,
                        true,
                    )
                    .await?;
                println!("removed group {group}");
            } else {
                println!("no such group: {group}");
            }
        }
        AdminCommand::AddUser { user, password } => {
            identity.register(user.clone(), password).await;
            println!("added user {user}");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "nntp_postus=info".into()))
        .init();

    let args = Args::parse();

    let cfg = match Config::from_file(&args.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };

    if args.init {
        println!("configuration at {} is valid", args.config);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async {
        if let Some(Command::Admin(cmd)) = args.command {
            if let Err(err) = run_admin(cmd, &cfg).await {
                eprintln!("Error: {err}");
                std::process::exit(1);
            }
            return Ok(());
        }

        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(MemoryIdentity::new(cfg.server_name.clone()));
        let policy = Arc::new(DefaultPolicy::new(cfg.allow_anonymous_posting, None));

        if let Err(err) = server::run(cfg, store, identity, policy).await {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
        Ok(())
    })
}
