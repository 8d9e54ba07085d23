use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use keeper_cloud::{create_sync_engine, ClientConfig, RecordService, ReconcileReport, Session};
use keeper_types::{BlobRecord, CardSecret, LoginSecret, TextSecret};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DATE_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

#[derive(Parser)]
#[command(name = "keeper", version)]
#[command(about = "Client-side encrypted secrets keeper", long_about = None)]
struct Cli {
    /// Keeper server base URL
    #[arg(short = 'a', long, env = "KEEPER_SERVER")]
    server: Option<String>,

    /// Directory holding local vaults
    #[arg(short = 'o', long, env = "KEEPER_VAULT_DIR")]
    vault_dir: Option<PathBuf>,

    /// Account login
    #[arg(short, long, env = "KEEPER_USER")]
    user: String,

    /// Background reconciliation interval in seconds (with `sync --watch`)
    #[arg(long, env = "KEEPER_SYNC_INTERVAL")]
    sync_interval: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register,

    /// Reconcile the local vault with the server
    Sync {
        /// Keep reconciling in the background until interrupted
        #[arg(long)]
        watch: bool,
    },

    /// Show stored records of one kind
    List {
        #[arg(value_enum)]
        kind: KindArg,
    },

    /// Store a login/password pair (password is prompted)
    AddLogin {
        description: String,
        secret_login: String,
        /// Replace an existing record with the same description
        #[arg(long)]
        overwrite: bool,
    },

    /// Store a text note
    AddText {
        description: String,
        text: String,
        #[arg(long)]
        overwrite: bool,
    },

    /// Store a payment card
    AddCard {
        number: String,
        holder: String,
        due_date: String,
        cvv: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(long)]
        overwrite: bool,
    },

    /// Upload a file as an encrypted blob
    PutBlob {
        description: String,
        file: PathBuf,
        #[arg(long)]
        overwrite: bool,
    },

    /// Download and decrypt a blob into a file
    GetBlob {
        description: String,
        #[arg(short, long)]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Logins,
    Texts,
    Cards,
    Blobs,
}

impl Cli {
    fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        if let Some(server) = &self.server {
            config.api_base_url = server.trim_end_matches('/').to_string();
        }
        if let Some(dir) = &self.vault_dir {
            config.vault_dir = dir.clone();
        }
        if let Some(secs) = self.sync_interval {
            config.sync_interval_secs = secs;
        }
        config
    }
}

fn prompt_secret(env_var: &str, prompt: &str) -> Result<String> {
    if let Ok(pw) = std::env::var(env_var) {
        if !pw.is_empty() {
            return Ok(pw);
        }
    }
    let pw = rpassword::prompt_password(prompt).map_err(|e| anyhow!("password prompt: {e}"))?;
    if pw.is_empty() {
        return Err(anyhow!("password must not be empty"));
    }
    Ok(pw)
}

fn format_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format(DATE_FORMAT).to_string()
}

fn print_report(report: &ReconcileReport) {
    if report.offline {
        println!("Update failed due to poor internet connection, continuing offline");
        return;
    }
    for k in &report.kinds {
        if let Some(err) = &k.error {
            println!("{:<12} failed: {err}", k.kind);
            continue;
        }
        println!(
            "{:<12} +{} adopted, {} replaced, {} pushed ({} failed), {} deferred",
            k.kind, k.stats.adopted, k.stats.replaced, k.pushed, k.push_failed, k.deferred
        );
    }
}

async fn list(service: &RecordService, session: &Session, kind: KindArg) -> Result<()> {
    match kind {
        KindArg::Logins => {
            for r in service.get_records::<LoginSecret>(session).await? {
                println!(
                    "{:<4} {:<24} {:<24} {:<24} {}",
                    r.meta.id,
                    r.description,
                    r.secret_login,
                    r.secret_password,
                    format_time(r.meta.updated_at)
                );
            }
        }
        KindArg::Texts => {
            for r in service.get_records::<TextSecret>(session).await? {
                println!(
                    "{:<4} {:<24} {:<40} {}",
                    r.meta.id,
                    r.description,
                    r.text,
                    format_time(r.meta.updated_at)
                );
            }
        }
        KindArg::Cards => {
            for r in service.get_records::<CardSecret>(session).await? {
                println!(
                    "{:<4} {:<20} {:<20} {:<6} {:<4} {:<16} {}",
                    r.meta.id,
                    r.number,
                    r.holder,
                    r.due_date,
                    r.cvv,
                    r.description,
                    format_time(r.meta.updated_at)
                );
            }
        }
        KindArg::Blobs => {
            for r in service.blob_list(session).await? {
                println!(
                    "{:<4} {:<40} {}",
                    r.meta.id,
                    r.description,
                    format_time(r.meta.updated_at)
                );
            }
        }
    }
    Ok(())
}

async fn watch(service: Arc<RecordService>, session: Session) -> Result<()> {
    let interval = Duration::from_secs(service.config().sync_interval_secs.max(1));
    let (handle, mut engine) = create_sync_engine(service, Arc::new(session), interval);
    let task = tokio::spawn(async move { engine.run().await });
    info!("reconciling every {}s, press Ctrl-C to stop", interval.as_secs());

    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
    handle.stop().await?;
    task.await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let service = Arc::new(RecordService::new(cli.config())?);
    let password = prompt_secret("KEEPER_PASSWORD", "Account password: ")?;

    if let Commands::Register = cli.command {
        service.register(&cli.user, &password).await?;
        println!("Registered {}", cli.user);
        return Ok(());
    }

    let (session, report) = service.login(&cli.user, &password).await?;

    match cli.command {
        Commands::Register => {}
        Commands::Sync { watch: false } => print_report(&report),
        Commands::Sync { watch: true } => {
            print_report(&report);
            return watch(service, session).await;
        }
        Commands::List { kind } => list(&service, &session, kind).await?,
        Commands::AddLogin {
            description,
            secret_login,
            overwrite,
        } => {
            let secret = prompt_secret("KEEPER_SECRET", "Secret password: ")?;
            let rec = LoginSecret::new(&description, &secret_login, &secret);
            service.put_record(&session, rec, overwrite).await?;
            println!("Stored login {description}");
        }
        Commands::AddText {
            description,
            text,
            overwrite,
        } => {
            service
                .put_record(&session, TextSecret::new(&description, &text), overwrite)
                .await?;
            println!("Stored text {description}");
        }
        Commands::AddCard {
            number,
            holder,
            due_date,
            cvv,
            description,
            overwrite,
        } => {
            let card = CardSecret::new(&number, &holder, &due_date, &cvv).with_description(&description);
            service.put_record(&session, card, overwrite).await?;
            println!("Stored card {number}");
        }
        Commands::PutBlob {
            description,
            file,
            overwrite,
        } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let stored: BlobRecord = service
                .put_blob(&session, &description, &bytes, overwrite)
                .await?;
            println!("Uploaded {} ({} bytes)", stored.description, bytes.len());
        }
        Commands::GetBlob { description, out } => {
            let bytes = service.fetch_blob(&session, &description).await?;
            tokio::fs::write(&out, &bytes)
                .await
                .with_context(|| format!("writing {}", out.display()))?;
            println!("Saved {description} to {}", out.display());
        }
    }

    service.logout(session).await;
    Ok(())
}
