use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use reqwest::Method;
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use xbar::crossbar::{Client, Content, Revalidate};
use xbar::Config;

/// Command-line client for the Kazoo Crossbar API
#[derive(Parser, Debug)]
#[command(name = "xbar", version, about, long_about = None)]
struct Args {
    /// Crossbar host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Crossbar port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Switch to the account registered for this realm
    #[arg(short, long)]
    realm: Option<String>,

    /// List the realms reachable from the authenticated account
    #[arg(short, long)]
    list: bool,

    /// Object path below the current account, e.g. `users` or `devices/status`
    #[arg(short, long)]
    object: Option<String>,

    /// HTTP method for --object
    #[arg(short = 't', long = "type", default_value = "GET")]
    method: String,

    /// JSON request body for --object
    #[arg(short, long)]
    data: Option<String>,

    /// Write the --object body to stdout undecoded (media, recordings)
    #[arg(long, requires = "object")]
    raw: bool,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("xbar started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("xbar").join("xbar.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".xbar").join("xbar.log");
    }
    PathBuf::from("xbar.log")
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let mut config = Config::load();
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let who = format!(
        "{}@{}:{}",
        config.username.as_deref().unwrap_or("token"),
        config.host,
        config.port
    );

    let mut client = Client::new(config.http()?, config.credential()?, Some(Box::new(Revalidate))).await;

    if !client.is_authenticated() {
        bail!("Connection failure {}", who);
    }
    if !args.raw {
        println!("Connected {}\n", who);
    }

    if args.realm.is_some() || args.list {
        let envelope = client.get_accounts(None).await?;
        let Some(Value::Object(realms)) = envelope.data().cloned() else {
            print_json(&envelope)?;
            bail!("could not list realms");
        };

        if let Some(realm) = &args.realm {
            let Some(account_id) = realms.get(realm).and_then(|v| v.as_str()) else {
                bail!("unknown realm {}", realm);
            };
            client.use_account(account_id);
        }

        if args.list {
            for realm in realms.keys() {
                println!(" * {}", realm);
            }
        }
    }

    if let Some(object) = &args.object {
        let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
            .with_context(|| format!("invalid method {}", args.method))?;
        let body: Option<Value> = args
            .data
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .context("--data is not valid JSON")?;
        let account_id = client
            .use_account_id()
            .context("no current account")?
            .to_string();

        let path = format!("accounts/{}/{}", account_id, object.trim_start_matches('/'));
        if args.raw {
            if method != Method::GET {
                bail!("--raw only downloads; use --type GET");
            }
            match client.send_raw(&path).await? {
                Content::Raw(raw) => std::io::stdout().write_all(&raw.bytes)?,
                Content::Failure(envelope) => print_json(&envelope)?,
            }
        } else {
            let envelope = client.send(method, &path, body.as_ref()).await?;
            print_json(&envelope)?;
        }
    }

    Ok(())
}
