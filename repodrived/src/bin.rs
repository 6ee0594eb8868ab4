use std::{net::SocketAddr, process::ExitCode};

use anyhow::Context;
use byte_unit::{Byte, UnitType};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use futures::Future;
use repodrive::{
    listing::ListingPolicy,
    loc,
    path::RepoPath,
    raw_url::{proxy_path, resolve_raw_content_url},
    Config, DirectoryEntry, Error,
};
use repodrived::{
    proxy::{self, Proxy},
    storage::github::GitHub,
    Browser, Drive, FileBlob, Lister, Notice,
};
use tokio::net::TcpListener;

#[cfg(unix)]
mod posix;

#[cfg(unix)]
fn main() -> ExitCode {
    posix::main()
}

#[cfg(not(unix))]
fn main() -> ExitCode {
    env_logger::init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Could not start the runtime: {err}");
            return ExitCode::FAILURE;
        }
    };
    runtime.block_on(async move {
        let shutdown = async {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("received Ctrl-C");
            }
        };
        match run(Cli::parse(), shutdown).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                log::error!("{err:#}");
                eprintln!("Error: {err:#}");
                ExitCode::FAILURE
            }
        }
    })
}

#[derive(Parser)]
#[command(name = "repodrived")]
#[command(author, version, about, long_about=None)]
struct Cli {
    /// Configuration file, defaults to the user configuration
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a directory of the repository
    Ls {
        path: Option<String>,
        /// Include entries that are normally hidden
        #[arg(long)]
        all: bool,
    },
    /// Create a folder
    Mkdir {
        name: String,
        /// Parent directory
        #[arg(long = "in")]
        parent: Option<String>,
        /// Do not wait for the folder to show up in listings
        #[arg(long)]
        no_wait: bool,
    },
    /// Upload a local file
    Upload {
        file: Utf8PathBuf,
        /// Destination directory
        #[arg(long)]
        to: Option<String>,
        /// Media type of the file
        #[arg(long = "type")]
        media_type: Option<String>,
        /// Accept files of any kind
        #[arg(long)]
        allow_all: bool,
        /// Do not wait for the file to show up in listings
        #[arg(long)]
        no_wait: bool,
    },
    /// Delete a file or a folder with its content
    Rm {
        path: String,
        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },
    /// Print the raw content URL of a file page URL
    RawUrl { url: String },
    /// Serve the preview proxy
    Serve {
        /// Address to listen on
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
}

async fn run<F>(cli: Cli, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Ls { path, all } => {
            let config = load_config(config_path).await?;
            let path = RepoPath::new(path.as_deref().unwrap_or_default());
            let drive = open_drive(&config)?;
            let entries = if all {
                Lister::new(drive.storage().clone(), ListingPolicy::show_all())
                    .list(&path)
                    .await?
            } else {
                drive.lister().list(&path).await?
            };
            for entry in entries.iter() {
                println!("{}", entry_line(entry));
            }
        }
        Commands::Mkdir {
            name,
            parent,
            no_wait,
        } => {
            let config = load_config(config_path).await?;
            let parent = RepoPath::new(parent.as_deref().unwrap_or_default());
            let drive = open_drive(&config)?;
            if no_wait {
                let mutation = drive.create_folder(&parent, &name).await?;
                println!("Created {}", mutation.target());
            } else {
                let mut browser =
                    Browser::mount(drive, parent.clone(), &config.browser.route_prefix).await;
                let done = browser.create_folder_in(&parent, &name).await;
                browser.settle().await;
                finish(browser, done)?;
            }
        }
        Commands::Upload {
            file,
            to,
            media_type,
            allow_all,
            no_wait,
        } => {
            let mut config = load_config(config_path).await?;
            config.upload.allow_all_kinds |= allow_all;
            let parent = RepoPath::new(to.as_deref().unwrap_or_default());
            let blob = FileBlob::read(&file, media_type).await?;
            let drive = open_drive(&config)?;
            if no_wait {
                let mutation = drive.upload_file(&parent, blob).await?;
                println!("Uploaded {}", mutation.target());
            } else {
                let mut browser =
                    Browser::mount(drive, parent.clone(), &config.browser.route_prefix).await;
                let done = browser.upload_to(&parent, blob).await;
                browser.settle().await;
                finish(browser, done)?;
            }
        }
        Commands::Rm { path, yes } => {
            let config = load_config(config_path).await?;
            let path = RepoPath::new(&path);
            let drive = open_drive(&config)?;
            let entry = drive.stat(&path).await?;
            if !yes && !confirm_delete(&entry)? {
                println!("Nothing deleted");
                return Ok(());
            }
            match drive.delete_entry(&entry).await {
                Ok(report) => println!("{report}"),
                Err(Error::PartialFailure(report)) => {
                    println!("{report}");
                    anyhow::bail!(
                        "{} file(s) of {} need attention",
                        report.needs_attention().len(),
                        entry.path()
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
        Commands::RawUrl { url } => {
            let raw = resolve_raw_content_url(&url)?;
            println!("{raw}");
            println!("{}", proxy_path(&raw));
        }
        Commands::Serve { bind } => {
            let config = load_config(config_path).await?;
            let bind = bind.unwrap_or(config.proxy.bind);
            let client = reqwest::Client::builder()
                .build()
                .context("Could not create the HTTP client")?;
            let proxy = Proxy::new(client, &config.proxy);
            let listener = TcpListener::bind(bind)
                .await
                .with_context(|| format!("Could not listen on {bind}"))?;
            proxy::serve(listener, proxy, shutdown).await?;
        }
    }
    Ok(())
}

async fn load_config(path: Option<&Utf8Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(path) => path.to_owned(),
        None => {
            let default = loc::config_file()?;
            if !default.exists() {
                log::info!("No config file at {default}, using the environment");
                return Config::from_env();
            }
            default
        }
    };
    log::info!("Found config file: {path}");
    let mut config = Config::load_from_file(&path).await?;
    config.apply_env()?;
    log::trace!("Loaded config: {config:?}");
    Ok(config)
}

fn open_drive(config: &Config) -> anyhow::Result<Drive<GitHub>> {
    let client = reqwest::Client::builder()
        .build()
        .context("Could not create the HTTP client")?;
    let github = GitHub::new(&config.remote, client)?;
    Ok(Drive::from_config(github, config)?)
}

fn entry_line(entry: &DirectoryEntry) -> String {
    match (entry.is_dir(), entry.size()) {
        (true, _) => format!("d {:>12}  {}/", "", entry.name()),
        (false, size) => {
            let size = Byte::from_u64(size.unwrap_or(0)).get_appropriate_unit(UnitType::Binary);
            let kind = entry
                .file_kind()
                .map(|k| k.label())
                .unwrap_or_default();
            format!("- {:>12}  {}  ({kind})", format!("{size:.1}"), entry.name())
        }
    }
}

fn confirm_delete(entry: &DirectoryEntry) -> anyhow::Result<bool> {
    let what = if entry.is_dir() {
        "folder and everything in it"
    } else {
        "file"
    };
    let answer = inquire::Confirm::new(&format!("Delete {what} {}?", entry.path()))
        .with_default(false)
        .prompt()?;
    Ok(answer)
}

fn print_notice(notice: &Notice) {
    match notice.level {
        repodrived::NoticeLevel::Error => eprintln!("{notice}"),
        _ => println!("{notice}"),
    }
}

/// Prints the outcome of a browser operation and the resulting listing.
fn finish(mut browser: Browser<GitHub>, done: bool) -> anyhow::Result<()> {
    for notice in browser.take_notices() {
        print_notice(&notice);
    }
    println!("{}", browser.location());
    for entry in browser.entries() {
        println!("{}", entry_line(entry));
    }
    browser.unmount();
    if !done {
        anyhow::bail!("operation failed");
    }
    Ok(())
}
