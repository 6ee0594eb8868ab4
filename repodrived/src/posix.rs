use std::process::ExitCode;

use clap::Parser;
use systemd_journal_logger::{connected_to_journal, JournalLog};

pub fn main() -> ExitCode {
    init_logger();

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
        match crate::run(crate::Cli::parse(), shutdown_signal()).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                log::error!("{err:#}");
                eprintln!("Error: {err:#}");
                ExitCode::FAILURE
            }
        }
    })
}

fn init_logger() {
    if connected_to_journal() {
        let installed = JournalLog::new().and_then(|journal| {
            journal
                .add_extra_field("VERSION", env!("CARGO_PKG_VERSION"))
                .install()
                .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))
        });
        match installed {
            Ok(()) => {
                log::set_max_level(log::LevelFilter::Info);
                return;
            }
            Err(err) => eprintln!("Could not log to the journal: {err}"),
        }
    }
    env_logger::init();
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sig_term, mut sig_int) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(term), Ok(int)) => (term, int),
            (Err(err), _) | (_, Err(err)) => {
                log::error!("Could not install signal handlers: {err}");
                return std::future::pending().await;
            }
        };

    tokio::select! {
        _ = sig_term.recv() => {
            log::warn!("received SIGTERM");
        }
        _ = sig_int.recv() => {
            log::warn!("received SIGINT");
        }
    };
}
