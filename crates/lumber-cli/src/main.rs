use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use lumber_core::{Config, ContainerDescriptor, WatchRegistry};
use lumber_docker::{ContainerMeta, DockerClient, follow_container};
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "lumber")]
#[command(
    author,
    version,
    about = "Follow the logs of every container in your compose project"
)]
struct Cli {
    /// Follow logs of any container, not just of the current docker compose project
    #[arg(long)]
    all: bool,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::new(filter))
        .init();
}

/// Whether `other` is the same directory as `base` or inside it.
fn is_same_or_child_path(base: &str, other: &str) -> bool {
    other == base || other.strip_prefix(base).is_some_and(|rest| rest.starts_with('/'))
}

/// Probe whether `dir` is a docker compose project directory.
async fn is_compose_dir(dir: &Path) -> bool {
    tokio::process::Command::new("docker")
        .args(["compose", "config", "--quiet"])
        .current_dir(dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .is_ok_and(|status| status.success())
}

async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => tokio::select! {
            _ = tokio::signal::ctrl_c() => "SIGINT",
            _ = term.recv() => "SIGTERM",
        },
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
            "SIGINT"
        }
    }
}

/// Consume newly identified containers: register them, announce them,
/// and spawn one watch task each.
fn spawn_follow_loop(
    client: DockerClient,
    registry: Arc<WatchRegistry>,
    mut meta_rx: mpsc::Receiver<ContainerMeta>,
    done_tx: mpsc::Sender<()>,
    only_compose: bool,
    base_dir: String,
) {
    tokio::spawn(async move {
        while let Some(meta) = meta_rx.recv().await {
            if only_compose
                && (meta.working_dir.is_empty()
                    || !is_same_or_child_path(&base_dir, &meta.working_dir))
            {
                continue;
            }
            // the initial listing can race a start event for the same id
            if registry.contains(&meta.id).await {
                continue;
            }

            let descriptor = ContainerDescriptor::new(
                meta.id,
                meta.name,
                meta.compose_project,
                meta.compose_service,
                meta.instance_number,
            );
            let added = registry.add(descriptor).await;
            println!(
                "{}",
                format!("Following container {}...", added.log_prefix).bold()
            );

            let client = client.clone();
            let registry = Arc::clone(&registry);
            let done = done_tx.clone();
            tokio::spawn(async move {
                if let Err(err) = follow_container(&client, &registry, &added.id).await {
                    eprintln!("failed to follow container {}: {err}", added.id);
                    let _ = done.send(()).await;
                }
            });
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = Config::load()?;
    if let Some(force) = config.force_color {
        colored::control::set_override(force);
    }

    let base_dir = std::env::current_dir()?.to_string_lossy().into_owned();

    let only_compose = !cli.all;
    if only_compose {
        if !is_compose_dir(Path::new(&base_dir)).await {
            tracing::warn!("current directory does not look like a docker compose project");
        }
        println!(
            "{}",
            "Only following containers of current docker-compose project...".bold()
        );
    }

    let client = match config.docker_socket.as_deref() {
        Some(path) => DockerClient::with_socket(path)?,
        None => DockerClient::new()?,
    };

    // abort right away when the docker server is not available
    if client.ping().await.is_err() {
        eprintln!("Unable to ping docker server, aborting...");
        std::process::exit(1);
    }

    let registry = Arc::new(WatchRegistry::new());
    let (meta_tx, meta_rx) = mpsc::channel::<ContainerMeta>(16);
    let (done_tx, mut done_rx) = mpsc::channel::<()>(1);

    {
        let done = done_tx.clone();
        tokio::spawn(async move {
            let sig = wait_for_signal().await;
            println!("Received {sig} signal");
            let _ = done.send(()).await;
        });
    }

    // check the docker server is still alive, abort when the ping fails
    {
        let client = client.clone();
        let done = done_tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(3));
            interval.tick().await;
            loop {
                interval.tick().await;
                if client.ping().await.is_err() {
                    eprintln!("Unable to ping docker server, aborting...");
                    let _ = done.send(()).await;
                    break;
                }
            }
        });
    }

    client.watch_start_events(meta_tx.clone());
    spawn_follow_loop(
        client.clone(),
        Arc::clone(&registry),
        meta_rx,
        done_tx.clone(),
        only_compose,
        base_dir,
    );

    // pick up the containers that are already running
    for meta in client.running_containers().await? {
        if meta_tx.send(meta).await.is_err() {
            break;
        }
    }

    done_rx.recv().await;
    println!("exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_path_matches() {
        assert!(is_same_or_child_path("/home/me/app", "/home/me/app"));
    }

    #[test]
    fn test_child_path_matches() {
        assert!(is_same_or_child_path("/home/me/app", "/home/me/app/sub"));
    }

    #[test]
    fn test_sibling_prefix_does_not_match() {
        assert!(!is_same_or_child_path("/home/me/app", "/home/me/app2"));
        assert!(!is_same_or_child_path("/home/me/app", "/home/me"));
    }
}
