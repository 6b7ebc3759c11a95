//! Per-container watch loop: raw stream in, colorized lines out.

use colored::Colorize;
use lumber_core::{Result, WatchRegistry};

use crate::client::DockerClient;
use crate::filter::LogFilter;
use crate::lines::LineReader;

/// Follow one container's logs until its stream ends.
///
/// Opens the raw log stream (failure here propagates, since it means
/// the daemon connection is broken rather than a per-container hiccup),
/// strips the frame headers, and prints every line with the
/// container's current colorized prefix. On termination the container
/// is removed from the registry, which realigns the prefixes of the
/// remaining ones.
pub async fn follow_container(
    client: &DockerClient,
    registry: &WatchRegistry,
    container_id: &str,
) -> Result<()> {
    let raw = client.raw_log_stream(container_id).await?;
    tracing::debug!("attached to logs of {}", container_id);
    let mut lines = LineReader::new(LogFilter::new(raw));

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => print_line(registry, container_id, &line).await?,
            Ok(None) => break,
            Err(err) => {
                let prefix = registry
                    .log_prefix(container_id)
                    .await
                    .unwrap_or_else(|| container_id.to_string());
                println!("Error while reading output: {prefix}: {err}");
                break;
            }
        }
    }

    if let Some(removed) = registry.remove(container_id).await {
        println!(
            "{}",
            format!("Stopped following container {}", removed.log_prefix).bold()
        );
    }
    if registry.is_empty().await {
        println!("{}", "No more containers to follow".bold());
    }

    Ok(())
}

/// Print one log line with the container's current prefix.
///
/// The prefix and column width are read back from the registry for
/// every line; containers joining or leaving changes the alignment of
/// lines already streaming. The full line is formatted up front so a
/// single write hits stdout.
async fn print_line(registry: &WatchRegistry, container_id: &str, line: &str) -> Result<()> {
    // An unknown color here means the allocator invariants broke;
    // surfaced as an error rather than printing uncolored.
    let prefix = registry.styled_prefix(container_id).await?;
    let rendered = format!("{} {}", prefix.text.color(prefix.color), line);
    println!("{rendered}");
    Ok(())
}
