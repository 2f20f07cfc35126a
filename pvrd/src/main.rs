// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::{Context, Result};
use bgp::config::{NeighborConfig, RouterConfig};
use bgp::connection_udp::UdpTransport;
use bgp::router::Router;
use bgp::IO_TIMEOUT;
use clap::Parser;
use crate::log::dlog;
use pvr_common::log::{build_logger, init_logger, init_term_logger};
use slog::Logger;
use std::fs::File;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::sync::Arc;

mod log;

const COMPONENT_PVRD: &str = "pvrd";
const UNIT_DAEMON: &str = "daemon";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None, styles = get_styles())]
pub struct Cli {
    /// Autonomous system number of this router.
    asn: u32,

    /// Neighbor links as <port>-<address>-<relationship>, where the
    /// relationship is one of cust, peer or prov.
    #[arg(required = true)]
    connections: Vec<NeighborConfig>,

    /// Host the neighbor ports live on.
    #[arg(long, default_value = "127.0.0.1")]
    remote_host: IpAddr,

    /// Local address to bind neighbor sockets to.
    #[arg(long, default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Write bunyan formatted logs to this file instead of stdout.
    #[arg(long)]
    log_file: Option<String>,

    /// Human readable logs on the terminal, filtered through RUST_LOG.
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log = match (&cli.log_file, cli.pretty) {
        (Some(path), _) => build_logger(
            File::create(path).with_context(|| format!("create {path}"))?,
        ),
        (None, true) => init_term_logger(),
        (None, false) => init_logger(),
    };

    run(cli, log)
}

fn run(cli: Cli, log: Logger) -> Result<()> {
    let config = RouterConfig::new(cli.asn, cli.connections)?;
    let transport =
        UdpTransport::bind(cli.bind, cli.remote_host, &config.neighbors, log.clone())
            .context("open neighbor links")?;

    let shutdown = Arc::new(AtomicBool::new(false));
    termination_handler(shutdown.clone())?;

    let (tx, rx) = channel();
    let readers = transport.ingress(tx, shutdown.clone())?;

    dlog!(log, info, "starting router for AS {}", config.asn;
        "neighbors" => config.neighbors.len()
    );
    let mut router = Router::new(config, transport, log.clone());
    router.start();

    // All routing state is owned by this thread. Ingress threads only
    // decode and queue.
    while !shutdown.load(Ordering::Relaxed) {
        match rx.recv_timeout(IO_TIMEOUT) {
            Ok((neighbor, msg)) => router.deliver(neighbor, msg),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                dlog!(log, warn, "all neighbor links closed");
                break;
            }
        }
    }

    shutdown.store(true, Ordering::Relaxed);
    for r in readers {
        if r.join().is_err() {
            dlog!(log, error, "ingress thread panicked");
        }
    }
    dlog!(log, info, "router shut down";
        "routes" => router.table().len()
    );

    Ok(())
}

fn termination_handler(shutdown: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        shutdown.store(true, Ordering::Relaxed);
    })
    .context("set termination handler")
}

/// Oxide themed CLI ;)
pub fn get_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .header(anstyle::Style::new().bold().underline().fg_color(Some(
            anstyle::Color::Rgb(anstyle::RgbColor(245, 207, 101)),
        )))
        .literal(anstyle::Style::new().bold().fg_color(Some(
            anstyle::Color::Rgb(anstyle::RgbColor(72, 213, 151)),
        )))
        .invalid(anstyle::Style::new().bold().fg_color(Some(
            anstyle::Color::Rgb(anstyle::RgbColor(72, 213, 151)),
        )))
        .valid(anstyle::Style::new().bold().fg_color(Some(
            anstyle::Color::Rgb(anstyle::RgbColor(72, 213, 151)),
        )))
        .usage(anstyle::Style::new().bold().fg_color(Some(
            anstyle::Color::Rgb(anstyle::RgbColor(245, 207, 101)),
        )))
        .error(anstyle::Style::new().bold().fg_color(Some(
            anstyle::Color::Rgb(anstyle::RgbColor(232, 104, 134)),
        )))
}
