//! Startup checks and the operator-facing startup banner.

use std::{io, net::TcpListener};

use anyhow::bail;

use crate::config::Config;

/// Fail early with a readable message when the port is taken.
pub fn ensure_port_available(config: &Config) -> anyhow::Result<()> {
    match TcpListener::bind(config.bind_addr()) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AddrInUse => bail!(
            "Port {} is already in use. Stop the other server or set SERVER_PORT to a free port",
            config.server_port
        ),
        Err(e) => Err(e.into()),
    }
}

/// URLs an operator opens: the kiosk on this machine and from the LAN.
pub fn kiosk_urls(scheme: &str, lan_ip: &str, port: u16) -> Vec<String> {
    let mut urls = vec![format!("{scheme}://localhost:{port}/attendance")];
    if lan_ip != "localhost" {
        urls.push(format!("{scheme}://{lan_ip}:{port}/attendance"));
    }
    urls
}

pub fn log_startup(config: &Config, https: bool, lan_ip: &str) {
    let scheme = if https { "https" } else { "http" };
    tracing::info!("Server listening on {}", config.bind_addr());
    for url in kiosk_urls(scheme, lan_ip, config.server_port) {
        tracing::info!("Attendance kiosk: {}", url);
    }
    if https {
        tracing::info!("Browsers will warn about the self-signed certificate; accept it once per device");
    } else {
        tracing::warn!(
            "Serving plain HTTP: cameras only work on localhost. Run `gen-cert` to enable HTTPS"
        );
    }
}
