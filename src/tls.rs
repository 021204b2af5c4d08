//! HTTPS deployment helpers.
//!
//! Browsers only grant camera access to secure origins, so the kiosk must be
//! served over HTTPS when opened from another device on the LAN. These helpers
//! find the machine's LAN address and mint a self-signed certificate for it.

use std::{
    fs,
    net::UdpSocket,
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};

use crate::config::Config;

/// Local IP address used for outbound traffic, or `localhost`.
///
/// No packet is sent: connecting a UDP socket only selects a route.
pub fn detect_lan_ip() -> String {
    let addr = UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("8.8.8.8:80")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip());

    match addr {
        Ok(ip) if !ip.is_unspecified() => ip.to_string(),
        Ok(_) => "localhost".to_string(),
        Err(e) => {
            tracing::debug!("Could not detect LAN address: {}", e);
            "localhost".to_string()
        }
    }
}

pub fn tls_files_present(config: &Config) -> bool {
    Path::new(&config.tls_cert_path).is_file() && Path::new(&config.tls_key_path).is_file()
}

/// Write a self-signed certificate and private key as PEM files.
///
/// The certificate covers `host`, `localhost` and `127.0.0.1`. Existing files
/// are only replaced when `force` is set.
pub fn generate_self_signed(
    host: &str,
    cert_path: &Path,
    key_path: &Path,
    force: bool,
) -> anyhow::Result<(PathBuf, PathBuf)> {
    if !force && (cert_path.exists() || key_path.exists()) {
        bail!(
            "Certificate files already exist ({}, {}). Use --force to overwrite",
            cert_path.display(),
            key_path.display()
        );
    }

    let mut names = vec![host.to_string()];
    for extra in ["localhost", "127.0.0.1"] {
        if !names.iter().any(|n| n == extra) {
            names.push(extra.to_string());
        }
    }

    let certified = rcgen::generate_simple_self_signed(names.clone())
        .context("failed to generate self-signed certificate")?;

    for path in [cert_path, key_path] {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    fs::write(cert_path, certified.cert.pem())
        .with_context(|| format!("failed to write {}", cert_path.display()))?;
    fs::write(key_path, certified.key_pair.serialize_pem())
        .with_context(|| format!("failed to write {}", key_path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(key_path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("failed to restrict {}", key_path.display()))?;
    }

    tracing::info!("Self-signed certificate generated for {}", names.join(", "));
    Ok((cert_path.to_path_buf(), key_path.to_path_buf()))
}
