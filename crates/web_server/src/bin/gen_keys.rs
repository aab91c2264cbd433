//! Writes a fresh RSA key pair for signing access tokens.
//!
//! Usage: `gen-keys [DIR] [--force]`. `DIR` defaults to `certs`.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, bail};
use auth_services::keys::{DEFAULT_KEY_BITS, JwtKeyMaterial, PemKeyPair};

const PRIVATE_KEY_FILE: &str = "jwt-private.pkcs8.pem";
const PUBLIC_KEY_FILE: &str = "jwt-public.spki.pem";

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let mut force = false;
    let mut dir = PathBuf::from("certs");
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--force" | "-f" => force = true,
            other if other.starts_with('-') => bail!("unknown option {}", other),
            other => dir = PathBuf::from(other),
        }
    }

    let private_path = dir.join(PRIVATE_KEY_FILE);
    let public_path = dir.join(PUBLIC_KEY_FILE);

    if !force && (private_path.exists() || public_path.exists()) {
        bail!(
            "{} already holds a key pair, pass --force to replace it",
            dir.display()
        );
    }

    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    log::info!("Generating {}-bit RSA key pair", DEFAULT_KEY_BITS);
    let pair = PemKeyPair::generate(DEFAULT_KEY_BITS)?;
    let keys = JwtKeyMaterial::from_pem(&pair.private_pem, &pair.public_pem)?;

    fs::write(&private_path, &pair.private_pem)
        .with_context(|| format!("Failed to write {}", private_path.display()))?;
    restrict_permissions(&private_path)?;
    fs::write(&public_path, &pair.public_pem)
        .with_context(|| format!("Failed to write {}", public_path.display()))?;

    log::info!("Wrote {}", private_path.display());
    log::info!("Wrote {}", public_path.display());
    log::info!("kid: {}", keys.kid());

    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &std::path::Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("Failed to restrict {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &std::path::Path) -> anyhow::Result<()> {
    Ok(())
}
