//! Reading and writing Ed25519 key files.
//!
//! `<prefix>.secret` holds the base64 seed (0o600 on Unix),
//! `<prefix>.pub` the base64 verifying key.

use std::path::Path;

use convene_links::{decode_signing_key, generate_keypair, Keypair};
use ed25519_dalek::SigningKey;

/// Generate a keypair and write both files.
pub fn write_keypair(output_prefix: &str) -> Result<Keypair, String> {
    let keypair = generate_keypair();

    let secret_path = format!("{output_prefix}.secret");
    std::fs::write(&secret_path, &keypair.secret_b64)
        .map_err(|e| format!("error writing secret key to '{secret_path}': {e}"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        if let Err(e) = std::fs::set_permissions(&secret_path, perms) {
            eprintln!("warning: failed to set permissions on '{secret_path}': {e}");
        }
    }

    let pub_path = format!("{output_prefix}.pub");
    std::fs::write(&pub_path, &keypair.public_b64)
        .map_err(|e| format!("error writing public key to '{pub_path}': {e}"))?;

    Ok(keypair)
}

/// Read a `.secret` file back into a signing key.
pub fn read_secret_key(path: &Path) -> Result<SigningKey, String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("error reading secret key '{}': {}", path.display(), e))?;
    decode_signing_key(&contents)
        .map_err(|_| format!("'{}' is not a base64 Ed25519 seed", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("linkkey");
        let prefix = prefix.to_str().unwrap();

        let keypair = write_keypair(prefix).unwrap();
        let loaded = read_secret_key(Path::new(&format!("{prefix}.secret"))).unwrap();
        assert_eq!(
            convene_links::decode_verifying_key(&keypair.public_b64).unwrap(),
            loaded.verifying_key()
        );
    }
}
