//! RSA key material for signing access tokens and publishing them as a JWKS.

use std::fs;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::AuthError;

/// Modulus size used for freshly generated key pairs.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// A single RSA public key in JWK form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Jwk {
    /// Key type, always `RSA`
    pub kty: String,
    /// Modulus, base64url without padding
    pub n: String,
    /// Public exponent, base64url without padding
    pub e: String,
    /// RFC 7638 thumbprint of the key
    pub kid: String,
    /// Signing algorithm, always `RS256`
    pub alg: String,
    /// Intended key use, always `sig`
    #[serde(rename = "use")]
    pub key_use: String,
}

/// JSON Web Key Set document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwks {
    /// Published keys
    pub keys: Vec<Jwk>,
}

/// A PEM encoded key pair as written to disk
#[derive(Debug, Clone)]
pub struct PemKeyPair {
    /// PKCS#8 private key (`BEGIN PRIVATE KEY`)
    pub private_pem: String,
    /// SPKI public key (`BEGIN PUBLIC KEY`)
    pub public_pem: String,
}

impl PemKeyPair {
    /// Generates a fresh RSA key pair with public exponent 65537.
    pub fn generate(bits: usize) -> Result<Self, AuthError> {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| AuthError::KeyMaterial(format!("Failed to generate RSA key: {}", e)))?;
        let public_key = private_key.to_public_key();

        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| AuthError::KeyMaterial(format!("Failed to encode private key: {}", e)))?
            .as_str()
            .to_owned();
        let public_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| AuthError::KeyMaterial(format!("Failed to encode public key: {}", e)))?;

        Ok(Self {
            private_pem,
            public_pem,
        })
    }
}

/// Signing and verification keys plus their JWK projection.
///
/// Loaded once at startup and shared by every request.
#[derive(Clone)]
pub struct JwtKeyMaterial {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    public_jwk: Jwk,
}

impl JwtKeyMaterial {
    /// Builds key material from PKCS#8 private and SPKI public PEM documents.
    pub fn from_pem(private_pem: &str, public_pem: &str) -> Result<Self, AuthError> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(private_pem)
            .map_err(|e| AuthError::KeyMaterial(format!("Invalid private key: {}", e)))?;
        let public_key = RsaPublicKey::from_public_key_pem(public_pem)
            .map_err(|e| AuthError::KeyMaterial(format!("Invalid public key: {}", e)))?;

        if private_key.to_public_key() != public_key {
            return Err(AuthError::KeyMaterial(
                "Public key does not belong to the private key".to_string(),
            ));
        }

        let n = URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
        let e = URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());
        let kid = jwk_thumbprint(&n, &e);

        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())?;
        let decoding_key = DecodingKey::from_rsa_components(&n, &e)?;

        Ok(Self {
            encoding_key,
            decoding_key,
            public_jwk: Jwk {
                kty: "RSA".to_string(),
                n,
                e,
                kid,
                alg: "RS256".to_string(),
                key_use: "sig".to_string(),
            },
        })
    }

    /// Reads the key pair from PEM files on disk.
    pub fn from_pem_files(
        private_path: impl AsRef<Path>,
        public_path: impl AsRef<Path>,
    ) -> Result<Self, AuthError> {
        let read = |path: &Path| {
            fs::read_to_string(path).map_err(|e| {
                AuthError::KeyMaterial(format!("Failed to read {}: {}", path.display(), e))
            })
        };

        let private_pem = read(private_path.as_ref())?;
        let public_pem = read(public_path.as_ref())?;

        Self::from_pem(&private_pem, &public_pem)
    }

    /// Key id placed in token headers.
    pub fn kid(&self) -> &str {
        &self.public_jwk.kid
    }

    /// Public key as a JWK, including `kid`, `alg` and `use`.
    pub fn public_jwk(&self) -> &Jwk {
        &self.public_jwk
    }

    /// JWKS document listing the public key.
    pub fn jwks(&self) -> Jwks {
        Jwks {
            keys: vec![self.public_jwk.clone()],
        }
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

/// RFC 7638 thumbprint of an RSA public key given its base64url `n` and `e`.
///
/// The members are hashed in lexicographic order with no whitespace.
pub fn jwk_thumbprint(n: &str, e: &str) -> String {
    let canonical = format!(r#"{{"e":"{}","kty":"RSA","n":"{}"}}"#, e, n);
    URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes()))
}
