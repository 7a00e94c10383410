// Tokens de session / vérification + signature du cookie de session

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Token de session: 32 bytes aléatoires en base64 URL-safe
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Token de vérification d'email: 24 bytes aléatoires en hexadécimal
pub fn generate_verification_token() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn mac(secret: &str) -> HmacSha256 {
    // HMAC accepte une clé de n'importe quelle longueur
    <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length")
}

/// Valeur du cookie: `<token>.<signature>`
pub fn sign_token(token: &str, secret: &str) -> String {
    let mut mac = mac(secret);
    mac.update(token.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    format!("{}.{}", token, signature)
}

/// Vérifie la signature d'un cookie et renvoie le token brut
pub fn verify_signed_token(value: &str, secret: &str) -> Option<String> {
    let (token, signature) = value.rsplit_once('.')?;
    let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

    let mut mac = mac(secret);
    mac.update(token.as_bytes());
    mac.verify_slice(&signature).ok()?;

    Some(token.to_string())
}
