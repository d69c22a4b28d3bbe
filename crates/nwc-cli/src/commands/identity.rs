//! Provider identity and pairing.

use colored::Colorize;
use nwc_authz::{NwcApi, RegistrationRequest};
use nwc_crypto::{IdentityProvider, RequestOrigin, build_pairing_credential};

use crate::commands::print_json;
use crate::theme::Theme;

/// Generate a client identity and print both halves.
///
/// Nothing is stored; the operator hands the secret to the client.
pub(crate) async fn generate_client_identity(json: bool) -> anyhow::Result<()> {
    let client = IdentityProvider::new().generate_identity().await?;
    let pubkey = client.public_key();
    if json {
        return print_json(&serde_json::json!({
            "pubkey": pubkey.to_hex(),
            "secret": client.secret_hex().as_str(),
        }));
    }

    println!("\n{}", Theme::header("Client Identity"));
    println!("{}", Theme::kv("Public key", &pubkey.to_hex()));
    println!("{}", Theme::kv("Secret", &client.secret_hex()));
    println!(
        "{}",
        Theme::warning("The secret is not stored anywhere. Keep it with the client.")
    );
    println!();
    Ok(())
}

/// Show the provider identity and relay settings.
pub(crate) async fn show_provider(api: &NwcApi) -> anyhow::Result<()> {
    let provider = api.settings().provider().await?;
    let pubkey = provider.provider_pubkey()?;

    println!("\n{}", Theme::header("Provider Identity"));
    println!("{}", Theme::kv("Key ID", &pubkey.key_id_hex()));
    println!("{}", Theme::kv("Public key", &pubkey.to_hex()));
    println!("{}", Theme::kv("Relay", &provider.relay));
    if !provider.relay_alias.is_empty() {
        println!("{}", Theme::kv("Relay alias", &provider.relay_alias));
    }
    println!();
    Ok(())
}

/// Print the pairing template, optionally with a secret substituted.
///
/// The substitution happens here, in the process that holds the secret.
pub(crate) async fn show_pairing(
    api: &NwcApi,
    origin: Option<&RequestOrigin>,
    secret: Option<&str>,
) -> anyhow::Result<()> {
    let template = api.pairing_template(origin).await?;
    match secret {
        Some(secret) => println!("{}", build_pairing_credential(template.as_str(), secret)?),
        None => println!("{template}"),
    }
    Ok(())
}

/// Generate a client key, register it and print the finished credential.
///
/// The client secret only exists in this process; the registry sees the
/// public key.
pub(crate) async fn pair_new_client(
    api: &NwcApi,
    request: RegistrationRequest,
    origin: Option<&RequestOrigin>,
    json: bool,
) -> anyhow::Result<()> {
    let client = IdentityProvider::new().generate_identity().await?;
    let pubkey = client.public_key().to_hex();

    let template = api.pairing_template(origin).await?;
    let conn = api.register(&pubkey, request).await?;
    let credential = build_pairing_credential(template.as_str(), &client.secret_hex())?;

    if json {
        return print_json(&serde_json::json!({
            "connection": conn,
            "pairing_url": credential,
        }));
    }

    println!("{}", Theme::success("Client paired."));
    println!("{}", Theme::kv("Pubkey", &conn.data.pubkey));
    println!(
        "{}",
        Theme::warning("The pairing URL below contains the client secret. It is shown once.")
    );
    println!("\n{}\n", credential.bold());
    Ok(())
}
