//! Authorize command: run one request through the choke point.

use nwc_authz::{AuthorizationError, NwcApi};
use nwc_budget::Decision;
use nwc_core::Msats;
use nwc_crypto::PublicKey;
use nwc_telemetry::{RequestContext, RequestGuard};
use serde::Serialize;

use crate::commands::print_json;
use crate::theme::Theme;

#[derive(Serialize)]
struct AuthorizeOutput<'a> {
    pubkey: &'a str,
    capability: &'a str,
    amount_msats: Msats,
    #[serde(flatten)]
    decision: Decision,
}

/// Authorize `capability` for `pubkey`, charging `amount_msats`.
///
/// Denials fail the command so scripts can branch on the exit status.
pub(crate) async fn authorize(
    api: &NwcApi,
    pubkey: &str,
    capability: &str,
    amount_msats: Msats,
    json: bool,
) -> anyhow::Result<()> {
    let guard = RequestGuard::new(
        RequestContext::new("nwcctl")
            .with_connection(pubkey)
            .with_operation(capability)
            .with_metadata("amount_msats", amount_msats.to_string()),
    );
    let key = PublicKey::from_hex(pubkey)?;
    let result = api
        .service()
        .authorize(&key, capability, amount_msats)
        .await;

    let decision = match result {
        Ok(decision) => decision,
        Err(e) => {
            tracing::debug!(
                request = %guard.context().short_id(),
                code = e.nip47_code(),
                "rejected"
            );
            return Err(report_rejection(e));
        },
    };

    if json {
        print_json(&AuthorizeOutput {
            pubkey,
            capability,
            amount_msats,
            decision,
        })?;
    } else if decision.is_allowed() {
        println!(
            "{}",
            Theme::success(&format!("{capability} for {amount_msats} msats allowed"))
        );
    } else {
        println!("{}", Theme::error(&decision.to_string()));
    }

    if decision.is_allowed() {
        Ok(())
    } else {
        anyhow::bail!("{decision}")
    }
}

fn report_rejection(e: AuthorizationError) -> anyhow::Error {
    if e.is_denial() {
        eprintln!("{}", Theme::error(&format!("{} ({})", e, e.nip47_code())));
    }
    e.into()
}
