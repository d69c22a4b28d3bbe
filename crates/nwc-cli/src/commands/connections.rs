//! Connection commands: list, show, create, delete, budget windows.

use anyhow::{Context, bail};
use colored::Colorize;
use nwc_authz::{ConnectionResponse, NwcApi, RegistrationRequest};
use nwc_budget::{REFRESH_DAY, REFRESH_MONTH, REFRESH_WEEK, REFRESH_YEAR};
use nwc_crypto::PublicKey;
use nwc_registry::BudgetSpec;

use crate::commands::print_json;
use crate::theme::Theme;

/// Parse a refresh window: seconds, or `lifetime`/`daily`/`weekly`/`monthly`/`yearly`.
pub(crate) fn parse_window(raw: &str) -> anyhow::Result<i64> {
    let secs = match raw {
        "lifetime" | "never" => 0,
        "daily" | "day" => REFRESH_DAY,
        "weekly" | "week" => REFRESH_WEEK,
        "monthly" | "month" => REFRESH_MONTH,
        "yearly" | "year" => REFRESH_YEAR,
        other => {
            return other
                .parse::<i64>()
                .with_context(|| format!("invalid refresh window '{other}'"));
        },
    };
    i64::try_from(secs).context("refresh window out of range")
}

/// Parse a `--budget MSATS:WINDOW` argument.
pub(crate) fn parse_budget(raw: &str) -> anyhow::Result<BudgetSpec> {
    let (cap, window) = raw.split_once(':').unwrap_or((raw, "lifetime"));
    let cap: i64 = cap
        .trim()
        .parse()
        .with_context(|| format!("invalid budget amount in '{raw}'"))?;
    Ok(BudgetSpec::new(cap, parse_window(window.trim())?))
}

/// List the permission catalog.
pub(crate) fn list_permissions(api: &NwcApi, json: bool) -> anyhow::Result<()> {
    let permissions = api.permissions();
    if json {
        return print_json(&permissions);
    }

    println!("\n{}", Theme::header("Permissions"));
    println!("{:<20} {:<28} {}", "KEY".dimmed(), "NAME".dimmed(), "DEFAULT".dimmed());
    println!("{}", Theme::separator());
    for p in permissions {
        let default = if p.default { "yes".green().to_string() } else { String::new() };
        println!("{:<20} {:<28} {default}", p.key, p.name);
    }
    println!();
    Ok(())
}

/// List connections.
pub(crate) async fn list_connections(
    api: &NwcApi,
    include_expired: bool,
    calculate_spent: bool,
    json: bool,
) -> anyhow::Result<()> {
    let connections = api
        .list_connections(include_expired, calculate_spent)
        .await?;
    if json {
        return print_json(&connections);
    }

    if connections.is_empty() {
        println!("{}", Theme::info("No connections"));
        return Ok(());
    }

    println!("\n{}", Theme::header("Connections"));
    println!(
        "{:<16} {:<8} {:<16} {:>7} {}",
        "PUBKEY".dimmed(),
        "STATUS".dimmed(),
        "EXPIRES".dimmed(),
        "BUDGETS".dimmed(),
        "DESCRIPTION".dimmed()
    );
    println!("{}", Theme::separator());
    for conn in &connections {
        println!(
            "{} {:<8} {:<16} {:>7} {}",
            Theme::pubkey(&conn.data.pubkey),
            Theme::status(conn.data.status),
            Theme::timestamp(conn.data.expires_at),
            conn.budgets.len(),
            conn.data.description
        );
    }
    println!();
    Ok(())
}

/// Show one connection with its budgets.
pub(crate) async fn show_connection(api: &NwcApi, pubkey: &str, json: bool) -> anyhow::Result<()> {
    let conn = api.get_connection(pubkey, true).await?;
    if json {
        return print_json(&conn);
    }
    print_connection(&conn);
    Ok(())
}

/// Register a connection for an existing client key.
pub(crate) async fn create_connection(
    api: &NwcApi,
    pubkey: &str,
    request: RegistrationRequest,
    json: bool,
) -> anyhow::Result<()> {
    let conn = api.register(pubkey, request).await?;
    if json {
        return print_json(&conn);
    }
    println!("{}", Theme::success("Connection created."));
    print_connection(&conn);
    Ok(())
}

/// Delete a connection, asking first unless `yes` is set.
pub(crate) async fn delete_connection(api: &NwcApi, pubkey: &str, yes: bool) -> anyhow::Result<()> {
    if !yes {
        let conn = api.get_connection(pubkey, true).await?;
        println!(
            "{}",
            Theme::warning("The client will lose access immediately and budgets are discarded.")
        );
        print_connection(&conn);

        let confirm = dialoguer::Confirm::new()
            .with_prompt("Delete this connection?")
            .default(false)
            .interact()?;
        if !confirm {
            println!("{}", Theme::info("Aborted."));
            return Ok(());
        }
    }

    let response = api.delete(pubkey).await?;
    println!("{}", Theme::success(&response.message));
    Ok(())
}

/// Change the refresh window of one budget.
pub(crate) async fn set_budget_window(
    api: &NwcApi,
    pubkey: &str,
    index: usize,
    window: &str,
) -> anyhow::Result<()> {
    let key = PublicKey::from_hex(pubkey)?;
    let window = parse_window(window)?;
    let registry = api.service().registry();
    let conn = registry.reconfigure_budget(&key, index, window).await?;
    let Some(budget) = conn.budgets.get(index) else {
        bail!("budget #{index} disappeared after update");
    };
    println!(
        "{}",
        Theme::success(&format!(
            "Budget #{index} now refreshes {}.",
            budget
                .window_label()
                .map_or_else(|| format!("every {}s", budget.refresh_window), str::to_string)
        ))
    );
    Ok(())
}

fn print_connection(conn: &ConnectionResponse) {
    let data = &conn.data;
    println!("\n{}", Theme::header("Connection"));
    println!("{}", Theme::kv("Pubkey", &data.pubkey));
    println!("{}", Theme::kv("Description", &data.description));
    println!("{}", Theme::kv("Status", &Theme::status(data.status)));
    println!("{}", Theme::kv("Permissions", &data.permissions.join(", ")));
    println!("{}", Theme::kv("Created", &Theme::timestamp(data.created_at)));
    println!("{}", Theme::kv("Expires", &Theme::timestamp(data.expires_at)));
    println!("{}", Theme::kv("Last used", &Theme::timestamp(data.last_used)));

    if conn.budgets.is_empty() {
        println!("{}", Theme::kv("Budgets", &Theme::dimmed("unrestricted")));
    }
    for (i, b) in conn.budgets.iter().enumerate() {
        let reset = b
            .next_reset
            .map_or_else(|| "never".to_string(), Theme::timestamp);
        println!(
            "{}",
            Theme::kv(
                &format!("Budget #{i}"),
                &format!(
                    "{} / {} msats, window {}s, resets {reset}",
                    b.used_msats, b.budget_msats, b.refresh_window
                )
            )
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_window_names_and_seconds() {
        assert_eq!(parse_window("daily").unwrap(), 86_400);
        assert_eq!(parse_window("lifetime").unwrap(), 0);
        assert_eq!(parse_window("3600").unwrap(), 3600);
        assert!(parse_window("fortnightly").is_err());
    }

    #[test]
    fn test_parse_budget() {
        let spec = parse_budget("100000:86400").unwrap();
        assert_eq!(spec, BudgetSpec::new(100_000, 86_400));

        let spec = parse_budget("5000:weekly").unwrap();
        assert_eq!(spec.refresh_window, 604_800);
    }

    #[test]
    fn test_parse_budget_without_window_is_lifetime() {
        let spec = parse_budget("2500").unwrap();
        assert_eq!(spec, BudgetSpec::new(2_500, 0));
    }

    #[test]
    fn test_parse_budget_rejects_garbage() {
        assert!(parse_budget("lots:daily").is_err());
        assert!(parse_budget("100:sometimes").is_err());
    }
}
