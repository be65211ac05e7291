//! CLI commands

use cosign_core::{Address, Amount};
use cosign_events::{EventKind, VaultEvent};
use cosign_vault::{TxIndex, VaultConfig};
use rust_decimal::Decimal;
use std::path::Path;

use crate::context::AppContext;

/// Create a vault with the given owners and threshold
pub fn init(
    data_path: &Path,
    name: &str,
    owners: Vec<Address>,
    required: usize,
) -> Result<AppContext, anyhow::Error> {
    let config = VaultConfig::new(owners, required).with_name(name);
    let ctx = AppContext::init(data_path, &config)?;

    println!(
        "✅ Vault '{}' initialized: {} of {} owners required",
        name,
        required,
        ctx.vault.owners().len()
    );
    Ok(ctx)
}

/// Credit funds to the vault
pub fn deposit(ctx: &mut AppContext, sender: Address, amount: Decimal) -> Result<(), anyhow::Error> {
    let amount = Amount::new(amount)?;
    let balance = ctx.deposit(sender, amount)?;

    println!("✅ Deposited {} from {} (balance: {})", amount, sender, balance);
    Ok(())
}

/// Propose a transfer
pub fn submit(
    ctx: &mut AppContext,
    caller: Address,
    to: Address,
    value: Decimal,
    data: Option<&str>,
) -> Result<TxIndex, anyhow::Error> {
    let value = Amount::new(value)?;
    let data = match data {
        Some(hex_data) => decode_payload(hex_data)?,
        None => Vec::new(),
    };

    let tx_index = ctx.vault.submit(caller, to, value, data)?;
    ctx.save()?;

    println!("✅ Submitted transaction #{}: {} to {}", tx_index, value, to);
    Ok(tx_index)
}

/// Approve a pending transaction
pub fn confirm(ctx: &mut AppContext, caller: Address, tx_index: TxIndex) -> Result<(), anyhow::Error> {
    let count = ctx.vault.confirm(caller, tx_index)?;
    ctx.save()?;

    println!(
        "✅ {} confirmed transaction #{} ({}/{})",
        caller,
        tx_index,
        count,
        ctx.vault.required_confirmations()
    );
    Ok(())
}

/// Withdraw an approval
pub fn revoke(ctx: &mut AppContext, caller: Address, tx_index: TxIndex) -> Result<(), anyhow::Error> {
    let count = ctx.vault.revoke(caller, tx_index)?;
    ctx.save()?;

    println!(
        "✅ {} revoked confirmation of transaction #{} ({}/{})",
        caller,
        tx_index,
        count,
        ctx.vault.required_confirmations()
    );
    Ok(())
}

/// Execute a confirmed transaction
pub async fn execute(
    ctx: &mut AppContext,
    caller: Address,
    tx_index: TxIndex,
) -> Result<(), anyhow::Error> {
    ctx.vault.execute(caller, tx_index).await?;
    ctx.save()?;

    let tx = ctx.vault.transaction(tx_index)?;
    println!(
        "✅ Executed transaction #{}: sent {} to {} (balance: {})",
        tx_index,
        tx.value,
        tx.to,
        ctx.vault.balance()
    );
    Ok(())
}

/// Print one transaction with its confirmations
pub fn show(ctx: &AppContext, tx_index: TxIndex) -> Result<(), anyhow::Error> {
    let tx = ctx.vault.transaction(tx_index)?;
    let confirmed_by = ctx.vault.confirmations(tx_index)?;
    let required = ctx.vault.required_confirmations();

    println!("Transaction #{}", tx_index);
    println!("  to:            {}", tx.to);
    println!("  value:         {}", tx.value);
    println!("  data:          0x{}", hex::encode(&tx.data));
    println!("  executed:      {}", tx.executed);
    println!("  confirmations: {}/{}", tx.num_confirmations, required);
    for owner in confirmed_by {
        println!("    - {}", owner);
    }
    Ok(())
}

/// List all transactions
pub fn list(ctx: &AppContext) -> Result<(), anyhow::Error> {
    if ctx.vault.transaction_count() == 0 {
        println!("No transactions");
        return Ok(());
    }

    let required = ctx.vault.required_confirmations();
    println!("Transactions ({}):", ctx.vault.transaction_count());
    println!("{:-<80}", "");
    println!(
        "{:>4} | {:<42} | {:>12} | {:>6} | {:<8}",
        "#", "To", "Value", "Conf", "Status"
    );
    println!("{:-<80}", "");

    for (tx_index, tx) in ctx.vault.transactions() {
        let status = if tx.executed {
            "executed"
        } else if ctx.vault.is_executable(tx_index)? {
            "ready"
        } else {
            "pending"
        };
        println!(
            "{:>4} | {:<42} | {:>12} | {:>3}/{:<2} | {:<8}",
            tx_index,
            tx.to.to_string(),
            tx.value.to_string(),
            tx.num_confirmations,
            required,
            status
        );
    }
    Ok(())
}

/// Print the owner set and threshold
pub fn owners(ctx: &AppContext) -> Result<(), anyhow::Error> {
    println!(
        "Vault '{}': {} of {} owners required",
        ctx.vault.name(),
        ctx.vault.required_confirmations(),
        ctx.vault.owners().len()
    );
    for owner in ctx.vault.owners() {
        println!("  {}", owner);
    }
    println!("Balance: {}", ctx.vault.balance());
    Ok(())
}

/// Recompute every confirmation counter and count the journal
pub fn audit(ctx: &AppContext) -> Result<(), anyhow::Error> {
    let report = ctx.vault.audit()?;
    let journaled = ctx.journal_count()?;

    println!(
        "✅ Vault consistent: {} transactions ({} executed, {} pending), {} confirmations",
        report.transactions, report.executed, report.pending, report.confirmations
    );
    println!("   Journal: {} events", journaled);
    Ok(())
}

/// Print journaled events, optionally filtered
pub fn history(
    ctx: &AppContext,
    tx_index: Option<TxIndex>,
    kind: Option<EventKind>,
) -> Result<Vec<VaultEvent>, anyhow::Error> {
    let events: Vec<VaultEvent> = ctx
        .history()?
        .into_iter()
        .filter(|e| tx_index.map_or(true, |index| e.tx_index() == Some(index)))
        .filter(|e| kind.map_or(true, |k| e.kind() == k))
        .collect();

    if events.is_empty() {
        println!("No events found");
        return Ok(events);
    }

    for event in &events {
        let target = event
            .tx_index()
            .map(|index| format!("#{}", index))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{} {:<8} {:>5} {}",
            event.timestamp().format("%Y-%m-%d %H:%M:%S"),
            event.kind().to_string(),
            target,
            event.actor()
        );
    }
    Ok(events)
}

fn decode_payload(input: &str) -> Result<Vec<u8>, anyhow::Error> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    hex::decode(digits).map_err(|e| anyhow::anyhow!("Invalid --data hex '{}': {}", input, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_payload() {
        assert_eq!(decode_payload("0xbeef").unwrap(), vec![0xbe, 0xef]);
        assert_eq!(decode_payload("0102").unwrap(), vec![0x01, 0x02]);
        assert!(decode_payload("").unwrap().is_empty());
        assert!(decode_payload("0xzz").is_err());
    }
}
