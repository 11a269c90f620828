use {
    crate::instructions::CloseOutcome,
    chrono::{
        DateTime,
        Utc,
    },
    reclaim::{
        logs::LogItem,
        metadata::TokenMetadata,
    },
    solana_sdk::native_token::lamports_to_sol,
};

pub fn shorten(input: &str) -> String {
    if input.chars().count() <= 9 {
        return input.to_string();
    }
    let chars = input.chars().collect::<Vec<_>>();
    let head = chars[..5].iter().collect::<String>();
    let tail = chars[chars.len() - 4..].iter().collect::<String>();
    format!("{head}...{tail}")
}

pub fn solscan_url(tx: &str) -> String {
    format!("https://solscan.io/tx/{tx}")
}

pub fn relative_time(created_at: &str, now: DateTime<Utc>) -> String {
    let Ok(date) = DateTime::parse_from_rfc3339(created_at) else {
        return created_at.to_string();
    };
    let seconds = (now - date.with_timezone(&Utc)).num_seconds().max(0);
    if seconds < 60 {
        return format!("{seconds}s ago");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    let days = hours / 24;
    if days < 30 {
        return format!("{days}d ago");
    }
    date.format("%Y-%m-%d").to_string()
}

pub fn print_token_list(tokens: &[TokenMetadata]) {
    println!(
        "{:<44}  {:<10}  {:<24}  {:>20}",
        "ACCOUNT", "SYMBOL", "NAME", "BALANCE"
    );
    for token in tokens {
        println!(
            "{:<44}  {:<10}  {:<24}  {:>20}",
            token.address.to_string(),
            token.symbol,
            token.name,
            token.balance
        );
    }
    println!("{} token accounts", tokens.len());
}

pub fn print_close_outcome(outcome: &CloseOutcome) {
    let split = &outcome.plan.split;
    println!("Accounts closed:    {}", split.account_count);
    println!("Reclaimed rent:     {} SOL", lamports_to_sol(split.total_rent));
    println!(
        "Platform fee:       {} SOL",
        lamports_to_sol(split.beneficiary_amount)
    );
    if let Some(referrer) = outcome.plan.paid_referrer {
        println!(
            "Referral reward:    {} SOL to {}",
            lamports_to_sol(split.referrer_amount),
            referrer
        );
    }
    println!("You receive:        {} SOL", lamports_to_sol(split.owner_net()));
    println!("Compute unit limit: {}", outcome.plan.compute_units);
    match &outcome.signature {
        Some(signature) => println!("Transaction:        {}", solscan_url(&signature.to_string())),
        None => println!("Dry run, {} instructions not sent", outcome.plan.instructions.len()),
    }
}

pub fn print_logs(logs: &[LogItem], now: DateTime<Utc>) {
    println!(
        "{:<32}  {:>5}  {:>12}  {:>10}",
        "WALLET/TX", "ACCTS", "CLAIMED SOL", "TIME"
    );
    for log in logs {
        println!(
            "{:<32}  {:>5}  {:>12.3}  {:>10}",
            format!("{} ({})", shorten(&log.wallet), log.wallet_name),
            log.accounts,
            lamports_to_sol(log.lamports),
            relative_time(&log.created_at, now)
        );
        println!("  {}", solscan_url(&log.tx));
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        chrono::TimeZone,
    };

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("abc"), "abc");
        assert_eq!(shorten("123456789"), "123456789");
        assert_eq!(
            shorten("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU"),
            "7xKXt...gAsU"
        );
    }

    #[test]
    fn test_relative_time() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 12, 0, 0).unwrap();
        assert_eq!(relative_time("2024-12-31T11:59:15Z", now), "45s ago");
        assert_eq!(relative_time("2024-12-31T11:30:00Z", now), "30m ago");
        assert_eq!(relative_time("2024-12-31T02:00:00.000000Z", now), "10h ago");
        assert_eq!(relative_time("2024-12-25T12:00:00Z", now), "6d ago");
        assert_eq!(relative_time("2024-10-01T12:00:00Z", now), "2024-10-01");
        assert_eq!(relative_time("yesterday", now), "yesterday");
    }

    #[test]
    fn test_solscan_url() {
        assert_eq!(solscan_url("abc"), "https://solscan.io/tx/abc");
    }
}
