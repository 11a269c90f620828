pub mod cli;
pub mod display;
pub mod instructions;

use {
    clap::Parser,
    cli::{
        get_signer_from_path,
        Action,
        Cli,
    },
    display::{
        print_close_outcome,
        print_logs,
        print_token_list,
    },
    instructions::{
        close_token_accounts,
        get_sol_balance,
        get_token_list,
        list_token_accounts,
        CloseOptions,
    },
    reclaim::{
        logs::{
            LogFeed,
            LogsApi,
            LOG_POLL_INTERVAL,
        },
        referral::{
            FirestoreConfig,
            FirestoreReferralStore,
            MemoryReferralStore,
        },
        ReclaimError,
    },
    solana_client::nonblocking::rpc_client::RpcClient,
    solana_sdk::{
        commitment_config::CommitmentConfig,
        native_token::lamports_to_sol,
        signer::Signer,
    },
    thiserror::Error,
    tokio_stream::{
        wrappers::IntervalStream,
        StreamExt,
    },
    tracing_subscriber::{
        layer::SubscriberExt,
        util::SubscriberInitExt,
    },
};

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Signer(String),
    #[error("Missing configuration: {0}")]
    Config(&'static str),
    #[error(transparent)]
    Reclaim(#[from] ReclaimError),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run(Cli::parse()).await {
        tracing::error!(error = %err, "Command failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let rpc_client =
        RpcClient::new_with_commitment(cli.rpc_url.clone(), CommitmentConfig::confirmed());

    match cli.action {
        Action::Balance {} => {
            let owner = load_signer(&cli.keypair)?.pubkey();
            let balance = get_sol_balance(&rpc_client, &owner).await?;
            println!("{} SOL", lamports_to_sol(balance));
        }
        Action::List {
            max_balance,
            skip_images,
        } => {
            let owner = load_signer(&cli.keypair)?.pubkey();
            let http_client = reclaim::http::client()?;
            let mut tokens = get_token_list(&rpc_client, &http_client, &owner, !skip_images).await?;
            if let Some(max_balance) = max_balance {
                tokens.retain(|token| token.balance <= max_balance);
            }
            print_token_list(&tokens);
        }
        Action::Close {
            ref accounts,
            all_empty,
            dry_run,
            no_referrals,
        } => {
            let signer = load_signer(&cli.keypair)?;
            let options = CloseOptions {
                beneficiary: cli
                    .beneficiary
                    .ok_or(CliError::Config("--beneficiary / RECLAIM_BENEFICIARY"))?,
                compute_unit_price: cli.compute_unit_price,
                dry_run,
            };

            let mut selected = accounts.clone();
            if all_empty {
                let owner = signer.pubkey();
                for account in list_token_accounts(&rpc_client, &owner).await? {
                    if account.amount == 0 && !selected.contains(&account.address) {
                        selected.push(account.address);
                    }
                }
            }
            if selected.is_empty() {
                return Err(ReclaimError::EmptySelection.into());
            }

            match cli.firebase_project.as_ref().filter(|_| !no_referrals) {
                Some(project) => {
                    let store = FirestoreReferralStore::new(
                        reclaim::http::client()?,
                        FirestoreConfig::new(project.clone(), cli.firebase_api_key.clone()),
                    );
                    close_token_accounts(
                        &rpc_client,
                        signer.as_ref(),
                        &store,
                        &selected,
                        &options,
                        print_close_outcome,
                    )
                    .await?;
                }
                None => {
                    if !no_referrals {
                        tracing::warn!("No referral store configured, referrers will not be paid");
                    }
                    let store = MemoryReferralStore::new();
                    close_token_accounts(
                        &rpc_client,
                        signer.as_ref(),
                        &store,
                        &selected,
                        &options,
                        print_close_outcome,
                    )
                    .await?;
                }
            }
        }
        Action::Logs { page, follow } => {
            let logs_url = cli
                .logs_url
                .as_deref()
                .ok_or(CliError::Config("--logs-url / RECLAIM_LOGS_URL"))?;
            let api = LogsApi::new(reclaim::http::client()?, logs_url);
            if !follow {
                print_logs(&api.fetch_logs(page).await?, chrono::Utc::now());
                return Ok(());
            }

            let mut feed = LogFeed::new();
            let mut ticks = IntervalStream::new(tokio::time::interval(LOG_POLL_INTERVAL));
            while ticks.next().await.is_some() {
                match api.fetch_logs(page).await {
                    Ok(items) => {
                        if let Some(items) = feed.update(items) {
                            print_logs(items, chrono::Utc::now());
                        }
                    }
                    Err(err) => tracing::warn!(error = %err, "Failed to fetch logs"),
                }
            }
        }
    }
    Ok(())
}

fn load_signer(source: &str) -> Result<Box<dyn Signer>, CliError> {
    get_signer_from_path(source).map_err(CliError::Signer)
}
