use {
    anchor_lang::AccountDeserialize,
    anchor_spl::token::{
        spl_token,
        Mint,
    },
    reclaim::{
        build_close_plans,
        metadata::{
            fetch_image,
            get_metadata_address,
            parse_metadata,
            TokenMetadata,
        },
        referral::{
            ReferralStore,
            RewardRecord,
        },
        token::ui_amount,
        ClosePlan,
        ClosePlanArgs,
        ReclaimError,
        Referrer,
        Result,
        TokenAccountState,
    },
    solana_account_decoder::UiAccountEncoding,
    solana_client::{
        nonblocking::rpc_client::RpcClient,
        rpc_config::{
            RpcAccountInfoConfig,
            RpcProgramAccountsConfig,
            RpcSendTransactionConfig,
        },
        rpc_filter::{
            Memcmp,
            MemcmpEncodedBytes,
            RpcFilterType,
        },
    },
    solana_sdk::{
        account::Account,
        commitment_config::{
            CommitmentConfig,
            CommitmentLevel,
        },
        instruction::Instruction,
        program_pack::Pack,
        pubkey::Pubkey,
        signature::Signature,
        signer::Signer,
        transaction::Transaction,
    },
    std::{
        collections::HashMap,
        time::Duration,
    },
};

const MAX_MULTIPLE_ACCOUNTS: usize = 100;
const MAX_SEND_RETRIES: usize = 5;
const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_millis(500);
// Offset of the owner field in an SPL token account.
const TOKEN_ACCOUNT_OWNER_OFFSET: usize = 32;

pub struct CloseOptions {
    pub beneficiary:        Pubkey,
    pub compute_unit_price: u64,
    pub dry_run:            bool,
}

#[derive(Debug)]
pub struct CloseOutcome {
    pub plan:            ClosePlan,
    /// `None` for a dry run.
    pub signature:       Option<Signature>,
    pub reward_recorded: bool,
}

pub async fn get_sol_balance(rpc_client: &RpcClient, owner: &Pubkey) -> Result<u64> {
    Ok(rpc_client.get_balance(owner).await?)
}

async fn get_multiple_accounts(
    rpc_client: &RpcClient,
    addresses: &[Pubkey],
) -> Result<Vec<Option<Account>>> {
    let mut accounts = Vec::with_capacity(addresses.len());
    for chunk in addresses.chunks(MAX_MULTIPLE_ACCOUNTS) {
        accounts.extend(rpc_client.get_multiple_accounts(chunk).await?);
    }
    Ok(accounts)
}

/// Fetches and decodes the given token accounts, failing on the first one
/// that is missing or not an SPL token account.
pub async fn fetch_token_accounts(
    rpc_client: &RpcClient,
    addresses: &[Pubkey],
) -> Result<Vec<TokenAccountState>> {
    get_multiple_accounts(rpc_client, addresses)
        .await?
        .into_iter()
        .zip(addresses)
        .map(|(account, address)| {
            let account = account.ok_or(ReclaimError::AccountNotFound(*address))?;
            TokenAccountState::from_account(*address, &account)
        })
        .collect()
}

pub async fn list_token_accounts(
    rpc_client: &RpcClient,
    owner: &Pubkey,
) -> Result<Vec<TokenAccountState>> {
    let accounts = rpc_client
        .get_program_accounts_with_config(
            &spl_token::ID,
            RpcProgramAccountsConfig {
                filters:        Some(vec![
                    RpcFilterType::DataSize(spl_token::state::Account::LEN as u64),
                    RpcFilterType::Memcmp(Memcmp::new(
                        TOKEN_ACCOUNT_OWNER_OFFSET,
                        MemcmpEncodedBytes::Bytes(owner.to_bytes().to_vec()),
                    )),
                ]),
                account_config: RpcAccountInfoConfig {
                    encoding:         Some(UiAccountEncoding::Base64),
                    data_slice:       None,
                    commitment:       None,
                    min_context_slot: None,
                },
                with_context:   None,
            },
        )
        .await?;

    let mut token_accounts = Vec::with_capacity(accounts.len());
    for (pubkey, account) in accounts {
        match TokenAccountState::from_account(pubkey, &account) {
            Ok(state) => token_accounts.push(state),
            Err(err) => tracing::warn!(account = %pubkey, error = %err, "Skipping account"),
        }
    }
    Ok(token_accounts)
}

/// Lists the owner's token accounts with mint decimals and on-chain metadata.
/// Accounts whose mint has no metadata are kept with empty names.
pub async fn get_token_list(
    rpc_client: &RpcClient,
    http_client: &reqwest::Client,
    owner: &Pubkey,
    fetch_images: bool,
) -> Result<Vec<TokenMetadata>> {
    let token_accounts = list_token_accounts(rpc_client, owner).await?;

    let mut mints = token_accounts
        .iter()
        .map(|account| account.mint)
        .collect::<Vec<_>>();
    mints.sort();
    mints.dedup();

    let decimals: HashMap<Pubkey, u8> = get_multiple_accounts(rpc_client, &mints)
        .await?
        .into_iter()
        .zip(&mints)
        .filter_map(|(account, mint)| {
            let mint_state = Mint::try_deserialize(&mut account?.data.as_slice()).ok()?;
            Some((*mint, mint_state.decimals))
        })
        .collect();

    let metadata_addresses = mints.iter().map(get_metadata_address).collect::<Vec<_>>();
    let mut metadata = HashMap::new();
    for (account, mint) in get_multiple_accounts(rpc_client, &metadata_addresses)
        .await?
        .into_iter()
        .zip(&mints)
    {
        let Some(account) = account else {
            continue;
        };
        match parse_metadata(&account.data) {
            Ok(parsed) => {
                metadata.insert(*mint, parsed);
            }
            Err(err) => tracing::warn!(mint = %mint, error = %err, "Unreadable token metadata"),
        }
    }

    let mut token_list = Vec::with_capacity(token_accounts.len());
    for account in token_accounts {
        let decimals = decimals.get(&account.mint).copied().unwrap_or_default();
        let mut entry = TokenMetadata {
            balance: ui_amount(account.amount, decimals),
            decimals,
            address: account.address,
            mint: account.mint,
            amount: account.amount,
            ..TokenMetadata::default()
        };
        if let Some(parsed) = metadata.get(&account.mint) {
            entry.name = parsed.name.clone();
            entry.symbol = parsed.symbol.clone();
            entry.uri = parsed.uri.clone();
        }
        if fetch_images && !entry.uri.is_empty() {
            match fetch_image(http_client, &entry.uri).await {
                Ok(image) => entry.image = image,
                Err(err) => {
                    tracing::warn!(uri = %entry.uri, error = %err, "Failed to fetch token image")
                }
            }
        }
        token_list.push(entry);
    }
    Ok(token_list)
}

/// Looks up the owner's referrer and its current balance. A failing store
/// is treated as "no referrer".
pub async fn get_referrer<S: ReferralStore>(
    rpc_client: &RpcClient,
    store: &S,
    owner: &Pubkey,
) -> Result<Option<Referrer>> {
    let address = match store.get_referrer(owner).await {
        Ok(Some(address)) => address,
        Ok(None) => return Ok(None),
        Err(err) => {
            tracing::warn!(owner = %owner, error = %err, "Referrer lookup failed");
            return Ok(None);
        }
    };
    let balance = rpc_client.get_balance(&address).await?;
    Ok(Some(Referrer { address, balance }))
}

/// Burns and closes `accounts`, paying the beneficiary and the owner's
/// referrer out of the reclaimed rent. The selection is split into as many
/// transactions as needed to fit the packet size; `report` sees every
/// outcome as soon as it lands, so earlier batches stay reported when a later
/// one fails.
pub async fn close_token_accounts<S: ReferralStore>(
    rpc_client: &RpcClient,
    signer: &dyn Signer,
    store: &S,
    accounts: &[Pubkey],
    options: &CloseOptions,
    mut report: impl FnMut(&CloseOutcome),
) -> Result<Vec<CloseOutcome>> {
    let owner = signer.pubkey();
    let token_accounts = fetch_token_accounts(rpc_client, accounts).await?;
    let referrer = get_referrer(rpc_client, store, &owner).await?;

    let plans = build_close_plans(ClosePlanArgs {
        accounts: &token_accounts,
        owner,
        beneficiary: options.beneficiary,
        referrer,
        compute_unit_price: options.compute_unit_price,
    })?;
    if plans.len() > 1 {
        tracing::info!(
            accounts = accounts.len(),
            transactions = plans.len(),
            "Selection split across transactions"
        );
    }

    let mut outcomes = Vec::with_capacity(plans.len());
    for plan in plans {
        tracing::info!(
            accounts = plan.split.account_count,
            total_rent = plan.split.total_rent,
            beneficiary_amount = plan.split.beneficiary_amount,
            referrer_amount = plan.split.referrer_amount,
            skipped_referrer = referrer.is_some() && plan.paid_referrer.is_none(),
            "Reward split"
        );
        let outcome = execute_close_plan(rpc_client, signer, store, plan, options.dry_run).await?;
        report(&outcome);
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

async fn execute_close_plan<S: ReferralStore>(
    rpc_client: &RpcClient,
    signer: &dyn Signer,
    store: &S,
    plan: ClosePlan,
    dry_run: bool,
) -> Result<CloseOutcome> {
    if dry_run {
        return Ok(CloseOutcome {
            plan,
            signature: None,
            reward_recorded: false,
        });
    }

    let signature = process_transaction(rpc_client, &plan.instructions, signer).await?;

    let mut reward_recorded = false;
    if let Some(referrer) = plan.paid_referrer {
        let record = RewardRecord {
            wallet_address: referrer,
            amount: plan.split.referrer_amount,
            tx_signature: signature,
        };
        match store.record_reward(record).await {
            Ok(()) => reward_recorded = true,
            Err(err) => tracing::error!(
                referrer = %referrer,
                signature = %signature,
                error = %err,
                "Failed to record referral reward"
            ),
        }
    }

    Ok(CloseOutcome {
        plan,
        signature: Some(signature),
        reward_recorded,
    })
}

pub async fn process_transaction(
    rpc_client: &RpcClient,
    instructions: &[Instruction],
    signer: &dyn Signer,
) -> Result<Signature> {
    let (blockhash, last_valid_block_height) = rpc_client
        .get_latest_blockhash_with_commitment(CommitmentConfig::finalized())
        .await?;

    let mut transaction = Transaction::new_with_payer(instructions, Some(&signer.pubkey()));
    let signers: &[&dyn Signer] = &[signer];
    transaction.try_sign(signers, blockhash)?;

    let signature = rpc_client
        .send_transaction_with_config(
            &transaction,
            RpcSendTransactionConfig {
                skip_preflight: false,
                preflight_commitment: Some(CommitmentLevel::Confirmed),
                max_retries: Some(MAX_SEND_RETRIES),
                ..RpcSendTransactionConfig::default()
            },
        )
        .await?;
    tracing::info!(signature = %signature, "Transaction sent");

    confirm_transaction(rpc_client, &signature, last_valid_block_height).await?;
    tracing::info!(signature = %signature, "Transaction confirmed");
    Ok(signature)
}

/// Polls until the transaction is confirmed or its blockhash can no longer
/// land.
async fn confirm_transaction(
    rpc_client: &RpcClient,
    signature: &Signature,
    last_valid_block_height: u64,
) -> Result<()> {
    loop {
        let statuses = rpc_client
            .get_signature_statuses(std::slice::from_ref(signature))
            .await?
            .value;
        if let Some(Some(status)) = statuses.first() {
            if let Some(err) = &status.err {
                return Err(ReclaimError::TransactionFailed {
                    signature: *signature,
                    err:       err.clone(),
                });
            }
            if status.satisfies_commitment(CommitmentConfig::confirmed()) {
                return Ok(());
            }
        }

        let block_height = rpc_client
            .get_block_height_with_commitment(CommitmentConfig::confirmed())
            .await?;
        if block_height > last_valid_block_height {
            return Err(ReclaimError::BlockhashExpired(*signature));
        }
        tokio::time::sleep(CONFIRMATION_POLL_INTERVAL).await;
    }
}
