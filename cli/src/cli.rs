//! CLI options
use {
    clap::{
        Parser,
        Subcommand,
    },
    reclaim::constants::DEFAULT_COMPUTE_UNIT_PRICE,
    solana_remote_wallet::{
        locator::Locator,
        remote_keypair::generate_remote_keypair,
        remote_wallet::maybe_wallet_manager,
    },
    solana_sdk::{
        derivation_path::DerivationPath,
        pubkey::Pubkey,
        signature::read_keypair_file,
        signer::Signer,
    },
    std::convert::TryFrom,
};

#[derive(Parser, Debug)]
#[clap(about = "Close unused SPL token accounts and reclaim their rent")]
pub struct Cli {
    #[clap(
        long,
        env = "RECLAIM_RPC_URL",
        default_value = "https://api.mainnet-beta.solana.com"
    )]
    pub rpc_url:            String,
    #[clap(
        long,
        default_value = "~/.config/solana/id.json",
        help = "Keypair file of the wallet owner, or usb://ledger"
    )]
    pub keypair:            String,
    #[clap(
        long,
        env = "RECLAIM_BENEFICIARY",
        help = "Platform wallet receiving its share of the reclaimed rent"
    )]
    pub beneficiary:        Option<Pubkey>,
    #[clap(long, env = "RECLAIM_FIREBASE_PROJECT")]
    pub firebase_project:   Option<String>,
    #[clap(long, env = "RECLAIM_FIREBASE_API_KEY")]
    pub firebase_api_key:   Option<String>,
    #[clap(long, env = "RECLAIM_LOGS_URL", help = "Base url of the closure log API")]
    pub logs_url:           Option<String>,
    #[clap(
        long,
        default_value_t = DEFAULT_COMPUTE_UNIT_PRICE,
        help = "Compute unit price in micro-lamports"
    )]
    pub compute_unit_price: u64,
    #[clap(subcommand)]
    pub action:             Action,
}

#[derive(Subcommand, Debug)]
pub enum Action {
    #[clap(about = "Show the wallet's SOL balance")]
    Balance {},
    #[clap(about = "List the wallet's token accounts")]
    List {
        #[clap(long, help = "Only show accounts holding at most this many tokens")]
        max_balance: Option<f64>,
        #[clap(long, help = "Do not fetch token images from metadata uris")]
        skip_images: bool,
    },
    #[clap(about = "Burn, close and reclaim rent from token accounts")]
    Close {
        #[clap(help = "Token accounts to close")]
        accounts:     Vec<Pubkey>,
        #[clap(long, help = "Select every token account with a zero balance")]
        all_empty:    bool,
        #[clap(long, help = "Print the transaction plan without signing it")]
        dry_run:      bool,
        #[clap(long, help = "Skip the referral lookup")]
        no_referrals: bool,
    },
    #[clap(about = "Show recent closures reported by the log API")]
    Logs {
        #[clap(long, default_value_t = 1)]
        page:   u64,
        #[clap(long, help = "Keep polling for new closures")]
        follow: bool,
    },
}

pub enum SignerSource {
    Filepath(String),
    Usb {
        locator:         Locator,
        derivation_path: Option<DerivationPath>,
    },
}

pub fn get_signer_source_from_path(source: &str) -> Result<SignerSource, String> {
    match uriparse::URIReference::try_from(source) {
        Ok(uri) => {
            if let Some(scheme) = uri.scheme() {
                match scheme.as_str() {
                    "usb" => Ok(SignerSource::Usb {
                        locator:         Locator::new_from_uri(&uri)
                            .map_err(|e| format!("Invalid usb locator: {}", e))?,
                        derivation_path: DerivationPath::from_uri_any_query(&uri)
                            .map_err(|e| format!("Invalid derivation path: {}", e))?,
                    }),
                    _ => Err(format!("Unsupported scheme: {}", scheme)),
                }
            } else {
                std::fs::metadata(shellexpand::tilde(source).to_string())
                    .map(|_| SignerSource::Filepath(source.to_string()))
                    .map_err(|_| format!("Invalid keypair path: {}", source))
            }
        }
        Err(e) => Err(format!("Invalid keypair source: {}", e)),
    }
}

/// This is mostly borrowed from https://github.com/solana-labs/solana/blob/master/clap-utils/src/keypair.rs#L753
/// To use ledger use `usb://ledger` or `usb://ledger?key=0/0`.
pub fn get_signer_from_path(source: &str) -> Result<Box<dyn Signer>, String> {
    match get_signer_source_from_path(source)? {
        SignerSource::Filepath(path) => read_keypair_file(&*shellexpand::tilde(&path))
            .map(|keypair| Box::new(keypair) as Box<dyn Signer>)
            .map_err(|_| format!("Keypair not found: {}", path)),
        SignerSource::Usb {
            locator,
            derivation_path,
        } => {
            let wallet_manager = maybe_wallet_manager()
                .map_err(|e| format!("Hardware wallet error: {}", e))?
                .ok_or_else(|| "No hardware wallet found".to_string())?;
            let keypair = generate_remote_keypair(
                locator,
                derivation_path.unwrap_or_default(),
                &wallet_manager,
                false,
                "",
            )
            .map_err(|e| format!("Hardware wallet error: {}", e))?;
            Ok(Box::new(keypair))
        }
    }
}
