//! gig-demo: run one service through its whole lifecycle.
//!
//! ```text
//! gig-demo [CONFIG.json] [--json]
//! ```
//!
//! Log level comes from `RUST_LOG` (default `info`). `--json` switches the
//! log output to one JSON object per line.

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use clap::Parser;
use ed25519_dalek::SigningKey;
use gigledger_client::{
    Coordinates, GigClient, LedgerHandle, MemoryContentStore, ServiceDraft, StaticGeocoder,
    StraightLineRouter,
};
use gigledger_escrow::status_counts;
use gigledger_types::{AccountId, ClientConfig, Result, constants};
use rand::rngs::OsRng;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gig-demo", version, about = "Run one service through its whole lifecycle")]
struct Args {
    /// Path to a JSON client configuration file. Defaults apply when omitted.
    config: Option<PathBuf>,

    /// Emit logs as one JSON object per line.
    #[arg(long)]
    json: bool,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

fn new_account() -> AccountId {
    let key = SigningKey::generate(&mut OsRng);
    let account = AccountId::from(&key.verifying_key());
    tracing::debug!(account = %account.short(), "Generated account");
    account
}

fn gazetteer() -> StaticGeocoder {
    let place = |lat, lon| Coordinates::new(lat, lon).unwrap_or(Coordinates { lat: 0.0, lon: 0.0 });
    StaticGeocoder::new()
        .with_place("Central Station", place(52.3791, 4.9003))
        .with_place("Harbour Gate", place(52.3840, 4.8650))
}

async fn run(config: ClientConfig) -> Result<()> {
    let ledger = LedgerHandle::with_config(config.ledger.clone());
    let store = Arc::new(MemoryContentStore::new(config.content_store.clone()));
    let geocoder = Arc::new(gazetteer());
    let router = Arc::new(StraightLineRouter::default());

    let client = |account| {
        GigClient::new(
            account,
            ledger.clone(),
            Arc::clone(&store),
            Arc::clone(&geocoder),
            Arc::clone(&router),
        )
    };
    let requester = client(new_account());
    let provider = client(new_account());
    ledger.deposit(requester.account(), Decimal::from(100)).await?;

    let poll = requester.poller().spawn(config.poll_interval());

    let id = requester
        .post_service(ServiceDraft {
            title: "Deliver parcel".into(),
            start_location: "Central Station".into(),
            end_location: "Harbour Gate".into(),
            photo: b"parcel photo".to_vec(),
            amount: Decimal::from(25),
        })
        .await?;

    let map = requester.map_view(id).await?;
    tracing::info!(
        service = %id,
        distance_m = map.route.as_ref().map_or(0.0, |r| r.distance_m),
        "Route computed"
    );

    provider.request(id).await?;
    let token = requester.approve(id).await?;
    tracing::info!(service = %id, %token, "Receipt token issued");

    provider.submit_proof(id, b"delivered photo".to_vec()).await?;
    let paid = requester.verify(id).await?;

    poll.stop().await;

    let requester_balance = requester.balance().await;
    let provider_balance = provider.balance().await;
    tracing::info!(
        %paid,
        requester_available = %requester_balance.available,
        provider_available = %provider_balance.available,
        "Lifecycle complete"
    );

    let counts = ledger.with_ledger(|l| status_counts(l)).await;
    for (status, n) in counts {
        tracing::info!(%status, count = n, "Services by status");
    }
    ledger.with_ledger(|l| l.check_invariants()).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.json);
    tracing::info!(
        protocol = constants::PROTOCOL_NAME,
        version = constants::VERSION,
        "Starting demo"
    );

    let config = match &args.config {
        Some(path) => match ClientConfig::from_json_file(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "Failed to load config");
                return ExitCode::FAILURE;
            }
        },
        None => ClientConfig::default(),
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, retryable = err.is_retryable(), "Demo failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_config_and_json_flag() {
        let args = Args::try_parse_from(["gig-demo", "cfg.json", "--json"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("cfg.json")));
        assert!(args.json);

        let args = Args::try_parse_from(["gig-demo"]).unwrap();
        assert!(args.config.is_none());
        assert!(!args.json);
    }

    #[test]
    fn misspelled_flag_is_an_error() {
        let err = Args::try_parse_from(["gig-demo", "--jsn", "cfg.json"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn help_does_not_run_the_demo() {
        let err = Args::try_parse_from(["gig-demo", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
