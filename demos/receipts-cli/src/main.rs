//! Interactive receipts demo.
//!
//! Fetches the most recent receipts for a phone number, running the SMS
//! authorization flow on first use. The captcha solution and confirmation
//! code are both entered on stdin: solve the captcha in a browser at the
//! printed page URL, paste the token, then type the SMS code when it
//! arrives. The session lands in a JSON file and later runs reuse it
//! without any prompts.
//!
//! Run with:
//!   cargo run -p lkdr-receipts-cli -- --phone +79990000000 --limit 5

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use clap::Parser;
use lkdr_client::types::{FiscalDataRequest, ReceiptRequest};
use lkdr_client::{
    ChallengeProvider, Client, CodeProvider, FileSessionStore, LkdrError, Result,
};

/// Fetch receipts from LKDR
#[derive(Parser, Debug)]
#[command(name = "lkdr-receipts-cli")]
#[command(about = "Fetch receipts from LKDR with stdin-driven SMS authorization")]
struct Args {
    /// Phone number in +7 format
    #[arg(long, env = "LKDR_PHONE")]
    phone: String,

    /// Stable device identifier presented to the service
    #[arg(long, env = "LKDR_DEVICE_ID", default_value = "lkdr-receipts-cli")]
    device_id: String,

    /// User agent presented to the service and the captcha provider
    #[arg(
        long,
        env = "LKDR_USER_AGENT",
        default_value = "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/128.0"
    )]
    user_agent: String,

    /// Session file path (defaults to the platform config directory)
    #[arg(long, env = "LKDR_SESSION_FILE")]
    session_file: Option<PathBuf>,

    /// Only receipts dated on or after this day (YYYY-MM-DD)
    #[arg(long)]
    date_from: Option<NaiveDate>,

    /// Only receipts dated on or before this day (YYYY-MM-DD)
    #[arg(long)]
    date_to: Option<NaiveDate>,

    /// How many receipts to fetch
    #[arg(long, short = 'n', default_value = "10")]
    limit: u32,

    /// Also fetch the fiscal line items of the newest receipt
    #[arg(long)]
    fiscal: bool,
}

/// Reads one trimmed line from stdin, off the async runtime
async fn read_line(prompt: String) -> std::io::Result<String> {
    tokio::task::spawn_blocking(move || -> std::io::Result<String> {
        print!("{prompt}");
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok(line.trim().to_string())
    })
    .await
    .map_err(std::io::Error::other)?
}

/// Captcha "solver" that asks the operator to paste a token obtained in a
/// browser session with the same user agent
struct PasteChallenge;

#[async_trait]
impl ChallengeProvider for PasteChallenge {
    async fn solve(&self, user_agent: &str, site_key: &str, page_url: &str) -> Result<String> {
        println!("Captcha required. Solve it at {page_url} (site key {site_key})");
        println!("using a browser with user agent:\n  {user_agent}");
        read_line("Paste captcha token: ".to_string())
            .await
            .map_err(|e| LkdrError::challenge(format!("read captcha token: {e}")))
    }
}

struct StdinCode;

#[async_trait]
impl CodeProvider for StdinCode {
    async fn code(&self, phone: &str) -> Result<String> {
        read_line(format!("Enter SMS code sent to {phone}: "))
            .await
            .map_err(|e| LkdrError::confirmation(format!("read sms code: {e}")))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lkdr_client=info".into()),
        )
        .init();

    let args = Args::parse();

    let store = match args.session_file.clone() {
        Some(path) => FileSessionStore::new(path),
        None => FileSessionStore::default_path(),
    };
    println!("Session file: {}", store.path().display());

    let client = Client::builder()
        .device_id(&args.device_id)
        .user_agent(&args.user_agent)
        .session_store(Arc::new(store))
        .challenge_provider(Arc::new(PasteChallenge))
        .code_provider(Arc::new(StdinCode))
        .build()
        .context("build client")?;

    let request = ReceiptRequest::builder().limit(args.limit);
    let request = match (args.date_from, args.date_to) {
        (Some(from), Some(to)) => request.date_from(from.into()).date_to(to.into()).build(),
        (Some(from), None) => request.date_from(from.into()).build(),
        (None, Some(to)) => request.date_to(to.into()).build(),
        (None, None) => request.build(),
    };

    let page = client
        .receipts(&args.phone, &request)
        .await
        .context("fetch receipts")?;

    if page.receipts.is_empty() {
        println!("No receipts.");
        return Ok(());
    }

    println!("{} receipt(s){}:", page.receipts.len(), if page.has_more { ", more available" } else { "" });
    for receipt in &page.receipts {
        println!(
            "  {}  {:>10}  {}",
            receipt.receive_date, receipt.total_sum, receipt.kkt_owner
        );
    }

    if args.fiscal {
        let newest = &page.receipts[0];
        let fiscal = client
            .fiscal_data(&args.phone, &FiscalDataRequest::new(&newest.key))
            .await
            .context("fetch fiscal data")?;
        println!("\nFiscal document {} from {}:", fiscal.fiscal_document_number, fiscal.user);
        for item in &fiscal.items {
            println!("  {:<40} {:>8.2} x {:<6} = {:>10.2}", item.name, item.price, item.quantity, item.sum);
        }
        println!("  {:>59} {:>10.2}", "total", fiscal.total_sum);
    }

    Ok(())
}
