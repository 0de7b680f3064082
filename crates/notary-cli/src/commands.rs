use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use colored::Colorize;
use tracing::{debug, warn};

use notary_ledger::{DevLedger, EventRange, LedgerSnapshot, LedgerTransport, TransportError};
use notary_sdk::{Notary, NotarizationEntry, SearchFilter};
use notary_types::{DocumentDigest, SignerIdentity};

use crate::cli::*;
use crate::config::Settings;

/// Attempts at notarizing before giving up on a ledger file other writers
/// keep changing.
const SAVE_ATTEMPTS: u32 = 3;

struct Invocation {
    format: OutputFormat,
    ledger_path: PathBuf,
    settings: Settings,
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let ctx = Invocation {
        format: cli.format,
        ledger_path: cli.ledger,
        settings,
    };
    match cli.command {
        Command::Init(args) => cmd_init(&ctx, args),
        Command::Digest(args) => cmd_digest(&ctx, args).await,
        Command::Notarize(args) => cmd_notarize(&ctx, args).await,
        Command::Search(args) => cmd_search(&ctx, args).await,
    }
}

fn cmd_init(ctx: &Invocation, args: InitArgs) -> anyhow::Result<()> {
    if ctx.ledger_path.exists() && !args.force {
        bail!(
            "ledger already exists at {} (use --force to overwrite)",
            ctx.ledger_path.display()
        );
    }
    if ctx.ledger_path.exists() {
        std::fs::remove_file(&ctx.ledger_path)
            .with_context(|| format!("failed to remove {}", ctx.ledger_path.display()))?;
    }
    let ledger = DevLedger::new(ctx.settings.ledger.clone());
    ledger.save(&ctx.ledger_path)?;

    println!("{} Initialized dev ledger in {}", "✓".green().bold(), ctx.ledger_path.display().to_string().bold());
    for name in &ledger.config().stores {
        println!("  Store: {}", name.yellow());
    }
    if let Some(account) = ledger.config().accounts.first() {
        println!("  Default account: {}", account.as_str().cyan());
    }
    println!("  Minimum fee: {}", ledger.config().min_fee);
    Ok(())
}

async fn cmd_digest(ctx: &Invocation, args: DigestArgs) -> anyhow::Result<()> {
    let file = first_file(&args.files)?;
    let notary = Notary::offline(ctx.settings.notary.clone());
    let digest = notary.compute_file_digest(file).await?;
    print_digest(ctx, file, &digest)
}

async fn cmd_notarize(ctx: &Invocation, args: NotarizeArgs) -> anyhow::Result<()> {
    let file = first_file(&args.files)?;
    let digest = Notary::offline(ctx.settings.notary.clone())
        .compute_file_digest(file)
        .await?;
    let signer = SignerIdentity::from(args.signer.unwrap_or_default());

    // The entry only counts once it is in the file; if another writer saved
    // first, start over from their chain.
    let mut attempt = 1;
    let tx = loop {
        let ledger = open_ledger(ctx)?;
        let notary = Notary::new(ledger.clone(), ctx.settings.notary.clone());
        let Some(tx) = notary.create_entry(&digest, &signer).await? else {
            println!("Nothing to submit.");
            return Ok(());
        };
        match ledger.save(&ctx.ledger_path) {
            Ok(()) => break tx,
            Err(TransportError::Conflict(reason)) if attempt < SAVE_ATTEMPTS => {
                warn!(attempt, %reason, "ledger changed underneath; retrying");
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    };

    match ctx.format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "file": file.display().to_string(),
                "documentHash": digest.as_str(),
                "tx": tx.to_hex(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!("{} Entry submitted", "✓".green().bold());
            println!("  Document: {}", file.display());
            println!("  Digest: {}", digest.as_str().yellow());
            println!("  Tx: {}", tx.to_hex().dimmed());
        }
    }
    Ok(())
}

async fn cmd_search(ctx: &Invocation, args: SearchArgs) -> anyhow::Result<()> {
    let ledger = open_ledger(ctx)?;
    let notary = Notary::new(ledger.clone(), ctx.settings.notary.clone());
    let filter = SearchFilter {
        signer: args.signer.map(SignerIdentity::from),
        document_hash: args.hash,
    };

    if !args.follow {
        let head = ledger.block_number().await?;
        let entries = notary
            .search_range(&filter, EventRange::through(head))
            .await?
            .collect()
            .await;
        return print_entries(ctx, &entries);
    }

    let mut stream = notary.search(&filter).await?;
    let poller = tokio::spawn(poll_ledger_file(
        Arc::clone(&ledger),
        ctx.ledger_path.clone(),
        Duration::from_millis(args.poll_ms),
    ));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            entry = stream.next() => match entry {
                Some(entry) => print_entry(ctx, &entry)?,
                None => break,
            },
            _ = &mut ctrl_c => break,
        }
    }
    poller.abort();
    stream.close();
    Ok(())
}

/// Feed blocks other processes append to the ledger file into the
/// in-process ledger, so a following search sees them.
async fn poll_ledger_file(ledger: Arc<DevLedger>, path: PathBuf, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        match LedgerSnapshot::load(&path).map(|s| ledger.absorb(s)) {
            Ok(Ok(added)) if added > 0 => debug!(added, "new blocks from ledger file"),
            Ok(Ok(_)) => {}
            Ok(Err(e)) | Err(e) => warn!(error = %e, "failed to refresh ledger file"),
        }
    }
}

fn first_file(files: &[PathBuf]) -> anyhow::Result<&Path> {
    let (first, rest) = files.split_first().context("no file given")?;
    if !rest.is_empty() {
        warn!(ignored = rest.len(), "only the first file is used");
    }
    Ok(first.as_path())
}

fn open_ledger(ctx: &Invocation) -> anyhow::Result<Arc<DevLedger>> {
    if !ctx.ledger_path.exists() {
        bail!(
            "no ledger at {}; run `notary init` first",
            ctx.ledger_path.display()
        );
    }
    let ledger = DevLedger::load(&ctx.ledger_path, ctx.settings.ledger.clone())?;
    Ok(Arc::new(ledger))
}

fn print_digest(ctx: &Invocation, file: &Path, digest: &DocumentDigest) -> anyhow::Result<()> {
    match ctx.format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "file": file.display().to_string(),
                "documentHash": digest.as_str(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => println!("{}  {}", digest.as_str().yellow(), file.display()),
    }
    Ok(())
}

fn print_entries(ctx: &Invocation, entries: &[NotarizationEntry]) -> anyhow::Result<()> {
    match ctx.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entries)?),
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No entries.");
            }
            for entry in entries {
                print_entry(ctx, entry)?;
            }
        }
    }
    Ok(())
}

fn print_entry(ctx: &Invocation, entry: &NotarizationEntry) -> anyhow::Result<()> {
    match ctx.format {
        OutputFormat::Json => println!("{}", serde_json::to_string(entry)?),
        OutputFormat::Text => println!(
            "{}  {}  {}",
            format!("#{}", entry.block_number).dimmed(),
            entry.signer.as_str().cyan(),
            entry.document_hash.as_str().yellow()
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(dir: &Path) -> Invocation {
        Invocation {
            format: OutputFormat::Text,
            ledger_path: dir.join("ledger.json"),
            settings: Settings::default(),
        }
    }

    #[test]
    fn first_file_ignores_the_rest() {
        let files = vec![PathBuf::from("a"), PathBuf::from("b")];
        assert_eq!(first_file(&files).unwrap(), Path::new("a"));
        assert!(first_file(&[]).is_err());
    }

    fn notarize_args(doc: &Path, signer: &str) -> NotarizeArgs {
        NotarizeArgs {
            files: vec![doc.to_path_buf()],
            signer: Some(signer.into()),
        }
    }

    #[tokio::test]
    async fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path());
        let doc = dir.path().join("doc.txt");
        std::fs::write(&doc, b"hello").unwrap();

        cmd_init(&ctx, InitArgs { force: false }).unwrap();
        cmd_notarize(&ctx, notarize_args(&doc, "0xABC")).await.unwrap();
        assert!(cmd_init(&ctx, InitArgs { force: false }).is_err());

        cmd_init(&ctx, InitArgs { force: true }).unwrap();
        assert_eq!(LedgerSnapshot::load(&ctx.ledger_path).unwrap().head, 0);
    }

    #[tokio::test]
    async fn concurrent_notarizations_all_persist() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path());
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        std::fs::write(&a, b"first").unwrap();
        std::fs::write(&b, b"second").unwrap();
        cmd_init(&ctx, InitArgs { force: false }).unwrap();

        let (ra, rb) = tokio::join!(
            cmd_notarize(&ctx, notarize_args(&a, "0xA")),
            cmd_notarize(&ctx, notarize_args(&b, "0xB")),
        );
        ra.unwrap();
        rb.unwrap();

        let snapshot = LedgerSnapshot::load(&ctx.ledger_path).unwrap();
        assert_eq!(snapshot.events.len(), 2);
        assert_eq!(snapshot.head, 2);
    }

    #[test]
    fn commands_need_an_initialized_ledger() {
        let dir = tempfile::tempdir().unwrap();
        assert!(open_ledger(&ctx(dir.path())).is_err());
    }

    #[tokio::test]
    async fn notarize_persists_entry() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path());
        let doc = dir.path().join("doc.txt");
        std::fs::write(&doc, b"hello").unwrap();

        cmd_init(&ctx, InitArgs { force: false }).unwrap();
        cmd_notarize(&ctx, notarize_args(&doc, "0xABC")).await.unwrap();

        let ledger = open_ledger(&ctx).unwrap();
        let notary = Notary::new(ledger.clone(), notary_sdk::NotaryConfig::default());
        let filter = SearchFilter::new().by_signer("0xABC");
        let entries = notary
            .search_range(&filter, EventRange::through(1))
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].document_hash.as_str(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
