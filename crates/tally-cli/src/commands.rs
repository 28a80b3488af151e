use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use tally_gate::GateConfig;
use tally_ledger::{format_amount, Ledger, LedgerConfig, LedgerError};
use tally_types::{Decimal, TransactionRecord, TransactionStatus};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref(), cli.data_dir)?;
    let format = cli.format;
    match cli.command {
        Command::CreateAccount(args) => with_ledger(config, |l| cmd_create_account(l, args, format)),
        Command::Deposit(args) => with_ledger(config, |l| {
            let record = l.deposit(&args.name, args.amount)?;
            print_record(&record, format)
        }),
        Command::Withdraw(args) => with_ledger(config, |l| {
            let record = l.withdraw(&args.name, args.amount)?;
            print_record(&record, format)
        }),
        Command::Transfer(args) => with_ledger(config, |l| cmd_transfer(l, args, format)),
        Command::Balance(args) => with_ledger(config, |l| {
            let account = l.get_account(&args.name)?;
            match format {
                OutputFormat::Json => print_json(&account),
                OutputFormat::Text => {
                    println!("{account}");
                    Ok(())
                }
            }
        }),
        Command::Summary(_) => with_ledger(config, |l| {
            let summary = l.summary()?;
            match format {
                OutputFormat::Json => print_json(&summary),
                OutputFormat::Text => {
                    println!("{summary}");
                    Ok(())
                }
            }
        }),
        Command::History(args) => with_ledger(config, |l| cmd_history(l, args, format)),
        Command::Audit(_) => with_ledger(config, |l| cmd_audit(l, format)),
        Command::Demo(args) => cmd_demo(config, args),
    }
}

/// Config file first, then command-line overrides.
fn load_config(path: Option<&Path>, data_dir: Option<PathBuf>) -> anyhow::Result<LedgerConfig> {
    let mut config = match path {
        Some(path) => LedgerConfig::load(path)?,
        None => LedgerConfig::default(),
    };
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    Ok(config)
}

fn with_ledger(
    config: LedgerConfig,
    run: impl FnOnce(&Ledger) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    let data_dir = config.data_dir.clone();
    let ledger = Ledger::open(config)
        .with_context(|| format!("failed to open ledger in {}", data_dir.display()))?;
    let outcome = run(&ledger);
    ledger.shutdown()?;
    outcome
}

fn cmd_create_account(ledger: &Ledger, args: CreateAccountArgs, format: OutputFormat) -> anyhow::Result<()> {
    let record = ledger.create_account(&args.name, args.opening_balance, args.currency.as_deref())?;
    match format {
        OutputFormat::Json => print_json(&record),
        OutputFormat::Text => {
            println!(
                "{} Opened account no. {} for {}",
                "✓".green().bold(),
                record.account_id.map(|id| id.to_string()).unwrap_or_default().yellow(),
                record.display_name.bold()
            );
            println!("  Balance: {} ${}", record.currency, format_amount(record.resulting_balance));
            Ok(())
        }
    }
}

fn cmd_transfer(ledger: &Ledger, args: TransferArgs, format: OutputFormat) -> anyhow::Result<()> {
    let transfer = ledger.transfer(&args.source, &args.target, args.amount)?;
    match format {
        OutputFormat::Json => print_json(&transfer),
        OutputFormat::Text => {
            println!(
                "{} Transferred {} ${} from {} to {}",
                "✓".green().bold(),
                transfer.debit.currency,
                format_amount(args.amount),
                args.source.bold(),
                args.target.bold()
            );
            if let Some(reference) = transfer.reference_number() {
                println!("  Reference: {}", reference.to_string().yellow());
            }
            println!(
                "  {}: {} ${}",
                args.source,
                transfer.debit.currency,
                format_amount(transfer.debit.resulting_balance)
            );
            println!(
                "  {}: {} ${}",
                args.target,
                transfer.credit.currency,
                format_amount(transfer.credit.resulting_balance)
            );
            Ok(())
        }
    }
}

fn cmd_history(ledger: &Ledger, args: HistoryArgs, format: OutputFormat) -> anyhow::Result<()> {
    let history = match &args.name {
        Some(name) => ledger.history(name)?,
        None => ledger.system_transactions()?,
    };
    let mut records = history.collect::<Result<Vec<_>, _>>()?;
    if let Some(limit) = args.limit {
        let skip = records.len().saturating_sub(limit);
        records.drain(..skip);
    }

    match format {
        OutputFormat::Json => print_json(&records),
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No transactions.");
            }
            for record in &records {
                print_row(record);
            }
            Ok(())
        }
    }
}

fn cmd_audit(ledger: &Ledger, format: OutputFormat) -> anyhow::Result<()> {
    let audit = ledger.audit_transfers()?;
    match format {
        OutputFormat::Json => print_json(&audit),
        OutputFormat::Text => {
            if audit.is_consistent() {
                println!(
                    "{} {} transfer legs checked, all paired",
                    "✓".green().bold(),
                    audit.legs_checked
                );
            } else {
                println!(
                    "{} {} of {} transfer legs unmatched",
                    "✗".red().bold(),
                    audit.unmatched.len(),
                    audit.legs_checked
                );
                for leg in &audit.unmatched {
                    println!(
                        "  #{} {} {} {}: {}",
                        leg.transaction_id,
                        leg.display_name.bold(),
                        leg.kind,
                        leg.amount,
                        leg.reason.yellow()
                    );
                }
            }
            Ok(())
        }
    }
}

/// The walkthrough: three customers, a restart from the logs, and more
/// activity on the recovered state.
fn cmd_demo(mut config: LedgerConfig, args: DemoArgs) -> anyhow::Result<()> {
    if args.fast {
        config.gate = GateConfig::immediate();
    }
    let started = Instant::now();

    {
        let bank = Ledger::open(config.clone())?;
        attempt(bank.create_account("Ben", Decimal::new(1000, 0), None))?;
        attempt(bank.create_account("Ricky", Decimal::new(500, 0), None))?;
        attempt(bank.get_account("Victor"))?;
        show(&bank, "Initial state")?;

        attempt(bank.deposit("Ben", Decimal::new(500, 0)))?;
        show(&bank, "After Ben deposits 500")?;

        attempt(bank.withdraw("Ricky", Decimal::new(200, 0)))?;
        show(&bank, "After Ricky withdraws 200")?;

        attempt(bank.create_account("Victor", Decimal::new(250005, 1), None))?;
        show(&bank, "After Victor opens an account")?;

        attempt(bank.transfer("Ben", "Ricky", Decimal::new(300, 0)))?;
        show(&bank, "After Ben transfers 300 to Ricky")?;

        attempt(bank.transfer("Victor", "Ricky", Decimal::new(100052, 2)))?;
        show(&bank, "After Victor transfers 1000.52 to Ricky")?;

        bank.shutdown()?;
    }

    println!("\n{}", "Restarting from the logs...".bold());
    let bank = Ledger::open(config)?;
    show(&bank, "Initial state again")?;

    attempt(bank.withdraw("Ben", Decimal::new(1000, 0)))?;
    show(&bank, "After Ben withdraws 1000")?;

    attempt(bank.transfer("Victor", "Ben", Decimal::new(50, 0)))?;
    show(&bank, "After Victor transfers 50 to Ben")?;

    for name in ["Ben", "Victor"] {
        println!("\n{}", format!("{name}'s transactions:").bold());
        for record in bank.history(name)? {
            print_row(&record?);
        }
    }
    bank.shutdown()?;

    println!("\nElapsed: {:.2}s", started.elapsed().as_secs_f64());
    Ok(())
}

/// Print a refused operation and carry on. Storage and lock failures still abort.
fn attempt<T>(outcome: Result<T, LedgerError>) -> anyhow::Result<()> {
    match outcome {
        Ok(_) => Ok(()),
        Err(e @ (LedgerError::Store(_) | LedgerError::LockPoisoned | LedgerError::Gate(_))) => Err(e.into()),
        Err(e) => {
            println!("{} {e}", "✗".red());
            Ok(())
        }
    }
}

fn show(ledger: &Ledger, title: &str) -> anyhow::Result<()> {
    println!("\n{}", format!("{title}:").bold());
    println!("{}", ledger.summary()?);
    Ok(())
}

fn print_record(record: &TransactionRecord, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(record),
        OutputFormat::Text => {
            print_row(record);
            Ok(())
        }
    }
}

fn print_row(record: &TransactionRecord) {
    let mark = match record.status {
        TransactionStatus::Completed => "✓".green(),
        TransactionStatus::Failed => "✗".red(),
    };
    let reference = record
        .reference_number
        .map(|r| format!("ref {r}"))
        .unwrap_or_else(|| "no ref".to_string());
    let counterparty = record
        .counterparty
        .as_ref()
        .map(|c| format!(" ({} no. {})", c.display_name, c.account_id))
        .unwrap_or_default();

    println!(
        "{mark} #{:<5} {} {:<14} {} ${:>12} -> ${:>12}  {}{counterparty}",
        record.transaction_id,
        record.completed_at.format("%Y-%m-%d %H:%M:%S"),
        record.kind.as_str().cyan(),
        record.currency,
        format_amount(record.amount),
        format_amount(record.resulting_balance),
        reference.dimmed(),
    );
    if let Some(remarks) = &record.remarks {
        println!("    {}", remarks.yellow());
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
