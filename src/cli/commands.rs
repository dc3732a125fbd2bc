use crate::core::report::{self, format_amount, Kpis, PlRow, RankingEntry, RowKind};
use crate::error::{BudgetError, BudgetResult};
use crate::excel::BudgetExporter;
use crate::layout::TemplateLayout;
use crate::session::Session;
use crate::store::SnapshotStore;
use crate::types::{SalesVector, MONTH_LABELS};
use colored::{ColoredString, Colorize};
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

const LABEL_WIDTH: usize = 44;
const AMOUNT_WIDTH: usize = 18;

/// Where snapshots live and which template layout to apply
#[derive(Debug, Clone)]
pub struct CliContext {
    pub store: PathBuf,
    pub layout: Option<PathBuf>,
}

impl CliContext {
    pub fn new(store: PathBuf, layout: Option<PathBuf>) -> Self {
        Self { store, layout }
    }

    /// The layout file if one was given, else the built-in template
    pub fn load_layout(&self) -> BudgetResult<TemplateLayout> {
        match &self.layout {
            Some(path) => TemplateLayout::from_yaml_file(path),
            None => Ok(TemplateLayout::default()),
        }
    }

    pub fn open_session(&self) -> BudgetResult<Session> {
        Session::open(SnapshotStore::new(&self.store), self.load_layout()?)
    }
}

/// Right-aligned amount, red when negative
fn amount(value: f64) -> ColoredString {
    let text = format!("{:>width$}", format_amount(value), width = AMOUNT_WIDTH);
    if value < 0.0 {
        text.red()
    } else {
        text.normal()
    }
}

fn percent(value: f64) -> String {
    format!("{:>9}", format!("{:.2}%", value))
}

fn print_kpis(kpis: &Kpis) {
    println!("{}", "📈 Key Figures:".bold().cyan());
    println!("   {:<24}{}", "Revenue", amount(kpis.revenue));
    println!(
        "   {:<24}{} {}",
        "Gross margin",
        amount(kpis.gross_margin),
        percent(kpis.gross_margin_pct)
    );
    println!("   {:<24}{}", "Direct costs", amount(kpis.direct_costs));
    println!(
        "   {:<24}{}",
        "Operating expenses",
        amount(kpis.operating_expenses)
    );
    println!(
        "   {:<24}{} {}",
        "Net result",
        amount(kpis.net_result),
        percent(kpis.operating_margin_pct)
    );
    if kpis.profitable {
        println!("   {}", "✅ Profitable".green());
    } else {
        println!("   {}", "⚠️  Loss-making".red());
    }
    println!();
}

fn print_rows(rows: &[PlRow]) {
    println!(
        "   {:<width$}{:>amount_width$} {:>9}",
        "Concept",
        "Total",
        "%",
        width = LABEL_WIDTH,
        amount_width = AMOUNT_WIDTH
    );
    println!("   {}", "─".repeat(LABEL_WIDTH + AMOUNT_WIDTH + 10));
    for row in rows {
        let indent = match row.kind {
            RowKind::Subcategory | RowKind::Detail => "   ",
            _ => "",
        };
        let label = format!("{}{}", indent, row.label);
        let label = format!("{:<width$}", label, width = LABEL_WIDTH);
        let label = match row.kind {
            RowKind::Category | RowKind::Subtotal => label.bold(),
            RowKind::Result => label.bold().bright_blue(),
            RowKind::FinalResult if row.total < 0.0 => label.bold().red(),
            RowKind::FinalResult => label.bold().green(),
            _ => label.normal(),
        };
        let pct = row.percentage.map(percent).unwrap_or_default();
        println!("   {}{} {}", label, amount(row.total), pct);
    }
    println!();
}

fn print_ranking(title: &str, entries: &[RankingEntry]) {
    println!("{}", title.bold().cyan());
    if entries.is_empty() {
        println!("   (none)\n");
        return;
    }
    for entry in entries {
        let bar = "█".repeat((entry.bar.clamp(0.0, 100.0) / 5.0).round() as usize);
        println!(
            "   {:>2}. {:<36}{} {} {}",
            entry.position,
            entry.name,
            amount(entry.total),
            percent(entry.share),
            bar.bright_blue()
        );
    }
    println!();
}

/// Execute the import command
pub fn import(ctx: &CliContext, file: PathBuf, verbose: bool) -> BudgetResult<()> {
    println!("{}", "📊 Budget Lens - Import".bold().green());
    println!("   File:  {}", file.display());
    println!("   Store: {}\n", ctx.store.display());

    let mut session = ctx.open_session()?;
    if verbose {
        println!(
            "{}",
            format!("📖 Reading sheet '{}'...", session.layout().sheet_name).cyan()
        );
    }

    let snapshot = session.import_file(&file)?;
    let model = &snapshot.model;

    if verbose {
        println!("   Found {} clients", model.revenue.clients.len());
        println!("   Found {} direct cost lines", model.direct_costs.items.len());
        println!(
            "   Found {} operating expense lines\n",
            model.operating_expenses.lines().count()
        );
    }

    println!("{}", "✅ Import Complete!".bold().green());
    println!(
        "   Saved at {}\n",
        snapshot.saved_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    print_kpis(&Kpis::from_model(model));
    Ok(())
}

/// Execute the show command - KPIs plus summary or detailed P&L
pub fn show(ctx: &CliContext, detailed: bool) -> BudgetResult<()> {
    let session = ctx.open_session()?;
    let snapshot = session.snapshot().ok_or(BudgetError::NoBudget)?;

    println!("{}", "📊 Budget Lens - Profit & Loss".bold().green());
    println!(
        "   Imported: {}\n",
        snapshot.saved_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    print_kpis(&Kpis::from_model(&snapshot.model));
    let rows = if detailed {
        report::detailed_rows(&snapshot.model)
    } else {
        report::summary_rows(&snapshot.model)
    };
    print_rows(&rows);
    Ok(())
}

/// Execute the clients command
pub fn clients(ctx: &CliContext) -> BudgetResult<()> {
    let session = ctx.open_session()?;
    let model = session.require_budget()?;

    println!("{}", "👥 Budget Lens - Clients".bold().green());
    println!("   {} clients\n", model.revenue.clients.len());

    for row in report::client_table(model) {
        println!(
            "   {:>3}. {:<36}{} {}",
            row.rank,
            row.name,
            amount(row.total),
            percent(row.share)
        );
    }
    println!();
    println!(
        "   {:<41}{}",
        "Total revenue".bold(),
        amount(model.revenue.annual)
    );
    println!();
    Ok(())
}

/// Execute the rankings command
pub fn rankings(ctx: &CliContext, limit: usize) -> BudgetResult<()> {
    let session = ctx.open_session()?;
    let rankings = report::rankings(session.require_budget()?, limit);

    println!("{}", "🏆 Budget Lens - Rankings".bold().green());
    println!("   Top {}\n", limit);
    print_ranking("Clients by share of revenue:", &rankings.clients);
    print_ranking("Expenses by share of spend:", &rankings.expenses);
    Ok(())
}

fn print_sales(sales: &SalesVector) {
    for (label, value) in MONTH_LABELS.iter().zip(sales.values()) {
        println!("   {:<6}{}", label, amount(*value));
    }
    println!("   {:<6}{}\n", "Total".bold(), amount(sales.total()));
}

/// Execute the sales show command
pub fn sales_show(ctx: &CliContext) -> BudgetResult<()> {
    let session = ctx.open_session()?;
    println!("{}", "🛒 Budget Lens - Product Sales".bold().green());
    print_sales(session.sales());
    Ok(())
}

/// Execute the sales set command with twelve monthly values
pub fn sales_set(ctx: &CliContext, values: Vec<f64>) -> BudgetResult<()> {
    let sales = SalesVector::from_slice(&values)?;
    let mut session = ctx.open_session()?;
    session.set_sales(sales)?;

    println!("{}", "✅ Product sales updated".bold().green());
    print_sales(session.sales());
    Ok(())
}

/// Execute the sales uniform command
pub fn sales_uniform(ctx: &CliContext, value: f64) -> BudgetResult<()> {
    if !value.is_finite() {
        return Err(BudgetError::Validation(format!(
            "Sales value must be a finite number, got {}",
            value
        )));
    }
    let mut session = ctx.open_session()?;
    session.set_sales_uniform(value)?;

    println!("{}", "✅ Product sales updated".bold().green());
    print_sales(session.sales());
    Ok(())
}

/// Execute the consolidate command
pub fn consolidate(ctx: &CliContext) -> BudgetResult<()> {
    let session = ctx.open_session()?;
    let pnl = session.consolidated()?;

    println!("{}", "🧮 Budget Lens - Consolidated P&L".bold().green());
    println!(
        "   Product sales: {} at {:.0}% margin\n",
        format_amount(pnl.product_sales.annual),
        pnl.margin_rate * 100.0
    );
    print_rows(&report::consolidated_rows(&pnl));
    Ok(())
}

/// Execute the export command; the format follows the output extension
pub fn export(ctx: &CliContext, output: PathBuf, verbose: bool) -> BudgetResult<()> {
    println!("{}", "🔥 Budget Lens - Export".bold().green());
    println!("   Output: {}\n", output.display());

    let session = ctx.open_session()?;
    let ext = output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "xlsx" => {
            if verbose {
                println!("{}", "📊 Writing workbook...".cyan());
            }
            BudgetExporter::new(session.require_budget()?.clone())
                .with_consolidated(session.consolidated()?)
                .export(&output)?;
        }
        "json" => {
            if verbose {
                println!("{}", "💾 Writing JSON...".cyan());
            }
            let json = serde_json::to_string_pretty(&session.dashboard()?)?;
            fs::write(&output, json)?;
        }
        "yaml" | "yml" => {
            if verbose {
                println!("{}", "💾 Writing YAML...".cyan());
            }
            let yaml = serde_yaml::to_string(&session.dashboard()?)?;
            fs::write(&output, yaml)?;
        }
        _ => {
            return Err(BudgetError::Validation(format!(
                "Unsupported export format for {} (use .xlsx, .json or .yaml)",
                output.display()
            )))
        }
    }

    println!("{}", "✅ Export Complete!".bold().green());
    println!("   File: {}\n", output.display());
    Ok(())
}

/// Execute the layout command - print or write the effective layout
pub fn layout(ctx: &CliContext, output: Option<PathBuf>) -> BudgetResult<()> {
    let layout = ctx.load_layout()?;
    layout.validate()?;
    let yaml = layout.to_yaml()?;

    match output {
        Some(path) => {
            fs::write(&path, yaml)?;
            println!("{}", "✅ Layout written".bold().green());
            println!("   File: {}\n", path.display());
        }
        None => print!("{}", yaml),
    }
    Ok(())
}

/// Execute the watch command - re-import the workbook whenever it changes
pub fn watch(ctx: &CliContext, file: PathBuf, verbose: bool) -> BudgetResult<()> {
    println!("{}", "👁️  Budget Lens - Watch Mode".bold().green());
    println!("   Watching: {}", file.display());
    println!("   Press {} to stop\n", "Ctrl+C".bold().yellow());

    if !file.exists() {
        return Err(BudgetError::Validation(format!(
            "File not found: {}",
            file.display()
        )));
    }

    let canonical_path = file.canonicalize()?;
    let parent_dir = canonical_path
        .parent()
        .ok_or_else(|| BudgetError::Validation("Cannot determine parent directory".to_string()))?;

    let mut session = ctx.open_session()?;
    let (tx, rx) = channel();

    // spreadsheet editors write in several steps; collapse them into one event
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)
        .map_err(|e| BudgetError::Validation(format!("Failed to create file watcher: {}", e)))?;
    debouncer
        .watcher()
        .watch(parent_dir, RecursiveMode::NonRecursive)
        .map_err(|e| BudgetError::Validation(format!("Failed to watch directory: {}", e)))?;

    if verbose {
        println!(
            "   {} {}",
            "Watching directory:".cyan(),
            parent_dir.display()
        );
    }

    println!("{}", "🔄 Initial import...".cyan());
    run_watch_import(&mut session, &file, verbose);
    println!();

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant = events.iter().any(|event| {
                    event.kind == DebouncedEventKind::Any && is_watched(&event.path, &canonical_path)
                });
                if relevant {
                    println!(
                        "\n{} {}",
                        "🔄 Change detected at".cyan(),
                        chrono::Local::now().format("%H:%M:%S").to_string().cyan()
                    );
                    run_watch_import(&mut session, &file, verbose);
                    println!();
                }
            }
            Ok(Err(error)) => {
                eprintln!("{} Watch error: {}", "❌".red(), error);
            }
            Err(e) => {
                eprintln!("{} Channel error: {}", "❌".red(), e);
                break;
            }
        }
    }

    Ok(())
}

fn is_watched(path: &Path, canonical_path: &Path) -> bool {
    if let Ok(event_canonical) = path.canonicalize() {
        if event_canonical == canonical_path {
            return true;
        }
    }
    match (path.file_name(), canonical_path.file_name()) {
        (Some(changed), Some(ours)) => changed == ours,
        _ => false,
    }
}

fn run_watch_import(session: &mut Session, file: &Path, verbose: bool) {
    match session.import_file(file) {
        Ok(snapshot) => {
            println!("{}", "✅ Budget reloaded".bold().green());
            if verbose {
                println!("   {} clients", snapshot.model.revenue.clients.len());
            }
            print_kpis(&Kpis::from_model(&snapshot.model));
        }
        Err(e) => println!(
            "{} {} (keeping the previous budget)",
            "❌ Import failed:".bold().red(),
            e
        ),
    }
}
