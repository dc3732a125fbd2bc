use budget_lens::cli::{self, CliContext};
use budget_lens::core::report::DEFAULT_RANKING_LIMIT;
use budget_lens::error::BudgetResult;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "budget-lens")]
#[command(about = "Annual budget workbooks as a structured P&L")]
#[command(long_about = "Budget Lens - structured P&L from a budget workbook

Imports the 'Presupuesto 2026' worksheet of an .xlsx/.xls budget, extracts
clients, direct costs, operating expenses and P&L totals, and blends them
with monthly product sales (30% margin) into a consolidated P&L.

COMMANDS:
  import       - Import a budget workbook
  show         - KPIs and P&L of the current budget
  clients      - Client revenue table
  rankings     - Top clients and expenses
  sales        - Show or set monthly product sales
  consolidate  - Budget + product sales P&L
  export       - Write .xlsx, .json or .yaml
  watch        - Re-import a workbook whenever it changes
  layout       - Print the template layout as YAML

EXAMPLES:
  budget-lens import presupuesto.xlsx
  budget-lens show --detailed
  budget-lens sales uniform 5000
  budget-lens consolidate
  budget-lens export report.xlsx")]
#[command(version)]
struct Cli {
    /// Directory holding the saved budget and sales snapshots
    #[arg(long, global = true, env = "BUDGET_LENS_STORE", default_value = ".budget-lens")]
    store: PathBuf,

    /// Template layout YAML overriding the built-in row/column positions
    #[arg(long, global = true, env = "BUDGET_LENS_LAYOUT")]
    layout: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a budget workbook and make it the current budget
    #[command(long_about = "Import a budget workbook (.xlsx or .xls).

The worksheet whose name contains the layout's sheet name is used, the
first sheet otherwise. On failure the previously imported budget is kept.")]
    Import {
        /// Path to the workbook
        file: PathBuf,

        /// Show extraction details
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show KPIs and the P&L of the current budget
    Show {
        /// Detailed P&L: top clients, cost lines and expense categories
        #[arg(short, long)]
        detailed: bool,
    },

    /// List clients with their share of revenue
    Clients,

    /// Rank clients and expenses by share
    Rankings {
        /// Number of entries per list
        #[arg(short = 'n', long, default_value_t = DEFAULT_RANKING_LIMIT)]
        limit: usize,
    },

    /// Show or change the monthly product sales
    Sales {
        #[command(subcommand)]
        action: SalesAction,
    },

    /// Show the budget blended with product sales
    Consolidate,

    /// Export the current budget (.xlsx, .json or .yaml)
    Export {
        /// Output file; the extension picks the format
        output: PathBuf,

        /// Show export steps
        #[arg(short, long)]
        verbose: bool,
    },

    /// Watch a workbook and re-import it on every change
    Watch {
        /// Path to the workbook
        file: PathBuf,

        /// Show watcher details
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the effective template layout as YAML
    Layout {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SalesAction {
    /// Print the current sales vector
    Show,

    /// Set all twelve months (Jan..Dec)
    Set {
        #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
        values: Vec<f64>,
    },

    /// Set every month to the same value
    Uniform {
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
}

fn main() -> BudgetResult<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "budget_lens=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let ctx = CliContext::new(cli.store, cli.layout);

    match cli.command {
        Commands::Import { file, verbose } => cli::import(&ctx, file, verbose),

        Commands::Show { detailed } => cli::show(&ctx, detailed),

        Commands::Clients => cli::clients(&ctx),

        Commands::Rankings { limit } => cli::rankings(&ctx, limit),

        Commands::Sales { action } => match action {
            SalesAction::Show => cli::sales_show(&ctx),
            SalesAction::Set { values } => cli::sales_set(&ctx, values),
            SalesAction::Uniform { value } => cli::sales_uniform(&ctx, value),
        },

        Commands::Consolidate => cli::consolidate(&ctx),

        Commands::Export { output, verbose } => cli::export(&ctx, output, verbose),

        Commands::Watch { file, verbose } => cli::watch(&ctx, file, verbose),

        Commands::Layout { output } => cli::layout(&ctx, output),
    }
}
