//! Budget Lens API Server binary
//!
//! HTTP JSON API serving the current budget and its derived views.

use std::path::PathBuf;

use budget_lens::api::{run_api_server, ApiConfig};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "budget-lens-server")]
#[command(version)]
#[command(about = "Budget Lens API Server - budget, sales and consolidated P&L over HTTP")]
#[command(long_about = r#"
Budget Lens API Server

Endpoints:
  - GET  /api/v1/budget        - Current budget snapshot
  - POST /api/v1/import        - Import a workbook {"filePath": "..."}
  - GET  /api/v1/sales         - Monthly product sales
  - PUT  /api/v1/sales         - Replace product sales {"values": [12 numbers]}
  - GET  /api/v1/consolidated  - Budget blended with product sales
  - GET  /api/v1/kpis          - Key figures
  - GET  /api/v1/rankings      - Top clients and expenses (?limit=N)
  - GET  /api/v1/dashboard     - Everything above in one payload

Additional endpoints:
  - GET  /health               - Health check
  - GET  /version              - Server version info

Example usage:
  budget-lens-server                           # Start on localhost:8080
  budget-lens-server --host 0.0.0.0 --port 3000 --store /var/lib/budget-lens

  curl -X POST http://localhost:8080/api/v1/import \
    -H "Content-Type: application/json" \
    -d '{"filePath": "presupuesto.xlsx"}'
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "BUDGET_LENS_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "BUDGET_LENS_PORT")]
    port: u16,

    /// Directory holding the saved budget and sales snapshots
    #[arg(long, default_value = ".budget-lens", env = "BUDGET_LENS_STORE")]
    store: PathBuf,

    /// Template layout YAML
    #[arg(long, env = "BUDGET_LENS_LAYOUT")]
    layout: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ApiConfig {
        host: args.host,
        port: args.port,
        store: args.store,
        layout: args.layout,
    };

    run_api_server(config).await
}
