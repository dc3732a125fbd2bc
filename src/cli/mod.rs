//! CLI command handlers

pub mod commands;

pub use commands::{
    clients, consolidate, export, import, layout, rankings, sales_set, sales_show,
    sales_uniform, show, watch, CliContext,
};
