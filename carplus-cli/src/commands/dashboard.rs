//! Dashboard command - the home screen summary

use anyhow::Result;
use chrono::Local;
use colored::Colorize;

use super::appointment::print_appointments;
use super::get_context;
use crate::output::format_money;

pub fn run(limit: Option<usize>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let limit = limit.unwrap_or(ctx.config.upcoming_limit);
    let dashboard = ctx
        .stats_service
        .dashboard(Local::now().naive_local(), limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    let totals = &dashboard.totals;
    println!("{}", "CarPlus".bold());
    println!(
        "  {} appointments, {} revenue, {} products",
        totals.appointment_count,
        format_money(totals.total_revenue),
        totals.product_count
    );
    match &dashboard.top_service {
        Some(service) => println!(
            "  Top service: {} ({})",
            service.cyan(),
            dashboard.top_service_count
        ),
        None => println!("  Top service: -"),
    }
    println!();

    println!("{}", "Upcoming".bold());
    print_appointments(&dashboard.upcoming, false)
}
