//! Stats command - business totals

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output::{create_table, format_money};

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let totals = ctx.stats_service.totals()?;
    let top_service = ctx.stats_service.top_service()?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "appointment_count": totals.appointment_count,
                "total_revenue": totals.total_revenue,
                "product_count": totals.product_count,
                "top_service": top_service,
            })
        );
        return Ok(());
    }

    println!("{}", "Business Totals".bold());
    println!();

    let mut table = create_table();
    table.add_row(vec!["Appointments".to_string(), totals.appointment_count.to_string()]);
    table.add_row(vec!["Revenue".to_string(), format_money(totals.total_revenue)]);
    table.add_row(vec!["Products".to_string(), totals.product_count.to_string()]);
    table.add_row(vec![
        "Top service".to_string(),
        top_service.unwrap_or_else(|| "-".to_string()),
    ]);
    println!("{}", table);

    Ok(())
}
