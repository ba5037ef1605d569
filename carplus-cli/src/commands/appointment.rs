//! Appointment command - bookings

use anyhow::Result;
use chrono::Local;
use clap::{Args, Subcommand};
use colored::Colorize;

use super::{confirm, get_context};
use crate::output::{create_table, format_money, success, warning};
use carplus_core::services::ConsumptionReport;
use carplus_core::{Appointment, AppointmentInput, Error};

/// Fields shared by `add` and `edit`
#[derive(Args)]
pub struct AppointmentFields {
    #[arg(long)]
    client: Option<String>,
    #[arg(long)]
    address: Option<String>,
    /// Date and time as "YYYY-MM-DD HH:MM"
    #[arg(long, short = 'd')]
    datetime: Option<String>,
    #[arg(long)]
    service: Option<String>,
    #[arg(long)]
    price: Option<f64>,
    /// Products used, e.g. "Shampoo:1,Wax:0.5"
    #[arg(long, short = 'c')]
    consumption: Option<String>,
}

impl AppointmentFields {
    fn merge_into(self, base: AppointmentInput) -> AppointmentInput {
        AppointmentInput {
            client: self.client.unwrap_or(base.client),
            address: self.address.unwrap_or(base.address),
            datetime: self.datetime.unwrap_or(base.datetime),
            service: self.service.unwrap_or(base.service),
            price: self.price.unwrap_or(base.price),
            consumption: self.consumption.unwrap_or(base.consumption),
        }
    }
}

#[derive(Subcommand)]
pub enum AppointmentCommands {
    /// List appointments in date order
    List {
        /// Only clients or addresses containing this text
        #[arg(long, short = 's')]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Appointments from now on
    Upcoming {
        #[arg(long, short = 'n')]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one appointment
    Show {
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Book an appointment and take its consumption out of stock
    Add {
        #[command(flatten)]
        fields: AppointmentFields,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change an appointment; stock is not recalculated
    Edit {
        id: i64,
        #[command(flatten)]
        fields: AppointmentFields,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an appointment; consumed stock is not given back
    Delete {
        id: i64,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: AppointmentCommands) -> Result<()> {
    match command {
        AppointmentCommands::List { search, json } => {
            let ctx = get_context()?;
            let appointments = ctx.appointment_service.list(search.as_deref())?;
            print_appointments(&appointments, json)?;
        }
        AppointmentCommands::Upcoming { limit, json } => {
            let ctx = get_context()?;
            let limit = limit.unwrap_or(ctx.config.upcoming_limit);
            let now = Local::now().naive_local();
            let appointments = ctx.appointment_service.list_upcoming(now, limit)?;
            print_appointments(&appointments, json)?;
        }
        AppointmentCommands::Show { id, json } => {
            let ctx = get_context()?;
            let appointment = ctx.appointment_service.get(id)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&appointment)?);
            } else {
                println!("{}", format!("Appointment {}", appointment.id).bold());
                println!("  Client:      {}", appointment.client);
                println!("  Address:     {}", appointment.address);
                println!("  When:        {}", appointment.datetime);
                println!("  Service:     {}", appointment.service);
                println!("  Price:       {}", format_money(appointment.price));
                println!("  Consumption: {}", appointment.consumption);
            }
        }
        AppointmentCommands::Add { fields, json } => {
            let ctx = get_context()?;
            let input = fields.merge_into(AppointmentInput::default());
            let added = ctx.appointment_service.add_with_report(&input)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&added)?);
            } else {
                success(&format!("Appointment added (id {})", added.id));
                print_consumption(&added.consumption);
            }
        }
        AppointmentCommands::Edit { id, fields, json } => {
            let ctx = get_context()?;
            let current = ctx.appointment_service.get(id)?;
            let input = fields.merge_into(AppointmentInput {
                client: current.client,
                address: current.address,
                datetime: current.datetime,
                service: current.service,
                price: current.price,
                consumption: current.consumption,
            });
            ctx.appointment_service.update(id, &input)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&ctx.appointment_service.get(id)?)?);
            } else {
                success(&format!("Appointment {} updated", id));
            }
        }
        AppointmentCommands::Delete { id, force, json } => {
            let ctx = get_context()?;
            let appointment = match ctx.appointment_service.get(id) {
                Ok(appointment) => appointment,
                Err(Error::NotFound(_)) => {
                    if json {
                        println!("{}", serde_json::json!({ "deleted": false }));
                    } else {
                        println!("No appointment with id {}.", id);
                    }
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            let prompt = format!(
                "Delete appointment for '{}' on {}?",
                appointment.client, appointment.datetime
            );
            if !confirm(&prompt, force || json)? {
                return Ok(());
            }
            ctx.appointment_service.delete(id)?;

            if json {
                println!("{}", serde_json::json!({ "deleted": true }));
            } else {
                success(&format!("Appointment {} deleted", id));
            }
        }
    }

    Ok(())
}

pub fn print_appointments(appointments: &[Appointment], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(appointments)?);
        return Ok(());
    }
    if appointments.is_empty() {
        println!("No appointments found.");
        return Ok(());
    }

    let mut table = create_table();
    table.set_header(vec!["ID", "When", "Client", "Address", "Service", "Price"]);

    for a in appointments {
        let when = if a.scheduled_at().is_some() {
            a.datetime.clone()
        } else {
            a.datetime.dimmed().to_string()
        };
        table.add_row(vec![
            a.id.to_string(),
            when,
            a.client.clone(),
            a.address.clone(),
            a.service.clone(),
            format_money(a.price),
        ]);
    }

    println!("{}", table);
    Ok(())
}

fn print_consumption(report: &ConsumptionReport) {
    if !report.applied.is_empty() {
        println!("  Stock updated: {}", report.applied.join(", "));
    }
    if !report.unknown_products.is_empty() {
        warning(&format!(
            "  Unknown products ignored: {}",
            report.unknown_products.join(", ")
        ));
    }
    for skipped in &report.skipped {
        warning(&format!("  Entry '{}' ignored", skipped.raw));
    }
    if !report.failed.is_empty() {
        warning(&format!(
            "  Stock could not be updated for: {}",
            report.failed.join(", ")
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_unset_fields() {
        let fields = AppointmentFields {
            client: None,
            address: None,
            datetime: Some("2025-03-01 10:00".to_string()),
            service: None,
            price: None,
            consumption: None,
        };
        let base = AppointmentInput {
            client: "Rossi".to_string(),
            address: "Via Roma 1".to_string(),
            datetime: "2025-02-01 09:00".to_string(),
            service: "Lavaggio".to_string(),
            price: 30.0,
            consumption: "Shampoo:1".to_string(),
        };

        let merged = fields.merge_into(base);
        assert_eq!(merged.client, "Rossi");
        assert_eq!(merged.datetime, "2025-03-01 10:00");
        assert_eq!(merged.consumption, "Shampoo:1");
        assert!(chrono::NaiveDateTime::parse_from_str(&merged.datetime, carplus_core::DATETIME_FORMAT).is_ok());
    }
}
