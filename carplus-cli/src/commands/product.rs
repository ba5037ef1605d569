//! Product command - inventory records

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Input;

use super::{confirm, get_context};
use crate::output::{create_table, format_money, format_qty, success};
use carplus_core::{Error, Product, ProductInput};

#[derive(Subcommand)]
pub enum ProductCommands {
    /// List products by name
    List {
        /// Only names containing this text (case-insensitive)
        #[arg(long, short = 's')]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one product
    Show {
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a product
    Add {
        /// Product name (prompted when missing)
        name: Option<String>,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        qty: f64,
        /// Price per unit
        #[arg(long, default_value_t = 0.0)]
        price: f64,
        /// Reorder point
        #[arg(long, default_value_t = 0.0)]
        threshold: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change a product; fields not given keep their value
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        qty: Option<f64>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        threshold: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a product
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

pub fn run(command: ProductCommands) -> Result<()> {
    match command {
        ProductCommands::List { search, json } => {
            let ctx = get_context()?;
            let products = ctx.product_service.list(search.as_deref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&products)?);
                return Ok(());
            }
            if products.is_empty() {
                println!("No products found.");
                return Ok(());
            }
            print_products(&products);
        }
        ProductCommands::Show { id, json } => {
            let ctx = get_context()?;
            let product = ctx.product_service.get(id)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&product)?);
            } else {
                print_products(std::slice::from_ref(&product));
            }
        }
        ProductCommands::Add {
            name,
            qty,
            price,
            threshold,
            json,
        } => {
            let name = match name {
                Some(n) => n,
                None => Input::<String>::new().with_prompt("Product name").interact_text()?,
            };
            let ctx = get_context()?;
            let id = ctx
                .product_service
                .add(&ProductInput::new(name, qty, price, threshold))?;

            if json {
                println!("{}", serde_json::json!({ "id": id }));
            } else {
                success(&format!("Product added (id {})", id));
            }
        }
        ProductCommands::Edit {
            id,
            name,
            qty,
            price,
            threshold,
            json,
        } => {
            let ctx = get_context()?;
            let current = ctx.product_service.get(id)?;
            let input = ProductInput::new(
                name.unwrap_or(current.name),
                qty.unwrap_or(current.qty),
                price.unwrap_or(current.unit_price),
                threshold.unwrap_or(current.threshold),
            );
            ctx.product_service.update(id, &input)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&ctx.product_service.get(id)?)?);
            } else {
                success(&format!("Product {} updated", id));
            }
        }
        ProductCommands::Delete { id, force, json } => {
            let ctx = get_context()?;
            let product = match ctx.product_service.get(id) {
                Ok(product) => product,
                Err(Error::NotFound(_)) => {
                    if json {
                        println!("{}", serde_json::json!({ "deleted": false }));
                    } else {
                        println!("No product with id {}.", id);
                    }
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            if !confirm(&format!("Delete product '{}'?", product.name), force || json)? {
                return Ok(());
            }
            ctx.product_service.delete(id)?;

            if json {
                println!("{}", serde_json::json!({ "deleted": true }));
            } else {
                success(&format!("Product '{}' deleted", product.name));
            }
        }
    }

    Ok(())
}

fn print_products(products: &[Product]) {
    let mut table = create_table();
    table.set_header(vec!["ID", "Name", "Qty", "Unit price", "Threshold"]);

    for p in products {
        let qty = if p.is_below_threshold() {
            format_qty(p.qty).red().to_string()
        } else {
            format_qty(p.qty)
        };
        table.add_row(vec![
            p.id.to_string(),
            p.name.clone(),
            qty,
            format_money(p.unit_price),
            format_qty(p.threshold),
        ]);
    }

    println!("{}", table);
}
