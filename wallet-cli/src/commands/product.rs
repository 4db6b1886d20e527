//! Product command - manage the product catalog

use anyhow::Result;
use clap::Subcommand;
use dialoguer::Input;
use rust_decimal::Decimal;
use serde_json::json;

use super::{get_context, login, CredentialArgs};
use crate::output;
use wallet_core::NewProduct;

#[derive(Subcommand)]
pub enum ProductCommands {
    /// Add a product to the catalog
    Add {
        /// Product name
        #[arg(long)]
        name: Option<String>,
        /// Price in the base currency
        #[arg(long)]
        price: Option<Decimal>,
        /// Optional description
        #[arg(long)]
        description: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List every product
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(creds: &CredentialArgs, command: ProductCommands) -> Result<()> {
    match command {
        ProductCommands::Add {
            name,
            price,
            description,
            json,
        } => run_add(creds, name, price, description, json),
        ProductCommands::List { json } => run_list(json),
    }
}

fn run_add(
    creds: &CredentialArgs,
    name: Option<String>,
    price: Option<Decimal>,
    description: Option<String>,
    json: bool,
) -> Result<()> {
    let ctx = get_context()?;
    let caller = login(&ctx, creds)?;

    // Get details interactively if not provided
    let name = match name {
        Some(n) => n,
        None => Input::new().with_prompt("Product name").interact_text()?,
    };
    let price = match price {
        Some(p) => p,
        None => Input::<Decimal>::new().with_prompt("Price").interact_text()?,
    };

    let product = ctx.wallet.add_product(
        &caller,
        NewProduct {
            name,
            price,
            description,
        },
    )?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "id": product.id,
                "message": "Product added",
            }))?
        );
    } else {
        output::success(&format!("Added {} ({})", product.name, product.id));
    }
    Ok(())
}

fn run_list(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let products = ctx.wallet.list_products()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&products)?);
        return Ok(());
    }

    if products.is_empty() {
        println!("No products in the catalog.");
        return Ok(());
    }

    let mut table = output::table(&["ID", "Name", "Price", "Description"]);
    for product in products {
        table.add_row(vec![
            product.id.to_string(),
            product.name,
            output::money(product.price, ctx.wallet.base_currency()),
            product.description.unwrap_or_default(),
        ]);
    }
    println!("{}", table);
    Ok(())
}
