//! Register command - create a new user

use anyhow::Result;
use dialoguer::{Input, Password};
use serde_json::json;

use super::{get_context, CredentialArgs};
use crate::output;

pub fn run(creds: &CredentialArgs, json: bool) -> Result<()> {
    let ctx = get_context()?;

    let username = match &creds.username {
        Some(name) => name.clone(),
        None => Input::new().with_prompt("Username").interact_text()?,
    };
    let password = match &creds.password {
        Some(password) => password.clone(),
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()?,
    };

    let user = ctx.wallet.register(&username, &password)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "message": "User created successfully",
                "id": user.id,
            }))?
        );
    } else {
        output::success(&format!("Created user {}", user.username));
    }
    Ok(())
}
