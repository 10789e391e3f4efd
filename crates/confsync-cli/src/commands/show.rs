//! Show command implementation

use colored::Colorize;

use confsync_core::NodeAddress;

use crate::context::Context;
use crate::error::Result;

/// Print every member stored at `address`.
pub fn run_show(ctx: &Context, instance: Option<&str>, address: &NodeAddress, json: bool) -> Result<()> {
    let attributes = ctx.reconciler.fetch(instance, address)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&attributes)?);
        return Ok(());
    }

    let instance = instance.unwrap_or_else(|| ctx.settings.default_instance_name());
    println!(
        "{} {} ({})",
        "Show".blue().bold(),
        address.path().yellow(),
        instance.cyan()
    );
    println!();

    if attributes.is_empty() {
        println!("  {}", "Nothing stored".dimmed());
        return Ok(());
    }
    let width = attributes.keys().map(String::len).max().unwrap_or(0);
    for (name, value) in &attributes {
        println!("  {:width$} = {}", name, value, width = width);
    }
    Ok(())
}
