//! Normalize command implementation.

use crate::cli::NormalizeArgs;
use crate::error::Result;
use crate::output::Formatter;
use factsheet_domain::{normalize, units};

/// Execute the normalize command.
pub fn execute_normalize(args: NormalizeArgs, formatter: &Formatter) -> Result<()> {
    let (value, unit) = normalize(args.value, &args.unit);
    let quantity = units::quantity_of(&args.unit);
    println!(
        "{}",
        formatter.format_normalized(args.value, &args.unit, (value, &unit), quantity)?
    );
    Ok(())
}
