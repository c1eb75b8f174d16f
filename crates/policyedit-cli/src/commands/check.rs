//! Check command - validate a tag pattern and try it against tags

use console::style;
use policyedit_core::TagPattern;

use crate::error::{CliError, Result};

pub fn run(value: &str, tags: &[String]) -> Result<()> {
    let pattern = TagPattern::parse(value).map_err(|reason| CliError::Policy {
        message: format!("invalid tag pattern {value:?}: {reason}"),
        help: Some(
            "use glob:<pattern>, semver:<range>, regexp:<expression> or a literal tag".to_string(),
        ),
    })?;

    println!(
        "{} {} ({})",
        style("✓").green(),
        style(&pattern).bold(),
        pattern.kind().unwrap_or("literal")
    );

    for tag in tags {
        if pattern.matches(tag) {
            println!("  {} {}", style("match").green(), tag);
        } else {
            println!("  {} {}", style("no match").yellow(), tag);
        }
    }

    Ok(())
}
