use super::utils::open_registry;
use super::CommonArgs;
use crate::error::Result;

/// Run the reset subcommand
pub fn reset(args: &CommonArgs) -> Result<()> {
    let mut registry = open_registry(args)?;
    let removed = registry.len();
    registry.reset()?;
    println!("removed {} superfluous variables from '{}'", removed, registry.node());
    Ok(())
}
