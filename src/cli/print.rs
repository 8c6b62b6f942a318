use std::path::Path;

use super::utils::write_output;
use crate::ast::print_function;
use crate::cfunc::CFunc;
use crate::error::Result;

/// Run the print subcommand
pub fn print(input_path: &Path) -> Result<()> {
    let cfunc = CFunc::load(input_path)?;
    write_output(&print_function(&cfunc), None)
}
