use std::path::Path;

use super::utils::{open_session, resolve_var};
use super::CommonArgs;
use crate::cfunc::CFunc;
use crate::error::{Error, Result};
use crate::plugin::{PopupAction, Selection};

/// Run the unmark subcommand
pub fn unmark(args: &CommonArgs, input_path: &Path, var: &str) -> Result<()> {
    let mut cfunc = CFunc::load(input_path)?;
    let idx = resolve_var(&cfunc, var)?;

    let mut session = open_session(args)?;
    let selection = Selection::LVar { idx };
    if session
        .perform(&mut cfunc, PopupAction::UnmarkSuperfluous, &selection)?
        .is_none()
    {
        return Err(Error::invalid_args(format!(
            "'{}' is not marked superfluous in function {:#x}",
            var, cfunc.entry_ea
        )));
    }
    session.term();

    println!("unmarked '{}'; decompile the function again to restore it", var);
    Ok(())
}
