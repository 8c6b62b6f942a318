use std::path::Path;

use super::utils::{emit_function, open_session, resolve_var};
use super::CommonArgs;
use crate::analysis::AssignmentFinder;
use crate::cfunc::CFunc;
use crate::error::{Error, Result};
use crate::plugin::{HostEvent, PopupAction, Selection};

/// Run the mark subcommand
///
/// Points the cursor at the assignee of the variable's defining copy, then goes
/// through the same popup/action path the interactive host would.
pub fn mark(args: &CommonArgs, input_path: &Path, var: &str, output: Option<&Path>) -> Result<()> {
    let mut cfunc = CFunc::load(input_path)?;
    let vidx = resolve_var(&cfunc, var)?;

    let root = cfunc.body.root();
    let assignee = AssignmentFinder::new(vidx)
        .apply(&cfunc.body, root)
        .and_then(|asg| cfunc.body.expr(asg))
        .and_then(|e| e.as_asg())
        .map(|(x, _)| x)
        .ok_or_else(|| Error::invalid_args(format!("'{}' is not defined by a variable copy", var)))?;

    let mut session = open_session(args)?;
    let selection = Selection::Item { id: assignee };

    let offered = session.handle_event(
        &mut cfunc,
        &HostEvent::RightClick { selection },
    );
    log::debug!("popup for '{}': {:?}", var, offered);

    if session
        .perform(&mut cfunc, PopupAction::MarkSuperfluous, &selection)?
        .is_none()
    {
        return Err(Error::invalid_args(format!(
            "'{}' is not an eliminable variable copy",
            var
        )));
    }
    session.term();

    emit_function(&cfunc, output)
}
