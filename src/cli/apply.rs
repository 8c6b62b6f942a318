use std::path::Path;

use super::utils::{emit_function, open_session};
use super::CommonArgs;
use crate::cfunc::CFunc;
use crate::error::Result;
use crate::plugin::{EventOutcome, HostEvent, Maturity};

/// Run the apply subcommand: deliver a final-maturity event and emit the result
pub fn apply(args: &CommonArgs, input_path: &Path, output: Option<&Path>) -> Result<()> {
    let mut cfunc = CFunc::load(input_path)?;
    let mut session = open_session(args)?;

    let event = HostEvent::Maturity {
        maturity: Maturity::Final,
    };
    match session.handle_event(&mut cfunc, &event) {
        EventOutcome::Replayed(report) => {
            eprintln!(
                "replayed {} superfluous variables ({} unresolved, {} failed)",
                report.merged.len(),
                report.unresolved.len(),
                report.failed.len()
            );
        }
        _ => eprintln!("nothing to replay"),
    }
    session.term();

    emit_function(&cfunc, output)
}
