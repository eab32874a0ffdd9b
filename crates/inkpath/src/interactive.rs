//! Line-oriented front end for [`Tuner`].
//!
//! Each input line is one command. The preview callback runs once for
//! the starting outlines and again after every tolerance change.

use std::io::{BufRead, Write};

use inkpath_pipeline::{Polyline, Tuner, TunerAction, TunerEvent};

use crate::CliError;

const HELP: &str = "[+] coarser  [-] finer  [enter] accept  [q] quit";

/// Map one input line to a tuner action.
///
/// Surrounding whitespace and letter case are ignored. An empty line
/// accepts the current outlines.
#[must_use]
pub fn parse_action(line: &str) -> Option<TunerAction> {
    match line.trim().to_ascii_lowercase().as_str() {
        "+" | "]" | "right" | "up" => Some(TunerAction::Increase),
        "-" | "[" | "left" | "down" => Some(TunerAction::Decrease),
        "" | "enter" | "y" | "yes" => Some(TunerAction::Confirm),
        "q" | "quit" | "esc" | "escape" => Some(TunerAction::Cancel),
        _ => None,
    }
}

/// Drive `tuner` from `input` until the operator accepts or quits.
///
/// Returns the accepted tolerance and outlines, or `None` when the
/// operator quits or `input` ends.
///
/// # Errors
///
/// Returns [`CliError::Terminal`] if reading commands or writing prompts
/// fails, and propagates any error from `on_update`.
pub fn run<R, W, F>(
    tuner: &mut Tuner<'_>,
    input: R,
    prompt: &mut W,
    mut on_update: F,
) -> Result<Option<(f64, Vec<Polyline>)>, CliError>
where
    R: BufRead,
    W: Write,
    F: FnMut(f64, &[Polyline]) -> Result<(), CliError>,
{
    on_update(tuner.tolerance(), tuner.outlines())?;
    writeln!(prompt, "{HELP}")?;
    write_status(prompt, tuner.tolerance(), tuner.outlines().len())?;

    for line in input.lines() {
        let line = line?;
        let Some(action) = parse_action(&line) else {
            writeln!(prompt, "unrecognised command {:?}; {HELP}", line.trim())?;
            continue;
        };
        match tuner.apply(action) {
            TunerEvent::Updated {
                tolerance,
                outlines,
                ..
            } => {
                on_update(tolerance, &outlines)?;
                write_status(prompt, tolerance, outlines.len())?;
            }
            TunerEvent::Confirmed {
                tolerance,
                outlines,
            } => return Ok(Some((tolerance, outlines))),
            TunerEvent::Cancelled => return Ok(None),
        }
    }

    tracing::debug!("input closed before a choice was made");
    Ok(None)
}

fn write_status<W: Write>(
    prompt: &mut W,
    tolerance: f64,
    outlines: usize,
) -> std::io::Result<()> {
    write!(prompt, "tolerance {tolerance:.2}, {outlines} outlines> ")?;
    prompt.flush()
}
