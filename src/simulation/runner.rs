use crate::core::ExitPolicy;
use crate::error::{EvalError, Result};
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, ExitStatus};
use std::thread;
use std::time::Duration;

const LAUNCH_ATTEMPTS: u32 = 5;

/// Run the simulator script inside `workdir` and block until it exits.
///
/// There is no timeout: a hung simulator hangs the caller. Whether an
/// unsuccessful exit aborts the trial is decided by `policy`.
pub fn run_simulator(workdir: &Path, run_file: &Path, policy: ExitPolicy) -> Result<ExitStatus> {
    // Absolute, so the path does not get re-resolved against `workdir`.
    let program = std::path::absolute(workdir.join(run_file)).map_err(|source| {
        EvalError::SimulatorLaunch {
            path: workdir.join(run_file),
            source,
        }
    })?;

    let mut attempt = 1;
    let status = loop {
        match Command::new(&program).current_dir(workdir).status() {
            Ok(status) => break status,
            // A freshly written script can still be held open by another fork.
            Err(e) if e.kind() == ErrorKind::ExecutableFileBusy && attempt < LAUNCH_ATTEMPTS => {
                attempt += 1;
                thread::sleep(Duration::from_millis(20 * attempt as u64));
            }
            Err(source) => {
                return Err(EvalError::SimulatorLaunch {
                    path: program,
                    source,
                });
            }
        }
    };

    if !status.success() {
        match policy {
            ExitPolicy::Absorb => tracing::warn!(
                "Simulator {} exited with {}; continuing with whatever the log contains",
                program.display(),
                status
            ),
            ExitPolicy::Fail => {
                return Err(EvalError::SimulatorFailed {
                    code: status.code(),
                });
            }
        }
    }

    Ok(status)
}
