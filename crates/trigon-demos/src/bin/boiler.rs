//! Opens a window and clears it every frame. Escape closes it.

use std::process::ExitCode;

fn main() -> ExitCode {
    trigon_demos::run("Boilerplate", None)
}
