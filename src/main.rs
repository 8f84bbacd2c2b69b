//! Mark attachment positioning for font sources, built on the Bezy stack.
//!
//! Resolves where combining marks sit on their bases and reports or
//! validates a project's positioning data from the command line.

use bezy_marks::core;

fn main() {
    let cli_args = core::platform::get_cli_args();
    match core::run_app(cli_args) {
        Ok(()) => {}
        Err(error) => core::platform::handle_error(error),
    }
}
