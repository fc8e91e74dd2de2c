use std::process::ExitCode;

fn main() -> ExitCode {
    merchscope_cli::run()
}
