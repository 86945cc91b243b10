use std::process::ExitCode;

fn main() -> ExitCode {
    legaltune_cli::run()
}
