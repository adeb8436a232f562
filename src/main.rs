use std::process::ExitCode;

fn main() -> ExitCode {
    tierstress::entry::run()
}
