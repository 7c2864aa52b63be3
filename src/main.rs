use std::process::ExitCode;

fn main() -> ExitCode {
    tianyu_insight_lib::run()
}
