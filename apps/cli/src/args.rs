use std::env;
use std::path::PathBuf;

#[derive(Debug, Default, PartialEq)]
pub struct CliArgs {
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub once: bool,
    pub json_logs: bool,
}

pub fn parse_args() -> Result<CliArgs, String> {
    parse_from(env::args().skip(1))
}

fn parse_from(args: impl IntoIterator<Item = String>) -> Result<CliArgs, String> {
    let mut args = args.into_iter();
    let mut parsed = CliArgs::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--port" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --port".to_string())?;
                let port = value
                    .parse::<u16>()
                    .map_err(|_| format!("invalid port value: {value}"))?;
                parsed.port = Some(port);
            }
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --config".to_string())?;
                parsed.config = Some(PathBuf::from(value));
            }
            "--once" => {
                parsed.once = true;
            }
            "--json" => {
                parsed.json_logs = true;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                return Err(format!("unknown argument: {arg}"));
            }
        }
    }

    Ok(parsed)
}

pub fn print_help() {
    println!(
        "Schedule Board\n\n\
Usage:\n  schedule-board [--port <port>] [--config <path>] [--once] [--json]\n\n\
Options:\n  --port <port>    Override the configured port for this run only\n  --config <path>  Read configuration from <path> instead of the default location\n  --once           Run one poll pass, print the board as JSON and exit\n  --json           Write logs as JSON lines\n  -h, --help       Show this help message\n"
    );
}
