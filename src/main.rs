use std::io::IsTerminal;
use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trellis::cli::{self, Cli};
use trellis::core::config::Config;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            cli::report_error(&err);
            ExitCode::FAILURE
        }
    }
}

/// `--debug` > `RUST_LOG` > global config `log_filter` > `warn`.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("trellis=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let configured = Config::load(None)
                .ok()
                .and_then(|config| config.log_filter().map(String::from));
            configured
                .and_then(|directive| EnvFilter::try_new(directive).ok())
                .unwrap_or_else(|| EnvFilter::new("warn"))
        })
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false),
        )
        .init();
}
