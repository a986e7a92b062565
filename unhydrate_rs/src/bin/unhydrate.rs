use std::any::Any;
use std::panic;
use std::process::ExitCode;

use clap::Parser;

use unhydrate::cli::{Args, init_logging, run};
use unhydrate::progress;

fn install_broken_pipe_handler() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let payload = info.payload();
        let is_broken = <dyn Any>::downcast_ref::<&str>(payload)
            .is_some_and(|s| s.contains("Broken pipe"))
            || <dyn Any>::downcast_ref::<String>(payload)
                .is_some_and(|s| s.contains("Broken pipe"));

        if is_broken {
            // Quietly exit when downstream closes the pipe (e.g. piping to `head`).
            std::process::exit(0);
        }

        default_hook(info);
    }));
}

fn main() -> ExitCode {
    install_broken_pipe_handler();

    let options = Args::parse().into_options();
    init_logging(&options);

    match run(&options) {
        Ok(code) => code,
        Err(err) => {
            progress::error(&format!("{err:#}"));
            ExitCode::from(2)
        }
    }
}
