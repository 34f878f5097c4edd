//! CLI entry point: takes a single URL argument, opens the `eframe` window
//! described by spec.md section 6, and loads it into the one tab the
//! browser starts with.

use std::process::ExitCode;

use zipsurf::browser::Browser;
use zipsurf::url::Url;

fn print_usage(program: &str) {
    eprintln!("usage: {program} <url>");
    eprintln!();
    eprintln!("Opens a browser window and loads the given http(s) or file URL.");
    eprintln!("Set RUST_LOG=debug for fetch/redirect/cache tracing.");
}

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "zipsurf".to_string());
    let Some(raw_url) = args.next() else {
        print_usage(&program);
        return ExitCode::from(2);
    };
    if raw_url == "--help" || raw_url == "-h" {
        print_usage(&program);
        return ExitCode::from(2);
    }

    let url = match Url::parse(&raw_url) {
        Ok(url) => url,
        Err(err) => {
            eprintln!("invalid url {raw_url}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let native_options = eframe::NativeOptions::default();
    let result = eframe::run_native(
        "ZipSurf",
        native_options,
        Box::new(move |cc| Ok(Box::new(Browser::new(cc, url.clone())))),
    );

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("window closed with error: {err}");
            ExitCode::FAILURE
        }
    }
}
