use clap::Parser;
use env_logger::Env;
use inlinecss_lib::convert;
use log::{debug, info};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

const INLINECSS_INTRO: &str = r#"
     _       _ _
    (_)_ __ | (_)_ __   ___  ___ ___ ___
    | | '_ \| | | '_ \ / _ \/ __/ __/ __|
    | | | | | | | | | |  __/ (__\__ \__ \
    |_|_| |_|_|_|_| |_|\___|\___|___/___/

    Moves <style> rules into inline style attributes.
"#;

#[derive(Parser)]
#[command(name = "inlinecss")]
#[command(about = "Inline the <style> rules of an HTML document")]
struct Args {
    /// Input HTML file. Reads stdin when absent or `-`.
    input: Option<PathBuf>,

    /// Output file. Writes stdout when absent.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not print the banner.
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn read_input(input: Option<&PathBuf>) -> io::Result<String> {
    match input {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path),
        _ => {
            let mut html_content = String::new();
            io::stdin().read_to_string(&mut html_content)?;
            Ok(html_content)
        }
    }
}

fn write_output(output: Option<&PathBuf>, html: &str) -> io::Result<()> {
    match output {
        Some(path) => fs::write(path, html),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(html.as_bytes())?;
            stdout.write_all(b"\n")
        }
    }
}

fn main() {
    // parse the args given in terminal
    let args: Args = Args::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level(args.verbose)))
        .init();

    if !args.quiet {
        eprintln!("{}", INLINECSS_INTRO);
    }

    let html_content = match read_input(args.input.as_ref()) {
        Ok(html_content) => {
            debug!("Read {} bytes of HTML", html_content.len());
            html_content
        }
        Err(e) => {
            eprintln!("Error reading HTML input: {}", e);
            std::process::exit(1);
        }
    };

    let inlined = match convert(&html_content) {
        Ok(inlined) => inlined,
        Err(e) => {
            eprintln!("Error inlining styles: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = write_output(args.output.as_ref(), &inlined) {
        eprintln!("Error writing HTML output: {}", e);
        std::process::exit(1);
    }
    info!("Successfully inlined styles.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_log_levels() {
        assert_eq!(log_level(0), "warn");
        assert_eq!(log_level(2), "debug");
        assert_eq!(log_level(9), "trace");
    }

    #[test]
    fn args_parse() {
        let args = Args::parse_from(["inlinecss", "page.html", "-o", "out.html", "-q", "-vv"]);
        assert_eq!(args.input, Some(PathBuf::from("page.html")));
        assert_eq!(args.output, Some(PathBuf::from("out.html")));
        assert!(args.quiet);
        assert_eq!(args.verbose, 2);
    }
}
