use clap::Parser;
use std::io::Read;

use minsh::shell::{Shell, ShellConfig};

#[derive(Parser)]
#[command(name = "minsh")]
#[command(about = "A sandboxed POSIX command interpreter")]
#[command(version)]
struct Cli {
    /// Execute the script given on the command line
    #[arg(short = 'c')]
    script: Option<String>,

    /// Exit immediately if a command exits with non-zero status
    #[arg(short = 'e')]
    errexit: bool,

    /// Trace commands as they execute
    #[arg(short = 'x')]
    xtrace: bool,

    /// Read commands but do not execute them
    #[arg(short = 'n')]
    noexec: bool,

    /// Script file to execute
    #[arg()]
    script_file: Option<String>,

    /// Positional parameters for the script
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    let (name, script) = if let Some(s) = cli.script {
        ("minsh".to_string(), s)
    } else if let Some(ref file) = cli.script_file {
        match std::fs::read_to_string(file) {
            Ok(content) => (file.clone(), content),
            Err(e) => {
                eprintln!("minsh: {}: {}", file, e);
                std::process::exit(127);
            }
        }
    } else {
        use std::io::IsTerminal;
        if std::io::stdin().is_terminal() {
            eprintln!("minsh: no script; use -c 'script', a script file, or pipe via stdin");
            std::process::exit(2);
        }
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).unwrap_or_default();
        ("minsh".to_string(), buf)
    };

    let mut shell = Shell::new(ShellConfig {
        args: cli.args,
        name: Some(name),
        ..Default::default()
    });
    {
        let state = shell.state_mut();
        state.options.errexit = cli.errexit;
        state.options.xtrace = cli.xtrace;
        state.options.noexec = cli.noexec;
    }

    let result = shell.run(&script);
    if !result.stdout.is_empty() {
        print!("{}", result.stdout);
    }
    if !result.stderr.is_empty() {
        eprint!("{}", result.stderr);
    }
    std::process::exit(result.exit_code);
}
