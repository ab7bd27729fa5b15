use clap::{Parser, Subcommand};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "chipledger")]
#[command(about = "Chip ledger - server and terminal client launcher")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server and one terminal client against it; the server stops when the client exits
    Both {
        /// Port for the server
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Run only the server
    Server {
        /// Port for the server
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Run only a terminal client
    Client {
        /// Server WebSocket endpoint
        #[arg(long, default_value = "ws://127.0.0.1:3000/ws")]
        url: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Both { port } => run_both(port),
        Commands::Server { port } => run_server(port),
        Commands::Client { url } => run_client(&url),
    }
}

fn run_both(port: u16) {
    println!("Starting chip ledger server on port {port} with a terminal client");

    let mut server = match server_command(port).spawn() {
        Ok(child) => child,
        Err(e) => {
            eprintln!("Failed to start server: {e}");
            std::process::exit(1);
        }
    };

    // Give the server a moment to bind before the client dials in.
    thread::sleep(Duration::from_millis(1500));
    let ok = run_inherited(client_command(&format!("ws://127.0.0.1:{port}/ws")), "Client");

    stop_child(&mut server);
    println!("Server stopped.");
    if !ok {
        std::process::exit(1);
    }
}

fn server_command(port: u16) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.args(["run", "-p", "chipledger-server"])
        .env("PORT", port.to_string());
    cmd
}

fn client_command(url: &str) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.args(["run", "-p", "chipledger", "--bin", "cli_client"])
        .env("CHIPLEDGER_URL", url);
    cmd
}

fn run_server(port: u16) {
    if !run_inherited(server_command(port), "Server") {
        std::process::exit(1);
    }
}

fn run_client(url: &str) {
    if !run_inherited(client_command(url), "Client") {
        std::process::exit(1);
    }
}

/// Kill a child that may already have exited, then reap it.
fn stop_child(child: &mut Child) {
    if let Ok(None) = child.try_wait() {
        let _ = child.kill();
    }
    let _ = child.wait();
}

/// Run to completion with the terminal attached. Returns whether it succeeded.
fn run_inherited(mut cmd: Command, what: &str) -> bool {
    let status = cmd
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status();

    match status {
        Ok(exit_status) if exit_status.success() => true,
        Ok(exit_status) => {
            eprintln!("{what} exited with error: {exit_status}");
            false
        }
        Err(e) => {
            eprintln!("Failed to start {}: {e}", what.to_lowercase());
            false
        }
    }
}
