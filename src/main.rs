use clap::Parser;
use std::io::{self, BufRead};
use std::thread;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use ttt_duel::{establish, Event, Outcome, Presenter, Role, Session};

/// Play tic-tac-toe against one opponent over TCP.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Whether to wait for the opponent or dial them.
    #[arg(value_enum)]
    role: Role,
    /// Address to bind to (host) or connect to (connect).
    #[arg(long, env = "TTT_HOST", default_value = "localhost")]
    host: String,
    #[arg(long, env = "TTT_PORT", default_value_t = 9999)]
    port: u16,
}

struct Console;

impl Presenter for Console {
    fn present(&mut self, event: Event) {
        match event {
            Event::Board(board) => println!("\n{board}"),
            Event::YourTurn(symbol) => println!("You are {symbol}. Enter your move (row,col): "),
            Event::InvalidMove(err) => println!("Invalid move! {err}\nTry the format 0,0"),
            Event::Won => println!("You win!"),
            Event::Lost => println!("You lose!"),
            Event::Tie => println!("Tie!"),
            Event::Disconnected => println!("Your opponent left the game."),
            Event::PeerMisbehaved(err) => println!("Your opponent sent nonsense ({err})."),
        }
    }
}

/// Forwards every line typed on stdin to the session.
///
/// Runs on a plain thread so a pending read never holds up runtime shutdown.
fn read_intents(tx: mpsc::Sender<String>) {
    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                error!(%err, "failed to read from stdin");
                break;
            }
        };
        if tx.blocking_send(line.trim().to_string()).is_err() {
            break; // session is over
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.role == Role::Host {
        println!("Waiting for an opponent on {}:{}...", cli.host, cli.port);
    }
    let connection = establish(cli.role, &cli.host, cli.port).await?;
    println!("Playing against {} as {}.", connection.peer_addr, connection.symbol);

    let (tx, mut rx) = mpsc::channel(8);
    thread::spawn(move || read_intents(tx));

    let mut session = Session::new(connection.stream, connection.symbol);
    let outcome = session.run(&mut rx, &mut Console).await?;
    match outcome {
        Outcome::Undecided => info!("game ended without a result"),
        outcome => info!(?outcome, "game over"),
    }

    Ok(())
}
