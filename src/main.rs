#[cfg(not(feature = "std"))]
fn main() {}

#[cfg(feature = "std")]
use othello::{
    init_logging,
    transport::{tcp::TcpTransport, Inbound},
    GameServer, ServerConfig, DEFAULT_BIND, DEFAULT_MAX_LINE_LEN, DEFAULT_WRITE_TIMEOUT,
};

#[cfg(feature = "std")]
use clap::Parser;
#[cfg(feature = "std")]
use tokio::io::{AsyncBufReadExt, BufReader};
#[cfg(feature = "std")]
use tokio::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[cfg(feature = "std")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
#[cfg(feature = "std")]
enum Commands {
    /// Host a two-player match and relay moves and chat between the seats.
    Serve {
        #[arg(long, default_value = DEFAULT_BIND)]
        bind: String,
        #[arg(long, default_value_t = DEFAULT_MAX_LINE_LEN, help = "Longest accepted client line in bytes")]
        max_line_len: usize,
        #[arg(long, default_value_t = DEFAULT_WRITE_TIMEOUT.as_secs(), help = "Give up on a socket write after this many seconds")]
        write_timeout_secs: u64,
    },
    /// Connect to a server and play from the terminal.
    Client {
        #[arg(long, default_value = DEFAULT_BIND)]
        connect: String,
    },
}

#[cfg(feature = "std")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            max_line_len,
            write_timeout_secs,
        } => {
            let config = ServerConfig {
                bind,
                max_line_len,
                write_timeout: Duration::from_secs(write_timeout_secs),
            };
            GameServer::new(config).run().await
        }
        Commands::Client { connect } => run_client(&connect).await,
    }
}

/// Print every server line; forward every stdin line. Ends when the server
/// closes the connection, stdin runs dry, or the user types `QUIT`.
#[cfg(feature = "std")]
async fn run_client(addr: &str) -> anyhow::Result<()> {
    let (mut reader, mut writer) = TcpTransport::connect(addr).await?.into_split();
    println!("Connected to {}", addr);
    println!("Commands: MOVE <row> <col> | CHAT <text> | QUIT");

    let mut printer = tokio::spawn(async move {
        loop {
            match reader.recv_line().await {
                Ok(Some(line)) => println!("{}", line),
                Ok(None) => {
                    println!("Server closed the connection.");
                    return;
                }
                Err(e) => {
                    println!("Connection lost: {}", e);
                    return;
                }
            }
        }
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = &mut printer => return Ok(()),
            line = stdin.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };
        writer.send_line(line.trim_end()).await?;
        if line.trim() == "QUIT" {
            break;
        }
    }
    // Let the server's last words arrive before exiting.
    let _ = tokio::time::timeout(Duration::from_secs(1), printer).await;
    Ok(())
}
