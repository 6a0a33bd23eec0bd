use std::time::Duration;

use othello::prelude::*;
use rand::{rngs::SmallRng, seq::IndexedRandom, Rng, SeedableRng};
use serde_json::json;

/// Drain whatever the server already queued for `client`.
fn drain(client: &mut InMemoryClient) -> usize {
    let mut n = 0;
    while client.try_next_line().is_some() {
        n += 1;
    }
    n
}

/// Random self-play through the full server stack over in-memory
/// connections. Prints a JSON summary of the finished match.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    othello::init_logging();
    let args: Vec<String> = std::env::args().collect();
    let seed: u64 = match args.len() {
        1 => rand::rng().random(),
        2 => args[1].parse()?,
        _ => {
            eprintln!("Usage: {} [seed]", args[0]);
            std::process::exit(1);
        }
    };
    let mut rng = SmallRng::seed_from_u64(seed);

    let server = GameServer::default();
    let room = server.room();
    let mut clients = Vec::new();
    for _ in Slot::ALL {
        let (client, reader, writer) = InMemoryConnection::pair();
        server
            .admit(reader, writer)
            .ok_or_else(|| anyhow::anyhow!("seat refused"))?;
        clients.push(client);
    }

    let mut lines = 0;
    while !room.is_finished() {
        let state = room.snapshot();
        let Some(&square) = state.board.legal_moves(state.turn).choose(&mut rng) else {
            anyhow::bail!("side to move has no legal move in a running game");
        };
        let mover = Slot::for_color(state.turn);
        clients[mover.number() as usize - 1].send(&ClientMessage::Move {
            x: i32::from(square.x),
            y: i32::from(square.y),
        })?;
        while room.snapshot().moves_played == state.moves_played {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        for client in clients.iter_mut() {
            lines += drain(client);
        }
    }

    let state = room.snapshot();
    let score = state.board.score();
    let winner = score.leader().map(|color| color.to_string());
    let result = json!({
        "seed": seed,
        "moves": state.moves_played,
        "black": score.black,
        "white": score.white,
        "winner": winner,
        "lines_received": lines,
    });

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
