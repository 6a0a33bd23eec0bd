use std::sync::Arc;
use std::time::Duration;

use othello::transport::tcp::{TcpReader, TcpTransport, TcpWriter};
use othello::transport::{Inbound, Outbound};
use othello::{Board, GameServer, ServerConfig, ServerMessage};
use tokio::net::TcpListener;
use tokio::time::timeout;

async fn line(reader: &mut TcpReader) -> Option<String> {
    timeout(Duration::from_secs(5), reader.recv_line())
        .await
        .expect("timed out waiting for the server")
        .expect("read failed")
}

async fn expect(reader: &mut TcpReader, expected: &str) {
    assert_eq!(line(reader).await.as_deref(), Some(expected));
}

async fn skip(reader: &mut TcpReader, n: usize) {
    for _ in 0..n {
        line(reader).await.unwrap();
    }
}

async fn spawn_server(config: ServerConfig) -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?.to_string();
    let server = Arc::new(GameServer::new(config));
    tokio::spawn(async move { server.serve(listener).await });
    Ok(addr)
}

async fn connect(addr: &str) -> anyhow::Result<(TcpReader, TcpWriter)> {
    Ok(TcpTransport::connect(addr).await?.into_split())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_lines_over_tcp() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await?;
        let (mut reader, mut writer) = TcpTransport::new(socket).into_split();
        let mut received = Vec::new();
        while let Some(line) = reader.recv_line().await? {
            received.push(line);
        }
        writer.send(&ServerMessage::Board(Board::new())).await?;
        writer.close().await?;
        Ok::<_, anyhow::Error>(received)
    });

    let (mut reader, mut writer) = connect(&addr.to_string()).await?;
    writer.send_line("MOVE 2 3").await?;
    writer.send_line("CHAT windows line\r").await?;
    writer.send_line("").await?;
    writer.close().await?;

    expect(&mut reader, "Current Board:").await;
    expect(&mut reader, "  0 1 2 3 4 5 6 7").await;
    skip(&mut reader, 8).await;
    assert_eq!(line(&mut reader).await, None);

    let received = server.await??;
    assert_eq!(received, vec!["MOVE 2 3", "CHAT windows line", ""]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_match_over_tcp() -> anyhow::Result<()> {
    let addr = spawn_server(ServerConfig::default()).await?;

    let (mut r1, mut w1) = connect(&addr).await?;
    expect(&mut r1, "STATUS You are Player 1 (Black)").await;
    skip(&mut r1, 11).await;

    let (mut r2, mut w2) = connect(&addr).await?;
    expect(&mut r2, "STATUS You are Player 2 (White)").await;
    skip(&mut r2, 10).await;
    for reader in [&mut r1, &mut r2] {
        expect(reader, "SCORE 2 2").await;
        expect(reader, "STATUS Game started!").await;
        expect(reader, "STATUS Player 1 (Black) to move.").await;
    }

    let (mut r3, _w3) = connect(&addr).await?;
    expect(&mut r3, "Server full. Try again later.").await;
    assert_eq!(line(&mut r3).await, None);

    w1.send_line("MOVE 2 3").await?;
    for reader in [&mut r1, &mut r2] {
        expect(reader, "Current Board:").await;
        skip(reader, 9).await;
        expect(reader, "SCORE 1 4").await;
        expect(reader, "STATUS Player 2 (White) to move.").await;
    }

    w2.send_line("CHAT nice").await?;
    for reader in [&mut r1, &mut r2] {
        expect(reader, "CHAT Player 2: nice").await;
    }

    w1.send_line("QUIT").await?;
    assert_eq!(line(&mut r1).await, None);
    expect(&mut r2, "STATUS Player 1 has left the game.").await;
    expect(&mut r2, "Game over!").await;
    expect(&mut r2, "Final Score: 1 - 4").await;
    expect(&mut r2, "STATUS Player 2 (White) wins by forfeit.").await;
    assert_eq!(line(&mut r2).await, None);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_oversized_line_drops_connection() -> anyhow::Result<()> {
    let addr = spawn_server(ServerConfig {
        max_line_len: 16,
        ..ServerConfig::default()
    })
    .await?;

    let (mut r1, mut w1) = connect(&addr).await?;
    expect(&mut r1, "STATUS You are Player 1 (Black)").await;
    skip(&mut r1, 11).await;

    w1.send_line(&"CHAT ".repeat(40)).await?;
    // The server hangs up; depending on timing the peer sees EOF or a reset.
    let ended = timeout(Duration::from_secs(5), async {
        loop {
            match r1.recv_line().await {
                Ok(Some(_)) => continue,
                Ok(None) | Err(_) => break,
            }
        }
    })
    .await;
    assert!(ended.is_ok());

    // The seat was freed, so the next player is Player 1 again.
    let (mut r2, _w2) = connect(&addr).await?;
    expect(&mut r2, "STATUS You are Player 1 (Black)").await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_line_limit_excludes_terminator() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await?;
        let (mut reader, _writer) =
            TcpTransport::with_config(socket, 16, Duration::from_secs(5)).into_split();
        let crlf = reader.recv_line().await?;
        let lf = reader.recv_line().await?;
        let too_long = reader.recv_line().await;
        Ok::<_, anyhow::Error>((crlf, lf, too_long.is_err()))
    });

    let (_reader, mut writer) = connect(&addr.to_string()).await?;
    let exact = "CHAT 0123456789A";
    assert_eq!(exact.len(), 16);
    writer.send_line(&format!("{}\r", exact)).await?;
    writer.send_line(exact).await?;
    writer.send_line(&format!("{}B\r", exact)).await?;

    let (crlf, lf, rejected) = server.await??;
    assert_eq!(crlf.as_deref(), Some(exact));
    assert_eq!(lf.as_deref(), Some(exact));
    assert!(rejected);
    Ok(())
}
