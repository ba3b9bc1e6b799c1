use clap::{Arg, ArgAction, Command};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as TungsteniteMessage};
use url::Url;
use uuid::Uuid;

use task_board::websocket::events::{FE_JOIN_BOARD, FE_LEAVE_BOARD, PING, is_client_event_name};

#[derive(Debug, Clone)]
struct WatchConfig {
    server_url: String,
    token: String,
    boards: Vec<Uuid>,
    ping_interval: Duration,
    interactive: bool,
}

fn frame(event: &str, board_id: Option<Uuid>, data: serde_json::Value) -> String {
    json!({
        "event": event,
        "board_id": board_id,
        "data": data,
    })
    .to_string()
}

fn print_event(text: &str) {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => {
            let event = value.get("event").and_then(|v| v.as_str()).unwrap_or("unknown");
            let board = value.get("board_id").and_then(|v| v.as_str()).unwrap_or("-");
            let from = value
                .get("from_user_id")
                .and_then(|v| v.as_str())
                .unwrap_or("server");
            let data = value.get("data").cloned().unwrap_or(json!({}));
            println!("[{}] board={} from={} {}", event, board, from, data);
        }
        Err(_) => println!("[raw] {}", text),
    }
}

/// Parses an interactive line into a frame. Returns None for unknown input.
fn command_frame(input: &str) -> Result<Option<String>, String> {
    let parts: Vec<&str> = input.splitn(3, ' ').collect();
    match parts.as_slice() {
        ["join", board] => {
            let board_id = Uuid::parse_str(board).map_err(|e| format!("invalid board id: {}", e))?;
            Ok(Some(frame(FE_JOIN_BOARD, Some(board_id), json!({}))))
        }
        ["leave", board] => {
            let board_id = Uuid::parse_str(board).map_err(|e| format!("invalid board id: {}", e))?;
            Ok(Some(frame(FE_LEAVE_BOARD, Some(board_id), json!({}))))
        }
        ["ping"] => Ok(Some(frame(PING, None, json!({})))),
        ["send", event, rest] => {
            if !is_client_event_name(event) {
                return Err(format!("{} is not a client event name", event));
            }
            let (board, payload) = rest.split_once(' ').unwrap_or((*rest, "{}"));
            let board_id = Uuid::parse_str(board).map_err(|e| format!("invalid board id: {}", e))?;
            let data: serde_json::Value =
                serde_json::from_str(payload).map_err(|e| format!("invalid JSON payload: {}", e))?;
            Ok(Some(frame(event, Some(board_id), data)))
        }
        _ => Ok(None),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  join <board_id>                    - join a board room");
    println!("  leave <board_id>                   - leave a board room");
    println!("  send <FE_EVENT> <board_id> [json]  - relay an event to the room");
    println!("  ping                               - send PING");
    println!("  quit                               - exit");
}

async fn run(config: WatchConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut url = Url::parse(&config.server_url)?;
    url.query_pairs_mut().append_pair("token", &config.token);

    println!("Connecting to {}", config.server_url);
    let (ws_stream, response) = connect_async(url).await?;
    println!("Connected ({})", response.status());

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    for board_id in &config.boards {
        ws_sender
            .send(TungsteniteMessage::Text(frame(FE_JOIN_BOARD, Some(*board_id), json!({}))))
            .await?;
    }

    let receive_handle = tokio::spawn(async move {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(TungsteniteMessage::Text(text)) => print_event(&text),
                Ok(TungsteniteMessage::Close(reason)) => {
                    println!("Connection closed by server: {:?}", reason);
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("WebSocket error: {}", e);
                    break;
                }
            }
        }
    });

    if config.interactive {
        print_help();
    }

    let mut ping_interval = tokio::time::interval(config.ping_interval);
    ping_interval.tick().await;

    let stdin = tokio::io::stdin();
    let mut lines = tokio::io::BufReader::new(stdin).lines();
    let mut stdin_open = config.interactive;

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if let Err(e) = ws_sender.send(TungsteniteMessage::Text(frame(PING, None, json!({})))).await {
                    eprintln!("Failed to send ping: {}", e);
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(input)) => {
                        let input = input.trim();
                        if input.is_empty() {
                            continue;
                        }
                        if matches!(input, "quit" | "exit" | "q") {
                            break;
                        }
                        if input == "help" {
                            print_help();
                            continue;
                        }
                        match command_frame(input) {
                            Ok(Some(text)) => {
                                if let Err(e) = ws_sender.send(TungsteniteMessage::Text(text)).await {
                                    eprintln!("Failed to send: {}", e);
                                    break;
                                }
                            }
                            Ok(None) => println!("Unknown command, type 'help'"),
                            Err(e) => println!("{}", e),
                        }
                    }
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        eprintln!("Failed to read stdin: {}", e);
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }

        if receive_handle.is_finished() {
            break;
        }
    }

    let _ = ws_sender.send(TungsteniteMessage::Close(None)).await;
    receive_handle.abort();
    Ok(())
}

#[tokio::main]
async fn main() {
    let matches = Command::new("board_watch")
        .about("Watches task board rooms over WebSocket")
        .arg(
            Arg::new("server")
                .short('s')
                .long("server")
                .value_name("URL")
                .help("WebSocket endpoint")
                .default_value("ws://127.0.0.1:8017/ws"),
        )
        .arg(
            Arg::new("token")
                .short('t')
                .long("token")
                .value_name("TOKEN")
                .help("Access token")
                .required(true),
        )
        .arg(
            Arg::new("board")
                .short('b')
                .long("board")
                .value_name("BOARD_ID")
                .help("Board to join on connect, may be repeated")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("ping-interval")
                .long("ping-interval")
                .value_name("SECONDS")
                .help("Seconds between pings")
                .value_parser(clap::value_parser!(u64))
                .default_value("30"),
        )
        .arg(
            Arg::new("no-interactive")
                .long("no-interactive")
                .help("Only print events, ignore stdin")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let mut boards = Vec::new();
    if let Some(values) = matches.get_many::<String>("board") {
        for value in values {
            match Uuid::parse_str(value) {
                Ok(id) => boards.push(id),
                Err(e) => {
                    eprintln!("Invalid board id {}: {}", value, e);
                    std::process::exit(2);
                }
            }
        }
    }

    let config = WatchConfig {
        server_url: matches
            .get_one::<String>("server")
            .cloned()
            .unwrap_or_default(),
        token: matches.get_one::<String>("token").cloned().unwrap_or_default(),
        boards,
        ping_interval: Duration::from_secs(
            matches.get_one::<u64>("ping-interval").copied().unwrap_or(30).max(1),
        ),
        interactive: !matches.get_flag("no-interactive"),
    };

    if let Err(e) = run(config).await {
        eprintln!("board_watch failed: {}", e);
        std::process::exit(1);
    }
}
