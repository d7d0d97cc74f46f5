//! End-to-end tests over real TCP sockets

use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use tcp_chat::{accept_loop, ChatHub, HubHandle, ServerSettings};

const WELCOME: &str = "Welcome to TCP-Chat!\n[ENTER YOUR NAME]: ";
const WAIT: Duration = Duration::from_secs(5);

struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    /// Connect and consume the welcome prompt
    async fn connect(addr: &str) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read, writer) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(read),
            writer,
        };
        let mut buf = vec![0u8; WELCOME.len()];
        timeout(WAIT, client.reader.read_exact(&mut buf))
            .await
            .expect("welcome timed out")
            .unwrap();
        assert_eq!(buf, WELCOME.as_bytes());
        client
    }

    /// Connect and send a name
    async fn join(addr: &str, name: &str) -> Self {
        let mut client = Self::connect(addr).await;
        client.send(name).await;
        client
    }

    async fn send(&mut self, line: &str) {
        self.send_raw(format!("{}\n", line).as_bytes()).await;
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }

    async fn recv(&mut self) -> String {
        let mut line = String::new();
        timeout(WAIT, self.reader.read_line(&mut line))
            .await
            .expect("read timed out")
            .unwrap();
        line
    }

    async fn expect(&mut self, expected: &str) {
        assert_eq!(self.recv().await, format!("{}\n", expected));
    }
}

async fn start_server(max_clients: usize) -> (String, HubHandle) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let hub = ChatHub::spawn(max_clients);
    let settings = ServerSettings {
        max_clients,
        ..ServerSettings::default()
    };
    tokio::spawn(accept_loop(listener, hub.clone(), settings));
    (addr, hub)
}

async fn wait_for_connections(hub: &HubHandle, expected: usize) {
    timeout(WAIT, async {
        while hub.stats().await.unwrap().connections != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("connection count never settled");
}

/// Split `[<timestamp>][<name>]: <text>\n` and check the timestamp layout
fn parse_chat_line(line: &str) -> (String, String) {
    assert!(line.starts_with('['), "not a chat line: {:?}", line);
    let stamp = &line[1..20];
    NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").expect("bad timestamp");
    let rest = &line[20..];
    assert!(rest.starts_with("]["), "bad layout: {:?}", line);
    let (name, text) = rest[2..].split_once("]: ").expect("bad layout");
    (name.to_string(), text.trim_end_matches('\n').to_string())
}

#[tokio::test]
async fn alice_message_reaches_everyone_and_is_recorded() {
    let (addr, hub) = start_server(10).await;

    let mut carol = TestClient::join(&addr, "Carol").await;
    carol.expect("Carol has joined the chat").await;

    let mut alice = TestClient::join(&addr, "Alice").await;
    alice.expect("Alice has joined the chat").await;
    carol.expect("Alice has joined the chat").await;

    alice.send("hi").await;
    let own = alice.recv().await;
    assert_eq!(parse_chat_line(&own), ("Alice".to_string(), "hi".to_string()));
    assert_eq!(carol.recv().await, own);

    assert_eq!(hub.stats().await.unwrap().history_len, 1);
}

#[tokio::test]
async fn late_joiner_gets_replay_before_join_notice() {
    let (addr, _hub) = start_server(10).await;

    let mut alice = TestClient::join(&addr, "Alice").await;
    alice.expect("Alice has joined the chat").await;
    alice.send("hi").await;
    let hi = alice.recv().await;

    let mut bob = TestClient::join(&addr, "Bob").await;
    assert_eq!(bob.recv().await, hi);
    bob.expect("Bob has joined the chat").await;
    alice.expect("Bob has joined the chat").await;
}

#[tokio::test]
async fn join_leave_notices_are_not_replayed() {
    let (addr, _hub) = start_server(10).await;

    let mut alice = TestClient::join(&addr, "Alice").await;
    alice.expect("Alice has joined the chat").await;

    let mut bob = TestClient::join(&addr, "Bob").await;
    bob.expect("Bob has joined the chat").await;
    alice.expect("Bob has joined the chat").await;
    drop(bob);
    alice.expect("Bob has left the chat").await;

    let mut carol = TestClient::join(&addr, "Carol").await;
    carol.expect("Carol has joined the chat").await;
}

#[tokio::test]
async fn blank_lines_produce_nothing() {
    let (addr, hub) = start_server(10).await;

    let mut alice = TestClient::join(&addr, "Alice").await;
    alice.expect("Alice has joined the chat").await;
    let mut bob = TestClient::join(&addr, "Bob").await;
    bob.expect("Bob has joined the chat").await;
    alice.expect("Bob has joined the chat").await;

    alice.send("").await;
    alice.send("   ").await;
    alice.send("real").await;

    let line = bob.recv().await;
    assert_eq!(parse_chat_line(&line).1, "real");
    assert_eq!(hub.stats().await.unwrap().history_len, 1);
}

#[tokio::test]
async fn empty_name_is_rejected() {
    let (addr, hub) = start_server(10).await;

    let mut watcher = TestClient::join(&addr, "Watcher").await;
    watcher.expect("Watcher has joined the chat").await;

    let mut client = TestClient::connect(&addr).await;
    client.send("  ").await;
    let mut rest = String::new();
    timeout(WAIT, client.reader.read_to_string(&mut rest))
        .await
        .expect("close timed out")
        .unwrap();
    assert_eq!(rest, "Invalid name. Connection closed.\n");

    wait_for_connections(&hub, 1).await;
    assert_eq!(hub.stats().await.unwrap().registered, 1);

    // watcher saw no join or leave for the rejected client
    watcher.send("ping").await;
    assert_eq!(parse_chat_line(&watcher.recv().await).1, "ping");
}

#[tokio::test]
async fn eleventh_connection_is_closed_silently() {
    let (addr, hub) = start_server(10).await;

    let mut clients = Vec::new();
    for _ in 0..10 {
        clients.push(TestClient::connect(&addr).await);
    }
    wait_for_connections(&hub, 10).await;

    let mut extra = TcpStream::connect(&addr).await.unwrap();
    let mut buf = Vec::new();
    let read = timeout(WAIT, extra.read_to_end(&mut buf))
        .await
        .expect("rejected connection was not closed");
    // a reset is as good as a clean close, either way nothing was sent
    if read.is_ok() {
        assert!(buf.is_empty());
    }
    assert_eq!(hub.stats().await.unwrap().connections, 10);

    // a freed slot admits the next client
    drop(clients.pop());
    wait_for_connections(&hub, 9).await;
    let mut late = TestClient::join(&addr, "Late").await;
    late.expect("Late has joined the chat").await;
}

#[tokio::test]
async fn unnamed_clients_count_towards_the_cap() {
    let (addr, hub) = start_server(2).await;

    let _a = TestClient::connect(&addr).await;
    let mut b = TestClient::join(&addr, "Bob").await;
    b.expect("Bob has joined the chat").await;

    let stats = hub.stats().await.unwrap();
    assert_eq!(stats.connections, 2);
    assert_eq!(stats.registered, 1);

    let mut extra = TcpStream::connect(&addr).await.unwrap();
    let mut buf = Vec::new();
    let read = timeout(WAIT, extra.read_to_end(&mut buf)).await.unwrap();
    if read.is_ok() {
        assert!(buf.is_empty());
    }
}

#[tokio::test]
async fn long_and_non_utf8_lines_are_broadcast() {
    let (addr, hub) = start_server(10).await;

    let mut alice = TestClient::join(&addr, "Alice").await;
    alice.expect("Alice has joined the chat").await;
    let mut bob = TestClient::join(&addr, "Bob").await;
    bob.expect("Bob has joined the chat").await;
    alice.expect("Bob has joined the chat").await;

    let long = "x".repeat(5000);
    bob.send(&long).await;
    let line = alice.recv().await;
    assert_eq!(parse_chat_line(&line), ("Bob".to_string(), long));

    bob.send_raw(b"caf\xe9\n").await;
    let line = alice.recv().await;
    assert_eq!(
        parse_chat_line(&line),
        ("Bob".to_string(), "caf\u{FFFD}".to_string())
    );

    let stats = hub.stats().await.unwrap();
    assert_eq!(stats.registered, 2);
    assert_eq!(stats.history_len, 2);
}
