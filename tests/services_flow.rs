//! NickBot and ChanBot driven over a real connection.

mod common;

use std::time::Duration;

use common::{config, MockServer, Peer};
use quarid::db::Store;
use quarid::Bot;

const ALICE: &str = ":alice!~a@example.com";
const BOB: &str = ":bob!~b@example.org";

async fn running(extra: &str) -> (tempfile::TempDir, Bot, Peer) {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    let config = config(server.addr(), dir.path(), extra);
    let store = Store::open(&config.database.path).unwrap();
    let bot = Bot::new(&config, store);
    bot.connect().await.unwrap();
    let mut peer = server.accept().await;
    peer.welcome("quarid").await;
    (dir, bot, peer)
}

async fn say(peer: &mut Peer, from: &str, target: &str, text: &str) {
    peer.send(&format!("{from} PRIVMSG {target} :{text}")).await;
}

#[tokio::test]
async fn private_register_then_duplicate() {
    let (_dir, bot, mut peer) = running("").await;

    say(&mut peer, ALICE, "quarid", "!REGISTER abcde").await;
    assert_eq!(peer.recv().await, "PRIVMSG alice :Registered & LoggedIn");
    let accounts = bot.context().authz.store().accounts();
    assert!(accounts.exists("alice").unwrap());
    let hash = accounts.password_hash("alice").unwrap();

    say(&mut peer, ALICE, "quarid", "!REGISTER abcde").await;
    assert_eq!(peer.recv().await, "PRIVMSG alice :User already exists");
    assert_eq!(accounts.password_hash("alice").unwrap(), hash);

    bot.disconnect("bye").await;
}

#[tokio::test]
async fn unauthenticated_op_is_refused_without_mode() {
    let (_dir, bot, mut peer) = running("").await;

    say(&mut peer, ALICE, "#chat", "!OP").await;
    assert_eq!(peer.recv().await, "PRIVMSG #chat :alice: Must login");
    assert_eq!(peer.try_recv(Duration::from_millis(300)).await, None);

    bot.disconnect("bye").await;
    let rest = peer.drain().await;
    assert!(rest.iter().all(|l| !l.starts_with("MODE")), "{rest:?}");
}

#[tokio::test]
async fn channel_ownership_flow() {
    let (_dir, bot, mut peer) = running("").await;

    say(&mut peer, ALICE, "quarid", "!REGISTER goodpass").await;
    peer.recv().await;
    say(&mut peer, BOB, "quarid", "!REGISTER otherpass").await;
    peer.recv().await;

    say(&mut peer, ALICE, "#chat", "!REGCHAN #chat").await;
    assert_eq!(peer.recv().await, "PRIVMSG #chat :alice: You are now the owner of #chat");

    say(&mut peer, ALICE, "#chat", "!OP").await;
    assert_eq!(peer.recv().await, "MODE #chat +o :alice");

    say(&mut peer, BOB, "#chat", "!OP").await;
    assert_eq!(peer.recv().await, "PRIVMSG #chat :bob: No Permissions");

    say(&mut peer, ALICE, "#chat", "!ADDOP bob").await;
    assert_eq!(peer.recv().await, "PRIVMSG #chat :alice: bob is now an OP in #chat");

    say(&mut peer, BOB, "#chat", "!OP").await;
    assert_eq!(peer.recv().await, "MODE #chat +o :bob");

    say(&mut peer, ALICE, "#chat", "!DROPOP bob").await;
    assert_eq!(
        peer.recv().await,
        "PRIVMSG #chat :alice: bob is no longer an OP in #chat"
    );

    bot.disconnect("bye").await;
}

#[tokio::test]
async fn identify_after_reconnecting_from_a_new_host() {
    let (_dir, bot, mut peer) = running("").await;

    say(&mut peer, ALICE, "quarid", "!REGISTER goodpass").await;
    peer.recv().await;

    let moved = ":alice!~a@elsewhere.example.com";
    say(&mut peer, moved, "quarid", "!REGCHAN #x").await;
    assert_eq!(peer.recv().await, "PRIVMSG alice :Must login");

    say(&mut peer, moved, "quarid", "!IDENTIFY nope-wrong").await;
    assert_eq!(peer.recv().await, "PRIVMSG alice :Incorrect password");

    say(&mut peer, moved, "quarid", "!IDENTIFY goodpass").await;
    assert_eq!(peer.recv().await, "PRIVMSG alice :Logged In");

    say(&mut peer, moved, "quarid", "!REGCHAN #x").await;
    assert_eq!(peer.recv().await, "PRIVMSG alice :You are now the owner of #x");

    bot.disconnect("bye").await;
}

#[tokio::test]
async fn global_operator_can_op_anywhere() {
    let (_dir, bot, mut peer) = running(r#"admins = ["*!*@example.org"]"#).await;

    say(&mut peer, BOB, "#unregistered", "!OP").await;
    assert_eq!(peer.recv().await, "MODE #unregistered +o :bob");

    bot.disconnect("bye").await;
}

#[tokio::test]
async fn usage_unknown_and_help() {
    let (_dir, bot, mut peer) = running("").await;

    say(&mut peer, ALICE, "quarid", "!REGISTER").await;
    assert_eq!(
        peer.recv().await,
        "PRIVMSG alice :Not enough params. Usage: REGISTER <password>"
    );

    say(&mut peer, ALICE, "#chat", "!frobnicate now").await;
    assert_eq!(peer.recv().await, "PRIVMSG #chat :alice: Unknown command: FROBNICATE");

    say(&mut peer, ALICE, "quarid", "!HELP SEEN").await;
    assert_eq!(
        peer.recv().await,
        "PRIVMSG alice :Usage: !SEEN <nick> - When a nick last spoke"
    );

    say(&mut peer, ALICE, "#chat", "just chatting").await;
    assert_eq!(peer.try_recv(Duration::from_millis(300)).await, None);

    bot.disconnect("bye").await;
}

#[tokio::test]
async fn seen_reports_last_channel_message() {
    let (_dir, bot, mut peer) = running("").await;

    say(&mut peer, BOB, "#chat", "hello there").await;
    // the tracker runs concurrently with the router; give it a moment
    tokio::time::sleep(Duration::from_millis(200)).await;

    say(&mut peer, ALICE, "#chat", "!SEEN bob").await;
    let reply = peer.recv().await;
    assert!(
        reply.starts_with("PRIVMSG #chat :alice: bob was last seen in #chat at "),
        "{reply}"
    );

    bot.disconnect("bye").await;
}
