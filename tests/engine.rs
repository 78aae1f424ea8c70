//! End-to-end tests driving a full [`Engine`] over an in-memory duplex
//! byte stream against the in-memory reference Store/Identity/Policy,
//! asserting on the literal response bytes the way a real client would
//! see them.

use chrono::Utc;
use nntp_postus::engine::{Engine, EngineConfig};
use nntp_postus::identity::memory::MemoryIdentity;
use nntp_postus::policy::default::DefaultPolicy;
use nntp_postus::store::memory::MemoryStore;
use nntp_postus::store::{PostingMode, Store};
use nntp_postus::wire::NewsgroupName;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

fn config() -> EngineConfig {
    EngineConfig {
        server_name: "postus.example".into(),
        server_version: "0.1.0".into(),
        local_log_group: NewsgroupName::parse("local.nntp.postus.log").unwrap(),
        idle_timeout: Duration::from_secs(5),
    }
}

struct Client {
    reader: BufReader<tokio::io::DuplexStream>,
}

/// Drive a session: bind a fresh in-memory store/identity/policy trio,
/// spawn an `Engine` over one half of a duplex pair, and hand back the
/// other half for the test to script against.
async fn spawn(store: Arc<MemoryStore>, identity: Arc<MemoryIdentity>, policy: Arc<DefaultPolicy>) -> Client {
    let (client_half, server_half) = tokio::io::duplex(8192);
    let engine = Engine::new(store, identity, policy, config());
    tokio::spawn(async move {
        let _ = engine.run(server_half).await;
    });
    Client {
        reader: BufReader::new(client_half),
    }
}

impl Client {
    async fn send(&mut self, line: &str) {
        let writer = self.reader.get_mut();
        writer.write_all(line.as_bytes()).await.unwrap();
        writer.write_all(b"\r\n").await.unwrap();
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        self.reader.get_mut().write_all(bytes).await.unwrap();
    }

    async fn read_line(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).await.unwrap();
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        line
    }

    async fn read_until_dot(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line().await;
            if line == "." {
                break;
            }
            lines.push(line);
        }
        lines
    }
}

fn fresh_services(allow_anonymous_posting: bool) -> (Arc<MemoryStore>, Arc<MemoryIdentity>, Arc<DefaultPolicy>) {
    (
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryIdentity::new("postus.example")),
        Arc::new(DefaultPolicy::new(allow_anonymous_posting, None)),
    )
}

#[tokio::test]
async fn greeting_then_quit() {
    let (store, identity, policy) = fresh_services(false);
    let mut client = spawn(store, identity, policy).await;

    let greeting = client.read_line().await;
    assert_eq!(greeting, "201 postus.example 0.1.0");

    client.send("QUIT").await;
    assert_eq!(client.read_line().await, "205 closing connection");
}

#[tokio::test]
async fn greeting_reports_200_when_anonymous_posting_allowed() {
    let (store, identity, policy) = fresh_services(true);
    let mut client = spawn(store, identity, policy).await;
    assert_eq!(client.read_line().await, "200 postus.example 0.1.0");
}

#[tokio::test]
async fn date_reports_compact_utc_timestamp() {
    let (store, identity, policy) = fresh_services(false);
    let mut client = spawn(store, identity, policy).await;
    client.read_line().await; // greeting

    client.send("DATE").await;
    let line = client.read_line().await;
    assert!(line.starts_with("111 "));
    let stamp = &line[4..];
    assert_eq!(stamp.len(), 14);
    assert!(stamp.bytes().all(|b| b.is_ascii_digit()));
}

#[tokio::test]
async fn capabilities_lists_version_first() {
    let (store, identity, policy) = fresh_services(false);
    let mut client = spawn(store, identity, policy).await;
    client.read_line().await;

    client.send("CAPABILITIES").await;
    assert_eq!(client.read_line().await, "101 capability list follows");
    assert_eq!(client.read_line().await, "VERSION 2");
    let rest = client.read_until_dot().await;
    assert!(rest.contains(&"READER".to_string()));
    assert!(rest.contains(&"IHAVE".to_string()));
}

#[tokio::test]
async fn mode_reader_drops_ihave_from_capabilities() {
    let (store, identity, policy) = fresh_services(true);
    let mut client = spawn(store, identity, policy).await;
    client.read_line().await;

    client.send("MODE READER").await;
    assert_eq!(client.read_line().await, "200 Posting allowed");

    client.send("CAPABILITIES").await;
    client.read_line().await; // 101
    client.read_line().await; // VERSION 2
    let rest = client.read_until_dot().await;
    assert!(!rest.contains(&"IHAVE".to_string()));
    assert!(rest.contains(&"POST".to_string()));
}

#[tokio::test]
async fn group_select_on_empty_group_then_article_has_no_current() {
    let (store, identity, policy) = fresh_services(false);
    store
        .add_group(
            NewsgroupName::parse("misc.empty").unwrap(),
            "an empty group".into(),
            PostingMode::Allowed,
            Utc::now(),
            "admin".into(),
            false,
        )
        .await
        .unwrap();

    let mut client = spawn(store, identity, policy).await;
    client.read_line().await;

    client.send("GROUP misc.empty").await;
    assert_eq!(client.read_line().await, "211 0 0 -1 misc.empty");

    client.send("ARTICLE").await;
    assert_eq!(client.read_line().await, "420 no current article selected");
}

#[tokio::test]
async fn group_unknown_reports_411() {
    let (store, identity, policy) = fresh_services(false);
    let mut client = spawn(store, identity, policy).await;
    client.read_line().await;

    client.send("GROUP nowhere.at.all").await;
    assert_eq!(client.read_line().await, "411 no such newsgroup: nowhere.at.all");
}

async fn seed_group(store: &MemoryStore, name: &str, mode: PostingMode) {
    store
        .add_group(
            NewsgroupName::parse(name).unwrap(),
            "desc".into(),
            mode,
            Utc::now(),
            "admin".into(),
            false,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn post_synthesizes_message_id_and_cross_posts() {
    let (store, identity, policy) = fresh_services(true);
    seed_group(&store, "g1", PostingMode::Allowed).await;
    seed_group(&store, "g2", PostingMode::Allowed).await;

    let mut client = spawn(store.clone(), identity, policy).await;
    client.read_line().await;

    client.send("POST").await;
    assert_eq!(client.read_line().await, "340 send article; end with CRLF.CRLF");
    client
        .send_raw(b"Newsgroups: g1,g2\r\nFrom: a@b\r\nSubject: s\r\n\r\nhello\r\n.\r\n")
        .await;
    let response = client.read_line().await;
    assert!(response.starts_with("240 <"));
    let message_id = response.trim_start_matches("240 ").to_string();

    assert!(store.has_article(&nntp_postus::wire::MessageId::parse(&message_id).unwrap()).await.unwrap());

    client
        .send(&format!("STAT {}", message_id))
        .await;
    let stat = client.read_line().await;
    // No group is selected yet, so the Message-ID lookup reports article
    // number 0 rather than its number within g1/g2 (spec §4.11).
    assert!(stat.starts_with("223 0 "));

    client.send("GROUP g2").await;
    assert_eq!(client.read_line().await, "211 1 1 1 g2");
}

#[tokio::test]
async fn post_without_permission_is_refused() {
    let (store, identity, policy) = fresh_services(false);
    seed_group(&store, "g1", PostingMode::Allowed).await;
    let mut client = spawn(store, identity, policy).await;
    client.read_line().await;

    client.send("POST").await;
    assert_eq!(client.read_line().await, "440 posting not allowed");
}

#[tokio::test]
async fn ihave_rejects_duplicate_message_id() {
    let (store, identity, policy) = fresh_services(true);
    seed_group(&store, "g1", PostingMode::Allowed).await;

    let id = nntp_postus::wire::MessageId::parse("<dup@host>").unwrap();
    let headers = {
        let mut h = nntp_postus::article::ArticleHeaders::new();
        h.set("Message-ID", "<dup@host>".into());
        h.set("Newsgroups", "g1".into());
        h
    };
    store
        .add_article(&NewsgroupName::parse("g1").unwrap(), &id, &headers, "body", false)
        .await
        .unwrap();

    let mut client = spawn(store, identity, policy).await;
    client.read_line().await;

    client.send("IHAVE <dup@host>").await;
    assert_eq!(client.read_line().await, "435 article not wanted");
}

#[tokio::test]
async fn ihave_accepts_and_reports_235_before_distribution_outcome() {
    let (store, identity, policy) = fresh_services(true);
    seed_group(&store, "g1", PostingMode::Allowed).await;

    let mut client = spawn(store.clone(), identity, policy).await;
    client.read_line().await;

    client.send("IHAVE <fresh@peer>").await;
    assert_eq!(client.read_line().await, "335 send article; end with CRLF.CRLF");
    client
        .send_raw(b"Newsgroups: g1\r\nFrom: a@b\r\nSubject: s\r\nMessage-ID: <fresh@peer>\r\n\r\nbody\r\n.\r\n")
        .await;
    assert_eq!(client.read_line().await, "235 article transferred OK");

    // Ingestion runs after 235 is written but is still awaited inline
    // before the handler returns, so it has already completed here.
    assert!(store
        .has_article(&nntp_postus::wire::MessageId::parse("<fresh@peer>").unwrap())
        .await
        .unwrap());
}

#[tokio::test]
async fn authinfo_user_unknown_subject_is_rejected() {
    let (store, identity, policy) = fresh_services(false);
    let mut client = spawn(store, identity, policy).await;
    client.read_line().await;

    client.send("AUTHINFO USER nobody").await;
    assert_eq!(client.read_line().await, "481 authentication rejected");
}

#[tokio::test]
async fn authinfo_user_pass_round_trip_succeeds() {
    let (store, identity, policy) = fresh_services(false);
    identity.register("alice", Some("secret".into())).await;
    let mut client = spawn(store, identity, policy).await;
    client.read_line().await;

    client.send("AUTHINFO USER alice").await;
    assert_eq!(client.read_line().await, "381 password required");

    client.send("AUTHINFO PASS wrong").await;
    assert_eq!(client.read_line().await, "481 authentication rejected");

    client.send("AUTHINFO USER alice").await;
    assert_eq!(client.read_line().await, "381 password required");
    client.send("AUTHINFO PASS secret").await;
    assert_eq!(client.read_line().await, "281 authentication accepted");
}

#[tokio::test]
async fn authinfo_pass_without_user_is_out_of_sequence() {
    let (store, identity, policy) = fresh_services(false);
    let mut client = spawn(store, identity, policy).await;
    client.read_line().await;

    client.send("AUTHINFO PASS whatever").await;
    assert_eq!(client.read_line().await, "482 authentication commands out of sequence");
}

#[tokio::test]
async fn list_active_reports_group_and_filters_by_wildmat() {
    let (store, identity, policy) = fresh_services(false);
    seed_group(&store, "comp.lang.rust", PostingMode::Allowed).await;
    seed_group(&store, "misc.test", PostingMode::Moderated).await;

    let mut client = spawn(store, identity, policy).await;
    client.read_line().await;

    client.send("LIST ACTIVE comp.*").await;
    assert_eq!(client.read_line().await, "215 list of newsgroups follows");
    let lines = client.read_until_dot().await;
    assert_eq!(lines, vec!["comp.lang.rust -1 0 y".to_string()]);
}

#[tokio::test]
async fn over_on_empty_range_reports_423() {
    let (store, identity, policy) = fresh_services(false);
    seed_group(&store, "g1", PostingMode::Allowed).await;
    let mut client = spawn(store, identity, policy).await;
    client.read_line().await;

    client.send("GROUP g1").await;
    client.read_line().await;
    client.send("OVER 1-1").await;
    assert_eq!(client.read_line().await, "423 no articles in that range");
}

#[tokio::test]
async fn over_range_reports_eight_field_overview_line() {
    let (store, identity, policy) = fresh_services(true);
    seed_group(&store, "g1", PostingMode::Allowed).await;

    let mut client = spawn(store, identity, policy).await;
    client.read_line().await;

    client.send("POST").await;
    client.read_line().await; // 340
    client
        .send_raw(b"Newsgroups: g1\r\nFrom: a@b\r\nSubject: hi\r\n\r\nhello world\r\n.\r\n")
        .await;
    client.read_line().await; // 240 ...

    client.send("GROUP g1").await;
    assert_eq!(client.read_line().await, "211 1 1 1 g1");
    client.send("OVER 1-1").await;
    assert_eq!(client.read_line().await, "224 overview information follows");
    let lines = client.read_until_dot().await;
    assert_eq!(lines.len(), 1);
    let fields: Vec<&str> = lines[0].split('\t').collect();
    assert_eq!(fields.len(), 8);
    assert_eq!(fields[0], "1");
    assert_eq!(fields[1], "hi");
}

#[tokio::test]
async fn unknown_command_reports_502() {
    let (store, identity, policy) = fresh_services(false);
    let mut client = spawn(store, identity, policy).await;
    client.read_line().await;

    client.send("FROBNICATE").await;
    assert_eq!(client.read_line().await, "502 command not available");
}
