use replikv::{
    Envelope, GetResponse, KvClient, Message, NodeAddress, NodeHandle, PutResponse, ServerConfig,
    WireError,
};

#[tokio::test]
async fn leader_alone_commits_and_serves_reads() {
    let leader = start_leader(21010).await;
    let mut client = client_for(&[&leader]);

    let put = client.put("a", "1").await.unwrap();
    assert_eq!(
        put,
        PutResponse::Committed {
            key: "a".into(),
            value: "1".into(),
            server_version: 1,
            server: addr(21010),
        }
    );
    assert_eq!(client.tracked_version("a"), 1);

    let get = client.get("a").await.unwrap();
    assert_eq!(
        get,
        GetResponse::Found {
            key: "a".into(),
            value: Some("1".into()),
            server_version: 1,
            server: addr(21010),
        }
    );
}

#[tokio::test]
async fn put_replicates_synchronously_to_the_follower() {
    let leader = start_leader(21020).await;
    let follower = start_follower(21021, 21020).await;

    let mut client = client_for(&[&leader]);
    client.put("b", "x").await.unwrap();

    // PUT_OK implies the follower already applied the write.
    let lookup = follower.store().read("b");
    assert_eq!(lookup.value.as_deref(), Some("x"));
    assert_eq!(lookup.version, 1);

    // And the follower serves it, passing the staleness check of a client
    // that just observed version 1.
    let mut follower_client = client_for(&[&follower]);
    follower_client.put("b2", "y").await.unwrap(); // forwarded to the leader
    let get = follower_client.get("b2").await.unwrap();
    match get {
        GetResponse::Found {
            value,
            server_version,
            ..
        } => {
            assert_eq!(value.as_deref(), Some("y"));
            assert_eq!(server_version, 1);
        }
        other => panic!("expected Found, got {:?}", other),
    }
}

#[tokio::test]
async fn follower_forwards_puts_and_relays_the_leader_reply() {
    let leader = start_leader(21030).await;
    let follower = start_follower(21031, 21030).await;

    // The client only knows the follower.
    let mut client = client_for(&[&follower]);
    let put = client.put("k", "v").await.unwrap();

    assert_eq!(
        put,
        PutResponse::Committed {
            key: "k".into(),
            value: "v".into(),
            server_version: 1,
            server: addr(21031),
        }
    );
    assert_eq!(leader.store().read("k").version, 1);
}

#[tokio::test]
async fn get_on_a_never_written_key_is_the_null_sentinel() {
    let leader = start_leader(21040).await;
    let mut client = client_for(&[&leader]);

    let get = client.get("ghost").await.unwrap();
    assert_eq!(
        get,
        GetResponse::Found {
            key: "ghost".into(),
            value: None,
            server_version: 0,
            server: addr(21040),
        }
    );
}

#[tokio::test]
async fn read_behind_the_client_is_rejected_and_leaves_the_store_alone() {
    let leader = start_leader(21050).await;
    let mut client = client_for(&[&leader]);
    for value in ["1", "2", "3"] {
        client.put("c", value).await.unwrap();
    }

    // A tracker holding version 5 against a server at version 3.
    let reply = replikv::request(
        &addr(21050),
        Envelope::unaddressed(Message::Get {
            key: "c".into(),
            client_version: 5,
        }),
    )
    .await
    .unwrap();

    assert_eq!(
        reply.message,
        Message::TryOtherServerOrLater { key: "c".into() }
    );
    // Responses carry the responder's address.
    assert_eq!(reply.sender, Some(addr(21050)));
    assert_eq!(leader.store().read("c").version, 3);
}

#[tokio::test]
async fn late_joining_follower_catches_up_to_the_leader_store() {
    let leader = start_leader(21060).await;
    let mut client = client_for(&[&leader]);
    client.put("a", "1").await.unwrap();
    client.put("a", "2").await.unwrap();
    client.put("b", "x").await.unwrap();

    let follower = start_follower(21061, 21060).await;

    assert_eq!(follower.store().snapshot(), leader.store().snapshot());
    assert_eq!(follower.store().read("a").version, 2);
}

#[tokio::test]
async fn versions_observed_by_one_client_never_go_backwards() {
    let leader = start_leader(21070).await;
    let follower = start_follower(21071, 21070).await;

    // Random server per request; replication is synchronous, so every read
    // must pass the staleness check no matter which node serves it.
    let mut client = client_for(&[&leader, &follower]);

    let mut last_version = 0;
    for i in 0..10 {
        let value = format!("v{}", i);
        match client.put("m", &value).await.unwrap() {
            PutResponse::Committed { server_version, .. } => {
                assert!(server_version > last_version);
                last_version = server_version;
            }
            other => panic!("unexpected put outcome: {:?}", other),
        }

        match client.get("m").await.unwrap() {
            GetResponse::Found { server_version, .. } => {
                assert!(server_version >= last_version);
                last_version = server_version;
            }
            other => panic!("unexpected get outcome: {:?}", other),
        }
    }
}

#[tokio::test]
async fn replication_failure_keeps_the_leader_commit_and_tells_the_client_to_retry() {
    let leader = start_leader(21080).await;

    // Register a follower that is not listening. FOLLOW itself succeeds;
    // the leader does not health-check.
    let reply = replikv::request(
        &addr(21080),
        Envelope::unaddressed(Message::Follow {
            follower_address: addr(21089),
        }),
    )
    .await
    .unwrap();
    assert!(matches!(reply.message, Message::FollowOk { .. }));

    let mut client = client_for(&[&leader]);
    let put = client.put("a", "1").await.unwrap();

    assert_eq!(put, PutResponse::RetryLater { key: "a".into() });
    // The local commit stands and the tracker was not advanced.
    assert_eq!(leader.store().read("a").version, 1);
    assert_eq!(client.tracked_version("a"), 0);
}

#[tokio::test]
async fn unrouteable_requests_close_the_connection_without_a_payload() {
    let _leader = start_leader(21090).await;

    let result = replikv::request(
        &addr(21090),
        Envelope::unaddressed(Message::ReplicationOk { key: "a".into() }),
    )
    .await;

    match result {
        Err(WireError::ClosedWithoutPayload) => {}
        other => panic!(
            "expected ClosedWithoutPayload, got {:?}",
            other.map(|_| ())
        ),
    }
}

// ------- Helpers --------

fn addr(port: u16) -> NodeAddress {
    NodeAddress::new("127.0.0.1", port)
}

fn test_logger() -> slog::Logger {
    slog::Logger::root(slog::Discard, slog::o!())
}

async fn start_leader(port: u16) -> NodeHandle {
    replikv::start_node(
        test_logger(),
        ServerConfig {
            bind_address: addr(port),
            leader_address: addr(port),
        },
    )
    .await
    .expect("leader failed to start")
}

async fn start_follower(port: u16, leader_port: u16) -> NodeHandle {
    replikv::start_node(
        test_logger(),
        ServerConfig {
            bind_address: addr(port),
            leader_address: addr(leader_port),
        },
    )
    .await
    .expect("follower failed to start")
}

fn client_for(nodes: &[&NodeHandle]) -> KvClient {
    let mut client = KvClient::new(test_logger());
    client.register_servers(nodes.iter().map(|n| n.address().clone()).collect());
    client
}
