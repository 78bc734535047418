use std::net::{TcpListener, TcpStream};
use std::thread;

use wirec_codegen_tests::client::RpcClient;
use wirec_codegen_tests::messages::*;
use wirec_codegen_tests::server::{self, ServerHandlers};
use wirec_runtime::{
    encode_frame, BoundedString, ClientId, DispatchError, FramedStream, MemoryTransport,
    Transport, TransportError, WireError,
};

#[derive(Default)]
struct Lobby {
    games: Vec<GameMetadata>,
    chats: Vec<(ClientId, Chat)>,
    confirmed: Vec<(ClientId, JoinReply)>,
    disconnected: Vec<ClientId>,
    echoes: usize,
}

impl ServerHandlers for Lobby {
    fn echo(&mut self, _client: ClientId, request: Ping) -> Pong {
        self.echoes += 1;
        Pong {
            seq: request.seq + 1,
        }
    }

    fn list_games(&mut self, _client: ClientId, _request: Empty) -> GameList {
        GameList {
            games: self.games.clone(),
        }
    }

    fn refresh_games(&mut self, _client: ClientId, _request: Empty) -> GameList {
        let mut games = self.games.clone();
        games.reverse();
        GameList { games }
    }

    fn join_game(&mut self, _client: ClientId, request: JoinRequest) -> JoinReply {
        let accepted = self.games.iter().any(|g| g.id == request.game_id);
        JoinReply {
            accepted,
            reason: BoundedString::truncated(if accepted { "welcome" } else { "no such game" }),
        }
    }

    fn say(&mut self, client: ClientId, request: Chat) {
        self.chats.push((client, request));
    }

    fn on_confirm_name_reply(&mut self, client: ClientId, response: JoinReply) {
        self.confirmed.push((client, response));
    }

    fn on_disconnect(&mut self, client: ClientId) {
        self.disconnected.push(client);
    }
}

fn lobby_with_game() -> Lobby {
    Lobby {
        games: vec![GameMetadata {
            id: 5,
            title: BoundedString::try_new("duel").expect("fits"),
            ..GameMetadata::default()
        }],
        ..Lobby::default()
    }
}

fn connected() -> (RpcClient<MemoryTransport>, MemoryTransport) {
    let (client_end, server_end) = MemoryTransport::pair();
    (RpcClient::new(client_end), server_end)
}

#[test]
fn echo_request_and_reply_bytes() {
    let (mut client, mut server_end) = connected();
    let mut lobby = Lobby::default();

    client.send_echo(&Ping { seq: 41 }).expect("send");
    let frame = server_end.receive().expect("recv").expect("frame");
    assert_eq!(frame, vec![0x01, 0, 0, 0, 41]);

    server::dispatch(&mut lobby, ClientId(1), &mut server_end, &frame).expect("dispatch");
    let reply = client.transport_mut().receive().expect("recv").expect("reply");
    assert_eq!(reply, vec![0x01, 0, 0, 0, 42]);

    assert!(!client.has_pending());
    assert!(client.handle_rpc(&reply).expect("handle"));
    assert!(client.has_pending());
    assert_eq!(client.peek_pong(), Some(&Pong { seq: 42 }));
    assert_eq!(client.take_pong(), Some(Pong { seq: 42 }));
    assert_eq!(client.take_pong(), None);
    assert!(!client.has_pending());
}

#[test]
fn mailbox_keeps_only_the_latest_response() {
    let (mut client, mut server_end) = connected();
    let mut lobby = Lobby::default();
    for seq in [1, 2, 3] {
        client.send_echo(&Ping { seq }).expect("send");
    }
    let handled = server::serve_pending(&mut lobby, ClientId(1), &mut server_end).expect("serve");
    assert_eq!(handled, 3);
    assert_eq!(client.poll().expect("poll"), 3);
    assert_eq!(client.take_pong(), Some(Pong { seq: 4 }));
    assert_eq!(client.take_pong(), None);
}

#[test]
fn request_response_with_records() {
    let (mut client, mut server_end) = connected();
    let mut lobby = lobby_with_game();

    client.send_list_games(&Empty {}).expect("send");
    client
        .send_join_game(&JoinRequest {
            game_id: 9,
            player: Player::default(),
        })
        .expect("send");
    server::serve_pending(&mut lobby, ClientId(2), &mut server_end).expect("serve");
    client.poll().expect("poll");

    let list = client.take_game_list().expect("game list");
    assert_eq!(list.games.len(), 1);
    assert_eq!(list.games[0].title, "duel");
    let reply = client.take_join_reply().expect("join reply");
    assert!(!reply.accepted);
    assert_eq!(reply.reason, "no such game");
}

#[test]
fn procedures_answering_the_same_type_share_one_mailbox() {
    let (mut client, mut server_end) = connected();
    let mut lobby = lobby_with_game();
    lobby.games.push(GameMetadata {
        id: 6,
        ..GameMetadata::default()
    });

    client.send_list_games(&Empty {}).expect("send");
    client.send_refresh_games(&Empty {}).expect("send");
    server::serve_pending(&mut lobby, ClientId(2), &mut server_end).expect("serve");
    assert_eq!(client.poll().expect("poll"), 2);

    let latest = client.take_game_list().expect("game list");
    let ids: Vec<i32> = latest.games.iter().map(|g| g.id).collect();
    assert_eq!(ids, [6, 5]);
    assert_eq!(client.take_game_list(), None);
    assert!(!client.has_pending());
}

#[test]
fn oneway_procedure_sends_no_reply() {
    let (mut client, mut server_end) = connected();
    let mut lobby = Lobby::default();
    let chat = Chat {
        r#type: BoundedString::try_new("whisper").expect("fits"),
        channel: 3,
    };
    client.send_say(&chat).expect("send");
    server::serve_pending(&mut lobby, ClientId(8), &mut server_end).expect("serve");
    assert_eq!(lobby.chats, vec![(ClientId(8), chat)]);
    assert_eq!(client.poll().expect("poll"), 0);
    assert!(!client.has_pending());
}

#[test]
fn server_initiated_procedures_reach_client_mailboxes() {
    let (mut client, mut server_end) = connected();
    let mut lobby = Lobby::default();
    let game = lobby_with_game().games.remove(0);

    server::send_game_starting(&mut server_end, &game).expect("send");
    server::send_kick(&mut server_end, &Empty {}).expect("send");
    server::send_confirm_name(
        &mut server_end,
        &Player {
            id: 3,
            name: BoundedString::try_new("ana").expect("fits"),
            ready: true,
        },
    )
    .expect("send");

    let frame = client.transport_mut().receive().expect("recv").expect("frame");
    assert_eq!(frame[0], ClientProc::GameStarting.wire_byte());
    assert!(client.handle_rpc(&frame).expect("handle"));
    assert_eq!(client.poll().expect("poll"), 2);

    assert_eq!(client.take_game_metadata(), Some(game));
    assert_eq!(client.take_empty(), Some(Empty {}));
    let asked = client.take_player().expect("confirm request");
    assert_eq!(asked.name, "ana");

    client
        .reply_confirm_name(&JoinReply {
            accepted: true,
            reason: BoundedString::new(),
        })
        .expect("reply");
    server::serve_pending(&mut lobby, ClientId(7), &mut server_end).expect("serve");
    assert_eq!(lobby.confirmed.len(), 1);
    assert_eq!(lobby.confirmed[0].0, ClientId(7));
    assert!(lobby.confirmed[0].1.accepted);
}

#[test]
fn server_rejects_bad_frames_without_calling_handlers() {
    let (_client_end, mut server_end) = MemoryTransport::pair();
    let mut lobby = Lobby::default();

    let err = server::dispatch(&mut lobby, ClientId(1), &mut server_end, &[0x7f])
        .expect_err("unknown opcode");
    assert!(matches!(err, DispatchError::UnknownOpcode(0x7f)));
    assert!(err.is_recoverable());

    // GameStarting is oneway, so the server has nothing to decode for it.
    let err = server::dispatch(&mut lobby, ClientId(1), &mut server_end, &[0x81])
        .expect_err("oneway client procedure");
    assert!(matches!(err, DispatchError::UnknownOpcode(0x81)));

    let err = server::dispatch(&mut lobby, ClientId(1), &mut server_end, &[])
        .expect_err("empty frame");
    assert!(matches!(err, DispatchError::EmptyFrame));

    let err = server::dispatch(&mut lobby, ClientId(1), &mut server_end, &[0x01, 0, 0])
        .expect_err("short payload");
    assert!(matches!(
        err,
        DispatchError::Wire(WireError::UnexpectedEof { .. })
    ));

    let err = server::dispatch(&mut lobby, ClientId(1), &mut server_end, &[0x01, 0, 0, 0, 1, 9])
        .expect_err("trailing byte");
    assert!(matches!(
        err,
        DispatchError::TrailingBytes {
            opcode: 0x01,
            extra: 1
        }
    ));
    assert_eq!(lobby.echoes, 0);
}

#[test]
fn serve_pending_drops_bad_frames_and_continues() {
    let (mut client, mut server_end) = connected();
    let mut lobby = Lobby::default();
    client.transport_mut().send(&[0x7f, 1, 2]).expect("send");
    client.send_echo(&Ping { seq: 1 }).expect("send");
    client.transport_mut().send(&[]).expect("send");
    client.send_echo(&Ping { seq: 10 }).expect("send");

    let handled = server::serve_pending(&mut lobby, ClientId(1), &mut server_end).expect("serve");
    assert_eq!(handled, 2);
    assert_eq!(lobby.echoes, 2);
}

#[test]
fn client_ignores_unknown_opcodes() {
    let (mut client, mut server_end) = connected();
    assert!(!client.handle_rpc(&[0x7f]).expect("unknown"));
    // Say is oneway: the client never expects its response.
    assert!(!client.handle_rpc(&[ServerProc::Say.wire_byte()]).expect("no slot"));
    assert!(matches!(client.handle_rpc(&[]), Err(DispatchError::EmptyFrame)));

    server_end.send(&[0x7f]).expect("send");
    let pong = encode_frame(ServerProc::Echo.wire_byte(), &Pong { seq: 5 }).expect("encode");
    server_end.send(pong.as_bytes()).expect("send");
    assert_eq!(client.poll().expect("poll"), 1);
    assert_eq!(client.take_pong(), Some(Pong { seq: 5 }));
}

#[test]
fn clear_all_drops_flags_but_not_values() {
    let (mut client, mut server_end) = connected();
    server::send_kick(&mut server_end, &Empty {}).expect("send");
    client.poll().expect("poll");
    assert!(client.has_pending());
    client.clear_all();
    assert!(!client.has_pending());
    assert_eq!(client.take_empty(), None);
    assert_eq!(client.peek_empty(), None);
}

#[test]
fn broadcast_reaches_every_live_peer() {
    let (mut ana, ana_end) = connected();
    let (mut bob, bob_end) = connected();
    let (carl, carl_end) = connected();
    carl.transport().close();
    let game = lobby_with_game().games.remove(0);

    let mut peers = vec![ana_end, bob_end, carl_end];
    let accepted = server::broadcast_game_starting(peers.iter_mut(), &game).expect("broadcast");
    assert_eq!(accepted, 2);

    for client in [&mut ana, &mut bob] {
        assert_eq!(client.poll().expect("poll"), 1);
        assert_eq!(client.take_game_metadata(), Some(game.clone()));
    }
}

#[test]
fn transport_failure_notifies_the_handlers() {
    let (client, mut server_end) = connected();
    let mut lobby = Lobby::default();
    client.transport().close();

    let err = server::serve_pending(&mut lobby, ClientId(4), &mut server_end)
        .expect_err("closed peer");
    assert!(matches!(err, DispatchError::Transport(TransportError::Closed)));
    assert_eq!(lobby.disconnected, [ClientId(4)]);
}

#[test]
fn bad_frames_do_not_disconnect() {
    let (mut client, mut server_end) = connected();
    let mut lobby = Lobby::default();
    client.transport_mut().send(&[0x7f]).expect("send");
    server::serve_pending(&mut lobby, ClientId(1), &mut server_end).expect("serve");
    assert!(lobby.disconnected.is_empty());
}

#[test]
fn closed_transport_ends_polling() {
    let (mut client, server_end) = connected();
    server_end.close();
    let err = client.poll().expect_err("closed");
    assert!(matches!(err, DispatchError::Transport(TransportError::Closed)));
    assert!(!err.is_recoverable());
    assert!(client.send_echo(&Ping::default()).is_err());
}

#[test]
fn echo_over_tcp_with_framed_stream() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");

    let server_thread = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut peer = FramedStream::new(stream);
        let mut lobby = Lobby::default();
        let result = server::serve_pending(&mut lobby, ClientId(1), &mut peer);
        (lobby.echoes, lobby.disconnected, result)
    });

    let stream = TcpStream::connect(addr).expect("connect");
    let mut client = RpcClient::new(FramedStream::new(stream));
    client.send_echo(&Ping { seq: 99 }).expect("send");
    let frame = client.transport_mut().receive().expect("recv").expect("frame");
    assert!(client.handle_rpc(&frame).expect("handle"));
    assert_eq!(client.take_pong(), Some(Pong { seq: 100 }));
    drop(client);

    let (echoes, disconnected, result) = server_thread.join().expect("server thread");
    assert_eq!(echoes, 1);
    assert_eq!(disconnected, [ClientId(1)]);
    assert!(matches!(
        result,
        Err(DispatchError::Transport(TransportError::Closed))
    ));
}
