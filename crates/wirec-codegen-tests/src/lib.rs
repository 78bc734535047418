//! Generated from `schema/lobby.wirec` by `build.rs`.

pub mod messages {
    include!(concat!(env!("OUT_DIR"), "/generated_messages.rs"));
}

pub mod server {
    include!(concat!(env!("OUT_DIR"), "/generated_rpc_server.rs"));
}

pub mod client {
    include!(concat!(env!("OUT_DIR"), "/generated_rpc_client.rs"));
}
