// Pass Protector - Gateway Module
//
// JSON-RPC 2.0 over a Unix domain socket, for scripts and local tools that
// want the same session and credential operations as the CLI.

mod protocol;
mod uds;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use uds::{Gateway, UdsServer};
