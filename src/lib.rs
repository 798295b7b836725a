pub mod core {
    pub mod config;
    pub mod error;
    pub mod registry;
    pub mod types;
}

pub mod blockchain {
    pub mod memory;
    pub mod rpc_client;
}

pub mod layout;

pub mod protocol;

pub mod utils {
    pub mod pda;
    pub mod token;
}

pub use blockchain::{memory, rpc_client};
pub use core::{config, error, registry, types};
pub use protocol::{DecodedAccount, Protocol, ProtocolRegistry};
pub use utils::{pda, token};
