use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use chipledger_protocol::{
    DEFAULT_ALL_IN_MIN_STACK, DEFAULT_CODE_LEN, DEFAULT_LOG_CAPACITY, DEFAULT_STACK,
};
use clap::builder::TypedValueParser;
use clap::Args;

/// Server knobs. Every flag can also come from the environment.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "CHIPLEDGER_BIND", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,
    /// Smallest stack allowed to use the explicit all-in action
    #[arg(long, env = "ALL_IN_MIN_STACK", default_value_t = DEFAULT_ALL_IN_MIN_STACK)]
    pub all_in_min_stack: u64,
    /// Stack given to a new seat when none (or garbage) is requested
    #[arg(long, env = "DEFAULT_STACK", default_value_t = DEFAULT_STACK)]
    pub default_stack: u64,
    /// Number of log lines kept per room
    #[arg(long, env = "LOG_CAPACITY", default_value_t = DEFAULT_LOG_CAPACITY)]
    pub log_capacity: usize,
    /// Length of generated room codes
    #[arg(long, env = "ROOM_CODE_LEN", default_value_t = DEFAULT_CODE_LEN,
          value_parser = clap::value_parser!(u8).range(1..=16).map(usize::from))]
    pub code_len: usize,
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn rules(&self) -> RulesConfig {
        RulesConfig {
            all_in_min_stack: self.all_in_min_stack,
            default_stack: self.default_stack,
            log_capacity: self.log_capacity,
            code_len: self.code_len,
        }
    }
}

/// The part of the configuration the table logic cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RulesConfig {
    pub all_in_min_stack: u64,
    pub default_stack: u64,
    pub log_capacity: usize,
    pub code_len: usize,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            all_in_min_stack: DEFAULT_ALL_IN_MIN_STACK,
            default_stack: DEFAULT_STACK,
            log_capacity: DEFAULT_LOG_CAPACITY,
            code_len: DEFAULT_CODE_LEN,
        }
    }
}
