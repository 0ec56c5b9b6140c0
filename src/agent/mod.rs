pub mod drag;
pub use drag::*;

pub mod oracle;
pub use oracle::*;

pub mod random_oracle;
pub use random_oracle::RandomOracle;

pub mod uci_oracle;
pub use uci_oracle::UciOracle;
