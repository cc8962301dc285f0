//! CLI command implementations.
//!
//! Each submodule owns one `Commands` variant:
//!
//! | Module          | Commands handled |
//! |-----------------|------------------|
//! | `translate`     | `Translate`      |
//! | `replay`        | `Replay`         |
//! | `config`        | `Config`         |

pub mod config;
pub mod replay;
pub mod translate;

pub use config::cmd_config;
pub use replay::cmd_replay;
pub use translate::cmd_translate;
