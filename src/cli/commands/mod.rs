//! Subcommands of the `pinball-bot` binary

pub mod inspect;
pub mod train;
