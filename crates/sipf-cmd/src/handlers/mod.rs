//! Command handlers, one `impl CommandSession` block per command group.

mod admin;
mod file;
mod gnss;
mod object;
mod register;
