//! Lua runtime support emitted ahead of translated code.

/// The prelude source, embedded at build time.
pub const LUA_INIT: &str = include_str!("luainit.lua");
