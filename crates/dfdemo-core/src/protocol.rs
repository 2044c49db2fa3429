//! Fixed protocol constants shared across the stream, snapshot, and string layers.
//!
//! Widths and indices come from ioquake3's `qcommon/qcommon.h` and `msg.c`, which is
//! the protocol Defrag demos were recorded against.

pub const Q3_MESSAGE_MAX_SIZE: i32 = 16384;

pub const GENTITYNUM_BITS: i32 = 10;
pub const MAX_GENTITIES: i32 = 1 << GENTITYNUM_BITS;
pub const MAX_PARSE_ENTITIES: usize = 2048;

pub const PACKET_MASK: i32 = 31;
pub const PACKET_BACKUP: i32 = 32;

pub const MAX_STATS: usize = 16;
pub const MAX_PERSISTANT: usize = 16;
pub const MAX_POWERUPS: usize = 16;
pub const MAX_WEAPONS: usize = 16;

pub const MAX_CONFIGSTRINGS: i32 = 1024;
pub const MAX_MAP_AREA_BYTES: usize = 16;

pub const FLOAT_INT_BITS: i32 = 13;
pub const FLOAT_INT_BIAS: i32 = 1 << (FLOAT_INT_BITS - 1);

pub const Q3_HUFFMAN_NYT_SYM: i32 = 256;
pub const Q3_PERCENT_CHAR_BYTE: i32 = 37;
pub const Q3_DOT_CHAR_BYTE: i32 = 46;
pub const Q3_MAX_STRING_CHARS: usize = 1024;
pub const Q3_BIG_INFO_STRING: usize = 8192;

/// `CS_SERVERINFO` — the game config string.
pub const Q3_DEMO_CFG_FIELD_GAME: i32 = 0;
/// `CS_SYSTEMINFO` — the client (engine) config string.
pub const Q3_DEMO_CFG_FIELD_CLIENT: i32 = 1;
/// Base index of the 32-entry player-info config string block.
pub const Q3_DEMO_CFG_FIELD_PLAYER: i32 = 544;
/// Alias kept for callers reading the raw map field straight off the game config.
pub const Q3_DEMO_CFG_FIELD_MAP: i32 = Q3_DEMO_CFG_FIELD_GAME;

/// Top-level server message opcodes (`svc_ops_e` in ioquake3).
pub mod svc {
    pub const BAD: i32 = 0;
    pub const NOP: i32 = 1;
    pub const GAMESTATE: i32 = 2;
    pub const CONFIGSTRING: i32 = 3;
    pub const BASELINE: i32 = 4;
    pub const SERVERCOMMAND: i32 = 5;
    pub const DOWNLOAD: i32 = 6;
    pub const SNAPSHOT: i32 = 7;
    pub const EOF: i32 = 8;
}
