//! Per-grammar packet dispatchers driven by the router.
//!
//! A dispatcher first decides whether a packet starts at a sync byte
//! ([`PacketDispatcher::find_packet`]) and, when the router accepts it,
//! delivers copies to its subscribers. `find_packet` remembers the metadata
//! of the last valid packet so dispatch does not parse it twice.

mod ascii;
mod fa;
mod fb;

pub use ascii::AsciiPacketDispatcher;
pub use fa::FaPacketDispatcher;
pub use fb::FbPacketDispatcher;

use crate::{ByteBuffer, FindPacket, SyncByte};

/// Surface shared by every dispatcher.
pub trait PacketDispatcher {
    /// Sync byte announcing this dispatcher's grammar.
    fn sync_byte(&self) -> SyncByte;

    /// Decide whether a packet starts at `sync_index`.
    fn find_packet(&mut self, buffer: &ByteBuffer, sync_index: usize) -> FindPacket;

    /// Forget any per-stream state.
    fn reset(&mut self) {}
}

/// Identifies a dispatcher in the router's search order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DispatcherKind {
    /// [`FaPacketDispatcher`].
    Fa,
    /// [`AsciiPacketDispatcher`].
    Ascii,
    /// [`FbPacketDispatcher`].
    Fb,
}

impl DispatcherKind {
    /// Search order used by the router.
    pub const ORDER: [Self; 3] = [Self::Fa, Self::Ascii, Self::Fb];

    /// Sync byte of the dispatcher.
    #[must_use]
    pub const fn sync_byte(self) -> SyncByte {
        match self {
            Self::Fa => SyncByte::Fa,
            Self::Ascii => SyncByte::Ascii,
            Self::Fb => SyncByte::Fb,
        }
    }
}
