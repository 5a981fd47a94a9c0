/// Counters of a link.
///
/// Every silently dropped packet is counted somewhere here. The counters wrap around and are only
/// cleared by creating a new link, not by a link reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Stats {
    /// Payload packets accepted in sequence.
    pub accepted: u32,
    /// Payload packets handed to the application.
    pub delivered: u32,
    /// Payload frames written to the line, retransmissions included.
    pub transmitted: u32,
    /// Sent packets retired by an acknowledgment.
    pub acknowledged: u32,
    /// Packets moved back to the send queue by a retransmission timeout.
    pub retransmitted: u32,
    /// Standalone acknowledgments written to the line.
    pub acks_sent: u32,
    /// Payload packets dropped for an unexpected sequence number.
    pub out_of_sequence: u32,
    /// Payload packets acknowledged but not delivered for exceeding the receive MTU.
    pub oversized: u32,
    /// Frames dropped for an invalid header, a wrong length or undecodable content.
    pub malformed: u32,
    /// Packets not queued because the arena was full.
    pub alloc_failures: u32,
    /// Queued packets discarded in favour of a newer one.
    pub replaced: u32,
    /// Sequenced packets marked as outdated by a newer one.
    pub superseded: u32,
    /// Times the send queue had to wait for the transmit window.
    pub window_stalls: u32,
    /// Link resets, for any reason.
    pub resets: u32,
    /// Link control pings answered.
    pub pings_answered: u32,
    /// Link control ping replies received.
    pub ping_replies: u32,
}
