enum_with_unknown! {
    /// The single octet frames of the handshake.
    ///
    /// A frame whose content is exactly one octet never carries a header, it is always one of these
    /// codes. They are bit patterns unlikely to result from corruption of each other.
    pub enum SyncCode(u8) {
        /// Announces presence of a freshly started side.
        Sync = 0x55,
        /// Answers `Sync`.
        SyncResp = 0xaa,
        /// Asks the peer to confirm the link.
        Conf = 0xa5,
        /// Answers `Conf`, completing the handshake.
        ConfResp = 0x5a,
        /// Heartbeat of an established link.
        KeepAlive = 0x99,
    }
}
