//! Command codes carried in the first field of every request header.

/// Minor protocol revision advertised by this client.
///
/// Revision 9 and later accept the extended (large payload) header.
pub const CA_MINOR_PROTOCOL_REVISION: u16 = 13;

/// Request commands a client sends over a virtual circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestCode {
    /// Protocol version exchange and circuit priority.
    Version,
    /// Subscribe to value changes.
    EventAdd,
    /// Cancel a subscription.
    EventCancel,
    /// Read without notification (deprecated by servers, still framed).
    Read,
    /// Write without completion notification.
    Write,
    /// Locate a channel by name.
    Search,
    /// Pause subscription updates on this circuit.
    EventsOff,
    /// Resume subscription updates on this circuit.
    EventsOn,
    /// Flush outstanding reads.
    ReadSync,
    /// Release a channel.
    ClearChannel,
    /// Read with a completion reply.
    ReadNotify,
    /// Create a channel on the circuit.
    CreateChannel,
    /// Write with a completion reply.
    WriteNotify,
    /// Announce the client's user name.
    ClientName,
    /// Announce the client's host name.
    HostName,
    /// Circuit keep-alive.
    Echo,
    /// Any other command code.
    Other(u16),
}

impl From<u16> for RequestCode {
    fn from(v: u16) -> Self {
        match v {
            0 => Self::Version,
            1 => Self::EventAdd,
            2 => Self::EventCancel,
            3 => Self::Read,
            4 => Self::Write,
            6 => Self::Search,
            8 => Self::EventsOff,
            9 => Self::EventsOn,
            10 => Self::ReadSync,
            12 => Self::ClearChannel,
            15 => Self::ReadNotify,
            18 => Self::CreateChannel,
            19 => Self::WriteNotify,
            20 => Self::ClientName,
            21 => Self::HostName,
            23 => Self::Echo,
            other => Self::Other(other),
        }
    }
}

impl From<RequestCode> for u16 {
    fn from(c: RequestCode) -> Self {
        match c {
            RequestCode::Version => 0,
            RequestCode::EventAdd => 1,
            RequestCode::EventCancel => 2,
            RequestCode::Read => 3,
            RequestCode::Write => 4,
            RequestCode::Search => 6,
            RequestCode::EventsOff => 8,
            RequestCode::EventsOn => 9,
            RequestCode::ReadSync => 10,
            RequestCode::ClearChannel => 12,
            RequestCode::ReadNotify => 15,
            RequestCode::CreateChannel => 18,
            RequestCode::WriteNotify => 19,
            RequestCode::ClientName => 20,
            RequestCode::HostName => 21,
            RequestCode::Echo => 23,
            RequestCode::Other(v) => v,
        }
    }
}

impl std::fmt::Display for RequestCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Version => f.write_str("Version"),
            Self::EventAdd => f.write_str("EventAdd"),
            Self::EventCancel => f.write_str("EventCancel"),
            Self::Read => f.write_str("Read"),
            Self::Write => f.write_str("Write"),
            Self::Search => f.write_str("Search"),
            Self::EventsOff => f.write_str("EventsOff"),
            Self::EventsOn => f.write_str("EventsOn"),
            Self::ReadSync => f.write_str("ReadSync"),
            Self::ClearChannel => f.write_str("ClearChannel"),
            Self::ReadNotify => f.write_str("ReadNotify"),
            Self::CreateChannel => f.write_str("CreateChannel"),
            Self::WriteNotify => f.write_str("WriteNotify"),
            Self::ClientName => f.write_str("ClientName"),
            Self::HostName => f.write_str("HostName"),
            Self::Echo => f.write_str("Echo"),
            Self::Other(v) => write!(f, "Other({v})"),
        }
    }
}
