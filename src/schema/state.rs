use std::fmt;

/// Connection lifecycle of a schema.
///
/// ```text
/// Connecting --init/connect ok--> Connected
/// Connecting --init/connect err--> Failed
/// Connected  --disconnect-------> Disconnected
/// any        --connect (hook)----> Connecting
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting)
    }

    /// Structural operations (migrate, update, actuality checks) are only
    /// expected to succeed against a connected adapter.
    pub fn allows_structural_ops(&self) -> bool {
        self.is_connected()
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connected.is_connecting());
        assert!(ConnectionState::Connecting.is_connecting());
        assert!(!ConnectionState::Failed.is_connected());
        assert!(!ConnectionState::Disconnected.allows_structural_ops());
        assert_eq!(ConnectionState::Failed.to_string(), "failed");
    }
}
