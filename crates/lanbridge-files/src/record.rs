//! Transfer records and the monotone status machine.

use lanbridge_proto::TransferId;

/// Direction of a transfer. Never changes for the life of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Peer to desktop.
    Inbound,
    /// Desktop to peer.
    Outbound,
}

/// Transfer status. Transitions are monotone:
/// `InProgress → {Completed → Verified | Failed | Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    /// Chunks are flowing.
    InProgress,
    /// All bytes delivered; checksum not (yet) confirmed.
    Completed,
    /// Receiver confirmed the checksum.
    Verified,
    /// Terminal failure (size/checksum mismatch, retry exhaustion).
    Failed,
    /// Terminal operator or peer cancellation.
    Cancelled,
}

impl TransferStatus {
    /// Whether the machine may move from `self` to `next`.
    pub fn can_transition(self, next: TransferStatus) -> bool {
        use TransferStatus::*;
        matches!(
            (self, next),
            (InProgress, Completed)
                | (InProgress, Failed)
                | (InProgress, Cancelled)
                | (Completed, Verified)
        )
    }

    /// Whether the transfer has reached a terminal state.
    pub fn is_terminal(self) -> bool {
        !matches!(self, TransferStatus::InProgress | TransferStatus::Completed)
    }
}

/// One transfer as tracked by the daemon.
#[derive(Debug, Clone)]
pub struct TransferRecord {
    /// Transfer id shared with the peer.
    pub id: TransferId,
    /// File name (no path).
    pub name: String,
    /// Declared size in bytes.
    pub size: u64,
    /// MIME type.
    pub mime: String,
    /// Negotiated chunk size.
    pub chunk_size: usize,
    /// Direction; immutable.
    pub direction: Direction,
    /// Current status.
    status: TransferStatus,
    /// Bytes transferred so far; never exceeds `size`.
    bytes_transferred: u64,
    /// Declared SHA-256, when the sender provided one.
    pub checksum: Option<String>,
}

impl TransferRecord {
    /// Create a fresh in-progress record.
    pub fn new(
        id: TransferId,
        name: String,
        size: u64,
        mime: String,
        chunk_size: usize,
        direction: Direction,
        checksum: Option<String>,
    ) -> Self {
        Self {
            id,
            name,
            size,
            mime,
            chunk_size,
            direction,
            status: TransferStatus::InProgress,
            bytes_transferred: 0,
            checksum,
        }
    }

    /// Current status.
    pub fn status(&self) -> TransferStatus {
        self.status
    }

    /// Bytes transferred so far.
    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    /// Total chunk count for the declared size.
    pub fn total_chunks(&self) -> u64 {
        self.size.div_ceil(self.chunk_size as u64)
    }

    /// Advance the status. Illegal transitions are ignored and logged,
    /// keeping terminal states sticky.
    pub fn transition(&mut self, next: TransferStatus) -> bool {
        if self.status.can_transition(next) {
            self.status = next;
            true
        } else {
            if self.status != next {
                tracing::debug!(
                    id = %self.id,
                    from = ?self.status,
                    to = ?next,
                    "ignoring illegal status transition"
                );
            }
            false
        }
    }

    /// Raise `bytes_transferred` to `bytes`, clamped to `size`. Monotone:
    /// a lower value never rolls progress back.
    pub fn advance_bytes(&mut self, bytes: u64) {
        let clamped = bytes.min(self.size);
        if clamped > self.bytes_transferred {
            self.bytes_transferred = clamped;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn record() -> TransferRecord {
        TransferRecord::new(
            Uuid::new_v4(),
            "file.bin".into(),
            1000,
            "application/octet-stream".into(),
            256,
            Direction::Inbound,
            None,
        )
    }

    #[test]
    fn test_legal_transitions() {
        let mut r = record();
        assert!(r.transition(TransferStatus::Completed));
        assert!(r.transition(TransferStatus::Verified));
        assert_eq!(r.status(), TransferStatus::Verified);
    }

    #[test]
    fn test_terminal_states_sticky() {
        let mut r = record();
        assert!(r.transition(TransferStatus::Cancelled));

        // A late completion or failure cannot resurrect the record.
        assert!(!r.transition(TransferStatus::Completed));
        assert!(!r.transition(TransferStatus::Failed));
        assert_eq!(r.status(), TransferStatus::Cancelled);
    }

    #[test]
    fn test_verified_requires_completed() {
        let mut r = record();
        assert!(!r.transition(TransferStatus::Verified));
        assert_eq!(r.status(), TransferStatus::InProgress);
    }

    #[test]
    fn test_bytes_monotone_and_clamped() {
        let mut r = record();
        r.advance_bytes(400);
        r.advance_bytes(200); // stale progress report
        assert_eq!(r.bytes_transferred(), 400);

        r.advance_bytes(5000); // beyond declared size
        assert_eq!(r.bytes_transferred(), 1000);
    }

    #[test]
    fn test_total_chunks_rounds_up() {
        let r = record();
        assert_eq!(r.total_chunks(), 4); // 1000 / 256
    }
}
