use std::collections::HashMap;

use parking_lot::Mutex;

/// Claim on the right to write a streamed reply into one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTicket {
    pub message_id: String,
    generation: u64,
}

/// Per-message stream ownership.
///
/// Issuing a ticket for a message supersedes any earlier ticket for it; the
/// holder of a superseded ticket must stop writing.
#[derive(Debug, Default)]
pub struct StreamTickets {
    inner: Mutex<TicketState>,
}

#[derive(Debug, Default)]
struct TicketState {
    next: u64,
    current: HashMap<String, u64>,
}

impl StreamTickets {
    pub fn issue(&self, message_id: &str) -> StreamTicket {
        let mut state = self.inner.lock();
        state.next += 1;
        let generation = state.next;
        state.current.insert(message_id.to_string(), generation);
        StreamTicket {
            message_id: message_id.to_string(),
            generation,
        }
    }

    pub fn is_current(&self, ticket: &StreamTicket) -> bool {
        self.inner.lock().current.get(&ticket.message_id) == Some(&ticket.generation)
    }

    /// Drop the ticket if it is still the current one.
    pub fn release(&self, ticket: &StreamTicket) {
        let mut state = self.inner.lock();
        if state.current.get(&ticket.message_id) == Some(&ticket.generation) {
            state.current.remove(&ticket.message_id);
        }
    }

    /// Number of messages with a live stream.
    pub fn active(&self) -> usize {
        self.inner.lock().current.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ticket_supersedes_old() {
        let tickets = StreamTickets::default();
        let first = tickets.issue("m");
        let second = tickets.issue("m");
        let other = tickets.issue("n");

        assert!(!tickets.is_current(&first));
        assert!(tickets.is_current(&second));
        assert!(tickets.is_current(&other));

        tickets.release(&first);
        assert!(tickets.is_current(&second));
        tickets.release(&second);
        assert!(!tickets.is_current(&second));
        assert_eq!(tickets.active(), 1);
    }
}
