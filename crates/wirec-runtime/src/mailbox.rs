/// One inbound slot of a generated client: a pending flag plus the last decoded record.
///
/// Delivery overwrites whatever is there (last write wins, no queueing). `take` hands the record
/// out once and clears the flag; `clear` drops the flag but keeps the record readable through
/// `last`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mailbox<T> {
    pending: bool,
    value: T,
}

impl<T: Default> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            pending: false,
            value: T::default(),
        }
    }
}

impl<T> Mailbox<T> {
    pub fn deliver(&mut self, value: T) {
        self.value = value;
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn peek(&self) -> Option<&T> {
        self.pending.then_some(&self.value)
    }

    pub fn clear(&mut self) {
        self.pending = false;
    }

    pub fn last(&self) -> &T {
        &self.value
    }
}

impl<T: Clone> Mailbox<T> {
    pub fn take(&mut self) -> Option<T> {
        if !self.pending {
            return None;
        }
        self.pending = false;
        Some(self.value.clone())
    }
}
