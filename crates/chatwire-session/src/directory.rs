use bytes::Bytes;

use crate::error::{Result, SessionError};

/// Opaque identity of one connected client, stable for the lifetime of
/// its connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientHandle(u64);

impl ClientHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct Entry {
    handle: ClientHandle,
    name: Bytes,
}

/// Registry of clients that have completed the handshake.
///
/// Maintains a bijection between handles and names: each registered
/// handle has exactly one name and no two entries share either. Entries
/// keep registration order, which fixes the order of listing replies.
#[derive(Debug, Default)]
pub struct ClientDirectory {
    entries: Vec<Entry>,
    next_handle: u64,
}

impl ClientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh handle, distinct from every handle ever issued
    /// by this directory.
    pub fn allocate_handle(&mut self) -> ClientHandle {
        let handle = ClientHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// Register `handle` under `name`.
    ///
    /// Fails with [`SessionError::HandleInUse`] if the name is already
    /// taken or the handle is already registered; the directory is
    /// unchanged on failure.
    pub fn register(&mut self, handle: ClientHandle, name: Bytes) -> Result<()> {
        if self
            .entries
            .iter()
            .any(|e| e.handle == handle || e.name == name)
        {
            return Err(SessionError::HandleInUse);
        }
        self.entries.push(Entry { handle, name });
        Ok(())
    }

    /// Remove the entry for `handle`. Removing an unknown handle is a
    /// no-op, so disconnect paths can call this unconditionally.
    pub fn unregister(&mut self, handle: ClientHandle) {
        self.entries.retain(|e| e.handle != handle);
    }

    /// Look up the handle registered under `name`.
    pub fn find_by_name(&self, name: &[u8]) -> Option<ClientHandle> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.handle)
    }

    /// Look up the name registered for `handle`.
    pub fn find_by_handle(&self, handle: ClientHandle) -> Option<&Bytes> {
        self.entries
            .iter()
            .find(|e| e.handle == handle)
            .map(|e| &e.name)
    }

    /// All registered (handle, name) pairs in registration order.
    pub fn snapshot(&self) -> Vec<(ClientHandle, Bytes)> {
        self.entries
            .iter()
            .map(|e| (e.handle, e.name.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
