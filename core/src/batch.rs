use std::borrow::Cow;

/// A lambda definition: an id and the Lua source that registers its callback.
///
/// Only borrowed for the duration of [`crate::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lambda<'a> {
    pub lambda_id: i32,
    pub source: &'a [u8],
}

impl<'a> Lambda<'a> {
    pub fn new(lambda_id: i32, source: &'a [u8]) -> Self {
        Lambda { lambda_id, source }
    }
}

/// A batch of opaque bytes addressed to a lambda.
///
/// Used both as processing input and as the result handed to a result sink.
/// Result batches borrow from the Lua state and are only valid inside the
/// sink call; use [`Batch::to_owned_batch`] to keep one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch<'a> {
    pub lambda_id: i32,
    pub batch_id: i32,
    pub payload: &'a [u8],
}

impl<'a> Batch<'a> {
    pub fn new(lambda_id: i32, batch_id: i32, payload: &'a [u8]) -> Self {
        Batch {
            lambda_id,
            batch_id,
            payload,
        }
    }

    pub fn to_owned_batch(&self) -> OwnedBatch {
        OwnedBatch {
            lambda_id: self.lambda_id,
            batch_id: self.batch_id,
            payload: self.payload.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OwnedBatch {
    pub lambda_id: i32,
    pub batch_id: i32,
    pub payload: Vec<u8>,
}

impl OwnedBatch {
    pub fn as_batch(&self) -> Batch<'_> {
        Batch::new(self.lambda_id, self.batch_id, &self.payload)
    }
}

impl From<&Batch<'_>> for OwnedBatch {
    fn from(b: &Batch<'_>) -> Self {
        b.to_owned_batch()
    }
}

/// A message emitted by `lcm:log()`, tagged with the ids current at the time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEntry<'a> {
    pub lambda_id: i32,
    pub batch_id: i32,
    pub message: &'a [u8],
}

impl LogEntry<'_> {
    pub fn message_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_batch_keeps_ids_and_bytes() {
        let data = vec![0u8, 159, 146, 150];
        let owned = Batch::new(3, 9, &data).to_owned_batch();
        drop(data);
        assert_eq!(owned.lambda_id, 3);
        assert_eq!(owned.batch_id, 9);
        assert_eq!(owned.as_batch().payload, &[0u8, 159, 146, 150]);
    }

    #[test]
    fn log_message_lossy_replaces_invalid_utf8() {
        let entry = LogEntry {
            lambda_id: 1,
            batch_id: 2,
            message: b"ok \xff",
        };
        assert_eq!(entry.message_lossy(), "ok \u{fffd}");
    }
}
