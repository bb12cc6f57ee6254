//! Property-based tests for the snapshot codec.
//!
//! Uses proptest to verify:
//! 1. Any snapshot survives a headered encode → decode.
//! 2. Random bytes never cause a panic in `decode` or `decode_file`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use taskboard_proto::codec;
use taskboard_proto::task::{Level, Task, TaskId};
use taskboard_proto::user::{Snapshot, User, UserId};
use uuid::Uuid;

/// Strategy for generating arbitrary `Level` values.
fn arb_level() -> impl Strategy<Value = Level> {
    prop_oneof![Just(Level::Easy), Just(Level::Medium), Just(Level::Hard)]
}

/// Strategy for generating arbitrary `Task` values.
fn arb_task() -> impl Strategy<Value = Task> {
    (
        any::<u128>(),
        "[0-9]{2}-[0-9]{2}-[0-9]{4}",
        "[^\x00]{0,64}",
        arb_level(),
        any::<bool>(),
        1..1000u32,
    )
        .prop_map(|(id, date, name, level, is_done, priority)| Task {
            id: TaskId::from_uuid(Uuid::from_u128(id)),
            date,
            name,
            level,
            is_done,
            priority,
        })
}

/// Strategy for generating arbitrary `User` values.
fn arb_user() -> impl Strategy<Value = User> {
    (
        "[a-zA-Z0-9_-]{1,24}",
        "[^\x00]{0,32}",
        prop::collection::vec(arb_task(), 0..8),
    )
        .prop_map(|(id, username, tasks)| {
            let mut user = User::new(UserId::new(id).unwrap(), username);
            for task in tasks {
                user.tasks.insert(task.id.clone(), task);
            }
            user
        })
}

proptest! {
    /// Any snapshot survives a headered encode → decode with user order intact.
    #[test]
    fn snapshot_file_round_trip(users in prop::collection::vec(arb_user(), 0..6)) {
        let snapshot = Snapshot { users };
        let bytes = codec::encode_file(&snapshot).expect("encode should succeed");
        let decoded = codec::decode_file(&bytes).expect("decode should succeed");
        prop_assert_eq!(snapshot, decoded);
    }

    /// Random bytes never cause a panic when decoded.
    #[test]
    fn random_bytes_decode_no_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = codec::decode(&bytes);
    }

    /// Random bytes behind a valid header never cause a panic.
    #[test]
    fn random_payload_decode_file_no_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut file = codec::SNAPSHOT_MAGIC.to_vec();
        file.extend_from_slice(&codec::SNAPSHOT_VERSION.to_le_bytes());
        file.extend_from_slice(&bytes);
        let _ = codec::decode_file(&file);
    }
}
