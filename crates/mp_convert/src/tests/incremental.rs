use alloc::vec::Vec;

use super::{Account, Person, person};
use crate::{Serializer, SerializerOptions};

#[test]
fn byte_at_a_time_matches_whole_buffer() {
    let serializer = Serializer::new();
    let bytes = serializer.serialize(&person()).unwrap();

    let mut input = serializer.incremental_reader();
    let mut ctx = serializer.context();
    let mut result = None;
    for (index, byte) in bytes.iter().enumerate() {
        input.feed(core::slice::from_ref(byte));
        let value = serializer.deserialize_incremental::<Person>(&mut input, &mut ctx).unwrap();
        if index + 1 < bytes.len() {
            assert!(value.is_none(), "complete after {} of {} bytes", index + 1, bytes.len());
        } else {
            result = value;
        }
    }

    assert_eq!(result, Some(serializer.deserialize::<Person>(&bytes).unwrap()));
    assert!(input.is_empty());
}

#[test]
fn several_values_in_one_feed() {
    let serializer = Serializer::new();
    let accounts: Vec<Account> = (1..=3)
        .map(|id| Account {
            account_id: id,
            owner: "bank".into(),
            balance: id as i64 * 10,
        })
        .collect();

    let mut bytes = Vec::new();
    for account in &accounts {
        serializer.serialize_into(&mut bytes, account).unwrap();
    }

    let mut input = serializer.incremental_reader();
    let mut ctx = serializer.context();
    input.feed(&bytes);
    let mut back = Vec::new();
    while let Some(account) = serializer.deserialize_incremental::<Account>(&mut input, &mut ctx).unwrap() {
        back.push(account);
    }
    assert_eq!(back, accounts);
}

#[test]
fn reference_tables_reset_between_values() {
    use crate::Shared;

    let serializer = Serializer::with_options(SerializerOptions {
        preserve_references: true,
        ..Default::default()
    });
    let shared = Shared::new(1u8);
    let value = alloc::vec![shared.clone(), shared];
    let mut bytes = serializer.serialize(&value).unwrap();
    bytes.extend(serializer.serialize(&value).unwrap());

    let mut input = serializer.incremental_reader();
    let mut ctx = serializer.context();
    input.feed(&bytes);
    for _ in 0..2 {
        let back = serializer
            .deserialize_incremental::<Vec<Shared<u8>>>(&mut input, &mut ctx)
            .unwrap()
            .unwrap();
        assert!(back[0].ptr_eq(&back[1]));
    }
}
