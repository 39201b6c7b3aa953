use alloc::string::ToString;
use alloc::sync::Arc;
use alloc::vec;

use super::Account;
use crate::{Serializer, SerializerOptions};

const CONFIG: &str = r#"(
    max_depth: 16,
    preserve_references: true,
    naming_policy: camel_case,
    object_reference_code: 9,
)"#;

fn configured() -> Serializer {
    let options: SerializerOptions = ron::from_str(CONFIG).unwrap();
    Serializer::with_options(options)
}

#[test]
fn loaded_options_reach_every_converter() {
    let serializer = configured();
    assert_eq!(serializer.options().max_depth, 16);
    assert_eq!(serializer.context().max_depth(), 16);

    let account = Account {
        account_id: 2,
        owner: "bank".to_string(),
        balance: 0,
    };
    let bytes = serializer.serialize(&account).unwrap();
    assert_eq!(&bytes[..2], [0x81, 0xa9]);
    assert_eq!(&bytes[2..11], b"accountId");

    let shared = Arc::new(4u8);
    let bytes = serializer.serialize(&vec![Arc::clone(&shared), shared]).unwrap();
    // The second element is a back-reference with the configured code.
    assert_eq!(bytes, [0x92, 0x04, 0xd4, 0x09, 0x00]);
}

#[test]
fn json_and_ron_agree() {
    let from_ron: SerializerOptions = ron::from_str(CONFIG).unwrap();
    let json = serde_json::to_string(&from_ron).unwrap();
    let from_json: SerializerOptions = serde_json::from_str(&json).unwrap();
    assert_eq!(from_json, from_ron);
}
